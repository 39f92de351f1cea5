//! Report downloads for one event

use crate::environment::PageEnvironment;
use crate::features::request;
use crate::page::{Loadable, PageError, Route};
use crate::reports::{self, ReportSink};
use elephant_client::{ApiError, Backend, Event, EventId, ReportKind};
use elephant_core::effect::Effect;
use elephant_core::reducer::Reducer;
use elephant_core::{async_effect, smallvec, SmallVec};
use std::path::PathBuf;
use std::sync::Arc;

/// Downloads page state
#[derive(Clone, Debug, PartialEq)]
pub struct DownloadsState {
    /// Event whose reports are offered
    pub event_id: EventId,
    /// The event (its title names the files)
    pub event: Loadable<Event>,
    /// Report currently being fetched
    pub downloading: Option<ReportKind>,
    /// Files written so far, newest last
    pub saved: Vec<PathBuf>,
    /// Last failed download
    pub error: Option<PageError>,
    /// Where the page wants to go
    pub redirect: Option<Route>,
}

impl DownloadsState {
    /// Page for one event, nothing loaded
    #[must_use]
    pub const fn new(event_id: EventId) -> Self {
        Self {
            event_id,
            event: Loadable::Idle,
            downloading: None,
            saved: Vec::new(),
            error: None,
            redirect: None,
        }
    }
}

/// Downloads page actions
#[derive(Clone, Debug)]
pub enum DownloadsAction {
    /// Fetch the event
    Load,
    /// Event fetched
    Loaded {
        /// The event
        result: Result<Event, ApiError>,
    },
    /// Fetch one report and save it
    Download(ReportKind),
    /// Report fetched and saved, or not
    Downloaded {
        /// Which report
        kind: ReportKind,
        /// Where it was written
        result: Result<PathBuf, PageError>,
    },
    /// Go somewhere else
    Navigate(Route),
}

/// Downloads page reducer
#[derive(Clone, Debug, Default)]
pub struct DownloadsReducer;

impl DownloadsReducer {
    /// Create the reducer
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

/// Fetch the PDF and hand it to the sink under its report filename
async fn fetch_and_save(
    backend: Arc<dyn Backend>,
    sink: Arc<dyn ReportSink>,
    event_id: EventId,
    kind: ReportKind,
    filename: String,
) -> Result<PathBuf, PageError> {
    let failed = || format!("Failed to download {}", reports::suffix(kind));

    let bytes = backend.report(event_id, kind).await.map_err(|e| {
        tracing::warn!(error = %e, report = kind.path(), "Report request failed");
        if e.is_unauthorized() {
            PageError::AuthRequired
        } else {
            PageError::Transport(failed())
        }
    })?;

    sink.save(&filename, &bytes).map_err(|e| {
        tracing::warn!(error = %e, %filename, "Saving report failed");
        PageError::Transport(failed())
    })
}

impl Reducer for DownloadsReducer {
    type State = DownloadsState;
    type Action = DownloadsAction;
    type Environment = PageEnvironment;

    fn reduce(
        &self,
        state: &mut DownloadsState,
        action: DownloadsAction,
        env: &PageEnvironment,
    ) -> SmallVec<[Effect<DownloadsAction>; 4]> {
        match action {
            DownloadsAction::Load => {
                state.event = Loadable::Loading;
                smallvec![request(env.backend().admin_event(state.event_id), |result| {
                    DownloadsAction::Loaded { result }
                })]
            },

            DownloadsAction::Loaded { result } => match result {
                Ok(event) => {
                    state.event = Loadable::Loaded(event);
                    smallvec![Effect::None]
                },
                Err(error) => {
                    let error = PageError::load_event(&error);
                    let effect = error.follow_up(env.redirect_delay(), DownloadsAction::Navigate);
                    state.event = Loadable::Failed(error);
                    smallvec![effect]
                },
            },

            DownloadsAction::Download(kind) => {
                let Some(event) = state.event.value() else {
                    return smallvec![Effect::None];
                };
                if state.downloading.is_some() {
                    return smallvec![Effect::None];
                }

                let filename = reports::report_filename(&event.title, kind);
                state.downloading = Some(kind);
                state.error = None;

                let backend = env.backend();
                let sink = env.reports();
                let event_id = state.event_id;
                smallvec![async_effect! {
                    let result = fetch_and_save(backend, sink, event_id, kind, filename).await;
                    Some(DownloadsAction::Downloaded { kind, result })
                }]
            },

            DownloadsAction::Downloaded { kind, result } => {
                state.downloading = None;
                match result {
                    Ok(path) => {
                        tracing::info!(report = reports::label(kind), path = %path.display(), "Report downloaded");
                        state.saved.push(path);
                        smallvec![Effect::None]
                    },
                    Err(error) => {
                        let effect = error.follow_up(env.redirect_delay(), DownloadsAction::Navigate);
                        state.error = Some(error);
                        smallvec![effect]
                    },
                }
            },

            DownloadsAction::Navigate(route) => {
                state.redirect = Some(route);
                smallvec![Effect::None]
            },
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)] // Test code
mod tests {
    use super::*;
    use crate::reports::MemoryReportSink;
    use elephant_runtime::Store;
    use elephant_testing::{assertions, fixtures, test_clock, BackendCall, Endpoint, MockBackend, ReducerTest};

    fn env_with(backend: &MockBackend, sink: &Arc<MemoryReportSink>) -> PageEnvironment {
        PageEnvironment::new(
            Arc::new(backend.clone()),
            Arc::new(test_clock()),
            Arc::clone(sink) as Arc<dyn ReportSink>,
        )
    }

    #[test]
    fn test_download_before_load_does_nothing() {
        let backend = MockBackend::new();
        let sink = Arc::new(MemoryReportSink::new());
        ReducerTest::new(DownloadsReducer::new())
            .with_env(env_with(&backend, &sink))
            .given_state(DownloadsState::new(EventId(5)))
            .when_action(DownloadsAction::Download(ReportKind::Accounting))
            .then_state(|state| assert!(state.downloading.is_none()))
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn test_missing_event_shows_not_found() {
        let backend = MockBackend::new();
        let sink = Arc::new(MemoryReportSink::new());
        ReducerTest::new(DownloadsReducer::new())
            .with_env(env_with(&backend, &sink))
            .given_state(DownloadsState::new(EventId(5)))
            .when_action(DownloadsAction::Loaded {
                result: Err(ApiError::NotFound {
                    message: "Event not found".to_string(),
                }),
            })
            .then_state(|state| {
                assert_eq!(
                    state.event.error(),
                    Some(&PageError::NotFound("Event not found".to_string()))
                );
            })
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[tokio::test]
    async fn test_financial_report_is_saved_under_event_title() {
        let backend = MockBackend::new()
            .with_events([fixtures::event(5, "Elephant: Pride Edition", "2025-06-28")])
            .with_report(ReportKind::Accounting, b"%PDF-accounting".to_vec());
        let sink = Arc::new(MemoryReportSink::new());
        let store = Store::new(
            DownloadsState::new(EventId(5)),
            DownloadsReducer::new(),
            env_with(&backend, &sink),
        );

        store.send(DownloadsAction::Load).await.wait().await;
        store
            .send(DownloadsAction::Download(ReportKind::Accounting))
            .await
            .wait()
            .await;

        assert_eq!(
            sink.saved(),
            [(
                "Elephant__Pride_Edition_Accounting.pdf".to_string(),
                b"%PDF-accounting".to_vec()
            )]
        );
        assert!(backend.calls().contains(&BackendCall::Report {
            id: EventId(5),
            kind: ReportKind::Accounting,
        }));
        assert!(store.state(|s| s.downloading.is_none()).await);
    }

    #[tokio::test]
    async fn test_failed_download_saves_nothing() {
        let backend =
            MockBackend::new().with_events([fixtures::event(5, "Elephant", "2025-06-28")]);
        backend.fail_next(Endpoint::Report, ApiError::RequestFailed("reset".to_string()));
        let sink = Arc::new(MemoryReportSink::new());
        let store = Store::new(
            DownloadsState::new(EventId(5)),
            DownloadsReducer::new(),
            env_with(&backend, &sink),
        );

        store.send(DownloadsAction::Load).await.wait().await;
        store
            .send(DownloadsAction::Download(ReportKind::EmailList))
            .await
            .wait()
            .await;

        assert!(sink.saved().is_empty());
        let error = store.state(|s| s.error.clone()).await;
        assert_eq!(
            error,
            Some(PageError::Transport("Failed to download Emails".to_string()))
        );
    }
}
