//! CMS-backed content pages (about, contact)
//!
//! Text comes from `GET /public/pages/:name`. When the backend has nothing,
//! or cannot be reached, the built-in text is shown instead; these pages
//! never show an error.

use crate::environment::PageEnvironment;
use crate::features::request;
use elephant_client::{ApiError, PageContent};
use elephant_core::effect::Effect;
use elephant_core::reducer::Reducer;
use elephant_core::{smallvec, SmallVec};
use std::fmt;
use std::str::FromStr;

const ABOUT_TEXT: &str = "ELEPHANT is a nomadic queer techno dance party based in Manila, organized by a collective of LGBTQIA+ artists, DJs, activists and performers. \\n ELEPHANT advocates for safer spaces for the community and equitable pay among artists.";

const CONTACT_TEXT: &str = "For ticket informations, email us at elephantpartypreregistration@gmail.com or DM @thatelephantparty/@lancenavasca on instagram. \n Elephant Party is always looking for volunteers, if you are queer and know anything about production, send us a DM @thatelephantparty on instagram.";

/// Pages whose text lives in the CMS
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ContentPage {
    /// About the collective
    About,
    /// Contact details
    Contact,
}

impl ContentPage {
    /// CMS page name
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::About => "about",
            Self::Contact => "contact",
        }
    }

    /// Heading shown above the text
    #[must_use]
    pub const fn heading(self) -> &'static str {
        match self {
            Self::About => "ABOUT",
            Self::Contact => "CONTACT",
        }
    }

    /// Built-in text
    #[must_use]
    pub const fn fallback(self) -> &'static str {
        match self {
            Self::About => ABOUT_TEXT,
            Self::Contact => CONTACT_TEXT,
        }
    }
}

impl fmt::Display for ContentPage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ContentPage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "about" => Ok(Self::About),
            "contact" => Ok(Self::Contact),
            other => Err(format!("unknown page '{other}' (expected about or contact)")),
        }
    }
}

/// Split CMS text into paragraphs
///
/// Paragraphs are separated by newlines or by the two characters `\n`,
/// which the CMS stores literally.
#[must_use]
pub fn paragraphs(content: &str) -> Vec<String> {
    content
        .replace("\\n", "\n")
        .lines()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect()
}

/// Content page state
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContentState {
    /// Which page
    pub page: ContentPage,
    /// CMS title, if the backend sent one
    pub title: Option<String>,
    /// Paragraphs to show
    pub paragraphs: Vec<String>,
    /// Fetch in flight
    pub loading: bool,
}

impl ContentState {
    /// Page showing its built-in text until loaded
    #[must_use]
    pub fn new(page: ContentPage) -> Self {
        Self {
            page,
            title: None,
            paragraphs: paragraphs(page.fallback()),
            loading: false,
        }
    }
}

/// Content page actions
#[derive(Clone, Debug)]
pub enum ContentAction {
    /// Fetch the page text
    Load,
    /// Page text fetched
    Loaded {
        /// CMS content
        result: Result<PageContent, ApiError>,
    },
}

/// Content page reducer
#[derive(Clone, Debug, Default)]
pub struct ContentReducer;

impl ContentReducer {
    /// Create the reducer
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Reducer for ContentReducer {
    type State = ContentState;
    type Action = ContentAction;
    type Environment = PageEnvironment;

    fn reduce(
        &self,
        state: &mut ContentState,
        action: ContentAction,
        env: &PageEnvironment,
    ) -> SmallVec<[Effect<ContentAction>; 4]> {
        match action {
            ContentAction::Load => {
                state.loading = true;
                let call = env.backend().public_page(state.page.name().to_string());
                smallvec![request(call, |result| ContentAction::Loaded { result })]
            },
            ContentAction::Loaded { result } => {
                state.loading = false;
                let content = match result {
                    Ok(page) => {
                        state.title = page.title.filter(|t| !t.trim().is_empty());
                        page.content.filter(|c| !c.trim().is_empty())
                    },
                    Err(error) => {
                        tracing::warn!(%error, page = state.page.name(), "Page content unavailable, using built-in text");
                        None
                    },
                };
                state.paragraphs = paragraphs(content.as_deref().unwrap_or(state.page.fallback()));
                smallvec![Effect::None]
            },
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)] // Test code
mod tests {
    use super::*;
    use crate::features::test_support::env;
    use elephant_runtime::Store;
    use elephant_testing::{MockBackend, ReducerTest};

    #[test]
    fn test_paragraphs_split_on_literal_and_real_newlines() {
        assert_eq!(paragraphs("One \\n Two\nThree\n\n"), ["One", "Two", "Three"]);
        assert_eq!(paragraphs(ABOUT_TEXT).len(), 2);
        assert_eq!(paragraphs(CONTACT_TEXT).len(), 2);
    }

    #[test]
    fn test_empty_content_falls_back() {
        ReducerTest::new(ContentReducer::new())
            .with_env(env(&MockBackend::new()))
            .given_state(ContentState::new(ContentPage::Contact))
            .when_action(ContentAction::Loaded {
                result: Ok(PageContent {
                    title: None,
                    content: Some("   ".to_string()),
                }),
            })
            .then_state(|state| {
                assert!(state.paragraphs[0].starts_with("For ticket informations"));
            })
            .run();
    }

    #[tokio::test]
    async fn test_cms_text_replaces_built_in_text() {
        let backend = MockBackend::new().with_page(
            "about",
            PageContent {
                title: Some("About us".to_string()),
                content: Some("We dance.\\nWe care.".to_string()),
            },
        );
        let store = Store::new(
            ContentState::new(ContentPage::About),
            ContentReducer::new(),
            env(&backend),
        );

        store.send(ContentAction::Load).await.wait().await;

        let state = store.state(ContentState::clone).await;
        assert_eq!(state.title.as_deref(), Some("About us"));
        assert_eq!(state.paragraphs, ["We dance.", "We care."]);
    }

    #[tokio::test]
    async fn test_missing_page_keeps_built_in_text() {
        let store = Store::new(
            ContentState::new(ContentPage::About),
            ContentReducer::new(),
            env(&MockBackend::new()),
        );

        store.send(ContentAction::Load).await.wait().await;

        let paragraphs = store.state(|s| s.paragraphs.clone()).await;
        assert!(paragraphs[0].starts_with("ELEPHANT is a nomadic queer techno dance party"));
        assert!(!store.state(|s| s.loading).await);
    }
}
