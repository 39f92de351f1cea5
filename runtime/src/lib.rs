//! # Elephant Runtime
//!
//! Runtime implementation for the Elephant Party client.
//!
//! The [`Store`] owns a page's state, runs its reducer for every action and
//! executes the returned effects. Actions produced by effects (backend
//! responses, delayed navigations) are fed back into the same store.
//!
//! ## Example
//!
//! ```ignore
//! let store = Store::new(DoorState::new(event_id), DoorReducer::new(), env);
//!
//! let mut handle = store.send(DoorAction::Load).await;
//! handle.wait().await;
//!
//! let groups = store.state(|s| s.groups()).await;
//! ```

use elephant_core::{effect::Effect, reducer::Reducer};
use futures::future::BoxFuture;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::{RwLock, watch};

/// Shared counter of in-flight effects for one `send()` call and its cascade.
#[derive(Clone)]
struct EffectTracking {
    counter: Arc<AtomicUsize>,
    notifier: Arc<watch::Sender<()>>,
}

impl EffectTracking {
    fn increment(&self) {
        self.counter.fetch_add(1, Ordering::SeqCst);
    }
}

/// Decrements the tracking counter when an effect task finishes (or panics).
struct DecrementGuard(EffectTracking);

impl Drop for DecrementGuard {
    fn drop(&mut self) {
        let previous = self.0.counter.fetch_sub(1, Ordering::SeqCst);
        if previous == 1 {
            let _ = self.0.notifier.send(());
        }
    }
}

/// Handle to the effects started by one `send()` call
///
/// Effects that produce follow-up actions are tracked transitively: waiting
/// on the handle returns once the whole cascade has settled, including any
/// scheduled [`Effect::Delay`].
pub struct EffectHandle {
    effects: Arc<AtomicUsize>,
    completion: watch::Receiver<()>,
}

impl EffectHandle {
    fn new() -> (Self, EffectTracking) {
        let counter = Arc::new(AtomicUsize::new(0));
        let (tx, rx) = watch::channel(());

        let handle = Self {
            effects: Arc::clone(&counter),
            completion: rx,
        };
        let tracking = EffectTracking {
            counter,
            notifier: Arc::new(tx),
        };

        (handle, tracking)
    }

    /// Number of effects still running
    #[must_use]
    pub fn pending(&self) -> usize {
        self.effects.load(Ordering::SeqCst)
    }

    /// Wait for all effects (and the effects of their follow-up actions) to complete
    pub async fn wait(&mut self) {
        while self.effects.load(Ordering::SeqCst) > 0 {
            if self.completion.changed().await.is_err() {
                break;
            }
        }
    }
}

/// The Store - runtime coordinator for a reducer
///
/// # Type Parameters
///
/// - `S`: State type
/// - `A`: Action type
/// - `E`: Environment type
/// - `R`: Reducer implementation
pub struct Store<S, A, E, R>
where
    R: Reducer<State = S, Action = A, Environment = E>,
{
    state: Arc<RwLock<S>>,
    reducer: Arc<R>,
    environment: Arc<E>,
}

impl<S, A, E, R> Clone for Store<S, A, E, R>
where
    R: Reducer<State = S, Action = A, Environment = E>,
{
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            reducer: Arc::clone(&self.reducer),
            environment: Arc::clone(&self.environment),
        }
    }
}

impl<S, A, E, R> Store<S, A, E, R>
where
    R: Reducer<State = S, Action = A, Environment = E> + Send + Sync + 'static,
    A: Send + Clone + 'static,
    S: Send + Sync + 'static,
    E: Send + Sync + 'static,
{
    /// Create a new store with initial state, reducer, and environment
    #[must_use]
    pub fn new(initial_state: S, reducer: R, environment: E) -> Self {
        Self {
            state: Arc::new(RwLock::new(initial_state)),
            reducer: Arc::new(reducer),
            environment: Arc::new(environment),
        }
    }

    /// Send an action to the store
    ///
    /// The reducer runs immediately; its effects are started in the
    /// background. Use the returned handle to wait for them.
    #[tracing::instrument(skip(self, action), name = "store_send")]
    pub async fn send(&self, action: A) -> EffectHandle {
        let (handle, tracking) = EffectHandle::new();
        self.clone().dispatch(action, tracking).await;
        handle
    }

    /// Read from the current state
    pub async fn state<F, T>(&self, f: F) -> T
    where
        F: FnOnce(&S) -> T,
    {
        let state = self.state.read().await;
        f(&state)
    }

    fn dispatch(self, action: A, tracking: EffectTracking) -> BoxFuture<'static, ()> {
        Box::pin(async move {
            let effects = {
                let mut state = self.state.write().await;
                self.reducer.reduce(&mut state, action, &self.environment)
            };

            for effect in effects {
                self.execute_effect(effect, tracking.clone());
            }
        })
    }

    fn execute_effect(&self, effect: Effect<A>, tracking: EffectTracking) {
        match effect {
            Effect::None => {
                tracing::trace!("Executing Effect::None (no-op)");
                metrics::counter!("store.effects.executed", "type" => "none").increment(1);
            },
            Effect::Future(fut) => {
                tracing::trace!("Executing Effect::Future");
                metrics::counter!("store.effects.executed", "type" => "future").increment(1);
                tracking.increment();

                let store = self.clone();
                tokio::spawn(async move {
                    let _guard = DecrementGuard(tracking.clone());

                    if let Some(action) = fut.await {
                        tracing::trace!("Effect::Future produced an action, sending to store");
                        store.dispatch(action, tracking).await;
                    } else {
                        tracing::trace!("Effect::Future completed with no action");
                    }
                });
            },
            Effect::Delay { duration, action } => {
                tracing::trace!("Executing Effect::Delay (duration: {:?})", duration);
                metrics::counter!("store.effects.executed", "type" => "delay").increment(1);
                tracking.increment();

                let store = self.clone();
                tokio::spawn(async move {
                    let _guard = DecrementGuard(tracking.clone());

                    tokio::time::sleep(duration).await;
                    tracing::trace!("Effect::Delay completed, sending action");
                    store.dispatch(*action, tracking).await;
                });
            },
        }
    }
}
