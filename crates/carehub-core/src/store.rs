//! Explicit application-state containers
//!
//! Every piece of process-wide client state (cart, questionnaire draft,
//! location) lives in a [`Store`] that is handed to whoever needs it. All
//! mutations go through a typed [`Reducer`]:
//! - Actions are applied under a single lock (one writer at a time)
//! - A failing action leaves the state untouched
//! - Every successful dispatch bumps the version and publishes a snapshot

use parking_lot::Mutex;
use tokio::sync::watch;

/// Pure state transition function for a store
pub trait Reducer: Send + Sync + 'static {
    /// State held by the store
    type State: Clone + std::fmt::Debug + Send + Sync + 'static;
    /// Mutation requests
    type Action: std::fmt::Debug;
    /// Why an action was rejected
    type Error: std::error::Error + Send + Sync + 'static;

    /// Apply `action` to `state`
    ///
    /// # Errors
    /// Returns the reducer's error when the action is rejected. The store
    /// discards any partial change in that case.
    fn reduce(state: &mut Self::State, action: Self::Action) -> Result<(), Self::Error>;
}

/// Versioned copy of a store's state
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot<S> {
    /// Number of successful dispatches applied so far
    pub version: u64,
    /// State after that dispatch
    pub state: S,
}

/// Single-writer state container
pub struct Store<R: Reducer> {
    current: Mutex<Snapshot<R::State>>,
    publisher: watch::Sender<Snapshot<R::State>>,
}

impl<R: Reducer> Store<R> {
    /// Create a store holding `initial` at version 0
    #[must_use]
    pub fn new(initial: R::State) -> Self {
        let snapshot = Snapshot {
            version: 0,
            state: initial,
        };
        let (publisher, _) = watch::channel(snapshot.clone());
        Self {
            current: Mutex::new(snapshot),
            publisher,
        }
    }

    /// Apply an action and return the resulting snapshot
    ///
    /// # Errors
    /// Propagates the reducer's rejection; the stored state is unchanged.
    pub fn dispatch(&self, action: R::Action) -> Result<Snapshot<R::State>, R::Error> {
        let mut current = self.current.lock();
        let mut next = current.state.clone();

        tracing::trace!(?action, version = current.version, "dispatch");
        R::reduce(&mut next, action)?;

        current.state = next;
        current.version += 1;
        let snapshot = current.clone();
        self.publisher.send_replace(snapshot.clone());
        Ok(snapshot)
    }

    /// Replace the whole state (used when restoring persisted state)
    pub fn replace(&self, state: R::State) -> Snapshot<R::State> {
        let mut current = self.current.lock();
        current.state = state;
        current.version += 1;
        let snapshot = current.clone();
        self.publisher.send_replace(snapshot.clone());
        snapshot
    }

    /// Clone of the current state
    #[must_use]
    pub fn state(&self) -> R::State {
        self.current.lock().state.clone()
    }

    /// Current version
    #[must_use]
    pub fn version(&self) -> u64 {
        self.current.lock().version
    }

    /// Receive a snapshot after every change
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Snapshot<R::State>> {
        self.publisher.subscribe()
    }
}

impl<R: Reducer> Default for Store<R>
where
    R::State: Default,
{
    fn default() -> Self {
        Self::new(R::State::default())
    }
}

impl<R: Reducer> std::fmt::Debug for Store<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let current = self.current.lock();
        f.debug_struct("Store")
            .field("version", &current.version)
            .field("state", &current.state)
            .finish()
    }
}
