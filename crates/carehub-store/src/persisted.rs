//! Reducer stores mirrored to local storage
//!
//! [`PersistedStore`] wraps a [`Store`] and writes the full state under one
//! key after every successful dispatch. Writes are serialized so the stored
//! blob always matches some snapshot the store actually held, never an
//! interleaving of two. A failed write restores the previous state, so memory
//! and storage do not drift apart.

use crate::error::{PersistError, StoreError};
use crate::kv::KeyValueStore;
use carehub_core::store::{Reducer, Snapshot, Store};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::marker::PhantomData;
use std::sync::Arc;
use tokio::sync::{watch, Mutex};

/// Store whose state survives restarts
pub struct PersistedStore<R: Reducer> {
    store: Store<R>,
    backend: Arc<dyn KeyValueStore>,
    key: &'static str,
    write_lock: Mutex<()>,
}

impl<R> PersistedStore<R>
where
    R: Reducer,
    R::State: Serialize + DeserializeOwned + Default,
{
    /// Open the store at `key`, restoring any saved state
    ///
    /// A blob that no longer parses is logged and replaced by the default
    /// state.
    ///
    /// # Errors
    /// Storage read failures.
    pub async fn open(backend: Arc<dyn KeyValueStore>, key: &'static str) -> Result<Self, StoreError> {
        let initial = match backend.get(key).await? {
            Some(text) => match serde_json::from_str::<R::State>(&text) {
                Ok(state) => {
                    tracing::debug!(key, "restored persisted state");
                    state
                }
                Err(error) => {
                    tracing::warn!(key, %error, "discarding unreadable persisted state");
                    R::State::default()
                }
            },
            None => R::State::default(),
        };

        Ok(Self {
            store: Store::new(initial),
            backend,
            key,
            write_lock: Mutex::new(()),
        })
    }

    /// Apply an action and persist the result
    ///
    /// # Errors
    /// `Rejected` when the reducer refuses the action (nothing written),
    /// `Store` when the new state could not be written (state rolled back).
    pub async fn dispatch(&self, action: R::Action) -> Result<Snapshot<R::State>, PersistError<R::Error>> {
        let _guard = self.write_lock.lock().await;
        let previous = self.store.state();
        let snapshot = self.store.dispatch(action).map_err(PersistError::Rejected)?;
        self.write_or_restore(&snapshot.state, previous).await?;
        Ok(snapshot)
    }

    /// Replace the whole state and persist it
    ///
    /// # Errors
    /// Storage write failures; the previous state is kept.
    pub async fn replace(&self, state: R::State) -> Result<Snapshot<R::State>, StoreError> {
        let _guard = self.write_lock.lock().await;
        let previous = self.store.state();
        let snapshot = self.store.replace(state);
        self.write_or_restore(&snapshot.state, previous).await?;
        Ok(snapshot)
    }

    /// Reset to the default state and drop the stored blob
    ///
    /// # Errors
    /// Storage failures.
    pub async fn clear(&self) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        self.store.replace(R::State::default());
        self.backend.remove(self.key).await
    }

    async fn write_or_restore(&self, state: &R::State, previous: R::State) -> Result<(), StoreError> {
        if let Err(error) = self.write(state).await {
            tracing::warn!(key = self.key, %error, "write failed, restoring previous state");
            self.store.replace(previous);
            return Err(error);
        }
        Ok(())
    }

    async fn write(&self, state: &R::State) -> Result<(), StoreError> {
        let text = serde_json::to_string(state).map_err(|source| StoreError::Serialize {
            key: self.key.to_string(),
            source,
        })?;
        self.backend.set(self.key, text).await
    }

    /// Clone of the current state
    #[must_use]
    pub fn state(&self) -> R::State {
        self.store.state()
    }

    /// Current version
    #[must_use]
    pub fn version(&self) -> u64 {
        self.store.version()
    }

    /// Receive a snapshot after every change
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Snapshot<R::State>> {
        self.store.subscribe()
    }

    /// Storage key
    #[inline]
    #[must_use]
    pub fn key(&self) -> &'static str {
        self.key
    }
}

impl<R: Reducer> std::fmt::Debug for PersistedStore<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersistedStore")
            .field("key", &self.key)
            .field("store", &self.store)
            .finish_non_exhaustive()
    }
}

/// A single serialized value under one key
#[derive(Debug)]
pub struct JsonSlot<T> {
    backend: Arc<dyn KeyValueStore>,
    key: &'static str,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for JsonSlot<T> {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
            key: self.key,
            _marker: PhantomData,
        }
    }
}

impl<T: Serialize + DeserializeOwned> JsonSlot<T> {
    /// Slot at `key`
    #[inline]
    #[must_use]
    pub fn new(backend: Arc<dyn KeyValueStore>, key: &'static str) -> Self {
        Self {
            backend,
            key,
            _marker: PhantomData,
        }
    }

    /// Read the value; unreadable blobs are treated as absent
    ///
    /// # Errors
    /// Storage read failures.
    pub async fn load(&self) -> Result<Option<T>, StoreError> {
        let Some(text) = self.backend.get(self.key).await? else {
            return Ok(None);
        };
        match serde_json::from_str(&text) {
            Ok(value) => Ok(Some(value)),
            Err(error) => {
                tracing::warn!(key = self.key, %error, "ignoring unreadable stored value");
                Ok(None)
            }
        }
    }

    /// Write the value
    ///
    /// # Errors
    /// Serialization or storage failures.
    pub async fn save(&self, value: &T) -> Result<(), StoreError> {
        let text = serde_json::to_string(value).map_err(|source| StoreError::Serialize {
            key: self.key.to_string(),
            source,
        })?;
        self.backend.set(self.key, text).await
    }

    /// Remove the value
    ///
    /// # Errors
    /// Storage failures.
    pub async fn clear(&self) -> Result<(), StoreError> {
        self.backend.remove(self.key).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys;
    use crate::kv::{FileStore, MemoryStore};
    use carehub_core::assessment::{
        ActivityLevel, AssessmentDraft, Gender, QuestionnaireAction, QuestionnaireReducer, QuestionnaireStep,
    };
    use carehub_core::cart::{CartAction, CartLineItem, CartReducer, ItemKind};
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicBool, Ordering};

    /// Memory store whose writes can be switched off
    #[derive(Debug, Default)]
    struct FlakyStore {
        inner: MemoryStore,
        read_only: AtomicBool,
    }

    #[async_trait::async_trait]
    impl KeyValueStore for FlakyStore {
        async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
            self.inner.get(key).await
        }

        async fn set(&self, key: &str, value: String) -> Result<(), StoreError> {
            if self.read_only.load(Ordering::SeqCst) {
                return Err(StoreError::Io {
                    key: key.to_string(),
                    source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only"),
                });
            }
            self.inner.set(key, value).await
        }

        async fn remove(&self, key: &str) -> Result<(), StoreError> {
            self.inner.remove(key).await
        }
    }

    #[tokio::test]
    async fn draft_survives_reopen_exactly() {
        let dir = tempfile::tempdir().unwrap();
        let backend: Arc<dyn KeyValueStore> = Arc::new(FileStore::new(dir.path()));

        let draft = PersistedStore::<QuestionnaireReducer>::open(backend.clone(), keys::ASSESSMENT_DRAFT)
            .await
            .unwrap();
        for action in [
            QuestionnaireAction::SetAge("34".into()),
            QuestionnaireAction::SetGender(Gender::Female),
            QuestionnaireAction::SetWeight("70".into()),
            QuestionnaireAction::SetHeight("175".into()),
            QuestionnaireAction::SetActivityLevel(ActivityLevel::Moderate),
            QuestionnaireAction::ToggleCondition("diabetes".into()),
            QuestionnaireAction::NextStep,
        ] {
            draft.dispatch(action).await.unwrap();
        }
        let before: AssessmentDraft = draft.state();
        drop(draft);

        let reopened = PersistedStore::<QuestionnaireReducer>::open(backend, keys::ASSESSMENT_DRAFT)
            .await
            .unwrap();
        let after = reopened.state();
        assert_eq!(after, before);
        assert_eq!(after.weight, "70");
        assert_eq!(after.bmi, Some(22.9));
        assert_eq!(after.step, QuestionnaireStep::Lifestyle);
    }

    #[tokio::test]
    async fn rejected_action_writes_nothing() {
        let backend = Arc::new(MemoryStore::new());
        let cart = PersistedStore::<CartReducer>::open(backend.clone(), keys::CART).await.unwrap();

        let err = cart
            .dispatch(CartAction::Remove {
                kind: ItemKind::Medicine,
                id: "missing".into(),
            })
            .await
            .unwrap_err();
        assert!(err.rejection().is_some());
        assert!(backend.is_empty());
    }

    #[tokio::test]
    async fn failed_write_restores_previous_state() {
        let backend = Arc::new(FlakyStore::default());
        let cart = PersistedStore::<CartReducer>::open(backend.clone(), keys::CART).await.unwrap();
        cart.dispatch(CartAction::Add(CartLineItem::new(ItemKind::Medicine, "m1", "Paracetamol", 30.0, 35.0)))
            .await
            .unwrap();
        let saved = cart.state();

        backend.read_only.store(true, Ordering::SeqCst);
        let err = cart
            .dispatch(CartAction::Add(CartLineItem::new(ItemKind::Lab, "l-1", "Lipid Profile", 600.0, 800.0)))
            .await
            .unwrap_err();
        assert!(matches!(err, PersistError::Store(StoreError::Io { .. })));
        assert_eq!(cart.state(), saved);
        assert_eq!(cart.subscribe().borrow().state, saved);

        let err = cart.replace(Default::default()).await.unwrap_err();
        assert!(matches!(err, StoreError::Io { .. }));
        assert_eq!(cart.state(), saved);

        backend.read_only.store(false, Ordering::SeqCst);
        let reopened = PersistedStore::<CartReducer>::open(backend, keys::CART).await.unwrap();
        assert_eq!(reopened.state(), saved);
    }

    #[tokio::test]
    async fn corrupt_blob_falls_back_to_default() {
        let backend = Arc::new(MemoryStore::new());
        backend.set(keys::CART, "{not json".into()).await.unwrap();

        let cart = PersistedStore::<CartReducer>::open(backend, keys::CART).await.unwrap();
        assert!(cart.state().items.is_empty());
    }

    #[tokio::test]
    async fn clear_drops_blob() {
        let backend = Arc::new(MemoryStore::new());
        let cart = PersistedStore::<CartReducer>::open(backend.clone(), keys::CART).await.unwrap();
        cart.dispatch(CartAction::Add(CartLineItem::new(ItemKind::Medicine, "m1", "Paracetamol", 30.0, 35.0)))
            .await
            .unwrap();
        assert_eq!(backend.len(), 1);

        cart.clear().await.unwrap();
        assert!(backend.is_empty());
        assert!(cart.state().items.is_empty());
    }

    #[tokio::test]
    async fn slot_round_trip() {
        let backend: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let slot: JsonSlot<Vec<u32>> = JsonSlot::new(backend, "numbers");
        assert_eq!(slot.load().await.unwrap(), None);
        slot.save(&vec![1, 2, 3]).await.unwrap();
        assert_eq!(slot.load().await.unwrap(), Some(vec![1, 2, 3]));
        slot.clear().await.unwrap();
        assert_eq!(slot.load().await.unwrap(), None);
    }
}
