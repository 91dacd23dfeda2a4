//! Application wiring
//!
//! [`AppContext`] owns every long-lived piece of client state and hands out
//! the flows that operate on it. Nothing is global: tests build a context over
//! an in-memory backend and store, the binary over REST and the filesystem.

use crate::assessment::AssessmentFlow;
use crate::booking::{BookingService, InFlight};
use crate::checkout::CheckoutFlow;
use crate::error::AppResult;
use crate::search::SearchFlow;
use carehub_backend::{Backend, Catalog, RestBackend, RiskEngine};
use carehub_core::assessment::QuestionnaireReducer;
use carehub_core::cart::CartReducer;
use carehub_core::config::AppConfig;
use carehub_core::location::LocationReducer;
use carehub_store::{keys, FileStore, JsonSlot, KeyValueStore, PersistedStore};
use std::sync::Arc;

/// Shared state and collaborators
#[derive(Debug, Clone)]
pub struct AppContext {
    config: Arc<AppConfig>,
    backend: Arc<dyn Backend>,
    catalog: Catalog,
    cart: Arc<PersistedStore<CartReducer>>,
    location: Arc<PersistedStore<LocationReducer>>,
    questionnaire: Arc<PersistedStore<QuestionnaireReducer>>,
    storage: Arc<dyn KeyValueStore>,
    in_flight: InFlight,
}

impl AppContext {
    /// Build over explicit collaborators, restoring persisted state
    ///
    /// # Errors
    /// Storage read failures.
    pub async fn open(config: AppConfig, backend: Arc<dyn Backend>, storage: Arc<dyn KeyValueStore>) -> AppResult<Self> {
        let catalog = Catalog::new(backend.clone())
            .with_cache(&config.cache)
            .with_search_limit(config.search.limit);

        let cart: PersistedStore<CartReducer> = PersistedStore::open(storage.clone(), keys::CART).await?;
        let location: PersistedStore<LocationReducer> = PersistedStore::open(storage.clone(), keys::LOCATION).await?;
        let questionnaire: PersistedStore<QuestionnaireReducer> =
            PersistedStore::open(storage.clone(), keys::ASSESSMENT_DRAFT).await?;
        tracing::info!(
            cart_lines = cart.state().items.len(),
            draft_blank = questionnaire.state().is_blank(),
            "client state restored"
        );

        Ok(Self {
            config: Arc::new(config),
            backend,
            catalog,
            cart: Arc::new(cart),
            location: Arc::new(location),
            questionnaire: Arc::new(questionnaire),
            storage,
            in_flight: InFlight::default(),
        })
    }

    /// Build over the REST backend and the configured storage directory
    ///
    /// # Errors
    /// Backend configuration or storage failures.
    pub async fn from_config(config: AppConfig) -> AppResult<Self> {
        let backend: Arc<dyn Backend> = Arc::new(RestBackend::from_config(&config.backend)?);
        let storage: Arc<dyn KeyValueStore> = Arc::new(FileStore::new(config.storage.dir.clone()));
        Self::open(config, backend, storage).await
    }

    #[inline]
    #[must_use]
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    #[inline]
    #[must_use]
    pub fn backend(&self) -> &Arc<dyn Backend> {
        &self.backend
    }

    #[inline]
    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    #[inline]
    #[must_use]
    pub fn cart(&self) -> &Arc<PersistedStore<CartReducer>> {
        &self.cart
    }

    #[inline]
    #[must_use]
    pub fn location(&self) -> &Arc<PersistedStore<LocationReducer>> {
        &self.location
    }

    #[inline]
    #[must_use]
    pub fn questionnaire(&self) -> &Arc<PersistedStore<QuestionnaireReducer>> {
        &self.questionnaire
    }

    /// Health assessment flow
    #[must_use]
    pub fn assessment(&self) -> AssessmentFlow {
        AssessmentFlow::new(
            self.questionnaire.clone(),
            RiskEngine::new(self.backend.clone()),
            JsonSlot::new(self.storage.clone(), keys::ASSESSMENT_RESULT),
            self.cart.clone(),
        )
    }

    /// Search flow with the configured minimum term length
    #[must_use]
    pub fn search(&self) -> SearchFlow {
        SearchFlow::new(self.catalog.clone(), self.config.search.min_chars)
    }

    /// Checkout flow over the shared cart
    #[must_use]
    pub fn checkout(&self) -> CheckoutFlow {
        CheckoutFlow::new(self.cart.clone(), self.location.clone(), self.backend.clone())
    }

    /// Confirmation state for one booking screen
    ///
    /// All sessions share one in-flight registry, so the same draft cannot be
    /// submitted twice at once from different screens.
    #[must_use]
    pub fn booking(&self) -> BookingService {
        BookingService::new(self.backend.clone(), self.config.fees, self.in_flight.clone())
    }
}
