//! Typed catalog access
//!
//! One [`CatalogEntity`] per table the app lists. [`Catalog`] offers the three
//! reads every listing screen needs:
//! - `list`: every row (cached)
//! - `get`: one row by id, `NotFound` when absent (cached)
//! - `search`: `ilike` over the entity's searchable columns

#![allow(missing_docs)]

use crate::client::Backend;
use crate::error::{BackendError, BackendResult};
use crate::query::Query;
use crate::search::SearchTerm;
use carehub_core::cart::{CartLineItem, ItemKind};
use carehub_core::config::CacheConfig;
use carehub_core::pricing::BookingType;
use carehub_core::types::CatalogKind;
use carehub_store::TtlCache;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

/// A row type stored in one catalog table
pub trait CatalogEntity: DeserializeOwned + Serialize + Clone + Send + Sync + 'static {
    /// Which catalog this is
    const KIND: CatalogKind;

    /// Columns matched by free-text search
    const SEARCH_COLUMNS: &'static [&'static str];

    /// Row id
    fn id(&self) -> &str;

    /// Name shown in lists
    fn name(&self) -> &str;
}

/// Pharmacy product
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Medicine {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    pub price: f64,
    #[serde(default)]
    pub mrp: Option<f64>,
    #[serde(default, alias = "is_prescription_required")]
    pub requires_prescription: bool,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
}

impl Medicine {
    /// Single-quantity cart line for this product
    #[must_use]
    pub fn to_cart_item(&self) -> CartLineItem {
        let mut item = CartLineItem::new(
            ItemKind::Medicine,
            &self.id,
            &self.name,
            self.price,
            self.mrp.unwrap_or(self.price),
        );
        if self.requires_prescription {
            item = item.prescription_required();
        }
        item
    }
}

/// Pathology test
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabTest {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub category: Option<String>,
    pub price: f64,
    #[serde(default)]
    pub mrp: Option<f64>,
    #[serde(default)]
    pub sample_type: Option<String>,
    #[serde(default)]
    pub report_time: Option<String>,
    #[serde(default)]
    pub home_collection_available: bool,
}

impl LabTest {
    /// Single-quantity cart line for this test
    #[must_use]
    pub fn to_cart_item(&self) -> CartLineItem {
        CartLineItem::new(ItemKind::Lab, &self.id, &self.name, self.price, self.mrp.unwrap_or(self.price))
    }
}

/// Imaging scan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scan {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub scan_type: Option<String>,
    #[serde(default)]
    pub body_part: Option<String>,
    pub price: f64,
    #[serde(default)]
    pub mrp: Option<f64>,
}

impl Scan {
    /// Single-quantity cart line for this scan
    #[must_use]
    pub fn to_cart_item(&self) -> CartLineItem {
        CartLineItem::new(ItemKind::Scan, &self.id, &self.name, self.price, self.mrp.unwrap_or(self.price))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Doctor {
    pub id: String,
    pub name: String,
    pub specialization: String,
    #[serde(default)]
    pub qualification: Option<String>,
    #[serde(default)]
    pub experience_years: Option<u32>,
    pub consultation_fee: f64,
    #[serde(default)]
    pub hospital_id: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub rating: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hospital {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub specialties: Vec<String>,
    #[serde(default)]
    pub emergency_available: bool,
    #[serde(default)]
    pub rating: Option<f64>,
}

/// Entry of the shared `service_catalog` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Service {
    pub id: String,
    pub name: String,
    /// `home_care`, `physiotherapy`, `surgery`, `wellness`, ...
    pub category: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price: f64,
    #[serde(default)]
    pub duration: Option<String>,
}

impl Service {
    /// Booking flow this service is booked through
    #[must_use]
    pub fn booking_type(&self) -> Option<BookingType> {
        self.category.parse().ok()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmbulanceType {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub base_fare: f64,
    #[serde(default)]
    pub per_km_rate: Option<f64>,
}

macro_rules! catalog_entity {
    ($ty:ty, $kind:expr, [$($col:literal),+ $(,)?]) => {
        impl CatalogEntity for $ty {
            const KIND: CatalogKind = $kind;
            const SEARCH_COLUMNS: &'static [&'static str] = &[$($col),+];

            #[inline]
            fn id(&self) -> &str {
                &self.id
            }

            #[inline]
            fn name(&self) -> &str {
                &self.name
            }
        }
    };
}

catalog_entity!(Medicine, CatalogKind::Medicine, ["name", "brand", "category"]);
catalog_entity!(LabTest, CatalogKind::LabTest, ["name", "category"]);
catalog_entity!(Scan, CatalogKind::Scan, ["name", "scan_type", "body_part"]);
catalog_entity!(Doctor, CatalogKind::Doctor, ["name", "specialization"]);
catalog_entity!(Hospital, CatalogKind::Hospital, ["name", "city"]);
catalog_entity!(Service, CatalogKind::Service, ["name", "category"]);
catalog_entity!(AmbulanceType, CatalogKind::Ambulance, ["name"]);

/// Catalog reads over a [`Backend`], optionally cached
#[derive(Debug, Clone)]
pub struct Catalog {
    backend: Arc<dyn Backend>,
    cache: Option<TtlCache<Arc<Vec<Value>>>>,
    search_limit: usize,
}

impl Catalog {
    /// Uncached catalog
    #[must_use]
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self {
            backend,
            cache: None,
            search_limit: 20,
        }
    }

    /// With a TTL cache in front of `list` and `get`
    #[must_use]
    pub fn with_cache(mut self, config: &CacheConfig) -> Self {
        self.cache = Some(TtlCache::new(config.capacity, Duration::from_secs(config.ttl_secs)));
        self
    }

    /// With the maximum rows returned by `search`
    #[inline]
    #[must_use]
    pub fn with_search_limit(mut self, limit: usize) -> Self {
        self.search_limit = limit;
        self
    }

    /// Underlying backend
    #[inline]
    #[must_use]
    pub fn backend(&self) -> &Arc<dyn Backend> {
        &self.backend
    }

    /// Cache, when enabled
    #[inline]
    #[must_use]
    pub fn cache(&self) -> Option<&TtlCache<Arc<Vec<Value>>>> {
        self.cache.as_ref()
    }

    async fn rows(&self, table: &str, query: &Query) -> BackendResult<Arc<Vec<Value>>> {
        let backend = &self.backend;
        let fetch = move || async move { backend.select(table, query).await.map(Arc::new) };
        match &self.cache {
            Some(cache) => cache.get_or_try_insert_with(&query.cache_key(table), fetch).await,
            None => fetch().await,
        }
    }

    /// Every row of `T`'s table
    ///
    /// # Errors
    /// Backend or decode failures.
    pub async fn list<T: CatalogEntity>(&self) -> BackendResult<Vec<T>> {
        let rows = self.rows(T::KIND.table(), &Query::new().order("name", true)).await?;
        decode_all(&rows)
    }

    /// One row by id
    ///
    /// # Errors
    /// `NotFound` when no row has this id; backend or decode failures.
    pub async fn get<T: CatalogEntity>(&self, id: &str) -> BackendResult<T> {
        let table = T::KIND.table();
        let rows = self.rows(table, &Query::new().eq("id", id).limit(1)).await?;
        let row = rows.first().ok_or_else(|| BackendError::not_found(table, id))?;
        Ok(serde_json::from_value(row.clone())?)
    }

    /// Rows whose searchable columns contain the term
    ///
    /// # Errors
    /// Backend or decode failures.
    pub async fn search<T: CatalogEntity>(&self, term: &SearchTerm) -> BackendResult<Vec<T>> {
        let query = Query::new()
            .ilike_any(T::SEARCH_COLUMNS, term.as_str())
            .limit(self.search_limit);
        tracing::debug!(table = T::KIND.table(), term = term.as_str(), "catalog search");
        let rows = self.backend.select(T::KIND.table(), &query).await?;
        decode_all(&rows)
    }

    /// Drop every cached read
    pub fn invalidate_cache(&self) {
        if let Some(cache) = &self.cache {
            cache.invalidate_all();
        }
    }
}

fn decode_all<T: DeserializeOwned>(rows: &[Value]) -> BackendResult<Vec<T>> {
    rows.iter()
        .map(|row| serde_json::from_value(row.clone()).map_err(BackendError::from))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::MockBackend;
    use serde_json::json;

    fn doctor_row(id: &str) -> Value {
        json!({
            "id": id,
            "name": "Dr. Mehta",
            "specialization": "Cardiology",
            "consultation_fee": 800.0
        })
    }

    #[tokio::test]
    async fn get_missing_row_is_not_found() {
        let mut mock = MockBackend::new();
        mock.expect_select().returning(|_, _| Ok(vec![]));
        let catalog = Catalog::new(Arc::new(mock));

        let err = catalog.get::<Doctor>("d-404").await.unwrap_err();
        assert!(matches!(err, BackendError::NotFound { ref entity, ref id } if entity == "doctors" && id == "d-404"));
    }

    #[tokio::test]
    async fn cached_get_hits_backend_once() {
        let mut mock = MockBackend::new();
        mock.expect_select()
            .times(1)
            .returning(|_, _| Ok(vec![doctor_row("d-1")]));
        let catalog = Catalog::new(Arc::new(mock)).with_cache(&CacheConfig::default());

        for _ in 0..3 {
            let doctor: Doctor = catalog.get("d-1").await.unwrap();
            assert_eq!(doctor.specialization, "Cardiology");
        }
    }

    #[tokio::test]
    async fn search_uses_entity_columns() {
        let mut mock = MockBackend::new();
        mock.expect_select()
            .withf(|table, query| {
                table == "medicines"
                    && query
                        .pairs()
                        .contains(&("or".to_string(), "(name.ilike.*dolo*,brand.ilike.*dolo*,category.ilike.*dolo*)".to_string()))
            })
            .returning(|_, _| {
                Ok(vec![json!({
                    "id": "m-1",
                    "name": "Dolo 650",
                    "price": 30.0,
                    "mrp": 34.0,
                    "is_prescription_required": true
                })])
            });
        let catalog = Catalog::new(Arc::new(mock));

        let term = SearchTerm::parse("dolo", 2).unwrap();
        let found: Vec<Medicine> = catalog.search(&term).await.unwrap();
        assert_eq!(found.len(), 1);

        let line = found[0].to_cart_item();
        assert!(line.is_prescription_required);
        assert_eq!((line.price, line.mrp), (30.0, 34.0));
    }

    #[test]
    fn service_category_maps_to_booking_type() {
        let service: Service = serde_json::from_value(json!({
            "id": "s-1",
            "name": "Post-surgery nursing",
            "category": "home_care",
            "price": 1500.0
        }))
        .unwrap();
        assert_eq!(service.booking_type(), Some(BookingType::HomeCare));
    }
}
