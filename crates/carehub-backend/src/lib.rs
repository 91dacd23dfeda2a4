//! CareHub Backend - typed access to the hosted backend
//!
//! Everything that crosses the network goes through the [`Backend`] trait:
//! - **Catalog**: list, get and search every catalog table, with a TTL cache
//! - **Risk engine**: questionnaire in, risk scores and packages out
//! - **Records**: idempotent booking inserts and order placement
//! - **Search**: concurrent, settle-all search over several sections
//! - **Cancellation**: any fetch can be bound to a [`CancellationToken`]
//!
//! # Architecture
//!
//! ```text
//! Catalog / RiskEngine / records ──► dyn Backend ──► RestBackend (reqwest)
//!                                          └───────► test doubles
//! ```

#![warn(unreachable_pub)]

pub mod cancel;
pub mod catalog;
pub mod client;
pub mod engine;
pub mod error;
pub mod query;
pub mod records;
pub mod search;

pub use cancel::CancellationToken;
pub use catalog::{AmbulanceType, Catalog, CatalogEntity, Doctor, Hospital, LabTest, Medicine, Scan, Service};
pub use client::{select_rows, AuthUser, Backend, RestBackend};
pub use engine::{RiskEngine, ENGINE_FUNCTION};
pub use error::{BackendError, BackendResult};
pub use query::{InsertOptions, Query};
pub use records::{insert_booking, insert_order, NewOrder};
pub use search::{global_search, SearchResults, SearchTerm, Section};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
