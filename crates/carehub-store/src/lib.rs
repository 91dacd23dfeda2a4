//! CareHub Store - local persistence boundary
//!
//! The only place the client touches local storage.
//!
//! # Core Operations
//!
//! - **Key-value**: read/write/remove JSON blobs under string keys
//! - **Persisted stores**: reducer stores mirrored to a key after every change
//! - **Slots**: single immutable values (the last assessment result)
//! - **Cache**: TTL-bounded cache for catalog reads
//!
//! # Architecture
//!
//! ```text
//! Action → Store<R> → snapshot → serde_json → KeyValueStore (file / memory)
//!                          ↑______________________________↓
//!                                 restore on startup
//! ```
//!
//! Stored values carry no schema version. A blob that no longer parses is
//! logged and treated as absent.

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod cache;
pub mod error;
pub mod kv;
pub mod persisted;

pub use cache::{CacheStats, TtlCache};
pub use error::{PersistError, StoreError};
pub use kv::{FileStore, KeyValueStore, MemoryStore};
pub use persisted::{JsonSlot, PersistedStore};

/// Keys used for local state
pub mod keys {
    /// In-progress questionnaire
    pub const ASSESSMENT_DRAFT: &str = "health_assessment_draft";
    /// Last engine result
    pub const ASSESSMENT_RESULT: &str = "health_assessment_result";
    /// Cart contents
    pub const CART: &str = "cart";
    /// Selected city and pincode
    pub const LOCATION: &str = "location";
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
