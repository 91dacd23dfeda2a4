//! CareHub Core - domain model for the healthcare catalog and booking client
//!
//! Owns everything that does not talk to the network:
//! - The health assessment questionnaire draft and its BMI derivation
//! - Risk classification of engine results and package selection
//! - Cart line items, the cart reducer and package expansion
//! - Per-booking-type price composition
//! - The booking confirmation state machine and idempotency keys
//! - Explicit state containers (`Store`) that replace module-level globals
//!
//! # Example
//!
//! ```rust
//! use carehub_core::cart::{expand_package, CartAction, CartReducer, CartState};
//! use carehub_core::risk::{Package, PackageTier, TestItem};
//! use carehub_core::store::Store;
//!
//! let package = Package {
//!     tier: PackageTier::Basic,
//!     name: "Heart Basic".into(),
//!     tests: vec![TestItem::new("lipid", "Lipid Profile", 250.0)],
//!     price: 1000.0,
//!     discount: 200.0,
//!     final_price: 800.0,
//! };
//!
//! let cart: Store<CartReducer> = Store::new(CartState::default());
//! for item in expand_package(&package) {
//!     cart.dispatch(CartAction::Add(item)).unwrap();
//! }
//! assert_eq!(cart.state().items[0].price, 200.0);
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod assessment;
pub mod bmi;
pub mod booking;
pub mod cart;
pub mod config;
pub mod error;
pub mod location;
pub mod pricing;
pub mod risk;
pub mod route;
pub mod store;
pub mod types;

pub use assessment::{
    AssessmentDraft, EngineRequest, QuestionnaireAction, QuestionnairePayload,
    QuestionnaireReducer, QuestionnaireStep,
};
pub use booking::{BookingDraft, BookingMachine, BookingState, IdempotencyKey, NewBooking};
pub use cart::{CartAction, CartLineItem, CartReducer, CartState, CartSummary, ItemKind};
pub use config::AppConfig;
pub use error::{CartError, ConfigError, CoreError, FeeError, TransitionError};
pub use pricing::{BookingOptions, BookingType, FeeSchedule, PriceBreakdown};
pub use risk::{AssessmentResult, Package, PackageTier, RiskBand, RiskLevel, RiskSummary};
pub use route::Route;
pub use store::{Reducer, Snapshot, Store};
pub use types::{BookingId, CatalogKind, ProfileId};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with CareHub Core
    pub use crate::{
        AppConfig, AssessmentDraft, AssessmentResult, BookingDraft, BookingType, CartAction,
        CartLineItem, CartReducer, CartState, Package, QuestionnaireAction, QuestionnaireReducer,
        Route, Store,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
