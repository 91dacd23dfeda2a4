//! CareHub App - client flows over the core, store and backend crates
//!
//! Each flow is what one group of screens does:
//! - **Assessment**: questionnaire draft, engine submission, package booking
//! - **Search**: listing filters and the global search page
//! - **Checkout**: cart review and order placement
//! - **Booking**: confirmation state machine with idempotent submission
//!
//! # Example
//!
//! ```rust,ignore
//! use carehub_app::AppContext;
//! use carehub_backend::CancellationToken;
//! use carehub_core::config::AppConfig;
//!
//! # async fn example() -> Result<(), carehub_app::AppError> {
//! let ctx = AppContext::from_config(AppConfig::load(None)?).await?;
//! let results = ctx.search().everywhere("vitamin d", &CancellationToken::new()).await;
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod assessment;
pub mod booking;
pub mod checkout;
pub mod context;
pub mod error;
pub mod search;
pub mod telemetry;

pub use assessment::{AssessmentFlow, SubmitOutcome};
pub use booking::{BookingService, InFlight};
pub use checkout::CheckoutFlow;
pub use context::AppContext;
pub use error::{AppError, AppResult};
pub use search::SearchFlow;
pub use telemetry::{init_tracing, LogFormat};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
