//! Error type for client flows
//!
//! Aggregates the lower layers and adds the flow-level refusals:
//! - Booking or ordering without a session
//! - Checkout of an empty cart
//! - Booking with required fields still empty
//! - Booking a tier the last result does not offer

use carehub_backend::BackendError;
use carehub_core::booking::{failure_message, SIGN_IN_REQUIRED_MESSAGE};
use carehub_core::error::{CartError, ConfigError, CoreError, TransitionError};
use carehub_core::risk::PackageTier;
use carehub_store::{PersistError, StoreError};

/// Main app error type
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Domain rule rejected the operation
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Remote call failed
    #[error(transparent)]
    Backend(#[from] BackendError),

    /// Local storage failed
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Operation needs a signed-in user
    #[error("sign-in required")]
    SignInRequired,

    /// Nothing to check out
    #[error("cart is empty")]
    EmptyCart,

    /// Booking draft is missing required fields
    #[error("booking draft incomplete: missing {}", .missing.join(", "))]
    IncompleteDraft {
        /// Names of the empty fields
        missing: Vec<&'static str>,
    },

    /// No assessment result has been stored yet
    #[error("no assessment result available")]
    NoAssessmentResult,

    /// The stored result has no package of this tier
    #[error("no {tier} package in the assessment result")]
    PackageNotFound {
        /// Requested tier
        tier: PackageTier,
    },
}

impl AppError {
    /// Text to show the user
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Core(e) => e.user_message(),
            Self::Backend(e) => e.user_message(),
            Self::SignInRequired => SIGN_IN_REQUIRED_MESSAGE.to_string(),
            Self::EmptyCart => "Your cart is empty.".to_string(),
            Self::IncompleteDraft { missing } => format!("Please choose a {}.", missing.join(" and ")),
            Self::Store(_) | Self::NoAssessmentResult | Self::PackageNotFound { .. } => failure_message(None),
        }
    }

    /// Whether the user can fix this by retrying as-is
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Backend(e) if e.is_retryable())
    }
}

impl From<CartError> for AppError {
    fn from(e: CartError) -> Self {
        Self::Core(e.into())
    }
}

impl From<TransitionError> for AppError {
    fn from(e: TransitionError) -> Self {
        Self::Core(e.into())
    }
}

impl From<ConfigError> for AppError {
    fn from(e: ConfigError) -> Self {
        Self::Core(e.into())
    }
}

impl<E: Into<AppError>> From<PersistError<E>> for AppError {
    fn from(e: PersistError<E>) -> Self {
        match e {
            PersistError::Rejected(inner) => inner.into(),
            PersistError::Store(store) => Self::Store(store),
        }
    }
}

impl From<std::convert::Infallible> for AppError {
    fn from(e: std::convert::Infallible) -> Self {
        match e {}
    }
}

/// Result alias for flows
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use carehub_core::booking::GENERIC_FAILURE_MESSAGE;

    #[test]
    fn sign_in_message_is_blocking_text() {
        assert_eq!(AppError::SignInRequired.user_message(), SIGN_IN_REQUIRED_MESSAGE);
    }

    #[test]
    fn incomplete_draft_lists_fields() {
        let err = AppError::IncompleteDraft {
            missing: vec!["date", "time"],
        };
        assert_eq!(err.user_message(), "Please choose a date and time.");
        assert_eq!(err.to_string(), "booking draft incomplete: missing date, time");
    }

    #[test]
    fn persist_rejection_unwraps_to_cart_error() {
        let err: AppError = PersistError::Rejected(CartError::invalid("x", "missing id")).into();
        assert!(matches!(err, AppError::Core(CoreError::Cart(_))));
        assert_eq!(AppError::NoAssessmentResult.user_message(), GENERIC_FAILURE_MESSAGE);
    }
}
