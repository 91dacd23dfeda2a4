//! Error types for CareHub Core
//!
//! Covers the failures that can happen without touching the network:
//! - Rejected cart mutations
//! - Illegal booking state transitions
//! - Configuration loading and validation

use crate::booking::BookingPhase;
use crate::cart::ItemKind;

/// Main core error type
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// Cart mutation rejected
    #[error("cart error: {0}")]
    Cart(#[from] CartError),

    /// Booking state machine rejected a transition
    #[error("booking state error: {0}")]
    Transition(#[from] TransitionError),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl CoreError {
    /// Message suitable for showing to the user
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Cart(CartError::InvalidItem { .. }) => {
                "This item could not be added to your cart.".to_string()
            }
            Self::Cart(CartError::NotInCart { .. }) => {
                "This item is no longer in your cart.".to_string()
            }
            Self::Transition(TransitionError::AlreadySubmitting) => {
                "Your booking is already being submitted.".to_string()
            }
            Self::Transition(_) | Self::Config(_) => {
                crate::booking::GENERIC_FAILURE_MESSAGE.to_string()
            }
        }
    }
}

/// Cart reducer errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CartError {
    /// Line item failed validation
    #[error("invalid line item {id}: {reason}")]
    InvalidItem { id: String, reason: String },

    /// Referenced line item does not exist
    #[error("{kind:?} {id} is not in the cart")]
    NotInCart { kind: ItemKind, id: String },
}

impl CartError {
    /// Invalid item helper
    #[inline]
    pub fn invalid(id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidItem {
            id: id.into(),
            reason: reason.into(),
        }
    }
}

/// Booking state machine errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransitionError {
    /// A submission with this draft is already in flight
    #[error("a submission is already in flight")]
    AlreadySubmitting,

    /// Transition not allowed from the current state
    #[error("illegal booking transition: {from:?} -> {to:?}")]
    Illegal { from: BookingPhase, to: BookingPhase },
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid TOML for `AppConfig`
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// Config parsed but failed validation
    #[error("invalid config: {0}")]
    Invalid(String),

    /// Fee schedule holds an unusable amount
    #[error("invalid config: {0}")]
    Fee(#[from] FeeError),
}

/// A fee schedule constant that cannot be charged
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("fees.{field} must be a non-negative amount, got {value}")]
pub struct FeeError {
    /// Name of the offending field under `[fees]`
    pub field: &'static str,
    /// Amount as configured
    pub value: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn core_error_display() {
        let err = CoreError::from(CartError::invalid("med-1", "quantity must be positive"));
        assert!(err.to_string().contains("invalid line item med-1"));
    }

    #[test]
    fn user_message_for_duplicate_submit() {
        let err = CoreError::from(TransitionError::AlreadySubmitting);
        assert_eq!(err.user_message(), "Your booking is already being submitted.");
    }

    #[test]
    fn illegal_transition_display() {
        let err = TransitionError::Illegal {
            from: BookingPhase::Succeeded,
            to: BookingPhase::Submitting,
        };
        assert!(err.to_string().contains("Succeeded -> Submitting"));
    }
}
