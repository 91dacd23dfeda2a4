//! Booking confirmation
//!
//! One [`BookingService`] per booking screen. Confirming runs:
//! 1. Required-field check (date, time, service)
//! 2. Session check, immediately before submitting; no session means a
//!    blocking message and no insert
//! 3. In-flight check on the draft's idempotency key
//! 4. Insert, then `Succeeded` (confirmation route) or `Failed` (message)

use crate::error::{AppError, AppResult};
use carehub_backend::{insert_booking, Backend, CancellationToken};
use carehub_core::booking::{standard_time_slots, BookingDraft, BookingMachine, BookingState, IdempotencyKey};
use carehub_core::error::TransitionError;
use carehub_core::pricing::{FeeSchedule, PriceBreakdown};
use carehub_core::route::Route;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Instant;

/// Idempotency keys of submissions currently in flight
#[derive(Debug, Clone, Default)]
pub struct InFlight {
    keys: Arc<DashMap<IdempotencyKey, Instant>>,
}

impl InFlight {
    /// Claim `key`; `None` if another submission holds it
    fn claim(&self, key: &IdempotencyKey) -> Option<InFlightGuard> {
        match self.keys.entry(key.clone()) {
            Entry::Occupied(_) => None,
            Entry::Vacant(slot) => {
                slot.insert(Instant::now());
                Some(InFlightGuard {
                    keys: Arc::clone(&self.keys),
                    key: key.clone(),
                })
            }
        }
    }

    /// Number of submissions in flight
    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

/// Releases a claimed key when the submission ends, however it ends
struct InFlightGuard {
    keys: Arc<DashMap<IdempotencyKey, Instant>>,
    key: IdempotencyKey,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        if let Some((_, started)) = self.keys.remove(&self.key) {
            tracing::debug!(key = %self.key, elapsed = ?started.elapsed(), "submission finished");
        }
    }
}

/// Confirmation state and submission for one booking screen
#[derive(Debug)]
pub struct BookingService {
    backend: Arc<dyn Backend>,
    fees: FeeSchedule,
    in_flight: InFlight,
    machine: Mutex<BookingMachine>,
}

impl BookingService {
    #[must_use]
    pub fn new(backend: Arc<dyn Backend>, fees: FeeSchedule, in_flight: InFlight) -> Self {
        Self {
            backend,
            fees,
            in_flight,
            machine: Mutex::new(BookingMachine::new()),
        }
    }

    /// Current confirmation state
    #[must_use]
    pub fn state(&self) -> BookingState {
        self.machine.lock().state().clone()
    }

    /// Whether the confirm control should be disabled
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.machine.lock().is_busy()
    }

    /// Price breakdown shown before confirming
    #[must_use]
    pub fn quote(&self, draft: &BookingDraft) -> PriceBreakdown {
        draft.quote(&self.fees)
    }

    /// Slots offered for any date
    #[must_use]
    pub fn time_slots(&self) -> Vec<String> {
        standard_time_slots()
    }

    /// Submit `draft`
    ///
    /// # Errors
    /// - `IncompleteDraft` when date, time or service is missing
    /// - `SignInRequired` when there is no session (nothing is inserted)
    /// - `AlreadySubmitting` when the same draft is already in flight
    /// - `Illegal` transition after a success (the state is terminal)
    /// - The backend error when the insert fails; the state then holds its
    ///   user-facing message
    pub async fn confirm(&self, draft: &BookingDraft, token: &CancellationToken) -> AppResult<Route> {
        let missing = draft.missing_fields();
        if !missing.is_empty() {
            return Err(AppError::IncompleteDraft { missing });
        }

        let Some(user) = token.run(self.backend.current_user()).await? else {
            tracing::info!(booking_type = draft.booking_type.as_str(), "booking blocked: not signed in");
            return Err(AppError::SignInRequired);
        };
        let row = draft
            .to_new_booking(&user.id, &self.fees)
            .ok_or_else(|| AppError::IncompleteDraft {
                missing: draft.missing_fields(),
            })?;

        let Some(_guard) = self.in_flight.claim(&row.idempotency_key) else {
            tracing::warn!(key = %row.idempotency_key, "duplicate submit ignored");
            return Err(TransitionError::AlreadySubmitting.into());
        };
        self.machine.lock().begin(row.idempotency_key.clone())?;

        match token.run(insert_booking(self.backend.as_ref(), &row)).await {
            Ok(booking_id) => {
                self.machine.lock().succeed(booking_id.clone())?;
                Ok(Route::BookingConfirmation { booking_id })
            }
            Err(error) => {
                let message = error.user_message();
                tracing::error!(%error, key = %row.idempotency_key, "booking failed");
                self.machine.lock().fail(message)?;
                Err(error.into())
            }
        }
    }

    /// Dismiss a failure and return to the form
    ///
    /// # Errors
    /// `Illegal` unless the state is `Failed`.
    pub fn dismiss_failure(&self) -> AppResult<()> {
        self.machine.lock().reset()?;
        Ok(())
    }
}
