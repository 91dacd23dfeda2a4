//! Booking drafts and the confirmation state machine
//!
//! ```text
//! Idle ──► Submitting ──► Succeeded
//!  ▲            │
//!  │            ▼
//!  └──────── Failed ──► Submitting (manual retry)
//! ```
//!
//! Each submission carries an [`IdempotencyKey`] derived from the draft, so a
//! repeated submit of the same draft is recognisable both locally and by the
//! backend.

use crate::error::TransitionError;
use crate::pricing::{compose, BookingOptions, BookingType, FeeSchedule, PriceBreakdown};
use crate::types::{BookingId, ProfileId};
use chrono::{Duration, NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Shown when the backend gives no usable error text
pub const GENERIC_FAILURE_MESSAGE: &str = "Something went wrong. Please try again.";

/// Shown when booking is attempted without a session
pub const SIGN_IN_REQUIRED_MESSAGE: &str = "Please sign in to confirm your booking.";

/// Stable key identifying one booking attempt
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdempotencyKey(pub String);

impl IdempotencyKey {
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for IdempotencyKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// What the user has chosen on a booking screen
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookingDraft {
    pub booking_type: BookingType,
    pub service_catalog_id: String,
    pub booking_date: Option<NaiveDate>,
    pub booking_time: Option<String>,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub options: BookingOptions,
    /// Listed price of the service before fees and tax
    pub base_price: f64,
}

impl BookingDraft {
    /// Draft with no slot selected
    #[must_use]
    pub fn new(booking_type: BookingType, service_catalog_id: impl Into<String>, base_price: f64) -> Self {
        Self {
            booking_type,
            service_catalog_id: service_catalog_id.into(),
            booking_date: None,
            booking_time: None,
            notes: String::new(),
            options: BookingOptions::default(),
            base_price,
        }
    }

    /// With date and time slot
    #[inline]
    #[must_use]
    pub fn with_slot(mut self, date: NaiveDate, time: impl Into<String>) -> Self {
        self.booking_date = Some(date);
        self.booking_time = Some(time.into());
        self
    }

    /// With free-text notes
    #[inline]
    #[must_use]
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = notes.into();
        self
    }

    /// With fee toggles
    #[inline]
    #[must_use]
    pub fn with_options(mut self, options: BookingOptions) -> Self {
        self.options = options;
        self
    }

    /// Names of required fields that are still empty
    #[must_use]
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.service_catalog_id.trim().is_empty() {
            missing.push("service");
        }
        if self.booking_date.is_none() {
            missing.push("date");
        }
        if self.booking_time.as_deref().map_or(true, |t| t.trim().is_empty()) {
            missing.push("time");
        }
        missing
    }

    /// Price quote for this draft
    #[must_use]
    pub fn quote(&self, schedule: &FeeSchedule) -> PriceBreakdown {
        compose(self.booking_type, self.base_price, self.options, schedule)
    }

    /// Key for this draft submitted by `profile`
    ///
    /// Identical drafts from the same profile always produce the same key.
    #[must_use]
    pub fn idempotency_key(&self, profile: &ProfileId) -> IdempotencyKey {
        let date = self.booking_date.map(|d| d.to_string()).unwrap_or_default();
        let pricing = format!(
            "{}|{}|{}|{}",
            self.base_price,
            self.options.home_visit,
            self.options.home_collection,
            self.options.add_on_staff
        );
        let parts: [&str; 7] = [
            profile.as_str(),
            self.booking_type.as_str(),
            self.service_catalog_id.as_str(),
            &date,
            self.booking_time.as_deref().unwrap_or_default(),
            self.notes.as_str(),
            &pricing,
        ];

        let mut hasher = Sha256::new();
        for part in parts {
            hasher.update(part.as_bytes());
            hasher.update([0x1f]);
        }
        IdempotencyKey(hex::encode(hasher.finalize()))
    }

    /// Row to insert, or `None` while the slot is incomplete
    #[must_use]
    pub fn to_new_booking(&self, profile: &ProfileId, schedule: &FeeSchedule) -> Option<NewBooking> {
        if !self.missing_fields().is_empty() {
            return None;
        }
        Some(NewBooking {
            service_catalog_id: self.service_catalog_id.clone(),
            booking_date: self.booking_date?.format("%Y-%m-%d").to_string(),
            booking_time: self.booking_time.clone()?,
            notes: self.notes.clone(),
            profile_id: profile.clone(),
            booking_type: self.booking_type,
            total_amount: self.quote(schedule).total,
            idempotency_key: self.idempotency_key(profile),
        })
    }
}

/// Row sent to the `bookings` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewBooking {
    pub service_catalog_id: String,
    pub booking_date: String,
    pub booking_time: String,
    pub notes: String,
    pub profile_id: ProfileId,
    pub booking_type: BookingType,
    pub total_amount: f64,
    pub idempotency_key: IdempotencyKey,
}

/// Half-hour slots offered on booking screens (09:00 AM – 07:30 PM)
#[must_use]
pub fn standard_time_slots() -> Vec<String> {
    let Some(start) = NaiveTime::from_hms_opt(9, 0, 0) else {
        return Vec::new();
    };
    (0..22)
        .map(|i| (start + Duration::minutes(30 * i)).format("%I:%M %p").to_string())
        .collect()
}

/// Data-free view of [`BookingState`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BookingPhase {
    Idle,
    Submitting,
    Succeeded,
    Failed,
}

/// Confirmation flow state
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum BookingState {
    #[default]
    Idle,
    Submitting { key: IdempotencyKey },
    Succeeded { booking_id: BookingId },
    Failed { message: String },
}

impl BookingState {
    #[inline]
    #[must_use]
    pub fn phase(&self) -> BookingPhase {
        match self {
            Self::Idle => BookingPhase::Idle,
            Self::Submitting { .. } => BookingPhase::Submitting,
            Self::Succeeded { .. } => BookingPhase::Succeeded,
            Self::Failed { .. } => BookingPhase::Failed,
        }
    }
}

/// Phases reachable from `from`
#[must_use]
pub fn allowed_transitions(from: BookingPhase) -> Vec<BookingPhase> {
    use BookingPhase::{Failed, Idle, Submitting, Succeeded};
    match from {
        Idle => vec![Submitting],
        Submitting => vec![Succeeded, Failed],
        Failed => vec![Submitting, Idle],
        Succeeded => vec![],
    }
}

/// Validate a phase transition
///
/// # Errors
/// `AlreadySubmitting` for a second submit while one is in flight,
/// `Illegal` for anything else not in [`allowed_transitions`].
pub fn validate_transition(from: BookingPhase, to: BookingPhase) -> Result<(), TransitionError> {
    if from == BookingPhase::Submitting && to == BookingPhase::Submitting {
        return Err(TransitionError::AlreadySubmitting);
    }
    if allowed_transitions(from).contains(&to) {
        Ok(())
    } else {
        Err(TransitionError::Illegal { from, to })
    }
}

/// Guarded holder of a [`BookingState`]
#[derive(Debug, Clone, Default)]
pub struct BookingMachine {
    state: BookingState,
}

impl BookingMachine {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    #[must_use]
    pub fn state(&self) -> &BookingState {
        &self.state
    }

    /// Whether the confirm control should be disabled
    #[inline]
    #[must_use]
    pub fn is_busy(&self) -> bool {
        matches!(self.state, BookingState::Submitting { .. })
    }

    /// Idle/Failed → Submitting
    ///
    /// # Errors
    /// See [`validate_transition`].
    pub fn begin(&mut self, key: IdempotencyKey) -> Result<(), TransitionError> {
        self.transition(BookingState::Submitting { key })
    }

    /// Submitting → Succeeded
    ///
    /// # Errors
    /// See [`validate_transition`].
    pub fn succeed(&mut self, booking_id: BookingId) -> Result<(), TransitionError> {
        self.transition(BookingState::Succeeded { booking_id })
    }

    /// Submitting → Failed
    ///
    /// # Errors
    /// See [`validate_transition`].
    pub fn fail(&mut self, message: impl Into<String>) -> Result<(), TransitionError> {
        self.transition(BookingState::Failed {
            message: message.into(),
        })
    }

    /// Failed → Idle
    ///
    /// # Errors
    /// See [`validate_transition`].
    pub fn reset(&mut self) -> Result<(), TransitionError> {
        self.transition(BookingState::Idle)
    }

    fn transition(&mut self, next: BookingState) -> Result<(), TransitionError> {
        validate_transition(self.state.phase(), next.phase())?;
        tracing::debug!(from = ?self.state.phase(), to = ?next.phase(), "booking transition");
        self.state = next;
        Ok(())
    }
}

/// Backend text verbatim when present, otherwise the generic fallback
#[must_use]
pub fn failure_message(remote: Option<&str>) -> String {
    match remote.map(str::trim) {
        Some(text) if !text.is_empty() => text.to_string(),
        _ => GENERIC_FAILURE_MESSAGE.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> BookingDraft {
        BookingDraft::new(BookingType::DoctorConsultation, "svc-42", 500.0)
            .with_slot(NaiveDate::from_ymd_opt(2026, 11, 2).unwrap(), "10:30 AM")
            .with_notes("follow-up")
    }

    #[test]
    fn same_draft_same_key() {
        let profile = ProfileId::new("p-1");
        assert_eq!(draft().idempotency_key(&profile), draft().idempotency_key(&profile));
        assert_eq!(draft().idempotency_key(&profile).as_str().len(), 64);
    }

    #[test]
    fn different_slot_different_key() {
        let profile = ProfileId::new("p-1");
        let other = draft().with_slot(NaiveDate::from_ymd_opt(2026, 11, 3).unwrap(), "10:30 AM");
        assert_ne!(draft().idempotency_key(&profile), other.idempotency_key(&profile));
        assert_ne!(
            draft().idempotency_key(&profile),
            draft().idempotency_key(&ProfileId::new("p-2"))
        );
    }

    #[test]
    fn incomplete_draft_has_no_row() {
        let bare = BookingDraft::new(BookingType::Scan, "scan-1", 900.0);
        assert_eq!(bare.missing_fields(), vec!["date", "time"]);
        assert!(bare
            .to_new_booking(&ProfileId::new("p"), &FeeSchedule::default())
            .is_none());
    }

    #[test]
    fn new_booking_carries_total_and_key() {
        let profile = ProfileId::new("p-1");
        let row = draft().to_new_booking(&profile, &FeeSchedule::default()).unwrap();
        assert_eq!(row.booking_date, "2026-11-02");
        assert_eq!(row.total_amount, 518.0);
        assert_eq!(row.idempotency_key, draft().idempotency_key(&profile));
    }

    #[test]
    fn happy_path() {
        let mut machine = BookingMachine::new();
        machine.begin(IdempotencyKey("k".into())).unwrap();
        assert!(machine.is_busy());
        machine.succeed(BookingId::new("b-1")).unwrap();
        assert_eq!(
            machine.state(),
            &BookingState::Succeeded {
                booking_id: BookingId::new("b-1")
            }
        );
    }

    #[test]
    fn double_submit_rejected() {
        let mut machine = BookingMachine::new();
        machine.begin(IdempotencyKey("k".into())).unwrap();
        assert_eq!(
            machine.begin(IdempotencyKey("k".into())),
            Err(TransitionError::AlreadySubmitting)
        );
    }

    #[test]
    fn failure_allows_retry() {
        let mut machine = BookingMachine::new();
        machine.begin(IdempotencyKey("k".into())).unwrap();
        machine.fail("slot taken").unwrap();
        assert!(!machine.is_busy());
        assert!(machine.begin(IdempotencyKey("k".into())).is_ok());
    }

    #[test]
    fn succeeded_is_terminal() {
        let mut machine = BookingMachine::new();
        machine.begin(IdempotencyKey("k".into())).unwrap();
        machine.succeed(BookingId::new("b")).unwrap();
        assert!(matches!(
            machine.begin(IdempotencyKey("k".into())),
            Err(TransitionError::Illegal { .. })
        ));
        assert!(machine.reset().is_err());
    }

    #[test]
    fn idle_cannot_finish() {
        let mut machine = BookingMachine::new();
        assert!(machine.succeed(BookingId::new("b")).is_err());
        assert!(machine.fail("x").is_err());
    }

    #[test]
    fn failure_message_fallback() {
        assert_eq!(failure_message(Some("Slot unavailable")), "Slot unavailable");
        assert_eq!(failure_message(Some("   ")), GENERIC_FAILURE_MESSAGE);
        assert_eq!(failure_message(None), GENERIC_FAILURE_MESSAGE);
    }

    #[test]
    fn time_slots() {
        let slots = standard_time_slots();
        assert_eq!(slots.first().map(String::as_str), Some("09:00 AM"));
        assert_eq!(slots.last().map(String::as_str), Some("07:30 PM"));
        assert_eq!(slots.len(), 22);
    }
}
