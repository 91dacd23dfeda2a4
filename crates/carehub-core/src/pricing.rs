//! Booking price composition
//!
//! Every booking flow prices the same way:
//! `total = base + optional fees + flat tax`.
//! The tax is a flat rupee amount per booking type, not a rate.

use crate::error::FeeError;
use crate::types::round_rupees;
use serde::{Deserialize, Serialize};

/// Bookable service families
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingType {
    DoctorConsultation,
    LabTest,
    Scan,
    HomeCare,
    Physiotherapy,
    Wellness,
    Surgery,
    Ambulance,
}

impl BookingType {
    pub const ALL: [BookingType; 8] = [
        Self::DoctorConsultation,
        Self::LabTest,
        Self::Scan,
        Self::HomeCare,
        Self::Physiotherapy,
        Self::Wellness,
        Self::Surgery,
        Self::Ambulance,
    ];

    #[inline]
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::DoctorConsultation => "doctor_consultation",
            Self::LabTest => "lab_test",
            Self::Scan => "scan",
            Self::HomeCare => "home_care",
            Self::Physiotherapy => "physiotherapy",
            Self::Wellness => "wellness",
            Self::Surgery => "surgery",
            Self::Ambulance => "ambulance",
        }
    }
}

impl std::str::FromStr for BookingType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("unknown booking type: {s}"))
    }
}

/// Fee toggles chosen on the booking screen
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct BookingOptions {
    /// Doctor or physiotherapist visits at home
    pub home_visit: bool,
    /// Lab sample collected at home
    pub home_collection: bool,
    /// Extra attendant for home care
    pub add_on_staff: bool,
}

/// Hardcoded fee and tax constants, overridable from config
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeeSchedule {
    pub doctor_home_visit_fee: f64,
    pub physio_home_visit_fee: f64,
    pub lab_home_collection_fee: f64,
    pub home_care_add_on_staff_fee: f64,
    /// Flat tax on most bookings
    pub standard_tax: f64,
    /// Flat tax on home care bookings
    pub home_care_tax: f64,
}

impl Default for FeeSchedule {
    fn default() -> Self {
        Self {
            doctor_home_visit_fee: 200.0,
            physio_home_visit_fee: 150.0,
            lab_home_collection_fee: 100.0,
            home_care_add_on_staff_fee: 500.0,
            standard_tax: 18.0,
            home_care_tax: 50.0,
        }
    }
}

impl FeeSchedule {
    /// Flat tax for a booking type
    #[must_use]
    pub fn tax_for(&self, booking_type: BookingType) -> f64 {
        match booking_type {
            BookingType::HomeCare => self.home_care_tax,
            BookingType::Surgery | BookingType::Ambulance => 0.0,
            _ => self.standard_tax,
        }
    }

    /// Optional fees switched on by `options` for a booking type
    #[must_use]
    pub fn fees_for(&self, booking_type: BookingType, options: BookingOptions) -> Vec<FeeLine> {
        let mut fees = Vec::new();
        match booking_type {
            BookingType::DoctorConsultation if options.home_visit => {
                fees.push(FeeLine::new("Home visit", self.doctor_home_visit_fee));
            }
            BookingType::Physiotherapy if options.home_visit => {
                fees.push(FeeLine::new("Home visit", self.physio_home_visit_fee));
            }
            BookingType::LabTest if options.home_collection => {
                fees.push(FeeLine::new("Home collection", self.lab_home_collection_fee));
            }
            BookingType::HomeCare if options.add_on_staff => {
                fees.push(FeeLine::new("Additional staff", self.home_care_add_on_staff_fee));
            }
            _ => {}
        }
        fees
    }

    /// Validate that no constant is negative or non-finite
    ///
    /// # Errors
    /// `FeeError` for the first bad field.
    pub fn validate(&self) -> Result<(), FeeError> {
        let fields = [
            ("doctor_home_visit_fee", self.doctor_home_visit_fee),
            ("physio_home_visit_fee", self.physio_home_visit_fee),
            ("lab_home_collection_fee", self.lab_home_collection_fee),
            ("home_care_add_on_staff_fee", self.home_care_add_on_staff_fee),
            ("standard_tax", self.standard_tax),
            ("home_care_tax", self.home_care_tax),
        ];
        match fields.iter().find(|(_, v)| !v.is_finite() || *v < 0.0) {
            Some(&(field, value)) => Err(FeeError { field, value }),
            None => Ok(()),
        }
    }
}

/// One optional fee on a quote
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeeLine {
    pub label: &'static str,
    pub amount: f64,
}

impl FeeLine {
    #[inline]
    #[must_use]
    pub fn new(label: &'static str, amount: f64) -> Self {
        Self { label, amount }
    }
}

/// Itemised booking quote
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceBreakdown {
    pub booking_type: BookingType,
    pub base: f64,
    pub fees: Vec<FeeLine>,
    pub tax: f64,
    pub total: f64,
}

/// Price a booking
#[must_use]
pub fn compose(
    booking_type: BookingType,
    base: f64,
    options: BookingOptions,
    schedule: &FeeSchedule,
) -> PriceBreakdown {
    let fees = schedule.fees_for(booking_type, options);
    let tax = schedule.tax_for(booking_type);
    let total = round_rupees(base + fees.iter().map(|f| f.amount).sum::<f64>() + tax);
    PriceBreakdown {
        booking_type,
        base,
        fees,
        tax,
        total,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn doctor_consultation_with_home_visit() {
        let quote = compose(
            BookingType::DoctorConsultation,
            500.0,
            BookingOptions {
                home_visit: true,
                ..Default::default()
            },
            &FeeSchedule::default(),
        );
        assert_eq!(quote.fees.len(), 1);
        assert_eq!(quote.tax, 18.0);
        assert_eq!(quote.total, 718.0);
    }

    #[test]
    fn home_care_uses_fifty_rupee_tax() {
        let quote = compose(
            BookingType::HomeCare,
            1200.0,
            BookingOptions {
                add_on_staff: true,
                ..Default::default()
            },
            &FeeSchedule::default(),
        );
        assert_eq!(quote.total, 1200.0 + 500.0 + 50.0);
    }

    #[test]
    fn toggles_only_apply_to_their_booking_type() {
        let quote = compose(
            BookingType::Scan,
            1500.0,
            BookingOptions {
                home_visit: true,
                home_collection: true,
                add_on_staff: true,
            },
            &FeeSchedule::default(),
        );
        assert!(quote.fees.is_empty());
        assert_eq!(quote.total, 1518.0);
    }

    #[test]
    fn lab_home_collection() {
        let quote = compose(
            BookingType::LabTest,
            349.0,
            BookingOptions {
                home_collection: true,
                ..Default::default()
            },
            &FeeSchedule::default(),
        );
        assert_eq!(quote.total, 467.0);
    }

    #[test]
    fn surgery_and_ambulance_are_untaxed() {
        let schedule = FeeSchedule::default();
        assert_eq!(schedule.tax_for(BookingType::Surgery), 0.0);
        assert_eq!(
            compose(BookingType::Ambulance, 1999.5, BookingOptions::default(), &schedule).total,
            2000.0
        );
    }

    #[test]
    fn booking_type_parses() {
        assert_eq!("home_care".parse::<BookingType>(), Ok(BookingType::HomeCare));
        assert!("teleport".parse::<BookingType>().is_err());
    }

    #[test]
    fn negative_fee_fails_validation() {
        let schedule = FeeSchedule {
            standard_tax: -1.0,
            ..Default::default()
        };
        let err = schedule.validate().unwrap_err();
        assert_eq!(err.field, "standard_tax");
        assert_eq!(err.value, -1.0);
    }

    #[test]
    fn non_finite_fee_fails_validation() {
        let schedule = FeeSchedule {
            physio_home_visit_fee: f64::NAN,
            ..Default::default()
        };
        assert_eq!(schedule.validate().unwrap_err().field, "physio_home_visit_fee");
    }
}
