//! Body-mass index derivation
//!
//! `bmi = weight_kg / (height_cm / 100)^2`, rounded to one decimal. Inputs
//! that are missing, non-numeric or not strictly positive produce `None`;
//! callers treat that as "leave the previous value alone".

use serde::{Deserialize, Serialize};

/// Compute BMI from kilograms and centimeters
#[must_use]
pub fn compute_bmi(weight_kg: f64, height_cm: f64) -> Option<f64> {
    if !(weight_kg.is_finite() && height_cm.is_finite()) || weight_kg <= 0.0 || height_cm <= 0.0 {
        return None;
    }
    let meters = height_cm / 100.0;
    Some(round_one_decimal(weight_kg / (meters * meters)))
}

/// Compute BMI from raw form inputs
#[must_use]
pub fn derive_bmi(weight: &str, height: &str) -> Option<f64> {
    compute_bmi(parse_number(weight)?, parse_number(height)?)
}

/// Parse a numeric form field; blanks and junk yield `None`
#[must_use]
pub fn parse_number(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|n| n.is_finite())
}

#[inline]
fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// WHO adult BMI bands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BmiCategory {
    Underweight,
    Normal,
    Overweight,
    Obese,
}

impl BmiCategory {
    /// Band for a BMI value
    #[must_use]
    pub fn from_bmi(bmi: f64) -> Self {
        if bmi < 18.5 {
            Self::Underweight
        } else if bmi < 25.0 {
            Self::Normal
        } else if bmi < 30.0 {
            Self::Overweight
        } else {
            Self::Obese
        }
    }

    /// Display label
    #[inline]
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Underweight => "Underweight",
            Self::Normal => "Normal",
            Self::Overweight => "Overweight",
            Self::Obese => "Obese",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn known_value() {
        assert_eq!(compute_bmi(70.0, 175.0), Some(22.9));
        assert_eq!(derive_bmi("80", "180"), Some(24.7));
    }

    #[test]
    fn non_positive_height_is_skipped() {
        assert_eq!(compute_bmi(70.0, 0.0), None);
        assert_eq!(compute_bmi(70.0, -170.0), None);
        assert_eq!(compute_bmi(0.0, 170.0), None);
    }

    #[test]
    fn blank_or_junk_inputs_are_skipped() {
        assert_eq!(derive_bmi("", "170"), None);
        assert_eq!(derive_bmi("70", "  "), None);
        assert_eq!(derive_bmi("seventy", "170"), None);
        assert_eq!(derive_bmi("70", "NaN"), None);
    }

    #[test]
    fn category_bands() {
        assert_eq!(BmiCategory::from_bmi(17.0), BmiCategory::Underweight);
        assert_eq!(BmiCategory::from_bmi(22.9), BmiCategory::Normal);
        assert_eq!(BmiCategory::from_bmi(25.0), BmiCategory::Overweight);
        assert_eq!(BmiCategory::from_bmi(31.2).label(), "Obese");
    }

    proptest! {
        #[test]
        fn prop_matches_formula(w in 1.0f64..300.0, h in 30.0f64..250.0) {
            let expected = (w / ((h / 100.0) * (h / 100.0)) * 10.0).round() / 10.0;
            prop_assert_eq!(compute_bmi(w, h), Some(expected));
        }

        #[test]
        fn prop_non_positive_height_never_computes(w in 1.0f64..300.0, h in -250.0f64..=0.0) {
            prop_assert_eq!(compute_bmi(w, h), None);
        }
    }
}
