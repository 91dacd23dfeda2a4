//! Risk engine results and their classification
//!
//! Two classification sources coexist and are deliberately kept apart:
//! - [`RiskBand`] thresholds each body-system score locally (`> 70`, `> 30`)
//! - [`RiskLevel`] is the overall level the engine sends, matched as-is
//!
//! [`AssessmentResult::classification_mismatch`] reports when they disagree.

use serde::{Deserialize, Serialize};

/// Scores above this are high risk
pub const HIGH_RISK_THRESHOLD: f64 = 70.0;
/// Scores above this (and not high) are moderate risk
pub const MODERATE_RISK_THRESHOLD: f64 = 30.0;

/// Local classification of a single 0–100 score
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RiskBand {
    Low,
    Moderate,
    High,
}

impl RiskBand {
    /// Classify a sub-score
    #[must_use]
    pub fn from_score(score: f64) -> Self {
        if score > HIGH_RISK_THRESHOLD {
            Self::High
        } else if score > MODERATE_RISK_THRESHOLD {
            Self::Moderate
        } else {
            Self::Low
        }
    }

    /// Badge text shown next to a score
    #[inline]
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::High => "High Risk",
            Self::Moderate => "Moderate",
            Self::Low => "Low Risk",
        }
    }
}

/// Overall level as sent by the engine
///
/// Only `HIGH` and `MODERATE` are recognised; any other string is treated as
/// low for styling purposes. The original string is not kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RiskLevel {
    Low,
    Moderate,
    High,
}

impl RiskLevel {
    /// Match an engine label
    #[must_use]
    pub fn from_label(label: &str) -> Self {
        match label {
            "HIGH" => Self::High,
            "MODERATE" => Self::Moderate,
            _ => Self::Low,
        }
    }

    /// Wire label
    #[inline]
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::High => "HIGH",
            Self::Moderate => "MODERATE",
            Self::Low => "LOW",
        }
    }

    /// Same level expressed as a local band
    #[inline]
    #[must_use]
    pub fn as_band(self) -> RiskBand {
        match self {
            Self::High => RiskBand::High,
            Self::Moderate => RiskBand::Moderate,
            Self::Low => RiskBand::Low,
        }
    }
}

impl From<String> for RiskLevel {
    fn from(label: String) -> Self {
        Self::from_label(&label)
    }
}

impl From<RiskLevel> for String {
    fn from(level: RiskLevel) -> Self {
        level.as_str().to_string()
    }
}

/// Body systems scored by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BodySystem {
    Cardiac,
    Metabolic,
    Liver,
    Hormonal,
}

impl BodySystem {
    #[inline]
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Cardiac => "Heart Health",
            Self::Metabolic => "Metabolic Health",
            Self::Liver => "Liver Health",
            Self::Hormonal => "Hormonal Balance",
        }
    }
}

/// Per-system scores (0–100)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskSummary {
    pub cardiac: f64,
    pub metabolic: f64,
    pub liver: f64,
    pub hormonal: f64,
}

impl RiskSummary {
    /// Scores in display order
    #[must_use]
    pub fn scores(&self) -> [(BodySystem, f64); 4] {
        [
            (BodySystem::Cardiac, self.cardiac),
            (BodySystem::Metabolic, self.metabolic),
            (BodySystem::Liver, self.liver),
            (BodySystem::Hormonal, self.hormonal),
        ]
    }

    /// System with the highest score (first wins on ties)
    #[must_use]
    pub fn highest(&self) -> (BodySystem, f64) {
        self.scores()
            .into_iter()
            .fold((BodySystem::Cardiac, f64::MIN), |best, current| {
                if current.1 > best.1 {
                    current
                } else {
                    best
                }
            })
    }
}

/// A diagnostic test inside a package
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestItem {
    #[serde(default)]
    pub id: String,
    pub name: String,
    pub price: f64,
}

impl TestItem {
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>, price: f64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            price,
        }
    }
}

/// Price tier of a recommended package
///
/// Known labels and their aliases map to the three standard tiers. Any other
/// label is kept verbatim, so every package the engine returns stays
/// addressable and survives a save/load.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PackageTier {
    Basic,
    Advanced,
    Comprehensive,
    /// Label the client does not know, as received
    Custom(String),
}

impl PackageTier {
    /// Tier for an engine label (case-insensitive for known labels)
    #[must_use]
    pub fn from_label(label: &str) -> Self {
        let trimmed = label.trim();
        match trimmed.to_ascii_lowercase().as_str() {
            "basic" | "essential" => Self::Basic,
            "advanced" | "standard" => Self::Advanced,
            "comprehensive" | "premium" => Self::Comprehensive,
            _ => Self::Custom(trimmed.to_string()),
        }
    }

    /// Label as shown and sent on the wire
    #[inline]
    #[must_use]
    pub fn label(&self) -> &str {
        match self {
            Self::Basic => "Basic",
            Self::Advanced => "Advanced",
            Self::Comprehensive => "Comprehensive",
            Self::Custom(label) => label,
        }
    }
}

impl From<String> for PackageTier {
    fn from(label: String) -> Self {
        Self::from_label(&label)
    }
}

impl From<PackageTier> for String {
    fn from(tier: PackageTier) -> Self {
        match tier {
            PackageTier::Custom(label) => label,
            known => known.label().to_string(),
        }
    }
}

impl std::fmt::Display for PackageTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// A bundled, discounted set of tests
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Package {
    pub tier: PackageTier,
    pub name: String,
    pub tests: Vec<TestItem>,
    pub price: f64,
    #[serde(default)]
    pub discount: f64,
    pub final_price: f64,
}

impl Package {
    /// Pro-rata ratio applied to each test price (`1` when `price` is zero)
    #[must_use]
    pub fn ratio(&self) -> f64 {
        if self.price > 0.0 {
            self.final_price / self.price
        } else {
            1.0
        }
    }

    /// Whether `final_price == price - discount` (within a paisa)
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        (self.price - self.discount - self.final_price).abs() < 0.01
    }

    /// Sum of the constituent test prices
    #[must_use]
    pub fn tests_total(&self) -> f64 {
        self.tests.iter().map(|t| t.price).sum()
    }
}

/// Engine output, immutable once received
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentResult {
    pub risk_summary: RiskSummary,
    pub risk_level: RiskLevel,
    pub packages: Vec<Package>,
}

/// The overall level and the worst local band disagree
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassificationMismatch {
    pub overall: RiskLevel,
    pub worst_system: BodySystem,
    pub worst_band: RiskBand,
}

impl AssessmentResult {
    /// First package of the given tier
    #[must_use]
    pub fn package(&self, tier: &PackageTier) -> Option<&Package> {
        self.packages.iter().find(|p| &p.tier == tier)
    }

    /// Band for every body system, in display order
    #[must_use]
    pub fn bands(&self) -> Vec<(BodySystem, f64, RiskBand)> {
        self.risk_summary
            .scores()
            .into_iter()
            .map(|(system, score)| (system, score, RiskBand::from_score(score)))
            .collect()
    }

    /// Report when the engine's overall level differs from the worst local band
    #[must_use]
    pub fn classification_mismatch(&self) -> Option<ClassificationMismatch> {
        let (worst_system, score) = self.risk_summary.highest();
        let worst_band = RiskBand::from_score(score);
        (worst_band != self.risk_level.as_band()).then_some(ClassificationMismatch {
            overall: self.risk_level,
            worst_system,
            worst_band,
        })
    }
}
