//! Shared identifiers and catalog kinds

use serde::{Deserialize, Serialize};

/// Identifier of a signed-in user's profile row
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProfileId(pub String);

impl ProfileId {
    /// Wrap a raw profile id
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow as `&str`
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ProfileId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of a created booking row
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BookingId(pub String);

impl BookingId {
    /// Wrap a raw booking id
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow as `&str`
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for BookingId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Catalog sections the app can list, search and open
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CatalogKind {
    /// Pharmacy products
    Medicine,
    /// Pathology tests
    LabTest,
    /// Imaging scans
    Scan,
    /// Doctors available for consultation
    Doctor,
    /// Partner hospitals
    Hospital,
    /// Home care, physiotherapy, surgery and wellness services
    Service,
    /// Ambulance types available for dispatch
    Ambulance,
}

impl CatalogKind {
    /// All kinds, in menu order
    pub const ALL: [CatalogKind; 7] = [
        Self::Medicine,
        Self::LabTest,
        Self::Scan,
        Self::Doctor,
        Self::Hospital,
        Self::Service,
        Self::Ambulance,
    ];

    /// Backend table holding this kind
    #[inline]
    #[must_use]
    pub fn table(self) -> &'static str {
        match self {
            Self::Medicine => "medicines",
            Self::LabTest => "lab_tests",
            Self::Scan => "scans",
            Self::Doctor => "doctors",
            Self::Hospital => "hospitals",
            Self::Service => "service_catalog",
            Self::Ambulance => "ambulance_types",
        }
    }

    /// Path segment used by detail routes
    #[inline]
    #[must_use]
    pub fn path_segment(self) -> &'static str {
        match self {
            Self::Medicine => "medicines",
            Self::LabTest => "lab-tests",
            Self::Scan => "scans",
            Self::Doctor => "doctors",
            Self::Hospital => "hospitals",
            Self::Service => "services",
            Self::Ambulance => "ambulance",
        }
    }

    /// Reverse of [`CatalogKind::path_segment`]
    #[must_use]
    pub fn from_path_segment(segment: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.path_segment() == segment)
    }

    /// Human-readable name used in not-found messages
    #[inline]
    #[must_use]
    pub fn display_name(self) -> &'static str {
        match self {
            Self::Medicine => "Medicine",
            Self::LabTest => "Lab test",
            Self::Scan => "Scan",
            Self::Doctor => "Doctor",
            Self::Hospital => "Hospital",
            Self::Service => "Service",
            Self::Ambulance => "Ambulance",
        }
    }
}

/// Round a rupee amount the way the storefront does (half away from zero)
#[inline]
#[must_use]
pub fn round_rupees(amount: f64) -> f64 {
    amount.round()
}
