//! Free-text search
//!
//! A [`SearchTerm`] only exists for input at least `min_chars` long, so short
//! input cannot reach the backend by construction.
//!
//! Global search fans out to medicines, doctors and lab tests at once and
//! settles all three: a failed section carries its own error while the other
//! sections are still returned.

use crate::cancel::CancellationToken;
use crate::catalog::{Catalog, CatalogEntity, Doctor, LabTest, Medicine};
use crate::error::BackendError;

/// Trimmed search input that is long enough to send
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SearchTerm(String);

impl SearchTerm {
    /// Accept `raw` when its trimmed length is at least `min_chars` characters
    #[must_use]
    pub fn parse(raw: &str, min_chars: usize) -> Option<Self> {
        let trimmed = raw.trim();
        (trimmed.chars().count() >= min_chars && !trimmed.is_empty()).then(|| Self(trimmed.to_string()))
    }

    /// Borrow as `&str`
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SearchTerm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Outcome of one section
pub type Section<T> = Result<Vec<T>, BackendError>;

/// Per-section results of a global search
#[derive(Debug)]
pub struct SearchResults {
    /// Matching pharmacy products
    pub medicines: Section<Medicine>,
    /// Matching doctors
    pub doctors: Section<Doctor>,
    /// Matching lab tests
    pub lab_tests: Section<LabTest>,
}

impl SearchResults {
    /// Names of the sections that failed
    #[must_use]
    pub fn failed_sections(&self) -> Vec<&'static str> {
        let mut failed = Vec::new();
        if self.medicines.is_err() {
            failed.push(Medicine::KIND.table());
        }
        if self.doctors.is_err() {
            failed.push(Doctor::KIND.table());
        }
        if self.lab_tests.is_err() {
            failed.push(LabTest::KIND.table());
        }
        failed
    }

    /// Total rows across the sections that succeeded
    #[must_use]
    pub fn hit_count(&self) -> usize {
        self.medicines.as_ref().map_or(0, Vec::len)
            + self.doctors.as_ref().map_or(0, Vec::len)
            + self.lab_tests.as_ref().map_or(0, Vec::len)
    }

    /// Whether every section was cancelled
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self.medicines, Err(BackendError::Cancelled))
            && matches!(self.doctors, Err(BackendError::Cancelled))
            && matches!(self.lab_tests, Err(BackendError::Cancelled))
    }
}

/// Search medicines, doctors and lab tests concurrently
///
/// Every branch is bound to `token`; cancelling it turns the sections still in
/// flight into `Cancelled`.
pub async fn global_search(catalog: &Catalog, term: &SearchTerm, token: &CancellationToken) -> SearchResults {
    tracing::info!(term = term.as_str(), "global search");

    let (medicines, doctors, lab_tests) = futures::join!(
        token.run(catalog.search::<Medicine>(term)),
        token.run(catalog.search::<Doctor>(term)),
        token.run(catalog.search::<LabTest>(term)),
    );
    let results = SearchResults {
        medicines,
        doctors,
        lab_tests,
    };

    let failed = results.failed_sections();
    if !failed.is_empty() {
        tracing::warn!(?failed, hits = results.hit_count(), "search partially degraded");
    }
    results
}
