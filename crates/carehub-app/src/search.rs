//! Search screens
//!
//! Listing screens load the full catalog once and search on top of it. Input
//! shorter than the minimum never leaves the client: the full list is shown.

use crate::error::AppResult;
use carehub_backend::{global_search, CancellationToken, Catalog, CatalogEntity, SearchResults, SearchTerm};

/// Search over the catalog
#[derive(Debug, Clone)]
pub struct SearchFlow {
    catalog: Catalog,
    min_chars: usize,
}

impl SearchFlow {
    #[must_use]
    pub fn new(catalog: Catalog, min_chars: usize) -> Self {
        Self { catalog, min_chars }
    }

    /// Term to send, or `None` while the input is too short
    #[must_use]
    pub fn term(&self, raw: &str) -> Option<SearchTerm> {
        SearchTerm::parse(raw, self.min_chars)
    }

    /// Full list for a listing screen
    ///
    /// # Errors
    /// Backend failures.
    pub async fn list<T: CatalogEntity>(&self, token: &CancellationToken) -> AppResult<Vec<T>> {
        Ok(token.run(self.catalog.list::<T>()).await?)
    }

    /// Filter a listing screen
    ///
    /// `loaded` is the list already on screen; it is returned unchanged when
    /// `raw` is too short.
    ///
    /// # Errors
    /// Backend failures.
    pub async fn filter<T: CatalogEntity>(
        &self,
        loaded: &[T],
        raw: &str,
        token: &CancellationToken,
    ) -> AppResult<Vec<T>> {
        match self.term(raw) {
            Some(term) => Ok(token.run(self.catalog.search::<T>(&term)).await?),
            None => {
                tracing::trace!(len = raw.trim().chars().count(), "term below minimum, showing full list");
                Ok(loaded.to_vec())
            }
        }
    }

    /// Search page: medicines, doctors and lab tests at once
    ///
    /// `None` while the input is too short.
    pub async fn everywhere(&self, raw: &str, token: &CancellationToken) -> Option<SearchResults> {
        let term = self.term(raw)?;
        Some(global_search(&self.catalog, &term, token).await)
    }
}
