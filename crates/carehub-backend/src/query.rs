//! PostgREST query builder
//!
//! Renders the filter dialect used by `GET /rest/v1/{table}`:
//! `select=*&city=eq.Pune&or=(name.ilike.*para*,brand.ilike.*para*)&limit=20`.

/// Read query against one table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    select: String,
    filters: Vec<(String, String)>,
    order: Option<String>,
    limit: Option<usize>,
}

impl Default for Query {
    fn default() -> Self {
        Self {
            select: "*".to_string(),
            filters: Vec::new(),
            order: None,
            limit: None,
        }
    }
}

impl Query {
    /// Select every column, no filters
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict selected columns
    #[inline]
    #[must_use]
    pub fn select(mut self, columns: impl Into<String>) -> Self {
        self.select = columns.into();
        self
    }

    /// `column = value`
    #[must_use]
    pub fn eq(mut self, column: &str, value: impl std::fmt::Display) -> Self {
        self.filters.push((column.to_string(), format!("eq.{value}")));
        self
    }

    /// Case-insensitive substring match on any of `columns`
    ///
    /// Characters that would break the `or=(...)` grouping are dropped from
    /// the term. An empty term adds no filter.
    #[must_use]
    pub fn ilike_any(mut self, columns: &[&str], term: &str) -> Self {
        let term: String = term
            .trim()
            .chars()
            .filter(|c| !matches!(c, ',' | '(' | ')' | '*' | '"'))
            .collect();
        if term.is_empty() || columns.is_empty() {
            return self;
        }
        let clauses: Vec<String> = columns
            .iter()
            .map(|column| format!("{column}.ilike.*{term}*"))
            .collect();
        self.filters.push(("or".to_string(), format!("({})", clauses.join(","))));
        self
    }

    /// Sort by `column`
    #[inline]
    #[must_use]
    pub fn order(mut self, column: &str, ascending: bool) -> Self {
        let direction = if ascending { "asc" } else { "desc" };
        self.order = Some(format!("{column}.{direction}"));
        self
    }

    /// At most `n` rows
    #[inline]
    #[must_use]
    pub fn limit(mut self, n: usize) -> Self {
        self.limit = Some(n);
        self
    }

    /// Whether any row filter is set
    #[inline]
    #[must_use]
    pub fn is_filtered(&self) -> bool {
        !self.filters.is_empty()
    }

    /// Query-string pairs in render order
    #[must_use]
    pub fn pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::with_capacity(self.filters.len() + 3);
        pairs.push(("select".to_string(), self.select.clone()));
        pairs.extend(self.filters.iter().cloned());
        if let Some(order) = &self.order {
            pairs.push(("order".to_string(), order.clone()));
        }
        if let Some(limit) = self.limit {
            pairs.push(("limit".to_string(), limit.to_string()));
        }
        pairs
    }

    /// Stable cache key for this query on `table`
    #[must_use]
    pub fn cache_key(&self, table: &str) -> String {
        let rendered: Vec<String> = self.pairs().into_iter().map(|(k, v)| format!("{k}={v}")).collect();
        format!("{table}?{}", rendered.join("&"))
    }
}

/// Options for `POST /rest/v1/{table}`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InsertOptions {
    /// Conflict target column for upsert-style inserts
    pub on_conflict: Option<String>,
    /// Skip rows that hit the conflict target instead of failing
    pub ignore_duplicates: bool,
}

impl InsertOptions {
    /// Plain insert
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Ignore rows whose `column` already exists
    #[inline]
    #[must_use]
    pub fn ignore_duplicates_on(column: impl Into<String>) -> Self {
        Self {
            on_conflict: Some(column.into()),
            ignore_duplicates: true,
        }
    }

    /// Value of the `Prefer` header
    #[must_use]
    pub fn prefer_header(&self) -> String {
        if self.ignore_duplicates {
            "return=representation,resolution=ignore-duplicates".to_string()
        } else {
            "return=representation".to_string()
        }
    }
}
