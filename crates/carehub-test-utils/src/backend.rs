//! In-memory backend that records every call
//!
//! Understands the subset of the query dialect the client emits (`eq.` filters,
//! `or=(col.ilike.*term*,...)`, `limit`) and honours
//! ignore-duplicates inserts on a conflict column.

use async_trait::async_trait;
use carehub_backend::{AuthUser, Backend, BackendError, BackendResult, InsertOptions, Query};
use carehub_core::types::ProfileId;
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// A recorded backend call
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Select { table: String, pairs: Vec<(String, String)> },
    Insert { table: String, row: Value },
    Invoke { function: String, body: Value },
    CurrentUser,
}

/// Scripted failure, cloned into a fresh `BackendError` on every hit
#[derive(Debug, Clone, PartialEq)]
pub enum Failure {
    Http(String),
    Status(u16, Option<String>),
}

impl Failure {
    fn to_error(&self) -> BackendError {
        match self {
            Self::Http(reason) => BackendError::Http(reason.clone()),
            Self::Status(status, message) => BackendError::Status {
                status: *status,
                message: message.clone(),
            },
        }
    }
}

#[derive(Debug, Default)]
pub struct FakeBackend {
    tables: Mutex<HashMap<String, Vec<Value>>>,
    failures: Mutex<HashMap<String, Failure>>,
    delays: Mutex<HashMap<String, Duration>>,
    functions: Mutex<HashMap<String, Result<Value, Failure>>>,
    user: Mutex<Option<AuthUser>>,
    calls: Mutex<Vec<Call>>,
    next_id: AtomicU64,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed `rows` into `table`
    pub fn with_rows(self, table: &str, rows: Vec<Value>) -> Self {
        self.tables.lock().entry(table.to_string()).or_default().extend(rows);
        self
    }

    /// Every call touching `target` (table or function name) fails
    pub fn failing(self, target: &str, failure: Failure) -> Self {
        self.failures.lock().insert(target.to_string(), failure);
        self
    }

    /// Calls touching `target` wait this long first
    pub fn delayed(self, target: &str, delay: Duration) -> Self {
        self.delays.lock().insert(target.to_string(), delay);
        self
    }

    /// Reply of remote function `name`
    pub fn with_function(self, name: &str, reply: Result<Value, Failure>) -> Self {
        self.functions.lock().insert(name.to_string(), reply);
        self
    }

    /// Signed-in user
    pub fn signed_in(self, profile_id: &str) -> Self {
        *self.user.lock() = Some(AuthUser {
            id: ProfileId::new(profile_id),
            email: Some(format!("{profile_id}@example.com")),
        });
        self
    }

    pub fn sign_out(&self) {
        *self.user.lock() = None;
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    pub fn select_count(&self, table: &str) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|c| matches!(c, Call::Select { table: t, .. } if t == table))
            .count()
    }

    pub fn inserts(&self, table: &str) -> Vec<Value> {
        self.calls
            .lock()
            .iter()
            .filter_map(|c| match c {
                Call::Insert { table: t, row } if t == table => Some(row.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn rows(&self, table: &str) -> Vec<Value> {
        self.tables.lock().get(table).cloned().unwrap_or_default()
    }

    async fn enter(&self, target: &str, call: Call) -> BackendResult<()> {
        self.calls.lock().push(call);
        let delay = self.delays.lock().get(target).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        match self.failures.lock().get(target) {
            Some(failure) => Err(failure.to_error()),
            None => Ok(()),
        }
    }
}

fn column_text(row: &Value, column: &str) -> Option<String> {
    match row.get(column)? {
        Value::String(s) => Some(s.clone()),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}

fn matches_filter(row: &Value, key: &str, value: &str) -> bool {
    if key == "or" {
        let inner = value.trim_start_matches('(').trim_end_matches(')');
        return inner.split(',').any(|clause| {
            let mut parts = clause.splitn(3, '.');
            let (Some(column), Some("ilike"), Some(pattern)) = (parts.next(), parts.next(), parts.next()) else {
                return false;
            };
            let needle = pattern.trim_matches('*').to_lowercase();
            column_text(row, column).is_some_and(|text| text.to_lowercase().contains(&needle))
        });
    }
    match value.strip_prefix("eq.") {
        Some(expected) => column_text(row, key).as_deref() == Some(expected),
        None => true,
    }
}

#[async_trait]
impl Backend for FakeBackend {
    async fn select(&self, table: &str, query: &Query) -> BackendResult<Vec<Value>> {
        let pairs = query.pairs();
        self.enter(
            table,
            Call::Select {
                table: table.to_string(),
                pairs: pairs.clone(),
            },
        )
        .await?;

        let mut limit = usize::MAX;
        let filters: Vec<&(String, String)> = pairs
            .iter()
            .filter(|(k, v)| match k.as_str() {
                "select" | "order" => false,
                "limit" => {
                    limit = v.parse().unwrap_or(usize::MAX);
                    false
                }
                _ => true,
            })
            .collect();

        Ok(self
            .rows(table)
            .into_iter()
            .filter(|row| filters.iter().all(|(k, v)| matches_filter(row, k, v)))
            .take(limit)
            .collect())
    }

    async fn insert(&self, table: &str, row: Value, options: &InsertOptions) -> BackendResult<Vec<Value>> {
        self.enter(
            table,
            Call::Insert {
                table: table.to_string(),
                row: row.clone(),
            },
        )
        .await?;

        let mut tables = self.tables.lock();
        let stored = tables.entry(table.to_string()).or_default();
        if let (Some(column), true) = (&options.on_conflict, options.ignore_duplicates) {
            let key = column_text(&row, column);
            if key.is_some() && stored.iter().any(|r| column_text(r, column) == key) {
                return Ok(vec![]);
            }
        }

        let mut row = row;
        if row.get("id").is_none() {
            let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
            row["id"] = json!(format!("{table}-{id}"));
        }
        stored.push(row.clone());
        Ok(vec![row])
    }

    async fn invoke(&self, function: &str, body: Value) -> BackendResult<Value> {
        self.enter(
            function,
            Call::Invoke {
                function: function.to_string(),
                body,
            },
        )
        .await?;

        match self.functions.lock().get(function) {
            Some(Ok(reply)) => Ok(reply.clone()),
            Some(Err(failure)) => Err(failure.to_error()),
            None => Err(BackendError::Status {
                status: 404,
                message: Some(format!("function {function} not found")),
            }),
        }
    }

    async fn current_user(&self) -> BackendResult<Option<AuthUser>> {
        self.enter("auth", Call::CurrentUser).await?;
        Ok(self.user.lock().clone())
    }
}
