//! Backend trait and the REST implementation
//!
//! The hosted backend speaks the PostgREST dialect:
//! - `GET  /rest/v1/{table}` with filter query pairs
//! - `POST /rest/v1/{table}` for inserts
//! - `POST /functions/v1/{name}` for remote functions
//! - `GET  /auth/v1/user` for the signed-in user
//!
//! Every request carries `apikey` and `Authorization: Bearer` headers plus an
//! `x-request-id` used to correlate client and server logs.

use crate::error::{BackendError, BackendResult};
use crate::query::{InsertOptions, Query};
use async_trait::async_trait;
use carehub_core::config::BackendConfig;
use carehub_core::types::ProfileId;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

/// Signed-in user as reported by the auth endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    /// Profile id used as `profile_id` on inserts
    pub id: ProfileId,
    /// Login email, if any
    #[serde(default)]
    pub email: Option<String>,
}

/// Remote data access
///
/// Rows travel as JSON values; typed decoding happens in the callers.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Backend: Send + Sync + std::fmt::Debug {
    /// Read rows from `table`
    async fn select(&self, table: &str, query: &Query) -> BackendResult<Vec<Value>>;

    /// Insert one row and return the stored representation
    ///
    /// An empty vector means the row was skipped as a duplicate.
    async fn insert(&self, table: &str, row: Value, options: &InsertOptions) -> BackendResult<Vec<Value>>;

    /// Call a remote function
    async fn invoke(&self, function: &str, body: Value) -> BackendResult<Value>;

    /// Resolve the signed-in user, `None` when there is no session
    async fn current_user(&self) -> BackendResult<Option<AuthUser>>;
}

/// Read rows and decode each as `T`
///
/// # Errors
/// Backend failures, or `Decode` when a row does not match `T`.
pub async fn select_rows<T: DeserializeOwned>(
    backend: &dyn Backend,
    table: &str,
    query: &Query,
) -> BackendResult<Vec<T>> {
    backend
        .select(table, query)
        .await?
        .into_iter()
        .map(|row| serde_json::from_value(row).map_err(BackendError::from))
        .collect()
}

/// HTTP client for the hosted backend
#[derive(Debug, Clone)]
pub struct RestBackend {
    http: reqwest::Client,
    base_url: String,
    anon_key: String,
    access_token: Option<String>,
    timeout_secs: u64,
}

impl RestBackend {
    /// Build a client from configuration
    ///
    /// # Errors
    /// `Config` when the URL is empty or the HTTP client cannot be built.
    pub fn from_config(config: &BackendConfig) -> BackendResult<Self> {
        let base_url = config.url.trim().trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(BackendError::Config("backend url is not set".into()));
        }
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| BackendError::Config(e.to_string()))?;

        Ok(Self {
            http,
            base_url,
            anon_key: config.anon_key.clone(),
            access_token: config.access_token.clone().filter(|t| !t.is_empty()),
            timeout_secs: config.timeout_secs,
        })
    }

    /// With a different access token
    #[inline]
    #[must_use]
    pub fn with_access_token(mut self, token: Option<String>) -> Self {
        self.access_token = token.filter(|t| !t.is_empty());
        self
    }

    /// Whether requests carry a user session
    #[inline]
    #[must_use]
    pub fn has_session(&self) -> bool {
        self.access_token.is_some()
    }

    fn request(&self, method: reqwest::Method, path: &str) -> (String, reqwest::RequestBuilder) {
        let request_id = ulid::Ulid::new().to_string();
        let bearer = self.access_token.as_deref().unwrap_or(&self.anon_key);
        let builder = self
            .http
            .request(method, format!("{}{path}", self.base_url))
            .header("apikey", &self.anon_key)
            .bearer_auth(bearer)
            .header("x-request-id", &request_id);
        (request_id, builder)
    }

    async fn send(&self, request_id: &str, builder: reqwest::RequestBuilder) -> BackendResult<reqwest::Response> {
        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                BackendError::Timeout {
                    secs: self.timeout_secs,
                }
            } else {
                BackendError::from(e)
            }
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = error_message(&body);
        tracing::error!(request_id, status = status.as_u16(), ?message, "backend request failed");
        Err(BackendError::Status {
            status: status.as_u16(),
            message,
        })
    }
}

/// Pull a human-readable message out of an error body
///
/// PostgREST sends `{"message": ...}`, edge functions send `{"error": ...}`.
fn error_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    ["message", "error", "msg", "error_description"]
        .iter()
        .find_map(|key| value.get(key).and_then(Value::as_str))
        .map(str::to_string)
}

#[async_trait]
impl Backend for RestBackend {
    async fn select(&self, table: &str, query: &Query) -> BackendResult<Vec<Value>> {
        let (request_id, builder) = self.request(reqwest::Method::GET, &format!("/rest/v1/{table}"));
        tracing::debug!(%request_id, table, query = ?query.pairs(), "select");

        let response = self.send(&request_id, builder.query(&query.pairs())).await?;
        Ok(response.json().await?)
    }

    async fn insert(&self, table: &str, row: Value, options: &InsertOptions) -> BackendResult<Vec<Value>> {
        let (request_id, mut builder) = self.request(reqwest::Method::POST, &format!("/rest/v1/{table}"));
        if let Some(column) = &options.on_conflict {
            builder = builder.query(&[("on_conflict", column)]);
        }
        tracing::debug!(%request_id, table, on_conflict = ?options.on_conflict, "insert");

        let builder = builder.header("Prefer", options.prefer_header()).json(&row);
        let response = self.send(&request_id, builder).await?;
        Ok(response.json().await?)
    }

    async fn invoke(&self, function: &str, body: Value) -> BackendResult<Value> {
        let (request_id, builder) = self.request(reqwest::Method::POST, &format!("/functions/v1/{function}"));
        tracing::debug!(%request_id, function, "invoke");

        let response = self.send(&request_id, builder.json(&body)).await?;
        Ok(response.json().await?)
    }

    async fn current_user(&self) -> BackendResult<Option<AuthUser>> {
        if self.access_token.is_none() {
            return Ok(None);
        }
        let (request_id, builder) = self.request(reqwest::Method::GET, "/auth/v1/user");
        match self.send(&request_id, builder).await {
            Ok(response) => Ok(Some(response.json().await?)),
            Err(BackendError::Status { status: 401 | 403, .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }
}
