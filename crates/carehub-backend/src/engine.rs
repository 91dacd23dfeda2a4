//! Remote risk engine client
//!
//! Sends the questionnaire to the `health-package-engine` function and
//! decodes `{risk_summary, risk_level, packages}`. No retry: the flow surfaces
//! one failure and lets the user try again.

use crate::client::Backend;
use crate::error::{BackendError, BackendResult};
use carehub_core::assessment::AssessmentDraft;
use carehub_core::risk::AssessmentResult;
use serde_json::Value;
use std::sync::Arc;

/// Remote function name
pub const ENGINE_FUNCTION: &str = "health-package-engine";

/// Client for the package recommendation engine
#[derive(Debug, Clone)]
pub struct RiskEngine {
    backend: Arc<dyn Backend>,
}

impl RiskEngine {
    /// Engine calls over `backend`
    #[inline]
    #[must_use]
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self { backend }
    }

    /// Score `draft` and fetch recommended packages
    ///
    /// # Errors
    /// Transport and status failures, `Status` when the function reports an
    /// error in its body, and `Decode` when the result has the wrong shape.
    pub async fn assess(&self, draft: &AssessmentDraft) -> BackendResult<AssessmentResult> {
        let body = serde_json::to_value(draft.to_request())?;
        let response = self.backend.invoke(ENGINE_FUNCTION, body).await?;

        if let Some(message) = response.get("error").and_then(Value::as_str) {
            tracing::error!(function = ENGINE_FUNCTION, message, "engine reported an error");
            return Err(BackendError::Status {
                status: 200,
                message: Some(message.to_string()),
            });
        }

        let result: AssessmentResult = serde_json::from_value(response)?;
        if result.packages.len() != 3 {
            tracing::warn!(count = result.packages.len(), "engine returned an unexpected number of packages");
        }
        if let Some(mismatch) = result.classification_mismatch() {
            tracing::debug!(?mismatch, "overall risk level differs from worst body-system band");
        }
        tracing::info!(risk_level = ?result.risk_level, packages = result.packages.len(), "assessment scored");
        Ok(result)
    }
}
