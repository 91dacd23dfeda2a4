//! Health assessment flow
//!
//! ```text
//! answers ──► draft store (persisted) ──► submit ──► engine
//!                                            │
//!                    ┌──── failure ◄─────────┤
//!                    ▼                       ▼
//!          generic message,          result slot (persisted)
//!          stay on the step                  │
//!                                   book tier ──► cart lines ──► /cart
//! ```

use crate::error::{AppError, AppResult};
use carehub_backend::{BackendError, CancellationToken, RiskEngine};
use carehub_core::assessment::{AssessmentDraft, QuestionnaireAction, QuestionnaireReducer, QuestionnaireStep};
use carehub_core::booking::GENERIC_FAILURE_MESSAGE;
use carehub_core::cart::{expand_package, CartAction, CartReducer};
use carehub_core::risk::{AssessmentResult, PackageTier};
use carehub_core::route::Route;
use carehub_store::{JsonSlot, PersistedStore};
use std::sync::Arc;

/// What happened on submit
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// Engine answered; the result is stored
    Scored {
        result: AssessmentResult,
        route: Route,
    },
    /// Engine call failed; the questionnaire stays where it was
    Failed {
        message: String,
        step: QuestionnaireStep,
    },
}

/// Questionnaire, scoring and package booking
#[derive(Debug, Clone)]
pub struct AssessmentFlow {
    draft: Arc<PersistedStore<QuestionnaireReducer>>,
    engine: RiskEngine,
    result: JsonSlot<AssessmentResult>,
    cart: Arc<PersistedStore<CartReducer>>,
}

impl AssessmentFlow {
    #[must_use]
    pub fn new(
        draft: Arc<PersistedStore<QuestionnaireReducer>>,
        engine: RiskEngine,
        result: JsonSlot<AssessmentResult>,
        cart: Arc<PersistedStore<CartReducer>>,
    ) -> Self {
        Self {
            draft,
            engine,
            result,
            cart,
        }
    }

    /// Current answers
    #[must_use]
    pub fn draft(&self) -> AssessmentDraft {
        self.draft.state()
    }

    /// Apply one edit and persist the draft
    ///
    /// # Errors
    /// Storage failures.
    pub async fn answer(&self, action: QuestionnaireAction) -> AppResult<AssessmentDraft> {
        Ok(self.draft.dispatch(action).await?.state)
    }

    /// Send the draft to the engine
    ///
    /// Engine failures are not errors of this call: they come back as
    /// [`SubmitOutcome::Failed`] with the generic message. No retry.
    ///
    /// # Errors
    /// `Backend(Cancelled)` when `token` fires, storage failures when the
    /// result cannot be saved.
    pub async fn submit(&self, token: &CancellationToken) -> AppResult<SubmitOutcome> {
        let draft = self.draft.state();
        tracing::info!(step = ?draft.step, bmi = ?draft.bmi, "submitting assessment");

        match token.run(self.engine.assess(&draft)).await {
            Ok(result) => {
                self.result.save(&result).await?;
                Ok(SubmitOutcome::Scored {
                    result,
                    route: Route::AssessmentResult,
                })
            }
            Err(BackendError::Cancelled) => Err(BackendError::Cancelled.into()),
            Err(error) => {
                tracing::error!(%error, "assessment submission failed");
                Ok(SubmitOutcome::Failed {
                    message: GENERIC_FAILURE_MESSAGE.to_string(),
                    step: draft.step,
                })
            }
        }
    }

    /// Last stored engine result
    ///
    /// # Errors
    /// Storage read failures.
    pub async fn last_result(&self) -> AppResult<Option<AssessmentResult>> {
        Ok(self.result.load().await?)
    }

    /// Put every test of the chosen tier into the cart and go to the cart
    ///
    /// Lines are added one at a time. If line N is rejected, lines before it
    /// stay in the cart and the error is returned.
    ///
    /// # Errors
    /// `NoAssessmentResult`, `PackageNotFound`, or the first rejected line.
    pub async fn book_package(&self, tier: PackageTier) -> AppResult<Route> {
        let result = self.last_result().await?.ok_or(AppError::NoAssessmentResult)?;
        let package = result.package(&tier).ok_or(AppError::PackageNotFound { tier })?;

        let lines = expand_package(package);
        let total = lines.len();
        for (added, line) in lines.into_iter().enumerate() {
            if let Err(error) = self.cart.dispatch(CartAction::Add(line)).await {
                tracing::warn!(package = %package.name, added, total, %error, "package expansion stopped");
                return Err(error.into());
            }
        }

        tracing::info!(package = %package.name, lines = total, "package added to cart");
        Ok(Route::Cart)
    }

    /// Discard the draft and the stored result
    ///
    /// # Errors
    /// Storage failures.
    pub async fn restart(&self) -> AppResult<()> {
        self.draft.clear().await?;
        self.result.clear().await?;
        Ok(())
    }
}
