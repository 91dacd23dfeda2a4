//! Health assessment questionnaire
//!
//! The draft is edited one field at a time through [`QuestionnaireAction`]s.
//! Numeric inputs are kept exactly as typed so a persisted draft restores
//! byte-for-byte; they are parsed only when the engine payload is built.
//! Changing weight or height recomputes the BMI when both are usable and
//! otherwise leaves the last BMI in place.

use crate::bmi::{derive_bmi, parse_number};
use crate::store::Reducer;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::convert::Infallible;

/// Questionnaire pages, in order
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionnaireStep {
    /// Age, gender, weight, height
    #[default]
    Vitals,
    /// Smoking, alcohol, activity
    Lifestyle,
    /// Existing conditions
    History,
    /// Current symptoms
    Symptoms,
    /// Summary before submission
    Review,
}

impl QuestionnaireStep {
    /// All steps in order
    pub const ALL: [QuestionnaireStep; 5] = [
        Self::Vitals,
        Self::Lifestyle,
        Self::History,
        Self::Symptoms,
        Self::Review,
    ];

    /// Zero-based position
    #[inline]
    #[must_use]
    pub fn index(self) -> usize {
        Self::ALL.iter().position(|s| *s == self).unwrap_or(0)
    }

    /// Following step (saturates at `Review`)
    #[must_use]
    pub fn next(self) -> Self {
        Self::ALL.get(self.index() + 1).copied().unwrap_or(self)
    }

    /// Preceding step (saturates at `Vitals`)
    #[must_use]
    pub fn previous(self) -> Self {
        self.index()
            .checked_sub(1)
            .and_then(|i| Self::ALL.get(i).copied())
            .unwrap_or(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SmokingStatus {
    Never,
    Former,
    Current,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlcoholUse {
    None,
    Occasional,
    Regular,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityLevel {
    Sedentary,
    Light,
    Moderate,
    Active,
}

/// In-progress questionnaire answers
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AssessmentDraft {
    /// Current page
    pub step: QuestionnaireStep,
    /// Age in years, as typed
    pub age: String,
    pub gender: Option<Gender>,
    /// Weight in kilograms, as typed
    pub weight: String,
    /// Height in centimeters, as typed
    pub height: String,
    /// Derived from weight and height
    pub bmi: Option<f64>,
    pub smoker: Option<SmokingStatus>,
    pub alcohol: Option<AlcoholUse>,
    pub activity_level: Option<ActivityLevel>,
    pub existing_conditions: BTreeSet<String>,
    pub symptoms: BTreeSet<String>,
}

impl AssessmentDraft {
    /// Whether nothing has been answered yet
    #[must_use]
    pub fn is_blank(&self) -> bool {
        *self == Self::default()
    }

    /// Whether the fields a step asks for are filled in
    ///
    /// History and symptoms are optional; an empty selection is a valid answer.
    #[must_use]
    pub fn is_step_complete(&self, step: QuestionnaireStep) -> bool {
        match step {
            QuestionnaireStep::Vitals => {
                parse_number(&self.age).is_some()
                    && self.gender.is_some()
                    && parse_number(&self.weight).is_some()
                    && parse_number(&self.height).is_some()
            }
            QuestionnaireStep::Lifestyle => {
                self.smoker.is_some() && self.alcohol.is_some() && self.activity_level.is_some()
            }
            QuestionnaireStep::History | QuestionnaireStep::Symptoms => true,
            QuestionnaireStep::Review => QuestionnaireStep::ALL[..4]
                .iter()
                .all(|s| self.is_step_complete(*s)),
        }
    }

    /// Build the body sent to the risk engine
    #[must_use]
    pub fn to_request(&self) -> EngineRequest {
        EngineRequest {
            questionnaire_data: QuestionnairePayload {
                age: parse_number(&self.age),
                gender: self.gender,
                weight: parse_number(&self.weight),
                height: parse_number(&self.height),
                bmi: self.bmi,
                smoker: self.smoker,
                alcohol: self.alcohol,
                activity_level: self.activity_level,
                existing_conditions: self.existing_conditions.iter().cloned().collect(),
                symptoms: self.symptoms.iter().cloned().collect(),
            },
        }
    }
}

/// Request body for the `health-package-engine` function
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineRequest {
    pub questionnaire_data: QuestionnairePayload,
}

/// Questionnaire answers with numeric fields parsed
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionnairePayload {
    pub age: Option<f64>,
    pub gender: Option<Gender>,
    pub weight: Option<f64>,
    pub height: Option<f64>,
    pub bmi: Option<f64>,
    pub smoker: Option<SmokingStatus>,
    pub alcohol: Option<AlcoholUse>,
    pub activity_level: Option<ActivityLevel>,
    pub existing_conditions: Vec<String>,
    pub symptoms: Vec<String>,
}

/// Field-level edits to the draft
#[derive(Debug, Clone, PartialEq)]
pub enum QuestionnaireAction {
    SetAge(String),
    SetGender(Gender),
    SetWeight(String),
    SetHeight(String),
    SetSmoker(SmokingStatus),
    SetAlcohol(AlcoholUse),
    SetActivityLevel(ActivityLevel),
    /// Add the condition if absent, remove it if present
    ToggleCondition(String),
    /// Add the symptom if absent, remove it if present
    ToggleSymptom(String),
    NextStep,
    PreviousStep,
    GoToStep(QuestionnaireStep),
    /// Discard every answer
    Reset,
}

/// Reducer for [`AssessmentDraft`]
#[derive(Debug)]
pub struct QuestionnaireReducer;

impl Reducer for QuestionnaireReducer {
    type State = AssessmentDraft;
    type Action = QuestionnaireAction;
    type Error = Infallible;

    fn reduce(draft: &mut AssessmentDraft, action: QuestionnaireAction) -> Result<(), Infallible> {
        match action {
            QuestionnaireAction::SetAge(age) => draft.age = age,
            QuestionnaireAction::SetGender(gender) => draft.gender = Some(gender),
            QuestionnaireAction::SetWeight(weight) => {
                draft.weight = weight;
                refresh_bmi(draft);
            }
            QuestionnaireAction::SetHeight(height) => {
                draft.height = height;
                refresh_bmi(draft);
            }
            QuestionnaireAction::SetSmoker(s) => draft.smoker = Some(s),
            QuestionnaireAction::SetAlcohol(a) => draft.alcohol = Some(a),
            QuestionnaireAction::SetActivityLevel(a) => draft.activity_level = Some(a),
            QuestionnaireAction::ToggleCondition(c) => toggle(&mut draft.existing_conditions, c),
            QuestionnaireAction::ToggleSymptom(s) => toggle(&mut draft.symptoms, s),
            QuestionnaireAction::NextStep => draft.step = draft.step.next(),
            QuestionnaireAction::PreviousStep => draft.step = draft.step.previous(),
            QuestionnaireAction::GoToStep(step) => draft.step = step,
            QuestionnaireAction::Reset => *draft = AssessmentDraft::default(),
        }
        Ok(())
    }
}

fn refresh_bmi(draft: &mut AssessmentDraft) {
    if let Some(bmi) = derive_bmi(&draft.weight, &draft.height) {
        draft.bmi = Some(bmi);
    }
}

fn toggle(set: &mut BTreeSet<String>, value: String) {
    if !set.remove(&value) {
        set.insert(value);
    }
}
