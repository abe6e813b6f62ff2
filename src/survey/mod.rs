//! Simulation request model and client payload normalization.
//!
//! - [`types`]: the canonical [`SimulationRequest`] and its parts
//! - [`payload`]: [`normalize_payload`], the single boundary for client request shapes

mod payload;
mod types;

pub use payload::normalize_payload;
pub use types::{
    Audience, AudienceContext, Question, QuestionKind, SimulationKind, SimulationMode,
    SimulationRequest, SurveyMode, BASIC_RESPONDENTS, DEFAULT_INTERVIEW_RESPONDENTS,
    DEFAULT_SURVEY_RESPONDENTS, INTERVIEW_RESPONDENTS, MULTI_SELECT_TYPES,
    PROFESSIONAL_RESPONDENTS, SINGLE_CHOICE_TYPES, YES_NO_OPTIONS, YES_NO_TYPES,
};
