//! Client payload normalization.
//!
//! Clients send several historical request shapes. All shape sniffing lives
//! here; the rest of the crate only sees [`SimulationRequest`].
//!
//! Precedence, in order:
//! 1. `form_data.questions` over top-level `questions`
//! 2. `audience_data` over `audience`
//! 3. `form_data.type` over top-level `type`
//! 4. `form_data.contextData` over top-level `contextData`
//! 5. respondent count: `audience.responseCount`, then `responsesToSimulate`, then the default

use std::collections::HashSet;

use serde_json::{Map, Value};

use super::types::{
    Audience, AudienceContext, Question, SimulationKind, SimulationRequest, SurveyMode,
    BASIC_RESPONDENTS, DEFAULT_INTERVIEW_RESPONDENTS, DEFAULT_SURVEY_RESPONDENTS,
    INTERVIEW_RESPONDENTS, PROFESSIONAL_RESPONDENTS, YES_NO_OPTIONS, YES_NO_TYPES,
};
use crate::error::ValidationError;

/// Normalize a raw client payload into a [`SimulationRequest`].
///
/// Unknown or missing fields default to empty values; only an unusable body
/// or an empty question list is rejected.
///
/// # Errors
///
/// - [`ValidationError::InvalidPayload`] if `body` is not a JSON object
/// - [`ValidationError::EmptyQuestions`] if no questions remain after normalization
///
/// # Example
///
/// ```
/// use serde_json::json;
/// use survey_simulator::survey::{normalize_payload, QuestionKind, SimulationKind};
///
/// let request = normalize_payload(&json!({
///     "type": "encuesta",
///     "questions": [{"id": "q1", "question": "¿Compraría?", "type": "yes-no"}]
/// }))
/// .unwrap();
///
/// assert_eq!(request.kind, SimulationKind::Survey);
/// assert_eq!(request.questions[0].kind, QuestionKind::SingleChoice);
/// assert_eq!(request.questions[0].options, vec!["Sí", "No"]);
/// ```
pub fn normalize_payload(body: &Value) -> Result<SimulationRequest, ValidationError> {
    let Some(body) = body.as_object() else {
        return Err(ValidationError::InvalidPayload {
            message: "body must be a JSON object".to_string(),
        });
    };

    let empty = Map::new();
    let form = body.get("form_data").and_then(Value::as_object).unwrap_or(&empty);
    let audience_block = body
        .get("audience_data")
        .and_then(Value::as_object)
        .or_else(|| body.get("audience").and_then(Value::as_object))
        .unwrap_or(&empty);

    let kind = detect_kind(form, body);
    let mode = detect_mode(audience_block);

    let raw_questions = form
        .get("questions")
        .and_then(Value::as_array)
        .or_else(|| body.get("questions").and_then(Value::as_array));

    let mut questions: Vec<Question> = raw_questions
        .map(|qs| qs.iter().map(normalize_question).collect())
        .unwrap_or_default();
    assign_placeholder_ids(&mut questions);

    if questions.is_empty() {
        return Err(ValidationError::EmptyQuestions);
    }

    let respondent_count = resolve_respondent_count(kind, mode, audience_block, body);
    let audience = normalize_audience(audience_block, form, body);

    tracing::debug!(
        kind = ?kind,
        mode = ?mode,
        respondent_count,
        question_count = questions.len(),
        "Normalized simulation payload"
    );

    Ok(SimulationRequest {
        kind,
        mode,
        respondent_count,
        audience,
        questions,
    })
}

fn detect_kind(form: &Map<String, Value>, body: &Map<String, Value>) -> SimulationKind {
    let declared = text_field(form, "type");
    let declared = if declared.is_empty() {
        text_field(body, "type")
    } else {
        declared
    };
    if declared.to_lowercase() == "entrevista" {
        SimulationKind::Interview
    } else {
        SimulationKind::Survey
    }
}

fn detect_mode(audience: &Map<String, Value>) -> SurveyMode {
    if text_field(audience, "surveyType").to_lowercase() == "professional" {
        SurveyMode::Professional
    } else {
        SurveyMode::Basic
    }
}

/// Resolve the respondent count: per-audience count, then top-level count,
/// then the default. Non-finite or non-positive values fall back to the
/// default before clamping.
fn resolve_respondent_count(
    kind: SimulationKind,
    mode: SurveyMode,
    audience: &Map<String, Value>,
    body: &Map<String, Value>,
) -> u32 {
    let (default, (min, max)) = match (kind, mode) {
        (SimulationKind::Interview, _) => (DEFAULT_INTERVIEW_RESPONDENTS, INTERVIEW_RESPONDENTS),
        (SimulationKind::Survey, SurveyMode::Professional) => {
            (DEFAULT_SURVEY_RESPONDENTS, PROFESSIONAL_RESPONDENTS)
        }
        (SimulationKind::Survey, SurveyMode::Basic) => {
            (DEFAULT_SURVEY_RESPONDENTS, BASIC_RESPONDENTS)
        }
    };

    let explicit = present(audience, "responseCount").or_else(|| present(body, "responsesToSimulate"));
    let requested = explicit
        .and_then(as_number)
        .filter(|n| n.is_finite() && *n > 0.0)
        .unwrap_or_else(|| f64::from(default));

    // Clamped to a small positive range, so the cast cannot truncate.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let rounded = requested.round().clamp(f64::from(min), f64::from(max)) as u32;
    rounded
}

fn normalize_question(raw: &Value) -> Question {
    let empty = Map::new();
    let fields = raw.as_object().unwrap_or(&empty);

    let id = text_field(fields, "id").trim().to_string();

    let mut text = text_field(fields, "question");
    if text.is_empty() {
        text = text_field(fields, "text");
    }

    let mut declared_type = text_field(fields, "type").to_lowercase();
    let mut options = normalize_options(fields.get("options"));

    if options.is_empty() && YES_NO_TYPES.contains(&declared_type.as_str()) {
        declared_type = "yes-no".to_string();
        options = YES_NO_OPTIONS.iter().map(|o| (*o).to_string()).collect();
    }

    let mut question = Question::new(id, text, declared_type, options);
    question.required = fields.get("required").is_some_and(truthy);
    question
}

/// Give every id-less question `q_<position>`, skipping ids already taken.
///
/// Client-supplied ids are left alone; repeats among them are rejected later
/// by [`SimulationRequest::validate`].
fn assign_placeholder_ids(questions: &mut [Question]) {
    let mut taken: HashSet<String> = questions
        .iter()
        .filter(|q| !q.id.is_empty())
        .map(|q| q.id.clone())
        .collect();

    for (index, question) in questions.iter_mut().enumerate() {
        if !question.id.is_empty() {
            continue;
        }
        let base = format!("q_{}", index + 1);
        let mut candidate = base.clone();
        let mut suffix = 2;
        while taken.contains(&candidate) {
            candidate = format!("{base}_{suffix}");
            suffix += 1;
        }
        taken.insert(candidate.clone());
        question.id = candidate;
    }
}

/// Trim, drop blanks, and deduplicate case-insensitively keeping first-seen casing.
fn normalize_options(raw: Option<&Value>) -> Vec<String> {
    let Some(items) = raw.and_then(Value::as_array) else {
        return Vec::new();
    };

    let mut seen: Vec<String> = Vec::with_capacity(items.len());
    let mut options = Vec::with_capacity(items.len());
    for item in items {
        let text = option_text(item);
        let text = text.trim();
        if text.is_empty() {
            continue;
        }
        let key = text.to_lowercase();
        if seen.contains(&key) {
            continue;
        }
        seen.push(key);
        options.push(text.to_string());
    }
    options
}

/// Options arrive as strings, numbers, or objects carrying a label.
fn option_text(item: &Value) -> String {
    match item {
        Value::Object(fields) => ["text", "label", "value"]
            .iter()
            .map(|key| text_field(fields, key))
            .find(|t| !t.trim().is_empty())
            .unwrap_or_default(),
        other => scalar_text(other),
    }
}

fn normalize_audience(
    audience: &Map<String, Value>,
    form: &Map<String, Value>,
    body: &Map<String, Value>,
) -> Audience {
    let empty = Map::new();
    let context = form
        .get("contextData")
        .and_then(Value::as_object)
        .or_else(|| body.get("contextData").and_then(Value::as_object))
        .unwrap_or(&empty);

    Audience {
        name: text_field(audience, "name"),
        description: text_field(audience, "description"),
        demographics: object_field(audience, "demographics"),
        psychographics: object_field(audience, "psychographics"),
        context: AudienceContext {
            audience_context: text_field(context, "audienceContext").trim().to_string(),
            user_insights: text_field(context, "userInsights").trim().to_string(),
        },
    }
}

/// A field that is present and not null.
fn present<'a>(fields: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    fields.get(key).filter(|v| !v.is_null())
}

fn text_field(fields: &Map<String, Value>, key: &str) -> String {
    fields.get(key).map(scalar_text).unwrap_or_default()
}

fn object_field(fields: &Map<String, Value>, key: &str) -> Map<String, Value> {
    fields
        .get(key)
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_default()
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => String::new(),
    }
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
        Value::Null => false,
    }
}
