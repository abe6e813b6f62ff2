//! Interview prompt.

use serde_json::{json, Value};

use super::audience_line;
use crate::survey::{Question, SimulationRequest, INTERVIEW_RESPONDENTS};

/// Prompt for interviews: free-text answers, no percentages.
///
/// The answer count per question is the respondent count capped at the
/// interview maximum. Every question is treated as open: declared options
/// are left out of the listing.
#[must_use]
pub fn interview_prompt(request: &SimulationRequest) -> String {
    let answers = request
        .respondent_count
        .clamp(INTERVIEW_RESPONDENTS.0, INTERVIEW_RESPONDENTS.1);
    [
        "Eres un entrevistador virtual que genera respuestas textuales auténticas.".to_string(),
        format!("Para CADA pregunta, genera EXACTAMENTE {answers} respuestas únicas."),
        "Cada respuesta debe ser un texto completo de 2 a 3 oraciones, natural y realista.".to_string(),
        "Todas las preguntas se responden en texto libre; no elijas entre opciones.".to_string(),
        "No incluyas porcentajes ni conteos.".to_string(),
        "Salida: SOLO un objeto JSON válido, sin texto extra, con este formato EXACTO:".to_string(),
        r#"{"status":"completed","results":[{"questionId":"...","question":"...","answers":[{"text":"..."},{"text":"..."}]}]}"#.to_string(),
        String::new(),
        audience_line(request),
        open_questions_line(&request.questions),
    ]
    .join("\n")
}

fn open_questions_line(questions: &[Question]) -> String {
    let items: Vec<Value> = questions
        .iter()
        .map(|q| json!({"questionId": q.id, "question": q.text}))
        .collect();
    format!("Preguntas: {}", Value::Array(items))
}
