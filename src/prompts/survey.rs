//! Survey prompts: aggregate, persona batch and rationale.

use serde_json::{json, Value};

use super::{audience_line, questions_line};
use crate::aggregate::{respondent_id, AggregateResult};
use crate::survey::SimulationRequest;

/// Prompt for basic surveys.
///
/// The provider returns one percentage distribution per question.
#[must_use]
pub fn aggregate_prompt(request: &SimulationRequest) -> String {
    [
        "Eres un simulador de resultados de encuestas para investigación de mercado.".to_string(),
        "Devuelve SOLO un objeto JSON válido, sin texto extra, con este formato EXACTO:".to_string(),
        r#"{"status":"completed","results":[{"questionId":"...","question":"...","type":"multiple-choice","options":["..."],"aggregates":[{"text":"...","percentage":0}],"rationale":"breve"}]}"#.to_string(),
        "Reglas:".to_string(),
        "- Incluye un elemento en results por cada pregunta, con el mismo questionId.".to_string(),
        "- Usa ESTRICTAMENTE demographics, psychographics y context; si existen, no digas que faltan.".to_string(),
        "- En aggregates usa EXACTAMENTE los textos de options, en el mismo orden.".to_string(),
        "- percentage es un entero entre 0 y 100.".to_string(),
        "- En elección única, los porcentajes deben sumar 100.".to_string(),
        "- En multi-select, cada opción puede ser 0 a 100 y la suma puede superar 100.".to_string(),
        "- No favorezcas una opción sólo por estar preguntada: sé realista.".to_string(),
        String::new(),
        audience_line(request),
        questions_line(&request.questions),
    ]
    .join("\n")
}

/// Prompt for one professional batch of `size` respondents.
///
/// Respondent ids continue from `offset`: the batch covers
/// `r{offset + 1}` through `r{offset + size}`.
#[must_use]
pub fn persona_batch_prompt(request: &SimulationRequest, offset: usize, size: usize) -> String {
    let first = respondent_id(offset + 1);
    let last = respondent_id(offset + size);
    [
        "Eres un simulador que genera PERSONAS SINTÉTICAS y sus respuestas para investigación de mercado.".to_string(),
        format!("Debes generar EXACTAMENTE {size} personas sintéticas distintas que respondan TODAS las preguntas."),
        format!("Usa respondentId consecutivos desde {first} hasta {last}."),
        "Salida: SOLO un objeto JSON válido, sin texto extra, con este formato EXACTO:".to_string(),
        r#"{"status":"completed","raw_respondents":[{"respondentId":"r0001","answers":[{"questionId":"...","choice":"texto-opcion"},{"questionId":"...","choices":["texto-opcion","texto-opcion"]}]}]}"#.to_string(),
        "Reglas IMPORTANTES:".to_string(),
        "- Todas las respuestas deben usar SOLAMENTE opciones provistas en cada pregunta (texto EXACTO).".to_string(),
        "- Si la pregunta es de elección única, usa \"choice\". Si es multi-select, usa \"choices\" (array, puede estar vacío).".to_string(),
        "- Integra demographics, psychographics y context para variar respuestas de forma realista.".to_string(),
        "- No agregues campos que no estén en el esquema.".to_string(),
        String::new(),
        audience_line(request),
        questions_line(&request.questions),
    ]
    .join("\n")
}

/// Prompt asking for one short justification per computed distribution.
#[must_use]
pub fn rationale_prompt(request: &SimulationRequest, results: &[AggregateResult]) -> String {
    let distributions: Vec<Value> = results
        .iter()
        .filter(|r| !r.aggregates.is_empty())
        .map(|r| {
            json!({
                "questionId": r.question_id,
                "question": r.question,
                "aggregates": r.aggregates,
            })
        })
        .collect();
    [
        "Eres un analista de investigación de mercado.".to_string(),
        "Para cada pregunta, explica en 2 a 4 oraciones por qué el público respondería con esa distribución.".to_string(),
        "No recalcules ni modifiques los porcentajes.".to_string(),
        "Salida: SOLO un objeto JSON válido, sin texto extra, con este formato EXACTO:".to_string(),
        r#"{"rationales":[{"questionId":"...","rationale":"..."}]}"#.to_string(),
        String::new(),
        audience_line(request),
        format!("Resultados: {}", Value::Array(distributions)),
    ]
    .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::OptionShare;
    use crate::prompts::tests::sample_request;
    use crate::survey::{SimulationKind, SurveyMode};

    #[test]
    fn test_aggregate_prompt_contract() {
        let request = sample_request(SimulationKind::Survey, SurveyMode::Basic, 100);
        let prompt = aggregate_prompt(&request);
        assert!(prompt.contains("\"results\""));
        assert!(prompt.contains("\"aggregates\""));
        assert!(prompt.contains("sumar 100"));
        assert!(prompt.contains("\"questionId\":\"q2\""));
        assert!(prompt.contains("Jóvenes urbanos"));
    }

    #[test]
    fn test_persona_prompt_uses_batch_size_and_offset() {
        let request = sample_request(SimulationKind::Survey, SurveyMode::Professional, 250);
        let prompt = persona_batch_prompt(&request, 200, 50);
        assert!(prompt.contains("EXACTAMENTE 50 personas"));
        assert!(prompt.contains("desde r0201 hasta r0250"));
        assert!(!prompt.contains("250 personas"));
        assert!(prompt.contains("\"raw_respondents\""));
        assert!(prompt.contains("\"choices\""));
    }

    #[test]
    fn test_rationale_prompt_lists_closed_results_only() {
        let request = sample_request(SimulationKind::Survey, SurveyMode::Professional, 100);
        let closed = AggregateResult::for_question(
            &request.questions[0],
            vec![OptionShare::new("Sí", 70), OptionShare::new("No", 30)],
        );
        let mut open = AggregateResult::for_question(&request.questions[1], Vec::new());
        open.question_id = "q_open".to_string();
        let prompt = rationale_prompt(&request, &[closed, open]);
        assert!(prompt.contains("\"rationales\""));
        assert!(prompt.contains("\"percentage\":70"));
        assert!(!prompt.contains("q_open"));
    }
}
