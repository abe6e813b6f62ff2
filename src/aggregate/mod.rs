//! Option canonicalization, counting and percentage normalization.
//!
//! Everything in this module is pure and synchronous. Given the same
//! questions and respondents the output is identical.

mod canonical;
mod percentages;
mod types;

pub use canonical::{canonicalize, canonicalize_selection};
pub use percentages::{clamp_percentage, normalize_to_100, percentage_of, total_percentage};
pub use types::{respondent_id, AggregateResult, OptionShare, RespondentRecord};

use crate::error::AggregationError;
use crate::survey::{Question, QuestionKind};

/// Aggregate canonical respondent answers into per-question distributions.
///
/// Results follow question order. For each closed question the denominator
/// is the number of respondents with an entry for it; respondents whose
/// single-choice answer was dropped have no entry and do not count. Open
/// questions yield an empty distribution.
#[must_use]
pub fn aggregate(questions: &[Question], respondents: &[RespondentRecord]) -> Vec<AggregateResult> {
    questions
        .iter()
        .map(|question| AggregateResult::for_question(question, distribution(question, respondents)))
        .collect()
}

fn distribution(question: &Question, respondents: &[RespondentRecord]) -> Vec<OptionShare> {
    if !question.is_closed() || question.kind == QuestionKind::OpenText {
        return Vec::new();
    }

    let mut counts = vec![0_usize; question.options.len()];
    let mut answered = 0_usize;

    for respondent in respondents {
        let Some(selected) = respondent.answers.get(&question.id) else {
            continue;
        };
        answered += 1;
        for (slot, option) in counts.iter_mut().zip(&question.options) {
            if selected.iter().any(|s| s == option) {
                *slot += 1;
            }
        }
    }

    let shares: Vec<OptionShare> = question
        .options
        .iter()
        .zip(counts)
        .map(|(option, count)| OptionShare::new(option.clone(), percentage_of(count, answered)))
        .collect();

    match question.kind {
        QuestionKind::SingleChoice => normalize_to_100(&shares),
        _ => shares,
    }
}

/// Check a single result's distribution against its question kind.
///
/// # Errors
///
/// Returns [`AggregationError::Inconsistent`] when a single-choice
/// distribution does not total 100 or any percentage exceeds 100.
pub fn check_distribution(result: &AggregateResult) -> Result<(), AggregationError> {
    let total = total_percentage(&result.aggregates);
    let out_of_range = result.aggregates.iter().any(|s| s.percentage > 100);
    let bad_total =
        result.kind == QuestionKind::SingleChoice && !result.aggregates.is_empty() && total != 100;
    if out_of_range || bad_total {
        return Err(AggregationError::Inconsistent {
            question_id: result.question_id.clone(),
            total,
        });
    }
    Ok(())
}

/// Check every result.
///
/// # Errors
///
/// Returns the first [`AggregationError`] found.
pub fn validate_results(results: &[AggregateResult]) -> Result<(), AggregationError> {
    results.iter().try_for_each(check_distribution)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| (*s).to_string()).collect()
    }

    fn yes_no_question() -> Question {
        Question::new("q1", "¿Recomendarías la marca?", "yes-no", strings(&["Sí", "No"]))
    }

    fn respondents_answering(question_id: &str, answers: &[&str]) -> Vec<RespondentRecord> {
        answers
            .iter()
            .enumerate()
            .map(|(i, a)| {
                RespondentRecord::new(respondent_id(i + 1)).with_answer(question_id, strings(&[a]))
            })
            .collect()
    }

    #[test]
    fn test_six_yes_four_no() {
        let q = yes_no_question();
        let respondents = respondents_answering(
            "q1",
            &["Sí", "Sí", "Sí", "Sí", "Sí", "Sí", "No", "No", "No", "No"],
        );
        let results = aggregate(&[q], &respondents);
        assert_eq!(
            results[0].aggregates,
            vec![OptionShare::new("Sí", 60), OptionShare::new("No", 40)]
        );
        assert!(validate_results(&results).is_ok());
    }

    #[test]
    fn test_invalid_answer_excluded() {
        let q = yes_no_question();
        let raw = ["Sí", "Sí", "No", "Quizás"];
        let respondents: Vec<RespondentRecord> = raw
            .iter()
            .enumerate()
            .map(|(i, a)| {
                let record = RespondentRecord::new(respondent_id(i + 1));
                match canonicalize_selection(&q, &strings(&[a])) {
                    Some(selected) => record.with_answer("q1", selected),
                    None => record,
                }
            })
            .collect();

        let results = aggregate(std::slice::from_ref(&q), &respondents);
        assert_eq!(
            results[0].aggregates,
            vec![OptionShare::new("Sí", 67), OptionShare::new("No", 33)]
        );
        assert_eq!(total_percentage(&results[0].aggregates), 100);
    }

    #[test]
    fn test_rounding_drift_is_normalized() {
        let q = Question::new("q1", "Color", "", strings(&["Rojo", "Azul", "Verde"]));
        let respondents = respondents_answering("q1", &["Rojo", "Azul", "Verde"]);
        let results = aggregate(&[q], &respondents);
        assert_eq!(total_percentage(&results[0].aggregates), 100);
        assert_eq!(results[0].aggregates[0].percentage, 34);
    }

    #[test]
    fn test_multi_select_independent_percentages() {
        let q = Question::new(
            "q2",
            "Redes",
            "multi-select",
            strings(&["Instagram", "TikTok", "X"]),
        );
        let respondents = vec![
            RespondentRecord::new("r0001").with_answer("q2", strings(&["Instagram", "TikTok"])),
            RespondentRecord::new("r0002").with_answer("q2", strings(&["Instagram"])),
            RespondentRecord::new("r0003").with_answer("q2", Vec::new()),
            RespondentRecord::new("r0004").with_answer("q2", strings(&["Instagram", "X"])),
        ];
        let results = aggregate(&[q], &respondents);
        assert_eq!(
            results[0].aggregates,
            vec![
                OptionShare::new("Instagram", 75),
                OptionShare::new("TikTok", 25),
                OptionShare::new("X", 25),
            ]
        );
        assert_eq!(total_percentage(&results[0].aggregates), 125);
        assert!(check_distribution(&results[0]).is_ok());
    }

    #[test]
    fn test_open_question_has_empty_distribution() {
        let q = Question::new("q3", "¿Qué mejorarías?", "open", Vec::new());
        let results = aggregate(&[q], &respondents_answering("q3", &["algo"]));
        assert!(results[0].aggregates.is_empty());
        assert_eq!(results[0].question_type, "open");
    }

    #[test]
    fn test_no_answers_yields_first_option_full() {
        let q = yes_no_question();
        let results = aggregate(&[q], &[]);
        assert_eq!(
            results[0].aggregates,
            vec![OptionShare::new("Sí", 100), OptionShare::new("No", 0)]
        );
    }

    #[test]
    fn test_results_follow_question_order() {
        let questions = vec![
            Question::new("b", "B", "", strings(&["1", "2"])),
            Question::new("a", "A", "", strings(&["1", "2"])),
        ];
        let ids: Vec<String> = aggregate(&questions, &[])
            .into_iter()
            .map(|r| r.question_id)
            .collect();
        assert_eq!(ids, strings(&["b", "a"]));
    }

    #[test]
    fn test_check_distribution_flags_bad_total() {
        let q = yes_no_question();
        let result = AggregateResult::for_question(
            &q,
            vec![OptionShare::new("Sí", 50), OptionShare::new("No", 40)],
        );
        assert_eq!(
            check_distribution(&result),
            Err(AggregationError::Inconsistent {
                question_id: "q1".to_string(),
                total: 90,
            })
        );
    }

    #[test]
    fn test_result_serializes_wire_shape() {
        let q = yes_no_question();
        let result = AggregateResult::for_question(
            &q,
            vec![OptionShare::new("Sí", 60), OptionShare::new("No", 40)],
        )
        .with_rationale("  La marca tiene buena reputación.  ");
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["questionId"], "q1");
        assert_eq!(json["type"], "yes-no");
        assert_eq!(json["kind"], "single-choice");
        assert_eq!(json["aggregates"][0]["text"], "Sí");
        assert_eq!(json["aggregates"][0]["percentage"], 60);
        assert_eq!(json["rationale"], "La marca tiene buena reputación.");

        let bare = AggregateResult::for_question(&q, Vec::new()).with_rationale("   ");
        let json = serde_json::to_value(&bare).unwrap();
        assert!(json.get("rationale").is_none());
    }
}
