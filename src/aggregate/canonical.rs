//! Mapping provider answer text back onto declared options.
//!
//! Provider output is untrusted. An answer either resolves to the exact
//! declared option text or is discarded; it is never coerced into a bucket.

use crate::survey::{Question, QuestionKind};

/// Case-insensitive, trimmed exact match against the declared options.
///
/// Returns the declared casing on a match.
///
/// ```
/// use survey_simulator::aggregate::canonicalize;
///
/// let options = vec!["Sí".to_string(), "No".to_string()];
/// assert_eq!(canonicalize(&options, " SÍ "), Some("Sí"));
/// assert_eq!(canonicalize(&options, "Tal vez"), None);
/// ```
#[must_use]
pub fn canonicalize<'a>(options: &'a [String], candidate: &str) -> Option<&'a str> {
    let wanted = candidate.trim().to_lowercase();
    if wanted.is_empty() {
        return None;
    }
    options
        .iter()
        .find(|o| o.trim().to_lowercase() == wanted)
        .map(String::as_str)
}

/// Canonicalize a respondent's raw selection for one question.
///
/// - Single-choice: the first candidate must match, otherwise the answer is
///   dropped (`None`).
/// - Multi-select: each candidate is matched independently, unmatched ones
///   are dropped and duplicates collapse; the result may be empty.
/// - Open questions are never recorded (`None`).
#[must_use]
pub fn canonicalize_selection(question: &Question, candidates: &[String]) -> Option<Vec<String>> {
    match question.kind {
        QuestionKind::SingleChoice => candidates
            .first()
            .and_then(|c| canonicalize(&question.options, c))
            .map(|c| vec![c.to_string()]),
        QuestionKind::MultiSelect => {
            let mut selected: Vec<String> = Vec::with_capacity(candidates.len());
            for candidate in candidates {
                if let Some(option) = canonicalize(&question.options, candidate) {
                    if !selected.iter().any(|s| s == option) {
                        selected.push(option.to_string());
                    }
                }
            }
            Some(selected)
        }
        QuestionKind::OpenText => None,
    }
}
