//! Provider output parsing.
//!
//! Turns the JSON objects requested by [`crate::prompts`] into canonical
//! results. Provider output is untrusted: labels are mapped back onto the
//! declared options and anything that cannot be mapped is dropped. A reply
//! whose overall shape is wrong is a [`ParseError`], never an empty result.

use std::collections::HashMap;

use serde_json::{Map, Value};

use super::types::{InterviewAnswer, InterviewResult, DEFAULT_STATUS};
use crate::aggregate::{
    canonicalize, canonicalize_selection, clamp_percentage, normalize_to_100, respondent_id,
    AggregateResult, OptionShare, RespondentRecord,
};
use crate::error::ParseError;
use crate::survey::{Question, QuestionKind};

/// The provider's `status` field, or `completed`.
#[must_use]
pub fn provider_status(value: &Value) -> String {
    value
        .get("status")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(DEFAULT_STATUS)
        .to_string()
}

/// Parse an aggregate reply into one result per question, in question order.
///
/// # Errors
///
/// Returns [`ParseError::Shape`] when `results` is not an array or a
/// question has no matching entry.
pub fn parse_basic_results(
    value: &Value,
    questions: &[Question],
) -> Result<Vec<AggregateResult>, ParseError> {
    let entries = array_field(value, "results")?;

    questions
        .iter()
        .enumerate()
        .map(|(index, question)| {
            let entry = find_entry(entries, &question.id, index).ok_or_else(|| {
                ParseError::Shape {
                    message: format!("no result for question {}", question.id),
                }
            })?;
            let aggregates = entry
                .get("aggregates")
                .and_then(Value::as_array)
                .map(|raw| layout_shares(question, raw))
                .unwrap_or_else(|| layout_shares(question, &[]));
            let result = AggregateResult::for_question(question, aggregates);
            Ok(match entry.get("rationale").and_then(Value::as_str) {
                Some(rationale) => result.with_rationale(rationale),
                None => result,
            })
        })
        .collect()
}

/// Map provider shares onto the declared options.
///
/// Unknown labels are dropped, options the provider omitted get 0 and the
/// first share for a repeated label wins. Single-choice distributions are
/// normalized to 100.
fn layout_shares(question: &Question, raw: &[Value]) -> Vec<OptionShare> {
    if !question.is_closed() {
        return Vec::new();
    }

    let mut provided: HashMap<&str, u32> = HashMap::new();
    let mut dropped = 0_usize;
    for share in raw {
        let label = share.get("text").and_then(value_text);
        match label.as_deref().and_then(|l| canonicalize(&question.options, l)) {
            Some(option) => {
                let percentage = share.get("percentage").map_or(0, number_percentage);
                provided.entry(option).or_insert(percentage);
            }
            None => dropped += 1,
        }
    }
    if dropped > 0 {
        tracing::debug!(question_id = %question.id, dropped, "Dropped unknown aggregate labels");
    }

    let shares: Vec<OptionShare> = question
        .options
        .iter()
        .map(|option| {
            OptionShare::new(
                option.clone(),
                provided.get(option.as_str()).copied().unwrap_or(0),
            )
        })
        .collect();

    if question.kind == QuestionKind::SingleChoice {
        normalize_to_100(&shares)
    } else {
        shares
    }
}

/// Parse one persona batch into canonical respondents.
///
/// Respondents are renumbered `offset + 1 ..= offset + expected` in the
/// order the provider emitted them; extra respondents are discarded.
///
/// # Errors
///
/// Returns [`ParseError::Shape`] when `raw_respondents` is not an array and
/// [`ParseError::IncompleteBatch`] when fewer than `expected` respondents
/// were returned.
pub fn parse_respondents(
    value: &Value,
    questions: &[Question],
    batch: usize,
    offset: usize,
    expected: usize,
) -> Result<Vec<RespondentRecord>, ParseError> {
    let raw = array_field(value, "raw_respondents")
        .or_else(|_| array_field(value, "rawRespondents"))?;

    if raw.len() < expected {
        return Err(ParseError::IncompleteBatch {
            batch,
            expected,
            received: raw.len(),
        });
    }

    let mut dropped = 0_usize;
    let respondents: Vec<RespondentRecord> = raw
        .iter()
        .take(expected)
        .enumerate()
        .map(|(i, entry)| {
            let answers = respondent_answers(entry);
            let mut record = RespondentRecord::new(respondent_id(offset + i + 1));
            for question in questions {
                let Some(candidates) = answers.get(question.id.as_str()) else {
                    continue;
                };
                match canonicalize_selection(question, candidates) {
                    Some(selected) => record = record.with_answer(&question.id, selected),
                    None if question.kind == QuestionKind::SingleChoice => dropped += 1,
                    None => {}
                }
            }
            record
        })
        .collect();

    if raw.len() > expected {
        tracing::debug!(batch, expected, received = raw.len(), "Discarded extra respondents");
    }
    if dropped > 0 {
        tracing::debug!(batch, dropped, "Dropped invalid single-choice answers");
    }

    Ok(respondents)
}

/// A respondent's raw selections keyed by question id.
///
/// Accepts `answers` as an array of `{questionId, choice | choices}` or as an
/// object mapping question ids to a choice or list of choices.
fn respondent_answers(entry: &Value) -> HashMap<&str, Vec<String>> {
    let mut answers = HashMap::new();
    match entry.get("answers") {
        Some(Value::Array(items)) => {
            for item in items {
                let Some(question_id) = item.get("questionId").and_then(Value::as_str) else {
                    continue;
                };
                let selection = item
                    .get("choices")
                    .filter(|v| v.is_array())
                    .or_else(|| item.get("choice"))
                    .map(selection_texts)
                    .unwrap_or_default();
                answers.entry(question_id).or_insert(selection);
            }
        }
        Some(Value::Object(map)) => {
            for (question_id, selection) in map {
                answers.insert(question_id.as_str(), selection_texts(selection));
            }
        }
        _ => {}
    }
    answers
}

fn selection_texts(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items.iter().filter_map(value_text).collect(),
        other => value_text(other).into_iter().collect(),
    }
}

/// Parse the `rationales` list into a map from question id to text.
///
/// Malformed entries are skipped.
#[must_use]
pub fn parse_rationales(value: &Value) -> HashMap<String, String> {
    value
        .get("rationales")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| {
                    let id = item.get("questionId").and_then(Value::as_str)?;
                    let text = item.get("rationale").and_then(Value::as_str)?.trim();
                    (!text.is_empty()).then(|| (id.to_string(), text.to_string()))
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Parse an interview reply into one result per question.
///
/// # Errors
///
/// Returns [`ParseError::Shape`] when `results` is not an array or a
/// question has no matching entry.
pub fn parse_interview_results(
    value: &Value,
    questions: &[Question],
    max_answers: usize,
) -> Result<Vec<InterviewResult>, ParseError> {
    let entries = array_field(value, "results")?;

    questions
        .iter()
        .enumerate()
        .map(|(index, question)| {
            let entry = find_entry(entries, &question.id, index).ok_or_else(|| {
                ParseError::Shape {
                    message: format!("no answers for question {}", question.id),
                }
            })?;
            let answers = entry
                .get("answers")
                .and_then(Value::as_array)
                .map(|items| {
                    items
                        .iter()
                        .filter_map(|item| match item {
                            Value::Object(obj) => obj.get("text").and_then(value_text),
                            other => value_text(other),
                        })
                        .map(|text| text.trim().to_string())
                        .filter(|text| !text.is_empty())
                        .take(max_answers)
                        .map(|text| InterviewAnswer { text })
                        .collect()
                })
                .unwrap_or_default();
            Ok(InterviewResult {
                question_id: question.id.clone(),
                question: question.text.clone(),
                answers,
            })
        })
        .collect()
}

fn array_field<'a>(value: &'a Value, key: &str) -> Result<&'a Vec<Value>, ParseError> {
    let object: &Map<String, Value> = value.as_object().ok_or_else(|| ParseError::Shape {
        message: "reply is not a JSON object".to_string(),
    })?;
    object
        .get(key)
        .and_then(Value::as_array)
        .ok_or_else(|| ParseError::Shape {
            message: format!("missing `{key}` array"),
        })
}

/// Entry whose `questionId` matches, else the entry at the same position
/// when that entry carries no id of its own.
fn find_entry<'a>(entries: &'a [Value], question_id: &str, index: usize) -> Option<&'a Value> {
    entries
        .iter()
        .find(|e| e.get("questionId").and_then(Value::as_str) == Some(question_id))
        .or_else(|| {
            entries
                .get(index)
                .filter(|e| e.get("questionId").and_then(Value::as_str).is_none())
        })
}

/// Text of a string or number value.
fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Percentage from a number or numeric string, clamped to `[0, 100]`.
fn number_percentage(value: &Value) -> u32 {
    let raw = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().trim_end_matches('%').trim().parse().ok(),
        _ => None,
    };
    raw.map_or(0, clamp_percentage)
}
