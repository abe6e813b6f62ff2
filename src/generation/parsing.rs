//! Reply text and JSON extraction.
//!
//! Assistants wrap JSON in several ways:
//! 1. Raw JSON (ideal case)
//! 2. JSON wrapped in a markdown json code fence
//! 3. JSON with prose before or after it
//!
//! [`extract_json`] recovers the object from any of these or fails with a
//! [`ParseError`]. It never substitutes empty data.

use serde_json::Value;

use crate::error::ParseError;
use crate::provider::{MessageContent, MessageList};

/// Maximum characters of reply text echoed in parse errors.
pub const PREVIEW_CHARS: usize = 100;

/// Take the reply text from a newest-first message list.
///
/// The first assistant message wins; within it the first text part with a
/// non-blank value. Returns the trimmed text.
#[must_use]
pub fn extract_text(messages: &MessageList) -> Option<String> {
    messages
        .data
        .iter()
        .filter(|m| m.role == "assistant")
        .find_map(|m| {
            m.content.iter().find_map(|part| match part {
                MessageContent::Text { text } if !text.value.trim().is_empty() => {
                    Some(text.value.trim().to_string())
                }
                _ => None,
            })
        })
}

/// Extract a JSON value from assistant text.
///
/// Strips a leading ```` ```json ```` or ```` ``` ```` fence and a trailing
/// fence, then tries a direct parse. On failure, parses the widest span from
/// the first `{` to the last `}`, and finally the first balanced object.
///
/// # Errors
///
/// Returns [`ParseError::NoJson`] when the text holds no object and
/// [`ParseError::InvalidJson`] when every candidate fails to parse.
///
/// # Examples
///
/// ```
/// use survey_simulator::generation::extract_json;
///
/// let json = extract_json(r#"{"status": "completed"}"#).unwrap();
/// assert_eq!(json["status"], "completed");
///
/// let json = extract_json("```json\n{\"status\": \"completed\"}\n```").unwrap();
/// assert_eq!(json["status"], "completed");
///
/// let json = extract_json("Aquí está el resultado: {\"ok\": true}").unwrap();
/// assert_eq!(json["ok"], true);
///
/// assert!(extract_json("sin datos").is_err());
/// ```
pub fn extract_json(text: &str) -> Result<Value, ParseError> {
    let cleaned = strip_code_fence(text);

    if let Ok(value) = serde_json::from_str(cleaned) {
        return Ok(value);
    }

    let Some(widest) = widest_object(cleaned) else {
        return Err(ParseError::NoJson {
            preview: truncate_for_preview(text, PREVIEW_CHARS),
        });
    };

    match serde_json::from_str(widest) {
        Ok(value) => Ok(value),
        Err(widest_err) => match extract_balanced_object(cleaned) {
            Some(object) if object != widest => serde_json::from_str(object).map_err(|e| {
                ParseError::InvalidJson {
                    message: e.to_string(),
                    preview: truncate_for_preview(text, PREVIEW_CHARS),
                }
            }),
            _ => Err(ParseError::InvalidJson {
                message: widest_err.to_string(),
                preview: truncate_for_preview(text, PREVIEW_CHARS),
            }),
        },
    }
}

/// Remove one leading and one trailing markdown fence.
fn strip_code_fence(text: &str) -> &str {
    let mut s = text.trim();
    if let Some(rest) = strip_prefix_ignore_case(s, "```json") {
        s = rest;
    } else if let Some(rest) = s.strip_prefix("```") {
        s = rest;
    }
    s = s.trim_start();
    if let Some(rest) = s.strip_suffix("```") {
        s = rest;
    }
    s.trim()
}

fn strip_prefix_ignore_case<'a>(text: &'a str, prefix: &str) -> Option<&'a str> {
    let head = text.get(..prefix.len())?;
    head.eq_ignore_ascii_case(prefix)
        .then(|| &text[prefix.len()..])
}

/// First `{` through last `}`.
fn widest_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

/// The first brace-balanced object, ignoring braces inside strings.
fn extract_balanced_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0_u32;
    let mut in_string = false;
    let mut escape_next = false;

    for (i, ch) in text[start..].char_indices() {
        if escape_next {
            escape_next = false;
            continue;
        }

        if ch == '\\' && in_string {
            escape_next = true;
            continue;
        }

        if ch == '"' {
            in_string = !in_string;
            continue;
        }

        if !in_string {
            if ch == '{' {
                depth += 1;
            } else if ch == '}' {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(&text[start..=start + i]);
                }
            }
        }
    }

    None
}

/// Truncate text on a character boundary for error previews.
#[must_use]
pub fn truncate_for_preview(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        None => text.to_string(),
        Some((cut, _)) => format!("{}...", &text[..cut]),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::provider::ThreadMessage;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_extract_text_newest_assistant_first() {
        let list = MessageList::new(vec![
            ThreadMessage::assistant("  {\"n\": 2}  "),
            ThreadMessage::assistant("{\"n\": 1}"),
            ThreadMessage::user("prompt"),
        ]);
        assert_eq!(extract_text(&list).as_deref(), Some("{\"n\": 2}"));
    }

    #[test]
    fn test_extract_text_skips_blank_and_non_text_parts() {
        let message = ThreadMessage {
            role: "assistant".to_string(),
            content: vec![
                MessageContent::Other,
                MessageContent::text("   "),
                MessageContent::text("respuesta"),
            ],
        };
        let list = MessageList::new(vec![ThreadMessage::user("hola"), message]);
        assert_eq!(extract_text(&list).as_deref(), Some("respuesta"));
    }

    #[test]
    fn test_extract_text_none_without_assistant() {
        let list = MessageList::new(vec![ThreadMessage::user("hola")]);
        assert_eq!(extract_text(&list), None);
        assert_eq!(extract_text(&MessageList::default()), None);
    }

    #[test]
    fn test_extract_json_raw() {
        assert_eq!(extract_json(r#"{"a": 1}"#).unwrap(), json!({"a": 1}));
    }

    #[test]
    fn test_extract_json_fenced() {
        let text = "```json\n{\"results\": []}\n```";
        assert_eq!(extract_json(text).unwrap(), json!({"results": []}));
    }

    #[test]
    fn test_extract_json_uppercase_fence() {
        let text = "```JSON\n{\"a\": true}```";
        assert_eq!(extract_json(text).unwrap(), json!({"a": true}));
    }

    #[test]
    fn test_extract_json_generic_fence() {
        let text = "```\n{\"a\": \"b\"}\n```";
        assert_eq!(extract_json(text).unwrap(), json!({"a": "b"}));
    }

    #[test]
    fn test_extract_json_leading_prose() {
        let text = "Claro, aquí tienes:\n{\"status\": \"completed\", \"results\": [{\"x\": 1}]}";
        assert_eq!(
            extract_json(text).unwrap(),
            json!({"status": "completed", "results": [{"x": 1}]})
        );
    }

    #[test]
    fn test_extract_json_trailing_prose_after_first_object() {
        let text = "{\"a\": 1} y luego {nota}";
        assert_eq!(extract_json(text).unwrap(), json!({"a": 1}));
    }

    #[test]
    fn test_extract_json_braces_in_strings() {
        let text = "Resultado: {\"text\": \"usa {llaves}\"} fin";
        assert_eq!(extract_json(text).unwrap(), json!({"text": "usa {llaves}"}));
    }

    #[test]
    fn test_extract_json_no_object() {
        let err = extract_json("no hay datos").unwrap_err();
        assert!(matches!(err, ParseError::NoJson { .. }));
        assert!(err.to_string().contains("no hay datos"));
    }

    #[test]
    fn test_extract_json_invalid_object() {
        let err = extract_json("{\"a\": }").unwrap_err();
        assert!(matches!(err, ParseError::InvalidJson { .. }));
    }

    #[test]
    fn test_truncate_for_preview_multibyte() {
        let text = "ñ".repeat(150);
        let preview = truncate_for_preview(&text, 100);
        assert_eq!(preview.chars().count(), 103);
        assert!(preview.ends_with("..."));
        assert_eq!(truncate_for_preview("corto", 100), "corto");
    }
}
