// src/services/normalizer.rs
//! Maps a successful backend body to generated text.
//!
//! Precedence is fixed:
//! 1. a list whose first element carries `generated_text` (prompt echo removed, trimmed)
//! 2. an object carrying `generated_text`
//! 3. an object carrying `response`
//! 4. anything else is [`NormalizeError::UnexpectedShape`]
//!
//! A recognized field that is blank (after echo removal) is also
//! `UnexpectedShape`; an empty reply is never a success.

use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum NormalizeError {
    #[error("unexpected response shape: {0}")]
    UnexpectedShape(String),
}

pub fn normalize(body: &Value, prompt: Option<&str>) -> Result<String, NormalizeError> {
    match body {
        Value::Array(items) => match items.first().and_then(|first| first.get("generated_text")) {
            Some(Value::String(text)) => non_blank(strip_prompt_echo(text, prompt).trim(), body),
            _ => Err(unexpected(body)),
        },
        Value::Object(map) => {
            if let Some(Value::String(text)) = map.get("generated_text") {
                non_blank(text, body)
            } else if let Some(Value::String(text)) = map.get("response") {
                non_blank(text, body)
            } else {
                Err(unexpected(body))
            }
        }
        _ => Err(unexpected(body)),
    }
}

/// Like [`normalize`], for a raw body that may not be JSON at all.
pub fn normalize_bytes(body: &[u8], prompt: Option<&str>) -> Result<String, NormalizeError> {
    match serde_json::from_slice::<Value>(body) {
        Ok(value) => normalize(&value, prompt),
        Err(_) => Err(NormalizeError::UnexpectedShape(format!(
            "non-JSON body: {}",
            preview(&String::from_utf8_lossy(body))
        ))),
    }
}

/// Remove a leading copy of the prompt, if the model echoed it back.
pub fn strip_prompt_echo<'a>(text: &'a str, prompt: Option<&str>) -> &'a str {
    match prompt {
        Some(p) if !p.is_empty() => text.strip_prefix(p).unwrap_or(text),
        _ => text,
    }
}

fn non_blank(text: &str, body: &Value) -> Result<String, NormalizeError> {
    if text.trim().is_empty() {
        Err(NormalizeError::UnexpectedShape(format!(
            "empty generated text: {}",
            preview(&body.to_string())
        )))
    } else {
        Ok(text.to_string())
    }
}

fn unexpected(body: &Value) -> NormalizeError {
    NormalizeError::UnexpectedShape(preview(&body.to_string()))
}

fn preview(text: &str) -> String {
    const MAX: usize = 200;
    if text.chars().count() <= MAX {
        text.to_string()
    } else {
        let cut: String = text.chars().take(MAX).collect();
        format!("{cut}...")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn local_generate_shape() {
        let body = json!({"model": "llama3", "response": "hello", "done": true});
        assert_eq!(normalize(&body, None).unwrap(), "hello");
    }

    #[test]
    fn hosted_list_shape_strips_echo() {
        let body = json!([{"generated_text": "PROMPT_TEXT: actual answer"}]);
        assert_eq!(normalize(&body, Some("PROMPT_TEXT:")).unwrap(), "actual answer");
    }

    #[test]
    fn hosted_list_shape_without_echo() {
        let body = json!([{"generated_text": "  just the answer \n"}]);
        assert_eq!(normalize(&body, Some("PROMPT_TEXT:")).unwrap(), "just the answer");
    }

    #[test]
    fn object_generated_text_wins_over_response() {
        let body = json!({"generated_text": "a", "response": "b"});
        assert_eq!(normalize(&body, None).unwrap(), "a");
    }

    #[test]
    fn unrecognized_shapes_are_errors() {
        for body in [
            json!([]),
            json!([{"text": "x"}]),
            json!([{"generated_text": 42}]),
            json!({"choices": []}),
            json!({"response": null}),
            json!("raw string"),
            json!(7),
            Value::Null,
        ] {
            assert!(
                matches!(normalize(&body, None), Err(NormalizeError::UnexpectedShape(_))),
                "accepted {body}"
            );
        }
    }

    #[test]
    fn blank_text_is_an_error() {
        let prompt = "You help teachers.\n\nUser: hi\n\nAssistant:";
        for (body, prompt) in [
            (json!([{"generated_text": prompt}]), Some(prompt)),
            (json!([{"generated_text": format!("{prompt} \n ")}]), Some(prompt)),
            (json!({"response": ""}), None),
            (json!({"generated_text": "  "}), None),
        ] {
            let err = normalize(&body, prompt).unwrap_err();
            assert!(err.to_string().contains("empty generated text"), "accepted {body}");
        }
    }

    #[test]
    fn object_text_is_not_trimmed() {
        let body = json!({"response": "  indented answer\n"});
        assert_eq!(normalize(&body, None).unwrap(), "  indented answer\n");
    }

    #[test]
    fn non_json_bytes_are_errors() {
        let err = normalize_bytes(b"<html>oops</html>", None).unwrap_err();
        assert!(err.to_string().contains("non-JSON"));
        assert_eq!(normalize_bytes(br#"{"response":"ok"}"#, None).unwrap(), "ok");
    }

    #[test]
    fn strip_echo_ignores_empty_prompt() {
        assert_eq!(strip_prompt_echo("abc", Some("")), "abc");
        assert_eq!(strip_prompt_echo("abc", Some("ab")), "c");
        assert_eq!(strip_prompt_echo("abc", None), "abc");
    }
}
