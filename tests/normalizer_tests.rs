use chat_relay::services::normalizer::{NormalizeError, normalize, normalize_bytes};
use chat_relay::services::prompt::format_prompt;
use serde_json::json;

#[test]
fn test_hosted_echo_of_full_prompt_is_removed() {
    let prompt = format_prompt("You help teachers.", "What forms do I need?", 8000);
    let generated = format!("{prompt}  An incident report and a parent notice.\n");
    let body = json!([{ "generated_text": generated }]);

    let text = normalize(&body, Some(&prompt)).unwrap();
    assert_eq!(text, "An incident report and a parent notice.");
}

#[test]
fn test_documented_shapes() {
    assert_eq!(normalize(&json!({ "response": "hello" }), None).unwrap(), "hello");
    assert_eq!(
        normalize(
            &json!([{ "generated_text": "PROMPT_TEXT: actual answer" }]),
            Some("PROMPT_TEXT:")
        )
        .unwrap(),
        "actual answer"
    );
    assert_eq!(normalize(&json!({ "generated_text": "direct" }), Some("x")).unwrap(), "direct");
}

#[test]
fn test_prompt_only_echo_is_not_a_reply() {
    let prompt = format_prompt("You help teachers.", "What forms do I need?", 8000);
    let body = json!([{ "generated_text": format!("{prompt}\n") }]);
    assert!(matches!(normalize(&body, Some(&prompt)), Err(NormalizeError::UnexpectedShape(_))));
}

#[test]
fn test_fourth_shape_is_never_success() {
    let loading = br#"{"error": "Model is currently loading", "estimated_time": 20.0}"#;
    let err = normalize_bytes(loading, None).unwrap_err();
    assert!(matches!(err, NormalizeError::UnexpectedShape(_)));

    let err = normalize_bytes(b"", None).unwrap_err();
    assert!(matches!(err, NormalizeError::UnexpectedShape(_)));
}

#[test]
fn test_long_bodies_are_previewed() {
    let huge = format!(r#"{{"blob": "{}"}}"#, "x".repeat(10_000));
    let NormalizeError::UnexpectedShape(reason) =
        normalize_bytes(huge.as_bytes(), None).unwrap_err();
    assert!(reason.len() < 1_000);
    assert!(reason.ends_with("..."));
}
