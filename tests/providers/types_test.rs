//! Tests for shared provider types and helpers.

use construct::providers::{parse_provider_string, ContentPart, MessageContent};

#[test]
fn message_content_text_joins_text_parts_only() {
    let content = MessageContent::Parts(vec![
        ContentPart::Text {
            text: "look at ".to_owned(),
        },
        ContentPart::Image {
            media_type: "image/jpeg".to_owned(),
            data: "aGVsbG8=".to_owned(),
        },
        ContentPart::Text {
            text: "this".to_owned(),
        },
    ]);
    assert_eq!(content.text(), "look at this");
}

#[test]
fn provider_string_parses_into_components() {
    let (provider, model) = parse_provider_string("anthropic/claude-sonnet").expect("valid");
    assert_eq!(provider, "anthropic");
    assert_eq!(model, "claude-sonnet");
}

#[test]
fn provider_string_rejects_malformed_input() {
    assert!(parse_provider_string("no-slash").is_err());
    assert!(parse_provider_string("/model-only").is_err());
    assert!(parse_provider_string("provider/").is_err());
}

#[test]
fn provider_string_keeps_model_slashes_intact() {
    let (provider, model) =
        parse_provider_string("ollama/library/llama3").expect("valid nested model name");
    assert_eq!(provider, "ollama");
    assert_eq!(model, "library/llama3");
}
