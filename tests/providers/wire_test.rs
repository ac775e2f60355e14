//! Tests for provider wire-format builders and parsers.

use construct::providers::{
    anthropic, ollama, CompletionRequest, ContentPart, Message, MessageContent, Role, StopReason,
};

fn text_request(system: &str, user: &str) -> CompletionRequest {
    CompletionRequest {
        messages: vec![Message {
            role: Role::User,
            content: MessageContent::Text(user.to_owned()),
        }],
        system: Some(system.to_owned()),
        max_tokens: Some(64),
    }
}

// ---------------------------------------------------------------------------
// Anthropic
// ---------------------------------------------------------------------------

#[test]
fn anthropic_request_carries_system_and_max_tokens() {
    let request = anthropic::build_request("claude-sonnet", &text_request("be brief", "hi"));
    assert_eq!(request.model, "claude-sonnet");
    assert_eq!(request.max_tokens, 64);
    assert_eq!(request.system.as_deref(), Some("be brief"));
    assert_eq!(request.messages.len(), 1);
    assert_eq!(request.messages[0].role, "user");
}

#[test]
fn anthropic_request_encodes_image_parts_as_base64_source() {
    let request = CompletionRequest {
        messages: vec![Message {
            role: Role::User,
            content: MessageContent::Parts(vec![
                ContentPart::Image {
                    media_type: "image/png".to_owned(),
                    data: "aGVsbG8=".to_owned(),
                },
                ContentPart::Text {
                    text: "describe this".to_owned(),
                },
            ]),
        }],
        system: None,
        max_tokens: None,
    };
    let api_request = anthropic::build_request("claude-sonnet", &request);
    let json = serde_json::to_value(&api_request.messages[0].content).expect("serializable");
    assert_eq!(json[0]["type"], "image");
    assert_eq!(json[0]["source"]["media_type"], "image/png");
    assert_eq!(json[0]["source"]["data"], "aGVsbG8=");
    assert_eq!(json[1]["type"], "text");
}

#[test]
fn anthropic_response_parses_text_and_usage() {
    let body = r#"{
        "content": [{"type": "text", "text": "sounds good"}],
        "model": "claude-sonnet",
        "stop_reason": "end_turn",
        "usage": {"input_tokens": 10, "output_tokens": 3}
    }"#;
    let response = anthropic::parse_response(body).expect("parse");
    assert_eq!(response.text, "sounds good");
    assert_eq!(response.stop_reason, StopReason::EndTurn);
    assert_eq!(response.usage.input_tokens, 10);
    assert_eq!(response.usage.output_tokens, 3);
}

#[test]
fn anthropic_response_rejects_malformed_body() {
    assert!(anthropic::parse_response("{not json").is_err());
}

// ---------------------------------------------------------------------------
// Ollama
// ---------------------------------------------------------------------------

#[test]
fn ollama_request_injects_system_message_first() {
    let request = ollama::build_request("llama3", &text_request("be brief", "hi"));
    assert_eq!(request.model, "llama3");
    assert!(!request.stream);
    assert_eq!(request.messages.len(), 2);
    assert_eq!(request.messages[0].role, "system");
    assert_eq!(request.messages[0].content, "be brief");
    assert_eq!(request.messages[1].role, "user");
}

#[test]
fn ollama_request_lifts_image_parts_into_images_array() {
    let request = CompletionRequest {
        messages: vec![Message {
            role: Role::User,
            content: MessageContent::Parts(vec![
                ContentPart::Image {
                    media_type: "image/jpeg".to_owned(),
                    data: "aGVsbG8=".to_owned(),
                },
                ContentPart::Text {
                    text: "describe this".to_owned(),
                },
            ]),
        }],
        system: None,
        max_tokens: None,
    };
    let api_request = ollama::build_request("llava", &request);
    assert_eq!(
        api_request.messages[0].images,
        Some(vec!["aGVsbG8=".to_owned()])
    );
    assert_eq!(api_request.messages[0].content, "describe this");
}

#[test]
fn ollama_response_parses_content_and_counts() {
    let body = r#"{
        "message": {"content": "sure thing"},
        "model": "llama3",
        "prompt_eval_count": 12,
        "eval_count": 4
    }"#;
    let response = ollama::parse_response(body).expect("parse");
    assert_eq!(response.text, "sure thing");
    assert_eq!(response.usage.input_tokens, 12);
    assert_eq!(response.usage.output_tokens, 4);
}

#[test]
fn ollama_response_tolerates_missing_counts() {
    let body = r#"{"message": {"content": "ok"}, "model": "llama3"}"#;
    let response = ollama::parse_response(body).expect("parse");
    assert_eq!(response.usage.input_tokens, 0);
    assert_eq!(response.usage.output_tokens, 0);
}
