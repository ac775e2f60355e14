//! Tests for stage-role provider resolution.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use construct::config::ModelsConfig;
use construct::credentials::Credentials;
use construct::providers::ollama::OllamaProvider;
use construct::providers::router::ModelRouter;
use construct::providers::LlmProvider;

fn empty_credentials() -> Credentials {
    Credentials::from_map(BTreeMap::new())
}

#[test]
fn default_is_used_when_role_has_no_override() {
    let models = ModelsConfig {
        default: "ollama/llama3".to_owned(),
        roles: HashMap::new(),
    };
    let router = ModelRouter::from_config(&models, &empty_credentials()).expect("router");
    assert_eq!(router.resolve_spec(Some("verify")), "ollama/llama3");
    assert_eq!(router.resolve_spec(None), "ollama/llama3");
    assert_eq!(router.provider_count(), 1);
}

#[test]
fn role_override_wins_over_default() {
    let mut roles = HashMap::new();
    roles.insert("verify".to_owned(), "ollama/qwen3:8b".to_owned());
    let models = ModelsConfig {
        default: "ollama/llama3".to_owned(),
        roles,
    };
    let router = ModelRouter::from_config(&models, &empty_credentials()).expect("router");
    assert_eq!(router.resolve_spec(Some("verify")), "ollama/qwen3:8b");
    assert_eq!(router.resolve_spec(Some("think")), "ollama/llama3");
    assert!(router.has_model("ollama/qwen3:8b"));
}

#[test]
fn anthropic_override_without_credentials_falls_back_to_default() {
    let mut roles = HashMap::new();
    roles.insert(
        "verify".to_owned(),
        "anthropic/claude-sonnet-4-5-20250929".to_owned(),
    );
    let models = ModelsConfig {
        default: "ollama/llama3".to_owned(),
        roles,
    };
    let router = ModelRouter::from_config(&models, &empty_credentials()).expect("router");
    // The cloud spec could not be instantiated, so the role resolves to
    // the default instead of erroring.
    assert_eq!(router.resolve_spec(Some("verify")), "ollama/llama3");
}

#[test]
fn missing_default_provider_is_an_error() {
    let models = ModelsConfig {
        default: "anthropic/claude-sonnet-4-5-20250929".to_owned(),
        roles: HashMap::new(),
    };
    assert!(ModelRouter::from_config(&models, &empty_credentials()).is_err());
}

#[test]
fn unsupported_provider_prefix_is_skipped() {
    let mut roles = HashMap::new();
    roles.insert("describe".to_owned(), "acme/vision-9000".to_owned());
    let models = ModelsConfig {
        default: "ollama/llama3".to_owned(),
        roles,
    };
    let router = ModelRouter::from_config(&models, &empty_credentials()).expect("router");
    assert_eq!(router.resolve_spec(Some("describe")), "ollama/llama3");
}

#[test]
fn for_testing_serves_the_injected_provider() {
    let provider = Arc::new(OllamaProvider::new(
        "ollama/llama3".to_owned(),
        "llama3".to_owned(),
    ));
    let router = ModelRouter::for_testing(
        "ollama/llama3".to_owned(),
        provider as Arc<dyn LlmProvider>,
    );
    let resolved = router.resolve(Some("anything")).expect("default fallback");
    assert_eq!(resolved.model_id(), "ollama/llama3");
    assert_eq!(router.available_specs(), vec!["ollama/llama3".to_owned()]);
}
