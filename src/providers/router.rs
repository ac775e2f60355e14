//! Stage-to-provider resolution.
//!
//! Every pipeline stage asks for a provider by its role name (`think`,
//! `decide`, `write`, `verify`, `rewrite`, plus `describe` for vision).
//! A role with a configured override and an instantiable provider gets
//! that model; everything else falls through to the default. Cloud specs
//! whose credentials are missing are skipped at construction time rather
//! than failing the whole router — only a dead default is fatal.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::config::{all_model_specs, ModelsConfig};
use crate::credentials::{resolve_anthropic_auth, Credentials};

use super::anthropic::AnthropicProvider;
use super::ollama::OllamaProvider;
use super::{parse_provider_string, LlmProvider};

/// Provider routing errors.
#[derive(Debug, thiserror::Error)]
pub enum RouterError {
    /// The requested provider spec is not available.
    #[error("provider not available for model spec '{spec}'")]
    UnavailableProvider {
        /// Unavailable spec.
        spec: String,
    },
    /// Default provider spec could not be created.
    #[error("default provider '{spec}' is unavailable: {reason}")]
    DefaultUnavailable {
        /// Missing default spec.
        spec: String,
        /// Why it could not be instantiated.
        reason: String,
    },
    /// Unsupported provider type in spec prefix.
    #[error("unsupported provider '{provider}'")]
    UnsupportedProvider {
        /// Unsupported provider prefix.
        provider: String,
    },
    /// Required API credential missing for selected provider.
    #[error("missing credential for provider '{provider}': {key}")]
    MissingCredential {
        /// Provider name.
        provider: String,
        /// Missing credential key.
        key: String,
    },
}

/// Resolves `stage role -> default` to a concrete provider.
#[derive(Clone)]
pub struct ModelRouter {
    providers: HashMap<String, Arc<dyn LlmProvider>>,
    default: String,
    role_overrides: HashMap<String, String>,
}

impl ModelRouter {
    /// Build a router from model config and loaded credentials.
    ///
    /// Specs that cannot be instantiated (unknown prefix, missing
    /// credential) are logged and skipped; their roles fall back to the
    /// default at resolution time.
    ///
    /// # Errors
    ///
    /// Returns an error if the default provider itself cannot be
    /// instantiated.
    pub fn from_config(models: &ModelsConfig, credentials: &Credentials) -> anyhow::Result<Self> {
        let mut providers: HashMap<String, Arc<dyn LlmProvider>> = HashMap::new();

        for spec in all_model_specs(models) {
            match instantiate(&spec, credentials) {
                Ok(provider) => {
                    debug!(spec = %spec, "provider registered");
                    providers.insert(spec, provider);
                }
                Err(e) if spec == models.default => {
                    return Err(RouterError::DefaultUnavailable {
                        spec: models.default.clone(),
                        reason: e.to_string(),
                    }
                    .into());
                }
                Err(e) => {
                    warn!(spec = %spec, error = %e, "skipping unusable model spec");
                }
            }
        }

        Ok(Self {
            providers,
            default: models.default.clone(),
            role_overrides: models.roles.clone(),
        })
    }

    /// Create a router backed by a single provider for integration tests.
    #[doc(hidden)]
    pub fn for_testing(default_spec: String, provider: Arc<dyn LlmProvider>) -> Self {
        Self {
            providers: HashMap::from([(default_spec.clone(), provider)]),
            default: default_spec,
            role_overrides: HashMap::new(),
        }
    }

    /// Resolve a provider by optional stage role.
    ///
    /// # Errors
    ///
    /// Returns an error if no provider can be resolved.
    pub fn resolve(&self, role: Option<&str>) -> anyhow::Result<Arc<dyn LlmProvider>> {
        let selected = self.resolve_spec(role);
        self.providers
            .get(&selected)
            .cloned()
            .ok_or_else(|| RouterError::UnavailableProvider { spec: selected }.into())
    }

    /// Resolve a model spec string by optional stage role.
    ///
    /// An override only wins when its provider actually exists; otherwise
    /// the role silently uses the default.
    pub fn resolve_spec(&self, role: Option<&str>) -> String {
        role.and_then(|r| self.role_overrides.get(r))
            .filter(|spec| self.providers.contains_key(*spec))
            .cloned()
            .unwrap_or_else(|| self.default.clone())
    }

    /// Returns true when a specific model spec is available.
    pub fn has_model(&self, spec: &str) -> bool {
        self.providers.contains_key(spec)
    }

    /// Returns the default provider.
    pub fn default_provider(&self) -> Arc<dyn LlmProvider> {
        // from_config refuses to build a router without its default.
        Arc::clone(&self.providers[&self.default])
    }

    /// Returns the number of loaded providers.
    pub fn provider_count(&self) -> usize {
        self.providers.len()
    }

    /// Returns all available provider specs in sorted order.
    pub fn available_specs(&self) -> Vec<String> {
        let mut values: Vec<String> = self.providers.keys().cloned().collect();
        values.sort();
        values
    }
}

/// Instantiate one provider from its `<provider>/<model>` spec.
fn instantiate(spec: &str, credentials: &Credentials) -> anyhow::Result<Arc<dyn LlmProvider>> {
    let (provider, model) = parse_provider_string(spec)?;
    match provider {
        "anthropic" => {
            let auth =
                resolve_anthropic_auth(credentials).ok_or(RouterError::MissingCredential {
                    provider: "anthropic".to_owned(),
                    key: "ANTHROPIC_API_KEY".to_owned(),
                })?;
            Ok(Arc::new(AnthropicProvider::new(
                spec.to_owned(),
                model.to_owned(),
                auth,
            )))
        }
        "ollama" => Ok(Arc::new(OllamaProvider::new(
            spec.to_owned(),
            model.to_owned(),
        ))),
        other => Err(RouterError::UnsupportedProvider {
            provider: other.to_owned(),
        }
        .into()),
    }
}
