//! Configuration loading and validation.
//!
//! One human-owned TOML file, `~/.construct/config.toml`, describing whose
//! voice is ghostwritten, which models serve which pipeline stage, and the
//! reply-policy knobs. Secrets never live here — see [`crate::credentials`].

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::engine::ReplyPolicy;

/// Top-level configuration.
#[derive(Debug, Deserialize)]
pub struct Config {
    /// Who the engine writes as.
    pub subject: SubjectConfig,

    /// Model routing configuration.
    pub models: ModelsConfig,

    /// Reply policy knobs.
    #[serde(default)]
    pub reply: ReplyConfig,

    /// Storage location overrides.
    #[serde(default)]
    pub storage: StorageConfig,
}

/// The person being impersonated.
#[derive(Debug, Deserialize)]
pub struct SubjectConfig {
    /// Display name as it appears in conversation history.
    pub name: String,
}

/// Model routing: default model and per-stage overrides.
#[derive(Debug, Deserialize)]
pub struct ModelsConfig {
    /// Default model identifier (e.g. "anthropic/claude-sonnet-4-5-20250929").
    pub default: String,

    /// Per-stage model overrides, keyed by stage role (`think`, `decide`,
    /// `write`, `verify`, `rewrite`, `describe`).
    #[serde(default)]
    pub roles: HashMap<String, String>,
}

/// Reply policy knobs. Defaults match the canonical pipeline behavior.
#[derive(Debug, Deserialize)]
pub struct ReplyConfig {
    /// Revisions allowed after the first failed verification.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// History lines pulled per invocation.
    #[serde(default = "default_history_window")]
    pub history_window: u32,

    /// Recent outgoing messages used for anti-repetition.
    #[serde(default = "default_recent_replies")]
    pub recent_replies: usize,

    /// Fixed word ceiling replacing the statistical upper bound during a
    /// detected emergency.
    #[serde(default = "default_emergency_ceiling")]
    pub emergency_ceiling: u32,

    /// Style exemplars shown to the writer.
    #[serde(default = "default_exemplar_count")]
    pub exemplar_count: usize,
}

impl Default for ReplyConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            history_window: default_history_window(),
            recent_replies: default_recent_replies(),
            emergency_ceiling: default_emergency_ceiling(),
            exemplar_count: default_exemplar_count(),
        }
    }
}

impl ReplyConfig {
    /// Convert to the engine's policy struct.
    pub fn to_policy(&self) -> ReplyPolicy {
        ReplyPolicy {
            max_retries: self.max_retries,
            history_window: self.history_window,
            recent_replies: self.recent_replies,
            emergency_ceiling: self.emergency_ceiling,
            exemplar_count: self.exemplar_count,
        }
    }
}

/// Storage location overrides.
#[derive(Debug, Default, Deserialize)]
pub struct StorageConfig {
    /// Data directory override. Defaults to `~/.construct`.
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
}

// Default value functions for serde

fn default_max_retries() -> u32 {
    2
}
fn default_history_window() -> u32 {
    60
}
fn default_recent_replies() -> usize {
    5
}
fn default_emergency_ceiling() -> u32 {
    15
}
fn default_exemplar_count() -> usize {
    2
}

/// Collect every model spec the config references: default plus all stage
/// overrides, deduplicated.
pub fn all_model_specs(models: &ModelsConfig) -> Vec<String> {
    let mut specs = vec![models.default.clone()];
    for spec in models.roles.values() {
        if !specs.contains(spec) {
            specs.push(spec.clone());
        }
    }
    specs
}

/// Load the config from a TOML file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed.
pub fn load_config(path: &Path) -> anyhow::Result<Config> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("failed to read config at {}: {e}", path.display()))?;
    let config: Config = toml::from_str(&contents)
        .map_err(|e| anyhow::anyhow!("failed to parse config at {}: {e}", path.display()))?;
    Ok(config)
}

/// Resolve the config file path: `$CONSTRUCT_CONFIG` or
/// `~/.construct/config.toml`.
///
/// # Errors
///
/// Returns an error if the home directory cannot be determined.
pub fn config_path() -> anyhow::Result<PathBuf> {
    if let Ok(p) = std::env::var("CONSTRUCT_CONFIG") {
        return Ok(PathBuf::from(p));
    }
    Ok(config_dir()?.join("config.toml"))
}

/// Resolve the default config directory (`~/.construct/`).
///
/// # Errors
///
/// Returns an error if the home directory cannot be determined.
pub fn config_dir() -> anyhow::Result<PathBuf> {
    let home = directories::BaseDirs::new()
        .ok_or_else(|| anyhow::anyhow!("cannot determine home directory"))?;
    Ok(home.home_dir().join(".construct"))
}

/// Filesystem layout under the data directory.
#[derive(Debug, Clone)]
pub struct RuntimePaths {
    /// Root data directory.
    pub data_dir: PathBuf,
    /// Credentials file.
    pub env_file: PathBuf,
    /// SQLite database for history, profiles, and notes.
    pub db_file: PathBuf,
    /// Per-invocation chain log artifacts.
    pub chains_dir: PathBuf,
    /// Rotated JSON log files.
    pub logs_dir: PathBuf,
}

/// Resolve runtime paths.
///
/// Precedence for the data directory: `$CONSTRUCT_DATA_DIR` > config
/// `[storage] data_dir` > `~/.construct`.
///
/// # Errors
///
/// Returns an error if no data directory can be resolved.
pub fn runtime_paths(storage: &StorageConfig) -> anyhow::Result<RuntimePaths> {
    let data_dir = match std::env::var("CONSTRUCT_DATA_DIR") {
        Ok(p) if !p.is_empty() => PathBuf::from(p),
        _ => match storage.data_dir {
            Some(ref p) => p.clone(),
            None => config_dir()?,
        },
    };

    Ok(RuntimePaths {
        env_file: data_dir.join(".env"),
        db_file: data_dir.join("construct.db"),
        chains_dir: data_dir.join("chains"),
        logs_dir: data_dir.join("logs"),
        data_dir,
    })
}
