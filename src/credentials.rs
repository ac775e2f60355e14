//! Credential loading from the runtime `.env` file.
//!
//! Secrets live in `~/.construct/.env` (or the process environment) and
//! never in `config.toml`, so the config file can be shared or versioned
//! without leaking keys.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::Context;

/// Runtime credentials loaded from the `.env` file and process env.
#[derive(Clone, Default)]
pub struct Credentials {
    vars: BTreeMap<String, String>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("keys", &self.vars.keys().collect::<Vec<_>>())
            .field("values", &"[REDACTED]")
            .finish()
    }
}

impl Credentials {
    /// Build credentials from a key-value map.
    pub fn from_map(vars: BTreeMap<String, String>) -> Self {
        Self { vars }
    }

    /// Returns a credential value for a key, if present.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    /// Returns a required credential or an error when missing.
    ///
    /// # Errors
    ///
    /// Returns an error when the key does not exist in loaded credentials.
    pub fn require(&self, key: &str) -> anyhow::Result<String> {
        self.vars
            .get(key)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("missing required credential: {key}"))
    }
}

/// Load credentials from a specific `.env` path, merged with the process
/// environment (file values win).
///
/// # Errors
///
/// Returns an error if the file exists but has permissions broader than
/// `0600` or fails to parse. A missing file is not an error — the process
/// environment alone may carry everything needed.
pub fn load_credentials(path: &Path) -> anyhow::Result<Credentials> {
    let mut vars: BTreeMap<String, String> = std::env::vars().collect();

    if path.exists() {
        validate_private_permissions(path)?;

        let iter = dotenvy::from_path_iter(path)
            .with_context(|| format!("failed to read credentials at {}", path.display()))?;
        for item in iter {
            let (key, value) = item.with_context(|| {
                format!(
                    "failed to parse key-value entry in credentials file {}",
                    path.display()
                )
            })?;
            vars.insert(key, value);
        }
    }

    Ok(Credentials { vars })
}

/// Set a credentials file to owner-only permissions where supported.
///
/// # Errors
///
/// Returns an error if permissions cannot be updated.
pub fn enforce_private_file_permissions(path: &Path) -> anyhow::Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;

        let perms = fs::Permissions::from_mode(0o600);
        fs::set_permissions(path, perms)
            .with_context(|| format!("failed to set permissions on {}", path.display()))?;
    }

    Ok(())
}

#[cfg(unix)]
fn validate_private_permissions(path: &Path) -> anyhow::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let metadata = fs::metadata(path)
        .with_context(|| format!("failed to inspect credentials file {}", path.display()))?;
    let mode = metadata.permissions().mode() & 0o777;

    if mode & 0o077 != 0 {
        return Err(anyhow::anyhow!(
            "credentials file {} must be 0600, found {:o}",
            path.display(),
            mode
        ));
    }

    Ok(())
}

#[cfg(not(unix))]
fn validate_private_permissions(_path: &Path) -> anyhow::Result<()> {
    Ok(())
}

// ---------------------------------------------------------------------------
// Anthropic auth
// ---------------------------------------------------------------------------

/// Authentication material for the Anthropic API.
#[derive(Clone)]
pub enum AnthropicAuth {
    /// Plain API key sent via the `x-api-key` header.
    ApiKey(String),
}

impl std::fmt::Debug for AnthropicAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ApiKey(_) => f.write_str("AnthropicAuth::ApiKey([REDACTED])"),
        }
    }
}

/// Resolve Anthropic authentication from loaded credentials, if configured.
pub fn resolve_anthropic_auth(credentials: &Credentials) -> Option<AnthropicAuth> {
    credentials
        .get("ANTHROPIC_API_KEY")
        .filter(|key| !key.trim().is_empty())
        .map(|key| AnthropicAuth::ApiKey(key.to_owned()))
}
