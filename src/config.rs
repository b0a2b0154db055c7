//! Adjutant Configuration
//!
//! Loads and saves the agent's configuration from `~/.adjutant/adjutant.json`.

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Config file name within the adjutant directory.
const CONFIG_FILENAME: &str = "adjutant.json";

/// Command prefixes the safety gate allows. Matching is deliberately coarse:
/// a last-resort guard against unscoped invocations, not a command parser.
pub const DEFAULT_SAFE_PREFIXES: &[&str] =
    &["echo", "type", "mkdir", "cd", "dir", "pip install", "python"];

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentConfig {
    pub api_url: String,
    pub api_key: String,
    pub model: String,
    pub max_tokens_per_turn: u32,
    pub db_path: String,
    /// Allowlist prefixes for the safety gate. Explicit configuration rather
    /// than process-wide state so the gate can be tested in isolation.
    pub safe_prefixes: Vec<String>,
    /// Upper bound on model/tool rounds within one turn.
    pub max_tool_rounds: u32,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.openai.com".to_string(),
            api_key: String::new(),
            model: "gpt-4o".to_string(),
            max_tokens_per_turn: 4096,
            db_path: "~/.adjutant/sessions.db".to_string(),
            safe_prefixes: DEFAULT_SAFE_PREFIXES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            max_tool_rounds: 10,
        }
    }
}

/// Returns the adjutant config directory: `~/.adjutant`.
pub fn get_adjutant_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("/root"))
        .join(".adjutant")
}

/// Returns the full path to the config file: `~/.adjutant/adjutant.json`.
pub fn get_config_path() -> PathBuf {
    get_adjutant_dir().join(CONFIG_FILENAME)
}

/// Load the config from disk, merging missing fields with defaults.
/// Falls back to the `OPENAI_API_KEY` environment variable if the config
/// file does not specify a key.
///
/// Returns `None` if the config file does not exist or cannot be parsed.
pub fn load_config() -> Option<AgentConfig> {
    let config_path = get_config_path();
    if !config_path.exists() {
        return None;
    }

    let contents = fs::read_to_string(&config_path).ok()?;
    let mut config: AgentConfig = serde_json::from_str(&contents).ok()?;

    let defaults = AgentConfig::default();

    if config.api_url.is_empty() {
        config.api_url = defaults.api_url;
    }
    if config.model.is_empty() {
        config.model = defaults.model;
    }
    if config.max_tokens_per_turn == 0 {
        config.max_tokens_per_turn = defaults.max_tokens_per_turn;
    }
    if config.db_path.is_empty() {
        config.db_path = defaults.db_path;
    }
    if config.safe_prefixes.is_empty() {
        config.safe_prefixes = defaults.safe_prefixes;
    }
    if config.max_tool_rounds == 0 {
        config.max_tool_rounds = defaults.max_tool_rounds;
    }

    if config.api_key.is_empty() {
        if let Ok(key) = std::env::var("OPENAI_API_KEY") {
            config.api_key = key;
        }
    }

    Some(config)
}

/// Save the config to disk at `~/.adjutant/adjutant.json`.
///
/// Creates the config directory with mode 0o700 if it does not exist.
/// The config file is written with mode 0o600 since it may contain API keys.
pub fn save_config(config: &AgentConfig) -> Result<()> {
    let dir = get_adjutant_dir();
    if !dir.exists() {
        fs::create_dir_all(&dir).context("Failed to create adjutant directory")?;
        fs::set_permissions(&dir, fs::Permissions::from_mode(0o700))?;
    }

    let config_path = get_config_path();
    let json = serde_json::to_string_pretty(config).context("Failed to serialize config")?;

    fs::write(&config_path, &json).context("Failed to write config file")?;
    fs::set_permissions(&config_path, fs::Permissions::from_mode(0o600))?;

    Ok(())
}

/// Resolve a path that may start with `~` to an absolute path.
pub fn resolve_path(p: &str) -> String {
    if let Some(rest) = p.strip_prefix('~') {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("/root"));
        let rest = rest.strip_prefix('/').unwrap_or(rest);
        home.join(rest).to_string_lossy().to_string()
    } else {
        p.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_path_with_tilde() {
        let resolved = resolve_path("~/some/path");
        assert!(!resolved.starts_with('~'));
        assert!(resolved.ends_with("some/path"));
    }

    #[test]
    fn test_resolve_path_without_tilde() {
        let path = "/absolute/path/to/file";
        assert_eq!(resolve_path(path), path);
    }

    #[test]
    fn test_default_config() {
        let config = AgentConfig::default();
        assert_eq!(config.model, "gpt-4o");
        assert_eq!(config.max_tokens_per_turn, 4096);
        assert_eq!(config.max_tool_rounds, 10);
        assert!(config.safe_prefixes.iter().any(|p| p == "pip install"));
    }
}
