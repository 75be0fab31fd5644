//! Configuration loading and API credential resolution
//!
//! Credentials are resolved into an explicit [`CatalogAuth`] value that is
//! handed to the components that need it. Nothing in this crate keeps
//! process-global mutable configuration state.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// TOML configuration file contents (`~/.config/tunelog/config.toml`)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    /// Base URL of the music catalog API
    pub api_base_url: Option<String>,
    /// Bearer token for the catalog API
    pub api_token: Option<String>,
    /// Directory holding the streaming-history dump
    pub history_dir: Option<String>,
}

impl TomlConfig {
    /// Load configuration from a TOML file.
    ///
    /// A missing file is not an error; it yields the defaults so that
    /// environment variables or CLI arguments can still provide values.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Read TOML failed: {}", e)))?;
        toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Parse TOML failed: {}", e)))
    }
}

/// Get default configuration file path for the platform
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .map(|d| d.join("tunelog").join("config.toml"))
        .unwrap_or_else(|| PathBuf::from("tunelog.toml"))
}

/// Resolved credentials for the catalog API, passed explicitly to the client
#[derive(Debug, Clone)]
pub struct CatalogAuth {
    /// Base URL of the catalog API
    pub base_url: String,
    /// Bearer token sent in the Authorization header
    pub bearer_token: String,
}

/// Resolve the catalog API token following CLI → ENV → TOML priority.
pub fn resolve_api_token(cli_arg: Option<&str>, toml_config: &TomlConfig) -> Result<String> {
    let mut sources = Vec::new();

    let env_token = std::env::var("TUNELOG_API_TOKEN").ok();

    if cli_arg.map_or(false, is_valid_token) {
        sources.push("command line");
    }
    if env_token.as_deref().map_or(false, is_valid_token) {
        sources.push("environment");
    }
    if toml_config.api_token.as_deref().map_or(false, is_valid_token) {
        sources.push("TOML");
    }

    if sources.len() > 1 {
        warn!(
            "Catalog API token found in multiple sources: {}. Using {} (highest priority).",
            sources.join(", "),
            sources[0]
        );
    }

    if let Some(token) = cli_arg {
        if is_valid_token(token) {
            info!("Catalog API token taken from command line");
            return Ok(token.to_string());
        }
    }

    if let Some(token) = env_token {
        if is_valid_token(&token) {
            info!("Catalog API token loaded from environment variable");
            return Ok(token);
        }
    }

    if let Some(token) = toml_config.api_token.as_deref() {
        if is_valid_token(token) {
            info!("Catalog API token loaded from TOML config");
            return Ok(token.to_string());
        }
    }

    Err(Error::Config(
        "Catalog API token not configured. Provide it using one of:\n\
         1. Command line: --api-token <token>\n\
         2. Environment: TUNELOG_API_TOKEN=<token>\n\
         3. TOML config: ~/.config/tunelog/config.toml (api_token = \"<token>\")"
            .to_string(),
    ))
}

/// Validate a token (non-empty, non-whitespace)
pub fn is_valid_token(token: &str) -> bool {
    !token.trim().is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_is_valid_token() {
        assert!(is_valid_token("abc123"));
        assert!(!is_valid_token(""));
        assert!(!is_valid_token("   "));
    }

    #[test]
    fn test_load_missing_file_yields_defaults() {
        let config = TomlConfig::load(Path::new("/nonexistent/tunelog.toml")).unwrap();
        assert!(config.api_token.is_none());
        assert!(config.api_base_url.is_none());
    }

    #[test]
    fn test_load_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "api_base_url = \"https://api.example.com/v1\"").unwrap();
        writeln!(file, "api_token = \"secret\"").unwrap();

        let config = TomlConfig::load(&path).unwrap();
        assert_eq!(
            config.api_base_url.as_deref(),
            Some("https://api.example.com/v1")
        );
        assert_eq!(config.api_token.as_deref(), Some("secret"));
    }

    #[test]
    fn test_resolve_prefers_cli_over_toml() {
        let toml = TomlConfig {
            api_token: Some("from-toml".to_string()),
            ..Default::default()
        };
        let token = resolve_api_token(Some("from-cli"), &toml).unwrap();
        assert_eq!(token, "from-cli");
    }

    #[test]
    fn test_resolve_falls_back_to_toml() {
        let toml = TomlConfig {
            api_token: Some("from-toml".to_string()),
            ..Default::default()
        };
        let token = resolve_api_token(None, &toml).unwrap();
        assert_eq!(token, "from-toml");
    }
}
