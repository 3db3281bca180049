// =============================================================================
// Runtime Configuration - provider credentials and service settings
// =============================================================================
//
// Loaded once at startup from a JSON file (the same `config.json` shape the
// dashboard has always used: `{ "coinglassSecret": "..." }`), then overridden
// from the environment.  The resulting value is handed explicitly to the
// client constructor; nothing here is global.
//
// All fields carry a serde default so a config file only needs the key.
// =============================================================================

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::info;

use crate::types::Interval;

// =============================================================================
// Default-value helpers (required by serde `default = "..."` attribute)
// =============================================================================

fn default_base_url() -> String {
    "https://open-api.coinglass.com".to_string()
}

fn default_api_key_header() -> String {
    "coinglassSecret".to_string()
}

fn default_bind_addr() -> String {
    "0.0.0.0:3001".to_string()
}

fn default_limit() -> u32 {
    50
}

// =============================================================================
// ApiKey
// =============================================================================

/// Opaque provider API key.  Never printed in full.
#[derive(Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl std::fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ApiKey(<redacted>)")
    }
}

// =============================================================================
// AppConfig
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Provider API key, sent as a header on every request.
    #[serde(rename = "coinglassSecret", default)]
    pub api_key: ApiKey,

    /// Provider base address; request paths are appended verbatim.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Name of the header carrying the API key.
    #[serde(default = "default_api_key_header")]
    pub api_key_header: String,

    /// Listen address for the REST surface.
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Interval used by the dashboard when the caller does not pick one.
    #[serde(default)]
    pub default_interval: Interval,

    /// Row limit used by the dashboard when the caller does not pick one.
    #[serde(default = "default_limit")]
    pub default_limit: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: ApiKey::default(),
            base_url: default_base_url(),
            api_key_header: default_api_key_header(),
            bind_addr: default_bind_addr(),
            default_interval: Interval::default(),
            default_limit: default_limit(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a JSON file at `path`.
    ///
    /// If the file does not exist, returns an error so the caller can fall
    /// back to defaults with a warning.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config from {}", path.display()))?;

        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse config from {}", path.display()))?;

        info!(
            path = %path.display(),
            base_url = %config.base_url,
            "config loaded"
        );

        Ok(config)
    }

    /// Apply overrides from environment variables, if present.
    pub fn apply_env(&mut self) {
        self.apply_overrides(|name| std::env::var(name).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(key) = lookup("COINGLASS_API_KEY").filter(|k| !k.trim().is_empty()) {
            self.api_key = ApiKey::new(key.trim());
        }
        if let Some(url) = lookup("COINGLASS_BASE_URL").filter(|u| !u.trim().is_empty()) {
            self.base_url = url.trim().to_string();
        }
        if let Some(addr) = lookup("COIN_METRICS_BIND_ADDR").filter(|a| !a.trim().is_empty()) {
            self.bind_addr = addr.trim().to_string();
        }
    }

    /// Reject configurations that cannot make a single successful request.
    pub fn validate(&self) -> Result<()> {
        if self.api_key.is_empty() {
            anyhow::bail!("no API key configured (set coinglassSecret or COINGLASS_API_KEY)");
        }
        if self.base_url.trim().is_empty() {
            anyhow::bail!("base_url must not be empty");
        }
        if self.default_limit == 0 {
            anyhow::bail!("default_limit must be positive");
        }
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserialise_key_only_uses_defaults() {
        let cfg: AppConfig = serde_json::from_str(r#"{ "coinglassSecret": "abc123" }"#).unwrap();
        assert_eq!(cfg.api_key.expose(), "abc123");
        assert_eq!(cfg.base_url, "https://open-api.coinglass.com");
        assert_eq!(cfg.api_key_header, "coinglassSecret");
        assert_eq!(cfg.default_interval, Interval::H24);
        assert_eq!(cfg.default_limit, 50);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn empty_key_fails_validation() {
        let cfg: AppConfig = serde_json::from_str("{}").unwrap();
        assert!(cfg.api_key.is_empty());
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn debug_output_redacts_key() {
        let mut cfg = AppConfig::default();
        cfg.api_key = ApiKey::new("super-secret");
        let dbg = format!("{cfg:?}");
        assert!(!dbg.contains("super-secret"));
        assert!(dbg.contains("<redacted>"));
    }

    #[test]
    fn env_overrides_replace_file_values() {
        let mut cfg = AppConfig::default();
        cfg.apply_overrides(|name| match name {
            "COINGLASS_API_KEY" => Some(" from-env ".to_string()),
            "COINGLASS_BASE_URL" => Some("http://127.0.0.1:9000".to_string()),
            _ => None,
        });
        assert_eq!(cfg.api_key.expose(), "from-env");
        assert_eq!(cfg.base_url, "http://127.0.0.1:9000");
        assert_eq!(cfg.bind_addr, "0.0.0.0:3001");
    }

    #[test]
    fn blank_env_values_are_ignored() {
        let mut cfg = AppConfig::default();
        cfg.api_key = ApiKey::new("file-key");
        cfg.apply_overrides(|_| Some("   ".to_string()));
        assert_eq!(cfg.api_key.expose(), "file-key");
    }

    #[test]
    fn load_missing_file_errors() {
        assert!(AppConfig::load("/definitely/not/here/config.json").is_err());
    }
}
