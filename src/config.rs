//! State-home resolution and the engine configuration file.
//!
//! All persistent state (registry, audit log, config) lives under a single
//! state home: `$AGENTGUARD_HOME` when set, otherwise `~/.agentguard`.
//! Configuration is a small JSON document; a missing file means defaults.

use std::path::{Path, PathBuf};

use crate::arbiter::ProtectionLevel;
use crate::error::ConfigError;

/// Environment variable overriding the state home.
pub const HOME_ENV: &str = "AGENTGUARD_HOME";

/// Resolves the state-home directory.
pub fn state_home() -> PathBuf {
    if let Ok(home) = std::env::var(HOME_ENV) {
        if !home.is_empty() {
            return PathBuf::from(home);
        }
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".agentguard")
}

/// Path of the registry document inside a state home.
pub fn registry_path(home: &Path) -> PathBuf {
    home.join("registry.json")
}

/// Path of the audit log inside a state home.
pub fn audit_log_path(home: &Path) -> PathBuf {
    home.join("audit.jsonl")
}

/// Path of the config file inside a state home.
pub fn config_path(home: &Path) -> PathBuf {
    home.join("config.json")
}

/// The engine configuration document.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct GuardConfig {
    /// Enforcement posture applied by the arbiter.
    pub level: ProtectionLevel,
    /// When `true`, plugin scans may attest scanned skills into the registry.
    /// Defaults to scan-only.
    pub auto_register: bool,
}

impl Default for GuardConfig {
    fn default() -> Self {
        GuardConfig {
            level: ProtectionLevel::Balanced,
            auto_register: false,
        }
    }
}

impl GuardConfig {
    /// Loads `config.json` from the state home, or defaults when the file is
    /// absent.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the file exists but cannot be read or
    /// parsed — a malformed config should be fixed, not silently ignored.
    pub fn load(home: &Path) -> Result<GuardConfig, ConfigError> {
        let path = config_path(home);
        if !path.exists() {
            return Ok(GuardConfig::default());
        }
        let content = std::fs::read_to_string(&path).map_err(|source| ConfigError::Io {
            path: path.clone(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| ConfigError::Parse { path, source })
    }
}
