/// Configuration loading from a portal JSON file
use crate::config::types::{Cohort, Language, PortalError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Execution service endpoint settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct JudgeServiceConfig {
    /// Base URL of the code execution service
    pub base_url: String,
    /// Upper bound on one judging round trip
    pub timeout_ms: u64,
    /// Route per language, appended to `base_url`
    pub routes: HashMap<Language, String>,
}

impl Default for JudgeServiceConfig {
    fn default() -> Self {
        let mut routes = HashMap::new();
        routes.insert(Language::Python, "/submit-python".to_string());
        routes.insert(Language::C, "/submit-c".to_string());
        Self {
            base_url: "http://127.0.0.1:8080".to_string(),
            timeout_ms: 15_000,
            routes,
        }
    }
}

impl JudgeServiceConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn route_for(&self, language: Language) -> Option<&str> {
        self.routes.get(&language).map(String::as_str)
    }
}

/// Which identity provider backs authentication
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum IdentityMode {
    /// Deterministic in-memory stand-in (any six-digit code)
    #[default]
    #[serde(rename = "memory")]
    Memory,
    /// Network-backed auth service
    #[serde(rename = "remote")]
    Remote,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentityConfig {
    pub mode: IdentityMode,
    pub base_url: String,
    pub timeout_ms: u64,
    /// Restrict sign-in to one email domain
    pub allowed_domain: Option<String>,
}

impl IdentityConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            mode: IdentityMode::Memory,
            base_url: "http://127.0.0.1:5000".to_string(),
            timeout_ms: 10_000,
            allowed_domain: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Directory holding one JSON record per participant
    pub dir: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            dir: std::env::temp_dir().join("riftgate").join("progress"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SideChallengeConfig {
    pub words: Vec<String>,
}

impl Default for SideChallengeConfig {
    fn default() -> Self {
        Self {
            words: crate::config::presets::default_word_list(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FinaleConfig {
    /// Alternate accepted final answer. `null` disables it.
    pub override_phrase: Option<String>,
    /// Guidance text shown in the finale, keyed by cohort
    pub clues: BTreeMap<Cohort, Vec<String>>,
}

impl Default for FinaleConfig {
    fn default() -> Self {
        Self {
            override_phrase: Some(crate::config::presets::DEFAULT_OVERRIDE_PHRASE.to_string()),
            clues: crate::config::presets::default_finale_clues(),
        }
    }
}

/// Full portal configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PortalConfig {
    pub judge: JudgeServiceConfig,
    pub identity: IdentityConfig,
    pub store: StoreConfig,
    /// JSON catalogue replacing the built-in puzzle sets
    pub catalog: Option<PathBuf>,
    pub side_challenge: SideChallengeConfig,
    pub finale: FinaleConfig,
    /// Audit trail location; a temp-dir default is used when absent
    pub audit_log: Option<PathBuf>,
}

impl PortalConfig {
    /// Load configuration from a JSON file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config_content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            PortalError::Config(format!(
                "Failed to read config file {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;

        Self::from_json(&config_content)
    }

    pub fn from_json(content: &str) -> Result<Self> {
        serde_json::from_str(content)
            .map_err(|e| PortalError::Config(format!("Failed to parse config JSON: {}", e)))
    }

    /// Load from `path` if given, otherwise `./riftgate.json` if present,
    /// otherwise built-in defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::load_from_file(path);
        }

        let local = std::env::current_dir()?.join("riftgate.json");
        if local.exists() {
            log::info!("Loading configuration from {}", local.display());
            return Self::load_from_file(local);
        }

        log::debug!("No configuration file found, using built-in defaults");
        Ok(Self::default())
    }
}
