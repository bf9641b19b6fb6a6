//! TOML configuration for the VoxWake binary.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;
use voxwake_foundation::ConfigError;
use voxwake_session::SessionConfig;
use voxwake_trigger::{AppTrigger, TriggerRoster};

fn default_locale() -> String {
    "en-US".to_string()
}

fn default_idle_timeout_secs() -> u64 {
    6
}

fn default_renewal_ceiling_secs() -> u64 {
    59
}

fn default_execution_words() -> Vec<String> {
    vec!["execute".to_string(), "go".to_string()]
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    #[serde(default = "default_locale")]
    pub locale: String,

    /// Silence window (seconds) that closes an in-flight command capture.
    #[serde(default = "default_idle_timeout_secs")]
    pub idle_timeout_secs: u64,

    /// Upper bound (seconds) on one continuous recognition session.
    /// Validate against the target backend; platforms differ.
    #[serde(default = "default_renewal_ceiling_secs")]
    pub renewal_ceiling_secs: u64,

    /// Execution words applied to triggers that configure none.
    #[serde(default = "default_execution_words")]
    pub default_execution_words: Vec<String>,

    #[serde(default)]
    pub triggers: Vec<AppTrigger>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            locale: default_locale(),
            idle_timeout_secs: default_idle_timeout_secs(),
            renewal_ceiling_secs: default_renewal_ceiling_secs(),
            default_execution_words: default_execution_words(),
            triggers: Vec::new(),
        }
    }
}

impl AppConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config: AppConfig =
            toml::from_str(&raw).with_context(|| format!("parsing config {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.renewal_ceiling_secs < 5 {
            return Err(ConfigError::Validation {
                field: "renewal_ceiling_secs".to_string(),
                reason: "must be at least 5".to_string(),
            });
        }
        if self.idle_timeout_secs == 0 {
            return Err(ConfigError::Validation {
                field: "idle_timeout_secs".to_string(),
                reason: "must be non-zero".to_string(),
            });
        }
        // Surface roster problems at load time, not at first wake word.
        self.roster().map(|_| ())
    }

    pub fn roster(&self) -> Result<TriggerRoster, ConfigError> {
        TriggerRoster::new(self.triggers.clone(), &self.default_execution_words)
    }

    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            locale: self.locale.clone(),
            idle_timeout: Duration::from_secs(self.idle_timeout_secs),
            renewal_ceiling: self.renewal_ceiling_secs,
        }
    }
}
