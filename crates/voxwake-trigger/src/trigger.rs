//! The registered-application roster.

use serde::{Deserialize, Serialize};
use voxwake_foundation::ConfigError;

/// How captured command text reaches the target application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryMode {
    /// Only the delta beyond previously delivered text is sent.
    Incremental,
    /// The full current text is re-sent on every update.
    Replace,
}

/// One registered target application.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppTrigger {
    pub id: String,
    pub name: String,
    /// Phrases that open command capture for this application.
    pub wake_words: Vec<String>,
    /// Phrases that close command capture. Empty means "use the
    /// process-wide default set"; resolved at roster construction.
    #[serde(default)]
    pub execution_words: Vec<String>,
    pub delivery: DeliveryMode,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

/// Validated, read-only snapshot of the trigger roster. Changes to the
/// underlying configuration produce a new snapshot; an in-progress command
/// capture keeps the trigger it started with.
#[derive(Debug, Clone, Default)]
pub struct TriggerRoster {
    triggers: Vec<AppTrigger>,
}

impl TriggerRoster {
    /// Build a roster, applying the default execution-word set and
    /// rejecting triggers that are unusable after defaulting.
    pub fn new(
        triggers: Vec<AppTrigger>,
        default_execution_words: &[String],
    ) -> Result<Self, ConfigError> {
        let mut resolved = Vec::with_capacity(triggers.len());
        for mut trigger in triggers {
            if trigger.wake_words.iter().all(|w| w.trim().is_empty()) {
                return Err(ConfigError::EmptyWakeWords {
                    app: trigger.id.clone(),
                });
            }
            if trigger.execution_words.is_empty() {
                trigger.execution_words = default_execution_words.to_vec();
            }
            if trigger.execution_words.iter().all(|w| w.trim().is_empty()) {
                return Err(ConfigError::EmptyExecutionWords {
                    app: trigger.id.clone(),
                });
            }
            if resolved.iter().any(|t: &AppTrigger| t.id == trigger.id) {
                return Err(ConfigError::DuplicateTrigger {
                    app: trigger.id.clone(),
                });
            }
            resolved.push(trigger);
        }
        Ok(Self { triggers: resolved })
    }

    /// Triggers in registration order. Matching honors this order.
    pub fn triggers(&self) -> &[AppTrigger] {
        &self.triggers
    }

    pub fn get(&self, id: &str) -> Option<&AppTrigger> {
        self.triggers.iter().find(|t| t.id == id)
    }

    pub fn is_empty(&self) -> bool {
        self.triggers.is_empty()
    }
}

/// Source of roster snapshots. The controller re-reads the roster on every
/// entry to `Listening`; edits never mutate a capture in progress.
pub trait RosterProvider: Send + Sync {
    fn snapshot(&self) -> TriggerRoster;
}

/// A fixed roster; what the app crate builds from its configuration file.
pub struct StaticRoster(pub TriggerRoster);

impl RosterProvider for StaticRoster {
    fn snapshot(&self) -> TriggerRoster {
        self.0.clone()
    }
}
