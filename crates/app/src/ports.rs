//! Default collaborator implementations.
//!
//! Platform backends (keystroke synthesis, AppleScript/automation bridges,
//! real permission prompts) plug in behind the same traits; these defaults
//! log what they would do so the pipeline runs anywhere.

use async_trait::async_trait;
use tracing::{info, warn};

use voxwake_session::{
    AppActivator, Clipboard, PermissionSource, PermissionStatus, SinkError, TextDeliverySink,
};
use voxwake_trigger::AppTrigger;

/// Writes deliveries to the log instead of a target application.
#[derive(Debug, Default)]
pub struct LoggingSink;

#[async_trait]
impl TextDeliverySink for LoggingSink {
    async fn input_incremental(&self, delta: &str) -> Result<(), SinkError> {
        info!(target: "delivery", "type: {:?}", delta);
        Ok(())
    }

    async fn replace_all(&self, text: &str) -> bool {
        info!(target: "delivery", "replace: {:?}", text);
        true
    }

    async fn clear_field(&self) {
        info!(target: "delivery", "clear field");
    }
}

#[derive(Debug, Default)]
pub struct LoggingClipboard;

impl Clipboard for LoggingClipboard {
    fn clear(&self) {
        // Loud on purpose. Reaching this without an explicit user action
        // is a protocol violation worth noticing in the logs.
        warn!(target: "delivery", "clipboard cleared");
    }
}

#[derive(Debug, Default)]
pub struct LoggingActivator;

#[async_trait]
impl AppActivator for LoggingActivator {
    async fn activate(&self, app: &AppTrigger) -> bool {
        info!(target: "delivery", "activate {}", app.name);
        true
    }

    async fn bring_to_front(&self, app: &AppTrigger) {
        info!(target: "delivery", "bring {} to front", app.name);
    }
}

/// Fixed permission answers; a real build queries the platform.
#[derive(Debug, Clone, Copy)]
pub struct StaticPermissions {
    pub microphone: PermissionStatus,
    pub speech_recognition: PermissionStatus,
}

impl StaticPermissions {
    pub fn granted() -> Self {
        Self {
            microphone: PermissionStatus::Granted,
            speech_recognition: PermissionStatus::Granted,
        }
    }

    pub fn denied() -> Self {
        Self {
            microphone: PermissionStatus::Denied,
            speech_recognition: PermissionStatus::Denied,
        }
    }
}

impl PermissionSource for StaticPermissions {
    fn microphone(&self) -> PermissionStatus {
        self.microphone
    }

    fn speech_recognition(&self) -> PermissionStatus {
        self.speech_recognition
    }
}
