//! Collaborator seams.
//!
//! Everything outside the core (keystroke delivery, clipboard, window
//! activation, permission status) is reached through these traits. The
//! app crate supplies real implementations; tests supply recorders.

use async_trait::async_trait;
use thiserror::Error;
use voxwake_trigger::AppTrigger;

#[derive(Error, Debug)]
pub enum SinkError {
    #[error("target rejected delivery: {0}")]
    Rejected(String),

    #[error("delivery target unavailable")]
    Unavailable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionStatus {
    Granted,
    Denied,
    Undetermined,
}

impl PermissionStatus {
    pub fn is_granted(&self) -> bool {
        matches!(self, PermissionStatus::Granted)
    }
}

/// Where captured command text goes. Called only while a command capture
/// is active or being finalized.
#[async_trait]
pub trait TextDeliverySink: Send + Sync {
    async fn input_incremental(&self, delta: &str) -> Result<(), SinkError>;

    /// Overwrite the target's view with the full current text. Returns
    /// whether the target accepted it.
    async fn replace_all(&self, text: &str) -> bool;

    /// Explicit field clear; never invoked by the reset protocol unless
    /// the request asks for it.
    async fn clear_field(&self);
}

/// The system clipboard. Only `ResetRequest { clear_clipboard: true }`
/// ever reaches this.
pub trait Clipboard: Send + Sync {
    fn clear(&self);
}

#[async_trait]
pub trait AppActivator: Send + Sync {
    async fn activate(&self, app: &AppTrigger) -> bool;

    async fn bring_to_front(&self, app: &AppTrigger);
}

pub trait PermissionSource: Send + Sync {
    fn microphone(&self) -> PermissionStatus;

    fn speech_recognition(&self) -> PermissionStatus;
}
