use std::time::Duration;
use thiserror::Error;

/// Errors reported by the speech recognition engine and the source wrapping it.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("microphone or speech recognition permission denied")]
    PermissionDenied,

    #[error("audio device unavailable: {0}")]
    DeviceUnavailable(String),

    #[error("recognition session reached its platform ceiling")]
    RecognitionTimeout,

    #[error("fatal engine error, cannot recover: {0}")]
    Fatal(String),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("trigger {app:?} has no wake words")]
    EmptyWakeWords { app: String },

    #[error("trigger {app:?} has no execution words after defaulting")]
    EmptyExecutionWords { app: String },

    #[error("duplicate trigger id {app:?}")]
    DuplicateTrigger { app: String },

    #[error("invalid value for {field}: {reason}")]
    Validation { field: String, reason: String },
}

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("invalid state transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },

    #[error("session controller is gone")]
    ControllerGone,

    #[error("engine error: {0}")]
    Engine(#[from] EngineError),
}

#[derive(Debug, Clone)]
pub enum RecoveryStrategy {
    /// Retry the failed operation.
    Retry { max_attempts: u32, delay: Duration },
    /// Restart the recognition session transparently.
    Renew,
    /// Wait for the user; never retried automatically.
    WaitForUser,
    Fatal,
}

impl EngineError {
    pub fn recovery_strategy(&self) -> RecoveryStrategy {
        match self {
            EngineError::RecognitionTimeout => RecoveryStrategy::Renew,
            EngineError::DeviceUnavailable(_) => RecoveryStrategy::Retry {
                max_attempts: 1,
                delay: Duration::ZERO,
            },
            EngineError::PermissionDenied => RecoveryStrategy::WaitForUser,
            EngineError::Fatal(_) => RecoveryStrategy::Fatal,
        }
    }
}
