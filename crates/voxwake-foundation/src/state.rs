use crate::error::SessionError;
use crossbeam_channel::{Receiver, Sender};
use parking_lot::RwLock;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

/// Lifecycle of one listening run. Exactly one instance exists per
/// controller; it is mutated only on the controller task.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum SessionState {
    Idle,
    Starting,
    Listening,
    AwaitingCommand { app_id: String },
    Processing,
    Stopping,
}

impl SessionState {
    pub fn is_awaiting_command(&self) -> bool {
        matches!(self, SessionState::AwaitingCommand { .. })
    }

    pub fn active_app(&self) -> Option<&str> {
        match self {
            SessionState::AwaitingCommand { app_id } => Some(app_id),
            _ => None,
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::Idle => write!(f, "Idle"),
            SessionState::Starting => write!(f, "Starting"),
            SessionState::Listening => write!(f, "Listening"),
            SessionState::AwaitingCommand { app_id } => write!(f, "AwaitingCommand({app_id})"),
            SessionState::Processing => write!(f, "Processing"),
            SessionState::Stopping => write!(f, "Stopping"),
        }
    }
}

/// Why the capture state is being cleared. Every reset source funnels
/// through the same protocol carrying one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ResetReason {
    WakeWord,
    ExecutionWord,
    EnterKey,
    Timeout,
    ManualStop,
    Error,
}

pub struct StateManager {
    state: Arc<RwLock<SessionState>>,
    state_tx: Sender<SessionState>,
    state_rx: Receiver<SessionState>,
}

impl Default for StateManager {
    fn default() -> Self {
        Self::new()
    }
}

impl StateManager {
    pub fn new() -> Self {
        let (state_tx, state_rx) = crossbeam_channel::unbounded();
        Self {
            state: Arc::new(RwLock::new(SessionState::Idle)),
            state_tx,
            state_rx,
        }
    }

    pub fn transition(&self, new_state: SessionState) -> Result<(), SessionError> {
        let mut current = self.state.write();

        // Validate state transitions
        let valid = matches!(
            (&*current, &new_state),
            (SessionState::Idle, SessionState::Starting)
                | (SessionState::Starting, SessionState::Listening)
                | (SessionState::Starting, SessionState::Stopping)
                | (SessionState::Starting, SessionState::Idle)
                | (SessionState::Listening, SessionState::AwaitingCommand { .. })
                | (SessionState::Listening, SessionState::Stopping)
                | (SessionState::AwaitingCommand { .. }, SessionState::Processing)
                | (SessionState::AwaitingCommand { .. }, SessionState::Stopping)
                | (SessionState::Processing, SessionState::Listening)
                | (SessionState::Processing, SessionState::Stopping)
                | (SessionState::Stopping, SessionState::Idle)
        );

        if !valid {
            return Err(SessionError::InvalidTransition {
                from: current.to_string(),
                to: new_state.to_string(),
            });
        }

        tracing::info!(target: "session", "State transition: {} -> {}", *current, new_state);
        *current = new_state.clone();
        let _ = self.state_tx.send(new_state);
        Ok(())
    }

    pub fn current(&self) -> SessionState {
        self.state.read().clone()
    }

    pub fn subscribe(&self) -> Receiver<SessionState> {
        self.state_rx.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn walks_the_full_listening_cycle() {
        let mgr = StateManager::new();
        mgr.transition(SessionState::Starting).unwrap();
        mgr.transition(SessionState::Listening).unwrap();
        mgr.transition(SessionState::AwaitingCommand {
            app_id: "claude".into(),
        })
        .unwrap();
        mgr.transition(SessionState::Processing).unwrap();
        mgr.transition(SessionState::Listening).unwrap();
        mgr.transition(SessionState::Stopping).unwrap();
        mgr.transition(SessionState::Idle).unwrap();
        assert_eq!(mgr.current(), SessionState::Idle);
    }

    #[test]
    fn rejects_skipping_processing() {
        let mgr = StateManager::new();
        mgr.transition(SessionState::Starting).unwrap();
        mgr.transition(SessionState::Listening).unwrap();
        mgr.transition(SessionState::AwaitingCommand {
            app_id: "claude".into(),
        })
        .unwrap();
        let err = mgr.transition(SessionState::Listening).unwrap_err();
        assert!(matches!(err, SessionError::InvalidTransition { .. }));
    }

    #[test]
    fn failed_start_returns_to_idle() {
        let mgr = StateManager::new();
        mgr.transition(SessionState::Starting).unwrap();
        mgr.transition(SessionState::Idle).unwrap();
        assert_eq!(mgr.current(), SessionState::Idle);
    }

    #[test]
    fn publishes_transitions_in_order() {
        let mgr = StateManager::new();
        let rx = mgr.subscribe();
        mgr.transition(SessionState::Starting).unwrap();
        mgr.transition(SessionState::Listening).unwrap();
        assert_eq!(rx.try_recv().unwrap(), SessionState::Starting);
        assert_eq!(rx.try_recv().unwrap(), SessionState::Listening);
    }
}
