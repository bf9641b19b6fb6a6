//! Observable session state.
//!
//! Written only from the controller task; readable from any observer
//! context. UI layers poll or subscribe to these instead of holding a
//! reference into the controller.

use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};

use parking_lot::RwLock;
use voxwake_foundation::{EngineError, SessionError, SessionState, StateManager};

pub struct SharedState {
    state: StateManager,
    transcript: RwLock<String>,
    /// Smoothed audio level, stored as milli-units for atomic access
    audio_level_milli: AtomicU32,
    awaiting: AtomicBool,
    active_app: RwLock<Option<String>>,
    remaining_renewal: AtomicU64,
    last_error: RwLock<Option<EngineError>>,
}

impl SharedState {
    pub fn new(renewal_ceiling: u64) -> Self {
        Self {
            state: StateManager::new(),
            transcript: RwLock::new(String::new()),
            audio_level_milli: AtomicU32::new(0),
            awaiting: AtomicBool::new(false),
            active_app: RwLock::new(None),
            remaining_renewal: AtomicU64::new(renewal_ceiling),
            last_error: RwLock::new(None),
        }
    }

    pub fn state(&self) -> SessionState {
        self.state.current()
    }

    /// Synchronous feed of state transitions, in order.
    pub fn subscribe_states(&self) -> crossbeam_channel::Receiver<SessionState> {
        self.state.subscribe()
    }

    pub fn transcript(&self) -> String {
        self.transcript.read().clone()
    }

    pub fn audio_level(&self) -> f32 {
        self.audio_level_milli.load(Ordering::Relaxed) as f32 / 1000.0
    }

    pub fn is_awaiting_command(&self) -> bool {
        self.awaiting.load(Ordering::Relaxed)
    }

    pub fn active_app(&self) -> Option<String> {
        self.active_app.read().clone()
    }

    pub fn remaining_renewal_time(&self) -> u64 {
        self.remaining_renewal.load(Ordering::Relaxed)
    }

    pub fn last_error(&self) -> Option<EngineError> {
        self.last_error.read().clone()
    }

    pub(crate) fn transition(&self, to: SessionState) -> Result<(), SessionError> {
        self.state.transition(to.clone())?;
        self.awaiting.store(to.is_awaiting_command(), Ordering::Relaxed);
        *self.active_app.write() = to.active_app().map(str::to_owned);
        Ok(())
    }

    pub(crate) fn set_transcript(&self, text: &str) {
        let mut transcript = self.transcript.write();
        transcript.clear();
        transcript.push_str(text);
    }

    pub(crate) fn set_audio_level(&self, level: f32) {
        let milli = (level.clamp(0.0, 1.0) * 1000.0) as u32;
        self.audio_level_milli.store(milli, Ordering::Relaxed);
    }

    pub(crate) fn set_remaining_renewal(&self, remaining: u64) {
        self.remaining_renewal.store(remaining, Ordering::Relaxed);
    }

    pub(crate) fn set_error(&self, error: EngineError) {
        *self.last_error.write() = Some(error);
    }

    pub(crate) fn clear_error(&self) {
        *self.last_error.write() = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn awaiting_flag_follows_state() {
        let shared = SharedState::new(59);
        shared.transition(SessionState::Starting).unwrap();
        shared.transition(SessionState::Listening).unwrap();
        assert!(!shared.is_awaiting_command());
        shared
            .transition(SessionState::AwaitingCommand {
                app_id: "claude".into(),
            })
            .unwrap();
        assert!(shared.is_awaiting_command());
        assert_eq!(shared.active_app().as_deref(), Some("claude"));
        shared.transition(SessionState::Processing).unwrap();
        assert!(!shared.is_awaiting_command());
        assert_eq!(shared.active_app(), None);
    }

    #[test]
    fn audio_level_round_trips_through_milli_units() {
        let shared = SharedState::new(59);
        shared.set_audio_level(0.25);
        assert!((shared.audio_level() - 0.25).abs() < 0.001);
        shared.set_audio_level(7.0);
        assert_eq!(shared.audio_level(), 1.0);
    }
}
