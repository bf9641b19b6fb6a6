//! The reset protocol.
//!
//! Every reset source funnels through one `ResetRequest`. Buffer resets
//! are frequent and cheap; clipboard/field mutation is rare and must be
//! explicit, so both side effects are first-class fields rather than
//! implicit behavior of any reason.

use voxwake_foundation::ResetReason;

#[derive(Debug, Clone, PartialEq)]
pub struct ResetRequest {
    pub reason: ResetReason,
    pub clear_clipboard: bool,
    pub clear_ui_field: bool,
}

impl ResetRequest {
    /// A plain reset: clears capture state, touches nothing else.
    pub fn new(reason: ResetReason) -> Self {
        Self {
            reason,
            clear_clipboard: false,
            clear_ui_field: false,
        }
    }

    pub fn wake_word() -> Self {
        Self::new(ResetReason::WakeWord)
    }

    pub fn execution_word() -> Self {
        Self::new(ResetReason::ExecutionWord)
    }

    pub fn enter_key() -> Self {
        Self::new(ResetReason::EnterKey)
    }

    pub fn timeout() -> Self {
        Self::new(ResetReason::Timeout)
    }

    pub fn manual_stop() -> Self {
        Self::new(ResetReason::ManualStop)
    }

    pub fn error() -> Self {
        Self::new(ResetReason::Error)
    }

    pub fn with_clear_clipboard(mut self) -> Self {
        self.clear_clipboard = true;
        self
    }

    pub fn with_clear_ui_field(mut self) -> Self {
        self.clear_ui_field = true;
        self
    }

    /// Whether this reset ends the listening run instead of returning the
    /// machine to `Listening`.
    pub fn ends_run(&self) -> bool {
        matches!(self.reason, ResetReason::ManualStop | ResetReason::Error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_reset_touches_nothing() {
        for req in [
            ResetRequest::wake_word(),
            ResetRequest::execution_word(),
            ResetRequest::enter_key(),
            ResetRequest::timeout(),
            ResetRequest::manual_stop(),
            ResetRequest::error(),
        ] {
            assert!(!req.clear_clipboard, "{:?} must not clear clipboard", req.reason);
            assert!(!req.clear_ui_field, "{:?} must not clear UI field", req.reason);
        }
    }

    #[test]
    fn side_effects_are_opt_in() {
        let req = ResetRequest::manual_stop()
            .with_clear_clipboard()
            .with_clear_ui_field();
        assert!(req.clear_clipboard);
        assert!(req.clear_ui_field);
    }

    #[test]
    fn only_stop_and_error_end_the_run() {
        assert!(ResetRequest::manual_stop().ends_run());
        assert!(ResetRequest::error().ends_run());
        assert!(!ResetRequest::wake_word().ends_run());
        assert!(!ResetRequest::timeout().ends_run());
    }
}
