//! The session controller task.
//!
//! Single consumer of everything the transcription source produces and of
//! every UI-driven command. All session state lives here and is mutated
//! nowhere else; observers read the published `SharedState` snapshots or
//! subscribe to the event bus.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use voxwake_command::{BufferEvent, CommandBuffer};
use voxwake_events::{EventBus, SessionEvent};
use voxwake_foundation::{EngineError, RecoveryStrategy, ResetReason, SessionError, SessionState};
use voxwake_stt::{SessionEnd, SourceChannels, TranscriptRevision, TranscriptionSource};
use voxwake_trigger::{DeliveryMode, RosterProvider, WakeMatch, WakeWordMatcher};

use crate::metrics::SessionMetrics;
use crate::ports::{AppActivator, Clipboard, PermissionSource, TextDeliverySink};
use crate::renewal::RenewalTimer;
use crate::reset::ResetRequest;
use crate::shared::SharedState;

/// Fallback deadline used when no idle timeout is armed.
const IDLE_PARKED: Duration = Duration::from_secs(3600);

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub locale: String,
    /// Silence window that closes an in-flight command capture.
    pub idle_timeout: Duration,
    /// Seconds until the recognition session must be renewed. An upper
    /// bound validated against the target backend, not a constant.
    pub renewal_ceiling: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            locale: "en-US".to_string(),
            idle_timeout: Duration::from_secs(6),
            renewal_ceiling: 59,
        }
    }
}

/// External collaborators, injected at construction.
pub struct Collaborators {
    pub roster: Arc<dyn RosterProvider>,
    pub sink: Arc<dyn TextDeliverySink>,
    pub clipboard: Arc<dyn Clipboard>,
    pub activator: Arc<dyn AppActivator>,
    pub permissions: Arc<dyn PermissionSource>,
}

enum ControlMsg {
    Toggle,
    Refresh,
    Reset(ResetRequest),
    EnterKey,
    SetLanguage(String),
    Shutdown,
}

/// Non-blocking control surface over the controller task. Operations
/// enqueue work and return; completion is observed through the shared
/// state and the event bus.
#[derive(Clone)]
pub struct SessionHandle {
    control_tx: mpsc::Sender<ControlMsg>,
    shared: Arc<SharedState>,
    bus: EventBus,
    metrics: SessionMetrics,
}

impl SessionHandle {
    async fn send(&self, msg: ControlMsg) -> Result<(), SessionError> {
        self.control_tx
            .send(msg)
            .await
            .map_err(|_| SessionError::ControllerGone)
    }

    /// Start listening if idle; otherwise perform a full stop.
    pub async fn toggle_listening(&self) -> Result<(), SessionError> {
        self.send(ControlMsg::Toggle).await
    }

    /// Stop listening regardless of current state. Idempotent.
    pub async fn stop_listening(&self) -> Result<(), SessionError> {
        self.send(ControlMsg::Reset(ResetRequest::manual_stop())).await
    }

    /// Force an immediate session renewal; transparent to any command
    /// capture in flight.
    pub async fn refresh_listening(&self) -> Result<(), SessionError> {
        self.send(ControlMsg::Refresh).await
    }

    /// The single entry point for every reset source.
    pub async fn process_reset(&self, request: ResetRequest) -> Result<(), SessionError> {
        self.send(ControlMsg::Reset(request)).await
    }

    /// Enter-key observers report through here; while a command is being
    /// captured this finalizes it like an execution word.
    pub async fn notify_enter_key(&self) -> Result<(), SessionError> {
        self.send(ControlMsg::EnterKey).await
    }

    pub async fn set_language(&self, locale: impl Into<String>) -> Result<(), SessionError> {
        self.send(ControlMsg::SetLanguage(locale.into())).await
    }

    /// Ask the controller task to stop. The task finishes its current
    /// message first.
    pub async fn shutdown(&self) -> Result<(), SessionError> {
        self.send(ControlMsg::Shutdown).await
    }

    pub fn shared(&self) -> Arc<SharedState> {
        Arc::clone(&self.shared)
    }

    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<SessionEvent> {
        self.bus.subscribe()
    }

    pub fn metrics(&self) -> SessionMetrics {
        self.metrics.clone()
    }
}

pub struct SessionController {
    config: SessionConfig,
    source: TranscriptionSource,
    channels: SourceChannels,
    collab: Collaborators,
    bus: EventBus,
    shared: Arc<SharedState>,
    metrics: SessionMetrics,
    control_rx: mpsc::Receiver<ControlMsg>,
    matcher: WakeWordMatcher,
    buffer: Option<CommandBuffer>,
    renewal: RenewalTimer,
    idle_deadline: Option<tokio::time::Instant>,
}

impl SessionController {
    pub fn new(
        source: TranscriptionSource,
        channels: SourceChannels,
        collab: Collaborators,
        config: SessionConfig,
        bus: EventBus,
    ) -> (Self, SessionHandle) {
        let (control_tx, control_rx) = mpsc::channel(32);
        let shared = Arc::new(SharedState::new(config.renewal_ceiling));
        let metrics = SessionMetrics::new();
        let handle = SessionHandle {
            control_tx,
            shared: Arc::clone(&shared),
            bus: bus.clone(),
            metrics: metrics.clone(),
        };
        let controller = Self {
            renewal: RenewalTimer::new(config.renewal_ceiling),
            config,
            source,
            channels,
            collab,
            bus,
            shared,
            metrics,
            control_rx,
            matcher: WakeWordMatcher::default(),
            buffer: None,
            idle_deadline: None,
        };
        (controller, handle)
    }

    /// Run until shutdown. Every mutation of session state happens inside
    /// this loop.
    pub async fn run(mut self) {
        info!(target: "session", "session controller running");
        let mut ticker = tokio::time::interval_at(
            tokio::time::Instant::now() + Duration::from_secs(1),
            Duration::from_secs(1),
        );
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            let idle_at = self
                .idle_deadline
                .unwrap_or_else(|| tokio::time::Instant::now() + IDLE_PARKED);
            tokio::select! {
                maybe = self.control_rx.recv() => match maybe {
                    Some(msg) => {
                        if self.handle_control(msg).await {
                            break;
                        }
                    }
                    None => {
                        self.process_reset(ResetRequest::manual_stop()).await;
                        break;
                    }
                },
                Some(revision) = self.channels.revisions.recv() => {
                    self.handle_revision(revision).await;
                }
                Some(level) = self.channels.levels.recv() => {
                    self.shared.set_audio_level(level);
                }
                Some(end) = self.channels.notices.recv() => {
                    self.handle_session_end(end).await;
                }
                _ = ticker.tick() => {
                    self.handle_tick().await;
                }
                _ = tokio::time::sleep_until(idle_at), if self.idle_deadline.is_some() => {
                    self.handle_idle_timeout().await;
                }
            }
        }
        info!(target: "session", "session controller stopped");
    }

    fn state(&self) -> SessionState {
        self.shared.state()
    }

    fn transition(&self, to: SessionState) {
        match self.shared.transition(to.clone()) {
            Ok(()) => self.bus.publish(SessionEvent::StateChanged { state: to }),
            // A rejected transition is a controller bug; log it loudly and
            // keep serving rather than wedging the whole pipeline.
            Err(e) => error!(target: "session", "{}", e),
        }
    }

    /// Returns true when the loop should exit.
    async fn handle_control(&mut self, msg: ControlMsg) -> bool {
        match msg {
            ControlMsg::Toggle => {
                if self.state() == SessionState::Idle {
                    self.start_listening().await;
                } else {
                    self.process_reset(ResetRequest::manual_stop()).await;
                }
            }
            ControlMsg::Refresh => {
                if self.state() != SessionState::Idle {
                    self.renew().await;
                }
            }
            ControlMsg::Reset(request) => self.process_reset(request).await,
            ControlMsg::EnterKey => self.handle_enter_key().await,
            ControlMsg::SetLanguage(locale) => self.set_language(locale).await,
            ControlMsg::Shutdown => {
                if self.state() != SessionState::Idle {
                    self.process_reset(ResetRequest::manual_stop()).await;
                }
                return true;
            }
        }
        false
    }

    async fn start_listening(&mut self) {
        if !self.collab.permissions.microphone().is_granted()
            || !self.collab.permissions.speech_recognition().is_granted()
        {
            warn!(target: "session", "cannot start listening, permissions not granted");
            let error = EngineError::PermissionDenied;
            self.shared.set_error(error.clone());
            self.bus.publish(SessionEvent::EngineFault { error });
            return;
        }

        self.transition(SessionState::Starting);
        match self.source.start(&self.config.locale).await {
            Ok(()) => {
                self.matcher = WakeWordMatcher::new(self.collab.roster.snapshot());
                self.renewal.reset();
                self.shared.set_remaining_renewal(self.renewal.remaining());
                self.shared.clear_error();
                self.transition(SessionState::Listening);
            }
            Err(error) => {
                error!(target: "session", "engine start failed: {}", error);
                self.shared.set_error(error.clone());
                self.bus.publish(SessionEvent::EngineFault { error });
                self.transition(SessionState::Idle);
            }
        }
    }

    async fn handle_revision(&mut self, revision: TranscriptRevision) {
        self.shared.set_transcript(&revision.text);
        match self.state() {
            SessionState::Listening => {
                if let Some(m) = self.matcher.scan(&revision.text) {
                    self.begin_capture(m, &revision).await;
                }
            }
            SessionState::AwaitingCommand { .. } => {
                self.feed_buffer(&revision).await;
            }
            _ => {}
        }
    }

    async fn begin_capture(&mut self, m: WakeMatch, revision: &TranscriptRevision) {
        let trigger = m.trigger;
        info!(
            target: "session",
            "wake word {:?} detected for {}",
            m.phrase,
            trigger.id
        );
        self.metrics.inc_wake_matches();
        self.bus.publish(SessionEvent::WakeWordDetected {
            app_id: trigger.id.clone(),
        });
        // Wake-word reset: old transcript must not retrigger or leak into
        // the command.
        self.process_reset(ResetRequest::wake_word()).await;

        if !self.collab.activator.activate(&trigger).await {
            warn!(target: "session", "could not activate {}", trigger.id);
        }
        self.collab.activator.bring_to_front(&trigger).await;

        self.transition(SessionState::AwaitingCommand {
            app_id: trigger.id.clone(),
        });
        self.buffer = Some(CommandBuffer::new(trigger, m.phrase));
        self.arm_idle_timeout();
        // The revision that carried the wake word may already hold command
        // text, or the whole command including the execution word.
        self.feed_buffer(revision).await;
    }

    async fn feed_buffer(&mut self, revision: &TranscriptRevision) {
        let Some(buffer) = self.buffer.as_mut() else {
            return;
        };
        let event = buffer.on_revision(&revision.text);
        let trigger = buffer.trigger().clone();
        self.arm_idle_timeout();

        match event {
            Some(BufferEvent::Updated { text }) => {
                self.bus.publish(SessionEvent::CommandBufferUpdated {
                    app_id: trigger.id.clone(),
                    text: text.clone(),
                });
                match trigger.delivery {
                    DeliveryMode::Incremental => {
                        if let Err(e) = self.collab.sink.input_incremental(&text).await {
                            warn!(target: "session", "incremental delivery failed: {}", e);
                            self.metrics.inc_delivery_errors();
                        }
                    }
                    DeliveryMode::Replace => {
                        if !self.collab.sink.replace_all(&text).await {
                            warn!(target: "session", "replace delivery rejected");
                            self.metrics.inc_delivery_errors();
                        }
                    }
                }
            }
            Some(BufferEvent::Finalized { command }) => {
                self.buffer = None;
                self.finish_command(trigger.id, command, ResetReason::ExecutionWord)
                    .await;
                return;
            }
            None => {}
        }

        // An engine-final segment ends this utterance; later revisions
        // restart from empty text and must append, not overwrite.
        if revision.is_final {
            if let Some(buffer) = self.buffer.as_mut() {
                buffer.commit_segment();
            }
        }
    }

    async fn finish_command(&mut self, app_id: String, command: String, reason: ResetReason) {
        self.transition(SessionState::Processing);
        info!(
            target: "session",
            "command ready for {} ({:?}): {:?}",
            app_id,
            reason,
            command
        );
        self.metrics.inc_commands_ready();
        self.bus.publish(SessionEvent::CommandReady {
            app_id,
            command,
        });
        self.process_reset(ResetRequest::new(reason)).await;
    }

    /// The single reset path. Clears exactly the capture state, honors the
    /// clipboard/field flags independently, and decides where the machine
    /// lands.
    async fn process_reset(&mut self, request: ResetRequest) {
        if self.state() == SessionState::Idle {
            debug!(target: "session", "reset ignored while idle ({:?})", request.reason);
            return;
        }
        debug!(target: "session", "processing reset: {:?}", request.reason);

        // An in-flight capture finalizes with whatever it accumulated.
        if let Some(buffer) = self.buffer.take() {
            let partial = buffer.take_partial();
            let app_id = buffer.trigger().id.clone();
            self.transition(SessionState::Processing);
            self.metrics.inc_commands_ready();
            self.bus.publish(SessionEvent::CommandReady {
                app_id,
                command: partial,
            });
        }
        self.idle_deadline = None;

        if request.clear_ui_field {
            self.collab.sink.clear_field().await;
        }
        if request.clear_clipboard {
            self.collab.clipboard.clear();
        }

        self.source.clear_transcript();
        self.shared.set_transcript("");
        self.metrics.inc_resets();
        self.bus.publish(SessionEvent::SessionReset {
            reason: request.reason,
        });

        if request.ends_run() {
            self.transition(SessionState::Stopping);
            self.source.stop().await;
            self.renewal.reset();
            self.shared.set_remaining_renewal(self.renewal.remaining());
            self.transition(SessionState::Idle);
        } else {
            if self.state() == SessionState::Processing {
                self.transition(SessionState::Listening);
            }
            // Roster edits take effect here, never mid-capture.
            self.matcher = WakeWordMatcher::new(self.collab.roster.snapshot());
        }
    }

    async fn handle_enter_key(&mut self) {
        match self.state() {
            SessionState::AwaitingCommand { .. } => {
                if let Some(buffer) = self.buffer.take() {
                    let partial = buffer.take_partial();
                    let app_id = buffer.trigger().id.clone();
                    self.finish_command(app_id, partial, ResetReason::EnterKey).await;
                }
            }
            SessionState::Listening => {
                self.process_reset(ResetRequest::enter_key()).await;
            }
            _ => {}
        }
    }

    async fn handle_idle_timeout(&mut self) {
        self.idle_deadline = None;
        if let Some(buffer) = self.buffer.take() {
            let partial = buffer.take_partial();
            let app_id = buffer.trigger().id.clone();
            info!(target: "session", "command capture timed out for {}", app_id);
            self.finish_command(app_id, partial, ResetReason::Timeout).await;
        }
    }

    async fn handle_session_end(&mut self, end: SessionEnd) {
        match end {
            SessionEnd::RecognitionTimeout => {
                debug!(target: "session", "recognition ceiling reached, renewing");
                self.renew().await;
            }
            SessionEnd::Stopped => {}
            SessionEnd::Error(error) => self.handle_engine_error(error).await,
        }
    }

    async fn handle_tick(&mut self) {
        if self.state() == SessionState::Idle {
            return;
        }
        let expired = self.renewal.tick();
        self.shared.set_remaining_renewal(self.renewal.remaining());
        if expired {
            self.renew().await;
        }
    }

    /// Transparent stop+start of the recognition session. Preserves any
    /// command capture: the buffer commits its segment first, so
    /// post-renewal revisions append instead of clobbering.
    async fn renew(&mut self) {
        if self.state() == SessionState::Idle {
            return;
        }
        self.metrics.inc_renewals();
        if let Some(buffer) = self.buffer.as_mut() {
            buffer.commit_segment();
        }
        match self.source.restart().await {
            Ok(()) => {
                self.renewal.reset();
                self.shared.set_remaining_renewal(self.renewal.remaining());
            }
            Err(first) => {
                warn!(target: "session", "renewal failed, retrying once: {}", first);
                self.metrics.inc_renewal_failures();
                match self.source.restart().await {
                    Ok(()) => {
                        self.renewal.reset();
                        self.shared.set_remaining_renewal(self.renewal.remaining());
                    }
                    Err(second) => {
                        self.metrics.inc_renewal_failures();
                        error!(target: "session", "renewal failed twice: {}", second);
                        self.fatal(EngineError::Fatal(format!(
                            "session renewal failed twice: {second}"
                        )))
                        .await;
                    }
                }
            }
        }
    }

    async fn handle_engine_error(&mut self, error: EngineError) {
        match error.recovery_strategy() {
            // Expected, self-healing; never reaches the user.
            RecoveryStrategy::Renew => {
                debug!(target: "session", "absorbed engine error: {}", error);
                self.renew().await;
            }
            RecoveryStrategy::Retry { .. } => {
                warn!(target: "session", "transient engine error, retrying: {}", error);
                if self.source.restart().await.is_err() {
                    self.fatal(error).await;
                }
            }
            RecoveryStrategy::WaitForUser | RecoveryStrategy::Fatal => {
                self.fatal(error).await;
            }
        }
    }

    async fn fatal(&mut self, error: EngineError) {
        error!(target: "session", "fatal: {}", error);
        self.shared.set_error(error.clone());
        self.bus.publish(SessionEvent::EngineFault { error });
        self.process_reset(ResetRequest::error()).await;
    }

    async fn set_language(&mut self, locale: String) {
        self.config.locale = locale.clone();
        if self.state() == SessionState::Idle {
            return;
        }
        // The engine restarts from empty text; keep what was captured.
        if let Some(buffer) = self.buffer.as_mut() {
            buffer.commit_segment();
        }
        if let Err(error) = self.source.switch_language(&locale).await {
            error!(target: "session", "language switch failed: {}", error);
            self.handle_engine_error(error).await;
        }
    }

    fn arm_idle_timeout(&mut self) {
        if self.state().is_awaiting_command() || self.buffer.is_some() {
            self.idle_deadline = Some(tokio::time::Instant::now() + self.config.idle_timeout);
        }
    }
}
