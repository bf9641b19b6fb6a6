//! The seam between the source and a platform recognition backend.

use async_trait::async_trait;
use tokio::sync::mpsc;
use voxwake_foundation::EngineError;

/// Why a recognition session ended on the engine's side.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEnd {
    /// The platform's per-session ceiling was reached. Expected; absorbed
    /// by a transparent restart, never surfaced to the user.
    RecognitionTimeout,
    /// `stop()` was called.
    Stopped,
    /// The engine died mid-session.
    Error(EngineError),
}

#[derive(Debug)]
pub(crate) struct TaggedEvent {
    pub(crate) generation: u64,
    pub(crate) event: EngineEvent,
}

#[derive(Debug)]
pub(crate) enum EngineEvent {
    Revision { text: String, is_final: bool },
    Level(f32),
    Ended(SessionEnd),
}

/// Handed to the engine on `start()`; the only way engine callbacks reach
/// the rest of the system. Events carry the generation of the session they
/// belong to, so output from a stopped session is discarded instead of
/// repopulating cleared state.
#[derive(Clone)]
pub struct EngineSink {
    tx: mpsc::Sender<TaggedEvent>,
    generation: u64,
}

impl EngineSink {
    pub(crate) fn new(tx: mpsc::Sender<TaggedEvent>, generation: u64) -> Self {
        Self { tx, generation }
    }

    pub async fn revision(&self, text: impl Into<String>, is_final: bool) {
        let _ = self
            .tx
            .send(TaggedEvent {
                generation: self.generation,
                event: EngineEvent::Revision {
                    text: text.into(),
                    is_final,
                },
            })
            .await;
    }

    /// Raw level sample, 0.0–1.0. Dropped rather than queued when the
    /// pipeline is saturated.
    pub fn level(&self, value: f32) {
        let _ = self.tx.try_send(TaggedEvent {
            generation: self.generation,
            event: EngineEvent::Level(value),
        });
    }

    pub async fn ended(&self, end: SessionEnd) {
        let _ = self
            .tx
            .send(TaggedEvent {
                generation: self.generation,
                event: EngineEvent::Ended(end),
            })
            .await;
    }
}

/// A continuous speech recognition backend.
///
/// Implementations push revisions and level samples into the sink from
/// their own context; they must never block `start()` on recognition work.
/// `stop()` is required to be idempotent and to tear down any callback
/// context the engine spawned.
#[async_trait]
pub trait SpeechEngine: Send {
    async fn start(&mut self, locale: &str, sink: EngineSink) -> Result<(), EngineError>;

    async fn stop(&mut self);

    async fn switch_language(&mut self, locale: &str, sink: EngineSink) -> Result<(), EngineError> {
        self.stop().await;
        self.start(locale, sink).await
    }
}
