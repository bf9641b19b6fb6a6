//! The restartable transcription source.
//!
//! Wraps one `SpeechEngine` into a non-terminating stream of revisions and
//! smoothed audio levels. The pump task is the marshaling point between the
//! engine's callback context and the controller: nothing downstream ever
//! reads engine state directly.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use parking_lot::{Mutex, RwLock};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use voxwake_foundation::EngineError;

use crate::engine::{EngineEvent, EngineSink, SessionEnd, SpeechEngine, TaggedEvent};
use crate::types::{SourceConfig, TranscriptRevision};

/// Receiving ends of the source's output. Taken once by the controller.
pub struct SourceChannels {
    pub revisions: mpsc::Receiver<TranscriptRevision>,
    pub levels: mpsc::Receiver<f32>,
    pub notices: mpsc::Receiver<SessionEnd>,
}

struct LevelSmoother {
    alpha: f32,
    value: f32,
}

impl LevelSmoother {
    fn new(alpha: f32) -> Self {
        Self {
            alpha: alpha.clamp(0.0, 1.0),
            value: 0.0,
        }
    }

    fn sample(&mut self, raw: f32) -> f32 {
        let raw = raw.clamp(0.0, 1.0);
        self.value = self.alpha * raw + (1.0 - self.alpha) * self.value;
        self.value
    }

    fn reset(&mut self) {
        self.value = 0.0;
    }
}

pub struct TranscriptionSource {
    engine: Arc<tokio::sync::Mutex<Box<dyn SpeechEngine>>>,
    engine_tx: mpsc::Sender<TaggedEvent>,
    generation: Arc<AtomicU64>,
    retained: Arc<RwLock<String>>,
    smoother: Arc<Mutex<LevelSmoother>>,
    pump: JoinHandle<()>,
    running: bool,
    locale: String,
}

impl TranscriptionSource {
    pub fn new(engine: Box<dyn SpeechEngine>, config: SourceConfig) -> (Self, SourceChannels) {
        let (engine_tx, engine_rx) = mpsc::channel::<TaggedEvent>(256);
        let (revision_tx, revision_rx) = mpsc::channel(config.revision_capacity);
        let (level_tx, level_rx) = mpsc::channel(config.level_capacity);
        let (notice_tx, notice_rx) = mpsc::channel(8);

        let generation = Arc::new(AtomicU64::new(0));
        let retained = Arc::new(RwLock::new(String::new()));
        let smoother = Arc::new(Mutex::new(LevelSmoother::new(config.level_smoothing)));

        let pump = tokio::spawn(pump_loop(
            engine_rx,
            revision_tx,
            level_tx,
            notice_tx,
            Arc::clone(&generation),
            Arc::clone(&retained),
            Arc::clone(&smoother),
        ));

        let source = Self {
            engine: Arc::new(tokio::sync::Mutex::new(engine)),
            engine_tx,
            generation,
            retained,
            smoother,
            pump,
            running: false,
            locale: String::new(),
        };

        (
            source,
            SourceChannels {
                revisions: revision_rx,
                levels: level_rx,
                notices: notice_rx,
            },
        )
    }

    fn make_sink(&self) -> EngineSink {
        EngineSink::new(self.engine_tx.clone(), self.generation.load(Ordering::Acquire))
    }

    /// Synchronously invalidate in-flight engine output and drop all
    /// retained transcript/level state. Everything after this call starts
    /// from an empty baseline.
    fn reset_baseline(&self) {
        self.generation.fetch_add(1, Ordering::AcqRel);
        self.retained.write().clear();
        self.smoother.lock().reset();
    }

    pub async fn start(&mut self, locale: &str) -> Result<(), EngineError> {
        if self.running {
            debug!(target: "stt", "start ignored, source already running");
            return Ok(());
        }
        let sink = self.make_sink();
        self.engine.lock().await.start(locale, sink).await?;
        self.running = true;
        self.locale = locale.to_string();
        info!(target: "stt", "transcription source started (locale: {})", locale);
        Ok(())
    }

    /// Stop the engine and clear all retained state. Idempotent; safe to
    /// call from any state, including a start that has not finished.
    pub async fn stop(&mut self) {
        self.reset_baseline();
        self.engine.lock().await.stop().await;
        if self.running {
            info!(target: "stt", "transcription source stopped");
        }
        self.running = false;
    }

    /// Tear down and reopen the engine session without touching consumer
    /// state. Used for renewal; the caller preserves whatever command
    /// capture is in flight.
    pub async fn restart(&mut self) -> Result<(), EngineError> {
        let locale = self.locale.clone();
        self.reset_baseline();
        let sink = self.make_sink();
        let mut engine = self.engine.lock().await;
        engine.stop().await;
        let result = engine.start(&locale, sink).await;
        drop(engine);
        match &result {
            Ok(()) => debug!(target: "stt", "recognition session renewed"),
            Err(e) => warn!(target: "stt", "recognition session restart failed: {}", e),
        }
        self.running = result.is_ok();
        result
    }

    pub async fn switch_language(&mut self, locale: &str) -> Result<(), EngineError> {
        self.reset_baseline();
        let sink = self.make_sink();
        self.engine
            .lock()
            .await
            .switch_language(locale, sink)
            .await?;
        self.locale = locale.to_string();
        info!(target: "stt", "switched recognition language to {}", locale);
        Ok(())
    }

    /// Drop the retained transcript so old text cannot trigger another
    /// wake-word match. Part of the reset protocol.
    pub fn clear_transcript(&self) {
        self.retained.write().clear();
    }

    pub fn transcript(&self) -> String {
        self.retained.read().clone()
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn locale(&self) -> &str {
        &self.locale
    }
}

impl Drop for TranscriptionSource {
    fn drop(&mut self) {
        self.pump.abort();
    }
}

async fn pump_loop(
    mut engine_rx: mpsc::Receiver<TaggedEvent>,
    revision_tx: mpsc::Sender<TranscriptRevision>,
    level_tx: mpsc::Sender<f32>,
    notice_tx: mpsc::Sender<SessionEnd>,
    generation: Arc<AtomicU64>,
    retained: Arc<RwLock<String>>,
    smoother: Arc<Mutex<LevelSmoother>>,
) {
    while let Some(tagged) = engine_rx.recv().await {
        // Output from a session that has since been stopped or renewed.
        if tagged.generation != generation.load(Ordering::Acquire) {
            debug!(target: "stt", "dropping stale engine event");
            continue;
        }
        match tagged.event {
            EngineEvent::Revision { text, is_final } => {
                *retained.write() = text.clone();
                let revision = TranscriptRevision {
                    text,
                    is_final,
                    timestamp: Instant::now(),
                };
                if revision_tx.send(revision).await.is_err() {
                    break;
                }
            }
            EngineEvent::Level(raw) => {
                let smoothed = smoother.lock().sample(raw);
                let _ = level_tx.try_send(smoothed);
            }
            EngineEvent::Ended(end) => {
                if notice_tx.send(end).await.is_err() {
                    break;
                }
            }
        }
    }
    debug!(target: "stt", "source pump exiting");
}
