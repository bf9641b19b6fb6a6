//! Manually driven engine for tests.
//!
//! The handle side lets a test push revisions, levels, and session-end
//! signals on demand, and fail upcoming starts to exercise retry paths.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use voxwake_foundation::EngineError;

use crate::engine::{EngineSink, SessionEnd, SpeechEngine};

#[derive(Default)]
struct ManualShared {
    sink: Mutex<Option<EngineSink>>,
    starts: AtomicU32,
    stops: AtomicU32,
    fail_starts: AtomicU32,
}

pub struct ManualEngine {
    shared: Arc<ManualShared>,
}

#[derive(Clone)]
pub struct ManualHandle {
    shared: Arc<ManualShared>,
}

impl ManualEngine {
    pub fn new() -> (Self, ManualHandle) {
        let shared = Arc::new(ManualShared::default());
        (
            Self {
                shared: Arc::clone(&shared),
            },
            ManualHandle { shared },
        )
    }
}

#[async_trait]
impl SpeechEngine for ManualEngine {
    async fn start(&mut self, _locale: &str, sink: EngineSink) -> Result<(), EngineError> {
        let remaining = self.shared.fail_starts.load(Ordering::Acquire);
        if remaining > 0 {
            self.shared.fail_starts.store(remaining - 1, Ordering::Release);
            return Err(EngineError::DeviceUnavailable("scripted failure".into()));
        }
        *self.shared.sink.lock() = Some(sink);
        self.shared.starts.fetch_add(1, Ordering::AcqRel);
        Ok(())
    }

    async fn stop(&mut self) {
        *self.shared.sink.lock() = None;
        self.shared.stops.fetch_add(1, Ordering::AcqRel);
    }
}

impl ManualHandle {
    fn sink(&self) -> Option<EngineSink> {
        self.shared.sink.lock().clone()
    }

    pub async fn revision(&self, text: impl Into<String>, is_final: bool) {
        if let Some(sink) = self.sink() {
            sink.revision(text, is_final).await;
        }
    }

    pub fn level(&self, value: f32) {
        if let Some(sink) = self.sink() {
            sink.level(value);
        }
    }

    pub async fn end_session(&self, end: SessionEnd) {
        if let Some(sink) = self.sink() {
            sink.ended(end).await;
        }
    }

    /// Make the next `n` calls to `start()` fail with DeviceUnavailable.
    pub fn fail_next_starts(&self, n: u32) {
        self.shared.fail_starts.store(n, Ordering::Release);
    }

    pub fn starts(&self) -> u32 {
        self.shared.starts.load(Ordering::Acquire)
    }

    pub fn stops(&self) -> u32 {
        self.shared.stops.load(Ordering::Acquire)
    }

    pub fn is_started(&self) -> bool {
        self.shared.sink.lock().is_some()
    }
}
