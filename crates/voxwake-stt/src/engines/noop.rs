//! No-operation engine for wiring the pipeline without a recognizer

use async_trait::async_trait;

use voxwake_foundation::EngineError;

use crate::engine::{EngineSink, SpeechEngine};

/// An engine that starts successfully and never produces a revision.
#[derive(Debug, Clone, Default)]
pub struct NoopEngine {
    started: bool,
}

impl NoopEngine {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SpeechEngine for NoopEngine {
    async fn start(&mut self, _locale: &str, _sink: EngineSink) -> Result<(), EngineError> {
        self.started = true;
        Ok(())
    }

    async fn stop(&mut self) {
        self.started = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{SourceConfig, TranscriptionSource};

    #[tokio::test]
    async fn starts_and_stops_cleanly() {
        let (mut source, _channels) =
            TranscriptionSource::new(Box::new(NoopEngine::new()), SourceConfig::default());
        source.start("en-US").await.unwrap();
        assert!(source.is_running());
        source.stop().await;
        assert!(!source.is_running());
    }
}
