//! Scripted engine: replays a programmed revision sequence on a schedule.
//!
//! Drives the demo binary and end-to-end tests without any platform
//! recognizer. Each start replays the script from the beginning, the way a
//! real engine re-recognizes from silence after a restart.

use std::time::Duration;

use async_trait::async_trait;
use tokio::task::JoinHandle;

use voxwake_foundation::EngineError;

use crate::engine::{EngineSink, SessionEnd, SpeechEngine};

#[derive(Debug, Clone)]
pub struct ScriptStep {
    /// Delay before this revision is emitted
    pub delay: Duration,
    pub text: String,
    pub is_final: bool,
}

impl ScriptStep {
    pub fn new(delay_ms: u64, text: impl Into<String>, is_final: bool) -> Self {
        Self {
            delay: Duration::from_millis(delay_ms),
            text: text.into(),
            is_final,
        }
    }
}

pub struct ScriptedEngine {
    steps: Vec<ScriptStep>,
    /// Emit a RecognitionTimeout end signal this long after the script
    /// finishes, simulating the platform session ceiling.
    session_limit: Option<Duration>,
    task: Option<JoinHandle<()>>,
}

impl ScriptedEngine {
    pub fn new(steps: Vec<ScriptStep>) -> Self {
        Self {
            steps,
            session_limit: None,
            task: None,
        }
    }

    pub fn with_session_limit(mut self, limit: Duration) -> Self {
        self.session_limit = Some(limit);
        self
    }

    /// Build a script that types out `text` word by word, one revision per
    /// word, with the last revision marked final.
    pub fn speaking(text: &str, word_delay_ms: u64) -> Self {
        let words: Vec<&str> = text.split_whitespace().collect();
        let mut steps = Vec::with_capacity(words.len());
        let mut spoken = String::new();
        for (i, word) in words.iter().enumerate() {
            if !spoken.is_empty() {
                spoken.push(' ');
            }
            spoken.push_str(word);
            steps.push(ScriptStep::new(
                word_delay_ms,
                spoken.clone(),
                i + 1 == words.len(),
            ));
        }
        Self::new(steps)
    }
}

#[async_trait]
impl SpeechEngine for ScriptedEngine {
    async fn start(&mut self, _locale: &str, sink: EngineSink) -> Result<(), EngineError> {
        if let Some(task) = self.task.take() {
            task.abort();
        }
        let steps = self.steps.clone();
        let session_limit = self.session_limit;
        self.task = Some(tokio::spawn(async move {
            for step in &steps {
                let jitter = Duration::from_millis(fastrand::u64(0..20));
                tokio::time::sleep(step.delay + jitter).await;
                sink.level(0.2 + 0.6 * fastrand::f32());
                sink.revision(step.text.clone(), step.is_final).await;
            }
            if let Some(limit) = session_limit {
                tokio::time::sleep(limit).await;
                sink.ended(SessionEnd::RecognitionTimeout).await;
            }
        }));
        Ok(())
    }

    async fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl Drop for ScriptedEngine {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn speaking_builds_cumulative_revisions() {
        let engine = ScriptedEngine::speaking("claude write haiku", 10);
        let texts: Vec<&str> = engine.steps.iter().map(|s| s.text.as_str()).collect();
        assert_eq!(texts, vec!["claude", "claude write", "claude write haiku"]);
        assert!(engine.steps.last().unwrap().is_final);
        assert!(!engine.steps[0].is_final);
    }
}
