//! Builds and owns the running pipeline.

use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use tokio::signal;
use tokio::task::JoinHandle;
use tracing::{error, info};

use voxwake_events::EventBus;
use voxwake_session::{
    Collaborators, SessionController, SessionHandle, TextDeliverySink,
};
use voxwake_stt::engines::{NoopEngine, ScriptStep, ScriptedEngine};
use voxwake_stt::{SourceConfig, SpeechEngine, TranscriptionSource};
use voxwake_trigger::StaticRoster;

use crate::config::AppConfig;
use crate::ports::{LoggingActivator, LoggingClipboard, LoggingSink, StaticPermissions};

/// Which recognition backend to wire in.
pub enum EngineChoice {
    /// Starts cleanly, produces nothing. Placeholder until a platform
    /// backend is plugged in.
    Noop,
    /// Replays a transcript on a schedule; the demo mode.
    Scripted(Vec<ScriptStep>),
}

pub struct RuntimeOptions {
    pub config: AppConfig,
    pub engine: EngineChoice,
}

/// Handle to the running pipeline
pub struct AppHandle {
    pub session: SessionHandle,
    pub bus: EventBus,
    controller_handle: JoinHandle<()>,
}

impl AppHandle {
    /// Gracefully stop the pipeline and wait for the controller to finish.
    pub async fn shutdown(self) {
        info!("Shutting down VoxWake runtime...");
        if self.session.shutdown().await.is_err() {
            // Controller already gone; nothing left to stop.
            self.controller_handle.abort();
        }
        let _ = self.controller_handle.await;
        info!("VoxWake runtime shutdown complete");
    }

    /// Wait for shutdown signal (SIGINT)
    pub async fn wait_for_shutdown_signal() {
        info!("Waiting for shutdown signal (Ctrl+C)...");
        match signal::ctrl_c().await {
            Ok(()) => {
                info!("Received SIGINT (Ctrl+C), initiating graceful shutdown");
            }
            Err(err) => {
                error!("Failed to listen for SIGINT: {}", err);
            }
        }
    }
}

pub fn start(options: RuntimeOptions) -> Result<AppHandle> {
    options.config.validate()?;
    let roster = options.config.roster()?;
    if roster.is_empty() {
        bail!("no triggers configured; nothing to listen for");
    }

    let engine: Box<dyn SpeechEngine> = match options.engine {
        EngineChoice::Noop => Box::new(NoopEngine::new()),
        EngineChoice::Scripted(steps) => Box::new(ScriptedEngine::new(steps)),
    };
    let (source, channels) = TranscriptionSource::new(engine, SourceConfig::default());

    let collaborators = Collaborators {
        roster: Arc::new(StaticRoster(roster)),
        sink: Arc::new(LoggingSink) as Arc<dyn TextDeliverySink>,
        clipboard: Arc::new(LoggingClipboard),
        activator: Arc::new(LoggingActivator),
        permissions: Arc::new(StaticPermissions::granted()),
    };

    let bus = EventBus::default();
    let (controller, session) = SessionController::new(
        source,
        channels,
        collaborators,
        options.config.session_config(),
        bus.clone(),
    );
    let controller_handle = tokio::spawn(controller.run());
    info!("Session controller task started.");

    Ok(AppHandle {
        session,
        bus,
        controller_handle,
    })
}

/// Parse a demo transcript file: one revision per line,
/// `delay_ms|final|text`, `#` for comments.
pub fn parse_script(path: &Path) -> Result<Vec<ScriptStep>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading script {}", path.display()))?;
    let mut steps = Vec::new();
    for (lineno, line) in raw.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let mut parts = line.splitn(3, '|');
        let (delay, is_final, text) = match (parts.next(), parts.next(), parts.next()) {
            (Some(d), Some(f), Some(t)) => (d, f, t),
            _ => bail!("script line {}: expected delay_ms|final|text", lineno + 1),
        };
        let delay_ms: u64 = delay
            .trim()
            .parse()
            .with_context(|| format!("script line {}: bad delay {:?}", lineno + 1, delay))?;
        let is_final: bool = is_final
            .trim()
            .parse()
            .with_context(|| format!("script line {}: bad final flag {:?}", lineno + 1, is_final))?;
        steps.push(ScriptStep::new(delay_ms, text.trim(), is_final));
    }
    if steps.is_empty() {
        bail!("script {} contains no revisions", path.display());
    }
    Ok(steps)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn parses_a_script_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "# demo").unwrap();
        writeln!(file, "100|false|claude write").unwrap();
        writeln!(file, "200|true|claude write a haiku execute").unwrap();
        let steps = parse_script(file.path()).unwrap();
        assert_eq!(steps.len(), 2);
        assert_eq!(steps[0].text, "claude write");
        assert!(!steps[0].is_final);
        assert!(steps[1].is_final);
    }

    #[test]
    fn rejects_malformed_script_lines() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "not a revision").unwrap();
        assert!(parse_script(file.path()).is_err());
    }

    #[test]
    fn rejects_empty_scripts() {
        let file = tempfile::NamedTempFile::new().unwrap();
        assert!(parse_script(file.path()).is_err());
    }
}
