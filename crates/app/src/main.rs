use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::writer::MakeWriterExt;

use voxwake_app::config::AppConfig;
use voxwake_app::runtime::{self, EngineChoice, RuntimeOptions};
use voxwake_events::SessionEvent;

#[derive(Parser, Debug)]
#[command(
    name = "voxwake",
    about = "Hands-free voice control of external applications"
)]
struct Cli {
    /// Path to the TOML configuration
    #[arg(short, long, default_value = "voxwake.toml", env = "VOXWAKE_CONFIG")]
    config: PathBuf,

    /// Override the recognition locale from the config
    #[arg(long)]
    locale: Option<String>,

    /// Replay a transcript file instead of running a live engine.
    /// One revision per line: delay_ms|final|text
    #[arg(long)]
    script: Option<PathBuf>,
}

fn init_logging() -> Result<()> {
    std::fs::create_dir_all("logs")?;
    let file_appender = RollingFileAppender::new(Rotation::DAILY, "logs", "voxwake.log");
    let (non_blocking_file, guard) = tracing_appender::non_blocking(file_appender);
    let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::fmt()
        .with_writer(std::io::stdout.and(non_blocking_file))
        .with_env_filter(log_level)
        .init();
    std::mem::forget(guard);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging()?;
    tracing::info!("Starting VoxWake");

    let mut config = AppConfig::load(&cli.config)?;
    if let Some(locale) = cli.locale {
        config.locale = locale;
    }

    let engine = match &cli.script {
        Some(path) => EngineChoice::Scripted(runtime::parse_script(path)?),
        None => EngineChoice::Noop,
    };

    let handle = runtime::start(RuntimeOptions { config, engine })?;

    // Mirror session events into the log; a menu-bar UI would subscribe
    // the same way.
    let mut events = handle.session.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            match event {
                SessionEvent::WakeWordDetected { app_id } => {
                    tracing::info!("wake word detected for {}", app_id);
                }
                SessionEvent::CommandBufferUpdated { app_id, text } => {
                    tracing::info!("[{}] {:?}", app_id, text);
                }
                SessionEvent::CommandReady { app_id, command } => {
                    tracing::info!("command ready for {}: {:?}", app_id, command);
                }
                SessionEvent::SessionReset { reason } => {
                    tracing::debug!("session reset: {:?}", reason);
                }
                SessionEvent::StateChanged { state } => {
                    tracing::debug!("state: {}", state);
                }
                SessionEvent::EngineFault { error } => {
                    tracing::error!("engine fault: {}", error);
                }
            }
        }
    });

    handle.session.toggle_listening().await?;

    runtime::AppHandle::wait_for_shutdown_signal().await;
    handle.shutdown().await;
    Ok(())
}
