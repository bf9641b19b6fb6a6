//! Full pipeline against the scripted engine.

use std::time::Duration;

use voxwake_app::config::AppConfig;
use voxwake_app::runtime::{start, EngineChoice, RuntimeOptions};
use voxwake_events::SessionEvent;
use voxwake_stt::engines::ScriptStep;
use voxwake_trigger::{AppTrigger, DeliveryMode};

fn demo_config() -> AppConfig {
    AppConfig {
        triggers: vec![AppTrigger {
            id: "claude".into(),
            name: "Claude".into(),
            wake_words: vec!["Claude".into(), "클로드".into()],
            execution_words: vec!["Execute".into(), "Go".into()],
            delivery: DeliveryMode::Replace,
            enabled: true,
        }],
        ..AppConfig::default()
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn scripted_transcript_produces_a_command() {
    let steps = vec![
        ScriptStep::new(10, "클로드", false),
        ScriptStep::new(10, "클로드 write a haiku", false),
        ScriptStep::new(10, "클로드 write a haiku Execute", true),
    ];
    let handle = start(RuntimeOptions {
        config: demo_config(),
        engine: EngineChoice::Scripted(steps),
    })
    .unwrap();

    let mut events = handle.session.subscribe();
    handle.session.toggle_listening().await.unwrap();

    let command = tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            if let SessionEvent::CommandReady { app_id, command } = events.recv().await.unwrap() {
                break (app_id, command);
            }
        }
    })
    .await
    .expect("no command arrived");

    assert_eq!(command.0, "claude");
    assert_eq!(command.1, "write a haiku");

    handle.shutdown().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn runtime_refuses_an_empty_roster() {
    let config = AppConfig::default();
    assert!(start(RuntimeOptions {
        config,
        engine: EngineChoice::Noop,
    })
    .is_err());
}
