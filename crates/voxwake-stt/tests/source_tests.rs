//! Transcription source behavior against a manually driven engine.

use std::time::Duration;

use voxwake_stt::engines::{ManualEngine, ManualHandle};
use voxwake_stt::{SessionEnd, SourceChannels, SourceConfig, TranscriptionSource};

fn new_source() -> (TranscriptionSource, SourceChannels, ManualHandle) {
    let (engine, handle) = ManualEngine::new();
    let (source, channels) = TranscriptionSource::new(Box::new(engine), SourceConfig::default());
    (source, channels, handle)
}

async fn recv_text(channels: &mut SourceChannels) -> String {
    tokio::time::timeout(Duration::from_secs(2), channels.revisions.recv())
        .await
        .expect("timed out waiting for revision")
        .expect("revision channel closed")
        .text
}

#[tokio::test]
async fn forwards_revisions_and_retains_latest() {
    let (mut source, mut channels, handle) = new_source();
    source.start("en-US").await.unwrap();

    handle.revision("hello", false).await;
    handle.revision("hello world", false).await;

    assert_eq!(recv_text(&mut channels).await, "hello");
    assert_eq!(recv_text(&mut channels).await, "hello world");
    assert_eq!(source.transcript(), "hello world");
}

#[tokio::test]
async fn stop_clears_retained_state_mid_utterance() {
    let (mut source, mut channels, handle) = new_source();
    source.start("en-US").await.unwrap();

    handle.revision("half an utter", false).await;
    assert_eq!(recv_text(&mut channels).await, "half an utter");

    source.stop().await;
    assert_eq!(source.transcript(), "");
    assert!(!source.is_running());
}

#[tokio::test]
async fn stop_is_idempotent() {
    let (mut source, _channels, handle) = new_source();
    source.start("en-US").await.unwrap();
    source.stop().await;
    source.stop().await;
    assert!(!source.is_running());
    assert_eq!(handle.starts(), 1);
}

#[tokio::test]
async fn stale_events_after_stop_are_discarded() {
    let (mut source, mut channels, handle) = new_source();
    source.start("en-US").await.unwrap();

    assert!(handle.is_started());
    source.stop().await;

    // The manual engine clears its sink on stop, so restart and verify the
    // fresh session is the only one whose events flow.
    source.start("en-US").await.unwrap();
    handle.revision("fresh", false).await;
    assert_eq!(recv_text(&mut channels).await, "fresh");
    assert_eq!(source.transcript(), "fresh");
}

#[tokio::test]
async fn restart_starts_from_empty_baseline() {
    let (mut source, mut channels, handle) = new_source();
    source.start("en-US").await.unwrap();

    handle.revision("before renewal", false).await;
    assert_eq!(recv_text(&mut channels).await, "before renewal");

    source.restart().await.unwrap();
    assert_eq!(source.transcript(), "");
    assert_eq!(handle.starts(), 2);

    handle.revision("after", false).await;
    assert_eq!(recv_text(&mut channels).await, "after");
}

#[tokio::test]
async fn session_end_notices_are_forwarded() {
    let (mut source, mut channels, handle) = new_source();
    source.start("en-US").await.unwrap();

    handle.end_session(SessionEnd::RecognitionTimeout).await;
    let notice = tokio::time::timeout(Duration::from_secs(2), channels.notices.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(notice, SessionEnd::RecognitionTimeout);
}

#[tokio::test]
async fn start_failure_propagates() {
    let (mut source, _channels, handle) = new_source();
    handle.fail_next_starts(1);
    let err = source.start("en-US").await.unwrap_err();
    assert!(matches!(
        err,
        voxwake_foundation::EngineError::DeviceUnavailable(_)
    ));
    assert!(!source.is_running());
}

#[tokio::test]
async fn levels_are_smoothed_into_unit_range() {
    let (mut source, mut channels, handle) = new_source();
    source.start("en-US").await.unwrap();

    for _ in 0..8 {
        handle.level(1.0);
    }
    // Force the pump to drain levels before we read.
    handle.revision("sync", false).await;
    let _ = recv_text(&mut channels).await;

    let mut last = None;
    while let Ok(v) = channels.levels.try_recv() {
        assert!((0.0..=1.0).contains(&v));
        last = Some(v);
    }
    let last = last.expect("no level samples arrived");
    assert!(last > 0.5, "smoothed level should approach the raw input");
}
