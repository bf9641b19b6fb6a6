//! Typed publish/subscribe bus connecting the session core to its consumers.
//!
//! The bus is fire-and-forget: publishing never blocks and never fails, and a
//! subscriber that falls behind loses the oldest events rather than stalling
//! the controller. Events of one kind preserve emission order; no ordering is
//! guaranteed across kinds.

use tokio::sync::broadcast;
use voxwake_foundation::{EngineError, ResetReason, SessionState};

/// Everything the session core tells the outside world.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    WakeWordDetected { app_id: String },
    CommandBufferUpdated { app_id: String, text: String },
    CommandReady { app_id: String, command: String },
    SessionReset { reason: ResetReason },
    StateChanged { state: SessionState },
    EngineFault { error: EngineError },
}

#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<SessionEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Publish an event to all current subscribers. A send with no
    /// subscribers is not an error.
    pub fn publish(&self, event: SessionEvent) {
        tracing::trace!(target: "events", "publish: {:?}", event);
        let _ = self.tx.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn preserves_emission_order_per_subscriber() {
        let bus = EventBus::new(16);
        let mut rx = bus.subscribe();
        for i in 0..4 {
            bus.publish(SessionEvent::CommandBufferUpdated {
                app_id: "claude".into(),
                text: format!("t{i}"),
            });
        }
        for i in 0..4 {
            match rx.recv().await.unwrap() {
                SessionEvent::CommandBufferUpdated { text, .. } => {
                    assert_eq!(text, format!("t{i}"))
                }
                other => panic!("unexpected event {other:?}"),
            }
        }
    }

    #[tokio::test]
    async fn publish_without_subscribers_is_silent() {
        let bus = EventBus::new(4);
        bus.publish(SessionEvent::SessionReset {
            reason: ResetReason::ManualStop,
        });
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn lagging_subscriber_drops_oldest() {
        let bus = EventBus::new(2);
        let mut rx = bus.subscribe();
        for i in 0..5 {
            bus.publish(SessionEvent::CommandBufferUpdated {
                app_id: "claude".into(),
                text: format!("t{i}"),
            });
        }
        // First recv reports the lag, then the newest retained events arrive.
        match rx.recv().await {
            Err(broadcast::error::RecvError::Lagged(n)) => assert!(n >= 1),
            other => panic!("expected lag, got {other:?}"),
        }
        match rx.recv().await.unwrap() {
            SessionEvent::CommandBufferUpdated { text, .. } => assert_eq!(text, "t3"),
            other => panic!("unexpected event {other:?}"),
        }
    }
}
