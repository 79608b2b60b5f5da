use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::broadcast;

/// Published on the in-process bus whenever a check-in wins the conditional
/// update. Consumed by attached stats-stream subscribers.
#[derive(Debug, Clone, Serialize)]
pub struct CheckInEvent {
    pub team_id: String,
    pub team_code: String,
    pub team_name: String,
    pub participant_id: String,
    #[serde(serialize_with = "hackreg_core::serde::to_rfc3339_ms")]
    pub checked_in_at: DateTime<Utc>,
}

/// In-process pub-sub for live dashboards. Publishing never blocks and
/// never fails; with no subscribers the event is dropped.
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<CheckInEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn publish(&self, event: CheckInEvent) {
        let _ = self.tx.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CheckInEvent> {
        self.tx.subscribe()
    }
}
