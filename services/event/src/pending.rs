use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, Utc};
use tracing::debug;

use crate::clock::Clock;
use crate::domain::types::{PENDING_TTL_SECS, RegistrationPayload};

struct PendingEntry {
    payload: RegistrationPayload,
    expires_at: DateTime<Utc>,
}

/// Holds validated registration payloads keyed by lowercased leader email
/// until the OTP is verified. A re-register replaces the payload.
pub struct PendingStore {
    entries: Mutex<HashMap<String, PendingEntry>>,
    clock: Arc<dyn Clock>,
}

impl PendingStore {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            clock,
        }
    }

    /// Store (or replace) the pending payload for `email`.
    pub fn put(&self, email: &str, payload: RegistrationPayload) {
        let expires_at = self.clock.now() + Duration::seconds(PENDING_TTL_SECS);
        self.entries
            .lock()
            .unwrap()
            .insert(email.to_owned(), PendingEntry { payload, expires_at });
    }

    /// Atomic read-and-remove. Between two concurrent verifications of the
    /// same email exactly one caller gets the payload.
    pub fn take(&self, email: &str) -> Option<RegistrationPayload> {
        let mut entries = self.entries.lock().unwrap();
        let entry = entries.remove(email)?;
        if self.clock.now() >= entry.expires_at {
            return None;
        }
        Some(entry.payload)
    }

    /// Drop any pending payload for `email`.
    pub fn remove(&self, email: &str) {
        self.entries.lock().unwrap().remove(email);
    }

    pub fn has_entry(&self, email: &str) -> bool {
        self.entries.lock().unwrap().contains_key(email)
    }

    /// Remove expired payloads.
    pub fn sweep(&self) {
        let now = self.clock.now();
        let mut entries = self.entries.lock().unwrap();
        let before = entries.len();
        entries.retain(|_, entry| now < entry.expires_at);
        let removed = before - entries.len();
        if removed > 0 {
            debug!(removed, "swept expired pending registrations");
        }
    }

    /// Periodic sweep on a fixed interval.
    pub fn spawn_sweeper(self: &Arc<Self>, interval: std::time::Duration) -> tokio::task::JoinHandle<()> {
        let store = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                store.sweep();
            }
        })
    }
}
