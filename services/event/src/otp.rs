use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, Utc};
use subtle::ConstantTimeEq;
use tracing::debug;

use crate::clock::Clock;
use crate::domain::types::{
    MAX_OTP_ISSUES_PER_WINDOW, MAX_VERIFY_ATTEMPTS_PER_WINDOW, OTP_ISSUE_WINDOW_SECS,
    OTP_TTL_SECS, VERIFY_ATTEMPT_WINDOW_SECS,
};
use crate::mint;

/// Outcome of an OTP issue request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OtpIssue {
    Issued { code: String, expires_in_secs: u64 },
    RateLimited { retry_after_secs: u64 },
}

/// Outcome of an OTP verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OtpVerify {
    Verified,
    Invalid { attempts_left: u32 },
    Expired,
    RateLimited { retry_after_secs: u64 },
}

struct OtpEntry {
    code: String,
    expires_at: DateTime<Utc>,
}

/// Sliding-window timestamps per email. Issue and verify windows are
/// independent: the first throttles the mailer, the second brute force.
#[derive(Default)]
struct RateWindows {
    issues: VecDeque<DateTime<Utc>>,
    attempts: VecDeque<DateTime<Utc>>,
}

#[derive(Default)]
struct Inner {
    entries: HashMap<String, OtpEntry>,
    windows: HashMap<String, RateWindows>,
}

/// In-memory single-use OTP store. All mutations for one email are
/// serialised by the store mutex; sufficient at event scale.
pub struct OtpStore {
    inner: Mutex<Inner>,
    clock: Arc<dyn Clock>,
}

impl OtpStore {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            clock,
        }
    }

    /// Mint and store a fresh code for `email`, replacing any live one.
    pub fn issue(&self, email: &str) -> OtpIssue {
        let now = self.clock.now();
        let mut inner = self.inner.lock().unwrap();
        let Inner { entries, windows } = &mut *inner;

        let window = windows.entry(email.to_owned()).or_default();
        prune(&mut window.issues, now, Duration::seconds(OTP_ISSUE_WINDOW_SECS));
        if window.issues.len() >= MAX_OTP_ISSUES_PER_WINDOW {
            return OtpIssue::RateLimited {
                retry_after_secs: retry_after_secs(
                    &window.issues,
                    now,
                    Duration::seconds(OTP_ISSUE_WINDOW_SECS),
                ),
            };
        }
        window.issues.push_back(now);
        // A fresh code opens a fresh verify budget.
        window.attempts.clear();

        let code = mint::otp_code();
        entries.insert(
            email.to_owned(),
            OtpEntry {
                code: code.clone(),
                expires_at: now + Duration::seconds(OTP_TTL_SECS),
            },
        );
        OtpIssue::Issued {
            code,
            expires_in_secs: OTP_TTL_SECS as u64,
        }
    }

    /// Check `submitted` against the live code for `email`. A match consumes
    /// the entry; mismatches burn one attempt from the verify window.
    pub fn verify(&self, email: &str, submitted: &str) -> OtpVerify {
        let now = self.clock.now();
        let mut inner = self.inner.lock().unwrap();
        let Inner { entries, windows } = &mut *inner;

        let live = match entries.get(email) {
            Some(entry) if now < entry.expires_at => true,
            _ => false,
        };
        if !live {
            entries.remove(email);
            return OtpVerify::Expired;
        }

        let window = windows.entry(email.to_owned()).or_default();
        prune(
            &mut window.attempts,
            now,
            Duration::seconds(VERIFY_ATTEMPT_WINDOW_SECS),
        );
        // Refuse before comparing so a throttled caller learns nothing
        // about whether the code matches.
        if window.attempts.len() >= MAX_VERIFY_ATTEMPTS_PER_WINDOW {
            return OtpVerify::RateLimited {
                retry_after_secs: retry_after_secs(
                    &window.attempts,
                    now,
                    Duration::seconds(VERIFY_ATTEMPT_WINDOW_SECS),
                ),
            };
        }

        let entry = entries.get(email).expect("liveness checked above");
        if constant_time_eq(&entry.code, submitted) {
            entries.remove(email);
            windows.remove(email);
            OtpVerify::Verified
        } else {
            window.attempts.push_back(now);
            OtpVerify::Invalid {
                attempts_left: (MAX_VERIFY_ATTEMPTS_PER_WINDOW - window.attempts.len()) as u32,
            }
        }
    }

    /// Drop any state for `email`.
    pub fn remove(&self, email: &str) {
        let mut inner = self.inner.lock().unwrap();
        inner.entries.remove(email);
        inner.windows.remove(email);
    }

    /// Whether a live (possibly expired but unswept) entry exists.
    pub fn has_entry(&self, email: &str) -> bool {
        self.inner.lock().unwrap().entries.contains_key(email)
    }

    /// Remove expired entries and stale windows.
    pub fn sweep(&self) {
        let now = self.clock.now();
        let mut inner = self.inner.lock().unwrap();
        let before = inner.entries.len();
        inner.entries.retain(|_, entry| now < entry.expires_at);
        inner.windows.retain(|_, window| {
            prune(&mut window.issues, now, Duration::seconds(OTP_ISSUE_WINDOW_SECS));
            prune(
                &mut window.attempts,
                now,
                Duration::seconds(VERIFY_ATTEMPT_WINDOW_SECS),
            );
            !window.issues.is_empty() || !window.attempts.is_empty()
        });
        let removed = before - inner.entries.len();
        if removed > 0 {
            debug!(removed, "swept expired OTP entries");
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

fn constant_time_eq(a: &str, b: &str) -> bool {
    a.as_bytes().ct_eq(b.as_bytes()).into()
}

fn prune(events: &mut VecDeque<DateTime<Utc>>, now: DateTime<Utc>, window: Duration) {
    while let Some(first) = events.front() {
        if *first + window <= now {
            events.pop_front();
        } else {
            break;
        }
    }
}

fn retry_after_secs(
    events: &VecDeque<DateTime<Utc>>,
    now: DateTime<Utc>,
    window: Duration,
) -> u64 {
    events
        .front()
        .map(|first| (*first + window - now).num_seconds().max(1) as u64)
        .unwrap_or(1)
}
