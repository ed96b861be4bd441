//! Debounced push of committed edits to the persistence collaborator.
//!
//! The bridge never owns a timer thread. It records a deadline and the host
//! loop polls it, so a burst of commits collapses into the last one.

use std::time::{Duration, Instant};

use serde::Serialize;

pub const DEFAULT_SYNC_DEBOUNCE: Duration = Duration::from_millis(120);

/// Payload sent to the store after the debounce window closes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EditCommit {
    pub data_url: String,
    pub width: u32,
    pub height: u32,
    pub selected_index: usize,
}

pub trait Clock {
    fn now(&self) -> Instant;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct PendingPush {
    commit: EditCommit,
    deadline: Instant,
}

/// Single-flight scheduled push. Scheduling again replaces the pending
/// payload and restarts the window.
#[derive(Debug, Clone)]
pub struct SyncBridge {
    delay: Duration,
    pending: Option<PendingPush>,
}

impl Default for SyncBridge {
    fn default() -> Self {
        Self::new(DEFAULT_SYNC_DEBOUNCE)
    }
}

impl SyncBridge {
    pub const fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    pub const fn delay(&self) -> Duration {
        self.delay
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|pending| pending.deadline)
    }

    pub fn schedule(&mut self, commit: EditCommit, now: Instant) {
        let deadline = now + self.delay;
        if let Some(replaced) = self.pending.as_ref() {
            tracing::debug!(
                replaced_index = replaced.commit.selected_index,
                index = commit.selected_index,
                "pending sync restarted"
            );
        }
        self.pending = Some(PendingPush { commit, deadline });
    }

    /// Hands back the payload once its deadline has passed.
    pub fn poll(&mut self, now: Instant) -> Option<EditCommit> {
        let due = self
            .pending
            .as_ref()
            .is_some_and(|pending| now >= pending.deadline);
        if !due {
            return None;
        }
        self.pending.take().map(|pending| pending.commit)
    }

    /// Hands back the payload immediately, whatever its deadline.
    pub fn flush(&mut self) -> Option<EditCommit> {
        self.pending.take().map(|pending| pending.commit)
    }
}
