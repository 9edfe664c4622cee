//! Bounded device event log.
//!
//! Every mailbox transition and key update leaves a human-readable entry
//! here so the operator UI can show what the relay has been doing. Entries
//! are kept newest first; once the ring is full the oldest entry is dropped.

use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Number of entries retained by the relay log.
pub const LOG_CAPACITY: usize = 100;

/// A single log entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    /// When the entry was appended (RFC 3339, UTC).
    pub timestamp: DateTime<Utc>,

    /// Human-readable message.
    pub message: String,
}

/// Fixed-capacity, most-recent-first event log.
#[derive(Debug)]
pub struct LogRing {
    capacity: usize,
    entries: Mutex<VecDeque<LogEntry>>,
}

impl LogRing {
    /// Create a ring holding at most `capacity` entries.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: Mutex::new(VecDeque::with_capacity(capacity)),
        }
    }

    /// Prepend a timestamped entry, evicting the oldest one when full.
    ///
    /// The message is also emitted on the `device` tracing target.
    pub fn append(&self, message: impl Into<String>) {
        let message = message.into();
        tracing::info!(target: "device", "{}", message);

        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.push_front(LogEntry {
            timestamp: Utc::now(),
            message,
        });
        entries.truncate(self.capacity);
    }

    /// All retained entries, newest first.
    pub fn snapshot(&self) -> Vec<LogEntry> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for LogRing {
    fn default() -> Self {
        Self::new(LOG_CAPACITY)
    }
}
