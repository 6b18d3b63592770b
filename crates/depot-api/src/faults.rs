//! # Fault History
//!
//! A bounded ring of the most recent unhandled failures, owned by the
//! controller and reported by `/-/status`. Oldest entries are dropped first.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;

/// One unhandled failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FaultRecord {
    pub at: DateTime<Utc>,
    pub method: String,
    pub path: String,
    pub message: String,
}

/// Recent faults, newest last.
#[derive(Debug)]
pub struct FaultLog {
    capacity: usize,
    entries: Mutex<VecDeque<FaultRecord>>,
}

impl FaultLog {
    /// A log holding at most `capacity` records. A capacity of zero keeps nothing.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: Mutex::new(VecDeque::with_capacity(capacity)),
        }
    }

    pub fn record(&self, method: &str, path: &str, message: impl Into<String>) {
        if self.capacity == 0 {
            return;
        }
        let record = FaultRecord {
            at: Utc::now(),
            method: method.to_string(),
            path: path.to_string(),
            message: message.into(),
        };
        let mut entries = self.entries.lock();
        while entries.len() >= self.capacity {
            entries.pop_front();
        }
        entries.push_back(record);
    }

    /// The most recent fault.
    pub fn latest(&self) -> Option<FaultRecord> {
        self.entries.lock().back().cloned()
    }

    /// All retained faults, oldest first.
    pub fn recent(&self) -> Vec<FaultRecord> {
        self.entries.lock().iter().cloned().collect()
    }
}
