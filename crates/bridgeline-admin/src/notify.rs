//! User-facing notifications
//!
//! The controllers report outcomes here instead of showing toasts
//! themselves. Each entry is also logged as it is raised.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::{error, info};

const MAX_ENTRIES: usize = 50;

/// Severity of a notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    /// Operation completed
    Success,
    /// Neutral information
    Info,
    /// Operation failed
    Error,
}

/// One raised notification
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    /// Identifier for dismissal
    pub id: u64,
    /// Severity
    pub level: Level,
    /// Message shown to the operator
    pub message: String,
    /// When it was raised
    pub raised_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct Queue {
    next_id: u64,
    entries: VecDeque<Notification>,
}

/// Shared notification queue; clones push to the same queue
#[derive(Debug, Clone, Default)]
pub struct Notifier {
    queue: Arc<Mutex<Queue>>,
}

impl Notifier {
    /// Create an empty queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Raise a notification, returning its id
    pub fn push(&self, level: Level, message: impl Into<String>) -> u64 {
        let message = message.into();
        match level {
            Level::Error => error!(%message, "Notification"),
            Level::Success | Level::Info => info!(?level, %message, "Notification"),
        }

        let mut queue = self.queue.lock();
        queue.next_id += 1;
        let id = queue.next_id;
        queue.entries.push_back(Notification {
            id,
            level,
            message,
            raised_at: Utc::now(),
        });
        while queue.entries.len() > MAX_ENTRIES {
            queue.entries.pop_front();
        }
        id
    }

    /// Raise a success notification
    pub fn success(&self, message: impl Into<String>) -> u64 {
        self.push(Level::Success, message)
    }

    /// Raise an informational notification
    pub fn info(&self, message: impl Into<String>) -> u64 {
        self.push(Level::Info, message)
    }

    /// Raise an error notification
    pub fn error(&self, message: impl Into<String>) -> u64 {
        self.push(Level::Error, message)
    }

    /// Current entries, oldest first
    pub fn entries(&self) -> Vec<Notification> {
        self.queue.lock().entries.iter().cloned().collect()
    }

    /// Most recent entry
    pub fn last(&self) -> Option<Notification> {
        self.queue.lock().entries.back().cloned()
    }

    /// Number of entries at `level`
    pub fn count(&self, level: Level) -> usize {
        self.queue
            .lock()
            .entries
            .iter()
            .filter(|entry| entry.level == level)
            .count()
    }

    /// Remove and return every entry
    pub fn drain(&self) -> Vec<Notification> {
        self.queue.lock().entries.drain(..).collect()
    }

    /// Remove one entry; returns whether it existed
    pub fn dismiss(&self, id: u64) -> bool {
        let mut queue = self.queue.lock();
        let before = queue.entries.len();
        queue.entries.retain(|entry| entry.id != id);
        queue.entries.len() != before
    }

    /// Whether there are no entries
    pub fn is_empty(&self) -> bool {
        self.queue.lock().entries.is_empty()
    }
}
