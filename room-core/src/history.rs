//! Chat message log with backward pagination.
//!
//! The log is kept sorted by timestamp. Live messages are inserted in place
//! (after every entry with an equal or earlier timestamp, so ties keep
//! arrival order); older pages fetched from the channel history are
//! prepended. Once a history fetch comes back empty the log is marked
//! exhausted and never asks again.

use std::collections::HashSet;
use std::sync::Arc;

use roomsync_types::{Message, MessageId};

/// Default width of one backward history page: one year in milliseconds.
pub const DEFAULT_HISTORY_WINDOW_MS: u64 = 365 * 24 * 60 * 60 * 1000;

/// Time range to request from the channel history, both ends inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryWindow {
    /// Lower bound in milliseconds.
    pub from_ms: u64,
    /// Upper bound in milliseconds.
    pub to_ms: u64,
}

/// Timestamp-ordered chat log.
///
/// The message list is copy-on-write: [`shared`](Self::shared) hands out
/// the current list without copying, and the next edit copies it once.
#[derive(Debug, Clone, Default)]
pub struct MessageLog {
    messages: Arc<Vec<Message>>,
    ids: HashSet<MessageId>,
    exhausted: bool,
}

impl MessageLog {
    /// Create an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages, oldest first.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// The message list, shared with the log until its next edit.
    pub fn shared(&self) -> Arc<Vec<Message>> {
        Arc::clone(&self.messages)
    }

    /// Number of messages.
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Check if the log is empty.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Timestamp of the oldest message.
    pub fn oldest_timestamp(&self) -> Option<u64> {
        self.messages.first().map(|m| m.timestamp)
    }

    /// Whether remote history has run out.
    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// Stop requesting older pages for the rest of the session.
    pub fn mark_exhausted(&mut self) {
        self.exhausted = true;
    }

    /// Insert a live message at its timestamp position.
    ///
    /// Returns false if a message with the same id is already present.
    pub fn append(&mut self, message: Message) -> bool {
        if !self.ids.insert(message.id) {
            return false;
        }
        let at = self
            .messages
            .partition_point(|m| m.timestamp <= message.timestamp);
        Arc::make_mut(&mut self.messages).insert(at, message);
        true
    }

    /// The window ending just before the oldest known message.
    ///
    /// With an empty log the window ends just before `now_ms`. Returns `None`
    /// once the log is exhausted.
    pub fn older_window(&self, now_ms: u64, window_ms: u64) -> Option<HistoryWindow> {
        if self.exhausted {
            return None;
        }
        let oldest = self.oldest_timestamp().unwrap_or(now_ms);
        Some(HistoryWindow {
            from_ms: oldest.saturating_sub(window_ms),
            to_ms: oldest.saturating_sub(1),
        })
    }

    /// Merge a page fetched from channel history.
    ///
    /// An empty page exhausts the log. Only chat and notice entries are kept;
    /// entries already present are skipped. Returns how many were added.
    pub fn prepend_older(&mut self, fetched: Vec<Message>) -> usize {
        if fetched.is_empty() {
            self.exhausted = true;
            return 0;
        }

        let mut older: Vec<Message> = fetched
            .into_iter()
            .filter(|m| m.kind().is_displayable_history())
            .filter(|m| self.ids.insert(m.id))
            .collect();
        older.sort_by_key(|m| m.timestamp);

        let added = older.len();
        older.extend(self.messages.iter().cloned());
        self.messages = Arc::new(older);
        added
    }
}
