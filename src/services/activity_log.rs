// Activity Log
// Bounded in-memory feed of recent lifecycle events, newest first

use crate::models::{ActivityEntry, ActivityKind};
use std::collections::VecDeque;
use std::sync::RwLock;

/// Number of entries the feed keeps; older entries are discarded
pub const MAX_RECENT_ENTRIES: usize = 5;

/// Append-only feed of the most recent stream lifecycle events. Entries are
/// returned newest first and the feed never grows past
/// [`MAX_RECENT_ENTRIES`]. Dropped entries are gone; this is a glanceable
/// ticker, not an audit trail.
pub struct ActivityLog {
    entries: RwLock<VecDeque<ActivityEntry>>,
}

impl ActivityLog {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(VecDeque::with_capacity(MAX_RECENT_ENTRIES)),
        }
    }

    /// Record an event, evicting the oldest entry once the feed is full
    pub fn record(&self, entry: ActivityEntry) {
        let mut entries = self.entries.write().unwrap_or_else(|e| {
            log::warn!("Activity log lock poisoned, recovering");
            e.into_inner()
        });
        entries.push_front(entry);
        entries.truncate(MAX_RECENT_ENTRIES);
    }

    /// Convenience wrapper that stamps the entry with the current time
    pub fn record_event(&self, kind: ActivityKind, title: &str, description: &str) {
        self.record(ActivityEntry::new(
            kind,
            title.to_string(),
            description.to_string(),
        ));
    }

    /// Snapshot of the feed, newest first
    pub fn recent(&self) -> Vec<ActivityEntry> {
        let entries = self.entries.read().unwrap_or_else(|e| {
            log::warn!("Activity log lock poisoned, recovering");
            e.into_inner()
        });
        entries.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for ActivityLog {
    fn default() -> Self {
        Self::new()
    }
}
