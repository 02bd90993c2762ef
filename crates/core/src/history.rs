use crate::models::{HistoryItem, Interaction};
use chrono::{DateTime, Utc};
use std::sync::{Mutex, MutexGuard};

#[derive(Debug)]
struct HistoryLog {
    items: Vec<HistoryItem>,
    next_id: u64,
}

/// In-memory interaction log for the life of the process.
///
/// Ids come from a counter that only moves forward, so an id retired by
/// [`HistoryStore::delete`] is never handed out again. The counter and the
/// items share one lock.
#[derive(Debug)]
pub struct HistoryStore {
    log: Mutex<HistoryLog>,
}

impl Default for HistoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl HistoryStore {
    pub fn new() -> Self {
        Self {
            log: Mutex::new(HistoryLog {
                items: Vec::new(),
                next_id: 1,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HistoryLog> {
        // The log is consistent between statements, so a poisoned guard is still usable.
        self.log.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Records an interaction stamped with the current time.
    pub fn append(&self, content: impl Into<String>, interaction: Interaction) -> HistoryItem {
        self.insert(content.into(), interaction, None)
    }

    pub fn append_at(
        &self,
        content: impl Into<String>,
        interaction: Interaction,
        timestamp: DateTime<Utc>,
    ) -> HistoryItem {
        self.insert(content.into(), interaction, Some(timestamp))
    }

    fn insert(
        &self,
        content: String,
        interaction: Interaction,
        timestamp: Option<DateTime<Utc>>,
    ) -> HistoryItem {
        let mut log = self.lock();
        // Stamped under the lock so id order and timestamp order agree.
        let item = HistoryItem {
            id: log.next_id,
            interaction,
            content,
            timestamp: timestamp.unwrap_or_else(Utc::now),
        };
        log.next_id += 1;
        log.items.push(item.clone());
        item
    }

    pub fn list(&self) -> Vec<HistoryItem> {
        self.lock().items.clone()
    }

    /// Removes the item with `id`; returns whether one was present.
    pub fn delete(&self, id: u64) -> bool {
        let mut log = self.lock();
        let before = log.items.len();
        log.items.retain(|item| item.id != id);
        log.items.len() != before
    }

    pub fn len(&self) -> usize {
        self.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
