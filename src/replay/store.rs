//! Interaction store: match-key to a FIFO queue of recorded exchanges

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};

use dashmap::mapref::one::RefMut;
use dashmap::DashMap;
use tracing::warn;

use crate::matcher::RecordMatcher;
use crate::recording::RecordEntry;
use crate::{RecorderError, Result};

use super::ReplayStats;

/// Recorded exchanges grouped by match-key, each group in recording order
#[derive(Debug, Default)]
pub struct Records {
    queues: DashMap<String, VecDeque<RecordEntry>>,
    served: AtomicUsize,
    misses: AtomicUsize,
}

impl Records {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry to the tail of its key's queue
    pub fn add(&self, entry: RecordEntry, matcher: &dyn RecordMatcher) {
        let key = matcher.entry_key(&entry);
        self.queues.entry(key).or_default().push_back(entry);
    }

    /// Find the queue recorded for a key
    ///
    /// # Errors
    ///
    /// Returns error if nothing was ever recorded under the key
    pub fn lookup(&self, key: &str) -> Result<RefMut<'_, String, VecDeque<RecordEntry>>> {
        self.queues
            .get_mut(key)
            .ok_or_else(|| RecorderError::KeyNotFound(key.to_string()))
    }

    /// Remove the head of a key's queue
    ///
    /// # Errors
    ///
    /// Returns error if every entry for the key has been served
    pub fn dequeue(key: &str, queue: &mut VecDeque<RecordEntry>) -> Result<RecordEntry> {
        queue
            .pop_front()
            .ok_or_else(|| RecorderError::QueueExhausted(key.to_string()))
    }

    /// Serve the next entry recorded for a key
    ///
    /// # Errors
    ///
    /// Returns error if the key is unknown or its queue is exhausted
    pub fn take(&self, key: &str) -> Result<RecordEntry> {
        let result = self
            .lookup(key)
            .and_then(|mut queue| Self::dequeue(key, &mut queue));

        match &result {
            Ok(_) => {
                self.served.fetch_add(1, Ordering::Relaxed);
            }
            Err(e) => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                warn!("Playback miss: {e}");
            }
        }

        result
    }

    /// Total number of entries not yet served
    #[must_use]
    pub fn len(&self) -> usize {
        self.queues.iter().map(|entry| entry.value().len()).sum()
    }

    /// Whether no entries remain
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of distinct keys ever recorded
    #[must_use]
    pub fn key_count(&self) -> usize {
        self.queues.len()
    }

    /// Keys that still have entries, with their remaining counts, sorted by key
    #[must_use]
    pub fn remaining(&self) -> Vec<(String, usize)> {
        let mut remaining: Vec<_> = self
            .queues
            .iter()
            .filter(|entry| !entry.value().is_empty())
            .map(|entry| (entry.key().clone(), entry.value().len()))
            .collect();
        remaining.sort();
        remaining
    }

    /// Serve/miss counters and remaining size
    #[must_use]
    pub fn stats(&self) -> ReplayStats {
        ReplayStats {
            served: self.served.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            remaining: self.len(),
        }
    }

    /// Drop every entry and reset counters
    pub fn clear(&self) {
        self.queues.clear();
        self.served.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
    }
}
