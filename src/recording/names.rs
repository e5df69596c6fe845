//! Generated asset names, queued per test

use std::collections::{BTreeMap, VecDeque};

use dashmap::DashMap;

use crate::{RecorderError, Result};

/// Test name to the asset names generated for it, in generation order
#[derive(Debug, Default)]
pub struct Names {
    queues: DashMap<String, VecDeque<String>>,
}

impl Names {
    /// Create an empty collection
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a persisted mapping, preserving per-test order
    #[must_use]
    pub fn from_map(map: BTreeMap<String, Vec<String>>) -> Self {
        let queues = DashMap::new();
        for (test_name, names) in map {
            queues.insert(test_name, names.into_iter().collect());
        }
        Self { queues }
    }

    /// Append a name to the tail of a test's queue
    pub fn enqueue(&self, test_name: &str, name: String) {
        self.queues
            .entry(test_name.to_string())
            .or_default()
            .push_back(name);
    }

    /// Remove and return the next name recorded for a test
    ///
    /// # Errors
    ///
    /// Returns error if no names remain for the test
    pub fn dequeue(&self, test_name: &str) -> Result<String> {
        self.queues
            .get_mut(test_name)
            .and_then(|mut queue| queue.pop_front())
            .ok_or_else(|| RecorderError::NamesExhausted(test_name.to_string()))
    }

    /// Whether a name is already queued for a test
    #[must_use]
    pub fn contains(&self, test_name: &str, name: &str) -> bool {
        self.queues
            .get(test_name)
            .is_some_and(|queue| queue.iter().any(|n| n == name))
    }

    /// Number of names queued for a test
    #[must_use]
    pub fn count(&self, test_name: &str) -> usize {
        self.queues.get(test_name).map_or(0, |queue| queue.len())
    }

    /// Snapshot for persistence, sorted by test name
    #[must_use]
    pub fn to_map(&self) -> BTreeMap<String, Vec<String>> {
        self.queues
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().iter().cloned().collect()))
            .collect()
    }
}
