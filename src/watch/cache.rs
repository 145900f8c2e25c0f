// src/watch/cache.rs

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::trace;

/// Default number of remembered filter decisions.
pub const DEFAULT_CAPACITY: usize = 4096;

/// In-memory memo of filter decisions, keyed by the path as the watcher
/// reported it.
///
/// Editors tend to touch the same handful of files over and over, so most
/// lookups hit. When the cache fills up it is cleared wholesale rather than
/// tracking recency.
#[derive(Debug)]
pub struct DecisionCache {
    decisions: HashMap<PathBuf, bool>,
    capacity: usize,
}

impl Default for DecisionCache {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl DecisionCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            decisions: HashMap::new(),
            capacity: capacity.max(1),
        }
    }

    pub fn get(&self, path: &Path) -> Option<bool> {
        self.decisions.get(path).copied()
    }

    pub fn insert(&mut self, path: PathBuf, accepted: bool) {
        if self.decisions.len() >= self.capacity && !self.decisions.contains_key(&path) {
            trace!(capacity = self.capacity, "filter decision cache full; clearing");
            self.decisions.clear();
        }
        self.decisions.insert(path, accepted);
    }

    pub fn len(&self) -> usize {
        self.decisions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decisions.is_empty()
    }
}
