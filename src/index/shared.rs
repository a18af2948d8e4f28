//! Shared metadata index
//!
//! One mutex around one map. Callers do all parsing before calling
//! [`SharedIndex::merge`], so the lock covers a single insertion and
//! nothing else.

use crate::index::MetadataIndex;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

/// Identity -> metadata map with synchronized insertion
#[derive(Debug, Default)]
pub struct SharedIndex {
    entries: Mutex<MetadataIndex>,

    /// Total merge calls (including replacements)
    merges: AtomicU64,
}

impl SharedIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-size for `capacity` entries
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Mutex::new(MetadataIndex::with_capacity(capacity)),
            merges: AtomicU64::new(0),
        }
    }

    /// Insert one entry, replacing any previous value for `identity`
    ///
    /// Returns the replaced value. Concurrent merges of the same identity
    /// resolve to whichever runs last; values are never interleaved.
    pub fn merge(&self, identity: impl Into<String>, metadata: String) -> Option<String> {
        let identity = identity.into();
        let previous = self.entries.lock().insert(identity, metadata);
        self.merges.fetch_add(1, Ordering::Relaxed);
        previous
    }

    /// Insert only if `identity` is absent; returns true if inserted
    pub fn merge_if_absent(&self, identity: impl Into<String>, metadata: String) -> bool {
        let mut entries = self.entries.lock();
        let identity = identity.into();
        if entries.contains_key(&identity) {
            return false;
        }
        entries.insert(identity, metadata);
        drop(entries);
        self.merges.fetch_add(1, Ordering::Relaxed);
        true
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    pub fn contains(&self, identity: &str) -> bool {
        self.entries.lock().contains_key(identity)
    }

    pub fn merge_count(&self) -> u64 {
        self.merges.load(Ordering::Relaxed)
    }

    /// Copy of the current contents
    ///
    /// Only meaningful once all writers are done.
    pub fn snapshot(&self) -> MetadataIndex {
        self.entries.lock().clone()
    }

    /// Hand the finished index to the caller
    pub fn into_index(self) -> MetadataIndex {
        self.entries.into_inner()
    }
}
