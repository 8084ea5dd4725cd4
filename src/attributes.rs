use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::RwLock;

/// Corpus-wide attribute frequencies for one element path.
///
/// Safe for concurrent `add` calls. Existing names are bumped under the read lock;
/// the write lock is only taken to insert a name seen for the first time.
#[derive(Debug, Default)]
pub struct Attributes {
    counts: RwLock<HashMap<String, AtomicUsize>>,
}

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one occurrence of `name`, inserting it at 1 if previously unseen
    pub fn add(&self, name: &str) {
        {
            let counts = self.counts.read();
            if let Some(count) = counts.get(name) {
                count.fetch_add(1, Ordering::Relaxed);
                return;
            }
        }

        // Double-checked: another writer may have inserted it in between.
        let mut counts = self.counts.write();
        counts
            .entry(name.to_string())
            .or_insert_with(|| AtomicUsize::new(0))
            .fetch_add(1, Ordering::Relaxed);
    }

    /// Sorted snapshot of name → occurrence count
    pub fn get(&self) -> BTreeMap<String, usize> {
        self.counts
            .read()
            .iter()
            .map(|(name, count)| (name.clone(), count.load(Ordering::Relaxed)))
            .collect()
    }

    /// Occurrence count of a single attribute name
    pub fn count(&self, name: &str) -> Option<usize> {
        self.counts
            .read()
            .get(name)
            .map(|count| count.load(Ordering::Relaxed))
    }

    /// Number of distinct attribute names
    pub fn len(&self) -> usize {
        self.counts.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
