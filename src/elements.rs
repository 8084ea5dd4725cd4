//! Corpus-wide structural statistics.
//!
//! [`Elements`] maps a tag name to an [`ElementStat`] holding its occurrence count,
//! its attribute frequencies and, recursively, the statistics of its children. Every
//! map instance carries its own lock, so merges into unrelated branches of the tree
//! never contend; a lock is held only while a single entry is fetched or inserted.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::attributes::Attributes;
use crate::dom::Node;

/// An element is optional when it occurs fewer times than its enclosing element.
///
/// This compares corpus totals, not per-parent presence: a tag that is missing from
/// some parents but repeated in others can still come out as required.
pub fn is_optional(count: usize, parent_count: usize) -> bool {
    count < parent_count
}

/// Statistics for one tag at one element path
#[derive(Debug, Default)]
pub struct ElementStat {
    count: AtomicUsize,
    attributes: Attributes,
    children: Elements,
}

impl ElementStat {
    /// Total occurrences at this path
    pub fn count(&self) -> usize {
        self.count.load(Ordering::Relaxed)
    }

    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    pub fn children(&self) -> &Elements {
        &self.children
    }
}

/// Thread-safe, recursively nested tag → statistics map
#[derive(Debug, Default)]
pub struct Elements {
    entries: RwLock<HashMap<String, Arc<ElementStat>>>,
}

impl Elements {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge `node` and its whole subtree into this map
    pub fn add(&self, node: &Node) {
        let stat = self.entry(&node.name);

        stat.count.fetch_add(1, Ordering::Relaxed);
        for (name, _) in &node.attributes {
            stat.attributes.add(name);
        }
        for child in &node.children {
            stat.children.add(child);
        }
    }

    /// Fetch the entry for `name`, creating it exactly once under contention
    fn entry(&self, name: &str) -> Arc<ElementStat> {
        if let Some(stat) = self.entries.read().get(name) {
            return Arc::clone(stat);
        }

        let mut entries = self.entries.write();
        Arc::clone(entries.entry(name.to_string()).or_default())
    }

    /// Get the statistics for a direct child tag
    pub fn get(&self, name: &str) -> Option<Arc<ElementStat>> {
        self.entries.read().get(name).cloned()
    }

    /// Follow an element path such as `["root", "a", "b"]`
    pub fn path(&self, path: &[&str]) -> Option<Arc<ElementStat>> {
        let (first, rest) = path.split_first()?;
        let mut stat = self.get(first)?;
        for name in rest {
            let next = stat.children.get(name)?;
            stat = next;
        }
        Some(stat)
    }

    /// Entries sorted by tag name
    pub fn entries(&self) -> Vec<(String, Arc<ElementStat>)> {
        let mut entries: Vec<_> = self
            .entries
            .read()
            .iter()
            .map(|(name, stat)| (name.clone(), Arc::clone(stat)))
            .collect();
        entries.sort_by(|(a, _), (b, _)| a.cmp(b));
        entries
    }

    /// Number of distinct tags at this level
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sum of occurrence counts at this level
    pub fn total(&self) -> usize {
        self.entries.read().values().map(|stat| stat.count()).sum()
    }

    /// Immutable, serializable copy of the tree with optionality resolved
    pub fn snapshot(&self, parent_count: usize) -> ElementsSnapshot {
        self.entries()
            .into_iter()
            .map(|(name, stat)| {
                let count = stat.count();
                let snapshot = ElementSnapshot {
                    count,
                    optional: is_optional(count, parent_count),
                    attributes: stat.attributes.get(),
                    children: stat.children.snapshot(count),
                };
                (name, snapshot)
            })
            .collect()
    }
}

/// Serializable view of an [`Elements`] level, keyed by tag name
pub type ElementsSnapshot = BTreeMap<String, ElementSnapshot>;

/// Serializable view of an [`ElementStat`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementSnapshot {
    pub count: usize,
    pub optional: bool,
    pub attributes: BTreeMap<String, usize>,
    pub children: ElementsSnapshot,
}
