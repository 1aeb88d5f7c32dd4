//! Component Tree - Monitor Arrays
//!
//! One monitor table per component index, mapping a [`MonitorKey`] to the
//! cached result of the last ancestor lookup for that key.
//!
//! Each key is in one of three states:
//! - no entry: never looked up
//! - [`Resolution::Found`]: nearest qualifying ancestor, with depth and path
//! - [`Resolution::Absent`]: looked up and not found
//!
//! Tables keep insertion order so notifications replay deterministically.

use std::cell::RefCell;

use crate::types::MonitorKey;

// =============================================================================
// Records
// =============================================================================

/// Outcome of an ancestor lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// A qualifying ancestor was found `depth` edges up.
    Found {
        target: usize,
        depth: usize,
        path: String,
    },
    /// Nothing qualifies.
    Absent,
}

impl Resolution {
    /// Target index, if found.
    pub fn target(&self) -> Option<usize> {
        match self {
            Resolution::Found { target, .. } => Some(*target),
            Resolution::Absent => None,
        }
    }

    /// Edges from the component up to the target, if found.
    pub fn depth(&self) -> Option<usize> {
        match self {
            Resolution::Found { depth, .. } => Some(*depth),
            Resolution::Absent => None,
        }
    }

    /// Path from the target down to the component, if found.
    pub fn path(&self) -> Option<&str> {
        match self {
            Resolution::Found { path, .. } => Some(path),
            Resolution::Absent => None,
        }
    }
}

/// Cached lookup plus whether the key is actively monitored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorRecord {
    pub resolution: Resolution,
    /// Registered through `monitor()`. Monitored records are never evicted.
    pub monitored: bool,
}

impl MonitorRecord {
    /// One-shot lookup result.
    pub fn cached(resolution: Resolution) -> Self {
        Self {
            resolution,
            monitored: false,
        }
    }

    /// Monitored key whose ancestor is not (yet) reachable.
    pub fn pending() -> Self {
        Self {
            resolution: Resolution::Absent,
            monitored: true,
        }
    }
}

/// Per-component monitor table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MonitorTable {
    entries: Vec<(MonitorKey, MonitorRecord)>,
}

impl MonitorTable {
    pub fn get(&self, key: MonitorKey) -> Option<&MonitorRecord> {
        self.entries.iter().find(|(k, _)| *k == key).map(|(_, r)| r)
    }

    pub fn get_mut(&mut self, key: MonitorKey) -> Option<&mut MonitorRecord> {
        self.entries
            .iter_mut()
            .find(|(k, _)| *k == key)
            .map(|(_, r)| r)
    }

    /// Insert or replace, keeping the original position on replace.
    pub fn insert(&mut self, key: MonitorKey, record: MonitorRecord) {
        match self.get_mut(key) {
            Some(existing) => *existing = record,
            None => self.entries.push((key, record)),
        }
    }

    pub fn remove(&mut self, key: MonitorKey) -> Option<MonitorRecord> {
        let pos = self.entries.iter().position(|(k, _)| *k == key)?;
        Some(self.entries.remove(pos).1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (MonitorKey, &MonitorRecord)> {
        self.entries.iter().map(|(k, r)| (*k, r))
    }
}

// =============================================================================
// Arrays
// =============================================================================

thread_local! {
    static MONITORS: RefCell<Vec<MonitorTable>> = const { RefCell::new(Vec::new()) };
}

/// Ensure the monitor array has capacity for the given index.
pub fn ensure_capacity(index: usize) {
    MONITORS.with(|arr| {
        let mut arr = arr.borrow_mut();
        while arr.len() <= index {
            arr.push(MonitorTable::default());
        }
    });
}

/// Drop every record at index.
pub fn clear_at_index(index: usize) {
    MONITORS.with(|arr| {
        if let Some(table) = arr.borrow_mut().get_mut(index) {
            *table = MonitorTable::default();
        }
    });
}

/// Reset the monitor array.
pub fn reset() {
    MONITORS.with(|arr| arr.borrow_mut().clear());
}

// =============================================================================
// Record Access
// =============================================================================

/// Get a copy of the record for `key` at index.
pub fn get_record(index: usize, key: MonitorKey) -> Option<MonitorRecord> {
    MONITORS.with(|arr| arr.borrow().get(index).and_then(|t| t.get(key)).cloned())
}

/// Store the record for `key` at index.
pub fn set_record(index: usize, key: MonitorKey, record: MonitorRecord) {
    ensure_capacity(index);
    MONITORS.with(|arr| arr.borrow_mut()[index].insert(key, record));
}

/// Remove the record for `key` at index.
pub fn remove_record(index: usize, key: MonitorKey) -> Option<MonitorRecord> {
    MONITORS.with(|arr| {
        arr.borrow_mut()
            .get_mut(index)
            .and_then(|t| t.remove(key))
    })
}

/// Set the monitored flag on an existing record. Returns false if there is none.
pub fn mark_monitored(index: usize, key: MonitorKey) -> bool {
    MONITORS.with(|arr| {
        match arr.borrow_mut().get_mut(index).and_then(|t| t.get_mut(key)) {
            Some(record) => {
                record.monitored = true;
                true
            }
            None => false,
        }
    })
}

/// Snapshot of every (key, record) at index, in insertion order.
///
/// Propagation iterates over a snapshot so it can rewrite the table freely.
pub fn records(index: usize) -> Vec<(MonitorKey, MonitorRecord)> {
    MONITORS.with(|arr| {
        arr.borrow()
            .get(index)
            .map(|t| t.iter().map(|(k, r)| (k, r.clone())).collect())
            .unwrap_or_default()
    })
}
