//! Monitor - Cached ancestor lookup and monitor registration.
//!
//! `lookup(index, key)` walks parent links upward and caches the outcome in
//! the component's monitor table. Later lookups for the same key are O(1)
//! until a reparent somewhere on the ancestor chain invalidates the record
//! (see [`super::propagate`]).
//!
//! `monitor(index, key)` turns a one-shot record into a standing
//! registration: the component's `attached`/`detached` hooks fire whenever
//! the resolution for that key appears or disappears.

use std::collections::HashSet;

use super::arrays::core;
use super::arrays::monitors::{self, MonitorRecord, Resolution};
use super::registry::{display_name, ensure_allocated};
use crate::config::config;
use crate::error::{Result, TreeError};
use crate::state::hooks;
use crate::types::MonitorKey;

// =============================================================================
// Upward Walk
// =============================================================================

/// `sep + name`, or nothing for anonymous components.
fn path_segment(index: usize, separator: &str) -> String {
    match core::get_name(index) {
        Some(name) => format!("{separator}{name}"),
        None => String::new(),
    }
}

/// Does `index` satisfy `key`?
fn matches(index: usize, key: MonitorKey) -> bool {
    match key {
        MonitorKey::Root => core::get_parent_index(index).is_none(),
        MonitorKey::Capability(wanted) => core::get_capabilities(index).satisfies(wanted),
    }
}

/// Walk parent links from `index` without touching the cache.
///
/// The component itself only qualifies for [`MonitorKey::Root`], and only
/// when it has no parent. The walk reports [`Resolution::Absent`] if it
/// would revisit any node or exceeds the configured depth bound.
pub(crate) fn resolve(index: usize, key: MonitorKey) -> Resolution {
    let config = config();
    let separator = config.separator.as_str();
    let mut path = path_segment(index, separator);

    if key == MonitorKey::Root && core::get_parent_index(index).is_none() {
        return Resolution::Found {
            target: index,
            depth: 0,
            path,
        };
    }

    let mut visited = HashSet::from([index]);
    let mut current = index;
    let mut depth = 0;

    while let Some(parent) = core::get_parent_index(current) {
        if !visited.insert(parent) {
            tracing::warn!(index, parent, "parent cycle detected during lookup");
            return Resolution::Absent;
        }
        depth += 1;
        if depth > config.max_depth {
            tracing::warn!(index, max_depth = config.max_depth, "lookup exceeded depth bound");
            return Resolution::Absent;
        }

        path.insert_str(0, &path_segment(parent, separator));

        if matches(parent, key) {
            return Resolution::Found {
                target: parent,
                depth,
                path,
            };
        }
        current = parent;
    }

    Resolution::Absent
}

// =============================================================================
// Lookup
// =============================================================================

/// Nearest ancestor satisfying `key`, or `None`.
///
/// Uses the cached record when there is one; otherwise walks upward and
/// caches the outcome (found or not) as a one-shot record.
pub fn lookup(index: usize, key: MonitorKey) -> Result<Option<usize>> {
    ensure_allocated(index)?;

    if let Some(record) = monitors::get_record(index, key) {
        tracing::trace!(index, %key, target = ?record.resolution.target(), "lookup cache hit");
        return Ok(record.resolution.target());
    }

    let resolution = resolve(index, key);
    let target = resolution.target();
    tracing::trace!(index, %key, ?target, "lookup resolved");
    monitors::set_record(index, key, MonitorRecord::cached(resolution));
    Ok(target)
}

/// Like [`lookup`], but a missing ancestor is an error.
pub fn require(index: usize, key: MonitorKey) -> Result<usize> {
    lookup(index, key)?.ok_or_else(|| TreeError::not_attached(display_name(index), key))
}

/// Path from the resolved ancestor down to `index`, e.g. `"/app/panel/button"`.
pub fn lookup_path(index: usize, key: MonitorKey) -> Result<Option<String>> {
    lookup(index, key)?;
    Ok(monitors::get_record(index, key)
        .and_then(|record| record.resolution.path().map(str::to_owned)))
}

/// Edges from `index` up to the resolved ancestor.
pub fn lookup_depth(index: usize, key: MonitorKey) -> Result<Option<usize>> {
    lookup(index, key)?;
    Ok(monitors::get_record(index, key).and_then(|record| record.resolution.depth()))
}

// =============================================================================
// Monitor / Unmonitor
// =============================================================================

/// Start monitoring `key` on `index`.
///
/// If an ancestor is already reachable, `on_attached` fires immediately.
/// The registration survives a "not found" result and is retried on every
/// later structural change. Calling again while monitored does nothing.
pub fn monitor(index: usize, key: MonitorKey) -> Result<()> {
    ensure_allocated(index)?;

    if monitors::get_record(index, key).is_some_and(|record| record.monitored) {
        return Ok(());
    }

    let target = lookup(index, key)?;
    monitors::mark_monitored(index, key);
    tracing::debug!(index, %key, ?target, "monitor registered");

    if let Some(target) = target {
        hooks::fire_attached(index, target);
    }
    Ok(())
}

/// Stop monitoring `key` on `index` and forget any cached result. No hook fires.
pub fn unmonitor(index: usize, key: MonitorKey) -> Result<()> {
    ensure_allocated(index)?;
    if monitors::remove_record(index, key).is_some() {
        tracing::debug!(index, %key, "monitor removed");
    }
    Ok(())
}

/// Is `key` actively monitored on `index`?
pub fn is_monitored(index: usize, key: MonitorKey) -> bool {
    monitors::get_record(index, key).is_some_and(|record| record.monitored)
}

/// Keys actively monitored on `index`, in registration order.
pub fn monitored_keys(index: usize) -> Vec<MonitorKey> {
    monitors::records(index)
        .into_iter()
        .filter(|(_, record)| record.monitored)
        .map(|(key, _)| key)
        .collect()
}
