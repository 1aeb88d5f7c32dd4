//! Subtree Propagation - keeping monitor caches coherent across reparenting.
//!
//! After any parent-link change, every cached record below the changed node
//! that depended on the changed part of the ancestor chain is rebuilt, and
//! every affected monitored key produces exactly one hook call per
//! (component, ancestor) pair.
//!
//! Propagation runs in two phases:
//!
//! ```text
//! collect:  depth-first walk from the mutated node, rewriting records and
//!           appending PendingNotification entries to an accumulator
//! replay:   after the walk has fully unwound, fire the deduplicated hooks
//! ```
//!
//! Hooks never run mid-walk, so a hook that reparents something cannot
//! corrupt a traversal in progress.

use std::collections::{HashMap, HashSet};

use super::arrays::core;
use super::arrays::monitors::{self, MonitorRecord, Resolution};
use super::monitor::resolve;
use super::registry::is_allocated;
use crate::state::hooks;
use crate::types::MonitorKey;

// =============================================================================
// Types
// =============================================================================

/// Direction of the structural change being propagated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshMode {
    /// The subtree root is about to lose its parent.
    Detaching,
    /// The subtree root just gained a parent (or lost one and must re-resolve).
    Attaching,
}

/// Which hook a pending notification fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MonitorEvent {
    Attached,
    Detached,
}

/// A hook call collected during the walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PendingNotification {
    pub component: usize,
    pub ancestor: usize,
    pub event: MonitorEvent,
}

// =============================================================================
// Public Entry Point
// =============================================================================

/// Bring every monitor record in the subtree at `index` up to date, then fire
/// the resulting hooks.
pub fn refresh_monitors(index: usize, mode: RefreshMode) {
    let pending = collect(index, mode);
    replay(pending);
}

/// Phase one: walk the subtree and return the notifications to fire.
pub(crate) fn collect(index: usize, mode: RefreshMode) -> Vec<PendingNotification> {
    let mut pending = Vec::new();
    match mode {
        RefreshMode::Detaching => collect_detaching(index, 0, &mut pending),
        RefreshMode::Attaching => {
            let mut missing = HashMap::new();
            collect_attaching(index, 0, false, &mut missing, &mut pending);
        }
    }
    tracing::debug!(index, ?mode, pending = pending.len(), "monitors refreshed");
    pending
}

/// Attaching pass after `index` changed its name.
///
/// Every record resolved at or above `index` carries the old name in its
/// path, so those are rebuilt as well.
pub(crate) fn collect_renamed(index: usize) -> Vec<PendingNotification> {
    let mut pending = Vec::new();
    let mut missing = HashMap::new();
    collect_attaching(index, 0, true, &mut missing, &mut pending);
    tracing::debug!(index, pending = pending.len(), "monitors refreshed after rename");
    pending
}

/// Phase two: fire each distinct notification once, in discovery order.
pub(crate) fn replay(pending: Vec<PendingNotification>) {
    let mut fired = HashSet::new();
    for note in pending {
        if !fired.insert(note) {
            continue;
        }
        // An earlier hook may have released the component
        if !is_allocated(note.component) {
            continue;
        }
        tracing::trace!(component = note.component, ancestor = note.ancestor, event = ?note.event, "hook");
        match note.event {
            MonitorEvent::Attached => hooks::fire_attached(note.component, note.ancestor),
            MonitorEvent::Detached => hooks::fire_detached(note.component, note.ancestor),
        }
    }
}

// =============================================================================
// Detaching
// =============================================================================

/// Invalidate every record whose ancestor sits above the cut point.
///
/// `depth` is the distance from the node being detached; a record found
/// more than `depth` edges up resolved to something above the cut.
fn collect_detaching(index: usize, depth: usize, pending: &mut Vec<PendingNotification>) {
    for (key, record) in monitors::records(index) {
        let Resolution::Found {
            target,
            depth: found_depth,
            ..
        } = record.resolution
        else {
            continue;
        };
        if found_depth <= depth {
            continue;
        }

        if record.monitored {
            monitors::set_record(index, key, MonitorRecord::pending());
            pending.push(PendingNotification {
                component: index,
                ancestor: target,
                event: MonitorEvent::Detached,
            });
        } else {
            monitors::remove_record(index, key);
        }
    }

    if core::get_kind(index).is_container() {
        for child in core::get_children(index) {
            collect_detaching(child, depth + 1, pending);
        }
    }
}

// =============================================================================
// Attaching
// =============================================================================

/// Resolve pending monitored records against the (new) ancestor chain.
///
/// `missing` maps keys already confirmed absent during this walk to the
/// shallowest depth that failed. A node at that depth or deeper shares the
/// same part of the chain above the subtree root (and is further from it),
/// so the key is not walked again.
///
/// With `renamed`, every record found at or above the subtree root is
/// rebuilt; otherwise only `Root` records are, since the root is no longer
/// the top.
fn collect_attaching(
    index: usize,
    depth: usize,
    renamed: bool,
    missing: &mut HashMap<MonitorKey, usize>,
    pending: &mut Vec<PendingNotification>,
) {
    for (key, record) in monitors::records(index) {
        match record.resolution {
            Resolution::Found {
                target,
                depth: found_depth,
                ..
            } if (renamed || key == MonitorKey::Root) && found_depth >= depth => {
                if !record.monitored {
                    monitors::remove_record(index, key);
                    continue;
                }
                let resolution = resolve(index, key);
                let new_target = resolution.target();
                if new_target != Some(target) {
                    pending.push(PendingNotification {
                        component: index,
                        ancestor: target,
                        event: MonitorEvent::Detached,
                    });
                    if let Some(new_target) = new_target {
                        pending.push(PendingNotification {
                            component: index,
                            ancestor: new_target,
                            event: MonitorEvent::Attached,
                        });
                    }
                }
                monitors::set_record(
                    index,
                    key,
                    MonitorRecord {
                        resolution,
                        monitored: true,
                    },
                );
            }
            // Still valid: the match sits inside the subtree
            Resolution::Found { .. } => {}
            // Stale one-shot lookup, cheap to redo if needed
            Resolution::Absent if !record.monitored => {
                monitors::remove_record(index, key);
            }
            Resolution::Absent => {
                if missing.get(&key).is_some_and(|&failed| depth >= failed) {
                    continue;
                }
                let resolution = resolve(index, key);
                match resolution.target() {
                    Some(target) => {
                        monitors::set_record(
                            index,
                            key,
                            MonitorRecord {
                                resolution,
                                monitored: true,
                            },
                        );
                        pending.push(PendingNotification {
                            component: index,
                            ancestor: target,
                            event: MonitorEvent::Attached,
                        });
                    }
                    None => {
                        let failed = missing.entry(key).or_insert(depth);
                        *failed = (*failed).min(depth);
                    }
                }
            }
        }
    }

    if core::get_kind(index).is_container() {
        for child in core::get_children(index) {
            collect_attaching(child, depth + 1, renamed, missing, pending);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::arrays::core;
    use crate::engine::container::add_child;
    use crate::engine::monitor::{lookup, monitor};
    use crate::engine::registry::{create_container, create_leaf, reset_tree};
    use crate::state::hooks::{set_hooks, MonitorHooks};
    use crate::types::Capability;
    use std::cell::RefCell;
    use std::rc::Rc;

    type Log = Rc<RefCell<Vec<(MonitorEvent, usize, usize)>>>;

    fn record_hooks(index: usize, log: &Log) {
        let on_attach = log.clone();
        let on_detach = log.clone();
        set_hooks(
            index,
            MonitorHooks::new()
                .on_attached(move |this, ancestor| {
                    on_attach.borrow_mut().push((MonitorEvent::Attached, this, ancestor))
                })
                .on_detached(move |this, ancestor| {
                    on_detach.borrow_mut().push((MonitorEvent::Detached, this, ancestor))
                }),
        );
    }

    #[test]
    fn test_detaching_invalidates_above_cut() {
        reset_tree();

        let a = create_container(Some("A"), Capability::SERVICE);
        let b = create_container(Some("B"), Capability::SCOPE);
        let c = create_leaf(Some("C"), Capability::NONE);
        add_child(a, "B", b).unwrap();
        add_child(b, "C", c).unwrap();

        let service = MonitorKey::of(Capability::SERVICE);
        let scope = MonitorKey::of(Capability::SCOPE);
        lookup(c, service).unwrap();
        lookup(c, scope).unwrap();

        // Cut between A and B: C's SCOPE (depth 1, inside) stays, SERVICE (depth 2) goes
        let pending = collect(b, RefreshMode::Detaching);
        assert!(pending.is_empty());
        assert!(monitors::get_record(c, service).is_none());
        assert_eq!(monitors::get_record(c, scope).unwrap().resolution.target(), Some(b));
    }

    #[test]
    fn test_detaching_keeps_monitored_as_pending() {
        reset_tree();

        let a = create_container(Some("A"), Capability::SERVICE);
        let b = create_container(Some("B"), Capability::NONE);
        let c = create_leaf(Some("C"), Capability::NONE);
        add_child(a, "B", b).unwrap();
        add_child(b, "C", c).unwrap();

        let service = MonitorKey::of(Capability::SERVICE);
        monitor(c, service).unwrap();

        let pending = collect(b, RefreshMode::Detaching);
        assert_eq!(
            pending,
            vec![PendingNotification {
                component: c,
                ancestor: a,
                event: MonitorEvent::Detached,
            }]
        );
        assert_eq!(monitors::get_record(c, service).unwrap(), MonitorRecord::pending());
    }

    #[test]
    fn test_attaching_resolves_pending_records() {
        reset_tree();

        let a = create_container(Some("A"), Capability::SERVICE);
        let b = create_container(Some("B"), Capability::NONE);
        let c = create_leaf(Some("C"), Capability::NONE);
        add_child(b, "C", c).unwrap();

        let service = MonitorKey::of(Capability::SERVICE);
        monitor(c, service).unwrap();
        assert_eq!(monitors::get_record(c, service).unwrap(), MonitorRecord::pending());

        // Link by hand so only the collect phase runs
        core::link(a, b);
        let pending = collect(b, RefreshMode::Attaching);

        assert_eq!(
            pending,
            vec![PendingNotification {
                component: c,
                ancestor: a,
                event: MonitorEvent::Attached,
            }]
        );
        let record = monitors::get_record(c, service).unwrap();
        assert!(record.monitored);
        assert_eq!(record.resolution.path(), Some("/A/B/C"));
    }

    #[test]
    fn test_attaching_drops_stale_one_shot_records() {
        reset_tree();

        let a = create_container(Some("A"), Capability::SERVICE);
        let b = create_container(Some("B"), Capability::NONE);
        let c = create_leaf(Some("C"), Capability::NONE);
        add_child(b, "C", c).unwrap();

        let service = MonitorKey::of(Capability::SERVICE);
        assert_eq!(lookup(c, service).unwrap(), None);

        add_child(a, "B", b).unwrap();

        assert!(monitors::get_record(c, service).is_none());
        assert_eq!(lookup(c, service).unwrap(), Some(a));
    }

    #[test]
    fn test_missing_keys_are_not_walked_twice() {
        reset_tree();

        // Three siblings monitor a key nobody provides
        let top = create_container(Some("top"), Capability::NONE);
        let mid = create_container(Some("mid"), Capability::NONE);
        let leaves: Vec<usize> = ["x", "y", "z"]
            .iter()
            .map(|&name| {
                let leaf = create_leaf(Some(name), Capability::NONE);
                add_child(mid, name, leaf).unwrap();
                leaf
            })
            .collect();

        let session = MonitorKey::of(Capability::SESSION);
        for &leaf in &leaves {
            monitor(leaf, session).unwrap();
        }

        add_child(top, "mid", mid).unwrap();

        for &leaf in &leaves {
            assert_eq!(monitors::get_record(leaf, session).unwrap(), MonitorRecord::pending());
        }
    }

    #[test]
    fn test_root_monitor_follows_new_top() {
        reset_tree();

        let log: Log = Rc::new(RefCell::new(Vec::new()));
        let a = create_container(Some("A"), Capability::NONE);
        let b = create_container(Some("B"), Capability::NONE);
        let c = create_leaf(Some("C"), Capability::NONE);
        add_child(b, "C", c).unwrap();
        record_hooks(c, &log);

        monitor(c, MonitorKey::Root).unwrap();
        add_child(a, "B", b).unwrap();

        assert_eq!(
            *log.borrow(),
            vec![
                (MonitorEvent::Attached, c, b),
                (MonitorEvent::Detached, c, b),
                (MonitorEvent::Attached, c, a),
            ]
        );
        assert_eq!(lookup(c, MonitorKey::Root).unwrap(), Some(a));
    }

    #[test]
    fn test_replay_deduplicates() {
        reset_tree();

        let log: Log = Rc::new(RefCell::new(Vec::new()));
        let a = create_container(Some("A"), Capability::NONE);
        let c = create_leaf(Some("C"), Capability::NONE);
        record_hooks(c, &log);

        let note = PendingNotification {
            component: c,
            ancestor: a,
            event: MonitorEvent::Attached,
        };
        replay(vec![note, note, note]);

        assert_eq!(*log.borrow(), vec![(MonitorEvent::Attached, c, a)]);
    }
}
