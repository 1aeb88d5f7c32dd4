//! Reparent - the only mutator of a component's parent link.
//!
//! Containers call [`set_parent`] (usually through `add_child` and
//! `remove_child`). Validation always happens before any state changes, so a
//! refused or illegal call leaves the tree exactly as it was.

use super::arrays::core;
use super::arrays::monitors::{self, MonitorRecord, Resolution};
use super::container::accept_child;
use super::monitor::resolve;
use super::propagate::{self, RefreshMode};
use super::registry::{display_name, ensure_allocated};
use crate::error::{Result, TreeError};

/// Attach `index` to `new_parent`, detach it (`None`), or rename it.
///
/// - parentless, `None`, name given: rename only, no traversal
/// - same parent and no name: no-op
/// - already has a parent and `new_parent` is `Some`: [`TreeError::AlreadyHasParent`]
/// - `None`: detach, invalidating monitors that resolved above this node
/// - `Some`: container validates first, then link and resolve pending monitors
///
/// Hooks fire once, after all structural work for the call is done.
pub fn set_parent(index: usize, new_parent: Option<usize>, new_name: Option<&str>) -> Result<()> {
    ensure_allocated(index)?;
    if let Some(parent) = new_parent {
        ensure_allocated(parent)?;
    }

    let current = core::get_parent_index(index);

    if current.is_none() && new_parent.is_none() {
        if let Some(name) = new_name {
            tracing::debug!(index, name, "renamed detached component");
            core::set_name(index, Some(name.to_owned()));
            rebuild_own_paths(index);
        }
        return Ok(());
    }

    if current == new_parent && new_name.is_none() {
        return Ok(());
    }

    if current.is_some() && new_parent.is_some() {
        return Err(TreeError::AlreadyHasParent {
            name: display_name(index),
        });
    }

    match new_parent {
        None => detach(index, new_name),
        Some(parent) => attach(index, parent, new_name),
    }
}

fn detach(index: usize, new_name: Option<&str>) -> Result<()> {
    tracing::debug!(index, parent = ?core::get_parent_index(index), "detaching");

    let renamed = new_name.is_some_and(|name| !core::has_name(index, name));

    let mut pending = propagate::collect(index, RefreshMode::Detaching);
    core::unlink(index);
    if let Some(name) = new_name {
        core::set_name(index, Some(name.to_owned()));
    }
    // Root monitors invalidated above now resolve to this node
    if renamed {
        pending.extend(propagate::collect_renamed(index));
    } else {
        pending.extend(propagate::collect(index, RefreshMode::Attaching));
    }

    propagate::replay(pending);
    Ok(())
}

fn attach(index: usize, parent: usize, new_name: Option<&str>) -> Result<()> {
    let name = new_name.map(str::to_owned).or_else(|| core::get_name(index));
    accept_child(parent, index, name.as_deref())?;

    tracing::debug!(index, parent, name = name.as_deref().unwrap_or(""), "attaching");

    let renamed = core::get_name(index) != name;
    core::set_name(index, name);
    core::link(parent, index);

    let pending = if renamed {
        propagate::collect_renamed(index)
    } else {
        propagate::collect(index, RefreshMode::Attaching)
    };
    propagate::replay(pending);
    Ok(())
}

/// Rebuild the paths of a parentless component's own records after a rename.
///
/// Only `Root` can be found without a parent, and it resolves to the
/// component itself, so no hook is due.
fn rebuild_own_paths(index: usize) {
    for (key, record) in monitors::records(index) {
        if !matches!(record.resolution, Resolution::Found { .. }) {
            continue;
        }
        if record.monitored {
            let resolution = resolve(index, key);
            monitors::set_record(
                index,
                key,
                MonitorRecord {
                    resolution,
                    monitored: true,
                },
            );
        } else {
            monitors::remove_record(index, key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::arrays::core;
    use crate::engine::arrays::monitors;
    use crate::engine::container::add_child;
    use crate::engine::monitor::{is_monitored, lookup, lookup_path, monitor};
    use crate::engine::registry::{create_container, create_leaf, get_name, get_parent, reset_tree};
    use crate::error::Refusal;
    use crate::state::hooks::{set_hooks, MonitorHooks};
    use crate::types::{Capability, MonitorKey};
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_rename_while_detached() {
        reset_tree();

        let calls = Rc::new(RefCell::new(0));
        let attach_calls = calls.clone();
        let detach_calls = calls.clone();
        let leaf = create_leaf(Some("old"), Capability::NONE);
        let other = create_leaf(Some("other"), Capability::NONE);
        monitor(leaf, MonitorKey::Root).unwrap();
        lookup(other, MonitorKey::Root).unwrap();
        set_hooks(
            leaf,
            MonitorHooks::new()
                .on_attached(move |_, _| *attach_calls.borrow_mut() += 1)
                .on_detached(move |_, _| *detach_calls.borrow_mut() += 1),
        );

        set_parent(leaf, None, Some("renamed")).unwrap();
        set_parent(other, None, Some("spare")).unwrap();

        assert_eq!(get_name(leaf), Some("renamed".to_string()));
        assert_eq!(get_parent(leaf), None);
        assert_eq!(*calls.borrow(), 0);
        // Monitored record rebuilt in place, one-shot record dropped
        assert!(is_monitored(leaf, MonitorKey::Root));
        assert_eq!(
            monitors::get_record(leaf, MonitorKey::Root).unwrap().resolution.path(),
            Some("/renamed")
        );
        assert!(monitors::get_record(other, MonitorKey::Root).is_none());
        assert_eq!(lookup_path(other, MonitorKey::Root).unwrap(), Some("/spare".to_string()));
    }

    #[test]
    fn test_same_parent_is_noop() {
        reset_tree();

        let app = create_container(Some("app"), Capability::NONE);
        let leaf = create_leaf(Some("leaf"), Capability::NONE);
        add_child(app, "leaf", leaf).unwrap();

        set_parent(leaf, Some(app), None).unwrap();
        assert_eq!(get_parent(leaf), Some(app));
        assert_eq!(core::get_children(app), vec![leaf]);

        set_parent(leaf, None, None).unwrap();
        set_parent(leaf, None, None).unwrap();
        assert_eq!(get_parent(leaf), None);
    }

    #[test]
    fn test_already_has_parent() {
        reset_tree();

        let x = create_container(Some("x"), Capability::NONE);
        let y = create_container(Some("y"), Capability::NONE);
        let leaf = create_leaf(Some("leaf"), Capability::NONE);
        add_child(y, "leaf", leaf).unwrap();

        assert_eq!(
            set_parent(leaf, Some(x), None),
            Err(TreeError::AlreadyHasParent {
                name: "leaf".into()
            })
        );
        // Same parent with a new name is also a second attach
        assert!(matches!(
            set_parent(leaf, Some(y), Some("other")),
            Err(TreeError::AlreadyHasParent { .. })
        ));

        assert_eq!(get_parent(leaf), Some(y));
        assert_eq!(get_name(leaf), Some("leaf".to_string()));
        assert!(core::get_children(x).is_empty());
    }

    #[test]
    fn test_refusal_leaves_state_untouched() {
        reset_tree();

        let app = create_container(Some("app"), Capability::SERVICE);
        let first = create_leaf(Some("item"), Capability::NONE);
        let second = create_leaf(Some("other"), Capability::NONE);
        add_child(app, "item", first).unwrap();

        let key = MonitorKey::of(Capability::SERVICE);
        monitor(second, key).unwrap();

        let err = set_parent(second, Some(app), Some("item")).unwrap_err();
        assert_eq!(
            err,
            TreeError::Refused(Refusal::DuplicateName {
                parent: "app".into(),
                name: "item".into(),
            })
        );
        assert_eq!(get_parent(second), None);
        assert_eq!(get_name(second), Some("other".to_string()));
        assert_eq!(core::get_children(app), vec![first]);
        assert_eq!(lookup(second, key).unwrap(), None);
    }

    #[test]
    fn test_detach_with_name() {
        reset_tree();

        let app = create_container(Some("app"), Capability::NONE);
        let leaf = create_leaf(Some("leaf"), Capability::NONE);
        add_child(app, "leaf", leaf).unwrap();

        set_parent(leaf, None, Some("spare")).unwrap();
        assert_eq!(get_parent(leaf), None);
        assert_eq!(get_name(leaf), Some("spare".to_string()));
    }

    #[test]
    fn test_detach_with_name_rebuilds_paths() {
        reset_tree();

        let app = create_container(Some("app"), Capability::NONE);
        let panel = create_container(Some("panel"), Capability::SCOPE);
        let leaf = create_leaf(Some("leaf"), Capability::NONE);
        add_child(panel, "leaf", leaf).unwrap();
        add_child(app, "panel", panel).unwrap();

        let scope = MonitorKey::of(Capability::SCOPE);
        assert_eq!(lookup_path(leaf, scope).unwrap(), Some("/panel/leaf".to_string()));

        set_parent(panel, None, Some("spare")).unwrap();

        assert_eq!(lookup_path(leaf, scope).unwrap(), Some("/spare/leaf".to_string()));
        assert_eq!(lookup_path(leaf, MonitorKey::Root).unwrap(), Some("/spare/leaf".to_string()));
    }

    #[test]
    fn test_attach_with_new_name_rebuilds_paths() {
        reset_tree();

        let log = Rc::new(RefCell::new(Vec::new()));
        let a = create_container(Some("A"), Capability::NONE);
        let b = create_container(Some("B"), Capability::SCOPE);
        let c = create_container(Some("C"), Capability::NONE);
        let d = create_leaf(Some("D"), Capability::NONE);
        add_child(c, "D", d).unwrap();
        add_child(b, "C", c).unwrap();

        let scope = MonitorKey::of(Capability::SCOPE);
        assert_eq!(lookup_path(d, scope).unwrap(), Some("/B/C/D".to_string()));

        let attach_log = log.clone();
        let detach_log = log.clone();
        set_hooks(
            c,
            MonitorHooks::new()
                .on_attached(move |_, anc| attach_log.borrow_mut().push(("attached", anc)))
                .on_detached(move |_, anc| detach_log.borrow_mut().push(("detached", anc))),
        );
        monitor(c, scope).unwrap();
        log.borrow_mut().clear();

        add_child(a, "renamed", b).unwrap();

        assert_eq!(get_name(b), Some("renamed".to_string()));
        assert_eq!(lookup_path(d, scope).unwrap(), Some("/renamed/C/D".to_string()));
        assert_eq!(lookup_path(c, scope).unwrap(), Some("/renamed/C".to_string()));
        // Same target, only the path changed
        assert!(log.borrow().is_empty());
        assert!(is_monitored(c, scope));
    }

    #[test]
    fn test_detach_moves_root_monitor_to_new_top() {
        reset_tree();

        let log = Rc::new(RefCell::new(Vec::new()));
        let a = create_container(Some("A"), Capability::NONE);
        let b = create_container(Some("B"), Capability::NONE);
        let c = create_leaf(Some("C"), Capability::NONE);
        add_child(a, "B", b).unwrap();
        add_child(b, "C", c).unwrap();

        let attach_log = log.clone();
        let detach_log = log.clone();
        set_hooks(
            c,
            MonitorHooks::new()
                .on_attached(move |_, anc| attach_log.borrow_mut().push(("attached", anc)))
                .on_detached(move |_, anc| detach_log.borrow_mut().push(("detached", anc))),
        );
        monitor(c, MonitorKey::Root).unwrap();
        log.borrow_mut().clear();

        set_parent(b, None, None).unwrap();

        assert_eq!(*log.borrow(), vec![("detached", a), ("attached", b)]);
        assert_eq!(lookup(c, MonitorKey::Root).unwrap(), Some(b));
    }

    #[test]
    fn test_hook_may_reparent() {
        reset_tree();

        // When `leaf` finds the service it moves `other` under `spare`
        let service = create_container(Some("service"), Capability::SERVICE);
        let spare = create_container(Some("spare"), Capability::NONE);
        let leaf = create_leaf(Some("leaf"), Capability::NONE);
        let other = create_leaf(Some("other"), Capability::NONE);
        set_hooks(
            leaf,
            MonitorHooks::new().on_attached(move |_, _| {
                add_child(spare, "other", other).unwrap();
            }),
        );
        monitor(leaf, MonitorKey::of(Capability::SERVICE)).unwrap();

        add_child(service, "leaf", leaf).unwrap();

        assert_eq!(get_parent(other), Some(spare));
    }
}
