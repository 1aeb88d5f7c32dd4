//! Container - components that hold named children.
//!
//! A container owns its children's parent-link value: children are added and
//! removed through [`add_child`] / [`remove_child`], which go through
//! [`set_parent`] so monitors stay coherent. Before any attach the container
//! gets a veto through [`accept_child`].

use std::collections::HashSet;

use super::arrays::core;
use super::registry::{display_name, ensure_allocated};
use super::reparent::set_parent;
use crate::error::{Refusal, Result};

// =============================================================================
// Validation
// =============================================================================

/// Would `container` accept `candidate` under `name`?
///
/// Refuses when the target is not a container, the child is anonymous, a
/// sibling already uses the name, or the child is the container itself or
/// one of its ancestors.
pub fn accept_child(container: usize, candidate: usize, name: Option<&str>) -> Result<()> {
    ensure_allocated(container)?;
    ensure_allocated(candidate)?;

    if !core::get_kind(container).is_container() {
        return Err(Refusal::NotAContainer {
            parent: display_name(container),
        }
        .into());
    }

    let Some(name) = name else {
        return Err(Refusal::Anonymous {
            parent: display_name(container),
        }
        .into());
    };

    if child_named(container, name).is_some_and(|existing| existing != candidate) {
        return Err(Refusal::DuplicateName {
            parent: display_name(container),
            name: name.to_owned(),
        }
        .into());
    }

    if is_ancestor_or_self(candidate, container) {
        return Err(Refusal::WouldCycle {
            parent: display_name(container),
            child: name.to_owned(),
        }
        .into());
    }

    Ok(())
}

/// Is `ancestor` equal to `index` or reachable by walking up from it?
pub fn is_ancestor_or_self(ancestor: usize, index: usize) -> bool {
    let mut visited = HashSet::new();
    let mut current = Some(index);
    while let Some(node) = current {
        if node == ancestor {
            return true;
        }
        if !visited.insert(node) {
            return false;
        }
        current = core::get_parent_index(node);
    }
    false
}

// =============================================================================
// Children
// =============================================================================

/// Direct children of `index`, in insertion order. Empty for leaves.
pub fn children(index: usize) -> Vec<usize> {
    if core::get_kind(index).is_container() {
        core::get_children(index)
    } else {
        Vec::new()
    }
}

/// Child of `container` carrying `name`.
pub fn child_named(container: usize, name: &str) -> Option<usize> {
    core::get_children(container)
        .into_iter()
        .find(|&child| core::has_name(child, name))
}

/// Add `child` to `container` under `name`.
pub fn add_child(container: usize, name: &str, child: usize) -> Result<()> {
    set_parent(child, Some(container), Some(name))
}

/// Detach the child named `name`. Returns it, or `None` if there was none.
pub fn remove_child(container: usize, name: &str) -> Result<Option<usize>> {
    ensure_allocated(container)?;
    let Some(child) = child_named(container, name) else {
        return Ok(None);
    };
    set_parent(child, None, None)?;
    Ok(Some(child))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::arrays::core;
    use crate::engine::registry::{create_container, create_leaf, get_parent, reset_tree};
    use crate::error::TreeError;
    use crate::types::Capability;

    #[test]
    fn test_add_and_remove() {
        reset_tree();

        let app = create_container(Some("app"), Capability::NONE);
        let a = create_leaf(Some("a"), Capability::NONE);
        let b = create_leaf(None, Capability::NONE);

        add_child(app, "a", a).unwrap();
        add_child(app, "b", b).unwrap();

        assert_eq!(children(app), vec![a, b]);
        assert_eq!(child_named(app, "b"), Some(b));
        assert_eq!(core::get_name(b), Some("b".to_string()));

        assert_eq!(remove_child(app, "a").unwrap(), Some(a));
        assert_eq!(remove_child(app, "a").unwrap(), None);
        assert_eq!(children(app), vec![b]);
        assert_eq!(get_parent(a), None);
    }

    #[test]
    fn test_leaf_refuses_children() {
        reset_tree();

        let leaf = create_leaf(Some("leaf"), Capability::NONE);
        let other = create_leaf(Some("other"), Capability::NONE);

        assert_eq!(
            add_child(leaf, "other", other),
            Err(TreeError::Refused(Refusal::NotAContainer {
                parent: "leaf".into()
            }))
        );
        assert!(children(leaf).is_empty());
    }

    #[test]
    fn test_anonymous_refused() {
        reset_tree();

        let app = create_container(Some("app"), Capability::NONE);
        let anon = create_leaf(None, Capability::NONE);

        assert!(matches!(
            set_parent(anon, Some(app), None),
            Err(TreeError::Refused(Refusal::Anonymous { .. }))
        ));
        assert_eq!(get_parent(anon), None);
    }

    #[test]
    fn test_cycle_refused() {
        reset_tree();

        let a = create_container(Some("a"), Capability::NONE);
        let b = create_container(Some("b"), Capability::NONE);
        let c = create_container(Some("c"), Capability::NONE);
        add_child(a, "b", b).unwrap();
        add_child(b, "c", c).unwrap();

        assert!(matches!(
            add_child(c, "a", a),
            Err(TreeError::Refused(Refusal::WouldCycle { .. }))
        ));
        let lone = create_container(Some("lone"), Capability::NONE);
        assert!(matches!(
            add_child(lone, "lone", lone),
            Err(TreeError::Refused(Refusal::WouldCycle { .. }))
        ));
        assert_eq!(get_parent(a), None);
    }

    #[test]
    fn test_is_ancestor_or_self() {
        reset_tree();

        let a = create_container(Some("a"), Capability::NONE);
        let b = create_container(Some("b"), Capability::NONE);
        let c = create_leaf(Some("c"), Capability::NONE);
        add_child(a, "b", b).unwrap();
        add_child(b, "c", c).unwrap();

        assert!(is_ancestor_or_self(a, c));
        assert!(is_ancestor_or_self(c, c));
        assert!(!is_ancestor_or_self(c, a));
    }
}
