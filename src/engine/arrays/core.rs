//! Component Tree - Core Arrays
//!
//! The most fundamental component arrays:
//! - kind: Leaf or container
//! - capabilities: Tags matched by ancestor lookups
//! - name: Optional name, unique among siblings
//! - parentIndex: Non-owning back reference to the parent
//! - children: Ordered child indices (containers only)
//!
//! The parent link and the children list are always written together through
//! [`link`] and [`unlink`] so the two directions never disagree.

use std::cell::RefCell;

use crate::types::{Capability, ComponentKind};

// =============================================================================
// Arrays
// =============================================================================

thread_local! {
    /// Component kind (leaf, container).
    static KIND: RefCell<Vec<ComponentKind>> = const { RefCell::new(Vec::new()) };

    /// Capability tags.
    static CAPABILITIES: RefCell<Vec<Capability>> = const { RefCell::new(Vec::new()) };

    /// Component name (None while anonymous).
    static NAME: RefCell<Vec<Option<String>>> = const { RefCell::new(Vec::new()) };

    /// Parent component index (None for roots and detached components).
    static PARENT_INDEX: RefCell<Vec<Option<usize>>> = const { RefCell::new(Vec::new()) };

    /// Children in insertion order.
    static CHILDREN: RefCell<Vec<Vec<usize>>> = const { RefCell::new(Vec::new()) };
}

// =============================================================================
// Capacity Management
// =============================================================================

/// Ensure arrays have capacity for the given index.
pub fn ensure_capacity(index: usize) {
    KIND.with(|arr| grow(&mut arr.borrow_mut(), index));
    CAPABILITIES.with(|arr| grow(&mut arr.borrow_mut(), index));
    NAME.with(|arr| grow(&mut arr.borrow_mut(), index));
    PARENT_INDEX.with(|arr| grow(&mut arr.borrow_mut(), index));
    CHILDREN.with(|arr| grow(&mut arr.borrow_mut(), index));
}

fn grow<T: Default>(arr: &mut Vec<T>, index: usize) {
    while arr.len() <= index {
        arr.push(T::default());
    }
}

/// Clear values at index (called when releasing).
pub fn clear_at_index(index: usize) {
    KIND.with(|arr| {
        if let Some(slot) = arr.borrow_mut().get_mut(index) {
            *slot = ComponentKind::None;
        }
    });
    CAPABILITIES.with(|arr| {
        if let Some(slot) = arr.borrow_mut().get_mut(index) {
            *slot = Capability::NONE;
        }
    });
    NAME.with(|arr| {
        if let Some(slot) = arr.borrow_mut().get_mut(index) {
            *slot = None;
        }
    });
    PARENT_INDEX.with(|arr| {
        if let Some(slot) = arr.borrow_mut().get_mut(index) {
            *slot = None;
        }
    });
    CHILDREN.with(|arr| {
        if let Some(slot) = arr.borrow_mut().get_mut(index) {
            slot.clear();
        }
    });
}

/// Reset all arrays.
pub fn reset() {
    KIND.with(|arr| arr.borrow_mut().clear());
    CAPABILITIES.with(|arr| arr.borrow_mut().clear());
    NAME.with(|arr| arr.borrow_mut().clear());
    PARENT_INDEX.with(|arr| arr.borrow_mut().clear());
    CHILDREN.with(|arr| arr.borrow_mut().clear());
}

// =============================================================================
// Kind & Capabilities
// =============================================================================

/// Get component kind at index.
pub fn get_kind(index: usize) -> ComponentKind {
    KIND.with(|arr| arr.borrow().get(index).copied().unwrap_or_default())
}

/// Set component kind at index.
pub fn set_kind(index: usize, kind: ComponentKind) {
    KIND.with(|arr| {
        let mut arr = arr.borrow_mut();
        grow(&mut arr, index);
        arr[index] = kind;
    });
}

/// Get capability tags at index.
pub fn get_capabilities(index: usize) -> Capability {
    CAPABILITIES.with(|arr| arr.borrow().get(index).copied().unwrap_or_default())
}

/// Set capability tags at index.
pub fn set_capabilities(index: usize, caps: Capability) {
    CAPABILITIES.with(|arr| {
        let mut arr = arr.borrow_mut();
        grow(&mut arr, index);
        arr[index] = caps;
    });
}

// =============================================================================
// Name
// =============================================================================

/// Get name at index.
pub fn get_name(index: usize) -> Option<String> {
    NAME.with(|arr| arr.borrow().get(index).cloned().flatten())
}

/// Set name at index.
pub fn set_name(index: usize, name: Option<String>) {
    NAME.with(|arr| {
        let mut arr = arr.borrow_mut();
        grow(&mut arr, index);
        arr[index] = name;
    });
}

/// Does the component at index carry exactly this name?
pub fn has_name(index: usize, name: &str) -> bool {
    NAME.with(|arr| {
        arr.borrow()
            .get(index)
            .and_then(|n| n.as_deref())
            .is_some_and(|n| n == name)
    })
}

// =============================================================================
// Parent Index & Children
// =============================================================================

/// Get parent index at index.
pub fn get_parent_index(index: usize) -> Option<usize> {
    PARENT_INDEX.with(|arr| arr.borrow().get(index).copied().flatten())
}

/// Overwrite the parent slot without touching any children list.
///
/// Only test doubles use this, to build states the normal mutators refuse.
#[cfg(test)]
pub(crate) fn force_parent_index(index: usize, parent: Option<usize>) {
    PARENT_INDEX.with(|arr| {
        let mut arr = arr.borrow_mut();
        grow(&mut arr, index);
        arr[index] = parent;
    });
}

/// Get the children of index, in insertion order.
pub fn get_children(index: usize) -> Vec<usize> {
    CHILDREN.with(|arr| arr.borrow().get(index).cloned().unwrap_or_default())
}

/// Make `child` the last child of `parent`.
pub fn link(parent: usize, child: usize) {
    PARENT_INDEX.with(|arr| {
        let mut arr = arr.borrow_mut();
        grow(&mut arr, child);
        arr[child] = Some(parent);
    });
    CHILDREN.with(|arr| {
        let mut arr = arr.borrow_mut();
        grow(&mut arr, parent);
        if !arr[parent].contains(&child) {
            arr[parent].push(child);
        }
    });
}

/// Detach `child` from whatever parent it has.
pub fn unlink(child: usize) {
    let parent = PARENT_INDEX.with(|arr| {
        arr.borrow_mut()
            .get_mut(child)
            .and_then(|slot| slot.take())
    });
    if let Some(parent) = parent {
        CHILDREN.with(|arr| {
            if let Some(children) = arr.borrow_mut().get_mut(parent) {
                children.retain(|&c| c != child);
            }
        });
    }
}
