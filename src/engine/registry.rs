//! Component Registry - Index allocation for parallel arrays.
//!
//! Manages the lifecycle of component indices:
//! - Free index pool for O(1) reuse
//! - Allocated index set for iteration and validity checks
//! - Recursive release of whole subtrees
//! - Release callbacks per index

use std::cell::RefCell;
use std::collections::{BTreeSet, HashMap};

use super::arrays;
use super::arrays::core;
use super::reparent::set_parent;
use crate::error::{Result, TreeError};
use crate::state::hooks;
use crate::types::{Capability, ComponentKind};

// =============================================================================
// Registry State
// =============================================================================

thread_local! {
    /// Set of currently allocated indices (for iteration).
    static ALLOCATED_INDICES: RefCell<BTreeSet<usize>> = const { RefCell::new(BTreeSet::new()) };

    /// Pool of freed indices for reuse.
    static FREE_INDICES: RefCell<Vec<usize>> = const { RefCell::new(Vec::new()) };

    /// Next index to allocate if pool is empty.
    static NEXT_INDEX: RefCell<usize> = const { RefCell::new(0) };

    /// Release callbacks registered per index.
    static RELEASE_CALLBACKS: RefCell<HashMap<usize, Vec<Box<dyn FnOnce()>>>> = RefCell::new(HashMap::new());
}

// =============================================================================
// Index Allocation
// =============================================================================

/// Allocate an index for a new, parentless component.
///
/// # Arguments
/// * `name` - Optional name. Anonymous components must be named before they
///   can be added to a container.
/// * `kind` - Leaf or container
/// * `capabilities` - Tags matched by ancestor lookups
///
/// # Returns
/// The allocated index.
pub fn create_component(name: Option<&str>, kind: ComponentKind, capabilities: Capability) -> usize {
    // Reuse free index or allocate new
    let index = FREE_INDICES.with(|free| {
        let mut free = free.borrow_mut();
        if let Some(index) = free.pop() {
            index
        } else {
            NEXT_INDEX.with(|next| {
                let mut next = next.borrow_mut();
                let index = *next;
                *next += 1;
                index
            })
        }
    });

    // Ensure arrays have capacity for this index
    arrays::ensure_all_capacity(index);

    core::set_kind(index, kind);
    core::set_capabilities(index, capabilities);
    core::set_name(index, name.map(str::to_owned));

    ALLOCATED_INDICES.with(|set| {
        set.borrow_mut().insert(index);
    });

    tracing::trace!(index, name = name.unwrap_or(""), ?kind, "component created");
    index
}

/// Allocate a container.
pub fn create_container(name: Option<&str>, capabilities: Capability) -> usize {
    create_component(name, ComponentKind::Container, capabilities | Capability::CONTAINER)
}

/// Allocate a leaf.
pub fn create_leaf(name: Option<&str>, capabilities: Capability) -> usize {
    create_component(name, ComponentKind::Leaf, capabilities)
}

/// Release a component and everything below it.
///
/// The component is detached first, so monitors elsewhere see a normal
/// detach (and their `detached` hooks fire). The whole subtree is then
/// released bottom-up and its indices go back to the pool.
pub fn release_component(index: usize) -> Result<()> {
    ensure_allocated(index)?;

    if core::get_parent_index(index).is_some() {
        set_parent(index, None, None)?;
    }

    let mut subtree = Vec::new();
    collect_subtree(index, &mut subtree);

    // Children before parents
    for &member in subtree.iter().rev() {
        release_one(member);
    }

    tracing::debug!(index, released = subtree.len(), "subtree released");

    // AUTO-CLEANUP: When all components are released, reset arrays to free memory
    let is_empty = ALLOCATED_INDICES.with(|set| set.borrow().is_empty());
    if is_empty {
        arrays::reset_all_arrays();
        FREE_INDICES.with(|free| free.borrow_mut().clear());
        NEXT_INDEX.with(|next| *next.borrow_mut() = 0);
    }

    Ok(())
}

/// Pre-order list of `index` and all of its descendants.
pub(crate) fn collect_subtree(index: usize, out: &mut Vec<usize>) {
    out.push(index);
    for child in core::get_children(index) {
        collect_subtree(child, out);
    }
}

fn release_one(index: usize) {
    // Run release callbacks before cleanup
    run_release_callbacks(index);

    hooks::clear_hooks(index);
    arrays::clear_all_at_index(index);

    ALLOCATED_INDICES.with(|set| {
        set.borrow_mut().remove(&index);
    });
    FREE_INDICES.with(|free| {
        free.borrow_mut().push(index);
    });
}

// =============================================================================
// Release Callbacks
// =============================================================================

/// Register a callback to run when the component at `index` is released.
pub fn on_release(index: usize, callback: impl FnOnce() + 'static) {
    RELEASE_CALLBACKS.with(|callbacks| {
        callbacks
            .borrow_mut()
            .entry(index)
            .or_default()
            .push(Box::new(callback));
    });
}

/// Run and clear release callbacks for an index.
fn run_release_callbacks(index: usize) {
    let callbacks = RELEASE_CALLBACKS.with(|callbacks| {
        callbacks.borrow_mut().remove(&index)
    });
    if let Some(callbacks) = callbacks {
        for callback in callbacks {
            callback();
        }
    }
}

// =============================================================================
// Lookups
// =============================================================================

/// Check if an index is currently allocated.
pub fn is_allocated(index: usize) -> bool {
    ALLOCATED_INDICES.with(|set| set.borrow().contains(&index))
}

/// Error unless `index` is allocated.
pub fn ensure_allocated(index: usize) -> Result<()> {
    if is_allocated(index) {
        Ok(())
    } else {
        Err(TreeError::UnknownComponent { index })
    }
}

/// Get all currently allocated indices, ascending.
pub fn get_allocated_indices() -> Vec<usize> {
    ALLOCATED_INDICES.with(|set| set.borrow().iter().copied().collect())
}

/// Get the count of currently allocated components.
pub fn get_allocated_count() -> usize {
    ALLOCATED_INDICES.with(|set| set.borrow().len())
}

/// Name of the component, if it has one.
pub fn get_name(index: usize) -> Option<String> {
    core::get_name(index)
}

/// Parent of the component, if attached.
pub fn get_parent(index: usize) -> Option<usize> {
    core::get_parent_index(index)
}

/// Kind of the component.
pub fn get_kind(index: usize) -> ComponentKind {
    core::get_kind(index)
}

/// Capability tags of the component.
pub fn get_capabilities(index: usize) -> Capability {
    core::get_capabilities(index)
}

/// Name for messages: the real name, or a placeholder for anonymous components.
pub fn display_name(index: usize) -> String {
    core::get_name(index).unwrap_or_else(|| format!("<anonymous #{index}>"))
}

// =============================================================================
// Reset (for testing)
// =============================================================================

/// Reset all tree state (for testing).
pub fn reset_tree() {
    ALLOCATED_INDICES.with(|set| set.borrow_mut().clear());
    FREE_INDICES.with(|free| free.borrow_mut().clear());
    NEXT_INDEX.with(|next| *next.borrow_mut() = 0);
    RELEASE_CALLBACKS.with(|callbacks| callbacks.borrow_mut().clear());
    hooks::reset_hooks();
    arrays::reset_all_arrays();
    crate::config::reset_config();
}
