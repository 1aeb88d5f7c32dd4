//! Clone - copying components and whole subtrees.
//!
//! A clone session maps original indices to their copies. While a session
//! is open the tree is "cloning", and [`clone_target_for`] tells a copy
//! whether its original parent has a copy it should hang under.
//!
//! ```text
//! original          copy
//! app               app'          (parentless: app's parent was not cloned)
//! ├── panel    →    ├── panel'    (parent redirected to app')
//! │   └── button    │   └── button'
//! └── status        └── status'
//! ```

use std::cell::RefCell;
use std::collections::HashMap;

use super::arrays::core;
use super::arrays::monitors::{self, MonitorRecord};
use super::propagate::{refresh_monitors, RefreshMode};
use super::registry::{collect_subtree, create_component, ensure_allocated};
use crate::error::{Result, TreeError};
use crate::state::hooks;

// =============================================================================
// Clone Session
// =============================================================================

thread_local! {
    /// original index → copy, while a clone is in progress.
    static CLONE_SESSION: RefCell<Option<HashMap<usize, usize>>> = const { RefCell::new(None) };
}

/// Where the copy of a child of `original_parent` should be attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloneTarget {
    /// No clone covers this parent; the copy starts detached.
    NotCloning,
    /// Attach the copy under this index.
    Target(usize),
}

/// Is a clone in progress?
pub fn is_cloning() -> bool {
    CLONE_SESSION.with(|s| s.borrow().is_some())
}

/// Copy of `original_parent` in the current clone session, if any.
pub fn clone_target_for(original_parent: usize) -> CloneTarget {
    CLONE_SESSION.with(|s| {
        s.borrow()
            .as_ref()
            .and_then(|map| map.get(&original_parent).copied())
            .map_or(CloneTarget::NotCloning, CloneTarget::Target)
    })
}

// =============================================================================
// Cloning
// =============================================================================

/// Copy `index` and its whole subtree. Returns the copy of `index`.
///
/// The copy of `index` is parentless. Copying a parentless component is a
/// plain copy that keeps its monitor registrations; copying an attached one
/// is a fresh detach with no monitor state. Descendant copies hang under the
/// copies of their parents with the same names and keep their registrations.
/// Kept registrations are resolved against the copied subtree, firing
/// `on_attached` where they match.
pub fn clone_component(index: usize) -> Result<usize> {
    ensure_allocated(index)?;

    let mut originals = Vec::new();
    collect_subtree(index, &mut originals);

    let previous = CLONE_SESSION.with(|s| s.borrow_mut().replace(HashMap::new()));

    let mut root_copy = None;
    for original in originals {
        let copy = create_component(
            core::get_name(original).as_deref(),
            core::get_kind(original),
            core::get_capabilities(original),
        );
        hooks::copy_hooks(original, copy);

        let parent = core::get_parent_index(original);
        let target = match parent {
            Some(parent) => clone_target_for(parent),
            None => CloneTarget::NotCloning,
        };
        let keep_monitors = match target {
            CloneTarget::Target(parent_copy) => {
                core::link(parent_copy, copy);
                true
            }
            // Plain copy when parentless, fresh detach otherwise
            CloneTarget::NotCloning => parent.is_none(),
        };
        if keep_monitors {
            for (key, record) in monitors::records(original) {
                if record.monitored {
                    monitors::set_record(copy, key, MonitorRecord::pending());
                }
            }
        }

        CLONE_SESSION.with(|s| {
            if let Some(map) = s.borrow_mut().as_mut() {
                map.insert(original, copy);
            }
        });
        root_copy.get_or_insert(copy);
    }

    CLONE_SESSION.with(|s| *s.borrow_mut() = previous);

    // collect_subtree always yields `index` first
    let Some(root_copy) = root_copy else {
        return Err(TreeError::UnknownComponent { index });
    };
    tracing::debug!(index, copy = root_copy, "subtree cloned");

    refresh_monitors(root_copy, RefreshMode::Attaching);
    Ok(root_copy)
}
