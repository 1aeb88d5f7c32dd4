//! Monitor Hooks - attached/detached extension points
//!
//! Each component may register one pair of hooks:
//! - `on_attached(this, ancestor)`: a monitored ancestor became reachable
//! - `on_detached(this, ancestor)`: a monitored ancestor stopped being reachable
//!
//! Hooks are only ever invoked by `monitor()` and by subtree propagation,
//! never by outside code. They run after every table borrow is released, so a
//! hook may reparent, monitor or release components.
//!
//! # Example
//!
//! ```ignore
//! use spark_tree::state::hooks::{set_hooks, MonitorHooks};
//!
//! set_hooks(index, MonitorHooks::new()
//!     .on_attached(|this, service| println!("{this} found service {service}"))
//!     .on_detached(|this, service| println!("{this} lost service {service}")));
//! ```

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// Hook signature: `(this, ancestor)`.
pub type MonitorHook = Rc<dyn Fn(usize, usize)>;

// =============================================================================
// HOOKS
// =============================================================================

/// Attach/detach hooks for one component.
#[derive(Clone, Default)]
pub struct MonitorHooks {
    pub on_attached: Option<MonitorHook>,
    pub on_detached: Option<MonitorHook>,
}

impl MonitorHooks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the attached hook.
    pub fn on_attached(mut self, hook: impl Fn(usize, usize) + 'static) -> Self {
        self.on_attached = Some(Rc::new(hook));
        self
    }

    /// Set the detached hook.
    pub fn on_detached(mut self, hook: impl Fn(usize, usize) + 'static) -> Self {
        self.on_detached = Some(Rc::new(hook));
        self
    }
}

impl std::fmt::Debug for MonitorHooks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MonitorHooks")
            .field("on_attached", &self.on_attached.is_some())
            .field("on_detached", &self.on_detached.is_some())
            .finish()
    }
}

thread_local! {
    static HOOK_REGISTRY: RefCell<HashMap<usize, MonitorHooks>> = RefCell::new(HashMap::new());
}

/// Register hooks for a component, replacing any previous pair.
pub fn set_hooks(index: usize, hooks: MonitorHooks) {
    HOOK_REGISTRY.with(|reg| {
        reg.borrow_mut().insert(index, hooks);
    });
}

/// Remove the hooks of a component.
pub fn clear_hooks(index: usize) {
    HOOK_REGISTRY.with(|reg| {
        reg.borrow_mut().remove(&index);
    });
}

/// Does the component have any hook registered?
pub fn has_hooks(index: usize) -> bool {
    HOOK_REGISTRY.with(|reg| reg.borrow().contains_key(&index))
}

/// Give `to` the same hooks as `from` (used when cloning).
pub(crate) fn copy_hooks(from: usize, to: usize) {
    HOOK_REGISTRY.with(|reg| {
        let mut reg = reg.borrow_mut();
        if let Some(hooks) = reg.get(&from).cloned() {
            reg.insert(to, hooks);
        }
    });
}

// =============================================================================
// FIRING
// =============================================================================

/// Invoke `on_attached(this, ancestor)` if registered.
pub(crate) fn fire_attached(this: usize, ancestor: usize) {
    let hook = HOOK_REGISTRY.with(|reg| {
        reg.borrow()
            .get(&this)
            .and_then(|h| h.on_attached.clone())
    });
    if let Some(hook) = hook {
        hook(this, ancestor);
    }
}

/// Invoke `on_detached(this, ancestor)` if registered.
pub(crate) fn fire_detached(this: usize, ancestor: usize) {
    let hook = HOOK_REGISTRY.with(|reg| {
        reg.borrow()
            .get(&this)
            .and_then(|h| h.on_detached.clone())
    });
    if let Some(hook) = hook {
        hook(this, ancestor);
    }
}

/// Reset hook state (for testing).
pub fn reset_hooks() {
    HOOK_REGISTRY.with(|reg| reg.borrow_mut().clear());
}
