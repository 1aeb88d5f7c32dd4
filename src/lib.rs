//! # spark-tree
//!
//! Component tree with cached ancestor lookup and attach/detach monitors.
//!
//! ## Architecture
//!
//! spark-tree uses a parallel arrays architecture where components are
//! indices into columnar arrays rather than objects. Containers hold named
//! children; every component keeps a non-owning parent index and a small
//! per-key cache of ancestor lookups.
//!
//! ```text
//! lookup(key)  → cache hit? → target
//!              → walk parents → cache {target, depth, path}
//!
//! set_parent   → collect (detaching / attaching) → replay hooks once
//! ```
//!
//! Tree state is per thread: each thread owns an independent tree.
//!
//! ## Example
//!
//! ```
//! use spark_tree::{add_child, create_container, create_leaf, lookup_path, monitor};
//! use spark_tree::{Capability, MonitorHooks, MonitorKey, set_hooks};
//!
//! let app = create_container(Some("app"), Capability::SERVICE);
//! let button = create_leaf(Some("button"), Capability::NONE);
//!
//! set_hooks(button, MonitorHooks::new().on_attached(|this, service| {
//!     println!("{this} attached to service {service}");
//! }));
//! monitor(button, MonitorKey::of(Capability::SERVICE)).unwrap();
//!
//! add_child(app, "button", button).unwrap();
//! assert_eq!(
//!     lookup_path(button, MonitorKey::of(Capability::SERVICE)).unwrap().as_deref(),
//!     Some("/app/button"),
//! );
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Component kinds, capability flags, monitor keys
//! - [`engine`] - Registry, parallel arrays, lookup, propagation, reparenting, cloning
//! - [`state`] - Attached/detached hooks
//! - [`handle`] - Typed component handle (refuses serialization)
//! - [`config`] - Path separator and walk bound
//! - [`error`] - Error taxonomy

pub mod config;
pub mod engine;
pub mod error;
pub mod handle;
pub mod state;
pub mod types;

// Re-export commonly used items
pub use types::*;

pub use config::{config, configure, TreeConfig};

pub use error::{Refusal, Result, TreeError};

pub use engine::{
    // Registry
    create_component, create_container, create_leaf, release_component, on_release,
    is_allocated, get_allocated_indices, get_name, get_parent, get_kind, get_capabilities,
    reset_tree,
    // Container
    accept_child, add_child, remove_child, children, child_named,
    // Monitor
    lookup, require, lookup_path, lookup_depth, monitor, unmonitor, is_monitored, monitored_keys,
    // Propagation
    refresh_monitors, RefreshMode, MonitorEvent,
    // Reparent
    set_parent,
    // Clone
    clone_component, clone_target_for, is_cloning, CloneTarget,
};

pub use handle::ComponentHandle;

pub use state::{set_hooks, clear_hooks, MonitorHook, MonitorHooks};
