//! Tree Engine - Component registry, parent links and monitor caches.
//!
//! The engine manages the core data structures:
//! - Registry: Index allocation, free pool, subtree release
//! - Arrays: Parallel arrays for kind, name, parent, children and monitors
//! - Container: Child validation and named child management
//! - Monitor: Cached ancestor lookup and monitor registration
//! - Propagate: Subtree cache invalidation and hook replay
//! - Reparent: The single parent-link mutator
//! - Clone: Subtree copies with parent redirection
//!
//! # Architecture
//!
//! Components are NOT objects. They are indices into parallel arrays:
//!
//! ```text
//! Index 0: Container (parent=None, name="app",    caps=SERVICE)
//! Index 1: Container (parent=0,    name="panel",  caps=SCOPE)
//! Index 2: Leaf      (parent=1,    name="button", monitors={SERVICE → 0 @ depth 2})
//! ```
//!
//! The parent link is a plain index, never an owning pointer: ownership
//! flows from container to children only.

mod clone;
mod container;
mod monitor;
mod propagate;
mod registry;
mod reparent;
pub mod arrays;

pub use clone::*;
pub use container::*;
pub use monitor::*;
pub use propagate::*;
pub use registry::*;
pub use reparent::*;
