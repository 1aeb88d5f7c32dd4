//! State Module - Runtime state attached to components
//!
//! - **Hooks** - attached/detached extension points fired by monitor propagation

pub mod hooks;

pub use hooks::{clear_hooks, has_hooks, reset_hooks, set_hooks, MonitorHook, MonitorHooks};
