//! Component Tree - Parallel Arrays
//!
//! All component state lives in these parallel arrays.
//! Each array index corresponds to one component.
//!
//! # Array Categories
//!
//! - **core**: Kind, capabilities, name, parent link, children
//! - **monitors**: Per-key ancestor lookup cache and monitor registrations

pub mod core;
pub mod monitors;

use self::core as core_arrays;
use self::monitors as monitor_arrays;

/// Ensure all arrays have capacity for the given index.
///
/// Called by registry when allocating.
pub fn ensure_all_capacity(index: usize) {
    core_arrays::ensure_capacity(index);
    monitor_arrays::ensure_capacity(index);
}

/// Clear all array values at an index.
///
/// Called by registry when releasing.
pub fn clear_all_at_index(index: usize) {
    core_arrays::clear_at_index(index);
    monitor_arrays::clear_at_index(index);
}

/// Reset all parallel arrays to release memory.
///
/// Called automatically when the last component is released.
pub fn reset_all_arrays() {
    core_arrays::reset();
    monitor_arrays::reset();
}
