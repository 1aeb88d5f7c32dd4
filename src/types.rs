//! Core types for spark-tree.
//!
//! These types define what a component is (its kind and capabilities) and
//! how ancestors are matched during lookup (the monitor key).

use std::fmt;

// =============================================================================
// Component Kinds
// =============================================================================

/// Component kinds for the parallel arrays pattern.
///
/// Each component at index i has kind[i] set to one of these.
/// Only containers may hold children.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum ComponentKind {
    #[default]
    None = 0,
    Leaf = 1,
    Container = 2,
}

impl ComponentKind {
    /// Whether components of this kind can hold children.
    #[inline]
    pub fn is_container(self) -> bool {
        matches!(self, ComponentKind::Container)
    }
}

// =============================================================================
// Capabilities (bitflags)
// =============================================================================

bitflags::bitflags! {
    /// Capability tags carried by a component.
    ///
    /// Ancestor lookups match on these. Combine with bitwise OR:
    /// `Capability::SCOPE | Capability::SERVICE`. Bits above the named ones
    /// are free for application-defined tags (`Capability::from_bits_retain`).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Capability: u32 {
        const NONE = 0;
        const CONTAINER = 1 << 0;
        const SCOPE = 1 << 1;
        const SERVICE = 1 << 2;
        const SESSION = 1 << 3;
        const APPLICATION = 1 << 4;

        // Application-defined tags.
        const _ = !0;
    }
}

impl Capability {
    /// Does a component with these capabilities satisfy `wanted`?
    ///
    /// An empty `wanted` set never matches.
    #[inline]
    pub fn satisfies(self, wanted: Capability) -> bool {
        !wanted.is_empty() && self.contains(wanted)
    }
}

// =============================================================================
// Monitor Key
// =============================================================================

/// Predicate used to match ancestors during lookup and monitoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MonitorKey {
    /// The topmost ancestor, whatever it is.
    Root,
    /// The nearest ancestor carrying every bit of the given capability set.
    Capability(Capability),
}

impl MonitorKey {
    /// Shorthand for `MonitorKey::Capability(cap)`.
    pub const fn of(cap: Capability) -> Self {
        MonitorKey::Capability(cap)
    }
}

impl From<Capability> for MonitorKey {
    fn from(cap: Capability) -> Self {
        MonitorKey::Capability(cap)
    }
}

impl fmt::Display for MonitorKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MonitorKey::Root => write!(f, "root"),
            MonitorKey::Capability(cap) => write!(f, "{:?}", cap),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
