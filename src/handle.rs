//! ComponentHandle - typed handle over a component index.
//!
//! Handles are the convenient way to pass components around application
//! code. They refuse to be serialized or deserialized: a component only has
//! meaning inside the live tree that owns it, and its parent link is a back
//! reference that cannot survive a round trip.

use serde::de::{self, Deserialize, Deserializer};
use serde::ser::{self, Serialize, Serializer};

use crate::engine::{self, RefreshMode};
use crate::error::{Result, TreeError};
use crate::state::hooks::{self, MonitorHooks};
use crate::types::{Capability, ComponentKind, MonitorKey};

/// Handle to a component in this thread's tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentHandle(usize);

impl ComponentHandle {
    /// Wrap an existing index.
    pub fn from_index(index: usize) -> Result<Self> {
        engine::ensure_allocated(index)?;
        Ok(Self(index))
    }

    /// Create a new parentless leaf.
    pub fn leaf(name: &str, capabilities: Capability) -> Self {
        Self(engine::create_leaf(Some(name), capabilities))
    }

    /// Create a new parentless container.
    pub fn container(name: &str, capabilities: Capability) -> Self {
        Self(engine::create_container(Some(name), capabilities))
    }

    pub fn index(self) -> usize {
        self.0
    }

    pub fn name(self) -> Option<String> {
        engine::get_name(self.0)
    }

    pub fn parent(self) -> Option<ComponentHandle> {
        engine::get_parent(self.0).map(Self)
    }

    pub fn kind(self) -> ComponentKind {
        engine::get_kind(self.0)
    }

    pub fn children(self) -> Vec<ComponentHandle> {
        engine::children(self.0).into_iter().map(Self).collect()
    }

    pub fn child(self, name: &str) -> Option<ComponentHandle> {
        engine::child_named(self.0, name).map(Self)
    }

    pub fn add(self, name: &str, child: ComponentHandle) -> Result<()> {
        engine::add_child(self.0, name, child.0)
    }

    pub fn remove(self, name: &str) -> Result<Option<ComponentHandle>> {
        Ok(engine::remove_child(self.0, name)?.map(Self))
    }

    pub fn set_parent(self, parent: Option<ComponentHandle>, name: Option<&str>) -> Result<()> {
        engine::set_parent(self.0, parent.map(|p| p.0), name)
    }

    pub fn lookup(self, key: impl Into<MonitorKey>) -> Result<Option<ComponentHandle>> {
        Ok(engine::lookup(self.0, key.into())?.map(Self))
    }

    pub fn require(self, key: impl Into<MonitorKey>) -> Result<ComponentHandle> {
        engine::require(self.0, key.into()).map(Self)
    }

    pub fn lookup_path(self, key: impl Into<MonitorKey>) -> Result<Option<String>> {
        engine::lookup_path(self.0, key.into())
    }

    pub fn root(self) -> Result<Option<ComponentHandle>> {
        self.lookup(MonitorKey::Root)
    }

    pub fn monitor(self, key: impl Into<MonitorKey>) -> Result<()> {
        engine::monitor(self.0, key.into())
    }

    pub fn unmonitor(self, key: impl Into<MonitorKey>) -> Result<()> {
        engine::unmonitor(self.0, key.into())
    }

    pub fn set_hooks(self, hooks: MonitorHooks) {
        hooks::set_hooks(self.0, hooks);
    }

    /// Re-run attaching propagation below this component.
    pub fn refresh(self) {
        engine::refresh_monitors(self.0, RefreshMode::Attaching);
    }

    pub fn clone_subtree(self) -> Result<ComponentHandle> {
        engine::clone_component(self.0).map(Self)
    }

    pub fn release(self) -> Result<()> {
        engine::release_component(self.0)
    }
}

impl Serialize for ComponentHandle {
    fn serialize<S: Serializer>(&self, _serializer: S) -> std::result::Result<S::Ok, S::Error> {
        Err(ser::Error::custom(TreeError::not_supported("serialization")))
    }
}

impl<'de> Deserialize<'de> for ComponentHandle {
    fn deserialize<D: Deserializer<'de>>(_deserializer: D) -> std::result::Result<Self, D::Error> {
        Err(de::Error::custom(TreeError::not_supported("deserialization")))
    }
}
