//! Tree configuration.
//!
//! Configuration is resolved in order of precedence:
//! 1. Values set with [`configure`] (usually parsed from TOML)
//! 2. Built-in defaults
//!
//! Like the rest of the tree state, the active configuration is per thread.

use std::cell::RefCell;

use serde::Deserialize;

use crate::error::{Result, TreeError};

// ─────────────────────────────────────────────────────────────────────────────
// Constants
// ─────────────────────────────────────────────────────────────────────────────

/// Separator placed before every name in a lookup path.
pub const DEFAULT_SEPARATOR: &str = "/";

/// Upper bound on edges walked by a single ancestor lookup.
pub const DEFAULT_MAX_DEPTH: usize = 4096;

// ─────────────────────────────────────────────────────────────────────────────
// Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Tree configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TreeConfig {
    /// Separator used when building lookup paths ("/" gives "/app/panel/button")
    pub separator: String,

    /// Upward walks give up after this many edges and report "not found"
    pub max_depth: usize,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            separator: DEFAULT_SEPARATOR.to_string(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl TreeConfig {
    /// Parse configuration from TOML text. Missing keys keep their defaults.
    ///
    /// ```
    /// use spark_tree::TreeConfig;
    ///
    /// let config = TreeConfig::from_toml_str("separator = \".\"").unwrap();
    /// assert_eq!(config.separator, ".");
    /// assert_eq!(config.max_depth, spark_tree::config::DEFAULT_MAX_DEPTH);
    /// ```
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: TreeConfig =
            toml::from_str(text).map_err(|e| TreeError::Config(e.to_string()))?;
        if config.max_depth == 0 {
            return Err(TreeError::Config("max_depth must be at least 1".into()));
        }
        Ok(config)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Active configuration
// ─────────────────────────────────────────────────────────────────────────────

thread_local! {
    static CONFIG: RefCell<TreeConfig> = RefCell::new(TreeConfig::default());
}

/// Replace the active configuration.
///
/// Paths already cached keep the separator they were built with.
pub fn configure(config: TreeConfig) {
    tracing::debug!(separator = %config.separator, max_depth = config.max_depth, "tree configured");
    CONFIG.with(|c| *c.borrow_mut() = config);
}

/// Get a copy of the active configuration.
pub fn config() -> TreeConfig {
    CONFIG.with(|c| c.borrow().clone())
}

/// Restore the default configuration.
pub fn reset_config() {
    CONFIG.with(|c| *c.borrow_mut() = TreeConfig::default());
}
