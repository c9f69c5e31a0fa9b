//! Runtime settings of a graph instance.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Limits and switches applied by a [`GraphInstance`][crate::GraphInstance].
///
/// Missing fields take their default when deserializing, so a settings file
/// only needs to name what it changes.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    /// The deepest chain of output-to-input propagation before a branch is
    /// abandoned with an error.
    pub max_trigger_depth: usize,
    /// The deepest chain of nested data-pin resolution before the query fails.
    pub max_resolve_depth: usize,
    /// Whether diagnostics are kept in the host's message log in addition to
    /// being emitted through `log`.
    pub record_messages: bool,
}

impl Settings {
    pub const DEFAULT_MAX_TRIGGER_DEPTH: usize = 256;
    pub const DEFAULT_MAX_RESOLVE_DEPTH: usize = 64;

    /// Parse settings from RON.
    pub fn from_ron_str(s: &str) -> Result<Self, ConfigError> {
        Ok(ron::from_str(s)?)
    }

    /// Read and parse a RON settings file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let s = std::fs::read_to_string(path)?;
        Self::from_ron_str(&s)
    }

    /// Serialize to pretty RON.
    pub fn to_ron_string(&self) -> Result<String, ron::Error> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
    }
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            max_trigger_depth: Self::DEFAULT_MAX_TRIGGER_DEPTH,
            max_resolve_depth: Self::DEFAULT_MAX_RESOLVE_DEPTH,
            record_messages: true,
        }
    }
}
