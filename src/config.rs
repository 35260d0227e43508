//! Group configuration

use crate::error::ConfigError;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Configuration for a [`BindingGroup`](crate::BindingGroup).
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GroupConfig {
    /// Name used in log events.
    pub name: String,

    /// End an update pass at the first failing member instead of
    /// updating the rest.
    #[cfg_attr(feature = "serde", serde(default))]
    pub stop_on_error: bool,
}

impl GroupConfig {
    /// Create a configuration that updates every member each pass.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            stop_on_error: false,
        }
    }

    pub fn with_stop_on_error(mut self, stop: bool) -> Self {
        self.stop_on_error = stop;
        self
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::EmptyName);
        }
        Ok(())
    }
}

impl Default for GroupConfig {
    fn default() -> Self {
        Self::new("bindings")
    }
}
