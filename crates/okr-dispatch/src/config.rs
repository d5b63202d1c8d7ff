//! Dispatch configuration
//!
//! Loaded from TOML:
//!
//! ```toml
//! [memory]
//! max_conversations = 10000
//! idle_timeout_secs = 3600
//! ```

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Top-level dispatch configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Conversation memory retention
    pub memory: MemoryConfig,
}

impl DispatchConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse from TOML text and validate
    ///
    /// # Errors
    /// Returns `ConfigError::Parse` for malformed TOML and
    /// `ConfigError::Invalid` for out-of-range values.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file
    ///
    /// # Errors
    /// Returns `ConfigError::Io` if the file cannot be read, otherwise as
    /// [`DispatchConfig::from_toml_str`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// With memory configuration
    #[inline]
    #[must_use]
    pub fn with_memory(mut self, memory: MemoryConfig) -> Self {
        self.memory = memory;
        self
    }

    /// Check value ranges
    ///
    /// # Errors
    /// Returns `ConfigError::Invalid` describing the first bad value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.memory.validate()
    }
}

/// Conversation memory retention
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryConfig {
    /// Maximum number of conversations kept; least valuable are evicted first
    pub max_conversations: u64,
    /// Evict a conversation after this many seconds without a read or write;
    /// `0` disables idle eviction
    pub idle_timeout_secs: Option<u64>,
}

impl MemoryConfig {
    /// With conversation capacity
    #[inline]
    #[must_use]
    pub fn with_max_conversations(mut self, max: u64) -> Self {
        self.max_conversations = max;
        self
    }

    /// With idle timeout
    #[inline]
    #[must_use]
    pub fn with_idle_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.idle_timeout_secs = timeout.map(|t| t.as_secs());
        self
    }

    /// Idle timeout as a duration, `None` when disabled
    #[inline]
    #[must_use]
    pub fn idle_timeout(&self) -> Option<Duration> {
        self.idle_timeout_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_conversations == 0 {
            return Err(ConfigError::Invalid(
                "memory.max_conversations must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            max_conversations: 10_000,
            idle_timeout_secs: Some(60 * 60 * 24),
        }
    }
}
