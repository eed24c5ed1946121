//! Room client configuration.
//!
//! Configuration can be built in code or loaded from TOML.
//!
//! # Example
//!
//! ```toml
//! user_id = "teacher"
//! room_id = "physics-101"
//! role = "creator"
//!
//! # Width of one backward history page
//! history_window_days = 365
//! backfill_on_join = true
//! ```

use std::path::{Path, PathBuf};

use roomsync_core::{Role, DEFAULT_HISTORY_WINDOW_MS};
use roomsync_types::{RoomId, UserId};
use serde::Deserialize;
use thiserror::Error;

const MS_PER_DAY: u64 = 24 * 60 * 60 * 1000;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file.
    #[error("failed to read config file {path}: {source}")]
    ReadError {
        /// Path that failed to read.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Failed to parse config.
    #[error("failed to parse config: {source}")]
    ParseError {
        /// Underlying TOML error.
        source: toml::de::Error,
    },

    /// Parsed but unusable.
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Settings for one room session.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RoomConfig {
    /// Local participant.
    pub user_id: UserId,
    /// Room (channel) to join.
    pub room_id: RoomId,
    /// Local role.
    pub role: Role,
    /// Width of one backward history page in days.
    #[serde(default = "default_history_window_days")]
    pub history_window_days: u32,
    /// Load one page of history while joining.
    #[serde(default = "default_backfill_on_join")]
    pub backfill_on_join: bool,
}

fn default_history_window_days() -> u32 {
    (DEFAULT_HISTORY_WINDOW_MS / MS_PER_DAY) as u32
}

fn default_backfill_on_join() -> bool {
    true
}

impl RoomConfig {
    /// Config with defaults for everything but identity.
    pub fn new(user_id: impl Into<UserId>, room_id: impl Into<RoomId>, role: Role) -> Self {
        Self {
            user_id: user_id.into(),
            room_id: room_id.into(),
            role,
            history_window_days: default_history_window_days(),
            backfill_on_join: default_backfill_on_join(),
        }
    }

    /// Set the history page width.
    pub fn with_history_window_days(mut self, days: u32) -> Self {
        self.history_window_days = days;
        self
    }

    /// Enable or disable history backfill during join.
    pub fn with_backfill_on_join(mut self, enabled: bool) -> Self {
        self.backfill_on_join = enabled;
        self
    }

    /// History page width in milliseconds.
    pub fn history_window_ms(&self) -> u64 {
        u64::from(self.history_window_days) * MS_PER_DAY
    }

    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(content).map_err(|e| ConfigError::ParseError { source: e })?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.user_id.as_str().is_empty() {
            return Err(ConfigError::Invalid("user_id must not be empty".into()));
        }
        if self.room_id.as_str().is_empty() {
            return Err(ConfigError::Invalid("room_id must not be empty".into()));
        }
        if self.history_window_days == 0 {
            return Err(ConfigError::Invalid(
                "history_window_days must be at least 1".into(),
            ));
        }
        Ok(())
    }
}
