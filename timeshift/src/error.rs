//! Error types for level loading and configuration.
//!
//! Runtime failures inside a running level (malformed objects, missing groups,
//! stuck switches, unknown view zones) are never errors; they degrade to
//! "skip" or "do nothing". Only the inputs handed to the level can be rejected.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LevelError {
    #[error("invalid config value for `{field}`: {reason}")]
    InvalidConfig { field: &'static str, reason: String },

    #[error("failed to parse level data: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("failed to read level data: {0}")]
    Io(#[from] std::io::Error),
}

impl LevelError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field,
            reason: reason.into(),
        }
    }
}
