//! Sink configuration section

use serde::Deserialize;

use crate::error::{ConfigError, Result};

/// Which sink implementation events go to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SinkKind {
    /// Human-readable debug output
    Stdout,
    /// Discard everything
    Null,
}

/// Event sink section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SinkConfig {
    /// Sink implementation
    #[serde(rename = "type")]
    pub kind: SinkKind,

    /// Topic events are published on
    pub topic: String,

    /// Colored output (stdout sink only)
    pub color: bool,
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            kind: SinkKind::Stdout,
            topic: "gmond".to_string(),
            color: true,
        }
    }
}

impl SinkConfig {
    /// Validate this section
    pub fn validate(&self) -> Result<()> {
        if self.topic.is_empty() {
            return Err(ConfigError::invalid_value(
                "sink",
                "sink",
                "topic",
                "must not be empty",
            ));
        }
        Ok(())
    }
}
