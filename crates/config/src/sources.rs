//! Source configuration sections

use serde::Deserialize;

use crate::error::{ConfigError, Result};

/// Ingest front end configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SourcesConfig {
    /// Binary packet source (UDP)
    pub packet: PacketSourceConfig,

    /// XML snapshot source (TCP)
    pub snapshot: SnapshotSourceConfig,
}

/// Binary packet source section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PacketSourceConfig {
    /// Whether this source runs
    pub enabled: bool,

    /// Bind address
    pub address: String,

    /// Listen port
    pub port: u16,

    /// Socket receive buffer size
    pub buffer_size: usize,

    /// Maximum accepted datagram size
    pub max_packet_size: usize,

    /// Idle seconds before an agent's correlation state is dropped
    pub agent_idle_secs: u64,
}

impl Default for PacketSourceConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            address: "0.0.0.0".to_string(),
            port: 8649,
            buffer_size: 64 * 1024,
            max_packet_size: 8192,
            agent_idle_secs: 600,
        }
    }
}

impl PacketSourceConfig {
    /// Validate this section
    pub fn validate(&self) -> Result<()> {
        if self.enabled && self.max_packet_size == 0 {
            return Err(ConfigError::invalid_value(
                "source",
                "packet",
                "max_packet_size",
                "must be positive",
            ));
        }
        if self.enabled && self.agent_idle_secs == 0 {
            return Err(ConfigError::invalid_value(
                "source",
                "packet",
                "agent_idle_secs",
                "must be positive",
            ));
        }
        Ok(())
    }
}

/// XML snapshot source section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SnapshotSourceConfig {
    /// Whether this source runs
    pub enabled: bool,

    /// Bind address
    pub address: String,

    /// Listen port
    pub port: u16,

    /// Maximum accepted document size
    pub max_document_size: usize,

    /// Per-read timeout for a pushing peer, in seconds
    pub read_timeout_secs: u64,
}

impl Default for SnapshotSourceConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            address: "0.0.0.0".to_string(),
            port: 8651,
            max_document_size: 16 * 1024 * 1024,
            read_timeout_secs: 30,
        }
    }
}

impl SnapshotSourceConfig {
    /// Validate this section
    pub fn validate(&self) -> Result<()> {
        if self.enabled && self.max_document_size == 0 {
            return Err(ConfigError::invalid_value(
                "source",
                "snapshot",
                "max_document_size",
                "must be positive",
            ));
        }
        if self.enabled && self.read_timeout_secs == 0 {
            return Err(ConfigError::invalid_value(
                "source",
                "snapshot",
                "read_timeout_secs",
                "must be positive",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_packet_defaults() {
        let config = PacketSourceConfig::default();
        assert!(config.enabled);
        assert_eq!(config.port, 8649);
        assert_eq!(config.max_packet_size, 8192);
    }

    #[test]
    fn test_packet_zero_max_size_rejected() {
        let config = PacketSourceConfig {
            max_packet_size: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_disabled_section_skips_validation() {
        let config = SnapshotSourceConfig {
            enabled: false,
            max_document_size: 0,
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }
}
