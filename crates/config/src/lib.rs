//! gmond-bridge configuration
//!
//! TOML-based configuration loading with sensible defaults.
//! Minimal config should just work - only specify what you need to change.
//!
//! # Parsing
//!
//! Use the `FromStr` trait to parse configuration:
//!
//! ```
//! use gmond_config::Config;
//! use std::str::FromStr;
//!
//! let config = Config::from_str("[sink]\ntype = \"null\"").unwrap();
//! ```
//!
//! # Example Minimal Config
//!
//! ```toml
//! [sources.packet]
//! port = 8649
//!
//! [sink]
//! type = "stdout"
//! ```

mod error;
mod logging;
mod sink;
mod sources;

use std::fs;
use std::path::Path;
use std::str::FromStr;

pub use error::{ConfigError, Result};
pub use logging::LogConfig;
pub use sink::{SinkConfig, SinkKind};
pub use sources::{PacketSourceConfig, SnapshotSourceConfig, SourcesConfig};

use serde::Deserialize;

/// Main configuration structure
///
/// All sections are optional with sensible defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Logging configuration
    pub log: LogConfig,

    /// Ingest front ends (binary packets, XML snapshots)
    pub sources: SourcesConfig,

    /// Event sink and topic
    pub sink: SinkConfig,
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read, contains invalid TOML, or
    /// fails validation.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::IoError {
            path: path.display().to_string(),
            source: e,
        })?;
        contents.parse()
    }

    /// Validate cross-section constraints
    pub fn validate(&self) -> Result<()> {
        if !self.sources.packet.enabled && !self.sources.snapshot.enabled {
            return Err(ConfigError::NoSourcesEnabled);
        }

        if self.sources.packet.enabled
            && self.sources.snapshot.enabled
            && self.sources.packet.port == self.sources.snapshot.port
            && self.sources.packet.address == self.sources.snapshot.address
        {
            return Err(ConfigError::duplicate_port(
                self.sources.packet.port,
                "packet, snapshot",
            ));
        }

        self.sources.packet.validate()?;
        self.sources.snapshot.validate()?;
        self.sink.validate()?;

        Ok(())
    }
}

impl FromStr for Config {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        let config: Config = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_has_defaults() {
        let config: Config = "".parse().unwrap();
        assert_eq!(config.log.level, "info");
        assert!(config.sources.packet.enabled);
        assert!(config.sources.snapshot.enabled);
        assert_eq!(config.sink.topic, "gmond");
    }

    #[test]
    fn test_minimal_config() {
        let config: Config = "[sources.packet]\nport = 9649\n".parse().unwrap();
        assert_eq!(config.sources.packet.port, 9649);
        // Everything else keeps its default
        assert_eq!(config.sources.snapshot.port, 8651);
    }

    #[test]
    fn test_no_sources_enabled_is_rejected() {
        let result: Result<Config> = "[sources.packet]\nenabled = false\n\
             [sources.snapshot]\nenabled = false\n"
            .parse();
        assert!(matches!(result, Err(ConfigError::NoSourcesEnabled)));
    }

    #[test]
    fn test_duplicate_port_is_rejected() {
        let result: Result<Config> = "[sources.packet]\nport = 9000\n\
             [sources.snapshot]\nport = 9000\n"
            .parse();
        assert!(matches!(result, Err(ConfigError::DuplicatePort { port: 9000, .. })));
    }

    #[test]
    fn test_same_port_on_disabled_source_is_fine() {
        let config: Config = "[sources.packet]\nport = 9000\nenabled = false\n\
             [sources.snapshot]\nport = 9000\n"
            .parse()
            .unwrap();
        assert!(!config.sources.packet.enabled);
    }

    #[test]
    fn test_invalid_toml_is_a_parse_error() {
        let result: Result<Config> = "not = [valid".parse();
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_full_config_round() {
        let config: Config = r#"
[log]
level = "debug"

[sources.packet]
address = "127.0.0.1"
port = 8649
max_packet_size = 4096
agent_idle_secs = 300

[sources.snapshot]
port = 8651
max_document_size = 1048576
read_timeout_secs = 10

[sink]
type = "null"
topic = "metrics"
"#
        .parse()
        .unwrap();

        assert_eq!(config.log.level, "debug");
        assert_eq!(config.sources.packet.max_packet_size, 4096);
        assert_eq!(config.sources.snapshot.read_timeout_secs, 10);
        assert_eq!(config.sink.kind, SinkKind::Null);
        assert_eq!(config.sink.topic, "metrics");
    }
}
