//! Serve command - run the bridge
//!
//! Wires configuration into the sink, the emitter, and the enabled ingest
//! front ends, then runs until ctrl-c.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;
use tokio_util::sync::CancellationToken;

use gmond_config::{Config, SinkKind};
use gmond_pipeline::{EventEmitter, EventSink};
use gmond_sinks::stdout::StdoutConfig;
use gmond_sinks::{NullSink, StdoutSink};
use gmond_sources::{PacketSource, PacketSourceConfig, SnapshotSource, SnapshotSourceConfig};

/// Arguments for the serve command
#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "configs/bridge.toml")]
    pub config: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    pub log_level: String,
}

/// Run the bridge until ctrl-c
pub async fn run(args: ServeArgs) -> Result<()> {
    let config = load_config(&args.config)?;

    let sink = build_sink(&config);
    let emitter = EventEmitter::new(config.sink.topic.clone(), Arc::clone(&sink));

    tracing::info!(
        sink = sink.name(),
        topic = %config.sink.topic,
        "bridge starting"
    );

    let cancel = CancellationToken::new();
    let mut handles = Vec::new();

    if config.sources.packet.enabled {
        let source = PacketSource::new(packet_config(&config), emitter.clone());
        let cancel = cancel.clone();
        handles.push(tokio::spawn(async move {
            if let Err(e) = source.run(cancel).await {
                tracing::error!(error = %e, "packet source failed");
            }
        }));
    }

    if config.sources.snapshot.enabled {
        let source = SnapshotSource::new(snapshot_config(&config), emitter.clone());
        let cancel = cancel.clone();
        handles.push(tokio::spawn(async move {
            if let Err(e) = source.run(cancel).await {
                tracing::error!(error = %e, "snapshot source failed");
            }
        }));
    }

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for shutdown signal")?;
    tracing::info!("shutdown signal received");
    cancel.cancel();

    for handle in handles {
        let _ = handle.await;
    }

    let snapshot = emitter.snapshot();
    tracing::info!(
        events = snapshot.events_emitted,
        bytes = snapshot.bytes_emitted,
        publish_errors = snapshot.publish_errors,
        "bridge stopped"
    );

    Ok(())
}

/// Load the config file, falling back to defaults when it does not exist
fn load_config(path: &PathBuf) -> Result<Config> {
    if path.exists() {
        let config = Config::from_file(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?;
        tracing::info!(path = %path.display(), "configuration loaded");
        Ok(config)
    } else {
        tracing::info!(
            path = %path.display(),
            "config file not found, using defaults"
        );
        Ok(Config::default())
    }
}

/// Build the configured sink
fn build_sink(config: &Config) -> Arc<dyn EventSink> {
    match config.sink.kind {
        SinkKind::Stdout => Arc::new(StdoutSink::with_config(StdoutConfig {
            color: config.sink.color,
        })),
        SinkKind::Null => Arc::new(NullSink::new()),
    }
}

/// Map the packet source section onto the runtime config
fn packet_config(config: &Config) -> PacketSourceConfig {
    let section = &config.sources.packet;
    PacketSourceConfig {
        address: section.address.clone(),
        port: section.port,
        buffer_size: section.buffer_size,
        max_packet_size: section.max_packet_size,
        agent_idle_timeout: Duration::from_secs(section.agent_idle_secs),
        ..Default::default()
    }
}

/// Map the snapshot source section onto the runtime config
fn snapshot_config(config: &Config) -> SnapshotSourceConfig {
    let section = &config.sources.snapshot;
    SnapshotSourceConfig {
        address: section.address.clone(),
        port: section.port,
        max_document_size: section.max_document_size,
        read_timeout: Duration::from_secs(section.read_timeout_secs),
        ..Default::default()
    }
}
