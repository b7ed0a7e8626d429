//! gmond-bridge - Ganglia telemetry to message-bus bridge
//!
//! # Usage
//!
//! ```bash
//! # Run the bridge (default)
//! gmond-bridge
//! gmond-bridge --config configs/bridge.toml
//!
//! # Explicit subcommand
//! gmond-bridge serve --config configs/bridge.toml
//! ```

mod cmd;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Bridges gmond telemetry onto a message bus as normalized metric events
#[derive(Parser, Debug)]
#[command(name = "gmond-bridge")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    // Args that apply to serve when no subcommand is given
    /// Path to configuration file
    #[arg(short, long, default_value = "configs/bridge.toml")]
    config: std::path::PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the bridge
    Serve(cmd::serve::ServeArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        // Explicit subcommand
        Some(Command::Serve(args)) => {
            init_logging(&args.log_level)?;
            cmd::serve::run(args).await
        }
        // No subcommand = run the bridge (default behavior)
        None => {
            init_logging(&cli.log_level)?;
            let args = cmd::serve::ServeArgs {
                config: cli.config,
                log_level: cli.log_level,
            };
            cmd::serve::run(args).await
        }
    }
}

/// Initialize the tracing subscriber for logging
fn init_logging(level: &str) -> Result<()> {
    let filter = EnvFilter::try_new(level)
        .or_else(|_| EnvFilter::try_new("info"))
        .map_err(|e| anyhow::anyhow!("invalid log level: {}", e))?;

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_thread_ids(false))
        .with(filter)
        .init();

    Ok(())
}
