//! assistd CLI — the main entry point.
//!
//! Commands:
//! - `serve`    — Start the assistants API server
//! - `onboard`  — Write a default config file
//! - `status`   — Show the effective configuration

use assistd_config::{AppConfig, LogFormat, LoggingConfig};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(
    name = "assistd",
    about = "assistd — assistants API server backed by persistent agents",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API server
    Serve {
        /// Override the port
        #[arg(short, long, env = "ASSISTD_PORT")]
        port: Option<u16>,
    },

    /// Initialize the configuration directory and file
    Onboard,

    /// Show the effective configuration
    Status,
}

/// Install the global subscriber. `RUST_LOG` wins over config and `--verbose`.
fn init_tracing(verbose: bool, logging: &LoggingConfig) {
    let default_filter = if verbose { "debug" } else { logging.filter.as_str() };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);
    if logging.format == LogFormat::Json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let cli = Cli::parse();

    let config = AppConfig::load();
    let logging = config
        .as_ref()
        .map(|c| c.logging.clone())
        .unwrap_or_default();
    init_tracing(cli.verbose, &logging);

    match cli.command {
        Commands::Onboard => commands::onboard::run()?,
        Commands::Serve { port } => {
            let config = config.map_err(|e| format!("Failed to load config: {e}"))?;
            commands::serve::run(config, port).await?
        }
        Commands::Status => {
            let config = config.map_err(|e| format!("Failed to load config: {e}"))?;
            commands::status::run(&config)
        }
    }

    Ok(())
}
