//! Vigil CLI

mod cycle;
mod server;

use anyhow::Result;
use clap::{Parser, Subcommand};
use cycle::Cycle;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use vigil_config::{load_config, LoggingConfig};

/// Exit status of `vigil check` when the global verdict is KO
const UNHEALTHY_EXIT_CODE: i32 = 2;

#[derive(Parser)]
#[command(name = "vigil")]
#[command(about = "Vigil service-health monitor", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one monitoring cycle and write the report to every sink
    Check {
        /// Path to configuration file
        #[arg(short, long, default_value = "vigil.yaml")]
        config: PathBuf,

        /// Log level (trace, debug, info, warn, error); overrides the config file
        #[arg(short, long)]
        log_level: Option<String>,
    },

    /// Serve the health report over HTTP
    Serve {
        /// Path to configuration file
        #[arg(short, long, default_value = "vigil.yaml")]
        config: PathBuf,

        /// Listen address; overrides the config file
        #[arg(long)]
        listen: Option<SocketAddr>,

        /// Log level (trace, debug, info, warn, error); overrides the config file
        #[arg(short, long)]
        log_level: Option<String>,
    },

    /// Validate configuration file
    Validate {
        /// Path to configuration file
        #[arg(short, long, default_value = "vigil.yaml")]
        config: PathBuf,
    },

    /// Show version information
    Version,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Check { config, log_level } => {
            let config = load_config(&config)?;
            init_tracing(&config.observability.logging, log_level.as_deref())?;

            let cycle = Cycle::from_config(&config)?;
            tracing::info!(checks = cycle.check_count(), "Running monitoring cycle");

            let report = cycle.run_and_log();
            if !report.is_healthy() {
                tracing::warn!("Global status: {}", report.global_label());
                std::process::exit(UNHEALTHY_EXIT_CODE);
            }
            tracing::info!("Global status: {}", report.global_label());
            Ok(())
        }

        Commands::Serve {
            config,
            listen,
            log_level,
        } => {
            let config = load_config(&config)?;
            init_tracing(&config.observability.logging, log_level.as_deref())?;

            let listen = listen.unwrap_or(config.server.listen);
            let cycle = Arc::new(Cycle::from_config(&config)?);
            tracing::info!(checks = cycle.check_count(), "Starting health endpoint");

            server::serve(cycle, listen).await
        }

        Commands::Validate { config } => {
            tracing_subscriber::fmt()
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();

            tracing::info!("Validating configuration: {}", config.display());

            match load_config(&config) {
                Ok(cfg) => {
                    tracing::info!("✓ Configuration is valid");
                    tracing::info!("  Sinks: {}", cfg.sinks.len());
                    tracing::info!("  Services: {}", cfg.services.len());
                    tracing::info!("  Tests: {}", cfg.tests.len());
                    Ok(())
                }
                Err(e) => {
                    tracing::error!("✗ Configuration validation failed: {}", e);
                    std::process::exit(1);
                }
            }
        }

        Commands::Version => {
            println!("Vigil service-health monitor");
            println!("Version: {}", env!("CARGO_PKG_VERSION"));
            println!("Rust version: {}", env!("CARGO_PKG_RUST_VERSION"));
            Ok(())
        }
    }
}

fn init_tracing(logging: &LoggingConfig, level_override: Option<&str>) -> Result<()> {
    let level = level_override.unwrap_or(&logging.level);
    let filter = match level.to_lowercase().as_str() {
        "trace" => tracing::Level::TRACE,
        "debug" => tracing::Level::DEBUG,
        "info" => tracing::Level::INFO,
        "warn" => tracing::Level::WARN,
        "error" => tracing::Level::ERROR,
        _ => tracing::Level::INFO,
    };
    let env_filter = tracing_subscriber::EnvFilter::from_default_env().add_directive(filter.into());

    // Logs go to stderr so an `echo` sink on stdout stays clean
    let registry = tracing_subscriber::registry().with(env_filter);
    if logging.format.eq_ignore_ascii_case("json") {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .with_level(true)
                    .with_writer(std::io::stderr),
            )
            .init();
    }

    Ok(())
}
