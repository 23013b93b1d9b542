//! winiot-agent main entry point
//!
//! This binary serves as the main entry point for the control agent.
//! It handles CLI parsing, logging setup, and HTTP server startup.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use winiot_agent::{
    config::Config,
    control::{CommandHandler, ControlServer},
    APP_NAME, VERSION,
};

/// Config file read when `--config` is not given
const DEFAULT_CONFIG_FILE: &str = "winiot-agent.toml";

/// Local HTTP control surface for monitors and system audio
#[derive(Parser, Debug)]
#[command(name = APP_NAME, version = VERSION, about, long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP server
    Serve {
        /// Override the bind address
        #[arg(long)]
        host: Option<String>,

        /// Override the bind port
        #[arg(long)]
        port: Option<u16>,
    },

    /// Validate configuration and report collaborator availability
    Check,

    /// Show version information
    Version,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let explicit = cli.config.is_some();
    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
    let config = Config::load(&config_path, explicit);

    // Initialize logging
    let debug = config.as_ref().map(|c| c.server.debug).unwrap_or(false);
    init_logging(cli.verbose || debug);

    info!("Starting {} v{}", APP_NAME, VERSION);

    let result = match config {
        Ok(config) => run(cli, config).await,
        Err(e) => Err(e.into()),
    };

    // Execute command
    if let Err(e) = result {
        error!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Initialize structured logging with tracing
fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Run the CLI command
async fn run(cli: Cli, mut config: Config) -> anyhow::Result<()> {
    match cli.command {
        Commands::Serve { host, port } => {
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            config.validate()?;

            log_startup(&config);

            let handler = Arc::new(CommandHandler::from_config(&config));
            let server = ControlServer::new(config.bind_address(), handler);

            info!("Starting HTTP server on {}", server.bind_address());
            server.run(shutdown_signal()).await?;

            info!("Shutting down agent");
            Ok(())
        }
        Commands::Check => {
            log_startup(&config);

            let handler = CommandHandler::from_config(&config);
            let health = handler.health();

            println!("Configuration: OK");
            println!("Bind address: {}", config.bind_address());
            println!(
                "Monitor tool: {} (found: {})",
                handler.monitor_tool().executable().display(),
                health.monitor_tool_found
            );
            println!("Audio control: {}", handler.audio().subsystem().describe());
            Ok(())
        }
        Commands::Version => {
            println!("{} v{}", APP_NAME, VERSION);
            Ok(())
        }
    }
}

fn log_startup(config: &Config) {
    info!("API auth enabled: {}", config.auth.enabled);
    if config.auth.enabled {
        info!("API key configured (length): {}", config.auth.api_key.len());
    }
    if config.uses_placeholder_key() {
        warn!("API auth is enabled with the default placeholder key; set API_KEY");
    }
    info!("Command timeout: {}s", config.monitor.timeout_secs);
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            info!("Received SIGTERM signal");
        },
    }
}
