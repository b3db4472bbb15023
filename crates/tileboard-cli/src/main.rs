use std::sync::Arc;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "tileboard",
    about = "Real-time collaborative pixel canvas over WebSocket",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the canvas server
    Serve {
        /// Port to listen on (default: 8081)
        #[arg(long)]
        port: Option<u16>,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show the effective configuration
    Show,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .init();

    // Load config
    let config_path = cli
        .config
        .map(std::path::PathBuf::from)
        .unwrap_or_else(tileboard_core::config::Config::config_path);

    let config = tileboard_core::config::Config::load(&config_path)?;

    match cli.command {
        Commands::Serve { port } => {
            let port = port.unwrap_or_else(|| config.port());
            tracing::info!(
                "Starting tileboard: {}x{} canvas, {} colors",
                config.width(),
                config.height(),
                config.palette()
            );
            let state = Arc::new(tileboard_gateway::AppState::new(Arc::new(config)));
            tileboard_gateway::start_server(state, port).await?;
        }
        Commands::Config { action } => match action {
            ConfigAction::Show => {
                let json = serde_json::to_string_pretty(&config)?;
                println!("{json}");
            }
        },
    }

    Ok(())
}
