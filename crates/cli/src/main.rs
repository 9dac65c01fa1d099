//! SmartFlow CLI: the main entry point.
//!
//! Commands:
//! - `serve`  : Start the HTTP API server
//! - `chat`   : Run one agent turn from the terminal
//! - `tools`  : List the registered tools
//! - `config` : Print the effective configuration

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(
    name = "smartflow",
    about = "SmartFlow: LLM agent orchestration service",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    /// Config file to load instead of ~/.smartflow/config.toml
    #[arg(short, long, global = true, env = "SMARTFLOW_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API server
    Serve {
        /// Override the bind host
        #[arg(long)]
        host: Option<String>,

        /// Override the port
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Send one message through the agent
    Chat {
        /// The message to send
        #[arg(short, long)]
        message: String,

        /// auto, react or plan_execute
        #[arg(long, default_value = "auto")]
        mode: String,

        /// Session to read history from and append to
        #[arg(short, long, default_value = "default")]
        session: String,

        /// Ground the answer in the knowledge base
        #[arg(long)]
        rag: bool,

        /// Knowledge base collection used with --rag
        #[arg(long, default_value = "default")]
        collection: String,
    },

    /// List the registered tools
    Tools,

    /// Print the effective configuration (secrets redacted)
    Config,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter));
    if cli.log_json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(env_filter)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .init();
    }

    let config_path = cli.config.as_deref();
    match cli.command {
        Commands::Serve { host, port } => commands::serve::run(config_path, host, port).await?,
        Commands::Chat {
            message,
            mode,
            session,
            rag,
            collection,
        } => {
            let request = commands::chat::ChatArgs {
                message,
                mode,
                session,
                rag,
                collection,
            };
            commands::chat::run(config_path, request).await?
        }
        Commands::Tools => commands::tools::run()?,
        Commands::Config => commands::config::run(config_path)?,
    }

    Ok(())
}
