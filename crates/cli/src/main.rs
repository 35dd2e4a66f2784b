//! SoulTurn CLI: the main entry point.
//!
//! Commands:
//! - `replay`: Run a scripted session through the turn coordinator
//! - `config`: Print or validate configuration

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "soulturn",
    about = "SoulTurn: turn coordination for conversational souls",
    version,
    author
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
    /// Replay a scripted session file
    Replay {
        /// Session TOML with perceptions and scripted answers
        session: PathBuf,

        /// Config file to use instead of ~/.soulturn/config.toml
        #[arg(short, long, env = "SOULTURN_CONFIG")]
        config: Option<PathBuf>,
    },

    /// Configuration management
    Config {
        /// Print the default configuration instead of the loaded one
        #[arg(long)]
        default: bool,

        /// Config file to use instead of ~/.soulturn/config.toml
        #[arg(short, long, env = "SOULTURN_CONFIG")]
        path: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    match cli.command {
        Commands::Replay { session, config } => {
            commands::replay::run(&session, config.as_deref()).await?
        }
        Commands::Config { default, path } => {
            if default {
                commands::config_cmd::print_default();
            } else {
                commands::config_cmd::show(path.as_deref())?;
            }
        }
    }

    Ok(())
}
