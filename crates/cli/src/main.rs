//! Cockpit CLI — the main entry point.
//!
//! Commands:
//! - `chat`     — Interactive chat (or a single message) over loaded files
//! - `onboard`  — Write the default config
//! - `models`   — List models offered by the configured provider

use clap::{Parser, Subcommand};

mod commands;
mod slash;
mod transcript;

#[derive(Parser)]
#[command(
    name = "cockpit",
    about = "Cockpit — terminal assistant with budgeted code context",
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
    /// Chat with the assistant
    Chat {
        /// Send a single message instead of entering interactive mode
        #[arg(short, long)]
        message: Option<String>,

        /// Load a file or directory before starting (repeatable)
        #[arg(short, long)]
        load: Vec<String>,

        /// Context mode: smart, full or summary
        #[arg(long)]
        mode: Option<String>,

        /// Model to use instead of the configured default
        #[arg(long)]
        model: Option<String>,
    },

    /// Initialize configuration
    Onboard,

    /// List available models
    Models,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Logs go to stderr so they never interleave with streamed answers
    let filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Chat {
            message,
            load,
            mode,
            model,
        } => {
            commands::chat::run(commands::chat::ChatOptions {
                message,
                load,
                mode,
                model,
            })
            .await?
        }
        Commands::Onboard => commands::onboard::run().await?,
        Commands::Models => commands::models::run().await?,
    }

    Ok(())
}
