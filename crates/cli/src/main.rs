//! Darkroom CLI - database migrations and demo data.
//!
//! # Usage
//!
//! ```bash
//! # Apply database migrations
//! darkroom migrate
//!
//! # Load the demo catalog and default pricing
//! darkroom seed
//! ```
//!
//! Both commands read `DARKROOM_DATABASE_URL` (or `DATABASE_URL`), from the
//! environment or a `.env` file.

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "darkroom")]
#[command(author, version, about = "Darkroom print store CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Seed the demo catalog and default pricing
    Seed,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Migrate => commands::migrate::run().await,
        Commands::Seed => commands::seed::run().await,
    };

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}
