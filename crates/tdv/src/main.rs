//! tdv - Sentient Trader development CLI
//!
//! Provisions the local development environment and supervises the
//! platform's backend and frontend processes.

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

mod cli;
mod commands;

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive("tdv=info".parse()?))
        .init();

    let cli = Cli::parse();

    // Load configuration
    let config = tdv_core::Config::load()?;

    // Execute command
    match cli.command {
        Commands::Start => commands::start::execute(&config).await,
        Commands::Stop => commands::stop::execute(&config).await,
        Commands::Status => commands::status::execute(&config).await,
        Commands::Doctor => commands::doctor::execute(&config).await,
        Commands::Version => {
            println!("tdv {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}
