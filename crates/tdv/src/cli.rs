//! CLI argument definitions using clap derive macros.

use clap::{Parser, Subcommand};

/// Sentient Trader development CLI
///
/// Provisions the local environment, starts dependency services, and
/// supervises the backend and frontend processes.
#[derive(Parser, Debug)]
#[command(name = "tdv")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Provision and start the full development stack
    Start,

    /// Stop a previously started stack
    Stop,

    /// Check the health of all components
    Status,

    /// Run prerequisite diagnostics
    Doctor,

    /// Show version
    Version,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_start_parses() {
        let cli = Cli::try_parse_from(["tdv", "start"]).unwrap();
        assert!(matches!(cli.command, Commands::Start));
    }

    #[test]
    fn test_unknown_command_is_rejected() {
        assert!(Cli::try_parse_from(["tdv", "deploy"]).is_err());
    }
}
