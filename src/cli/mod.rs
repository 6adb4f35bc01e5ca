//! Command-line interface: argument parsing, logging setup and routing

pub mod commands;
pub mod context;
pub mod handlers;

use anyhow::Result;
use clap::Parser;

pub use commands::{Cli, Commands, ConfigAction};
pub use context::CliContext;
pub use handlers::CommandHandler;

pub struct CliApp;

impl CliApp {
    /// Parse command line arguments and execute the requested command
    pub async fn run() -> Result<()> {
        let cli = Cli::parse();

        let context = match cli.command {
            Commands::Init { .. } => CliContext::with_default_config(cli.project.clone(), cli.verbose)?,
            _ => CliContext::new(cli.project.clone(), cli.verbose)?,
        };
        let _log_guard = context.init_logging()?;

        let handler = CommandHandler::new(context);
        handler.handle_command(cli.command).await
    }
}
