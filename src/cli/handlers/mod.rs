//! Command handlers for all CLI operations

mod config;
mod format;

use anyhow::Result;

use super::{CliContext, Commands};
pub use config::ConfigHandler;
pub use format::FormatHandler;
pub use test::TestHandler;

/// Routes parsed commands to their handlers
pub struct CommandHandler {
    context: CliContext,
}

impl CommandHandler {
    pub fn new(context: CliContext) -> Self {
        Self { context }
    }

    pub async fn handle_command(&self, command: Commands) -> Result<()> {
        match command {
            Commands::Init { global, force } => {
                ConfigHandler::new(&self.context).handle_init(global, force)
            }
            Commands::Config { action } => ConfigHandler::new(&self.context).handle_config(action),
            Commands::Test {
                message,
                kind,
                expected,
                dry_run,
            } => {
                TestHandler::new(&self.context)
                    .handle_test(&kind, &message, expected, dry_run)
                    .await
            }
            Commands::Format => FormatHandler::new().handle_format(),
        }
    }
}
