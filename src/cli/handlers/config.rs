//! Configuration management handler

use std::path::PathBuf;

use anyhow::{Context, Result};
use errbrake::config::ConfigManager;

use crate::cli::{CliContext, ConfigAction};

/// Handler for `init` and `config`
pub struct ConfigHandler<'a> {
    context: &'a CliContext,
}

impl<'a> ConfigHandler<'a> {
    pub fn new(context: &'a CliContext) -> Self {
        Self { context }
    }

    /// Write a default config file unless one already exists
    ///
    /// With `force`, an existing file is replaced by defaults, whatever it held.
    pub fn handle_init(&self, global: bool, force: bool) -> Result<()> {
        let path = if global {
            None
        } else {
            Some(
                self.context
                    .project_path
                    .clone()
                    .unwrap_or_else(|| PathBuf::from(".")),
            )
        };

        let config_path = ConfigManager::get_config_path(path)?;
        if config_path.exists() && !force {
            println!("Configuration already initialized at: {}", config_path.display());
            println!("Use --force to overwrite");
            return Ok(());
        }

        ConfigManager::with_defaults(config_path.clone())
            .save()
            .with_context(|| format!("Failed to write {}", config_path.display()))?;

        println!("Configuration initialized successfully at: {}", config_path.display());
        Ok(())
    }

    pub fn handle_config(&self, action: ConfigAction) -> Result<()> {
        match action {
            ConfigAction::Show => {
                let config = self.context.config_manager.config();
                println!("{}", toml::to_string_pretty(config)?);
            }
            ConfigAction::Get { key } => {
                println!("{}", self.context.config_manager.config().get_value(&key)?);
            }
            ConfigAction::Set { key, value } => {
                // File values only; env overrides must not be persisted
                let mut config_manager = ConfigManager::load_file(self.context.project_path.clone())?;
                config_manager.config_mut().set_value(&key, &value)?;
                config_manager.save()?;
                println!("Configuration updated: {key} = {value}");
            }
        }
        Ok(())
    }
}
