//! Shared state for command handlers

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use errbrake::config::{ConfigManager, CONFIG_DIR, CONFIG_FILE};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

/// CLI execution context containing shared dependencies and configuration
#[derive(Clone)]
pub struct CliContext {
    pub project_path: Option<PathBuf>,
    pub verbose: bool,
    pub config_manager: Arc<ConfigManager>,
}

impl CliContext {
    pub fn new(project_path: Option<PathBuf>, verbose: bool) -> Result<Self> {
        let project_path = Self::checked_project_path(project_path)?;
        let config_manager = ConfigManager::new(project_path.clone())
            .context("Failed to load configuration")?;

        Ok(Self {
            project_path,
            verbose,
            config_manager: Arc::new(config_manager),
        })
    }

    /// Context that does not read any config file
    ///
    /// Used by `init`, which must work even when the existing file is broken.
    pub fn with_default_config(project_path: Option<PathBuf>, verbose: bool) -> Result<Self> {
        let project_path = Self::checked_project_path(project_path)?;
        let config_path = ConfigManager::get_config_path(project_path.clone())?;

        Ok(Self {
            project_path,
            verbose,
            config_manager: Arc::new(ConfigManager::with_defaults(config_path)),
        })
    }

    fn checked_project_path(project_path: Option<PathBuf>) -> Result<Option<PathBuf>> {
        if let Some(path) = &project_path {
            if !path.is_dir() {
                anyhow::bail!("Project path does not exist: {}", path.display());
            }
        }
        Ok(Self::resolve_project_path(project_path))
    }

    /// Explicit path, else the current directory if it has a project config
    fn resolve_project_path(project_path: Option<PathBuf>) -> Option<PathBuf> {
        if project_path.is_some() {
            return project_path;
        }

        let current_dir = std::env::current_dir().ok()?;
        current_dir
            .join(CONFIG_DIR)
            .join(CONFIG_FILE)
            .exists()
            .then_some(current_dir)
    }

    /// Install the tracing subscriber
    ///
    /// Logs go to stderr so stdout stays reserved for command output. When
    /// `logging.log_path` is set, a daily-rolling file layer is added; the
    /// returned guard must live until the process exits.
    pub fn init_logging(&self) -> Result<Option<WorkerGuard>> {
        let logging = &self.config_manager.config().logging;
        let level = if self.verbose { "debug" } else { logging.level.as_str() };
        let env_filter = EnvFilter::from_default_env()
            .add_directive(level.parse().unwrap_or_else(|_| tracing::Level::INFO.into()));

        let console_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

        let (file_layer, guard) = match &logging.log_path {
            Some(log_path) => {
                let log_path = Path::new(log_path);
                let directory = log_path.parent().unwrap_or_else(|| Path::new("."));
                std::fs::create_dir_all(directory).context("Failed to create log directory")?;

                let file_appender = tracing_appender::rolling::daily(
                    directory,
                    log_path
                        .file_name()
                        .unwrap_or_else(|| std::ffi::OsStr::new("errbrake.log")),
                );
                let (file_writer, guard) = tracing_appender::non_blocking(file_appender);
                let layer = tracing_subscriber::fmt::layer()
                    .with_writer(file_writer)
                    .with_ansi(false);
                (Some(layer), Some(guard))
            }
            None => (None, None),
        };

        tracing_subscriber::registry()
            .with(env_filter)
            .with(console_layer)
            .with(file_layer)
            .try_init()
            .context("Failed to initialize logging")?;

        if self.verbose {
            tracing::debug!("Verbose logging enabled");
            tracing::debug!("Project path: {:?}", self.project_path);
            tracing::debug!("Config path: {}", self.config_manager.config_path().display());
        }

        Ok(guard)
    }
}
