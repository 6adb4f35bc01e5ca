//! Command definitions and structures for the CLI

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Main CLI structure
#[derive(Parser)]
#[command(name = "errbrake")]
#[command(about = "Capture, classify and report application errors")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Project path for project-level configuration
    #[arg(long, global = true, env = "ERRBRAKE_PROJECT")]
    pub project: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Initialize configuration
    Init {
        /// Initialize global configuration (default is project-level)
        #[arg(short, long)]
        global: bool,

        /// Force overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },

    /// Configure settings
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Capture a test report and send it to the collector
    Test {
        /// Report message
        message: String,

        /// Error kind
        #[arg(short, long, default_value = "TestError")]
        kind: String,

        /// Mark the report as expected regardless of configured kinds
        #[arg(short, long)]
        expected: bool,

        /// Only print the report, don't contact the collector
        #[arg(long)]
        dry_run: bool,
    },

    /// Read a JSON error report on stdin and print it formatted
    Format,
}

/// Configuration management actions
#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Set configuration value
    Set {
        /// Configuration key (e.g., notifier.endpoint)
        key: String,
        /// Value to set
        value: String,
    },

    /// Get configuration value
    Get {
        /// Configuration key
        key: String,
    },
}
