//! CLI parse: clap types for contactlink. No behavior; definitions only.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Contactlink CLI - identity reconciliation across partial contact records
#[derive(Parser)]
#[command(name = "contactlink")]
#[command(about = "Identity reconciliation across partial contact records")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Workspace root directory
    #[arg(long, default_value = ".")]
    pub workspace: PathBuf,

    /// Configuration file path (overrides default config loading)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging (debug level)
    #[arg(long, default_value = "false")]
    pub verbose: bool,

    /// Disable logging entirely
    #[arg(long, default_value = "false")]
    pub quiet: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file)
    #[arg(long)]
    pub log_output: Option<String>,

    /// Log file path (if output is "file")
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Resolve an email and/or phone number to its consolidated identity
    Identify {
        /// Email address
        #[arg(long)]
        email: Option<String>,
        /// Phone number
        #[arg(long = "phone", alias = "phone-number")]
        phone_number: Option<String>,
        /// Output format (json or text)
        #[arg(long, default_value = "json", value_parser = ["json", "text"])]
        format: String,
    },
    /// Show the consolidated identity of the chain containing a contact
    Show {
        /// Contact id
        id: u64,
        /// Output format (json or text)
        #[arg(long, default_value = "json", value_parser = ["json", "text"])]
        format: String,
    },
    /// List every stored contact, oldest first
    List {
        /// Output format (json or text)
        #[arg(long, default_value = "text", value_parser = ["json", "text"])]
        format: String,
    },
    /// Configuration commands
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Print the effective configuration as TOML
    Show,
}
