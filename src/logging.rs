//! Logging System
//!
//! Structured logging implementation using the `tracing` crate. Provides configurable
//! log levels, output formats, and destinations.

use crate::error::IdentifyError;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::fmt::time::ChronoUtc;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer, Registry};

const LEVELS: [&str; 6] = ["trace", "debug", "info", "warn", "error", "off"];
const FORMATS: [&str; 2] = ["text", "json"];
const OUTPUTS: [&str; 3] = ["stdout", "stderr", "file"];

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Install a subscriber at all
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Log level: trace, debug, info, warn, error, off
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format: json, text (default: text)
    #[serde(default = "default_format")]
    pub format: String,

    /// Output destination: stdout, stderr, file. Stdout carries command output, so
    /// the default is stderr.
    #[serde(default = "default_output")]
    pub output: String,

    /// Log file path (if output is "file"); defaults under the user data directory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,

    /// Enable colored output (text format only, stdout/stderr only)
    #[serde(default = "default_true")]
    pub color: bool,

    /// Module-specific log levels
    #[serde(default)]
    pub modules: HashMap<String, String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_format() -> String {
    "text".to_string()
}

fn default_output() -> String {
    "stderr".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: default_log_level(),
            format: default_format(),
            output: default_output(),
            file: None,
            color: true,
            modules: HashMap::new(),
        }
    }
}

impl LoggingConfig {
    pub fn validate(&self) -> Result<(), String> {
        if !LEVELS.contains(&self.level.as_str()) {
            return Err(format!("Invalid log level: {}", self.level));
        }
        if !FORMATS.contains(&self.format.as_str()) {
            return Err(format!(
                "Invalid log format: {} (must be 'json' or 'text')",
                self.format
            ));
        }
        if !OUTPUTS.contains(&self.output.as_str()) {
            return Err(format!(
                "Invalid log output: {} (must be 'stdout', 'stderr', or 'file')",
                self.output
            ));
        }
        Ok(())
    }
}

/// Resolve the log file path: explicit path, else the user data dir, else the workspace.
pub fn resolve_log_file_path(explicit: Option<&Path>, workspace_root: &Path) -> PathBuf {
    if let Some(path) = explicit {
        return path.to_path_buf();
    }
    ProjectDirs::from("", "", "contactlink")
        .map(|dirs| dirs.data_dir().join("contactlink.log"))
        .unwrap_or_else(|| workspace_root.join(".contactlink").join("contactlink.log"))
}

/// Initialize the logging system
///
/// Priority order (highest to lowest):
/// 1. Environment variables (CONTACTLINK_LOG, CONTACTLINK_LOG_FORMAT, CONTACTLINK_LOG_OUTPUT)
/// 2. The given config (already merged from CLI flags and config files)
/// 3. Defaults
pub fn init_logging(config: &LoggingConfig, workspace_root: &Path) -> Result<(), IdentifyError> {
    if !config.enabled {
        return Ok(());
    }

    let filter = build_env_filter(config)?;
    let format = determine_format(config)?;
    let output = determine_output(config)?;

    let (writer, ansi) = match output.as_str() {
        "stdout" => (BoxMakeWriter::new(std::io::stdout), config.color),
        "stderr" => (BoxMakeWriter::new(std::io::stderr), config.color),
        _ => {
            let log_file = resolve_log_file_path(config.file.as_deref(), workspace_root);
            if let Some(parent) = log_file.parent() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    IdentifyError::ConfigError(format!("Failed to create log directory: {}", e))
                })?;
            }
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&log_file)
                .map_err(|e| {
                    IdentifyError::ConfigError(format!(
                        "Failed to open log file {:?}: {}",
                        log_file, e
                    ))
                })?;
            (BoxMakeWriter::new(Mutex::new(file)), false)
        }
    };

    let layer = if format == "json" {
        fmt::layer()
            .json()
            .with_target(true)
            .with_timer(ChronoUtc::rfc_3339())
            .with_writer(writer)
            .boxed()
    } else {
        fmt::layer()
            .with_target(true)
            .with_timer(ChronoUtc::rfc_3339())
            .with_ansi(ansi)
            .with_writer(writer)
            .boxed()
    };

    Registry::default()
        .with(filter)
        .with(layer)
        .try_init()
        .map_err(|e| IdentifyError::ConfigError(format!("Failed to install logger: {}", e)))
}

/// Build environment filter from config or environment variables
fn build_env_filter(config: &LoggingConfig) -> Result<EnvFilter, IdentifyError> {
    if let Ok(filter) = EnvFilter::try_from_env("CONTACTLINK_LOG") {
        return Ok(filter);
    }

    if config.level == "off" {
        return Ok(EnvFilter::new("off"));
    }

    let mut filter = EnvFilter::new(&config.level);
    for (module, module_level) in &config.modules {
        let directive = format!("{}={}", module, module_level);
        filter = filter.add_directive(
            directive
                .parse()
                .map_err(|e| IdentifyError::ConfigError(format!("Invalid log directive: {}", e)))?,
        );
    }
    Ok(filter)
}

/// Determine output format from config or environment
fn determine_format(config: &LoggingConfig) -> Result<String, IdentifyError> {
    if let Ok(format) = std::env::var("CONTACTLINK_LOG_FORMAT") {
        if FORMATS.contains(&format.as_str()) {
            return Ok(format);
        }
    }
    if !FORMATS.contains(&config.format.as_str()) {
        return Err(IdentifyError::ConfigError(format!(
            "Invalid log format: {} (must be 'json' or 'text')",
            config.format
        )));
    }
    Ok(config.format.clone())
}

/// Determine output destination from config or environment
fn determine_output(config: &LoggingConfig) -> Result<String, IdentifyError> {
    let output = std::env::var("CONTACTLINK_LOG_OUTPUT").unwrap_or_else(|_| config.output.clone());
    if !OUTPUTS.contains(&output.as_str()) {
        return Err(IdentifyError::ConfigError(format!(
            "Invalid log output: {} (must be 'stdout', 'stderr', or 'file')",
            output
        )));
    }
    Ok(output)
}
