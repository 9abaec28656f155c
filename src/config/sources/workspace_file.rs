//! Workspace config file source: config/config.toml, then config/{CONTACTLINK_ENV}.toml

use config::builder::DefaultState;
use config::{ConfigBuilder, ConfigError, File};
use std::path::{Path, PathBuf};
use tracing::debug;

const ENV_VAR: &str = "CONTACTLINK_ENV";
const DEFAULT_ENV: &str = "development";

/// Active deployment environment name.
pub fn active_environment() -> String {
    std::env::var(ENV_VAR).unwrap_or_else(|_| DEFAULT_ENV.to_string())
}

/// Existing workspace config files for `env_name`, lowest precedence first.
pub fn workspace_config_files(workspace_root: &Path, env_name: &str) -> Vec<PathBuf> {
    let config_dir = workspace_root.join("config");
    [
        config_dir.join("config.toml"),
        config_dir.join(format!("{}.toml", env_name)),
    ]
    .into_iter()
    .filter(|path| path.is_file())
    .collect()
}

/// Layer the workspace config files for the active environment onto `builder`.
pub fn add_to_builder(
    builder: ConfigBuilder<DefaultState>,
    workspace_root: &Path,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    let env_name = active_environment();
    let files = workspace_config_files(workspace_root, &env_name);
    debug!(environment = %env_name, files = files.len(), "Workspace configuration files");

    Ok(files.iter().fold(builder, |builder, path| {
        builder.add_source(File::from(path.as_path()).required(true))
    }))
}
