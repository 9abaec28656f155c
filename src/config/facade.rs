//! Config loading facade: assembles sources in precedence order.

use super::merge::merge_policy::builder_with_defaults;
use super::sources::{environment, global_file, workspace_file};
use super::ContactLinkConfig;
use config::{ConfigError, File};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Loads [`ContactLinkConfig`] from layered sources.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration for a workspace: defaults, global file, workspace files, env.
    pub fn load(workspace_root: &Path) -> Result<ContactLinkConfig, ConfigError> {
        let builder = builder_with_defaults()?;
        let builder = global_file::add_to_builder(builder)?;
        let builder = workspace_file::add_to_builder(builder, workspace_root)?;
        let builder = environment::add_to_builder(builder);
        let config: ContactLinkConfig = builder.build()?.try_deserialize()?;
        debug!(workspace = %workspace_root.display(), backend = %config.store.backend, "Configuration loaded");
        Ok(config)
    }

    /// Load configuration from exactly one file over the built-in defaults.
    pub fn load_from_file(path: &Path) -> Result<ContactLinkConfig, ConfigError> {
        builder_with_defaults()?
            .add_source(File::from(path).required(true))
            .build()?
            .try_deserialize()
    }

    /// Path of the global config file, if a home directory can be determined.
    pub fn global_config_path() -> Option<PathBuf> {
        global_file::global_config_path()
    }
}
