//! CLI route: single route table and run context. Dispatches to the identity service
//! and presentation.

use crate::cli::parse::{Commands, ConfigCommands};
use crate::cli::presentation::{format_contact_list, format_identify_response};
use crate::config::{ConfigLoader, ContactLinkConfig, StoreBackend};
use crate::contact::ContactId;
use crate::error::{IdentifyError, StorageError};
use crate::identity::{IdentifyRequest, IdentifyResponse, IdentityService};
use crate::store::{ContactStore, MemoryContactStore, SledContactStore};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Runtime context for CLI execution: loaded config and the identity service.
pub struct RunContext {
    service: IdentityService,
    config: ContactLinkConfig,
}

impl RunContext {
    /// Create run context from workspace root and optional config path.
    pub fn new(workspace_root: PathBuf, config_path: Option<PathBuf>) -> Result<Self, IdentifyError> {
        let config = match config_path {
            Some(ref path) => ConfigLoader::load_from_file(path)?,
            None => ConfigLoader::load(&workspace_root)?,
        };
        Self::from_config(workspace_root, config)
    }

    /// Create run context from an already loaded configuration.
    pub fn from_config(
        workspace_root: PathBuf,
        config: ContactLinkConfig,
    ) -> Result<Self, IdentifyError> {
        config.validate().map_err(|errors| {
            let msgs: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            IdentifyError::ConfigError(format!(
                "Configuration validation failed:\n{}",
                msgs.join("\n")
            ))
        })?;

        let store = open_store(&config, &workspace_root)?;
        Ok(Self {
            service: IdentityService::new(store),
            config,
        })
    }

    pub fn service(&self) -> &IdentityService {
        &self.service
    }

    /// Execute a CLI command via the single route table.
    pub fn execute(&self, command: &Commands) -> Result<String, IdentifyError> {
        match command {
            Commands::Identify {
                email,
                phone_number,
                format,
            } => {
                let ids = IdentifyRequest::new(email.clone(), phone_number.clone()).validate()?;
                let contact = self.service.identify(&ids)?;
                format_identify_response(&IdentifyResponse::from(contact), format)
            }
            Commands::Show { id, format } => {
                let contact = self.service.consolidated_for(ContactId(*id))?;
                format_identify_response(&IdentifyResponse::from(contact), format)
            }
            Commands::List { format } => {
                let contacts = self.service.contacts()?;
                format_contact_list(&contacts, format)
            }
            Commands::Config { command } => match command {
                ConfigCommands::Show => toml::to_string_pretty(&self.config).map_err(|e| {
                    IdentifyError::ConfigError(format!("Failed to render configuration: {}", e))
                }),
            },
        }
    }
}

fn open_store(
    config: &ContactLinkConfig,
    workspace_root: &Path,
) -> Result<Arc<dyn ContactStore>, IdentifyError> {
    match config.store.backend {
        StoreBackend::Memory => {
            debug!("Using in-memory contact store");
            Ok(Arc::new(MemoryContactStore::new()))
        }
        StoreBackend::Sled => {
            let path = config.store.resolve_path(workspace_root);
            std::fs::create_dir_all(&path)
                .map_err(|e| IdentifyError::Storage(StorageError::IoError(e)))?;
            info!(store_path = %path.display(), "Opening contact store");
            Ok(Arc::new(SledContactStore::new(&path)?))
        }
    }
}
