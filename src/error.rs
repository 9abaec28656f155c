//! Error types for contact identity reconciliation.

use crate::contact::{ContactId, IdentifierKind};
use thiserror::Error;

/// Contact store gateway errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Contact not found: {0}")]
    ContactNotFound(ContactId),

    /// A concurrent insert already claimed this identifier. Recoverable by
    /// re-running the whole resolution.
    #[error("Duplicate identifier: {field} '{value}' already belongs to a contact")]
    DuplicateIdentifier { field: IdentifierKind, value: String },

    /// The create-or-merge transaction did not commit; nothing was written.
    #[error("Merge transaction failed: {0}")]
    MergeTransactionFailed(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Storage I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Inbound request validation errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Either email or phoneNumber must be provided.")]
    MissingIdentifier,
}

/// Identity resolution errors
#[derive(Debug, Error)]
pub enum IdentifyError {
    #[error("Invalid request: {0}")]
    Validation(#[from] ValidationError),

    #[error("Cannot consolidate an empty contact set")]
    EmptyContactSet,

    #[error("Contact group of {0} records has no primary contact")]
    NoPrimaryInGroup(usize),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl IdentifyError {
    /// True for a lost first-insert race, which warrants one full retry.
    pub fn is_duplicate_identifier(&self) -> bool {
        matches!(
            self,
            IdentifyError::Storage(StorageError::DuplicateIdentifier { .. })
        )
    }
}

impl From<config::ConfigError> for IdentifyError {
    fn from(err: config::ConfigError) -> Self {
        IdentifyError::ConfigError(err.to_string())
    }
}
