//! Contact Store Gateway
//!
//! Durable contact storage: point lookups by identifier, chain closure lookups, and the
//! atomic create-or-merge primitives the identity core writes through.

pub mod memory;
pub mod persistence;

pub use memory::MemoryContactStore;
pub use persistence::SledContactStore;

use crate::contact::{Contact, ContactId};
use crate::error::StorageError;
use std::collections::BTreeSet;

/// Identifier values carried by a new secondary contact
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewSecondary {
    pub email: Option<String>,
    pub phone_number: Option<String>,
}

impl NewSecondary {
    pub fn is_empty(&self) -> bool {
        self.email.is_none() && self.phone_number.is_none()
    }
}

/// A fully computed chain rewrite, applied by the store in one transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergePlan {
    /// Oldest primary of the group; stays primary.
    pub surviving_primary_id: ContactId,
    /// Primaries that become secondaries of the survivor.
    pub demoted_ids: BTreeSet<ContactId>,
    /// Secondaries of demoted primaries, repointed at the survivor.
    pub relink_ids: BTreeSet<ContactId>,
    pub new_secondary: Option<NewSecondary>,
}

/// Contact Store Gateway interface
///
/// Every sequence returned is ordered by seniority (`created_at`, then id).
/// `create_primary` and `atomic_merge` must be serializable with respect to each other.
pub trait ContactStore: Send + Sync {
    /// Contacts whose email equals `email` or whose phone equals `phone_number`.
    /// An absent identifier matches nothing.
    fn fetch_by_identifiers(
        &self,
        email: Option<&str>,
        phone_number: Option<&str>,
    ) -> Result<Vec<Contact>, StorageError>;

    /// Contacts whose id or `linked_id` is in `chain_ids`.
    fn fetch_closure(&self, chain_ids: &BTreeSet<ContactId>) -> Result<Vec<Contact>, StorageError>;

    /// Insert a new primary. Fails with `DuplicateIdentifier` if any stored contact
    /// already carries either identifier.
    fn create_primary(
        &self,
        email: Option<&str>,
        phone_number: Option<&str>,
    ) -> Result<Contact, StorageError>;

    /// Apply a merge plan atomically and return the survivor's full chain.
    /// Fails with `MergeTransactionFailed`, leaving storage untouched, on any error.
    fn atomic_merge(&self, plan: &MergePlan) -> Result<Vec<Contact>, StorageError>;

    fn get(&self, id: ContactId) -> Result<Option<Contact>, StorageError>;

    fn list_all(&self) -> Result<Vec<Contact>, StorageError>;
}
