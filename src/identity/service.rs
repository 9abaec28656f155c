//! Identity service: the full identify pipeline over a contact store.

use crate::contact::{Contact, ContactId};
use crate::error::{IdentifyError, StorageError};
use crate::identity::consolidate::{build, ConsolidatedContact};
use crate::identity::executor::merge;
use crate::identity::matcher::find_group;
use crate::identity::policy::decide;
use crate::identity::request::Identifiers;
use crate::store::ContactStore;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Identity resolution service
///
/// Stateless apart from the shared store handle; safe to call from many threads.
#[derive(Clone)]
pub struct IdentityService {
    store: Arc<dyn ContactStore>,
}

impl IdentityService {
    pub fn new(store: Arc<dyn ContactStore>) -> Self {
        Self { store }
    }

    /// Resolve an identifier pair to its consolidated identity, creating or merging
    /// contacts as needed.
    ///
    /// A lost first-insert race (`DuplicateIdentifier`) re-runs the whole resolution
    /// once; any other failure is returned unchanged.
    #[instrument(skip_all)]
    pub fn identify(&self, ids: &Identifiers) -> Result<ConsolidatedContact, IdentifyError> {
        match self.resolve(ids) {
            Err(e) if e.is_duplicate_identifier() => {
                warn!(error = %e, "Concurrent insert claimed identifier, retrying resolution");
                self.resolve(ids)
            }
            other => other,
        }
    }

    fn resolve(&self, ids: &Identifiers) -> Result<ConsolidatedContact, IdentifyError> {
        let email = ids.email();
        let phone_number = ids.phone_number();
        let store = self.store.as_ref();

        let group = find_group(store, email, phone_number)?;
        if group.is_empty() {
            let contact = store.create_primary(email, phone_number)?;
            info!(primary_contact_id = %contact.id, "Created primary contact");
            return build(std::slice::from_ref(&contact));
        }

        let decision = decide(&group, email, phone_number);
        debug!(
            group_size = group.len(),
            needs_write = decision.needs_write,
            reason = %decision.reason,
            "Merge policy decided"
        );
        if !decision.needs_write {
            return build(&group);
        }

        let chain = merge(store, &group, email, phone_number)?;
        build(&chain)
    }

    /// Consolidated identity of the chain containing contact `id`.
    pub fn consolidated_for(&self, id: ContactId) -> Result<ConsolidatedContact, IdentifyError> {
        let contact = self
            .store
            .get(id)?
            .ok_or(StorageError::ContactNotFound(id))?;
        let chain_ids: BTreeSet<ContactId> = [contact.chain_id()].into_iter().collect();
        let chain = self.store.fetch_closure(&chain_ids)?;
        build(&chain)
    }

    /// Every stored contact in seniority order.
    pub fn contacts(&self) -> Result<Vec<Contact>, IdentifyError> {
        Ok(self.store.list_all()?)
    }
}
