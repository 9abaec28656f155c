//! Matcher: direct identifier matches expanded to their full chains.

use crate::contact::{Contact, ContactId};
use crate::error::StorageError;
use crate::store::ContactStore;
use std::collections::BTreeSet;
use tracing::debug;

/// Find every contact sharing a chain with a contact that carries `email` or `phone_number`.
///
/// Returns an empty group when nothing matches directly. When the direct matches span
/// several chains, all of them are returned; unifying them is the merge policy's call.
/// The result is ordered by seniority.
pub fn find_group(
    store: &dyn ContactStore,
    email: Option<&str>,
    phone_number: Option<&str>,
) -> Result<Vec<Contact>, StorageError> {
    let direct = store.fetch_by_identifiers(email, phone_number)?;
    if direct.is_empty() {
        debug!("No direct contact match");
        return Ok(Vec::new());
    }

    // A direct match may be a secondary whose primary and siblings carry neither
    // identifier, so the closure has to be fetched by chain id.
    let ids = chain_ids(&direct);
    let group = store.fetch_closure(&ids)?;
    debug!(
        direct_matches = direct.len(),
        chains = ids.len(),
        group_size = group.len(),
        "Expanded contact group"
    );
    Ok(group)
}

/// Chain ids of the given contacts: own id for primaries, `linked_id` for secondaries.
pub fn chain_ids(contacts: &[Contact]) -> BTreeSet<ContactId> {
    contacts.iter().map(Contact::chain_id).collect()
}
