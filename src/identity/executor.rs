//! Merge Executor: turn a matched group into a single chain under its oldest primary.

use crate::contact::{Contact, ContactId};
use crate::error::IdentifyError;
use crate::identity::policy::is_new;
use crate::store::{ContactStore, MergePlan, NewSecondary};
use std::collections::BTreeSet;
use tracing::{debug, info};

/// The oldest primary in `group` (smallest `created_at`, then smallest id).
pub fn surviving_primary(group: &[Contact]) -> Option<&Contact> {
    group
        .iter()
        .filter(|c| c.is_primary())
        .min_by_key(|c| c.seniority_key())
}

/// Compute the chain rewrite for `group` and the request identifiers.
///
/// Every primary other than the survivor is demoted, their secondaries are relinked to
/// the survivor, and identifier values no group member carries go into one new
/// secondary contact.
pub fn plan_merge(
    group: &[Contact],
    email: Option<&str>,
    phone_number: Option<&str>,
) -> Result<MergePlan, IdentifyError> {
    if group.is_empty() {
        return Err(IdentifyError::EmptyContactSet);
    }
    let survivor = surviving_primary(group).ok_or(IdentifyError::NoPrimaryInGroup(group.len()))?;

    let demoted_ids: BTreeSet<ContactId> = group
        .iter()
        .filter(|c| c.is_primary() && c.id != survivor.id)
        .map(|c| c.id)
        .collect();

    let relink_ids: BTreeSet<ContactId> = group
        .iter()
        .filter(|c| c.linked_id.map_or(false, |l| demoted_ids.contains(&l)))
        .map(|c| c.id)
        .collect();

    let new_secondary = NewSecondary {
        email: email
            .filter(|_| is_new(group, email, |c| c.email.as_deref()))
            .map(str::to_string),
        phone_number: phone_number
            .filter(|_| is_new(group, phone_number, |c| c.phone_number.as_deref()))
            .map(str::to_string),
    };

    Ok(MergePlan {
        surviving_primary_id: survivor.id,
        demoted_ids,
        relink_ids,
        new_secondary: (!new_secondary.is_empty()).then_some(new_secondary),
    })
}

/// Plan and apply a merge in one store transaction, returning the resulting chain.
pub fn merge(
    store: &dyn ContactStore,
    group: &[Contact],
    email: Option<&str>,
    phone_number: Option<&str>,
) -> Result<Vec<Contact>, IdentifyError> {
    let plan = plan_merge(group, email, phone_number)?;
    debug!(
        surviving_primary = %plan.surviving_primary_id,
        demoted = plan.demoted_ids.len(),
        relinked = plan.relink_ids.len(),
        new_secondary = plan.new_secondary.is_some(),
        "Planned contact merge"
    );

    let chain = store.atomic_merge(&plan)?;
    info!(
        primary_contact_id = %plan.surviving_primary_id,
        chain_size = chain.len(),
        "Merged contact chain"
    );
    Ok(chain)
}
