//! Consolidator: the externally visible view of one contact chain.

use crate::contact::{Contact, ContactId};
use crate::error::IdentifyError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::hash::Hash;

/// Consolidated identity of one chain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsolidatedContact {
    pub primary_contact_id: ContactId,
    /// The primary's email first, then first-seen order.
    pub emails: Vec<String>,
    /// The primary's phone first, then first-seen order.
    pub phone_numbers: Vec<String>,
    pub secondary_contact_ids: Vec<ContactId>,
}

/// Identify response envelope: `{ "contact": { ... } }`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentifyResponse {
    pub contact: ConsolidatedContact,
}

impl From<ConsolidatedContact> for IdentifyResponse {
    fn from(contact: ConsolidatedContact) -> Self {
        IdentifyResponse { contact }
    }
}

/// Insertion-ordered set
struct OrderedSet<T> {
    seen: HashSet<T>,
    items: Vec<T>,
}

impl<T: Eq + Hash + Clone> OrderedSet<T> {
    fn new() -> Self {
        Self {
            seen: HashSet::new(),
            items: Vec::new(),
        }
    }

    fn insert(&mut self, item: T) {
        if self.seen.insert(item.clone()) {
            self.items.push(item);
        }
    }

    fn into_vec(self) -> Vec<T> {
        self.items
    }
}

/// Build the consolidated identity for a chain.
///
/// `contacts` must be non-empty; the identity pipeline never produces an empty set on
/// its success path, so an empty input is reported as `EmptyContactSet`.
pub fn build(contacts: &[Contact]) -> Result<ConsolidatedContact, IdentifyError> {
    let first = contacts.first().ok_or(IdentifyError::EmptyContactSet)?;
    let primary = contacts.iter().find(|c| c.is_primary()).unwrap_or(first);

    let mut emails = OrderedSet::new();
    let mut phone_numbers = OrderedSet::new();
    let mut secondary_ids = OrderedSet::new();

    if let Some(email) = &primary.email {
        emails.insert(email.clone());
    }
    if let Some(phone) = &primary.phone_number {
        phone_numbers.insert(phone.clone());
    }

    for contact in contacts {
        if let Some(email) = &contact.email {
            emails.insert(email.clone());
        }
        if let Some(phone) = &contact.phone_number {
            phone_numbers.insert(phone.clone());
        }
        if contact.id != primary.id {
            secondary_ids.insert(contact.id);
        }
    }

    Ok(ConsolidatedContact {
        primary_contact_id: primary.id,
        emails: emails.into_vec(),
        phone_numbers: phone_numbers.into_vec(),
        secondary_contact_ids: secondary_ids.into_vec(),
    })
}
