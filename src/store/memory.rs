//! In-memory contact store.
//!
//! Thread-safe reference implementation of [`ContactStore`]. A single mutex serializes
//! every operation, which gives the create-or-merge primitives the same isolation the
//! sled backend gets from its transactions. Used for tests and `backend = "memory"`.

use crate::contact::{sort_by_seniority, Contact, ContactId, IdentifierKind};
use crate::error::StorageError;
use crate::store::{ContactStore, MergePlan};
use chrono::Utc;
use parking_lot::Mutex;
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug)]
struct State {
    contacts: BTreeMap<ContactId, Contact>,
    next_id: u64,
}

impl State {
    fn allocate_id(&mut self) -> ContactId {
        let id = ContactId(self.next_id);
        self.next_id += 1;
        id
    }
}

/// Mutex-guarded in-memory implementation of ContactStore
#[derive(Debug)]
pub struct MemoryContactStore {
    state: Mutex<State>,
}

impl Default for MemoryContactStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryContactStore {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State {
                contacts: BTreeMap::new(),
                next_id: 1,
            }),
        }
    }

    /// Seed a store with existing records. Later ids continue after the largest seeded id.
    pub fn with_contacts(contacts: Vec<Contact>) -> Self {
        let next_id = contacts.iter().map(|c| c.id.as_u64()).max().unwrap_or(0) + 1;
        let contacts = contacts.into_iter().map(|c| (c.id, c)).collect();
        Self {
            state: Mutex::new(State { contacts, next_id }),
        }
    }

    pub fn len(&self) -> usize {
        self.state.lock().contacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn chain_of(contacts: &BTreeMap<ContactId, Contact>, primary_id: ContactId) -> Vec<Contact> {
    let mut chain: Vec<Contact> = contacts
        .values()
        .filter(|c| c.id == primary_id || c.linked_id == Some(primary_id))
        .cloned()
        .collect();
    sort_by_seniority(&mut chain);
    chain
}

fn stale(reason: String) -> StorageError {
    StorageError::MergeTransactionFailed(reason)
}

impl ContactStore for MemoryContactStore {
    fn fetch_by_identifiers(
        &self,
        email: Option<&str>,
        phone_number: Option<&str>,
    ) -> Result<Vec<Contact>, StorageError> {
        let state = self.state.lock();
        let mut matches: Vec<Contact> = state
            .contacts
            .values()
            .filter(|c| {
                let email_hit = email.is_some() && c.email.as_deref() == email;
                let phone_hit = phone_number.is_some() && c.phone_number.as_deref() == phone_number;
                email_hit || phone_hit
            })
            .cloned()
            .collect();
        sort_by_seniority(&mut matches);
        Ok(matches)
    }

    fn fetch_closure(&self, chain_ids: &BTreeSet<ContactId>) -> Result<Vec<Contact>, StorageError> {
        let state = self.state.lock();
        // A chain demoted since the caller read it now lives under its new primary.
        let chain_ids: BTreeSet<ContactId> = chain_ids
            .iter()
            .map(|id| state.contacts.get(id).map_or(*id, Contact::chain_id))
            .collect();
        let mut closure: Vec<Contact> = state
            .contacts
            .values()
            .filter(|c| {
                chain_ids.contains(&c.id) || c.linked_id.map_or(false, |l| chain_ids.contains(&l))
            })
            .cloned()
            .collect();
        sort_by_seniority(&mut closure);
        Ok(closure)
    }

    fn create_primary(
        &self,
        email: Option<&str>,
        phone_number: Option<&str>,
    ) -> Result<Contact, StorageError> {
        let mut state = self.state.lock();
        for (kind, value) in [(IdentifierKind::Email, email), (IdentifierKind::Phone, phone_number)] {
            let Some(value) = value else { continue };
            if state.contacts.values().any(|c| c.identifier(kind) == Some(value)) {
                return Err(StorageError::DuplicateIdentifier {
                    field: kind,
                    value: value.to_string(),
                });
            }
        }
        let id = state.allocate_id();
        let contact = Contact::primary(
            id,
            email.map(str::to_string),
            phone_number.map(str::to_string),
            Utc::now(),
        );
        state.contacts.insert(id, contact.clone());
        Ok(contact)
    }

    fn atomic_merge(&self, plan: &MergePlan) -> Result<Vec<Contact>, StorageError> {
        let mut state = self.state.lock();
        let now = Utc::now();
        let survivor_id = plan.surviving_primary_id;

        // Work on a copy so a rejected plan leaves nothing behind.
        let mut working = state.contacts.clone();

        match working.get(&survivor_id) {
            Some(c) if c.is_primary() => {}
            Some(_) => return Err(stale(format!("contact {} is no longer a primary", survivor_id))),
            None => return Err(stale(format!("surviving primary {} not found", survivor_id))),
        }

        let mut relink = plan.relink_ids.clone();
        for id in &plan.demoted_ids {
            let contact = working
                .get_mut(id)
                .ok_or_else(|| stale(format!("demoted contact {} not found", id)))?;
            if contact.is_primary() {
                contact.link_to(survivor_id, now);
            } else if contact.linked_id != Some(survivor_id) {
                return Err(stale(format!("contact {} was relinked concurrently", id)));
            }
        }
        relink.extend(
            working
                .values()
                .filter(|c| c.linked_id.map_or(false, |l| plan.demoted_ids.contains(&l)))
                .map(|c| c.id),
        );

        for id in &relink {
            let contact = working
                .get_mut(id)
                .ok_or_else(|| stale(format!("relinked contact {} not found", id)))?;
            let linked = contact.linked_id;
            match linked {
                Some(l) if l == survivor_id => {}
                Some(l) if plan.demoted_ids.contains(&l) => contact.link_to(survivor_id, now),
                _ => return Err(stale(format!("contact {} is not in a merged chain", id))),
            }
        }

        if let Some(new) = &plan.new_secondary {
            let chain = chain_of(&working, survivor_id);
            let email = new
                .email
                .clone()
                .filter(|e| !chain.iter().any(|c| c.email.as_ref() == Some(e)));
            let phone_number = new
                .phone_number
                .clone()
                .filter(|p| !chain.iter().any(|c| c.phone_number.as_ref() == Some(p)));
            if email.is_some() || phone_number.is_some() {
                let id = state.allocate_id();
                working.insert(
                    id,
                    Contact::secondary(id, email, phone_number, survivor_id, now),
                );
            }
        }

        state.contacts = working;
        Ok(chain_of(&state.contacts, survivor_id))
    }

    fn get(&self, id: ContactId) -> Result<Option<Contact>, StorageError> {
        Ok(self.state.lock().contacts.get(&id).cloned())
    }

    fn list_all(&self) -> Result<Vec<Contact>, StorageError> {
        let mut all: Vec<Contact> = self.state.lock().contacts.values().cloned().collect();
        sort_by_seniority(&mut all);
        Ok(all)
    }
}
