//! Contact records and chain vocabulary.
//!
//! A contact is one observed (email, phone) pair. Contacts that share an identifier are
//! linked into a chain: one primary, any number of secondaries pointing at it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Monotonically assigned contact identifier. Never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContactId(pub u64);

impl ContactId {
    pub fn as_u64(self) -> u64 {
        self.0
    }

    /// Big-endian key bytes, so sled iteration order matches id order.
    pub fn to_key(self) -> [u8; 8] {
        self.0.to_be_bytes()
    }
}

impl fmt::Display for ContactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Position of a contact within its chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkPrecedence {
    Primary,
    Secondary,
}

/// Which identifier a contact carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IdentifierKind {
    Email,
    Phone,
}

impl fmt::Display for IdentifierKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdentifierKind::Email => write!(f, "email"),
            IdentifierKind::Phone => write!(f, "phoneNumber"),
        }
    }
}

/// Contact: one known (email, phone) observation or a merged identity node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    pub id: ContactId,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    /// Set iff `link_precedence` is secondary; always the chain's primary.
    pub linked_id: Option<ContactId>,
    pub link_precedence: LinkPrecedence,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Contact {
    /// Build a fresh primary contact.
    pub fn primary(
        id: ContactId,
        email: Option<String>,
        phone_number: Option<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Contact {
            id,
            email,
            phone_number,
            linked_id: None,
            link_precedence: LinkPrecedence::Primary,
            created_at,
            updated_at: created_at,
            deleted_at: None,
        }
    }

    /// Build a fresh secondary contact linked to `primary_id`.
    pub fn secondary(
        id: ContactId,
        email: Option<String>,
        phone_number: Option<String>,
        primary_id: ContactId,
        created_at: DateTime<Utc>,
    ) -> Self {
        Contact {
            id,
            email,
            phone_number,
            linked_id: Some(primary_id),
            link_precedence: LinkPrecedence::Secondary,
            created_at,
            updated_at: created_at,
            deleted_at: None,
        }
    }

    pub fn is_primary(&self) -> bool {
        self.link_precedence == LinkPrecedence::Primary
    }

    /// Id of the chain this contact belongs to: its own id if primary, else its primary's.
    pub fn chain_id(&self) -> ContactId {
        match (self.link_precedence, self.linked_id) {
            (LinkPrecedence::Secondary, Some(primary)) => primary,
            _ => self.id,
        }
    }

    /// Total seniority order: older first, smaller id on equal timestamps.
    pub fn seniority_key(&self) -> (DateTime<Utc>, ContactId) {
        (self.created_at, self.id)
    }

    /// Demote to a secondary of `primary_id`.
    pub fn link_to(&mut self, primary_id: ContactId, now: DateTime<Utc>) {
        self.link_precedence = LinkPrecedence::Secondary;
        self.linked_id = Some(primary_id);
        self.updated_at = now;
    }

    pub fn identifier(&self, kind: IdentifierKind) -> Option<&str> {
        match kind {
            IdentifierKind::Email => self.email.as_deref(),
            IdentifierKind::Phone => self.phone_number.as_deref(),
        }
    }
}

/// Sort contacts into seniority order (ascending `created_at`, then id).
pub fn sort_by_seniority(contacts: &mut [Contact]) {
    contacts.sort_by_key(Contact::seniority_key);
}
