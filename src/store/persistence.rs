//! Persistence layer for the Contact Store

use crate::contact::{sort_by_seniority, Contact, ContactId, IdentifierKind};
use crate::error::StorageError;
use crate::store::{ContactStore, MergePlan};
use chrono::Utc;
use sled::transaction::{
    ConflictableTransactionError, ConflictableTransactionResult, TransactionError,
    TransactionalTree,
};
use sled::{Db, Transactional, Tree};
use std::collections::BTreeSet;
use std::io;
use std::path::Path;

const TREE_CONTACTS: &str = "contacts";
const TREE_EMAIL_INDEX: &str = "contact_email_index";
const TREE_PHONE_INDEX: &str = "contact_phone_index";
const TREE_LINK_INDEX: &str = "contact_link_index";
const TREE_META: &str = "contact_meta";
const NEXT_ID_KEY: &[u8] = b"next_id";

type TxResult<T> = ConflictableTransactionResult<T, StorageError>;

/// Sled-based implementation of ContactStore
///
/// Records live in `contacts` keyed by big-endian id. Three secondary indexes map an
/// email, a phone number, or a primary id to the ids that carry or link to it. Every
/// read and write runs in a multi-tree sled transaction, so readers never observe a
/// half-applied merge and concurrent writers are serialized.
#[derive(Clone)]
pub struct SledContactStore {
    db: Db,
    contacts: Tree,
    emails: Tree,
    phones: Tree,
    links: Tree,
    meta: Tree,
}

impl SledContactStore {
    /// Open (or create) a store at the given directory.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let db = sled::open(path).map_err(|e| {
            StorageError::IoError(io::Error::new(
                io::ErrorKind::Other,
                format!("Failed to open sled database: {}", e),
            ))
        })?;
        Self::from_db(db)
    }

    pub fn from_db(db: Db) -> Result<Self, StorageError> {
        let contacts = db.open_tree(TREE_CONTACTS).map_err(to_storage_io)?;
        let emails = db.open_tree(TREE_EMAIL_INDEX).map_err(to_storage_io)?;
        let phones = db.open_tree(TREE_PHONE_INDEX).map_err(to_storage_io)?;
        let links = db.open_tree(TREE_LINK_INDEX).map_err(to_storage_io)?;
        let meta = db.open_tree(TREE_META).map_err(to_storage_io)?;
        Ok(Self {
            db,
            contacts,
            emails,
            phones,
            links,
            meta,
        })
    }

    /// Flush all pending writes to disk
    pub fn flush(&self) -> Result<(), StorageError> {
        self.db.flush().map_err(to_storage_io)?;
        Ok(())
    }

    /// Import existing records, replacing any stored record with the same id.
    ///
    /// Indexes are rebuilt for each record and the id counter moves past the largest
    /// imported id. The batch commits as one transaction.
    pub fn put_batch(&self, records: &[Contact]) -> Result<(), StorageError> {
        self.transact(|tx| {
            let mut max_id = 0;
            for record in records {
                if let Some(old) = tx.get(record.id)? {
                    tx.unindex(&old)?;
                }
                tx.put(record)?;
                tx.index(record)?;
                max_id = max_id.max(record.id.as_u64());
            }
            let next = tx.next_id()?;
            if max_id >= next {
                tx.set_next_id(max_id + 1)?;
            }
            Ok(())
        })
        .map_err(from_tx_error)
    }

    fn transact<A, F>(&self, f: F) -> Result<A, TransactionError<StorageError>>
    where
        F: Fn(&ContactTx<'_>) -> TxResult<A>,
    {
        (
            &self.contacts,
            &self.emails,
            &self.phones,
            &self.links,
            &self.meta,
        )
            .transaction(|(contacts, emails, phones, links, meta)| {
                let tx = ContactTx {
                    contacts,
                    emails,
                    phones,
                    links,
                    meta,
                };
                f(&tx)
            })
    }
}

/// Transactional view over the store's trees
struct ContactTx<'a> {
    contacts: &'a TransactionalTree,
    emails: &'a TransactionalTree,
    phones: &'a TransactionalTree,
    links: &'a TransactionalTree,
    meta: &'a TransactionalTree,
}

impl ContactTx<'_> {
    fn get(&self, id: ContactId) -> TxResult<Option<Contact>> {
        match self.contacts.get(id.to_key())? {
            Some(raw) => Ok(Some(decode_contact(&raw).map_err(ConflictableTransactionError::Abort)?)),
            None => Ok(None),
        }
    }

    fn require(&self, id: ContactId) -> TxResult<Contact> {
        self.get(id)?
            .ok_or(ConflictableTransactionError::Abort(StorageError::ContactNotFound(id)))
    }

    fn put(&self, contact: &Contact) -> TxResult<()> {
        let value = bincode::serialize(contact).map_err(|e| {
            ConflictableTransactionError::Abort(StorageError::Serialization(format!(
                "Failed to serialize contact {}: {}",
                contact.id, e
            )))
        })?;
        self.contacts.insert(contact.id.to_key().to_vec(), value)?;
        Ok(())
    }

    fn index_tree(&self, kind: IdentifierKind) -> &TransactionalTree {
        match kind {
            IdentifierKind::Email => self.emails,
            IdentifierKind::Phone => self.phones,
        }
    }

    fn ids(tree: &TransactionalTree, key: &[u8]) -> TxResult<Vec<ContactId>> {
        match tree.get(key)? {
            Some(raw) => {
                let ids: Vec<u64> = bincode::deserialize(&raw).map_err(|e| {
                    ConflictableTransactionError::Abort(StorageError::Serialization(format!(
                        "Failed to deserialize index entry: {}",
                        e
                    )))
                })?;
                Ok(ids.into_iter().map(ContactId).collect())
            }
            None => Ok(Vec::new()),
        }
    }

    fn write_ids(tree: &TransactionalTree, key: &[u8], ids: &[ContactId]) -> TxResult<()> {
        if ids.is_empty() {
            tree.remove(key)?;
            return Ok(());
        }
        let raw: Vec<u64> = ids.iter().map(|id| id.as_u64()).collect();
        let value = bincode::serialize(&raw).map_err(|e| {
            ConflictableTransactionError::Abort(StorageError::Serialization(format!(
                "Failed to serialize index entry: {}",
                e
            )))
        })?;
        tree.insert(key, value)?;
        Ok(())
    }

    fn add_id(tree: &TransactionalTree, key: &[u8], id: ContactId) -> TxResult<()> {
        let mut ids = Self::ids(tree, key)?;
        if !ids.contains(&id) {
            ids.push(id);
            ids.sort();
            Self::write_ids(tree, key, &ids)?;
        }
        Ok(())
    }

    fn remove_id(tree: &TransactionalTree, key: &[u8], id: ContactId) -> TxResult<()> {
        let mut ids = Self::ids(tree, key)?;
        let before = ids.len();
        ids.retain(|existing| *existing != id);
        if ids.len() != before {
            Self::write_ids(tree, key, &ids)?;
        }
        Ok(())
    }

    fn index(&self, contact: &Contact) -> TxResult<()> {
        for kind in [IdentifierKind::Email, IdentifierKind::Phone] {
            if let Some(value) = contact.identifier(kind) {
                Self::add_id(self.index_tree(kind), value.as_bytes(), contact.id)?;
            }
        }
        if let Some(primary) = contact.linked_id {
            Self::add_id(self.links, &primary.to_key(), contact.id)?;
        }
        Ok(())
    }

    fn unindex(&self, contact: &Contact) -> TxResult<()> {
        for kind in [IdentifierKind::Email, IdentifierKind::Phone] {
            if let Some(value) = contact.identifier(kind) {
                Self::remove_id(self.index_tree(kind), value.as_bytes(), contact.id)?;
            }
        }
        if let Some(primary) = contact.linked_id {
            Self::remove_id(self.links, &primary.to_key(), contact.id)?;
        }
        Ok(())
    }

    /// Repoint a secondary (or demote a primary) at `primary_id`, keeping the link index in step.
    fn relink(&self, mut contact: Contact, primary_id: ContactId) -> TxResult<()> {
        if let Some(old) = contact.linked_id {
            Self::remove_id(self.links, &old.to_key(), contact.id)?;
        }
        contact.link_to(primary_id, Utc::now());
        self.put(&contact)?;
        Self::add_id(self.links, &primary_id.to_key(), contact.id)
    }

    fn linked_to(&self, primary_id: ContactId) -> TxResult<Vec<ContactId>> {
        Self::ids(self.links, &primary_id.to_key())
    }

    fn load(&self, ids: impl IntoIterator<Item = ContactId>) -> TxResult<Vec<Contact>> {
        let mut out = Vec::new();
        for id in ids {
            if let Some(contact) = self.get(id)? {
                out.push(contact);
            }
        }
        sort_by_seniority(&mut out);
        Ok(out)
    }

    fn chain(&self, primary_id: ContactId) -> TxResult<Vec<Contact>> {
        let mut ids = vec![primary_id];
        ids.extend(self.linked_to(primary_id)?);
        self.load(ids)
    }

    fn next_id(&self) -> TxResult<u64> {
        match self.meta.get(NEXT_ID_KEY)? {
            Some(raw) => {
                let bytes: [u8; 8] = raw.as_ref().try_into().map_err(|_| {
                    ConflictableTransactionError::Abort(StorageError::Serialization(
                        "Corrupt contact id counter".to_string(),
                    ))
                })?;
                Ok(u64::from_be_bytes(bytes))
            }
            None => Ok(1),
        }
    }

    fn set_next_id(&self, next: u64) -> TxResult<()> {
        self.meta.insert(NEXT_ID_KEY, next.to_be_bytes().to_vec())?;
        Ok(())
    }

    fn allocate_id(&self) -> TxResult<ContactId> {
        let next = self.next_id()?;
        self.set_next_id(next + 1)?;
        Ok(ContactId(next))
    }
}

fn stale(reason: String) -> ConflictableTransactionError<StorageError> {
    ConflictableTransactionError::Abort(StorageError::MergeTransactionFailed(reason))
}

impl ContactStore for SledContactStore {
    fn fetch_by_identifiers(
        &self,
        email: Option<&str>,
        phone_number: Option<&str>,
    ) -> Result<Vec<Contact>, StorageError> {
        self.transact(|tx| {
            let mut ids = BTreeSet::new();
            if let Some(email) = email {
                ids.extend(ContactTx::ids(tx.emails, email.as_bytes())?);
            }
            if let Some(phone) = phone_number {
                ids.extend(ContactTx::ids(tx.phones, phone.as_bytes())?);
            }
            tx.load(ids)
        })
        .map_err(from_tx_error)
    }

    fn fetch_closure(&self, chain_ids: &BTreeSet<ContactId>) -> Result<Vec<Contact>, StorageError> {
        self.transact(|tx| {
            let mut ids = BTreeSet::new();
            for &requested in chain_ids {
                // A chain demoted since the caller read it now lives under its new primary.
                let chain_id = tx.get(requested)?.map_or(requested, |c| c.chain_id());
                ids.insert(chain_id);
                ids.extend(tx.linked_to(chain_id)?);
            }
            tx.load(ids)
        })
        .map_err(from_tx_error)
    }

    fn create_primary(
        &self,
        email: Option<&str>,
        phone_number: Option<&str>,
    ) -> Result<Contact, StorageError> {
        self.transact(|tx| {
            for (kind, value) in [(IdentifierKind::Email, email), (IdentifierKind::Phone, phone_number)] {
                let Some(value) = value else { continue };
                if !ContactTx::ids(tx.index_tree(kind), value.as_bytes())?.is_empty() {
                    return Err(ConflictableTransactionError::Abort(
                        StorageError::DuplicateIdentifier {
                            field: kind,
                            value: value.to_string(),
                        },
                    ));
                }
            }
            let id = tx.allocate_id()?;
            let contact = Contact::primary(
                id,
                email.map(str::to_string),
                phone_number.map(str::to_string),
                Utc::now(),
            );
            tx.put(&contact)?;
            tx.index(&contact)?;
            Ok(contact)
        })
        .map_err(from_tx_error)
    }

    fn atomic_merge(&self, plan: &MergePlan) -> Result<Vec<Contact>, StorageError> {
        let survivor_id = plan.surviving_primary_id;
        self.transact(|tx| {
            match tx.get(survivor_id)? {
                Some(c) if c.is_primary() => {}
                Some(_) => return Err(stale(format!("contact {} is no longer a primary", survivor_id))),
                None => return Err(stale(format!("surviving primary {} not found", survivor_id))),
            }

            let mut relink = plan.relink_ids.clone();
            for &id in &plan.demoted_ids {
                let contact = tx
                    .get(id)?
                    .ok_or_else(|| stale(format!("demoted contact {} not found", id)))?;
                if contact.is_primary() {
                    relink.extend(tx.linked_to(id)?);
                    tx.relink(contact, survivor_id)?;
                } else if contact.linked_id != Some(survivor_id) {
                    return Err(stale(format!("contact {} was relinked concurrently", id)));
                }
            }

            for &id in &relink {
                let contact = tx
                    .get(id)?
                    .ok_or_else(|| stale(format!("relinked contact {} not found", id)))?;
                let linked = contact.linked_id;
                match linked {
                    Some(l) if l == survivor_id => {}
                    Some(l) if plan.demoted_ids.contains(&l) => tx.relink(contact, survivor_id)?,
                    _ => return Err(stale(format!("contact {} is not in a merged chain", id))),
                }
            }

            if let Some(new) = &plan.new_secondary {
                let chain = tx.chain(survivor_id)?;
                let email = new
                    .email
                    .clone()
                    .filter(|e| !chain.iter().any(|c| c.email.as_ref() == Some(e)));
                let phone_number = new
                    .phone_number
                    .clone()
                    .filter(|p| !chain.iter().any(|c| c.phone_number.as_ref() == Some(p)));
                if email.is_some() || phone_number.is_some() {
                    let id = tx.allocate_id()?;
                    let contact =
                        Contact::secondary(id, email, phone_number, survivor_id, Utc::now());
                    tx.put(&contact)?;
                    tx.index(&contact)?;
                }
            }

            tx.chain(survivor_id)
        })
        .map_err(|e| match from_tx_error(e) {
            err @ StorageError::MergeTransactionFailed(_) => err,
            other => StorageError::MergeTransactionFailed(other.to_string()),
        })
    }

    fn get(&self, id: ContactId) -> Result<Option<Contact>, StorageError> {
        match self.contacts.get(id.to_key()).map_err(to_storage_io)? {
            Some(raw) => Ok(Some(decode_contact(&raw)?)),
            None => Ok(None),
        }
    }

    fn list_all(&self) -> Result<Vec<Contact>, StorageError> {
        let mut records = Vec::new();
        for item in self.contacts.iter() {
            let (_, value) = item.map_err(to_storage_io)?;
            records.push(decode_contact(&value)?);
        }
        sort_by_seniority(&mut records);
        Ok(records)
    }
}

fn decode_contact(raw: &[u8]) -> Result<Contact, StorageError> {
    bincode::deserialize(raw)
        .map_err(|e| StorageError::Serialization(format!("Failed to deserialize contact: {}", e)))
}

fn from_tx_error(err: TransactionError<StorageError>) -> StorageError {
    match err {
        TransactionError::Abort(e) => e,
        TransactionError::Storage(e) => to_storage_io(e),
    }
}

fn to_storage_io(err: sled::Error) -> StorageError {
    StorageError::IoError(io::Error::new(io::ErrorKind::Other, err.to_string()))
}
