//! Concurrent identify calls against a shared store

use super::test_utils::ids;
use contactlink::contact::ContactId;
use contactlink::identity::IdentityService;
use contactlink::store::{ContactStore, MemoryContactStore, SledContactStore};
use std::sync::Arc;
use std::thread;
use tempfile::TempDir;

const THREADS: usize = 8;

fn race_same_identifier(store: Arc<dyn ContactStore>) {
    let service = IdentityService::new(store.clone());
    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let service = service.clone();
            thread::spawn(move || service.identify(&ids(Some("race@x.com"), None)))
        })
        .collect();

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    for result in &results {
        let contact = result.as_ref().expect("a lost insert race resolves on retry");
        assert_eq!(contact.primary_contact_id, ContactId(1));
    }

    let all = store.list_all().unwrap();
    assert_eq!(all.len(), 1, "exactly one primary for a contested identifier");
    assert!(all[0].is_primary());
}

#[test]
fn test_concurrent_first_contact_memory() {
    race_same_identifier(Arc::new(MemoryContactStore::new()));
}

#[test]
fn test_concurrent_first_contact_sled() {
    let temp_dir = TempDir::new().unwrap();
    race_same_identifier(Arc::new(SledContactStore::new(temp_dir.path()).unwrap()));
}

#[test]
fn test_concurrent_distinct_identifiers_get_distinct_ids() {
    let temp_dir = TempDir::new().unwrap();
    let store: Arc<dyn ContactStore> = Arc::new(SledContactStore::new(temp_dir.path()).unwrap());
    let service = IdentityService::new(store.clone());

    let handles: Vec<_> = (0..THREADS)
        .map(|i| {
            let service = service.clone();
            thread::spawn(move || {
                let email = format!("user{}@x.com", i);
                service.identify(&ids(Some(email.as_str()), None))
            })
        })
        .collect();

    let mut primary_ids: Vec<ContactId> = handles
        .into_iter()
        .map(|h| h.join().unwrap().unwrap().primary_contact_id)
        .collect();
    primary_ids.sort();
    primary_ids.dedup();
    assert_eq!(primary_ids.len(), THREADS);
    assert_eq!(store.list_all().unwrap().len(), THREADS);
}
