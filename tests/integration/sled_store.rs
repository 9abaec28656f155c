//! Integration tests for the sled contact store

use super::test_utils::ids;
use contactlink::contact::ContactId;
use contactlink::identity::IdentityService;
use contactlink::store::{ContactStore, SledContactStore};
use std::collections::BTreeSet;
use std::sync::Arc;
use tempfile::TempDir;

#[test]
fn test_chains_survive_reopen() {
    let temp_dir = TempDir::new().unwrap();

    {
        let store = SledContactStore::new(temp_dir.path()).unwrap();
        let service = IdentityService::new(Arc::new(store.clone()));
        service.identify(&ids(Some("a@x.com"), Some("111"))).unwrap();
        service.identify(&ids(Some("a@x.com"), Some("222"))).unwrap();
        store.flush().unwrap();
    }

    let store = SledContactStore::new(temp_dir.path()).unwrap();
    let service = IdentityService::new(Arc::new(store.clone()));
    let result = service.identify(&ids(None, Some("222"))).unwrap();
    assert_eq!(result.primary_contact_id, ContactId(1));
    assert_eq!(result.phone_numbers, vec!["111", "222"]);

    let fresh = service.identify(&ids(Some("b@x.com"), None)).unwrap();
    assert_eq!(fresh.primary_contact_id, ContactId(3), "ids are never reused");
}

#[test]
fn test_closure_includes_secondaries_of_each_chain() {
    let temp_dir = TempDir::new().unwrap();
    let store = SledContactStore::new(temp_dir.path()).unwrap();
    let service = IdentityService::new(Arc::new(store.clone()));
    service.identify(&ids(Some("a@x.com"), Some("111"))).unwrap();
    service.identify(&ids(Some("b@x.com"), Some("111"))).unwrap();
    service.identify(&ids(Some("z@x.com"), None)).unwrap();

    let chain: BTreeSet<ContactId> = [ContactId(1)].into_iter().collect();
    let closure = store.fetch_closure(&chain).unwrap();
    let closure_ids: Vec<u64> = closure.iter().map(|c| c.id.as_u64()).collect();
    assert_eq!(closure_ids, vec![1, 2]);
}

#[test]
fn test_absent_identifier_never_matches_null_fields() {
    let temp_dir = TempDir::new().unwrap();
    let store = SledContactStore::new(temp_dir.path()).unwrap();
    store.create_primary(Some("a@x.com"), None).unwrap();
    store.create_primary(None, Some("111")).unwrap();

    assert_eq!(store.fetch_by_identifiers(Some("a@x.com"), None).unwrap().len(), 1);
    assert_eq!(store.fetch_by_identifiers(None, Some("111")).unwrap().len(), 1);
    assert!(store.fetch_by_identifiers(None, None).unwrap().is_empty());
}
