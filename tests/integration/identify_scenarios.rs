//! End-to-end identify scenarios over both store backends

use super::test_utils::{at, ids};
use contactlink::contact::{Contact, ContactId, LinkPrecedence};
use contactlink::identity::{ConsolidatedContact, IdentityService};
use contactlink::store::{ContactStore, MemoryContactStore, SledContactStore};
use std::sync::Arc;
use tempfile::TempDir;

fn consolidated(primary: u64, emails: &[&str], phones: &[&str], secondaries: &[u64]) -> ConsolidatedContact {
    ConsolidatedContact {
        primary_contact_id: ContactId(primary),
        emails: emails.iter().map(|s| s.to_string()).collect(),
        phone_numbers: phones.iter().map(|s| s.to_string()).collect(),
        secondary_contact_ids: secondaries.iter().copied().map(ContactId).collect(),
    }
}

/// Run `check` once against a memory store and once against a fresh sled store.
fn for_each_backend(check: impl Fn(Arc<dyn ContactStore>)) {
    check(Arc::new(MemoryContactStore::new()));

    let temp_dir = TempDir::new().unwrap();
    let sled = SledContactStore::new(temp_dir.path()).unwrap();
    check(Arc::new(sled));
}

fn seeded_backends(seed: Vec<Contact>, check: impl Fn(Arc<dyn ContactStore>)) {
    check(Arc::new(MemoryContactStore::with_contacts(seed.clone())));

    let temp_dir = TempDir::new().unwrap();
    let sled = SledContactStore::new(temp_dir.path()).unwrap();
    sled.put_batch(&seed).unwrap();
    check(Arc::new(sled));
}

#[test]
fn test_first_contact_becomes_primary() {
    for_each_backend(|store| {
        let service = IdentityService::new(store.clone());
        let result = service.identify(&ids(Some("a@x.com"), None)).unwrap();
        assert_eq!(result, consolidated(1, &["a@x.com"], &[], &[]));

        let all = store.list_all().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].link_precedence, LinkPrecedence::Primary);
        assert_eq!(all[0].linked_id, None);
    });
}

#[test]
fn test_new_phone_adds_secondary() {
    for_each_backend(|store| {
        let service = IdentityService::new(store.clone());
        service.identify(&ids(Some("a@x.com"), Some("111"))).unwrap();

        let result = service.identify(&ids(Some("a@x.com"), Some("222"))).unwrap();
        assert_eq!(result, consolidated(1, &["a@x.com"], &["111", "222"], &[2]));

        let secondary = store.get(ContactId(2)).unwrap().unwrap();
        assert_eq!(secondary.link_precedence, LinkPrecedence::Secondary);
        assert_eq!(secondary.linked_id, Some(ContactId(1)));
        assert_eq!(secondary.email, None);
        assert_eq!(secondary.phone_number.as_deref(), Some("222"));
    });
}

#[test]
fn test_two_primaries_merge_under_oldest() {
    for_each_backend(|store| {
        let service = IdentityService::new(store.clone());
        service.identify(&ids(Some("a@x.com"), None)).unwrap();
        service.identify(&ids(None, Some("222"))).unwrap();

        let result = service.identify(&ids(Some("a@x.com"), Some("222"))).unwrap();
        assert_eq!(result, consolidated(1, &["a@x.com"], &["222"], &[2]));

        let demoted = store.get(ContactId(2)).unwrap().unwrap();
        assert_eq!(demoted.link_precedence, LinkPrecedence::Secondary);
        assert_eq!(demoted.linked_id, Some(ContactId(1)));
        assert_eq!(store.list_all().unwrap().len(), 2, "merges never insert for known values");
    });
}

#[test]
fn test_known_request_writes_nothing() {
    for_each_backend(|store| {
        let service = IdentityService::new(store.clone());
        service.identify(&ids(Some("a@x.com"), Some("111"))).unwrap();
        service.identify(&ids(Some("a@x.com"), Some("222"))).unwrap();
        let before = store.list_all().unwrap();

        let result = service.identify(&ids(Some("a@x.com"), Some("111"))).unwrap();
        assert_eq!(result, consolidated(1, &["a@x.com"], &["111", "222"], &[2]));
        assert_eq!(store.list_all().unwrap(), before);
    });
}

#[test]
fn test_single_identifier_matching_secondary_is_read_only() {
    for_each_backend(|store| {
        let service = IdentityService::new(store.clone());
        service.identify(&ids(Some("a@x.com"), Some("111"))).unwrap();
        service.identify(&ids(Some("b@x.com"), Some("111"))).unwrap();
        let before = store.list_all().unwrap();

        let result = service.identify(&ids(Some("b@x.com"), None)).unwrap();
        assert_eq!(result, consolidated(1, &["a@x.com", "b@x.com"], &["111"], &[2]));
        assert_eq!(store.list_all().unwrap(), before);
    });
}

#[test]
fn test_repeated_requests_are_idempotent() {
    for_each_backend(|store| {
        let service = IdentityService::new(store.clone());
        let requests = [
            (Some("a@x.com"), Some("111")),
            (None, Some("222")),
            (Some("a@x.com"), Some("222")),
            (Some("c@x.com"), Some("111")),
        ];
        for (email, phone) in requests {
            let first = service.identify(&ids(email, phone)).unwrap();
            let count = store.list_all().unwrap().len();
            let second = service.identify(&ids(email, phone)).unwrap();
            assert_eq!(first, second);
            assert_eq!(store.list_all().unwrap().len(), count);
        }
    });
}

#[test]
fn test_two_primaries_and_new_identifier_in_one_merge() {
    // Two independent primaries sharing an email, as left behind by an older writer.
    let seed = vec![
        Contact::primary(ContactId(1), Some("a@x.com".into()), Some("111".into()), at(10)),
        Contact::primary(ContactId(2), Some("a@x.com".into()), Some("222".into()), at(20)),
        Contact::secondary(ContactId(3), Some("c@x.com".into()), None, ContactId(2), at(30)),
    ];
    seeded_backends(seed, |store| {
        let service = IdentityService::new(store.clone());
        let result = service.identify(&ids(Some("a@x.com"), Some("333"))).unwrap();

        assert_eq!(result.primary_contact_id, ContactId(1));
        assert_eq!(result.emails, vec!["a@x.com", "c@x.com"]);
        assert_eq!(result.phone_numbers, vec!["111", "222", "333"]);
        assert_eq!(
            result.secondary_contact_ids,
            vec![ContactId(2), ContactId(3), ContactId(4)]
        );

        let all = store.list_all().unwrap();
        assert_eq!(all.len(), 4);
        assert_eq!(all.iter().filter(|c| c.is_primary()).count(), 1);
        for contact in all.iter().filter(|c| !c.is_primary()) {
            assert_eq!(contact.linked_id, Some(ContactId(1)), "depth must stay 1");
        }
        let inserted = store.get(ContactId(4)).unwrap().unwrap();
        assert_eq!(inserted.email, None);
        assert_eq!(inserted.phone_number.as_deref(), Some("333"));
    });
}

#[test]
fn test_older_primary_with_larger_id_survives() {
    let seed = vec![
        Contact::primary(ContactId(1), Some("late@x.com".into()), None, at(50)),
        Contact::primary(ContactId(2), None, Some("999".into()), at(5)),
    ];
    seeded_backends(seed, |store| {
        let service = IdentityService::new(store.clone());
        let result = service.identify(&ids(Some("late@x.com"), Some("999"))).unwrap();
        assert_eq!(result, consolidated(2, &["late@x.com"], &["999"], &[1]));

        let demoted = store.get(ContactId(1)).unwrap().unwrap();
        assert_eq!(demoted.linked_id, Some(ContactId(2)));
        assert!(demoted.created_at >= store.get(ContactId(2)).unwrap().unwrap().created_at);
    });
}

#[test]
fn test_show_resolves_chain_from_any_member() {
    for_each_backend(|store| {
        let service = IdentityService::new(store);
        service.identify(&ids(Some("a@x.com"), Some("111"))).unwrap();
        let expected = service.identify(&ids(Some("a@x.com"), Some("222"))).unwrap();

        assert_eq!(service.consolidated_for(ContactId(1)).unwrap(), expected);
        assert_eq!(service.consolidated_for(ContactId(2)).unwrap(), expected);
        assert!(service.consolidated_for(ContactId(42)).is_err());
    });
}
