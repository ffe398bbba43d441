//! Tests for the persistent unconfirmed-transaction store.

use aureus_chain::transaction::UnconfirmedTx;

use crate::components::mempool::tests::test_payment;

use super::*;

impl Storage {
    /// Writes a raw row, bypassing the encoder, to simulate on-disk
    /// corruption.
    fn insert_raw(&self, id: TransactionId, value: &[u8]) {
        self.unconfirmed
            .insert(id.0.to_be_bytes(), value)
            .expect("raw insert succeeds");
    }
}

fn entry(seed: u64) -> UnconfirmedTx {
    UnconfirmedTx::from(test_payment(seed))
}

#[test]
fn storage_crud() {
    let storage = Storage::temporary();
    let entry = entry(1);

    assert!(storage.is_empty());
    storage.insert(&entry).expect("insert succeeds");

    assert!(storage.contains(entry.id));
    assert_eq!(storage.len(), 1);
    let loaded = storage
        .get(entry.id)
        .expect("get succeeds")
        .expect("the entry is present");
    assert_eq!(loaded, entry);

    let removed = storage
        .delete(entry.id)
        .expect("delete succeeds")
        .expect("the entry was present");
    assert_eq!(removed.id, entry.id);
    assert!(!storage.contains(entry.id));
    assert!(storage
        .delete(entry.id)
        .expect("deleting again succeeds")
        .is_none());
}

#[test]
fn rows_are_reparsed_on_load() {
    let storage = Storage::temporary();
    let entry = entry(2);
    storage.insert(&entry).expect("insert succeeds");

    let loaded = storage
        .get(entry.id)
        .expect("get succeeds")
        .expect("the entry is present");
    assert_eq!(loaded.transaction.as_ref(), entry.transaction.as_ref());
    assert_eq!(loaded.transaction.id(), entry.id);
}

#[test]
fn iter_returns_every_entry() {
    let storage = Storage::temporary();
    let entries = [entry(1), entry(2), entry(3)];
    for entry in &entries {
        storage.insert(entry).expect("insert succeeds");
    }

    let mut ids: Vec<_> = storage
        .iter()
        .map(|entry| entry.expect("every row parses").id)
        .collect();
    ids.sort();
    let mut expected: Vec<_> = entries.iter().map(|entry| entry.id).collect();
    expected.sort();
    assert_eq!(ids, expected);
}

#[test]
fn sweep_removes_exactly_the_expired_rows() {
    let storage = Storage::temporary();

    let mut expired = entry(1);
    expired.expiration = 100;
    let mut fresh = entry(2);
    fresh.expiration = 200;
    storage.insert(&expired).expect("insert succeeds");
    storage.insert(&fresh).expect("insert succeeds");

    let removed = storage.sweep_expired(150).expect("sweep succeeds");
    assert_eq!(removed.len(), 1);
    assert_eq!(removed[0].id, expired.id);
    assert!(!storage.contains(expired.id));
    assert!(storage.contains(fresh.id));

    // the boundary is strict: expiration == now survives
    let removed = storage.sweep_expired(200).expect("sweep succeeds");
    assert!(removed.is_empty());
    let removed = storage.sweep_expired(201).expect("sweep succeeds");
    assert_eq!(removed.len(), 1);
    assert!(storage.is_empty());
}

#[test]
fn upsert_replaces_the_expiry_index_entry() {
    let storage = Storage::temporary();

    let mut entry = entry(1);
    entry.expiration = 100;
    storage.insert(&entry).expect("insert succeeds");

    // the same row comes back with a later expiry
    entry.expiration = 300;
    storage.insert(&entry).expect("re-insert succeeds");
    assert_eq!(storage.len(), 1);

    // a sweep between the two expiries must not remove the row through
    // the stale index entry
    let removed = storage.sweep_expired(200).expect("sweep succeeds");
    assert!(removed.is_empty());
    assert!(storage.contains(entry.id));

    let removed = storage.sweep_expired(301).expect("sweep succeeds");
    assert_eq!(removed.len(), 1);
}

#[test]
fn corrupt_rows_are_fatal() {
    let storage = Storage::temporary();
    let id = TransactionId(77);
    storage.insert_raw(id, b"not a transaction row");

    let error = storage.get(id).expect_err("corrupt rows must not load");
    assert!(error.is_fatal());
    assert!(matches!(error, StorageError::Corrupt { id: 77, .. }));

    let iter_error = storage
        .iter()
        .next()
        .expect("the corrupt row is iterated")
        .expect_err("corrupt rows must not load");
    assert!(iter_error.is_fatal());
}

#[test]
fn entries_survive_delete_of_others() {
    let storage = Storage::temporary();
    let first = entry(1);
    let second = entry(2);
    storage.insert(&first).expect("insert succeeds");
    storage.insert(&second).expect("insert succeeds");

    storage.delete(first.id).expect("delete succeeds");
    assert!(storage.contains(second.id));
    assert_eq!(storage.len(), 1);
}
