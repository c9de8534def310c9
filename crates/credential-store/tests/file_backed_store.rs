//! Credential store behavior over the file backend.

use credential_store::{
    CredentialStore, FileStorage, SessionRecord, SessionStorage, TokenSet, UserProfile,
};
use std::sync::Arc;
use tempfile::tempdir;

fn record() -> SessionRecord {
    SessionRecord::new(
        TokenSet::new("x", 3600, "bearer").with_refresh_token("r"),
        UserProfile::new("alice").with_attribute("id", "1234"),
    )
}

#[test]
fn test_record_persists_across_store_instances() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("local_storage.json");

    CredentialStore::new(Arc::new(FileStorage::new(&path)))
        .save(&record())
        .unwrap();

    let reopened = CredentialStore::new(Arc::new(FileStorage::new(&path)));
    assert_eq!(reopened.load(), Some(record()));
}

#[test]
fn test_persisted_json_uses_snake_case_wire_format() {
    let dir = tempdir().unwrap();
    let storage = Arc::new(FileStorage::new(dir.path().join("local_storage.json")));
    let store = CredentialStore::new(storage.clone());

    store.save(&record()).unwrap();

    let raw = storage.get(store.key()).unwrap().unwrap();
    let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(value["token"]["access_token"], "x");
    assert_eq!(value["token"]["refresh_token"], "r");
    assert_eq!(value["token"]["expires_in"], 3600);
    assert_eq!(value["user"]["username"], "alice");
    assert_eq!(value["user"]["id"], "1234");
}

#[test]
fn test_invalid_file_record_is_purged_from_disk() {
    let dir = tempdir().unwrap();
    let storage = Arc::new(FileStorage::new(dir.path().join("local_storage.json")));
    let store = CredentialStore::new(storage.clone());
    storage
        .set(store.key(), r#"{"token":{"access_token":"x"}}"#)
        .unwrap();

    assert!(store.load().is_none());

    let reopened = FileStorage::new(dir.path().join("local_storage.json"));
    assert_eq!(reopened.get(store.key()).unwrap(), None);
}

#[test]
fn test_unreadable_storage_file_loads_as_absent() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("local_storage.json");
    std::fs::write(&path, "[broken").unwrap();

    let store = CredentialStore::new(Arc::new(FileStorage::new(&path)));
    assert!(store.load().is_none());

    store.save(&record()).unwrap();
    assert_eq!(store.load(), Some(record()));
}

#[test]
fn test_clear_resets_unreadable_storage_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("local_storage.json");
    std::fs::write(&path, "[broken").unwrap();
    let store = CredentialStore::new(Arc::new(FileStorage::new(&path)));

    store.clear().unwrap();

    assert!(!store.has_persisted().unwrap());
    let reopened = FileStorage::new(&path);
    assert_eq!(reopened.get(store.key()).unwrap(), None);
}
