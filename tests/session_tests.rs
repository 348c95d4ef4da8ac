use std::fs;

use article_portal::{
    models::{Role, Session},
    session::{FileSessionStore, SessionStore},
};
use tempfile::tempdir;

#[test]
fn test_session_survives_a_new_store_instance() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("nested").join("session.json");

    FileSessionStore::new(&path)
        .save(&Session::new("tok", Role::Admin, "boss"))
        .unwrap();

    // A fresh instance stands in for a restarted client.
    let reopened = FileSessionStore::new(&path);
    let session = reopened.load();
    assert_eq!(session.token.as_deref(), Some("tok"));
    assert_eq!(session.role, Some(Role::Admin));
    assert_eq!(session.username, "boss");
    assert_eq!(reopened.token().as_deref(), Some("tok"));
    assert!(reopened.role().is_some_and(|r| r.is_admin()));
}

#[test]
fn test_missing_file_is_anonymous() {
    let dir = tempdir().unwrap();
    let store = FileSessionStore::new(dir.path().join("absent.json"));
    assert_eq!(store.load(), Session::anonymous());
}

#[test]
fn test_corrupt_file_is_anonymous() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("session.json");
    fs::write(&path, b"{not json").unwrap();

    assert_eq!(FileSessionStore::new(&path).load(), Session::anonymous());
}

#[test]
fn test_half_session_on_disk_loads_as_anonymous() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("session.json");
    fs::write(&path, br#"{"token":null,"role":"Admin","username":"boss"}"#).unwrap();

    let session = FileSessionStore::new(&path).load();
    assert_eq!(session.token, None);
    assert_eq!(session.role, None);
    assert_eq!(session.username, "boss");
}

#[test]
fn test_token_without_role_is_never_written() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("session.json");
    let store = FileSessionStore::new(&path);

    store
        .save(&Session {
            token: Some("tok".to_string()),
            role: None,
            username: "x".to_string(),
        })
        .unwrap();

    let raw = fs::read_to_string(&path).unwrap();
    assert!(!raw.contains("tok\""));
    assert!(!store.load().is_authenticated());
}

#[test]
fn test_clear_removes_everything_and_is_idempotent() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("session.json");
    let store = FileSessionStore::new(&path);
    store.save(&Session::new("tok", Role::User, "reader")).unwrap();

    store.clear().unwrap();
    assert!(!path.exists());
    assert_eq!(store.load(), Session::anonymous());

    store.clear().unwrap();
}

#[test]
fn test_unknown_role_is_preserved() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("session.json");
    let store = FileSessionStore::new(&path);
    store
        .save(&Session::new("tok", Role::parse("Editor"), "ed"))
        .unwrap();

    let role = store.role().unwrap();
    assert_eq!(role.as_str(), "Editor");
    assert!(!role.is_admin());
}
