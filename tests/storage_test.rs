//! Integration tests for snapshot storage behavior.
//!
//! These cover the load/save contract: missing files initialize to a valid
//! empty array, malformed files fail fast instead of masquerading as an
//! empty collection, and every save is a complete, reloadable snapshot.

use std::fs;

use chrono::{Duration, Local};
use taskchime::storage::{Storage, StorageError};
use taskchime::task::Task;
use tempfile::tempdir;

#[test]
fn missing_file_initializes_to_valid_empty_array() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("tasks.json");
    let storage = Storage::new(path.clone());

    let tasks = storage.load().unwrap();
    assert!(tasks.is_empty());

    // The created file must itself be a loadable snapshot.
    assert!(path.exists());
    let reloaded = Storage::new(path).load().unwrap();
    assert!(reloaded.is_empty());
}

#[test]
fn malformed_file_fails_fast_with_corrupt_storage() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("tasks.json");
    fs::write(&path, "]{ definitely not json").unwrap();

    let err = Storage::new(path.clone()).load().unwrap_err();
    assert!(matches!(err, StorageError::Corrupt { .. }));

    // The corrupt file is left untouched for the user to inspect.
    assert_eq!(fs::read_to_string(&path).unwrap(), "]{ definitely not json");
}

#[test]
fn truncated_array_is_corrupt_not_empty() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("tasks.json");
    fs::write(&path, r#"[{"text": "half a task"#).unwrap();

    assert!(matches!(
        Storage::new(path).load().unwrap_err(),
        StorageError::Corrupt { .. }
    ));
}

#[test]
fn every_save_is_a_complete_reloadable_snapshot() {
    let dir = tempdir().unwrap();
    let storage = Storage::new(dir.path().join("tasks.json"));

    let mut tasks = vec![Task::new(
        "first".to_string(),
        Local::now() + Duration::hours(1),
    )];
    storage.save(&tasks).unwrap();
    assert_eq!(storage.load().unwrap(), tasks);

    tasks.push(Task::new(
        "second".to_string(),
        Local::now() + Duration::hours(2),
    ));
    storage.save(&tasks).unwrap();
    assert_eq!(storage.load().unwrap(), tasks);

    tasks.remove(0);
    storage.save(&tasks).unwrap();
    assert_eq!(storage.load().unwrap(), tasks);
}

#[test]
fn identifiers_survive_the_file_round_trip() {
    let dir = tempdir().unwrap();
    let storage = Storage::new(dir.path().join("tasks.json"));

    let deadline = Local::now() + Duration::minutes(30);
    let twins = vec![
        Task::new("same text".to_string(), deadline),
        Task::new("same text".to_string(), deadline),
    ];
    storage.save(&twins).unwrap();

    let loaded = storage.load().unwrap();
    assert_eq!(loaded.len(), 2);
    assert_eq!(loaded[0].id, twins[0].id);
    assert_eq!(loaded[1].id, twins[1].id);
    assert_ne!(loaded[0].id, loaded[1].id);
}

#[test]
fn pre_identifier_files_load_with_fresh_ids() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("tasks.json");
    fs::write(
        &path,
        r#"[
            {"text": "Buy milk", "deadline": "2030-01-01T09:00:00+00:00"},
            {"text": "Call home", "deadline": "2030-01-02T09:00:00+00:00"}
        ]"#,
    )
    .unwrap();

    let loaded = Storage::new(path).load().unwrap();
    assert_eq!(loaded.len(), 2);
    assert_ne!(loaded[0].id, loaded[1].id);
}
