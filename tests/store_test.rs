//! Member store integration tests
//!
//! SQLite persistence on disk: reopen, WAL mode, upsert semantics.

use onboard::member::{DiscordProfile, EthicsForm, MemberRecord, MemberStore};
use rusqlite::Connection;
use tempfile::TempDir;

fn sample() -> MemberRecord {
    let mut record = MemberRecord::new("424242");
    record.first_name = "Grace".into();
    record.surname = "Hopper".into();
    record.discord = Some(DiscordProfile {
        username: "amazing_grace".into(),
        email: Some("grace@example.com".into()),
        ..Default::default()
    });
    record.ethics_form = Some(EthicsForm::default());
    record
}

#[test]
fn test_records_survive_reopen() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("onboard.db");
    let record = sample();

    {
        let store = MemberStore::open(&path).unwrap();
        store.insert(&record).unwrap();
    }

    let store = MemberStore::open(&path).unwrap();
    assert_eq!(store.get(record.id).unwrap(), Some(record.clone()));
    assert_eq!(store.get_by_discord_id("424242").unwrap(), Some(record));
}

#[test]
fn test_open_creates_parent_dirs() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("data").join("onboard.db");

    let store = MemberStore::open(&path).unwrap();
    assert_eq!(store.count().unwrap(), 0);
    assert!(path.exists());
}

#[test]
fn test_wal_mode_enabled() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("onboard.db");
    let _store = MemberStore::open(&path).unwrap();

    let db = Connection::open(&path).unwrap();
    let mode: String = db
        .query_row("PRAGMA journal_mode;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(mode, "wal");
}

#[test]
fn test_save_is_last_write_wins() {
    let dir = TempDir::new().unwrap();
    let store = MemberStore::open(dir.path().join("onboard.db")).unwrap();

    let mut first = sample();
    store.insert(&first).unwrap();

    let mut second = first.clone();
    second.major = "Information Technology".into();
    first.shirt_size = "L".into();

    store.save(&second).unwrap();
    store.save(&first).unwrap();

    let loaded = store.get(first.id).unwrap().unwrap();
    assert_eq!(loaded.shirt_size, "L");
    assert_eq!(loaded.major, "");
    assert_eq!(store.count().unwrap(), 1);
}

#[test]
fn test_corrupt_row_is_database_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("onboard.db");
    let store = MemberStore::open(&path).unwrap();
    let record = sample();
    store.insert(&record).unwrap();

    let db = Connection::open(&path).unwrap();
    db.execute(
        "UPDATE members SET data = 'not json' WHERE id = ?1",
        [record.id.to_string()],
    )
    .unwrap();

    let err = store.get(record.id).unwrap_err();
    assert!(matches!(err, onboard::OnboardError::Database(_)));
}
