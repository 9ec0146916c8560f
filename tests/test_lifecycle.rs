use lmdbm::{remove, Database, Datum, Error, OpenMode, OpenOptions, DATA_FILE, LOCK_FILE};
use std::fs;
use tempfile::TempDir;

#[test]
fn test_readonly_missing_store() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("missing.db");

    let err = Database::open(&path, OpenMode::ReadOnly).unwrap_err();
    assert!(matches!(err, Error::StoreNotFound(_)));
    assert!(!path.exists());

    let err = Database::open(&path, OpenMode::ReadWriteExisting).unwrap_err();
    assert!(matches!(err, Error::StoreNotFound(_)));
    assert!(!path.exists());
}

#[test]
fn test_create_writes_store_files() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("nested").join("store.db");

    let db = Database::open(&path, OpenMode::CreateIfAbsent).unwrap();
    assert!(path.join(DATA_FILE).is_file());
    assert!(path.join(LOCK_FILE).is_file());
    assert!(db.is_empty().unwrap());
}

#[test]
fn test_persistence_across_reopen() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("persist.db");

    {
        let mut db = Database::open(&path, OpenMode::CreateIfAbsent).unwrap();
        db.update([("a", "1"), ("b", "2")]).unwrap();
    }

    // Dropping released the store, so it can be opened again
    let mut db = Database::open(&path, OpenMode::ReadWriteExisting).unwrap();
    assert_eq!(db.get("b").unwrap(), Datum::from("2"));
    db.set("c", "3").unwrap();
    db.close().unwrap();

    let db = Database::open(&path, OpenMode::CreateIfAbsent).unwrap();
    assert_eq!(db.len().unwrap(), 3);
}

#[test]
fn test_readonly_rejects_writes() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("ro.db");

    let mut db = Database::open(&path, OpenMode::CreateIfAbsent).unwrap();
    db.set("a", "1").unwrap();
    db.close().unwrap();

    let mut db = lmdbm::open(&path, "r").unwrap();
    assert_eq!(db.mode(), OpenMode::ReadOnly);
    assert_eq!(db.get("a").unwrap(), Datum::from("1"));

    assert!(matches!(db.set("b", "2"), Err(Error::PermissionDenied(_))));
    assert!(matches!(db.delete("a"), Err(Error::PermissionDenied(_))));
    assert!(matches!(db.update([("c", "3")]), Err(Error::PermissionDenied(_))));
    assert!(matches!(db.clear(), Err(Error::PermissionDenied(_))));
    assert_eq!(db.len().unwrap(), 1);
}

#[test]
fn test_recreate_fresh_discards_contents() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("fresh.db");

    let mut db = lmdbm::open(&path, "c").unwrap();
    db.set("a", "1").unwrap();
    db.close().unwrap();

    let db = lmdbm::open(&path, "n").unwrap();
    assert!(db.is_empty().unwrap());
    assert!(!db.contains("a").unwrap());
}

#[test]
fn test_unknown_flag() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("flag.db");

    let err = lmdbm::open(&path, "x").unwrap_err();
    assert!(matches!(err, Error::InvalidArgument(_)));
    assert!(!path.exists());
}

#[test]
fn test_closed_database() {
    let temp_dir = TempDir::new().unwrap();
    let mut db = Database::open(temp_dir.path().join("closed.db"), OpenMode::CreateIfAbsent).unwrap();
    db.set("a", "1").unwrap();

    db.close().unwrap();
    assert!(!db.is_open());
    // Closing twice is fine
    db.close().unwrap();

    assert!(matches!(db.get("a"), Err(Error::Closed)));
    assert!(matches!(db.len(), Err(Error::Closed)));
    assert!(matches!(db.set("b", "2"), Err(Error::Closed)));
    assert!(matches!(db.capacity(), Err(Error::Closed)));
    assert!(db.snapshot().is_err());
}

#[test]
fn test_reopen_with_small_map_size() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("grown.db");

    let mut db = OpenOptions::new()
        .mode(OpenMode::CreateIfAbsent)
        .map_size(1)
        .open(&path)
        .unwrap();
    db.set("big", vec![3u8; 256 * 1024]).unwrap();
    db.close().unwrap();

    let db = OpenOptions::new()
        .mode(OpenMode::ReadWriteExisting)
        .map_size(1)
        .open(&path)
        .unwrap();
    // The map is never smaller than the data already on disk
    assert!(db.capacity().unwrap() >= 256 * 1024);
    assert_eq!(db.get("big").unwrap().len(), 256 * 1024);
}

#[test]
fn test_remove_store() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("gone.db");

    let mut db = Database::open(&path, OpenMode::CreateIfAbsent).unwrap();
    db.set("a", "1").unwrap();
    db.close().unwrap();

    remove(&path, false).unwrap();
    assert!(!path.exists());

    // Second removal only succeeds when missing artifacts are tolerated
    assert!(matches!(remove(&path, false), Err(Error::MissingArtifact(_))));
    remove(&path, true).unwrap();
}

#[test]
fn test_remove_refuses_non_empty_directory() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("shared.db");

    drop(Database::open(&path, OpenMode::CreateIfAbsent).unwrap());
    fs::write(path.join("notes.txt"), b"keep me").unwrap();

    assert!(remove(&path, true).is_err());
    assert!(!path.join(DATA_FILE).exists());
    assert!(path.join("notes.txt").exists());
}

#[test]
fn test_second_open_of_same_path_is_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("shared.db");

    let mut first = lmdbm::open(&path, "c").unwrap();
    first.set("a", "1").unwrap();

    assert!(matches!(lmdbm::open(&path, "c"), Err(Error::AlreadyOpen(_))));
    assert!(matches!(lmdbm::open(&path, "r"), Err(Error::AlreadyOpen(_))));

    // Recreating must not touch the files of the open store
    assert!(matches!(lmdbm::open(&path, "n"), Err(Error::AlreadyOpen(_))));
    assert!(path.join(DATA_FILE).is_file());
    assert_eq!(first.get("a").unwrap(), Datum::from("1"));

    // A differently spelled path to the same directory is the same store
    let aliased = temp_dir.path().join(".").join("shared.db");
    assert!(matches!(lmdbm::open(&aliased, "w"), Err(Error::AlreadyOpen(_))));

    drop(first);
    let reopened = lmdbm::open(&path, "w").unwrap();
    assert_eq!(reopened.get("a").unwrap(), Datum::from("1"));
}

#[test]
fn test_close_releases_path() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("released.db");

    let mut first = lmdbm::open(&path, "c").unwrap();
    first.set("a", "1").unwrap();
    first.close().unwrap();

    let second = lmdbm::open(&path, "n").unwrap();
    assert!(second.is_empty().unwrap());
}

#[test]
fn test_get_or_insert_on_readonly_store() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("ro_default.db");

    let mut db = lmdbm::open(&path, "c").unwrap();
    db.set("k", "v").unwrap();
    db.close().unwrap();

    let mut db = lmdbm::open(&path, "r").unwrap();
    assert_eq!(db.get_or_insert("k", "d").unwrap(), Datum::from("v"));
    assert!(matches!(db.get_or_insert("missing", "d"), Err(Error::PermissionDenied(_))));
    assert_eq!(db.len().unwrap(), 1);
}
