//! Tests for opening, configuring and closing databases
//! Run with: cargo test --test database_test

use sqlite_facade::{sqlite_version, Database, DatabaseConfig, Error, JournalMode, Result, MEMORY};

#[test]
fn test_open_in_memory() -> Result<()> {
    let db = Database::open(MEMORY)?;
    assert!(db.is_open());
    assert_eq!(db.path(), ":memory:");
    assert_eq!(db.version(), sqlite_version());
    assert!(db.version().starts_with('3'));
    Ok(())
}

#[test]
fn test_open_missing_directory_is_connection_error() {
    let err = Database::open("/definitely/not/a/real/dir/test.db").unwrap_err();
    match err {
        Error::Connection { path, .. } => assert!(path.ends_with("test.db")),
        other => panic!("unexpected error: {:?}", other),
    }
}

#[test]
fn test_close_is_idempotent() -> Result<()> {
    let mut db = Database::memory()?;
    db.close()?;
    assert!(!db.is_open());
    db.close()?;
    assert!(!db.is_open());
    Ok(())
}

#[test]
fn test_closed_database_reports_errors() -> Result<()> {
    let mut db = Database::memory()?;
    db.close()?;

    let mut q = db.query("SELECT 1");
    let status = q.exec();
    assert!(!status.is_ok());
    assert!(matches!(q.store(), Err(Error::Closed)));
    assert!(matches!(db.vacuum(), Err(Error::Closed)));
    assert!(matches!(db.transaction(), Err(Error::Closed)));
    Ok(())
}

#[test]
fn test_file_database_persists_and_vacuums() -> Result<()> {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("persist.db");
    let path = path.to_str().unwrap();

    {
        let db = Database::open(path)?;
        db.execute_batch(
            "CREATE TABLE items (id INTEGER PRIMARY KEY, name TEXT);
             INSERT INTO items (name) VALUES ('a'), ('b'), ('c');
             DELETE FROM items WHERE name = 'b';",
        )?;
        db.vacuum()?;
    }

    let db = Database::open(path)?;
    let names = db.query("SELECT name FROM items ORDER BY id").store()?;
    assert_eq!(names.num_rows(), 2);
    assert_eq!(names.row(0)?.get::<String, _>("name")?, "a");
    assert_eq!(names.row(1)?.get::<String, _>("name")?, "c");
    Ok(())
}

#[test]
fn test_read_only_config_rejects_writes() -> Result<()> {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("readonly.db");
    let path = path.to_str().unwrap();

    let config = DatabaseConfig {
        journal_mode: JournalMode::Delete,
        ..DatabaseConfig::default()
    };
    {
        let db = Database::open_with(path, &config)?;
        db.execute_batch("CREATE TABLE t (v INTEGER); INSERT INTO t VALUES (1);")?;
    }

    let read_only = DatabaseConfig {
        read_only: true,
        ..config
    };
    let db = Database::open_with(path, &read_only)?;
    let mut q = db.query("INSERT INTO t VALUES (2)");
    let status = q.exec();
    assert!(!status.is_ok());

    let count: i64 = db.query("SELECT COUNT(*) FROM t").store()?.row(0)?.get(0)?;
    assert_eq!(count, 1);
    Ok(())
}

#[test]
fn test_config_foreign_keys() -> Result<()> {
    let schema = "CREATE TABLE parent (id INTEGER PRIMARY KEY);
                  CREATE TABLE child (id INTEGER PRIMARY KEY, parent_id INTEGER REFERENCES parent(id));";

    let enforced = Database::memory()?;
    enforced.execute_batch(schema)?;
    let status = enforced.query("INSERT INTO child (parent_id) VALUES (99)").exec();
    assert!(!status.is_ok());

    let relaxed_config = DatabaseConfig::from_json(r#"{"foreignKeys": false}"#)?;
    let relaxed = Database::open_with(MEMORY, &relaxed_config)?;
    relaxed.execute_batch(schema)?;
    let status = relaxed.query("INSERT INTO child (parent_id) VALUES (99)").exec();
    assert!(status.is_ok());
    Ok(())
}

#[test]
fn test_execute_batch_error_is_execution_error() -> Result<()> {
    let db = Database::memory()?;
    match db.execute_batch("CREATE TABLE") {
        Err(Error::Execution { code, .. }) => assert_ne!(code, 0),
        other => panic!("unexpected result: {:?}", other),
    }
    Ok(())
}
