use music_core::db::migrations::{current_version, latest_version};
use music_core::db::{open_db, open_db_in_memory, DbError};
use rusqlite::Connection;

#[test]
fn open_db_in_memory_applies_all_migrations() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(current_version(&conn).unwrap(), latest_version());
    assert_table_exists(&conn, "bands");
    assert_table_exists(&conn, "albums");
    assert_table_exists(&conn, "songs");
}

#[test]
fn opened_connections_enforce_foreign_keys() {
    let conn = open_db_in_memory().unwrap();
    let enabled: i64 = conn
        .query_row("PRAGMA foreign_keys;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(enabled, 1);
}

#[test]
fn opening_same_database_twice_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("music.db");

    let conn_first = open_db(&path).unwrap();
    conn_first
        .execute("INSERT INTO bands (name) VALUES ('Radiohead');", [])
        .unwrap();
    drop(conn_first);

    let conn_second = open_db(&path).unwrap();
    assert_eq!(current_version(&conn_second).unwrap(), latest_version());
    let bands: i64 = conn_second
        .query_row("SELECT COUNT(*) FROM bands;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(bands, 1);
}

#[test]
fn opening_database_with_newer_schema_version_returns_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    let err = open_db(&path).unwrap_err();
    match err {
        DbError::UnsupportedSchemaVersion {
            db_version,
            latest_supported,
        } => {
            assert_eq!(db_version, 999);
            assert_eq!(latest_supported, latest_version());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn failing_migration_names_the_step_and_keeps_previous_version() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("half_built.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("CREATE TABLE bands (id INTEGER PRIMARY KEY);")
        .unwrap();
    drop(conn);

    let err = open_db(&path).unwrap_err();
    match &err {
        DbError::Migration { version, name, .. } => {
            assert_eq!(*version, 1);
            assert_eq!(*name, "catalog_tables");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(std::error::Error::source(&err).is_some());
    assert!(err.to_string().contains("catalog migration 1 (catalog_tables)"));

    let conn = Connection::open(&path).unwrap();
    assert_eq!(current_version(&conn).unwrap(), 0);
    let albums: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'albums';",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(albums, 0);
}

fn assert_table_exists(conn: &Connection, table_name: &str) {
    let exists: i64 = conn
        .query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'table' AND name = ?1
            );",
            [table_name],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(exists, 1, "table {table_name} does not exist");
}
