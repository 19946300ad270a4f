//!
//! # Integration Tests for stepsql
//!
//! End-to-end tests against a database file in a temporary directory:
//! inserting and selecting typed rows, reusing prepared statements,
//! streaming with cursors, the dynamic `Value` path, and round-trips of
//! every supported kind.
//!

use std::path::Path;
use tempfile::TempDir;

use stepsql::{Database, DatabaseConfig, Error, ErrorKind, Kind, Statement, Value};

fn create_people(path: &Path) -> Database {
    let db = Database::open(path);
    assert!(db.is_open(), "Database should open at {}", path.display());

    db.execute_batch(
        "CREATE TABLE people (
            id INTEGER PRIMARY KEY,
            name TEXT,
            age INTEGER,
            data BLOB
        );",
    )
    .expect("Failed to create people table");

    let mut insert: Statement = db
        .prepare("INSERT INTO people (name, age, data) VALUES (?, ?, ?)")
        .expect("Failed to prepare insert");
    let rows: [(&str, i64, &[u8]); 4] = [
        ("john", 10, b"ABCD"),
        ("paul", 20, b"EBGH"),
        ("mark", 15, b"IJKL"),
        ("luke", 25, b"MNOP"),
    ];
    for row in rows {
        insert.execute(row).expect("Failed to insert person");
    }
    db
}

fn people_db() -> (TempDir, Database) {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let db = create_people(&temp_dir.path().join("test.db"));
    (temp_dir, db)
}

#[test]
fn test_select_integer_text_and_blob() {
    let (_dir, db) = people_db();

    let age: i64 = db
        .execute_value("SELECT age FROM people WHERE name='john'", ())
        .expect("Failed to select age");
    assert_eq!(age, 10);

    let name: String = db
        .execute_value("SELECT name FROM people WHERE name='john'", ())
        .expect("Failed to select name");
    assert_eq!(name, "john");

    let data: Vec<u8> = db
        .execute_value("SELECT data FROM people WHERE name='john'", ())
        .expect("Failed to select data");
    assert_eq!(data.len(), 4);
    assert_eq!(data[0], b'A');
    assert_eq!(data[3], b'D');
}

#[test]
fn test_select_multiple_columns() {
    let (_dir, db) = people_db();

    let rows: Vec<(i64, String)> = db
        .query("SELECT age, name FROM people", ())
        .expect("Failed to select rows");
    assert_eq!(rows.len(), 4);
    assert_eq!(rows[3], (25, "luke".to_string()));
}

#[test]
fn test_prepared_statement_rebinds() {
    let (_dir, db) = people_db();
    let mut stmt = db
        .prepare::<String>("SELECT name FROM people WHERE age > ?")
        .expect("Failed to prepare");

    let names = stmt.query(10).expect("Failed to query ages above 10");
    assert_eq!(names.len(), 3);
    assert_eq!(names[0], "paul");

    let names = stmt.query(20).expect("Failed to query ages above 20");
    assert_eq!(names, vec!["luke".to_string()]);
}

#[test]
fn test_scalar_with_no_matching_row() {
    let (_dir, db) = people_db();
    let sql = "SELECT age FROM people WHERE name='nobody'";

    let err = db
        .execute_value::<i64, _>(sql, ())
        .expect_err("An empty result has no value");
    assert!(matches!(err, Error::NotFound));
    assert_eq!(err.kind(), ErrorKind::NotFound);

    let age: Option<i64> = db.execute_optional(sql, ()).expect("Failed to query");
    assert_eq!(age, None);
}

#[test]
fn test_kept_statement_does_not_block_other_connections() {
    let (dir, db) = people_db();
    let mut oldest = db
        .prepare::<String>("SELECT name FROM people ORDER BY age DESC")
        .expect("Failed to prepare");
    assert_eq!(oldest.execute_value(()).expect("Failed to query"), "luke");

    let other = Database::open(dir.path().join("test.db"));
    assert!(other.is_open());
    other
        .execute("INSERT INTO people (name, age) VALUES (?, ?)", ("matt", 30))
        .expect("Failed to write from a second connection");

    assert_eq!(oldest.execute_value(()).expect("Failed to query"), "matt");
    db.execute("DELETE FROM people WHERE name = ?", "matt")
        .expect("Failed to write from the first connection");
}

#[test]
fn test_dynamic_values() {
    let (_dir, db) = people_db();

    let value = db
        .query_value_dynamic("SELECT age FROM people WHERE name='john'", ())
        .expect("Failed to select age");
    assert_eq!(value, Value::Integer(10));

    let value = db
        .query_value_dynamic("SELECT name FROM people WHERE name='john'", ())
        .expect("Failed to select name");
    assert_eq!(value.as_text(), Some("john"));

    let value = db
        .query_value_dynamic("SELECT data FROM people WHERE name='john'", ())
        .expect("Failed to select data");
    let blob = value.as_blob().expect("data should be a blob");
    assert_eq!(blob.len(), 4);
    assert_eq!(blob[0], b'A');
    assert_eq!(blob[3], b'D');

    let rows = db
        .query_dynamic("SELECT age, name FROM people", ())
        .expect("Failed to select rows");
    assert_eq!(rows.len(), 4);
    assert_eq!(rows[3].len(), 2);
    assert_eq!(rows[3][0].as_integer(), Some(25));
    assert_eq!(rows[3][1].as_text(), Some("luke"));
}

#[test]
fn test_dynamic_kind_follows_declared_type() {
    let (_dir, db) = people_db();
    db.execute_batch(
        "CREATE TABLE readings (label VARCHAR(10), level FLOAT, raw REAL);
         INSERT INTO readings VALUES ('a', 1.5, 2.5);",
    )
    .expect("Failed to create readings");

    let row = db
        .query_dynamic("SELECT label, level, raw, level * 2 FROM readings", ())
        .expect("Failed to select readings")
        .pop()
        .expect("One row expected");
    let kinds: Vec<Kind> = row.iter().map(Value::kind).collect();
    assert_eq!(kinds, vec![Kind::Null, Kind::Float, Kind::Null, Kind::Null]);
    assert_eq!(row[1], Value::Float(1.5));
}

#[test]
fn test_queued_binds() {
    let (_dir, db) = people_db();

    let name: String = db
        .bind(10)
        .execute_value("SELECT name FROM people WHERE age=?", ())
        .expect("Failed to select by age");
    assert_eq!(name, "john");

    let age: i64 = db
        .bind("john")
        .execute_value("SELECT age FROM people WHERE name=?", ())
        .expect("Failed to select by name");
    assert_eq!(age, 10);

    let id: i64 = db
        .bind("john")
        .bind(10)
        .execute_value("SELECT id FROM people WHERE name=? AND age=?", ())
        .expect("Failed to select by name and age");
    assert_eq!(id, 1);

    let id: i64 = db
        .bind_all([Value::from("luke"), Value::from(25)])
        .execute_value("SELECT id FROM people WHERE name=? AND age=?", ())
        .expect("Failed to select by queued values");
    assert_eq!(id, 4);
}

#[test]
fn test_cursor_streams_same_rows_as_query() {
    let (_dir, db) = people_db();
    let sql = "SELECT name, age FROM people WHERE age >= ? ORDER BY age DESC";

    let materialized: Vec<(String, i64)> = db.query(sql, 15).expect("Failed to query");

    let mut streamed = Vec::new();
    for row in db
        .execute_cursor::<(String, i64), _>(sql, 15)
        .expect("Failed to open cursor")
    {
        streamed.push(row.expect("Failed to decode row"));
    }

    assert_eq!(materialized, streamed);
    assert_eq!(
        streamed.iter().map(|(name, _)| name.as_str()).collect::<Vec<_>>(),
        vec!["luke", "paul", "mark"]
    );
}

#[test]
fn test_round_trip_every_kind() {
    let (_dir, db) = people_db();
    db.execute_batch("CREATE TABLE kinds (i INTEGER, f FLOAT, t TEXT, b BLOB);")
        .expect("Failed to create kinds table");

    let cases: Vec<(i64, f64, String, Vec<u8>)> = vec![
        (0, 0.0, String::new(), Vec::new()),
        (i64::MIN, f64::MIN_POSITIVE, "héllo wörld".to_string(), vec![0, 255, 0]),
        (i64::MAX, -1.25e300, "line\nbreak\0nul".to_string(), vec![0; 1024]),
    ];

    let mut insert: Statement = db
        .prepare("INSERT INTO kinds VALUES (?, ?, ?, ?)")
        .expect("Failed to prepare insert");
    let mut select = db
        .prepare::<(i64, f64, String, Vec<u8>)>("SELECT i, f, t, b FROM kinds WHERE rowid = ?")
        .expect("Failed to prepare select");

    for case in &cases {
        insert
            .execute((case.0, case.1, case.2.as_str(), case.3.as_slice()))
            .expect("Failed to insert case");
        let rowid = db.last_insert_rowid().expect("Failed to read rowid");
        let back = select.execute_value(rowid).expect("Failed to read case");
        assert_eq!(&back, case);
    }
}

#[test]
fn test_positional_order_is_preserved() {
    let (_dir, db) = people_db();
    let row: (String, i64, f64, Vec<u8>, String) = db
        .execute_value("SELECT ?, ?, ?, ?, ?", ("a", 2, 3.5, vec![4_u8], "e"))
        .expect("Failed to mirror arguments");
    assert_eq!(row, ("a".to_string(), 2, 3.5, vec![4], "e".to_string()));
}

#[test]
fn test_nullable_columns() {
    let (_dir, db) = people_db();
    db.execute(
        "INSERT INTO people (name, age, data) VALUES (?, ?, ?)",
        ("ghost", None::<i64>, None::<Vec<u8>>),
    )
    .expect("Failed to insert nulls");

    let row: (Option<i64>, Option<Vec<u8>>) = db
        .execute_value("SELECT age, data FROM people WHERE name = ?", "ghost")
        .expect("Failed to select nulls");
    assert_eq!(row, (None, None));

    let age: Option<i64> = db
        .execute_value("SELECT age FROM people WHERE name = ?", "john")
        .expect("Failed to select age");
    assert_eq!(age, Some(10));
}

#[test]
fn test_reopen_persists_rows() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let path = temp_dir.path().join("persist.db");
    {
        let mut db = create_people(&path);
        db.close().expect("Failed to close database");
    }

    let config = DatabaseConfig::new(&path).read_only(true);
    let db = Database::try_open_with(&config).expect("Failed to reopen database");
    let count: i64 = db
        .execute_value("SELECT COUNT(*) FROM people", ())
        .expect("Failed to count");
    assert_eq!(count, 4);

    let err = db
        .execute("DELETE FROM people", ())
        .expect_err("A read-only database rejects writes");
    assert_eq!(err.kind(), ErrorKind::Step);
}

#[test]
fn test_missing_file_without_create() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let config = DatabaseConfig::new(temp_dir.path().join("absent.db")).create(false);

    let db = Database::open_with(&config);
    assert!(!db.is_open());
    assert!(!temp_dir.path().join("absent.db").exists());
}
