use chrono::NaiveDate;
use tabula::catalog::{Column, DataType, Database};
use tabula::executor::ExecutionEngine;
use tabula::{Config, Error, ErrorKind, Value};
use tempfile::tempdir;

fn populated_db() -> Database {
    let mut db = Database::new("library");

    let authors = db
        .create_table(
            "authors",
            vec![
                Column::new("id", DataType::Integer).primary_key(true),
                Column::new("name", DataType::Varchar(40)).nullable(false),
                Column::new("born", DataType::Date),
                Column::new("living", DataType::Boolean),
            ],
        )
        .unwrap();
    authors
        .insert([
            ("id", Value::from(1)),
            ("name", Value::from("Le Guin")),
            ("born", Value::from("1929-10-21")),
            ("living", Value::from(false)),
        ])
        .unwrap();
    authors
        .insert([("id", Value::from(2)), ("name", Value::from("Jemisin"))])
        .unwrap();

    let books = db
        .create_table(
            "books",
            vec![
                Column::new("isbn", DataType::Varchar(13)).primary_key(true),
                Column::new("author_id", DataType::Integer),
                Column::new("price", DataType::Float),
            ],
        )
        .unwrap();
    books
        .insert([
            ("isbn", Value::from("9780441478125")),
            ("author_id", Value::from(1)),
            ("price", Value::from(9.99)),
        ])
        .unwrap();
    books.create_index("author_id", false).unwrap();

    db
}

#[test]
fn test_save_and_load_round_trip() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("library.json");

    let original = populated_db();
    original.save_to_disk(&path).unwrap();
    let loaded = Database::load_from_disk(&path).unwrap();

    assert_eq!(loaded.name(), "library");
    assert_eq!(loaded.list_tables(), vec!["authors", "books"]);

    for name in original.list_tables() {
        let before = original.get_table(&name).unwrap();
        let after = loaded.get_table(&name).unwrap();
        assert_eq!(before.select(None, None).unwrap(), after.select(None, None).unwrap());
        assert_eq!(before.columns(), after.columns());
    }

    let authors = loaded.get_table("authors").unwrap();
    assert_eq!(
        authors.rows()[0].values()[2],
        Value::Date(NaiveDate::from_ymd_opt(1929, 10, 21).unwrap())
    );
    assert!(authors.index("id").unwrap().is_unique());

    // constraints are live again after loading
    let mut loaded = loaded;
    let err = loaded
        .get_table_mut("authors")
        .unwrap()
        .insert([("id", Value::from(1)), ("name", Value::from("Dup"))])
        .unwrap_err();
    assert!(matches!(err, Error::DuplicateValue { .. }));
}

#[test]
fn test_load_missing_file() {
    let dir = tempdir().unwrap();
    let err = Database::load_from_disk(dir.path().join("nope.json")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Io);
}

#[test]
fn test_load_malformed_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("bad.json");
    std::fs::write(&path, "{ not json").unwrap();

    let err = Database::load_from_disk(&path).unwrap_err();
    assert!(matches!(err, Error::Serialization(_)));
}

#[test]
fn test_engine_autosave_and_reopen() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("shop.json");
    let config = Config::new()
        .name("shop")
        .snapshot_path(&path)
        .autosave(true);

    {
        let mut engine = ExecutionEngine::open(&config).unwrap();
        engine
            .execute("CREATE TABLE orders (id INT PRIMARY KEY, placed DATE)")
            .unwrap();
        engine
            .execute("INSERT INTO orders VALUES (1, '2024-03-01')")
            .unwrap();
        // a failed statement does not break the saved state
        assert!(engine.execute("INSERT INTO orders VALUES (1, '2024-03-02')").is_err());
    }
    assert!(path.exists());

    let mut engine = ExecutionEngine::open(&config).unwrap();
    assert_eq!(engine.database().name(), "shop");

    let rows = engine
        .execute("SELECT placed FROM orders WHERE placed = '2024-03-01'")
        .unwrap()
        .into_rows()
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(
        rows[0]["placed"],
        Value::Date(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap())
    );
}

#[test]
fn test_autosave_keeps_partial_update() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("codes.json");
    let config = Config::new().snapshot_path(&path).autosave(true);

    let mut engine = ExecutionEngine::open(&config).unwrap();
    engine
        .execute("CREATE TABLE t (id INT PRIMARY KEY, code INT UNIQUE)")
        .unwrap();
    engine.execute("INSERT INTO t VALUES (1, 10)").unwrap();
    engine.execute("INSERT INTO t VALUES (2, 20)").unwrap();

    // the first row takes 30, the second then conflicts with it
    let err = engine.execute("UPDATE t SET code = 30").unwrap_err();
    assert!(matches!(err, Error::DuplicateValue { .. }));

    let reloaded = Database::load_from_disk(&path).unwrap();
    let codes: Vec<Value> = reloaded
        .get_table("t")
        .unwrap()
        .rows()
        .iter()
        .map(|t| t.values()[1].clone())
        .collect();
    assert_eq!(codes, vec![Value::Integer(30), Value::Integer(20)]);
}

#[test]
fn test_persist_without_autosave() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("manual.json");
    let config = Config::new().snapshot_path(&path);

    let mut engine = ExecutionEngine::open(&config).unwrap();
    engine.execute("CREATE TABLE t (id INT)").unwrap();
    assert!(!path.exists());

    assert!(engine.persist().unwrap());
    let reloaded = Database::load_from_disk(&path).unwrap();
    assert!(reloaded.table_exists("t"));
}
