use tabula::catalog::Database;
use tabula::executor::ExecutionEngine;
use tabula::{Error, Row, Value};

fn setup() -> ExecutionEngine {
    let mut engine = ExecutionEngine::new(Database::new("blog"));
    for sql in [
        "CREATE TABLE users (id INTEGER PRIMARY KEY, name VARCHAR(20))",
        "CREATE TABLE posts (id INTEGER PRIMARY KEY, user_id INTEGER, title VARCHAR(40))",
        "INSERT INTO users VALUES (1, 'alice')",
        "INSERT INTO users VALUES (2, 'bob')",
        "INSERT INTO users VALUES (3, 'carol')",
        "INSERT INTO posts VALUES (10, 1, 'hello')",
        "INSERT INTO posts VALUES (11, 1, 'again')",
        "INSERT INTO posts VALUES (12, 3, 'first')",
        "INSERT INTO posts VALUES (13, NULL, 'anonymous')",
    ] {
        engine.execute(sql).unwrap();
    }
    engine
}

fn rows(engine: &mut ExecutionEngine, sql: &str) -> Vec<Row> {
    engine.execute(sql).unwrap().into_rows().unwrap()
}

#[test]
fn test_inner_join_matches_filtered_product() {
    let mut engine = setup();
    let result = rows(
        &mut engine,
        "SELECT * FROM users JOIN posts ON users.id = posts.user_id",
    );

    // every (user, post) pair with equal keys, and nothing else
    let users = engine.database().get_table("users").unwrap();
    let posts = engine.database().get_table("posts").unwrap();
    let expected = users
        .rows()
        .iter()
        .flat_map(|u| posts.rows().iter().map(move |p| (u, p)))
        .filter(|(u, p)| u.values()[0] == p.values()[1])
        .count();
    assert_eq!(result.len(), expected);
    assert_eq!(result.len(), 3);

    for row in &result {
        assert_eq!(row["users.id"], row["posts.user_id"]);
        assert_eq!(row.len(), 5);
    }
}

#[test]
fn test_left_join_keeps_every_left_row() {
    let mut engine = setup();
    let result = rows(
        &mut engine,
        "SELECT users.name, posts.title FROM users \
         LEFT OUTER JOIN posts ON users.id = posts.user_id",
    );

    let names: Vec<String> = result
        .iter()
        .map(|r| r["users.name"].to_string())
        .collect();
    assert_eq!(names, vec!["alice", "alice", "bob", "carol"]);

    let bob = &result[2];
    assert_eq!(bob["posts.title"], Value::Null);
    assert_eq!(bob.keys().collect::<Vec<_>>(), vec!["users.name", "posts.title"]);
}

#[test]
fn test_null_keys_match_only_null_keys() {
    let mut engine = setup();
    let result = rows(
        &mut engine,
        "SELECT posts.title, users.name FROM posts LEFT JOIN users ON posts.user_id = users.id",
    );
    assert_eq!(result.len(), 4);

    let anonymous = result
        .iter()
        .find(|r| r["posts.title"] == Value::from("anonymous"))
        .unwrap();
    assert_eq!(anonymous["users.name"], Value::Null);

    engine
        .execute("CREATE TABLE drafts (id INTEGER PRIMARY KEY, user_id INTEGER)")
        .unwrap();
    engine.execute("INSERT INTO drafts VALUES (1, NULL)").unwrap();
    engine.execute("INSERT INTO drafts VALUES (2, 3)").unwrap();

    let result = rows(
        &mut engine,
        "SELECT posts.title, drafts.id FROM posts JOIN drafts ON posts.user_id = drafts.user_id",
    );
    let pairs: Vec<(String, Value)> = result
        .iter()
        .map(|r| (r["posts.title"].to_string(), r["drafts.id"].clone()))
        .collect();
    assert_eq!(
        pairs,
        vec![
            ("first".to_string(), Value::Integer(2)),
            ("anonymous".to_string(), Value::Integer(1)),
        ]
    );
}

#[test]
fn test_join_errors() {
    let mut engine = setup();

    assert!(matches!(
        engine.execute("SELECT * FROM users JOIN posts ON posts.user_id = users.id"),
        Err(Error::JoinTableMismatch(_))
    ));
    assert!(matches!(
        engine.execute("SELECT * FROM users JOIN missing ON users.id = missing.id"),
        Err(Error::TableNotFound(_))
    ));
    assert!(matches!(
        engine.execute("SELECT * FROM users JOIN posts ON users.id = posts.author"),
        Err(Error::ColumnNotFound(..))
    ));
}

#[test]
fn test_join_reflects_deletes() {
    let mut engine = setup();
    engine.execute("DELETE FROM posts WHERE user_id = 1").unwrap();

    let result = rows(
        &mut engine,
        "SELECT users.name, posts.title FROM users INNER JOIN posts ON users.id = posts.user_id",
    );
    assert_eq!(result.len(), 1);
    assert_eq!(result[0]["posts.title"], Value::from("first"));

    // the posts index positions were shifted along with the rows
    let posts = engine.database().get_table("posts").unwrap();
    assert_eq!(posts.index("id").unwrap().lookup(&Value::Integer(13)), vec![1]);
}
