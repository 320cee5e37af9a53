//! Database catalog for Tabula
//!
//! A database owns a set of independently named tables and implements the
//! two-table hash join. There are no foreign keys: cross-table integrity is a
//! join-time or application concern.

use indexmap::IndexMap;
use std::collections::HashMap;
use std::path::Path;
use tracing::debug;

use super::schema::Column;
use super::snapshot::DatabaseSnapshot;
use super::types::DataType;
use crate::error::{Error, Result};
use crate::storage::{Row, Table, Tuple, Value};

/// Supported join flavours
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    /// Only left rows with at least one match
    Inner,
    /// Every left row; unmatched ones get NULL right columns
    Left,
}

/// A named collection of tables
#[derive(Debug, Clone)]
pub struct Database {
    name: String,
    /// Tables by name, in creation order
    tables: IndexMap<String, Table>,
}

impl Database {
    /// Create a new empty database
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tables: IndexMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Create a new table
    pub fn create_table(&mut self, name: &str, columns: Vec<Column>) -> Result<&mut Table> {
        if self.tables.contains_key(name) {
            return Err(Error::TableAlreadyExists(name.to_string()));
        }

        let table = Table::new(name, columns)?;
        debug!(table = name, columns = table.columns().len(), "table created");
        Ok(self.tables.entry(name.to_string()).or_insert(table))
    }

    /// Drop a table together with its rows and indexes
    pub fn drop_table(&mut self, name: &str) -> Result<()> {
        if self.tables.shift_remove(name).is_none() {
            return Err(Error::TableNotFound(name.to_string()));
        }
        debug!(table = name, "table dropped");
        Ok(())
    }

    /// Get a table by name
    pub fn get_table(&self, name: &str) -> Result<&Table> {
        self.tables
            .get(name)
            .ok_or_else(|| Error::TableNotFound(name.to_string()))
    }

    /// Get a table by name for mutation
    pub fn get_table_mut(&mut self, name: &str) -> Result<&mut Table> {
        self.tables
            .get_mut(name)
            .ok_or_else(|| Error::TableNotFound(name.to_string()))
    }

    pub fn table_exists(&self, name: &str) -> bool {
        self.tables.contains_key(name)
    }

    /// List all table names, in creation order
    pub fn list_tables(&self) -> Vec<String> {
        self.tables.keys().cloned().collect()
    }

    /// Iterate over all tables, in creation order
    pub fn tables(&self) -> impl Iterator<Item = &Table> {
        self.tables.values()
    }

    /// Hash join of two tables on `left_column = right_column`.
    ///
    /// The right table is hashed on its join column, then probed once per
    /// left row in storage order. Output fields are named `table.column`,
    /// left table first. NULL keys are hashed like any other value, so a NULL
    /// on the left matches a NULL on the right. An INTEGER column joined to a
    /// FLOAT column compares after widening the integer side.
    pub fn join(
        &self,
        left_table: &str,
        right_table: &str,
        left_column: &str,
        right_column: &str,
        kind: JoinKind,
        select_columns: Option<&[&str]>,
    ) -> Result<Vec<Row>> {
        let left = self.get_table(left_table)?;
        let right = self.get_table(right_table)?;
        let left_pos = left.column_position(left_column)?;
        let right_pos = right.column_position(right_column)?;

        let left_type = left.columns()[left_pos].data_type();
        let right_type = right.columns()[right_pos].data_type();
        let widen_left = left_type == DataType::Integer && right_type == DataType::Float;
        let widen_right = right_type == DataType::Integer && left_type == DataType::Float;

        // Build side
        let mut hash_table: HashMap<Value, Vec<&Tuple>> = HashMap::new();
        for tuple in right.rows() {
            hash_table
                .entry(join_key(&tuple.values()[right_pos], widen_right))
                .or_default()
                .push(tuple);
        }

        let left_names = qualified_names(left);
        let right_names = qualified_names(right);

        // Probe side
        let mut result = Vec::new();
        for l_tuple in left.rows() {
            match hash_table.get(&join_key(&l_tuple.values()[left_pos], widen_left)) {
                Some(r_tuples) => {
                    for r_tuple in r_tuples {
                        let mut row = Row::with_capacity(left_names.len() + right_names.len());
                        extend_row(&mut row, &left_names, l_tuple.values());
                        extend_row(&mut row, &right_names, r_tuple.values());
                        result.push(row);
                    }
                }
                None if kind == JoinKind::Left => {
                    let mut row = Row::with_capacity(left_names.len() + right_names.len());
                    extend_row(&mut row, &left_names, l_tuple.values());
                    for name in &right_names {
                        row.insert(name.clone(), Value::Null);
                    }
                    result.push(row);
                }
                None => {}
            }
        }

        debug!(
            left = left_table,
            right = right_table,
            ?kind,
            rows = result.len(),
            "join executed"
        );

        Ok(match select_columns {
            Some(columns) => result
                .into_iter()
                .map(|row| {
                    columns
                        .iter()
                        .map(|c| (c.to_string(), row.get(*c).cloned().unwrap_or(Value::Null)))
                        .collect()
                })
                .collect(),
            None => result,
        })
    }

    /// Capture the whole database as a serializable snapshot
    pub fn to_snapshot(&self) -> DatabaseSnapshot {
        DatabaseSnapshot::capture(self)
    }

    /// Rebuild a database from a snapshot, re-validating every row
    pub fn from_snapshot(snapshot: DatabaseSnapshot) -> Result<Self> {
        snapshot.restore()
    }

    /// Save the database to a JSON file
    pub fn save_to_disk(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.to_snapshot())?;
        std::fs::write(path.as_ref(), json)?;
        debug!(path = %path.as_ref().display(), tables = self.tables.len(), "snapshot saved");
        Ok(())
    }

    /// Load a database from a JSON file
    pub fn load_from_disk(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path.as_ref())?;
        let snapshot: DatabaseSnapshot = serde_json::from_str(&json)?;
        let database = Self::from_snapshot(snapshot)?;
        debug!(path = %path.as_ref().display(), tables = database.tables.len(), "snapshot loaded");
        Ok(database)
    }
}

impl Default for Database {
    fn default() -> Self {
        Self::new("default")
    }
}

fn join_key(value: &Value, widen: bool) -> Value {
    match value {
        Value::Integer(i) if widen => Value::Float(*i as f64),
        other => other.clone(),
    }
}

fn qualified_names(table: &Table) -> Vec<String> {
    table
        .columns()
        .iter()
        .map(|c| format!("{}.{}", table.name(), c.name))
        .collect()
}

fn extend_row(row: &mut Row, names: &[String], values: &[Value]) {
    for (name, value) in names.iter().zip(values) {
        row.insert(name.clone(), value.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_db() -> Database {
        let mut db = Database::new("test");
        let users = db
            .create_table(
                "users",
                vec![
                    Column::new("id", DataType::Integer).primary_key(true),
                    Column::new("name", DataType::Varchar(50)),
                ],
            )
            .unwrap();
        users.insert([("id", Value::from(1)), ("name", Value::from("Alice"))]).unwrap();
        users.insert([("id", Value::from(2)), ("name", Value::from("Bob"))]).unwrap();

        let posts = db
            .create_table(
                "posts",
                vec![
                    Column::new("id", DataType::Integer).primary_key(true),
                    Column::new("user_id", DataType::Integer),
                    Column::new("title", DataType::Varchar(100)),
                ],
            )
            .unwrap();
        posts
            .insert([
                ("id", Value::from(1)),
                ("user_id", Value::from(1)),
                ("title", Value::from("Post 1")),
            ])
            .unwrap();
        posts
            .insert([
                ("id", Value::from(2)),
                ("user_id", Value::from(1)),
                ("title", Value::from("Post 2")),
            ])
            .unwrap();
        posts
            .insert([
                ("id", Value::from(3)),
                ("user_id", Value::Null),
                ("title", Value::from("Orphan")),
            ])
            .unwrap();
        db
    }

    #[test]
    fn test_create_and_get_table() {
        let db = create_test_db();
        assert_eq!(db.list_tables(), vec!["users", "posts"]);
        assert_eq!(db.get_table("users").unwrap().row_count(), 2);
        assert!(matches!(db.get_table("nope"), Err(Error::TableNotFound(_))));
    }

    #[test]
    fn test_table_already_exists() {
        let mut db = create_test_db();
        let result = db.create_table("users", vec![Column::new("x", DataType::Integer)]);
        assert!(matches!(result, Err(Error::TableAlreadyExists(_))));
    }

    #[test]
    fn test_drop_table() {
        let mut db = create_test_db();
        db.drop_table("posts").unwrap();
        assert!(!db.table_exists("posts"));
        assert!(matches!(db.drop_table("posts"), Err(Error::TableNotFound(_))));
    }

    #[test]
    fn test_inner_join() {
        let db = create_test_db();
        let rows = db
            .join("posts", "users", "user_id", "id", JoinKind::Inner, None)
            .unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["users.name"], Value::from("Alice"));
        assert_eq!(rows[0]["posts.title"], Value::from("Post 1"));
        assert_eq!(
            rows[0].keys().cloned().collect::<Vec<_>>(),
            vec!["posts.id", "posts.user_id", "posts.title", "users.id", "users.name"]
        );
    }

    #[test]
    fn test_left_join() {
        let db = create_test_db();
        let rows = db
            .join("users", "posts", "id", "user_id", JoinKind::Left, None)
            .unwrap();

        // Alice twice (two posts), Bob once with NULLs
        assert_eq!(rows.len(), 3);
        let bob = &rows[2];
        assert_eq!(bob["users.name"], Value::from("Bob"));
        assert_eq!(bob["posts.id"], Value::Null);
        assert_eq!(bob["posts.title"], Value::Null);
    }

    #[test]
    fn test_null_key_without_partner_is_unmatched() {
        let db = create_test_db();
        let rows = db
            .join("posts", "users", "user_id", "id", JoinKind::Left, None)
            .unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[2]["posts.title"], Value::from("Orphan"));
        assert_eq!(rows[2]["users.id"], Value::Null);
    }

    #[test]
    fn test_null_keys_match_each_other() {
        let mut db = Database::new("test");
        for name in ["a", "b"] {
            db.create_table(name, vec![Column::new("k", DataType::Integer)])
                .unwrap()
                .insert([("k", Value::Null)])
                .unwrap();
        }

        let rows = db.join("a", "b", "k", "k", JoinKind::Inner, None).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["a.k"], Value::Null);
        assert_eq!(rows[0]["b.k"], Value::Null);
    }

    #[test]
    fn test_join_projection() {
        let db = create_test_db();
        let rows = db
            .join(
                "posts",
                "users",
                "user_id",
                "id",
                JoinKind::Inner,
                Some(&["users.name", "posts.title", "posts.missing"]),
            )
            .unwrap();
        assert_eq!(rows[1].len(), 3);
        assert_eq!(rows[1]["posts.title"], Value::from("Post 2"));
        assert_eq!(rows[1]["posts.missing"], Value::Null);
        assert_eq!(rows[1].get_index(0).unwrap().0, "users.name");
    }

    #[test]
    fn test_join_widens_integer_to_float() {
        let mut db = Database::new("test");
        db.create_table("a", vec![Column::new("k", DataType::Integer)])
            .unwrap()
            .insert([("k", Value::from(2))])
            .unwrap();
        db.create_table("b", vec![Column::new("k", DataType::Float)])
            .unwrap()
            .insert([("k", Value::from(2.0))])
            .unwrap();

        let rows = db.join("a", "b", "k", "k", JoinKind::Inner, None).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["b.k"], Value::Float(2.0));
    }

    #[test]
    fn test_join_unknown_column() {
        let db = create_test_db();
        let result = db.join("posts", "users", "author", "id", JoinKind::Inner, None);
        assert!(matches!(result, Err(Error::ColumnNotFound(..))));
    }
}
