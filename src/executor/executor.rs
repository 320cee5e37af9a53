//! Statement executor for Tabula
//!
//! This module dispatches parsed statements to the catalog and tables and
//! shapes their results.

use std::fmt;
use tracing::{debug, warn};

use super::predicate::Predicate;
use crate::catalog::{Column, Database};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::sql::ast::*;
use crate::sql::Parser;
use crate::storage::{Row, Table, Tuple, Value};

/// Query result
#[derive(Debug, Clone, PartialEq)]
pub enum QueryResult {
    /// Outcome of a DDL or DML statement
    Status(String),
    /// Rows of a SELECT
    Rows(Vec<Row>),
}

impl QueryResult {
    pub fn status(&self) -> Option<&str> {
        match self {
            QueryResult::Status(message) => Some(message),
            QueryResult::Rows(_) => None,
        }
    }

    pub fn rows(&self) -> Option<&[Row]> {
        match self {
            QueryResult::Rows(rows) => Some(rows),
            QueryResult::Status(_) => None,
        }
    }

    pub fn into_rows(self) -> Option<Vec<Row>> {
        match self {
            QueryResult::Rows(rows) => Some(rows),
            QueryResult::Status(_) => None,
        }
    }
}

impl fmt::Display for QueryResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryResult::Status(message) => writeln!(f, "{}", message),
            QueryResult::Rows(rows) => write!(f, "{}", format_rows(rows)),
        }
    }
}

/// Format rows as an ASCII table followed by a row count
pub fn format_rows(rows: &[Row]) -> String {
    let Some(first) = rows.first() else {
        return "(0 rows)\n".to_string();
    };
    let columns: Vec<&String> = first.keys().collect();

    // Calculate column widths
    let mut widths: Vec<usize> = columns.iter().map(|c| c.chars().count()).collect();
    for row in rows {
        for (i, column) in columns.iter().enumerate() {
            let len = row.get(*column).map_or(4, |v| v.to_string().chars().count());
            widths[i] = widths[i].max(len);
        }
    }

    let separator: String = widths
        .iter()
        .map(|w| "-".repeat(*w + 2))
        .collect::<Vec<_>>()
        .join("+");
    let separator = format!("+{}+\n", separator);

    let mut output = String::new();

    // Header
    output.push_str(&separator);
    let header: String = columns
        .iter()
        .zip(&widths)
        .map(|(c, w)| format!(" {:^width$} ", c, width = *w))
        .collect::<Vec<_>>()
        .join("|");
    output.push_str(&format!("|{}|\n", header));
    output.push_str(&separator);

    // Rows
    for row in rows {
        let line: String = columns
            .iter()
            .zip(&widths)
            .map(|(c, w)| {
                let value = row.get(*c).cloned().unwrap_or(Value::Null);
                format!(" {:<width$} ", value.to_string(), width = *w)
            })
            .collect::<Vec<_>>()
            .join("|");
        output.push_str(&format!("|{}|\n", line));
    }
    output.push_str(&separator);

    let plural = if rows.len() == 1 { "" } else { "s" };
    output.push_str(&format!("({} row{})\n", rows.len(), plural));

    output
}

/// Execution Engine
pub struct ExecutionEngine {
    database: Database,
    config: Config,
}

impl ExecutionEngine {
    /// Create an engine over an existing database, without persistence
    pub fn new(database: Database) -> Self {
        let config = Config::new().name(database.name());
        Self { database, config }
    }

    /// Open the configured database: load the snapshot if one exists,
    /// otherwise start empty
    pub fn open(config: &Config) -> Result<Self> {
        let database = match &config.snapshot_path {
            Some(path) if path.exists() => Database::load_from_disk(path)?,
            _ => Database::new(config.name.clone()),
        };
        debug!(
            database = database.name(),
            tables = database.list_tables().len(),
            "engine opened"
        );

        Ok(Self {
            database,
            config: config.clone(),
        })
    }

    pub fn database(&self) -> &Database {
        &self.database
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Save to the configured snapshot path. Returns false when none is set.
    pub fn persist(&self) -> Result<bool> {
        match &self.config.snapshot_path {
            Some(path) => {
                self.database.save_to_disk(path)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Parse and execute a single statement
    pub fn execute(&mut self, sql: &str) -> Result<QueryResult> {
        let result = Parser::new(sql)
            .and_then(|mut parser| parser.parse())
            .and_then(|stmt| self.execute_statement(stmt));

        if let Err(e) = &result {
            warn!(kind = ?e.kind(), error = %e, "statement failed");
        }
        result
    }

    /// Execute an already parsed statement.
    ///
    /// With autosave on, every mutating statement is followed by a snapshot
    /// save, including one that failed: an UPDATE stopped by a uniqueness
    /// conflict keeps the rows it already changed, and the snapshot follows
    /// them. A save error after a successful statement is returned even though
    /// the statement's changes stay applied in memory.
    pub fn execute_statement(&mut self, stmt: Statement) -> Result<QueryResult> {
        debug!(kind = stmt.kind(), "executing statement");
        let mutation = stmt.is_mutation();

        let result = match stmt {
            Statement::CreateTable(create) => self.execute_create_table(create),
            Statement::DropTable(name) => self.execute_drop_table(&name),
            Statement::Insert(insert) => self.execute_insert(insert),
            Statement::Select(select) => self.execute_select(select),
            Statement::Update(update) => self.execute_update(update),
            Statement::Delete(delete) => self.execute_delete(delete),
            Statement::CreateIndex(create) => self.execute_create_index(create),
        };

        if mutation && self.config.autosave {
            match (&result, self.persist()) {
                (_, Ok(_)) => {}
                (Ok(_), Err(e)) => return Err(e),
                (Err(_), Err(e)) => warn!(error = %e, "autosave after failed statement failed"),
            }
        }
        result
    }

    fn execute_create_table(&mut self, create: CreateTableStatement) -> Result<QueryResult> {
        let columns: Vec<Column> = create.columns.iter().map(ColumnDef::to_column).collect();
        self.database.create_table(&create.table_name, columns)?;
        Ok(QueryResult::Status(format!(
            "Table {} created successfully",
            create.table_name
        )))
    }

    fn execute_drop_table(&mut self, name: &str) -> Result<QueryResult> {
        self.database.drop_table(name)?;
        Ok(QueryResult::Status(format!("Table {} dropped successfully", name)))
    }

    fn execute_create_index(&mut self, create: CreateIndexStatement) -> Result<QueryResult> {
        let table = self.database.get_table_mut(&create.table_name)?;
        table.create_index(&create.column, create.unique)?;
        debug!(index = %create.index_name, "index name discarded");
        Ok(QueryResult::Status(format!(
            "Index created on {}.{}",
            create.table_name, create.column
        )))
    }

    fn execute_insert(&mut self, insert: InsertStatement) -> Result<QueryResult> {
        let table = self.database.get_table_mut(&insert.table_name)?;

        let columns: Vec<String> = match insert.columns {
            Some(columns) => columns,
            None => {
                if insert.values.len() != table.columns().len() {
                    return Err(Error::ColumnCountMismatch {
                        columns: table.columns().len(),
                        values: insert.values.len(),
                    });
                }
                table.columns().iter().map(|c| c.name.clone()).collect()
            }
        };

        let row_id = table.insert(columns.into_iter().zip(insert.values))?;
        Ok(QueryResult::Status(format!("1 row inserted (ID: {})", row_id)))
    }

    fn execute_select(&self, select: SelectStatement) -> Result<QueryResult> {
        let names: Option<Vec<String>> = if select.columns.contains(&SelectItem::Wildcard) {
            None
        } else {
            let mut names = Vec::with_capacity(select.columns.len());
            for item in &select.columns {
                if let SelectItem::Column(column) = item {
                    names.push(output_name(column, &select)?);
                }
            }
            Some(names)
        };
        let names: Option<Vec<&str>> = names
            .as_ref()
            .map(|names| names.iter().map(String::as_str).collect());

        if let Some(join) = &select.join {
            let rows = self.database.join(
                &select.from,
                &join.table,
                &join.left.column,
                &join.right.column,
                join.kind,
                names.as_deref(),
            )?;
            return Ok(QueryResult::Rows(rows));
        }

        let table = self.database.get_table(&select.from)?;
        let predicate = compile(table, select.where_clause.as_ref())?;
        let filter = |tuple: &Tuple| match &predicate {
            Some(p) => p.evaluate(tuple),
            None => Ok(true),
        };

        let rows = table.select(names.as_deref(), Some(&filter))?;
        Ok(QueryResult::Rows(rows))
    }

    fn execute_update(&mut self, update: UpdateStatement) -> Result<QueryResult> {
        let table = self.database.get_table_mut(&update.table_name)?;
        let predicate = compile(table, update.where_clause.as_ref())?;

        let count = match &predicate {
            Some(p) => {
                let filter = |tuple: &Tuple| p.evaluate(tuple);
                table.update(update.assignments, Some(&filter))?
            }
            None => table.update(update.assignments, None)?,
        };
        Ok(QueryResult::Status(format!("{} row(s) updated", count)))
    }

    fn execute_delete(&mut self, delete: DeleteStatement) -> Result<QueryResult> {
        let table = self.database.get_table_mut(&delete.table_name)?;
        let predicate = compile(table, delete.where_clause.as_ref())?;

        let count = match &predicate {
            Some(p) => {
                let filter = |tuple: &Tuple| p.evaluate(tuple);
                table.delete(Some(&filter))?
            }
            None => table.delete(None)?,
        };
        Ok(QueryResult::Status(format!("{} row(s) deleted", count)))
    }
}

/// Field name a select item reads: `table.column` for joins, the bare column
/// otherwise
fn output_name(column: &ColumnRef, select: &SelectStatement) -> Result<String> {
    if select.join.is_some() {
        return Ok(column.to_string());
    }
    match &column.table {
        Some(table) if *table != select.from => Err(Error::ColumnNotFound(
            column.to_string(),
            select.from.clone(),
        )),
        _ => Ok(column.column.clone()),
    }
}

fn compile(table: &Table, condition: Option<&Condition>) -> Result<Option<Predicate>> {
    condition.map(|c| Predicate::compile(table, c)).transpose()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_engine() -> ExecutionEngine {
        let mut engine = ExecutionEngine::new(Database::new("test"));
        engine
            .execute(
                "CREATE TABLE users (id INTEGER PRIMARY KEY, \
                 name VARCHAR(20) NOT NULL, age INTEGER)",
            )
            .unwrap();
        engine
            .execute("INSERT INTO users (id, name, age) VALUES (1, 'Alice', 30)")
            .unwrap();
        engine
            .execute("INSERT INTO users (id, name, age) VALUES (2, 'Bob', 25)")
            .unwrap();
        engine
    }

    fn select(engine: &mut ExecutionEngine, sql: &str) -> Vec<Row> {
        engine.execute(sql).unwrap().into_rows().unwrap()
    }

    #[test]
    fn test_create_table() {
        let mut engine = ExecutionEngine::new(Database::new("test"));
        let result = engine.execute("CREATE TABLE t (id INT)").unwrap();
        assert_eq!(result.status(), Some("Table t created successfully"));
        assert!(engine.database().table_exists("t"));

        assert!(matches!(
            engine.execute("CREATE TABLE t (id INT)"),
            Err(Error::TableAlreadyExists(_))
        ));
    }

    #[test]
    fn test_insert_and_select() {
        let mut engine = create_test_engine();
        let result = engine
            .execute("INSERT INTO users VALUES (3, 'Carol', NULL)")
            .unwrap();
        assert_eq!(result.status(), Some("1 row inserted (ID: 2)"));

        let rows = select(&mut engine, "SELECT name FROM users WHERE age > 26");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["name"], Value::from("Alice"));
        assert_eq!(rows[0].len(), 1);

        let rows = select(&mut engine, "SELECT * FROM users WHERE age = NULL");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["id"], Value::Integer(3));
    }

    #[test]
    fn test_insert_without_columns_count_mismatch() {
        let mut engine = create_test_engine();
        assert!(matches!(
            engine.execute("INSERT INTO users VALUES (3, 'Carol')"),
            Err(Error::ColumnCountMismatch { columns: 3, values: 2 })
        ));
    }

    #[test]
    fn test_update_and_delete() {
        let mut engine = create_test_engine();

        let result = engine.execute("UPDATE users SET age = 31 WHERE id = 1").unwrap();
        assert_eq!(result.status(), Some("1 row(s) updated"));

        let result = engine.execute("DELETE FROM users WHERE age < 30").unwrap();
        assert_eq!(result.status(), Some("1 row(s) deleted"));

        let rows = select(&mut engine, "SELECT * FROM users");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["age"], Value::Integer(31));
    }

    #[test]
    fn test_create_index() {
        let mut engine = create_test_engine();
        let result = engine.execute("CREATE INDEX idx_age ON users (age)").unwrap();
        assert_eq!(result.status(), Some("Index created on users.age"));
        assert!(engine.database().get_table("users").unwrap().index("age").is_some());
    }

    #[test]
    fn test_join_execution() {
        let mut engine = create_test_engine();
        engine
            .execute(
                "CREATE TABLE orders (id INTEGER PRIMARY KEY, user_id INTEGER, item VARCHAR(20))",
            )
            .unwrap();
        engine
            .execute("INSERT INTO orders (id, user_id, item) VALUES (10, 2, 'book')")
            .unwrap();

        let rows = select(
            &mut engine,
            "SELECT users.name, orders.item FROM users \
             LEFT JOIN orders ON users.id = orders.user_id",
        );
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["orders.item"], Value::Null);
        assert_eq!(rows[1]["users.name"], Value::from("Bob"));
        assert_eq!(rows[1]["orders.item"], Value::from("book"));
    }

    #[test]
    fn test_autosave_without_path_is_noop() {
        let mut engine = ExecutionEngine::open(&Config::new().autosave(true)).unwrap();
        engine.execute("CREATE TABLE t (id INT)").unwrap();
        assert!(!engine.persist().unwrap());
    }

    #[test]
    fn test_format_rows() {
        let mut engine = create_test_engine();
        let rows = select(&mut engine, "SELECT id, name FROM users WHERE id = 1");
        let text = format_rows(&rows);

        assert_eq!(
            text,
            "+----+-------+\n\
             | id | name  |\n\
             +----+-------+\n\
             | 1  | Alice |\n\
             +----+-------+\n\
             (1 row)\n"
        );
        assert_eq!(format_rows(&[]), "(0 rows)\n");
    }
}
