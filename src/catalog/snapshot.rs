//! JSON snapshot format for Tabula
//!
//! A snapshot is a plain serde mirror of the catalog. Column types are stored
//! as their type signatures and rows as column-to-scalar objects; restoring
//! replays every row through [`Table::insert`](crate::storage::Table::insert)
//! so casts and constraints are re-checked.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::database::Database;
use super::schema::Column;
use super::types::DataType;
use crate::error::{Error, Result};
use crate::storage::{Table, Value};

/// Serializable form of a whole database
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseSnapshot {
    pub name: String,
    pub tables: IndexMap<String, TableSnapshot>,
}

/// Serializable form of one table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableSnapshot {
    pub columns: Vec<ColumnSnapshot>,
    #[serde(default)]
    pub rows: Vec<IndexMap<String, serde_json::Value>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnSnapshot {
    pub name: String,
    #[serde(rename = "type")]
    pub type_signature: String,
    #[serde(default = "default_nullable")]
    pub nullable: bool,
    #[serde(default)]
    pub primary_key: bool,
    #[serde(default)]
    pub unique: bool,
}

fn default_nullable() -> bool {
    true
}

impl DatabaseSnapshot {
    /// Capture the current state of `database`
    pub fn capture(database: &Database) -> Self {
        let tables = database
            .tables()
            .map(|table| (table.name().to_string(), TableSnapshot::capture(table)))
            .collect();

        Self {
            name: database.name().to_string(),
            tables,
        }
    }

    /// Rebuild a database, re-validating every stored row
    pub fn restore(self) -> Result<Database> {
        let mut database = Database::new(self.name);
        for (table_name, snapshot) in self.tables {
            let columns = snapshot
                .columns
                .iter()
                .map(ColumnSnapshot::to_column)
                .collect::<Result<Vec<_>>>()?;

            let table = database.create_table(&table_name, columns)?;
            for row in &snapshot.rows {
                let values = row
                    .iter()
                    .map(|(column, json)| Ok((column.as_str(), Value::from_json(json)?)))
                    .collect::<Result<Vec<_>>>()?;
                table.insert(values)?;
            }
        }
        Ok(database)
    }
}

impl TableSnapshot {
    fn capture(table: &Table) -> Self {
        let columns = table.columns().iter().map(ColumnSnapshot::from).collect();
        let rows = table
            .rows()
            .iter()
            .map(|tuple| {
                table
                    .columns()
                    .iter()
                    .zip(tuple.values())
                    .map(|(c, v)| (c.name.clone(), to_json(v)))
                    .collect()
            })
            .collect();

        Self { columns, rows }
    }
}

impl ColumnSnapshot {
    fn to_column(&self) -> Result<Column> {
        let data_type: DataType = self
            .type_signature
            .parse()
            .map_err(|_| Error::InvalidSnapshot(format!(
                "column '{}' has unknown type '{}'",
                self.name, self.type_signature
            )))?;

        Ok(Column::new(&self.name, data_type)
            .primary_key(self.primary_key)
            .unique(self.unique)
            .nullable(self.nullable))
    }
}

impl From<&Column> for ColumnSnapshot {
    fn from(column: &Column) -> Self {
        Self {
            name: column.name.clone(),
            type_signature: column.data_type().to_string(),
            nullable: column.is_nullable(),
            primary_key: column.primary_key,
            unique: column.unique,
        }
    }
}

/// Scalar JSON form of a stored value; dates become `YYYY-MM-DD` strings
fn to_json(value: &Value) -> serde_json::Value {
    match value {
        Value::Null => serde_json::Value::Null,
        Value::Boolean(b) => serde_json::Value::Bool(*b),
        Value::Integer(i) => serde_json::Value::from(*i),
        // non-finite floats have no JSON form
        Value::Float(f) => serde_json::Number::from_f64(*f)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        Value::String(s) => serde_json::Value::String(s.clone()),
        Value::Date(_) => serde_json::Value::String(value.to_string()),
    }
}
