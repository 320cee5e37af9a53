//! Schema definitions for Tabula
//!
//! This module defines table schemas and column metadata.

use super::types::{DataType, TypeDescriptor};
use crate::error::{Error, Result};
use crate::storage::Value;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Column definition in a table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    /// Column name
    pub name: String,
    /// Type and nullability
    pub descriptor: TypeDescriptor,
    /// Is this the primary key?
    pub primary_key: bool,
    /// Is this column unique?
    pub unique: bool,
}

impl Column {
    /// Create a new nullable column
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            descriptor: TypeDescriptor::new(data_type),
            primary_key: false,
            unique: false,
        }
    }

    /// Set nullable flag (ignored for primary keys)
    pub fn nullable(mut self, nullable: bool) -> Self {
        self.descriptor.nullable = nullable && !self.primary_key;
        self
    }

    /// Set primary key flag; a primary key is always unique and NOT NULL
    pub fn primary_key(mut self, pk: bool) -> Self {
        self.primary_key = pk;
        if pk {
            self.unique = true;
            self.descriptor.nullable = false;
        }
        self
    }

    /// Set unique flag (a primary key stays unique)
    pub fn unique(mut self, unique: bool) -> Self {
        self.unique = unique || self.primary_key;
        self
    }

    pub fn data_type(&self) -> DataType {
        self.descriptor.data_type
    }

    pub fn is_nullable(&self) -> bool {
        self.descriptor.nullable
    }

    /// Cast a value for this column, naming the column in any error
    pub fn cast(&self, value: Value) -> Result<Value> {
        self.descriptor.cast(value).map_err(|e| match e {
            Error::NullValue => Error::NullNotAllowed(self.name.clone()),
            other => Error::InvalidValue {
                column: self.name.clone(),
                reason: other.to_string(),
            },
        })
    }

    /// Constraint keywords for display (`PRIMARY KEY`, `UNIQUE`, `NOT NULL`)
    pub fn constraints(&self) -> Vec<&'static str> {
        let mut flags = Vec::new();
        if self.primary_key {
            flags.push("PRIMARY KEY");
        } else if self.unique {
            flags.push("UNIQUE");
        }
        if !self.descriptor.nullable && !self.primary_key {
            flags.push("NOT NULL");
        }
        flags
    }
}

/// Table schema - the ordered columns of a table
#[derive(Debug, Clone, Default)]
pub struct Schema {
    /// Ordered list of columns
    columns: Vec<Column>,
    /// Column name to position mapping
    name_to_index: HashMap<String, usize>,
}

impl Schema {
    /// Build a schema, rejecting duplicate column names
    pub fn from_columns(table_name: &str, columns: Vec<Column>) -> Result<Self> {
        let mut schema = Self::default();
        for column in columns {
            if schema.has_column(&column.name) {
                return Err(Error::DuplicateColumn(column.name, table_name.to_string()));
            }
            schema
                .name_to_index
                .insert(column.name.clone(), schema.columns.len());
            schema.columns.push(column);
        }
        Ok(schema)
    }

    /// Get column by name
    pub fn get_column(&self, name: &str) -> Option<&Column> {
        self.name_to_index.get(name).map(|&idx| &self.columns[idx])
    }

    /// Get column position by name
    pub fn get_column_index(&self, name: &str) -> Option<usize> {
        self.name_to_index.get(name).copied()
    }

    /// Get all columns
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.name_to_index.contains_key(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_creation() {
        let schema = Schema::from_columns(
            "users",
            vec![
                Column::new("id", DataType::Integer).primary_key(true),
                Column::new("name", DataType::Varchar(100)).nullable(false),
                Column::new("email", DataType::Varchar(255)).unique(true),
            ],
        )
        .unwrap();

        assert_eq!(schema.column_count(), 3);
        assert!(schema.has_column("id"));
        assert!(!schema.has_column("unknown"));
        assert_eq!(schema.get_column_index("email"), Some(2));
    }

    #[test]
    fn test_primary_key_invariant() {
        let col = Column::new("id", DataType::Integer)
            .primary_key(true)
            .nullable(true)
            .unique(false);
        assert!(col.primary_key);
        assert!(col.unique);
        assert!(!col.is_nullable());
        assert_eq!(col.constraints(), vec!["PRIMARY KEY"]);
    }

    #[test]
    fn test_duplicate_column_rejected() {
        let result = Schema::from_columns(
            "t",
            vec![
                Column::new("a", DataType::Integer),
                Column::new("a", DataType::Float),
            ],
        );
        assert!(matches!(result, Err(Error::DuplicateColumn(..))));
    }

    #[test]
    fn test_column_cast_names_column() {
        let col = Column::new("age", DataType::Integer).nullable(false);
        assert!(matches!(
            col.cast(Value::Null),
            Err(Error::NullNotAllowed(name)) if name == "age"
        ));
        assert!(matches!(
            col.cast(Value::from("old")),
            Err(Error::InvalidValue { column, .. }) if column == "age"
        ));
    }
}
