//! Table storage for Tabula
//!
//! A table owns its schema, its rows and the indexes over them. Rows are
//! addressed by their ordinal position in storage; indexes store those
//! positions and are rewritten on every deletion.

use indexmap::IndexMap;
use tracing::{debug, trace};

use super::index::HashIndex;
use super::tuple::{Row, Tuple, Value};
use crate::catalog::{Column, Schema};
use crate::error::{Error, Result};

/// Per-row filter used by select, update and delete
pub type RowPredicate<'a> = &'a dyn Fn(&Tuple) -> Result<bool>;

/// A table combining schema, row storage and indexes
#[derive(Debug, Clone)]
pub struct Table {
    name: String,
    schema: Schema,
    rows: Vec<Tuple>,
    /// Indexes keyed by column name
    indexes: IndexMap<String, HashIndex>,
    primary_key: Option<String>,
}

impl Table {
    /// Create a table, building a unique index for every primary key and
    /// unique column
    pub fn new(name: impl Into<String>, columns: Vec<Column>) -> Result<Self> {
        let name = name.into();
        let schema = Schema::from_columns(&name, columns)?;
        let primary_key = schema
            .columns()
            .iter()
            .find(|c| c.primary_key)
            .map(|c| c.name.clone());

        let mut table = Self {
            name,
            schema,
            rows: Vec::new(),
            indexes: IndexMap::new(),
            primary_key,
        };

        let constrained: Vec<String> = table
            .schema
            .columns()
            .iter()
            .filter(|c| c.primary_key || c.unique)
            .map(|c| c.name.clone())
            .collect();
        for column in constrained {
            table.create_index(&column, true)?;
        }

        Ok(table)
    }

    /// Get table name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get table schema
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn columns(&self) -> &[Column] {
        self.schema.columns()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.schema.get_column(name)
    }

    /// Name of the primary key column, if any
    pub fn primary_key(&self) -> Option<&str> {
        self.primary_key.as_deref()
    }

    /// Raw rows in storage order
    pub fn rows(&self) -> &[Tuple] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Index on `column`, if one exists
    pub fn index(&self, column: &str) -> Option<&HashIndex> {
        self.indexes.get(column)
    }

    /// All indexes, in creation order
    pub fn indexes(&self) -> impl Iterator<Item = &HashIndex> {
        self.indexes.values()
    }

    /// Position of a column, or a schema error
    pub fn column_position(&self, name: &str) -> Result<usize> {
        self.schema
            .get_column_index(name)
            .ok_or_else(|| Error::ColumnNotFound(name.to_string(), self.name.clone()))
    }

    /// Materialize a stored tuple as a field-to-value row
    pub fn to_row(&self, tuple: &Tuple) -> Row {
        self.schema
            .columns()
            .iter()
            .zip(tuple.values())
            .map(|(c, v)| (c.name.clone(), v.clone()))
            .collect()
    }

    /// Create (or rebuild) an index on `column` from the current rows.
    ///
    /// An existing unique index is never downgraded to a non-unique one.
    pub fn create_index(&mut self, column: &str, unique: bool) -> Result<()> {
        let position = self.column_position(column)?;
        let unique = unique || self.indexes.get(column).is_some_and(|i| i.is_unique());

        let mut index = HashIndex::new(column, unique);
        for (row_id, tuple) in self.rows.iter().enumerate() {
            let value = &tuple.values()[position];
            if unique && !value.is_null() && index.contains(value) {
                return Err(Error::DuplicateValue {
                    column: column.to_string(),
                    value: value.to_string(),
                });
            }
            index.add(value.clone(), row_id);
        }

        debug!(table = %self.name, column, unique, rows = self.rows.len(), "index built");
        self.indexes.insert(column.to_string(), index);
        Ok(())
    }

    /// Insert a row given as (column, value) pairs. Returns its position.
    ///
    /// Missing nullable columns become NULL. Nothing is stored unless every
    /// cast and uniqueness check passes.
    pub fn insert<K, V, I>(&mut self, values: I) -> Result<usize>
    where
        K: AsRef<str>,
        V: Into<Value>,
        I: IntoIterator<Item = (K, V)>,
    {
        let supplied: Vec<(K, Value)> = values.into_iter().map(|(k, v)| (k, v.into())).collect();

        for column in self.schema.columns() {
            let present = supplied.iter().any(|(k, _)| k.as_ref() == column.name);
            if !present && !column.is_nullable() {
                return Err(Error::MissingRequiredColumn(column.name.clone()));
            }
        }

        let mut slots: Vec<Value> = vec![Value::Null; self.schema.column_count()];
        for (name, value) in supplied {
            let position = self.column_position(name.as_ref())?;
            slots[position] = self.schema.columns()[position].cast(value)?;
        }

        for index in self.indexes.values() {
            if !index.is_unique() {
                continue;
            }
            let value = &slots[self.column_position(index.column_name())?];
            if !value.is_null() && index.contains(value) {
                return Err(Error::DuplicateValue {
                    column: index.column_name().to_string(),
                    value: value.to_string(),
                });
            }
        }

        let row_id = self.rows.len();
        for index in self.indexes.values_mut() {
            if let Some(position) = self.schema.get_column_index(index.column_name()) {
                index.add(slots[position].clone(), row_id);
            }
        }
        self.rows.push(Tuple::new(slots));

        trace!(table = %self.name, row_id, "row inserted");
        Ok(row_id)
    }

    /// Select rows in storage order, projected onto `columns` (all columns
    /// when `None`)
    pub fn select(
        &self,
        columns: Option<&[&str]>,
        predicate: Option<RowPredicate<'_>>,
    ) -> Result<Vec<Row>> {
        let projection: Vec<(usize, &str)> = match columns {
            Some(names) => {
                let mut projection = Vec::with_capacity(names.len());
                for &name in names {
                    projection.push((self.column_position(name)?, name));
                }
                projection
            }
            None => self
                .schema
                .columns()
                .iter()
                .enumerate()
                .map(|(i, c)| (i, c.name.as_str()))
                .collect(),
        };

        let mut result = Vec::new();
        for tuple in &self.rows {
            if !Self::matches(tuple, predicate)? {
                continue;
            }
            let row: Row = projection
                .iter()
                .map(|(i, name)| (name.to_string(), tuple.values()[*i].clone()))
                .collect();
            result.push(row);
        }
        Ok(result)
    }

    /// Update matching rows in place. Returns the number of rows updated.
    ///
    /// Rows are updated one at a time: a uniqueness violation leaves the
    /// offending row (and its index entries) untouched and fails the call,
    /// but rows updated before it stay updated.
    pub fn update<K, V, I>(
        &mut self,
        new_values: I,
        predicate: Option<RowPredicate<'_>>,
    ) -> Result<usize>
    where
        K: AsRef<str>,
        V: Into<Value>,
        I: IntoIterator<Item = (K, V)>,
    {
        let mut updates: IndexMap<usize, Value> = IndexMap::new();
        for (name, value) in new_values {
            let position = self.column_position(name.as_ref())?;
            let casted = self.schema.columns()[position].cast(value.into())?;
            updates.insert(position, casted);
        }

        let mut count = 0;
        for row_id in 0..self.rows.len() {
            if !Self::matches(&self.rows[row_id], predicate)? {
                continue;
            }
            self.update_row(row_id, &updates)?;
            count += 1;
        }

        debug!(table = %self.name, count, "rows updated");
        Ok(count)
    }

    fn update_row(&mut self, row_id: usize, updates: &IndexMap<usize, Value>) -> Result<()> {
        let columns = self.schema.columns();

        // Provisionally pull the old values out of the unique indexes
        let mut removed: Vec<(&str, Value)> = Vec::new();
        let mut conflict = None;
        for (&position, new_value) in updates {
            let name = columns[position].name.as_str();
            let Some(index) = self.indexes.get_mut(name) else {
                continue;
            };
            if !index.is_unique() {
                continue;
            }
            let old_value = self.rows[row_id].values()[position].clone();
            index.remove(&old_value, row_id);
            removed.push((name, old_value));
            if !new_value.is_null() && index.contains(new_value) {
                conflict = Some((name, new_value));
                break;
            }
        }

        if let Some((name, value)) = conflict {
            for (name, old_value) in removed {
                if let Some(index) = self.indexes.get_mut(name) {
                    index.add(old_value, row_id);
                }
            }
            return Err(Error::DuplicateValue {
                column: name.to_string(),
                value: value.to_string(),
            });
        }

        for (&position, new_value) in updates {
            let name = columns[position].name.as_str();
            if let Some(index) = self.indexes.get_mut(name) {
                if !index.is_unique() {
                    index.remove(&self.rows[row_id].values()[position], row_id);
                }
                index.add(new_value.clone(), row_id);
            }
            self.rows[row_id].set(position, new_value.clone());
        }
        Ok(())
    }

    /// Delete matching rows. Returns the number of rows removed.
    pub fn delete(&mut self, predicate: Option<RowPredicate<'_>>) -> Result<usize> {
        let mut to_delete = Vec::new();
        for (row_id, tuple) in self.rows.iter().enumerate() {
            if Self::matches(tuple, predicate)? {
                to_delete.push(row_id);
            }
        }

        // Highest first so the remaining targets keep their positions
        for &row_id in to_delete.iter().rev() {
            let tuple = self.rows.remove(row_id);
            for index in self.indexes.values_mut() {
                if let Some(position) = self.schema.get_column_index(index.column_name()) {
                    index.remove(&tuple.values()[position], row_id);
                }
                index.shift_after(row_id);
            }
        }

        debug!(table = %self.name, count = to_delete.len(), "rows deleted");
        Ok(to_delete.len())
    }

    /// Human-readable column listing (for the shell's `describe`)
    pub fn describe(&self) -> String {
        let mut info = format!("Table: {}\n", self.name);
        info.push_str(&format!("{:<20} {:<15} {}\n", "Column", "Type", "Constraints"));
        for col in self.schema.columns() {
            info.push_str(&format!(
                "{:<20} {:<15} {}\n",
                col.name,
                col.data_type().to_string(),
                col.constraints().join(", ")
            ));
        }

        let indexed: Vec<String> = self
            .indexes
            .values()
            .map(|idx| {
                format!(
                    "{}{}",
                    idx.column_name(),
                    if idx.is_unique() { " (unique)" } else { "" }
                )
            })
            .collect();
        if !indexed.is_empty() {
            info.push_str(&format!("Indexes: {}\n", indexed.join(", ")));
        }
        info
    }

    fn matches(tuple: &Tuple, predicate: Option<RowPredicate<'_>>) -> Result<bool> {
        match predicate {
            Some(predicate) => predicate(tuple),
            None => Ok(true),
        }
    }
}
