//! Hash index for Tabula
//!
//! A single-column index mapping each value to the ordered set of row
//! positions holding it. Positions are ordinals into the owning table's row
//! storage, so every deletion must be followed by [`HashIndex::shift_after`].

use std::collections::{BTreeSet, HashMap};

use super::tuple::Value;

/// Single-column hash index
#[derive(Debug, Clone)]
pub struct HashIndex {
    column_name: String,
    unique: bool,
    buckets: HashMap<Value, BTreeSet<usize>>,
}

impl HashIndex {
    /// Create an empty index on `column_name`
    pub fn new(column_name: impl Into<String>, unique: bool) -> Self {
        Self {
            column_name: column_name.into(),
            unique,
            buckets: HashMap::new(),
        }
    }

    pub fn column_name(&self) -> &str {
        &self.column_name
    }

    pub fn is_unique(&self) -> bool {
        self.unique
    }

    /// Add `position` to the bucket for `value`
    pub fn add(&mut self, value: Value, position: usize) {
        self.buckets.entry(value).or_default().insert(position);
    }

    /// Remove `position` from the bucket for `value`, dropping an emptied bucket
    pub fn remove(&mut self, value: &Value, position: usize) {
        if let Some(bucket) = self.buckets.get_mut(value) {
            bucket.remove(&position);
            if bucket.is_empty() {
                self.buckets.remove(value);
            }
        }
    }

    /// Positions holding exactly `value`, ascending
    pub fn lookup(&self, value: &Value) -> Vec<usize> {
        self.buckets
            .get(value)
            .map(|bucket| bucket.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn contains(&self, value: &Value) -> bool {
        self.buckets.contains_key(value)
    }

    /// Decrement every position greater than `deleted_position`
    pub fn shift_after(&mut self, deleted_position: usize) {
        for bucket in self.buckets.values_mut() {
            if bucket.range(deleted_position + 1..).next().is_none() {
                continue;
            }
            *bucket = bucket
                .iter()
                .map(|&p| if p > deleted_position { p - 1 } else { p })
                .collect();
        }
    }

    /// Number of distinct keys
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Iterate over `(value, positions)` pairs in no particular order
    pub fn entries(&self) -> impl Iterator<Item = (&Value, &BTreeSet<usize>)> {
        self.buckets.iter()
    }
}
