//! WHERE clause evaluation
//!
//! A [`Condition`] is compiled once against a table: the column is resolved to
//! a position and the literal is coerced toward the column type where no
//! information is lost (text into DATE, integer into FLOAT).

use std::cmp::Ordering;

use crate::catalog::DataType;
use crate::error::Result;
use crate::sql::ast::{CompareOp, Condition};
use crate::storage::{Table, Tuple, Value};

/// A single `column op literal` comparison bound to a table
#[derive(Debug, Clone)]
pub struct Predicate {
    position: usize,
    op: CompareOp,
    value: Value,
}

impl Predicate {
    pub fn compile(table: &Table, condition: &Condition) -> Result<Self> {
        let position = table.column_position(&condition.column)?;
        let data_type = table.columns()[position].data_type();
        let value = coerce(Value::from(condition.value.clone()), data_type)?;

        Ok(Self {
            position,
            op: condition.op,
            value,
        })
    }

    /// Evaluate against a stored tuple.
    ///
    /// `=` treats NULL as equal to NULL and `!=` is its negation. Ordering
    /// operators are false when either side is NULL; any other mismatch is an
    /// error.
    pub fn evaluate(&self, tuple: &Tuple) -> Result<bool> {
        let lhs = tuple.get(self.position).unwrap_or(&Value::Null);

        let accept: fn(Ordering) -> bool = match self.op {
            CompareOp::Eq => return Ok(lhs.loosely_equals(&self.value)),
            CompareOp::NotEq => return Ok(!lhs.loosely_equals(&self.value)),
            CompareOp::Lt => Ordering::is_lt,
            CompareOp::LtEq => Ordering::is_le,
            CompareOp::Gt => Ordering::is_gt,
            CompareOp::GtEq => Ordering::is_ge,
        };

        if lhs.is_null() || self.value.is_null() {
            return Ok(false);
        }
        Ok(accept(lhs.compare(&self.value)?))
    }
}

fn coerce(value: Value, data_type: DataType) -> Result<Value> {
    match (data_type, value) {
        (DataType::Date, Value::String(s)) => Value::parse_date(&s).map(Value::Date),
        (DataType::Float, Value::Integer(i)) => Ok(Value::Float(i as f64)),
        (_, value) => Ok(value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Column;
    use crate::error::Error;
    use crate::sql::ast::Literal;
    use chrono::NaiveDate;

    fn table() -> Table {
        let mut table = Table::new(
            "events",
            vec![
                Column::new("id", DataType::Integer).primary_key(true),
                Column::new("name", DataType::Varchar(20)),
                Column::new("day", DataType::Date),
                Column::new("weight", DataType::Float),
            ],
        )
        .unwrap();
        table
            .insert([
                ("id", Value::from(1)),
                ("name", Value::from("launch")),
                ("day", Value::from("2024-01-15")),
                ("weight", Value::from(2)),
            ])
            .unwrap();
        table.insert([("id", Value::from(2))]).unwrap();
        table
    }

    fn predicate(table: &Table, column: &str, op: CompareOp, value: Literal) -> Predicate {
        Predicate::compile(
            table,
            &Condition {
                column: column.to_string(),
                op,
                value,
            },
        )
        .unwrap()
    }

    #[test]
    fn test_equality_and_nulls() {
        let table = table();
        let rows = table.rows();

        let p = predicate(&table, "name", CompareOp::Eq, Literal::String("launch".into()));
        assert!(p.evaluate(&rows[0]).unwrap());
        assert!(!p.evaluate(&rows[1]).unwrap());

        let p = predicate(&table, "name", CompareOp::Eq, Literal::Null);
        assert!(!p.evaluate(&rows[0]).unwrap());
        assert!(p.evaluate(&rows[1]).unwrap());

        let p = predicate(&table, "name", CompareOp::NotEq, Literal::Null);
        assert!(p.evaluate(&rows[0]).unwrap());
    }

    #[test]
    fn test_ordering_with_nulls_is_false() {
        let table = table();
        let p = predicate(&table, "weight", CompareOp::Lt, Literal::Integer(10));
        assert!(p.evaluate(&table.rows()[0]).unwrap());
        assert!(!p.evaluate(&table.rows()[1]).unwrap());
    }

    #[test]
    fn test_date_literal_is_coerced() {
        let table = table();
        let p = predicate(&table, "day", CompareOp::GtEq, Literal::String("2024-01-01".into()));
        assert_eq!(
            p.value,
            Value::Date(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap())
        );
        assert!(p.evaluate(&table.rows()[0]).unwrap());
    }

    #[test]
    fn test_incomparable_values() {
        let table = table();
        let p = predicate(&table, "name", CompareOp::Gt, Literal::Integer(3));
        assert!(matches!(
            p.evaluate(&table.rows()[0]),
            Err(Error::IncomparableValues(..))
        ));
    }

    #[test]
    fn test_unknown_column() {
        let table = table();
        let result = Predicate::compile(
            &table,
            &Condition {
                column: "nope".to_string(),
                op: CompareOp::Eq,
                value: Literal::Integer(1),
            },
        );
        assert!(matches!(result, Err(Error::ColumnNotFound(..))));
    }
}
