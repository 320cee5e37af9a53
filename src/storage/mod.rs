//! Storage engine module
//!
//! This module contains the storage engine components:
//! - Values, tuples and rows
//! - Hash indexes over row positions
//! - Tables enforcing column constraints

pub mod index;
pub mod table;
pub mod tuple;

pub use index::HashIndex;
pub use table::{RowPredicate, Table};
pub use tuple::{Row, Tuple, Value};
