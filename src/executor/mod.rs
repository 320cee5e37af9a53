//! Statement execution
//!
//! This module contains the executor and WHERE clause evaluation.

pub mod executor;
pub mod predicate;

pub use executor::{format_rows, ExecutionEngine, QueryResult};
pub use predicate::Predicate;
