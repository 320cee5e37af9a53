//! Tabula - an embeddable relational table store
//!
//! This library provides:
//! - Typed columns with validation and casting
//! - Table storage with primary key, unique and secondary hash indexes
//! - A catalog of tables with a two-table hash join
//! - A SQL subset front end (lexer, parser, executor)
//! - JSON snapshots of a whole database

pub mod catalog;
pub mod config;
pub mod error;
pub mod executor;
pub mod sql;
pub mod storage;

pub use catalog::{Column, DataType, Database, JoinKind};
pub use config::Config;
pub use error::{Error, ErrorKind, Result};
pub use executor::{ExecutionEngine, QueryResult};
pub use storage::{Row, Value};
