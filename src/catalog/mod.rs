//! Catalog module
//!
//! This module contains the database catalog, schema definitions, data types
//! and the snapshot format.

pub mod database;
pub mod schema;
pub mod snapshot;
pub mod types;

pub use database::{Database, JoinKind};
pub use schema::{Column, Schema};
pub use snapshot::DatabaseSnapshot;
pub use types::{DataType, TypeDescriptor};
