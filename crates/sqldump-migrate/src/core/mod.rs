//! Core types shared by every stage.
//!
//! - [`schema`]: resolved table and column types
//! - [`identifier`]: identifier validation and quoting for generated code

pub mod identifier;
pub mod schema;

pub use schema::{ColumnSpec, StorageType, TableSpec};
