//! Migration languages (Strategy pattern).
//!
//! A [`Dialect`] spells resolved tables in one target language. The default
//! [`Dialect::create_table`] is a template method: it walks the columns in
//! stored order, then the indexed columns, then the composite key, and asks
//! the dialect for each piece.
//!
//! # Available Dialects
//!
//! - [`LaravelDialect`]: Laravel schema-builder migration class (PHP)
//! - [`PostgresDialect`]: plain PostgreSQL DDL with up/down sections

mod laravel;
mod postgres;

pub use laravel::LaravelDialect;
pub use postgres::PostgresDialect;

use crate::config::Target;
use crate::core::schema::{ColumnSpec, TableSpec};
use crate::emitter::{Migration, TableBlock};
use crate::error::Result;

/// Target-language syntax for generated migrations.
pub trait Dialect: Send + Sync {
    /// Dialect name (e.g., "laravel", "postgres").
    fn name(&self) -> &str;

    /// Definition of one column inside a create block.
    fn column_definition(&self, column: &ColumnSpec) -> Result<String>;

    /// Secondary index on one column.
    fn index_statement(&self, table: &TableSpec, column: &ColumnSpec) -> Result<String>;

    /// Composite primary key over `table.primary_key`.
    fn composite_key_statement(&self, table: &TableSpec) -> Result<String>;

    /// Statement dropping a table if it exists.
    fn drop_table(&self, table: &str) -> Result<String>;

    /// Render a full migration script with apply and revert operations.
    fn render(&self, migration: &Migration) -> Result<String>;

    /// Build the create block for a table.
    fn create_table(&self, table: &TableSpec) -> Result<TableBlock> {
        let columns = table
            .columns
            .iter()
            .map(|c| self.column_definition(c))
            .collect::<Result<Vec<_>>>()?;

        let indexes = table
            .indexed_columns()
            .map(|c| self.index_statement(table, c))
            .collect::<Result<Vec<_>>>()?;

        let composite_key = if table.has_composite_pk() {
            Some(self.composite_key_statement(table)?)
        } else {
            None
        };

        Ok(TableBlock {
            table: table.name.clone(),
            columns,
            indexes,
            composite_key,
        })
    }
}

/// Dialect implementation for a target.
pub fn for_target(target: Target) -> Box<dyn Dialect> {
    match target {
        Target::Laravel => Box::new(LaravelDialect::new()),
        Target::Postgres => Box::new(PostgresDialect::new()),
    }
}

/// Conventional secondary index name (`<table>_<column>_index`).
pub(crate) fn index_name(table: &str, column: &str) -> String {
    format!("{}_{}_index", table, column)
}
