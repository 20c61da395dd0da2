//! Migration generation from a frozen schema document.
//!
//! The emitter is pure: the same document and target always give the same
//! bytes. Revert operations drop tables in exactly the reverse of emission
//! order.

use tracing::debug;

use crate::config::Target;
use crate::dialect::{self, Dialect};
use crate::error::Result;
use crate::model::SchemaDocument;

/// Statements creating one table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableBlock {
    /// Table name.
    pub table: String,

    /// Column definitions in stored order.
    pub columns: Vec<String>,

    /// Secondary index statements.
    pub indexes: Vec<String>,

    /// Composite primary key statement, if any.
    pub composite_key: Option<String>,
}

impl TableBlock {
    /// All statements in block order: columns, indexes, composite key.
    pub fn statements(&self) -> impl Iterator<Item = &String> {
        self.columns
            .iter()
            .chain(self.indexes.iter())
            .chain(self.composite_key.iter())
    }
}

/// A migration with apply and revert operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Migration {
    /// Create blocks in emission order.
    pub forward: Vec<TableBlock>,

    /// Drop statements in reverse emission order.
    pub reverse: Vec<String>,
}

impl Migration {
    /// Table names in apply order.
    pub fn created_tables(&self) -> impl Iterator<Item = &str> {
        self.forward.iter().map(|b| b.table.as_str())
    }
}

/// Turns schema documents into migration scripts for one target.
pub struct MigrationEmitter {
    dialect: Box<dyn Dialect>,
}

impl MigrationEmitter {
    /// Create an emitter for a target.
    pub fn new(target: Target) -> Self {
        Self {
            dialect: dialect::for_target(target),
        }
    }

    /// Create an emitter over an explicit dialect.
    pub fn with_dialect(dialect: Box<dyn Dialect>) -> Self {
        Self { dialect }
    }

    /// The dialect in use.
    pub fn dialect(&self) -> &dyn Dialect {
        self.dialect.as_ref()
    }

    /// Build the migration structure.
    pub fn emit(&self, doc: &SchemaDocument) -> Result<Migration> {
        let forward = doc
            .ordered_tables()
            .map(|t| self.dialect.create_table(t))
            .collect::<Result<Vec<_>>>()?;

        let reverse = doc
            .emission_order()
            .iter()
            .rev()
            .map(|name| self.dialect.drop_table(name))
            .collect::<Result<Vec<_>>>()?;

        debug!(
            "Emitted {} migration for {} tables",
            self.dialect.name(),
            forward.len()
        );
        Ok(Migration { forward, reverse })
    }

    /// Build and render the migration script.
    pub fn render(&self, doc: &SchemaDocument) -> Result<String> {
        let migration = self.emit(doc)?;
        self.dialect.render(&migration)
    }
}
