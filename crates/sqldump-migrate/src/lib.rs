//! # sqldump-migrate
//!
//! Schema inference from SQL `INSERT` dumps.
//!
//! A dump of data-only `INSERT` statements carries no `CREATE TABLE`
//! definitions. This library recovers a plausible schema from it and emits
//! a migration that recreates those tables:
//!
//! - **Single-pass scan** of the dump, discovering tables and column order
//! - **Identifier classification** from sampled first values
//! - **Ordered type rules** mapping column names to storage types
//! - **Deterministic emission** as a Laravel migration or PostgreSQL DDL
//! - **Interchange artifacts** so scanning and emission can run separately
//!
//! ## Example
//!
//! ```rust,no_run
//! use sqldump_migrate::{Config, Orchestrator};
//!
//! fn main() -> sqldump_migrate::Result<()> {
//!     let config = Config::load("config.yaml")?;
//!     let orchestrator = Orchestrator::new(config)?;
//!     let summary = orchestrator.run("dump.sql", "create_schema.php")?;
//!     println!("Generated {} tables", summary.tables_total);
//!     Ok(())
//! }
//! ```

pub mod artifact;
pub mod classify;
pub mod config;
pub mod core;
pub mod dialect;
pub mod emitter;
pub mod error;
pub mod model;
pub mod orchestrator;
pub mod report;
pub mod scanner;
pub mod typemap;

// Re-exports for convenient access
pub use artifact::Artifact;
pub use classify::{Classifications, IdClass, IdentifierClassifier};
pub use config::{Config, Target};
pub use crate::core::schema::{ColumnSpec, StorageType, TableSpec};
pub use emitter::{Migration, MigrationEmitter};
pub use error::{MigrateError, Result};
pub use model::{SchemaBuilder, SchemaDocument};
pub use orchestrator::{Orchestrator, RunSummary};
pub use scanner::{DiscoveredSchema, DumpScanner, ScanStats};
pub use typemap::TypeResolver;
