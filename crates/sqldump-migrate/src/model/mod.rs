//! Schema document assembly.
//!
//! Merges discovered column lists with resolved column attributes into a
//! [`SchemaDocument`], the single artifact handed to the emitter. A document
//! is frozen once built: it can be read, persisted and reloaded, never edited.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, info, warn};

use crate::classify::Classifications;
use crate::config::Config;
use crate::core::schema::TableSpec;
use crate::error::{MigrateError, Result};
use crate::scanner::DiscoveredSchema;
use crate::typemap::TypeResolver;

/// Compute emission order: priority tables present in `tables`, in priority
/// order, then the rest in discovery order.
pub fn emission_order<'a, I>(priority: &[String], discovered: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let discovered: Vec<&str> = discovered.into_iter().collect();
    let present: HashSet<&str> = discovered.iter().copied().collect();

    let mut order: Vec<String> = Vec::with_capacity(discovered.len());
    let mut emitted: HashSet<&str> = HashSet::new();

    for table in priority {
        if present.contains(table.as_str()) && emitted.insert(table.as_str()) {
            order.push(table.clone());
        }
    }
    for table in discovered {
        if emitted.insert(table) {
            order.push(table.to_string());
        }
    }
    order
}

/// Resolved schema plus its deterministic emission order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaDocument {
    /// Hash of the configuration the document was resolved under.
    config_hash: String,

    /// Table names in emission order.
    emission_order: Vec<String>,

    /// Tables in discovery order.
    tables: Vec<TableSpec>,
}

impl SchemaDocument {
    /// Assemble a document, checking its invariants.
    pub(crate) fn new(
        config_hash: String,
        emission_order: Vec<String>,
        tables: Vec<TableSpec>,
    ) -> Result<Self> {
        let doc = Self {
            config_hash,
            emission_order,
            tables,
        };
        doc.check_invariants()?;
        Ok(doc)
    }

    /// Every ordered name is a table, every table is ordered, nothing repeats.
    pub fn check_invariants(&self) -> Result<()> {
        let mut names = HashSet::new();
        for table in &self.tables {
            if !names.insert(table.name.as_str()) {
                return Err(MigrateError::Schema(format!(
                    "table '{}' appears more than once",
                    table.name
                )));
            }
            if table.columns.is_empty() {
                return Err(MigrateError::Schema(format!(
                    "table '{}' has no columns",
                    table.name
                )));
            }
            for key in &table.primary_key {
                if table.column(key).is_none() {
                    return Err(MigrateError::Schema(format!(
                        "primary key column '{}' is not a column of '{}'",
                        key, table.name
                    )));
                }
            }
        }

        let mut ordered = HashSet::new();
        for name in &self.emission_order {
            if !ordered.insert(name.as_str()) {
                return Err(MigrateError::Schema(format!(
                    "table '{}' appears more than once in emission order",
                    name
                )));
            }
            if !names.contains(name.as_str()) {
                return Err(MigrateError::Schema(format!(
                    "emission order names unknown table '{}'",
                    name
                )));
            }
        }
        if ordered.len() != names.len() {
            return Err(MigrateError::Schema(format!(
                "emission order lists {} tables but the document has {}",
                ordered.len(),
                names.len()
            )));
        }
        Ok(())
    }

    /// Hash of the configuration used to resolve this document.
    pub fn config_hash(&self) -> &str {
        &self.config_hash
    }

    /// Validate that the document was built with the given configuration hash.
    pub fn validate_config(&self, config_hash: &str) -> Result<()> {
        if self.config_hash != config_hash {
            return Err(MigrateError::ConfigChanged);
        }
        Ok(())
    }

    /// Table names in emission order.
    pub fn emission_order(&self) -> &[String] {
        &self.emission_order
    }

    /// Tables in discovery order.
    pub fn tables(&self) -> &[TableSpec] {
        &self.tables
    }

    /// Look up a table.
    pub fn table(&self, name: &str) -> Option<&TableSpec> {
        self.tables.iter().find(|t| t.name == name)
    }

    /// Tables in emission order.
    pub fn ordered_tables(&self) -> impl DoubleEndedIterator<Item = &TableSpec> {
        self.emission_order
            .iter()
            .filter_map(move |name| self.table(name))
    }

    /// Number of tables.
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    /// Check if the document has no tables.
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

/// Builds frozen documents from scanner and classifier output.
#[derive(Debug, Clone)]
pub struct SchemaBuilder<'a> {
    config: &'a Config,
    resolver: TypeResolver,
}

impl<'a> SchemaBuilder<'a> {
    /// Create a builder for a configuration.
    pub fn new(config: &'a Config) -> Self {
        Self {
            config,
            resolver: TypeResolver::new(&config.columns),
        }
    }

    /// Resolve every discovered column and compute emission order.
    pub fn build(
        &self,
        discovered: &DiscoveredSchema,
        classifications: &Classifications,
    ) -> Result<SchemaDocument> {
        let schema_cfg = &self.config.schema;
        let mut tables = Vec::with_capacity(discovered.len());

        for found in discovered.tables() {
            let id_class = classifications.get(&found.name);
            let declared_pk = schema_cfg.primary_key_for(&found.name, &found.columns);

            if let Some(pk) = declared_pk {
                if !found.columns.iter().any(|c| c == pk) {
                    warn!(
                        "Table {}: expected primary key '{}' not among discovered columns",
                        found.name, pk
                    );
                }
            }

            let columns: Vec<_> = found
                .columns
                .iter()
                .map(|col| self.resolver.resolve(col, declared_pk, id_class).column)
                .collect();

            let mut primary_key: Vec<String> = columns
                .iter()
                .filter(|c| c.is_primary_key)
                .map(|c| c.name.clone())
                .collect();

            if let Some(key) = schema_cfg.junction_tables.get(&found.name) {
                let missing: Vec<&String> = key
                    .iter()
                    .filter(|k| !found.columns.contains(k))
                    .collect();
                if missing.is_empty() {
                    primary_key = key.clone();
                } else {
                    warn!(
                        "Junction table {}: key columns {:?} not found, composite key skipped",
                        found.name, missing
                    );
                }
            }

            debug!(
                "Resolved table {}: {} columns, key {:?}, identifiers {}",
                found.name,
                columns.len(),
                primary_key,
                id_class
            );

            tables.push(TableSpec {
                name: found.name.clone(),
                columns,
                primary_key,
            });
        }

        let order = emission_order(
            &schema_cfg.priority_tables,
            discovered.tables().iter().map(|t| t.name.as_str()),
        );

        info!("Built schema document with {} tables", tables.len());
        SchemaDocument::new(self.config.hash()?, order, tables)
    }
}
