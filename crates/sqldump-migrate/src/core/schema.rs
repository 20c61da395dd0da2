//! Resolved schema types: tables, columns, and their storage types.
//!
//! These types are dialect-agnostic. Dialects decide how a [`StorageType`]
//! is spelled in the target migration language.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Storage type assigned to an inferred column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StorageType {
    /// 32-bit integer.
    Integer,
    /// 64-bit integer.
    BigInteger,
    /// Bounded string.
    String { length: u32 },
    /// Unbounded text.
    Text,
    /// Timestamp without time zone.
    Timestamp,
}

impl StorageType {
    /// Whether the type holds integers.
    pub fn is_integer(&self) -> bool {
        matches!(self, StorageType::Integer | StorageType::BigInteger)
    }
}

impl fmt::Display for StorageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageType::Integer => write!(f, "integer"),
            StorageType::BigInteger => write!(f, "bigint"),
            StorageType::String { length } => write!(f, "string({})", length),
            StorageType::Text => write!(f, "text"),
            StorageType::Timestamp => write!(f, "timestamp"),
        }
    }
}

/// Column with its resolved attributes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSpec {
    /// Column name as discovered in the dump.
    pub name: String,

    /// Resolved storage type.
    pub storage_type: StorageType,

    /// Whether the column allows NULL.
    pub nullable: bool,

    /// Whether the column alone is the table's primary key.
    pub is_primary_key: bool,

    /// Whether the column gets a secondary index.
    pub is_indexed: bool,
}

/// Table metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSpec {
    /// Table name.
    pub name: String,

    /// Columns in first-discovered order.
    pub columns: Vec<ColumnSpec>,

    /// Primary key column names (one for simple keys, two or more for composite).
    #[serde(default)]
    pub primary_key: Vec<String>,
}

impl TableSpec {
    /// Check if the table has a primary key.
    pub fn has_pk(&self) -> bool {
        !self.primary_key.is_empty()
    }

    /// Check if the primary key spans several columns.
    ///
    /// Composite keys are declared as a separate statement after the columns.
    pub fn has_composite_pk(&self) -> bool {
        self.primary_key.len() > 1
    }

    /// Find a column by name.
    pub fn column(&self, name: &str) -> Option<&ColumnSpec> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Columns that receive a secondary index, in column order.
    pub fn indexed_columns(&self) -> impl Iterator<Item = &ColumnSpec> {
        self.columns.iter().filter(|c| c.is_indexed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn column(name: &str, storage_type: StorageType, is_indexed: bool) -> ColumnSpec {
        ColumnSpec {
            name: name.to_string(),
            storage_type,
            nullable: true,
            is_primary_key: false,
            is_indexed,
        }
    }

    #[test]
    fn test_storage_type_display() {
        assert_eq!(StorageType::BigInteger.to_string(), "bigint");
        assert_eq!(StorageType::String { length: 255 }.to_string(), "string(255)");
        assert_eq!(StorageType::Timestamp.to_string(), "timestamp");
    }

    #[test]
    fn test_storage_type_json_shape() {
        let json = serde_json::to_string(&StorageType::String { length: 40 }).unwrap();
        assert_eq!(json, r#"{"type":"string","length":40}"#);
        let back: StorageType = serde_json::from_str(r#"{"type":"big_integer"}"#).unwrap();
        assert_eq!(back, StorageType::BigInteger);
    }

    #[test]
    fn test_indexed_columns_keep_order() {
        let table = TableSpec {
            name: "knowledges".to_string(),
            columns: vec![
                column("knowledge_id", StorageType::BigInteger, false),
                column("type_id", StorageType::Integer, true),
                column("title", StorageType::String { length: 255 }, false),
                column("delete_flag", StorageType::Integer, true),
            ],
            primary_key: vec!["knowledge_id".to_string()],
        };
        let names: Vec<&str> = table.indexed_columns().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["type_id", "delete_flag"]);
        assert!(table.has_pk());
        assert!(!table.has_composite_pk());
        assert!(table.column("title").is_some());
    }
}
