//! PostgreSQL DDL dialect.
//!
//! Renders one script with `-- migrate:up` and `-- migrate:down` sections.

use crate::core::identifier::{quote_pg, shorten_identifier, PG_MAX_IDENTIFIER_BYTES};
use crate::core::schema::{ColumnSpec, StorageType, TableSpec};
use crate::emitter::Migration;
use crate::error::Result;

use super::{index_name, Dialect};

/// PostgreSQL dialect implementation.
#[derive(Debug, Clone, Default)]
pub struct PostgresDialect;

impl PostgresDialect {
    /// Create a new PostgreSQL dialect instance.
    pub fn new() -> Self {
        Self
    }

    /// PostgreSQL type for a storage type.
    pub fn pg_type(storage_type: StorageType) -> String {
        match storage_type {
            StorageType::Integer => "integer".to_string(),
            StorageType::BigInteger => "bigint".to_string(),
            StorageType::String { length } => format!("varchar({})", length),
            StorageType::Text => "text".to_string(),
            StorageType::Timestamp => "timestamp(0) without time zone".to_string(),
        }
    }
}

impl Dialect for PostgresDialect {
    fn name(&self) -> &str {
        "postgres"
    }

    fn column_definition(&self, column: &ColumnSpec) -> Result<String> {
        let mut def = format!(
            "{} {}",
            quote_pg(&column.name)?,
            Self::pg_type(column.storage_type)
        );

        if column.is_primary_key {
            if column.storage_type == StorageType::BigInteger {
                def.push_str(" GENERATED BY DEFAULT AS IDENTITY");
            }
            def.push_str(" PRIMARY KEY");
        } else if !column.nullable {
            def.push_str(" NOT NULL");
        }
        Ok(def)
    }

    fn index_statement(&self, table: &TableSpec, column: &ColumnSpec) -> Result<String> {
        let idx_name = shorten_identifier(
            &index_name(&table.name, &column.name),
            PG_MAX_IDENTIFIER_BYTES,
        );
        Ok(format!(
            "CREATE INDEX {} ON {} ({});",
            quote_pg(&idx_name)?,
            quote_pg(&table.name)?,
            quote_pg(&column.name)?
        ))
    }

    fn composite_key_statement(&self, table: &TableSpec) -> Result<String> {
        let cols = table
            .primary_key
            .iter()
            .map(|c| quote_pg(c))
            .collect::<Result<Vec<_>>>()?;
        Ok(format!(
            "ALTER TABLE {} ADD PRIMARY KEY ({});",
            quote_pg(&table.name)?,
            cols.join(", ")
        ))
    }

    fn drop_table(&self, table: &str) -> Result<String> {
        Ok(format!("DROP TABLE IF EXISTS {};", quote_pg(table)?))
    }

    fn render(&self, migration: &Migration) -> Result<String> {
        let mut sql = String::from("-- migrate:up\n");

        for block in &migration.forward {
            sql.push('\n');
            sql.push_str(&format!("CREATE TABLE {} (\n", quote_pg(&block.table)?));
            sql.push_str(
                &block
                    .columns
                    .iter()
                    .map(|c| format!("    {}", c))
                    .collect::<Vec<_>>()
                    .join(",\n"),
            );
            sql.push_str("\n);\n");
            for stmt in block.indexes.iter().chain(block.composite_key.iter()) {
                sql.push_str(stmt);
                sql.push('\n');
            }
        }

        sql.push_str("\n-- migrate:down\n\n");
        for stmt in &migration.reverse {
            sql.push_str(stmt);
            sql.push('\n');
        }

        Ok(sql)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn col(name: &str, storage_type: StorageType, nullable: bool, pk: bool) -> ColumnSpec {
        ColumnSpec {
            name: name.to_string(),
            storage_type,
            nullable,
            is_primary_key: pk,
            is_indexed: false,
        }
    }

    #[test]
    fn test_column_definitions() {
        let d = PostgresDialect::new();
        assert_eq!(
            d.column_definition(&col("user_id", StorageType::BigInteger, false, true)).unwrap(),
            "\"user_id\" bigint GENERATED BY DEFAULT AS IDENTITY PRIMARY KEY"
        );
        assert_eq!(
            d.column_definition(&col("hash", StorageType::Text, false, true)).unwrap(),
            "\"hash\" text PRIMARY KEY"
        );
        assert_eq!(
            d.column_definition(&col("insert_user", StorageType::Integer, false, false)).unwrap(),
            "\"insert_user\" integer NOT NULL"
        );
        assert_eq!(
            d.column_definition(&col("title", StorageType::String { length: 255 }, true, false))
                .unwrap(),
            "\"title\" varchar(255)"
        );
        assert_eq!(
            d.column_definition(&col("insert_datetime", StorageType::Timestamp, false, false))
                .unwrap(),
            "\"insert_datetime\" timestamp(0) without time zone NOT NULL"
        );
    }

    #[test]
    fn test_index_statement_truncates_name() {
        let d = PostgresDialect::new();
        let long_table = "t".repeat(60);
        let table = TableSpec {
            name: long_table.clone(),
            columns: vec![col("group_id", StorageType::Integer, true, false)],
            primary_key: vec![],
        };
        let stmt = d.index_statement(&table, &table.columns[0]).unwrap();
        let expected_name = shorten_identifier(&format!("{}_group_id_index", long_table), 63);
        assert_eq!(expected_name.len(), 63);
        assert_eq!(
            stmt,
            format!(
                "CREATE INDEX \"{}\" ON \"{}\" (\"group_id\");",
                expected_name, long_table
            )
        );
    }

    #[test]
    fn test_long_table_index_names_do_not_collide() {
        let d = PostgresDialect::new();
        let table = TableSpec {
            name: "n".repeat(100),
            columns: vec![
                col("group_id", StorageType::Integer, true, false),
                col("owner_id", StorageType::Integer, true, false),
            ],
            primary_key: vec![],
        };
        let first = d.index_statement(&table, &table.columns[0]).unwrap();
        let second = d.index_statement(&table, &table.columns[1]).unwrap();
        let name = |stmt: &str| stmt.split('"').nth(1).unwrap().to_string();
        assert_ne!(name(&first), name(&second));
        assert!(name(&first).len() <= 63);
        assert!(name(&second).len() <= 63);
    }

    #[test]
    fn test_composite_key_and_drop() {
        let d = PostgresDialect::new();
        let table = TableSpec {
            name: "knowledge_groups".to_string(),
            columns: vec![
                col("knowledge_id", StorageType::Integer, true, false),
                col("group_id", StorageType::Integer, true, false),
            ],
            primary_key: vec!["knowledge_id".to_string(), "group_id".to_string()],
        };
        assert_eq!(
            d.composite_key_statement(&table).unwrap(),
            "ALTER TABLE \"knowledge_groups\" ADD PRIMARY KEY (\"knowledge_id\", \"group_id\");"
        );
        assert_eq!(
            d.drop_table("knowledge_groups").unwrap(),
            "DROP TABLE IF EXISTS \"knowledge_groups\";"
        );
    }
}
