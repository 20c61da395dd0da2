//! Laravel schema-builder dialect.
//!
//! Produces an anonymous migration class with `up()` creating every table
//! and `down()` dropping them.

use crate::core::identifier::quote_php;
use crate::core::schema::{ColumnSpec, StorageType, TableSpec};
use crate::emitter::Migration;
use crate::error::Result;

use super::Dialect;

/// Length Laravel uses when `string()` gets no explicit length.
const LARAVEL_DEFAULT_STRING_LENGTH: u32 = 255;

const HEADER: &str = r#"<?php

use Illuminate\Database\Migrations\Migration;
use Illuminate\Database\Schema\Blueprint;
use Illuminate\Support\Facades\Schema;

return new class extends Migration
{
    /**
     * Run the migrations.
     */
    public function up(): void
    {
"#;

const MIDDLE: &str = r#"    }

    /**
     * Reverse the migrations.
     */
    public function down(): void
    {
"#;

const FOOTER: &str = "    }\n};\n";

/// Laravel dialect implementation.
#[derive(Debug, Clone, Default)]
pub struct LaravelDialect;

impl LaravelDialect {
    /// Create a new Laravel dialect instance.
    pub fn new() -> Self {
        Self
    }

    /// Blueprint method call for a storage type, without modifiers.
    fn column_call(column: &str, storage_type: StorageType) -> String {
        match storage_type {
            StorageType::Integer => format!("$table->integer({})", column),
            StorageType::BigInteger => format!("$table->bigInteger({})", column),
            StorageType::String { length } if length == LARAVEL_DEFAULT_STRING_LENGTH => {
                format!("$table->string({})", column)
            }
            StorageType::String { length } => format!("$table->string({}, {})", column, length),
            StorageType::Text => format!("$table->text({})", column),
            StorageType::Timestamp => format!("$table->timestamp({})", column),
        }
    }
}

impl Dialect for LaravelDialect {
    fn name(&self) -> &str {
        "laravel"
    }

    fn column_definition(&self, column: &ColumnSpec) -> Result<String> {
        let name = quote_php(&column.name)?;

        if column.is_primary_key {
            // Numeric keys become auto-incrementing keys
            if column.storage_type == StorageType::BigInteger {
                return Ok(format!("$table->bigIncrements({});", name));
            }
            return Ok(format!(
                "{}->primary();",
                Self::column_call(&name, column.storage_type)
            ));
        }

        let nullable = if column.nullable { "->nullable()" } else { "" };
        Ok(format!(
            "{}{};",
            Self::column_call(&name, column.storage_type),
            nullable
        ))
    }

    fn index_statement(&self, _table: &TableSpec, column: &ColumnSpec) -> Result<String> {
        Ok(format!("$table->index({});", quote_php(&column.name)?))
    }

    fn composite_key_statement(&self, table: &TableSpec) -> Result<String> {
        let cols = table
            .primary_key
            .iter()
            .map(|c| quote_php(c))
            .collect::<Result<Vec<_>>>()?;
        Ok(format!("$table->primary([{}]);", cols.join(", ")))
    }

    fn drop_table(&self, table: &str) -> Result<String> {
        Ok(format!("Schema::dropIfExists({});", quote_php(table)?))
    }

    fn render(&self, migration: &Migration) -> Result<String> {
        let mut php = String::from(HEADER);

        for (i, block) in migration.forward.iter().enumerate() {
            if i > 0 {
                php.push('\n');
            }
            php.push_str(&format!("        // {}\n", block.table));
            php.push_str(&format!(
                "        Schema::create({}, function (Blueprint $table) {{\n",
                quote_php(&block.table)?
            ));
            for line in block.statements() {
                php.push_str("            ");
                php.push_str(line);
                php.push('\n');
            }
            php.push_str("        });\n");
        }

        php.push_str(MIDDLE);
        for stmt in &migration.reverse {
            php.push_str("        ");
            php.push_str(stmt);
            php.push('\n');
        }
        php.push_str(FOOTER);

        Ok(php)
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
    fn test_primary_key_definitions() {
        let d = LaravelDialect::new();
        assert_eq!(
            d.column_definition(&col("user_id", StorageType::BigInteger, false, true)).unwrap(),
            "$table->bigIncrements('user_id');"
        );
        assert_eq!(
            d.column_definition(&col("locale_key", StorageType::String { length: 255 }, false, true))
                .unwrap(),
            "$table->string('locale_key')->primary();"
        );
        assert_eq!(
            d.column_definition(&col("hash", StorageType::Text, false, true)).unwrap(),
            "$table->text('hash')->primary();"
        );
    }

    #[test]
    fn test_column_definitions() {
        let d = LaravelDialect::new();
        assert_eq!(
            d.column_definition(&col("group_id", StorageType::Integer, true, false)).unwrap(),
            "$table->integer('group_id')->nullable();"
        );
        assert_eq!(
            d.column_definition(&col("insert_user", StorageType::Integer, false, false)).unwrap(),
            "$table->integer('insert_user');"
        );
        assert_eq!(
            d.column_definition(&col("insert_datetime", StorageType::Timestamp, false, false))
                .unwrap(),
            "$table->timestamp('insert_datetime');"
        );
        assert_eq!(
            d.column_definition(&col("title", StorageType::String { length: 100 }, true, false))
                .unwrap(),
            "$table->string('title', 100)->nullable();"
        );
        assert_eq!(
            d.column_definition(&col("total", StorageType::BigInteger, true, false)).unwrap(),
            "$table->bigInteger('total')->nullable();"
        );
    }

    #[test]
    fn test_composite_key_and_drop() {
        let d = LaravelDialect::new();
        let table = TableSpec {
            name: "knowledge_tags".to_string(),
            columns: vec![
                col("knowledge_id", StorageType::Integer, true, false),
                col("tag_id", StorageType::Integer, true, false),
            ],
            primary_key: vec!["knowledge_id".to_string(), "tag_id".to_string()],
        };
        assert_eq!(
            d.composite_key_statement(&table).unwrap(),
            "$table->primary(['knowledge_id', 'tag_id']);"
        );
        assert_eq!(
            d.drop_table("knowledge_tags").unwrap(),
            "Schema::dropIfExists('knowledge_tags');"
        );
    }

    #[test]
    fn test_rejects_unsafe_identifier() {
        let d = LaravelDialect::new();
        assert!(d
            .column_definition(&col("bad\nname", StorageType::Text, true, false))
            .is_err());
        assert!(d.drop_table("").is_err());
    }
}
