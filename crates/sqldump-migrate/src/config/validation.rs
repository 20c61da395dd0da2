//! Configuration validation.

use std::collections::HashSet;

use super::Config;
use crate::error::{MigrateError, Result};

/// Validate the configuration.
pub fn validate(config: &Config) -> Result<()> {
    // Scan validation
    if config.scan.max_samples == 0 {
        return Err(MigrateError::Config(
            "scan.max_samples must be at least 1".into(),
        ));
    }
    if config.scan.long_string_threshold == 0 {
        return Err(MigrateError::Config(
            "scan.long_string_threshold must be at least 1".into(),
        ));
    }

    // Schema validation
    let mut seen = HashSet::new();
    for table in &config.schema.priority_tables {
        if table.is_empty() {
            return Err(MigrateError::Config(
                "schema.priority_tables cannot contain empty names".into(),
            ));
        }
        if !seen.insert(table.as_str()) {
            return Err(MigrateError::Config(format!(
                "schema.priority_tables lists '{}' more than once",
                table
            )));
        }
    }

    for (table, pk) in &config.schema.primary_keys {
        if pk.is_empty() {
            return Err(MigrateError::Config(format!(
                "schema.primary_keys.{} cannot be empty",
                table
            )));
        }
    }

    for (table, key) in &config.schema.junction_tables {
        if key.len() < 2 {
            return Err(MigrateError::Config(format!(
                "schema.junction_tables.{} needs at least two key columns, got {}",
                table,
                key.len()
            )));
        }
        let distinct: HashSet<&String> = key.iter().collect();
        if distinct.len() != key.len() {
            return Err(MigrateError::Config(format!(
                "schema.junction_tables.{} repeats a key column",
                table
            )));
        }
        if config.schema.primary_keys.contains_key(table) {
            return Err(MigrateError::Config(format!(
                "table '{}' cannot have both a primary_keys entry and a composite junction key",
                table
            )));
        }
    }

    // Column heuristics validation
    let columns = &config.columns;
    let keyword_lists = [
        ("hash_columns", &columns.hash_columns),
        ("reference_suffixes", &columns.reference_suffixes),
        ("audit_user_columns", &columns.audit_user_columns),
        ("timestamp_markers", &columns.timestamp_markers),
        ("numeric_markers", &columns.numeric_markers),
        ("long_text_columns", &columns.long_text_columns),
        ("binary_markers", &columns.binary_markers),
    ];
    for (name, list) in keyword_lists {
        if list.iter().any(|k| k.trim().is_empty()) {
            return Err(MigrateError::Config(format!(
                "columns.{} cannot contain empty entries",
                name
            )));
        }
    }
    if columns.string_length == 0 {
        return Err(MigrateError::Config(
            "columns.string_length must be at least 1".into(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate(&Config::default()).is_ok());
    }

    #[test]
    fn test_zero_max_samples() {
        let mut config = Config::default();
        config.scan.max_samples = 0;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_zero_threshold() {
        let mut config = Config::default();
        config.scan.long_string_threshold = 0;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_duplicate_priority_table() {
        let mut config = Config::default();
        config.schema.priority_tables.push("users".to_string());
        let err = validate(&config).unwrap_err();
        assert!(err.to_string().contains("more than once"));
    }

    #[test]
    fn test_junction_key_too_short() {
        let mut config = Config::default();
        config
            .schema
            .junction_tables
            .insert("pairs".to_string(), vec!["left_id".to_string()]);
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_junction_key_repeats_column() {
        let mut config = Config::default();
        config.schema.junction_tables.insert(
            "pairs".to_string(),
            vec!["left_id".to_string(), "left_id".to_string()],
        );
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_junction_conflicts_with_primary_key() {
        let mut config = Config::default();
        config
            .schema
            .primary_keys
            .insert("knowledge_tags".to_string(), "knowledge_id".to_string());
        let err = validate(&config).unwrap_err();
        assert!(err.to_string().contains("knowledge_tags"));
    }

    #[test]
    fn test_empty_keyword_entry() {
        let mut config = Config::default();
        config.columns.numeric_markers.push(" ".to_string());
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_zero_string_length() {
        let mut config = Config::default();
        config.columns.string_length = 0;
        assert!(validate(&config).is_err());
    }
}
