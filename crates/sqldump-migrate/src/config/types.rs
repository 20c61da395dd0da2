//! Heuristic configuration type definitions.
//!
//! Every table the resolver and emitter consult (priority list, expected
//! primary keys, keyword rules, junction tables) lives here as plain data.
//! Defaults reproduce the knowledge-base profile the heuristics were tuned on.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::MigrateError;

/// Root configuration structure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Config {
    /// Dump scanning and identifier sampling.
    #[serde(default)]
    pub scan: ScanConfig,

    /// Table-level heuristics (ordering, keys).
    #[serde(default)]
    pub schema: SchemaConfig,

    /// Column-name heuristics.
    #[serde(default)]
    pub columns: ColumnConfig,

    /// Migration output.
    #[serde(default)]
    pub output: OutputConfig,
}

/// Dump scanning configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Maximum distinct identifier samples kept per table (default: 5).
    #[serde(default = "default_max_samples")]
    pub max_samples: usize,

    /// Samples longer than this many characters make a key unbounded text (default: 100).
    #[serde(default = "default_long_string_threshold")]
    pub long_string_threshold: usize,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            max_samples: default_max_samples(),
            long_string_threshold: default_long_string_threshold(),
        }
    }
}

/// Table-level configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaConfig {
    /// Tables emitted first, in this order, when present in the dump.
    #[serde(default = "default_priority_tables")]
    pub priority_tables: Vec<String>,

    /// Expected primary-key column per table.
    #[serde(default = "default_primary_keys")]
    pub primary_keys: BTreeMap<String, String>,

    /// Use the first discovered column as the key of tables missing from `primary_keys`.
    #[serde(default)]
    pub first_column_primary_key: bool,

    /// Junction tables and their composite key columns.
    #[serde(default = "default_junction_tables")]
    pub junction_tables: BTreeMap<String, Vec<String>>,
}

impl Default for SchemaConfig {
    fn default() -> Self {
        Self {
            priority_tables: default_priority_tables(),
            primary_keys: default_primary_keys(),
            first_column_primary_key: false,
            junction_tables: default_junction_tables(),
        }
    }
}

impl SchemaConfig {
    /// Expected primary-key column for a table, if any.
    pub fn primary_key_for<'a>(&'a self, table: &str, columns: &'a [String]) -> Option<&'a str> {
        if let Some(pk) = self.primary_keys.get(table) {
            return Some(pk.as_str());
        }
        if self.first_column_primary_key && !self.junction_tables.contains_key(table) {
            return columns.first().map(String::as_str);
        }
        None
    }
}

/// Column-name heuristics.
///
/// Exact-name lists compare case-insensitively; markers match as substrings
/// and suffixes as name endings, both against the lowercased column name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnConfig {
    /// Opaque hash fields stored as bounded strings.
    #[serde(default = "default_hash_columns")]
    pub hash_columns: Vec<String>,

    /// Reference-like suffixes (`_id`, `_no`).
    #[serde(default = "default_reference_suffixes")]
    pub reference_suffixes: Vec<String>,

    /// Audit-user fields (integer, not nullable).
    #[serde(default = "default_audit_user_columns")]
    pub audit_user_columns: Vec<String>,

    /// Substrings marking timestamp columns.
    #[serde(default = "default_timestamp_markers")]
    pub timestamp_markers: Vec<String>,

    /// Substrings marking flag/status/count columns.
    #[serde(default = "default_numeric_markers")]
    pub numeric_markers: Vec<String>,

    /// Long-text fields (content, credentials).
    #[serde(default = "default_long_text_columns")]
    pub long_text_columns: Vec<String>,

    /// Substrings marking binary payloads.
    #[serde(default = "default_binary_markers")]
    pub binary_markers: Vec<String>,

    /// Soft-delete flag, always indexed.
    #[serde(default = "default_soft_delete_column")]
    pub soft_delete_column: String,

    /// Length of bounded string columns (default: 255).
    #[serde(default = "default_string_length")]
    pub string_length: u32,
}

impl Default for ColumnConfig {
    fn default() -> Self {
        Self {
            hash_columns: default_hash_columns(),
            reference_suffixes: default_reference_suffixes(),
            audit_user_columns: default_audit_user_columns(),
            timestamp_markers: default_timestamp_markers(),
            numeric_markers: default_numeric_markers(),
            long_text_columns: default_long_text_columns(),
            binary_markers: default_binary_markers(),
            soft_delete_column: default_soft_delete_column(),
            string_length: default_string_length(),
        }
    }
}

/// Migration output configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct OutputConfig {
    /// Target migration language (default: laravel).
    #[serde(default)]
    pub target: Target,
}

/// Migration target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Target {
    /// Laravel schema-builder migration (PHP).
    #[default]
    Laravel,
    /// Plain PostgreSQL DDL with up/down sections.
    Postgres,
}

impl Target {
    /// File extension of generated scripts.
    pub fn extension(&self) -> &'static str {
        match self {
            Target::Laravel => "php",
            Target::Postgres => "sql",
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Laravel => write!(f, "laravel"),
            Target::Postgres => write!(f, "postgres"),
        }
    }
}

impl FromStr for Target {
    type Err = MigrateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "laravel" | "php" => Ok(Target::Laravel),
            "postgres" | "postgresql" | "pg" => Ok(Target::Postgres),
            other => Err(MigrateError::Config(format!(
                "target must be 'laravel' or 'postgres', got '{}'",
                other
            ))),
        }
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn default_max_samples() -> usize {
    5
}

fn default_long_string_threshold() -> usize {
    100
}

fn default_priority_tables() -> Vec<String> {
    strings(&[
        "users",
        "groups",
        "roles",
        "tags",
        "knowledges",
        "comments",
        "knowledge_files",
        "knowledge_tags",
        "likes",
        "like_comments",
    ])
}

fn default_primary_keys() -> BTreeMap<String, String> {
    [
        ("users", "user_id"),
        ("knowledges", "knowledge_id"),
        ("knowledge_files", "file_no"),
        ("comments", "comment_no"),
        ("tags", "tag_id"),
        ("account_images", "image_id"),
        ("activities", "activity_no"),
        ("groups", "group_id"),
        ("notices", "notice_id"),
        ("events", "event_id"),
        ("mails", "mail_id"),
        ("roles", "role_id"),
        ("systems", "system_name"),
        ("template_masters", "type_id"),
        ("template_items", "item_no"),
        ("webhooks", "webhook_id"),
        ("user_alias", "user_key"),
        ("ldap_configs", "system_name"),
        ("locales", "locale_key"),
        ("mail_configs", "system_name"),
        ("mail_locale_templates", "template_id"),
        ("notify_queues", "hash"),
        ("service_configs", "service_name"),
        ("system_configs", "system_name"),
        ("user_configs", "system_name"),
        ("t_jyumin", "jumin_no"),
    ]
    .into_iter()
    .map(|(t, c)| (t.to_string(), c.to_string()))
    .collect()
}

fn default_junction_tables() -> BTreeMap<String, Vec<String>> {
    [
        ("knowledge_tags", ["knowledge_id", "tag_id"]),
        ("knowledge_users", ["knowledge_id", "user_id"]),
        ("knowledge_groups", ["knowledge_id", "group_id"]),
        ("knowledge_edit_users", ["knowledge_id", "user_id"]),
        ("knowledge_edit_groups", ["knowledge_id", "group_id"]),
    ]
    .into_iter()
    .map(|(t, cols)| (t.to_string(), strings(&cols)))
    .collect()
}

fn default_hash_columns() -> Vec<String> {
    strings(&["row_id"])
}

fn default_reference_suffixes() -> Vec<String> {
    strings(&["_id", "_no"])
}

fn default_audit_user_columns() -> Vec<String> {
    strings(&["insert_user", "update_user"])
}

fn default_timestamp_markers() -> Vec<String> {
    strings(&["datetime"])
}

fn default_numeric_markers() -> Vec<String> {
    strings(&["flag", "status", "count", "ldap"])
}

fn default_long_text_columns() -> Vec<String> {
    strings(&[
        "content",
        "comment",
        "description",
        "init_content",
        "salt",
        "password",
    ])
}

fn default_binary_markers() -> Vec<String> {
    strings(&["binary"])
}

fn default_soft_delete_column() -> String {
    "delete_flag".to_string()
}

fn default_string_length() -> u32 {
    255
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_from_str() {
        assert_eq!("laravel".parse::<Target>().unwrap(), Target::Laravel);
        assert_eq!("PostgreSQL".parse::<Target>().unwrap(), Target::Postgres);
        assert!("mysql".parse::<Target>().is_err());
    }

    #[test]
    fn test_primary_key_for_declared_table() {
        let schema = SchemaConfig::default();
        let cols = vec!["user_id".to_string(), "name".to_string()];
        assert_eq!(schema.primary_key_for("users", &cols), Some("user_id"));
        assert_eq!(schema.primary_key_for("unknown", &cols), None);
    }

    #[test]
    fn test_primary_key_first_column_fallback() {
        let schema = SchemaConfig {
            first_column_primary_key: true,
            ..SchemaConfig::default()
        };
        let cols = vec!["code".to_string(), "label".to_string()];
        assert_eq!(schema.primary_key_for("codes", &cols), Some("code"));
        // Junction tables keep their composite key only
        assert_eq!(schema.primary_key_for("knowledge_tags", &cols), None);
    }
}
