//! Column type resolution from column names and identifier verdicts.
//!
//! Rules are evaluated in a fixed order and the first match wins. A column
//! name often satisfies several heuristics at once (`status_id` is both a
//! reference and a status field), so ordering is the whole contract.
//! Completeness is guaranteed by the trailing default rule.

use crate::classify::IdClass;
use crate::config::ColumnConfig;
use crate::core::schema::{ColumnSpec, StorageType};

/// Which rule resolved a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuleKind {
    /// The table's expected primary key.
    PrimaryKey,
    /// Opaque hash field.
    Hash,
    /// `_id` / `_no` reference-like column.
    Reference,
    /// Audit user column.
    AuditUser,
    /// Timestamp column.
    Timestamp,
    /// Flag, status or counter.
    Numeric,
    /// Known long-text field.
    LongText,
    /// Binary payload (kept as text).
    Binary,
    /// Fallback.
    Default,
}

/// How a rule decides whether a column name matches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Matcher {
    /// Matches the table's expected primary-key column.
    PrimaryKey,
    /// Name equals one of these (ASCII case-insensitive).
    Exact(Vec<String>),
    /// Lowercased name ends with one of these.
    Suffix(Vec<String>),
    /// Lowercased name contains one of these.
    Contains(Vec<String>),
    /// Matches everything.
    Any,
}

impl Matcher {
    fn matches(&self, column: &str, lower: &str, primary_key: Option<&str>) -> bool {
        match self {
            Matcher::PrimaryKey => primary_key == Some(column),
            Matcher::Exact(names) => names.iter().any(|n| n.eq_ignore_ascii_case(column)),
            Matcher::Suffix(suffixes) => suffixes
                .iter()
                .any(|s| lower.ends_with(s.to_lowercase().as_str())),
            Matcher::Contains(markers) => markers
                .iter()
                .any(|m| lower.contains(m.to_lowercase().as_str())),
            Matcher::Any => true,
        }
    }
}

/// What a rule assigns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Fixed storage type and nullability.
    Fixed { storage_type: StorageType, nullable: bool },
    /// Primary key typed by the table's identifier verdict.
    Identifier,
}

/// One predicate → attributes rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnRule {
    pub kind: RuleKind,
    pub matcher: Matcher,
    pub outcome: Outcome,
}

/// Column attributes plus the rule that produced them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub column: ColumnSpec,
    pub rule: RuleKind,
}

/// Ordered rule set mapping column names to storage attributes.
#[derive(Debug, Clone)]
pub struct TypeResolver {
    rules: Vec<ColumnRule>,
    soft_delete_column: String,
    string_length: u32,
}

impl TypeResolver {
    /// Build the rule list from column heuristics.
    pub fn new(config: &ColumnConfig) -> Self {
        let string = StorageType::String {
            length: config.string_length,
        };
        let fixed = |storage_type, nullable| Outcome::Fixed {
            storage_type,
            nullable,
        };

        let rules = vec![
            ColumnRule {
                kind: RuleKind::PrimaryKey,
                matcher: Matcher::PrimaryKey,
                outcome: Outcome::Identifier,
            },
            ColumnRule {
                kind: RuleKind::Hash,
                matcher: Matcher::Exact(config.hash_columns.clone()),
                outcome: fixed(string, true),
            },
            // Dumps may hold orphaned or deferred references, so never NOT NULL
            ColumnRule {
                kind: RuleKind::Reference,
                matcher: Matcher::Suffix(config.reference_suffixes.clone()),
                outcome: fixed(StorageType::Integer, true),
            },
            ColumnRule {
                kind: RuleKind::AuditUser,
                matcher: Matcher::Exact(config.audit_user_columns.clone()),
                outcome: fixed(StorageType::Integer, false),
            },
            ColumnRule {
                kind: RuleKind::Timestamp,
                matcher: Matcher::Contains(config.timestamp_markers.clone()),
                outcome: fixed(StorageType::Timestamp, false),
            },
            ColumnRule {
                kind: RuleKind::Numeric,
                matcher: Matcher::Contains(config.numeric_markers.clone()),
                outcome: fixed(StorageType::Integer, true),
            },
            ColumnRule {
                kind: RuleKind::LongText,
                matcher: Matcher::Exact(config.long_text_columns.clone()),
                outcome: fixed(StorageType::Text, true),
            },
            // No dedicated binary type; payloads land in text
            ColumnRule {
                kind: RuleKind::Binary,
                matcher: Matcher::Contains(config.binary_markers.clone()),
                outcome: fixed(StorageType::Text, true),
            },
            ColumnRule {
                kind: RuleKind::Default,
                matcher: Matcher::Any,
                outcome: fixed(string, true),
            },
        ];

        Self {
            rules,
            soft_delete_column: config.soft_delete_column.clone(),
            string_length: config.string_length,
        }
    }

    /// The rules in evaluation order.
    pub fn rules(&self) -> &[ColumnRule] {
        &self.rules
    }

    /// Storage type of a primary key with the given verdict.
    pub fn identifier_type(&self, class: IdClass) -> StorageType {
        match class {
            IdClass::Numeric => StorageType::BigInteger,
            IdClass::ShortString => StorageType::String {
                length: self.string_length,
            },
            IdClass::LongString => StorageType::Text,
        }
    }

    /// Whether a lowercased name carries a reference suffix.
    fn is_reference(&self, lower: &str) -> bool {
        self.rules
            .iter()
            .filter(|r| r.kind == RuleKind::Reference)
            .any(|r| r.matcher.matches(lower, lower, None))
    }

    /// Resolve one column.
    ///
    /// `primary_key` is the table's expected key column, `id_class` the
    /// table's identifier verdict (numeric when unknown).
    pub fn resolve(&self, column: &str, primary_key: Option<&str>, id_class: IdClass) -> Resolution {
        let lower = column.to_lowercase();
        let rule = self
            .rules
            .iter()
            .find(|r| r.matcher.matches(column, &lower, primary_key))
            .unwrap_or(&self.rules[self.rules.len() - 1]);

        let (storage_type, nullable) = match rule.outcome {
            Outcome::Fixed {
                storage_type,
                nullable,
            } => (storage_type, nullable),
            Outcome::Identifier => (self.identifier_type(id_class), false),
        };
        let is_primary_key = rule.kind == RuleKind::PrimaryKey;
        // Indexing looks at the suffix itself, even when an earlier rule set the type
        let is_indexed = (self.is_reference(&lower) && !is_primary_key)
            || column == self.soft_delete_column;

        Resolution {
            column: ColumnSpec {
                name: column.to_string(),
                storage_type,
                nullable,
                is_primary_key,
                is_indexed,
            },
            rule: rule.kind,
        }
    }
}
