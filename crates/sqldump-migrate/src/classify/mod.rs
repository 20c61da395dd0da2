//! Identifier classification from sampled primary-key values.
//!
//! The scanner keeps, per table, the first few string-valued first-column
//! values it sees. From those samples each table gets a verdict: numeric
//! keys, short string keys, or long (hash/token shaped) string keys.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use tracing::debug;

use crate::config::ScanConfig;

/// Bounded, first-seen sample of string identifier values for one table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentifierSample {
    /// Table the values were observed in.
    pub table_name: String,

    /// Distinct values in first-seen order.
    pub values: Vec<String>,

    /// Capacity; values beyond it are ignored.
    pub max_samples: usize,
}

impl IdentifierSample {
    /// Create an empty sample.
    pub fn new(table_name: impl Into<String>, max_samples: usize) -> Self {
        Self {
            table_name: table_name.into(),
            values: Vec::new(),
            max_samples,
        }
    }

    /// Record a value. Returns false when full or already present.
    pub fn record(&mut self, value: &str) -> bool {
        if self.is_full() || self.values.iter().any(|v| v == value) {
            return false;
        }
        self.values.push(value.to_string());
        true
    }

    /// Check if the sample reached its capacity.
    pub fn is_full(&self) -> bool {
        self.values.len() >= self.max_samples
    }

    /// Length in characters of the longest retained value.
    pub fn longest(&self) -> Option<usize> {
        self.values.iter().map(|v| v.chars().count()).max()
    }
}

/// Samples for every table that produced at least one string identifier.
#[derive(Debug, Clone, Default)]
pub struct SampleSet {
    samples: HashMap<String, IdentifierSample>,
    max_samples: usize,
}

impl SampleSet {
    /// Create an empty set keeping at most `max_samples` values per table.
    pub fn new(max_samples: usize) -> Self {
        Self {
            samples: HashMap::new(),
            max_samples,
        }
    }

    /// Record a string identifier value for a table.
    pub fn record(&mut self, table: &str, value: &str) -> bool {
        let max = self.max_samples;
        let sample = self
            .samples
            .entry(table.to_string())
            .or_insert_with(|| IdentifierSample::new(table, max));
        let added = sample.record(value);
        if added && sample.values.len() == 1 {
            debug!("Found string identifier table: {} (example: {})", table, value);
        }
        added
    }

    /// Samples for a table.
    pub fn get(&self, table: &str) -> Option<&IdentifierSample> {
        self.samples.get(table)
    }

    /// Number of tables with samples.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Check if no table produced a sample.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Iterate over all samples (unordered).
    pub fn iter(&self) -> impl Iterator<Item = &IdentifierSample> {
        self.samples.values()
    }
}

/// Verdict on a table's primary-key values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum IdClass {
    /// Integer keys (also the verdict when nothing was sampled).
    #[default]
    Numeric,
    /// String keys up to the length threshold.
    ShortString,
    /// String keys longer than the threshold.
    LongString,
}

impl fmt::Display for IdClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdClass::Numeric => write!(f, "numeric"),
            IdClass::ShortString => write!(f, "short_string"),
            IdClass::LongString => write!(f, "long_string"),
        }
    }
}

/// Classify a single table's sample.
///
/// Uses the longest retained value, so a later long sample wins over a short first one.
pub fn classify(sample: Option<&IdentifierSample>, long_string_threshold: usize) -> IdClass {
    match sample.and_then(IdentifierSample::longest) {
        None => IdClass::Numeric,
        Some(len) if len > long_string_threshold => IdClass::LongString,
        Some(_) => IdClass::ShortString,
    }
}

/// Per-table identifier verdicts. Tables without an entry are numeric.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Classifications(BTreeMap<String, IdClass>);

impl Classifications {
    /// Create an empty set of verdicts.
    pub fn new() -> Self {
        Self::default()
    }

    /// Verdict for a table.
    pub fn get(&self, table: &str) -> IdClass {
        self.0.get(table).copied().unwrap_or_default()
    }

    /// Set the verdict for a table.
    pub fn insert(&mut self, table: impl Into<String>, class: IdClass) {
        self.0.insert(table.into(), class);
    }

    /// Tables whose keys are strings, in name order.
    pub fn string_id_tables(&self) -> impl Iterator<Item = (&str, IdClass)> {
        self.0
            .iter()
            .filter(|(_, c)| **c != IdClass::Numeric)
            .map(|(t, c)| (t.as_str(), *c))
    }

    /// Number of tables with an explicit verdict.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if there are no explicit verdicts.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Turns sample sets into verdicts.
#[derive(Debug, Clone)]
pub struct IdentifierClassifier {
    long_string_threshold: usize,
}

impl IdentifierClassifier {
    /// Create a classifier from scan configuration.
    pub fn new(config: &ScanConfig) -> Self {
        Self {
            long_string_threshold: config.long_string_threshold,
        }
    }

    /// Classify one table.
    pub fn classify(&self, sample: Option<&IdentifierSample>) -> IdClass {
        classify(sample, self.long_string_threshold)
    }

    /// Classify every sampled table.
    pub fn classify_all(&self, samples: &SampleSet) -> Classifications {
        let mut verdicts = Classifications::new();
        for sample in samples.iter() {
            let class = self.classify(Some(sample));
            debug!(
                "Identifier verdict for {}: {} ({} samples)",
                sample.table_name,
                class,
                sample.values.len()
            );
            verdicts.insert(sample.table_name.clone(), class);
        }
        verdicts
    }
}
