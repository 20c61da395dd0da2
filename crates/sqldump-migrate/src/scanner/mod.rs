//! Streaming scanner for `INSERT INTO` dumps.
//!
//! The dump is read once, line by line. Each qualifying line yields a
//! discovery tuple (table, column list) and, when a `VALUES` list follows,
//! the literal text of its first value for identifier sampling. Memory use is
//! bounded by the number of tables, never by the size of the dump.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::{debug, info};

use crate::classify::SampleSet;
use crate::config::ScanConfig;
use crate::error::{MigrateError, Result};

/// `INSERT INTO [schema.]table (cols) [VALUES (rest...]`, identifiers optionally double-quoted.
static INSERT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?i)^INSERT\s+INTO\s+(?:"?\w+"?\.)?"?(\w+)"?\s*\(([^)]+)\)(?:\s*VALUES\s*\((.*))?"#,
    )
    .expect("insert pattern is valid")
});

/// Lines starting like this are counted as malformed when the pattern fails.
static INSERT_PREFIX_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\s*INSERT\s+INTO\b").expect("prefix pattern is valid"));

/// A line that matched the insert pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsertLine<'a> {
    /// Unqualified, unquoted table name.
    pub table: &'a str,
    /// Unquoted column names in statement order.
    pub columns: Vec<String>,
    /// Literal text of the first value, quotes included.
    pub first_value: Option<&'a str>,
}

/// Result of parsing one dump line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineOutcome<'a> {
    /// A usable insert statement.
    Insert(InsertLine<'a>),
    /// Looks like an insert but does not match; skipped.
    Malformed,
    /// Anything else (DDL, comments, COPY data, blank lines).
    Other,
}

/// Parse a single dump line.
pub fn parse_line(line: &str) -> LineOutcome<'_> {
    let Some(caps) = INSERT_RE.captures(line) else {
        return if INSERT_PREFIX_RE.is_match(line) {
            LineOutcome::Malformed
        } else {
            LineOutcome::Other
        };
    };

    let (Some(table), Some(column_list)) = (caps.get(1), caps.get(2)) else {
        return LineOutcome::Malformed;
    };

    let mut columns = Vec::new();
    for raw in column_list.as_str().split(',') {
        let name = raw.trim().trim_matches('"');
        if name.is_empty() {
            return LineOutcome::Malformed;
        }
        columns.push(name.to_string());
    }

    let first_value = caps.get(3).and_then(|m| first_value(m.as_str()));

    LineOutcome::Insert(InsertLine {
        table: table.as_str(),
        columns,
        first_value,
    })
}

/// Extract the literal text of the first entry of a `VALUES` list.
///
/// `values` starts just after the opening parenthesis. Quoted literals may
/// contain commas, parentheses and doubled quotes. Returns `None` for an
/// unterminated literal or a list that is never closed.
pub fn first_value(values: &str) -> Option<&str> {
    let s = values.trim_start();

    if s.starts_with('\'') {
        let bytes = s.as_bytes();
        let mut i = 1;
        loop {
            match bytes.get(i) {
                None => return None,
                Some(b'\'') if bytes.get(i + 1) == Some(&b'\'') => i += 2,
                Some(b'\'') => {
                    let end = i + 1;
                    let rest = s[end..].trim_start();
                    let terminated = rest.starts_with(',') || rest.starts_with(')');
                    return (terminated && rest.contains(')')).then(|| &s[..end]);
                }
                Some(_) => i += 1,
            }
        }
    }

    let end = s.find([',', ')'])?;
    if !s[end..].contains(')') {
        return None;
    }
    let literal = s[..end].trim();
    (!literal.is_empty()).then_some(literal)
}

/// Unquoted content of a string-valued identifier literal.
///
/// Only single-quoted literals whose content is not entirely decimal digits
/// count; `'42'` and `42` are numeric.
pub fn string_identifier(literal: &str) -> Option<String> {
    let inner = literal.strip_prefix('\'')?.strip_suffix('\'')?;
    let content = inner.replace("''", "'");
    if !content.is_empty() && content.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    Some(content)
}

/// Table discovered in the dump.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredTable {
    /// Table name.
    pub name: String,
    /// Columns of the table's first insert statement.
    pub columns: Vec<String>,
}

/// Ordered mapping from table name to its first-seen column list.
#[derive(Debug, Clone, Default)]
pub struct DiscoveredSchema {
    tables: Vec<DiscoveredTable>,
    index: HashMap<String, usize>,
}

impl PartialEq for DiscoveredSchema {
    fn eq(&self, other: &Self) -> bool {
        self.tables == other.tables
    }
}

impl Eq for DiscoveredSchema {}

impl DiscoveredSchema {
    /// Create an empty schema.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a table. Only the first occurrence of a name is kept.
    pub fn insert(&mut self, name: &str, columns: Vec<String>) -> bool {
        if self.index.contains_key(name) {
            return false;
        }
        self.index.insert(name.to_string(), self.tables.len());
        self.tables.push(DiscoveredTable {
            name: name.to_string(),
            columns,
        });
        true
    }

    /// Check if a table was discovered.
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Columns of a table.
    pub fn columns(&self, name: &str) -> Option<&[String]> {
        self.index
            .get(name)
            .map(|&i| self.tables[i].columns.as_slice())
    }

    /// Tables in discovery order.
    pub fn tables(&self) -> &[DiscoveredTable] {
        &self.tables
    }

    /// Number of tables.
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    /// Check if no table was discovered.
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

/// Counters collected during a scan.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScanStats {
    /// Lines read.
    pub lines: u64,
    /// Lines that matched the insert pattern.
    pub insert_lines: u64,
    /// Insert-like lines that did not match and were skipped.
    pub malformed_lines: u64,
    /// String identifier values retained as samples.
    pub sampled_values: u64,
}

/// Everything a single pass over a dump produces.
#[derive(Debug, Clone)]
pub struct ScanReport {
    /// Tables and their column order.
    pub discovered: DiscoveredSchema,
    /// String identifier samples per table.
    pub samples: SampleSet,
    /// Counters.
    pub stats: ScanStats,
}

/// Line-by-line dump scanner.
#[derive(Debug, Clone)]
pub struct DumpScanner {
    max_samples: usize,
}

impl DumpScanner {
    /// Create a scanner from scan configuration.
    pub fn new(config: &ScanConfig) -> Self {
        Self {
            max_samples: config.max_samples,
        }
    }

    /// Scan a dump file.
    ///
    /// The file handle lives only for the duration of the scan.
    pub fn scan_file<P: AsRef<Path>>(&self, path: P) -> Result<ScanReport> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| MigrateError::missing_source(path, e))?;
        info!("Scanning dump {}", path.display());
        self.scan_reader(BufReader::with_capacity(256 * 1024, file))
            .map_err(|e| match e {
                MigrateError::Io(source) => MigrateError::missing_source(path, source),
                other => other,
            })
    }

    /// Scan any buffered reader.
    ///
    /// Lines are decoded lossily; invalid UTF-8 never aborts a scan.
    pub fn scan_reader<R: BufRead>(&self, mut reader: R) -> Result<ScanReport> {
        let mut report = ScanReport {
            discovered: DiscoveredSchema::new(),
            samples: SampleSet::new(self.max_samples),
            stats: ScanStats::default(),
        };
        let mut buf = Vec::with_capacity(4096);

        loop {
            buf.clear();
            if reader.read_until(b'\n', &mut buf)? == 0 {
                break;
            }
            report.stats.lines += 1;
            let line = String::from_utf8_lossy(&buf);
            self.process_line(&line, &mut report);
        }

        info!(
            "Scan complete: {} lines, {} inserts, {} tables, {} malformed",
            report.stats.lines,
            report.stats.insert_lines,
            report.discovered.len(),
            report.stats.malformed_lines
        );
        Ok(report)
    }

    fn process_line(&self, line: &str, report: &mut ScanReport) {
        match parse_line(line) {
            LineOutcome::Other => {}
            LineOutcome::Malformed => {
                report.stats.malformed_lines += 1;
                debug!(
                    "Skipping malformed insert at line {}",
                    report.stats.lines
                );
            }
            LineOutcome::Insert(insert) => {
                report.stats.insert_lines += 1;

                if !report.discovered.contains(insert.table) {
                    debug!(
                        "Found table: {} with {} columns",
                        insert.table,
                        insert.columns.len()
                    );
                    report.discovered.insert(insert.table, insert.columns);
                }

                if let Some(value) = insert.first_value.and_then(string_identifier) {
                    if report.samples.record(insert.table, &value) {
                        report.stats.sampled_values += 1;
                    }
                }
            }
        }
    }
}
