//! Error types for schema inference and migration generation.

use std::path::PathBuf;
use thiserror::Error;

/// Exit code for configuration problems (bad YAML, invalid heuristics, bad arguments).
pub const EXIT_CONFIG_ERROR: u8 = 1;

/// Exit code for interchange artifacts that parse but violate schema invariants.
pub const EXIT_SCHEMA_ERROR: u8 = 3;

/// Exit code for missing or unreadable inputs and failed writes.
pub const EXIT_IO_ERROR: u8 = 7;

/// Main error type for inference and emission.
///
/// Only fatal conditions are represented here. Malformed dump lines, tables
/// without identifier samples and columns matching no heuristic are recovered
/// locally and never surface as errors.
#[derive(Error, Debug)]
pub enum MigrateError {
    /// Configuration error (invalid YAML values, conflicting heuristics, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// A required input (dump file, schema artifact) is absent or unreadable.
    #[error("Cannot read {}: {source}", path.display())]
    MissingSource {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A loaded artifact is well-formed but inconsistent.
    #[error("Invalid schema: {0}")]
    Schema(String),

    /// Identifier cannot be emitted safely.
    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),

    /// Document was resolved under a different heuristic configuration.
    #[error("Schema document was built with a different configuration. Re-run generate or use --force.")]
    ConfigChanged,

    /// IO error (file operations)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML serialization/deserialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl MigrateError {
    /// Create a MissingSource error for the given path.
    pub fn missing_source(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        MigrateError::MissingSource {
            path: path.into(),
            source,
        }
    }

    /// Process exit code for this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            MigrateError::Config(_)
            | MigrateError::Yaml(_)
            | MigrateError::ConfigChanged
            | MigrateError::InvalidIdentifier(_) => EXIT_CONFIG_ERROR,
            MigrateError::Schema(_) | MigrateError::Json(_) => EXIT_SCHEMA_ERROR,
            MigrateError::MissingSource { .. } | MigrateError::Io(_) => EXIT_IO_ERROR,
        }
    }

    /// Format error with full details including error chain
    pub fn format_detailed(&self) -> String {
        let mut output = format!("Error: {}\n", self);

        let mut source = std::error::Error::source(self);
        let mut depth = 1;
        while let Some(err) = source {
            output.push_str(&format!("\nCaused by:\n  {}: {}", depth, err));
            source = err.source();
            depth += 1;
        }

        output
    }
}

/// Result type alias for inference operations.
pub type Result<T> = std::result::Result<T, MigrateError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_exit_codes() {
        assert_eq!(MigrateError::Config("x".into()).exit_code(), EXIT_CONFIG_ERROR);
        assert_eq!(MigrateError::ConfigChanged.exit_code(), EXIT_CONFIG_ERROR);
        assert_eq!(MigrateError::Schema("x".into()).exit_code(), EXIT_SCHEMA_ERROR);
        let missing = MigrateError::missing_source(
            "dump.sql",
            io::Error::new(io::ErrorKind::NotFound, "gone"),
        );
        assert_eq!(missing.exit_code(), EXIT_IO_ERROR);
    }

    #[test]
    fn test_format_detailed_includes_cause() {
        let err = MigrateError::missing_source(
            "dump.sql",
            io::Error::new(io::ErrorKind::NotFound, "no such file"),
        );
        let detailed = err.format_detailed();
        assert!(detailed.starts_with("Error: Cannot read dump.sql"));
        assert!(detailed.contains("Caused by:\n  1: no such file"));
    }
}
