//! Configuration loading and validation.

mod types;
mod validation;

pub use types::*;

use crate::error::{MigrateError, Result};
use sha2::{Digest, Sha256};
use std::path::Path;

impl Config {
    /// Load configuration from a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| MigrateError::missing_source(path, e))?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from a YAML string.
    ///
    /// Omitted sections and fields fall back to the built-in profile.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        validation::validate(self)
    }

    /// Compute a SHA256 hash of the configuration.
    ///
    /// Maps are ordered, so equal configurations always hash equally.
    pub fn hash(&self) -> Result<String> {
        let yaml = serde_yaml::to_string(self)?;
        let mut hasher = Sha256::new();
        hasher.update(yaml.as_bytes());
        Ok(format!("{:x}", hasher.finalize()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_empty_mapping_uses_defaults() {
        let config = Config::from_yaml("{}").unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_partial_override() {
        let yaml = r#"
scan:
  long_string_threshold: 64
schema:
  priority_tables: [accounts]
output:
  target: postgres
"#;
        let config = Config::from_yaml(yaml).unwrap();
        assert_eq!(config.scan.long_string_threshold, 64);
        assert_eq!(config.scan.max_samples, 5);
        assert_eq!(config.schema.priority_tables, vec!["accounts".to_string()]);
        // Untouched maps keep the built-in profile
        assert_eq!(
            config.schema.primary_keys.get("users").map(String::as_str),
            Some("user_id")
        );
        assert_eq!(config.output.target, Target::Postgres);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let err = Config::from_yaml("scan:\n  max_samples: 0\n").unwrap_err();
        assert!(matches!(err, MigrateError::Config(_)));
    }

    #[test]
    fn test_invalid_yaml() {
        let err = Config::from_yaml("scan: [").unwrap_err();
        assert!(matches!(err, MigrateError::Yaml(_)));
    }

    #[test]
    fn test_load_missing_file() {
        let err = Config::load("definitely_missing_heuristics.yaml").unwrap_err();
        assert!(matches!(err, MigrateError::MissingSource { .. }));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "columns:\n  string_length: 191").unwrap();
        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.columns.string_length, 191);
    }

    #[test]
    fn test_hash_is_stable_and_sensitive() {
        let a = Config::default();
        let mut b = Config::default();
        assert_eq!(a.hash().unwrap(), b.hash().unwrap());
        assert_eq!(a.hash().unwrap().len(), 64);

        b.columns.string_length = 191;
        assert_ne!(a.hash().unwrap(), b.hash().unwrap());
    }
}
