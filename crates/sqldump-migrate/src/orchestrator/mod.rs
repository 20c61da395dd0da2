//! Pipeline orchestrator - main workflow coordinator.
//!
//! Runs scan, classification, schema resolution and emission in sequence.
//! Outputs are written only once every stage has succeeded.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::artifact::{write_all_atomic, write_atomic, Artifact};
use crate::classify::{Classifications, IdentifierClassifier, SampleSet};
use crate::config::{Config, Target};
use crate::emitter::MigrationEmitter;
use crate::error::Result;
use crate::model::{SchemaBuilder, SchemaDocument};
use crate::scanner::{DiscoveredSchema, DumpScanner, ScanReport, ScanStats};

/// Pipeline orchestrator.
pub struct Orchestrator {
    config: Config,
    target: Target,
    document_out: Option<PathBuf>,
}

/// Result of a pipeline run.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    /// Final status.
    pub status: String,

    /// When the run started.
    pub started_at: DateTime<Utc>,

    /// Total duration in seconds.
    pub duration_seconds: f64,

    /// Migration language.
    pub target: Target,

    /// Migration file written.
    pub output: PathBuf,

    /// Schema document written, if requested.
    pub document: Option<PathBuf>,

    /// Tables in the migration.
    pub tables_total: usize,

    /// Columns across all tables.
    pub columns_total: usize,

    /// Secondary indexes across all tables.
    pub indexes_total: usize,

    /// Table creation order.
    pub emission_order: Vec<String>,

    /// Tables keyed by string identifiers.
    pub string_id_tables: Vec<String>,

    /// Tables with a composite primary key.
    pub composite_key_tables: Vec<String>,

    /// Scan counters, when the run read a dump.
    pub scan: Option<ScanStats>,
}

impl Orchestrator {
    /// Create a new orchestrator.
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let target = config.output.target;
        Ok(Self {
            config,
            target,
            document_out: None,
        })
    }

    /// Override the configured migration language.
    pub fn with_target(mut self, target: Target) -> Self {
        self.target = target;
        self
    }

    /// Also persist the schema document on success.
    pub fn with_document_out(mut self, path: PathBuf) -> Self {
        self.document_out = Some(path);
        self
    }

    /// Configuration in use.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Migration language in use.
    pub fn target(&self) -> Target {
        self.target
    }

    /// Scan a dump file.
    pub fn scan<P: AsRef<Path>>(&self, dump: P) -> Result<ScanReport> {
        DumpScanner::new(&self.config.scan).scan_file(dump)
    }

    /// Classify every sampled table.
    pub fn classify(&self, samples: &SampleSet) -> Classifications {
        IdentifierClassifier::new(&self.config.scan).classify_all(samples)
    }

    /// Resolve a frozen schema document.
    pub fn build(
        &self,
        discovered: &DiscoveredSchema,
        classifications: &Classifications,
    ) -> Result<SchemaDocument> {
        SchemaBuilder::new(&self.config).build(discovered, classifications)
    }

    /// Render the migration script for a document.
    pub fn emit(&self, doc: &SchemaDocument) -> Result<String> {
        MigrationEmitter::new(self.target).render(doc)
    }

    /// Full pipeline from a dump file to a migration file.
    pub fn run<P: AsRef<Path>, Q: AsRef<Path>>(&self, dump: P, output: Q) -> Result<RunSummary> {
        let started_at = Utc::now();
        info!("Phase 1: Scanning dump");
        let report = self.scan(dump)?;

        info!("Phase 2: Classifying identifiers");
        let verdicts = self.classify(&report.samples);

        self.finish(
            started_at,
            &report.discovered,
            &verdicts,
            Some(report.stats),
            output.as_ref(),
        )
    }

    /// Pipeline from persisted scan artifacts to a migration file.
    pub fn generate<Q: AsRef<Path>>(
        &self,
        discovered: &DiscoveredSchema,
        classifications: &Classifications,
        output: Q,
    ) -> Result<RunSummary> {
        self.finish(Utc::now(), discovered, classifications, None, output.as_ref())
    }

    fn finish(
        &self,
        started_at: DateTime<Utc>,
        discovered: &DiscoveredSchema,
        verdicts: &Classifications,
        scan: Option<ScanStats>,
        output: &Path,
    ) -> Result<RunSummary> {
        info!("Phase 3: Resolving column types");
        let doc = self.build(discovered, verdicts)?;

        info!("Phase 4: Emitting {} migration", self.target);
        let script = self.emit(&doc)?;

        // Nothing touches disk until every stage has succeeded
        match &self.document_out {
            Some(path) => {
                let json = doc.to_json()?;
                write_all_atomic(&[(path.as_path(), json.as_str()), (output, script.as_str())])?;
            }
            None => write_atomic(output, &script)?,
        }

        let completed_at = Utc::now();
        let duration = (completed_at - started_at).num_milliseconds() as f64 / 1000.0;

        let summary = RunSummary {
            status: "completed".to_string(),
            started_at,
            duration_seconds: duration,
            target: self.target,
            output: output.to_path_buf(),
            document: self.document_out.clone(),
            tables_total: doc.len(),
            columns_total: doc.tables().iter().map(|t| t.columns.len()).sum(),
            indexes_total: doc.tables().iter().map(|t| t.indexed_columns().count()).sum(),
            emission_order: doc.emission_order().to_vec(),
            string_id_tables: verdicts
                .string_id_tables()
                .filter(|(table, _)| doc.table(table).is_some())
                .map(|(table, _)| table.to_string())
                .collect(),
            composite_key_tables: doc
                .ordered_tables()
                .filter(|t| t.has_composite_pk())
                .map(|t| t.name.clone())
                .collect(),
            scan,
        };

        info!(
            "Migration {}: {} tables, {} columns, {} indexes in {:.1}s -> {}",
            summary.status,
            summary.tables_total,
            summary.columns_total,
            summary.indexes_total,
            summary.duration_seconds,
            summary.output.display()
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::IdClass;
    use crate::error::MigrateError;
    use tempfile::tempdir;

    fn dump() -> String {
        let long_hash = "f".repeat(120);
        [
            "-- dump header".to_string(),
            "INSERT INTO users (user_id, user_key, user_name, password, insert_user, insert_datetime, delete_flag) VALUES (1, 'admin', 'Admin', 'secret', 1, '2020-01-01 00:00:00', 0);".to_string(),
            "INSERT INTO users (user_id, user_name) VALUES (2, 'other');".to_string(),
            format!("INSERT INTO notify_queues (hash, type, id, insert_datetime) VALUES ('{}', 1, 2, '2020-01-01 00:00:00');", long_hash),
            "INSERT INTO comments (comment_no, knowledge_id, comment) VALUES (1, 1, 'hello');".to_string(),
            "INSERT INTO locales (locale_key, disp_name) VALUES ('ja', 'Japanese');".to_string(),
        ]
        .join("\n")
    }

    #[test]
    fn test_run_writes_migration() {
        let dir = tempdir().unwrap();
        let dump_path = dir.path().join("dump.sql");
        std::fs::write(&dump_path, dump()).unwrap();
        let output = dir.path().join("migration.php");
        let document = dir.path().join("document.json");

        let orchestrator = Orchestrator::new(Config::default())
            .unwrap()
            .with_document_out(document.clone());
        let summary = orchestrator.run(&dump_path, &output).unwrap();

        assert_eq!(summary.status, "completed");
        assert_eq!(summary.tables_total, 4);
        assert_eq!(
            summary.emission_order,
            vec!["users", "comments", "notify_queues", "locales"]
        );
        assert_eq!(summary.string_id_tables, vec!["locales", "notify_queues"]);
        assert!(summary.composite_key_tables.is_empty());
        let stats = summary.scan.unwrap();
        assert_eq!(stats.insert_lines, 5);

        let php = std::fs::read_to_string(&output).unwrap();
        assert!(php.contains("$table->bigIncrements('user_id');"));
        assert!(php.contains("$table->text('password')->nullable();"));
        assert!(php.contains("$table->integer('insert_user');"));
        assert!(php.contains("$table->text('hash')->primary();"));
        assert!(php.contains("$table->string('locale_key')->primary();"));

        // First statement wins: all seven users columns survive
        let doc = SchemaDocument::load(&document).unwrap();
        assert_eq!(doc.table("users").unwrap().columns.len(), 7);
    }

    #[test]
    fn test_run_postgres_target() {
        let dir = tempdir().unwrap();
        let dump_path = dir.path().join("dump.sql");
        std::fs::write(&dump_path, dump()).unwrap();
        let output = dir.path().join("migration.sql");

        let summary = Orchestrator::new(Config::default())
            .unwrap()
            .with_target(Target::Postgres)
            .run(&dump_path, &output)
            .unwrap();
        assert_eq!(summary.target, Target::Postgres);

        let sql = std::fs::read_to_string(&output).unwrap();
        assert!(sql.contains("\"hash\" text PRIMARY KEY"));
        assert!(sql.contains("CREATE INDEX \"comments_knowledge_id_index\""));
    }

    #[test]
    fn test_missing_dump_writes_nothing() {
        let dir = tempdir().unwrap();
        let output = dir.path().join("migration.php");
        let document = dir.path().join("document.json");

        let err = Orchestrator::new(Config::default())
            .unwrap()
            .with_document_out(document.clone())
            .run(dir.path().join("absent.sql"), &output)
            .unwrap_err();

        assert!(matches!(err, MigrateError::MissingSource { .. }));
        assert!(!output.exists());
        assert!(!document.exists());
    }

    #[test]
    fn test_failed_output_write_leaves_no_document() {
        let dir = tempdir().unwrap();
        let dump_path = dir.path().join("dump.sql");
        std::fs::write(&dump_path, dump()).unwrap();
        let output = dir.path().join("missing_dir").join("migration.php");
        let document = dir.path().join("document.json");

        let err = Orchestrator::new(Config::default())
            .unwrap()
            .with_document_out(document.clone())
            .run(&dump_path, &output)
            .unwrap_err();

        assert!(matches!(err, MigrateError::Io(_)));
        assert_eq!(err.exit_code(), 7);
        assert!(!output.exists());
        assert!(!document.exists());
    }

    #[test]
    fn test_generate_from_artifacts() {
        let dir = tempdir().unwrap();
        let output = dir.path().join("migration.php");

        let mut discovered = DiscoveredSchema::new();
        discovered.insert("knowledge_tags", vec!["knowledge_id".into(), "tag_id".into()]);
        discovered.insert("tags", vec!["tag_id".into(), "tag_name".into()]);
        let mut verdicts = Classifications::new();
        verdicts.insert("ghost", IdClass::ShortString);

        let summary = Orchestrator::new(Config::default())
            .unwrap()
            .generate(&discovered, &verdicts, &output)
            .unwrap();

        assert!(summary.scan.is_none());
        assert_eq!(summary.emission_order, vec!["tags", "knowledge_tags"]);
        assert_eq!(summary.composite_key_tables, vec!["knowledge_tags"]);
        // Verdicts for tables absent from the schema are ignored
        assert!(summary.string_id_tables.is_empty());
        assert_eq!(summary.indexes_total, 2);
        assert!(output.exists());
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let mut config = Config::default();
        config.scan.max_samples = 0;
        assert!(matches!(
            Orchestrator::new(config),
            Err(MigrateError::Config(_))
        ));
    }
}
