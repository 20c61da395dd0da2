//! sqldump-migrate CLI - Schema inference and migration generation from SQL dumps.

use clap::{Parser, Subcommand};
use serde_json::json;
use sqldump_migrate::artifact::{write_all_atomic, write_atomic, Artifact};
use sqldump_migrate::report::render_markdown;
use sqldump_migrate::{
    Classifications, Config, DiscoveredSchema, MigrateError, Orchestrator, SchemaDocument, Target,
};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{info, Level};

#[derive(Parser)]
#[command(name = "sqldump-migrate")]
#[command(about = "Infer a schema from SQL INSERT dumps and generate migrations")]
#[command(version)]
struct Cli {
    /// Path to YAML heuristics configuration (built-in profile when omitted)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output JSON result to stdout
    #[arg(long)]
    output_json: bool,

    /// Log format: text or json
    #[arg(long, default_value = "text")]
    log_format: String,

    /// Log verbosity: debug, info, warn, error
    #[arg(long, default_value = "info")]
    verbosity: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan a dump and save the discovered schema and identifier verdicts
    Scan {
        /// SQL dump to scan
        #[arg(long)]
        dump: PathBuf,

        /// Write the table -> columns mapping here
        #[arg(long)]
        schema_out: Option<PathBuf>,

        /// Write per-table identifier classifications here
        #[arg(long)]
        identifiers_out: Option<PathBuf>,
    },

    /// Generate a migration from a saved schema mapping
    Generate {
        /// Table -> columns mapping produced by `scan`
        #[arg(long)]
        schema: PathBuf,

        /// Identifier classifications produced by `scan`
        #[arg(long)]
        identifiers: Option<PathBuf>,

        /// Migration file, or a directory for a timestamped file name
        #[arg(short, long)]
        output: PathBuf,

        /// Migration language: laravel or postgres
        #[arg(long)]
        target: Option<String>,

        /// Also save the resolved schema document here
        #[arg(long)]
        document_out: Option<PathBuf>,
    },

    /// Scan a dump and generate a migration in one pass
    Run {
        /// SQL dump to scan
        #[arg(long)]
        dump: PathBuf,

        /// Migration file, or a directory for a timestamped file name
        #[arg(short, long)]
        output: PathBuf,

        /// Migration language: laravel or postgres
        #[arg(long)]
        target: Option<String>,

        /// Also save the resolved schema document here
        #[arg(long)]
        document_out: Option<PathBuf>,
    },

    /// Emit a migration from a saved schema document
    Emit {
        /// Schema document produced by `run` or `generate`
        #[arg(long)]
        document: PathBuf,

        /// Migration file, or a directory for a timestamped file name
        #[arg(short, long)]
        output: PathBuf,

        /// Migration language: laravel or postgres
        #[arg(long)]
        target: Option<String>,

        /// Emit even if the document was resolved under a different configuration
        #[arg(long, short)]
        force: bool,
    },

    /// Print a markdown description of the inferred schema
    Describe {
        /// Table -> columns mapping produced by `scan`
        #[arg(long)]
        schema: PathBuf,

        /// Identifier classifications produced by `scan`
        #[arg(long)]
        identifiers: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e.format_detailed());
            ExitCode::from(e.exit_code())
        }
    }
}

fn run() -> Result<(), MigrateError> {
    let cli = Cli::parse();

    setup_logging(&cli.verbosity, &cli.log_format).map_err(MigrateError::Config)?;

    let config = match &cli.config {
        Some(path) => {
            let config = Config::load(path)?;
            info!("Loaded configuration from {:?}", path);
            config
        }
        None => Config::default(),
    };

    match cli.command {
        Commands::Scan {
            dump,
            schema_out,
            identifiers_out,
        } => {
            let orchestrator = Orchestrator::new(config)?;
            let report = orchestrator.scan(&dump)?;
            let verdicts = orchestrator.classify(&report.samples);

            let schema_json = report.discovered.to_json()?;
            let identifiers_json = verdicts.to_json()?;
            let mut outputs: Vec<(&Path, &str)> = Vec::new();
            if let Some(path) = &schema_out {
                outputs.push((path.as_path(), schema_json.as_str()));
            }
            if let Some(path) = &identifiers_out {
                outputs.push((path.as_path(), identifiers_json.as_str()));
            }
            write_all_atomic(&outputs)?;
            for (path, _) in &outputs {
                info!("Saved {:?}", path);
            }

            let string_ids: Vec<_> = verdicts
                .string_id_tables()
                .map(|(table, class)| json!({ "table": table, "class": class }))
                .collect();

            if cli.output_json {
                let result = json!({
                    "stats": report.stats,
                    "tables": report.discovered,
                    "string_id_tables": string_ids,
                });
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                println!(
                    "Discovered {} tables in {} lines ({} inserts, {} malformed)",
                    report.discovered.len(),
                    report.stats.lines,
                    report.stats.insert_lines,
                    report.stats.malformed_lines
                );
                for (table, class) in verdicts.string_id_tables() {
                    println!("  {}: {}", table, class);
                }
            }
        }

        Commands::Generate {
            schema,
            identifiers,
            output,
            target,
            document_out,
        } => {
            let discovered = DiscoveredSchema::load(&schema)?;
            let verdicts = load_identifiers(identifiers.as_deref())?;

            let orchestrator = configure(config, target.as_deref(), document_out)?;
            let output = resolve_output(&output, orchestrator.target());
            let summary = orchestrator.generate(&discovered, &verdicts, &output)?;
            print_summary(&summary, cli.output_json)?;
        }

        Commands::Run {
            dump,
            output,
            target,
            document_out,
        } => {
            let orchestrator = configure(config, target.as_deref(), document_out)?;
            let output = resolve_output(&output, orchestrator.target());
            let summary = orchestrator.run(&dump, &output)?;
            print_summary(&summary, cli.output_json)?;
        }

        Commands::Emit {
            document,
            output,
            target,
            force,
        } => {
            let doc = SchemaDocument::load(&document)?;
            let config_hash = config.hash()?;
            if force {
                if doc.validate_config(&config_hash).is_err() {
                    info!("Document was resolved under a different configuration, emitting anyway");
                }
            } else {
                doc.validate_config(&config_hash)?;
            }

            let orchestrator = configure(config, target.as_deref(), None)?;
            let output = resolve_output(&output, orchestrator.target());
            let script = orchestrator.emit(&doc)?;
            write_atomic(&output, &script)?;

            if cli.output_json {
                let result = json!({
                    "status": "completed",
                    "target": orchestrator.target(),
                    "output": output,
                    "tables_total": doc.len(),
                    "emission_order": doc.emission_order(),
                });
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                println!("Wrote {} ({} tables)", output.display(), doc.len());
            }
        }

        Commands::Describe {
            schema,
            identifiers,
        } => {
            let discovered = DiscoveredSchema::load(&schema)?;
            let verdicts = load_identifiers(identifiers.as_deref())?;
            let orchestrator = Orchestrator::new(config)?;
            let doc = orchestrator.build(&discovered, &verdicts)?;

            if cli.output_json {
                println!("{}", serde_json::to_string_pretty(&doc)?);
            } else {
                print!("{}", render_markdown(&doc));
            }
        }
    }

    Ok(())
}

/// Build an orchestrator with CLI overrides applied.
fn configure(
    config: Config,
    target: Option<&str>,
    document_out: Option<PathBuf>,
) -> Result<Orchestrator, MigrateError> {
    let mut orchestrator = Orchestrator::new(config)?;
    if let Some(target) = target {
        orchestrator = orchestrator.with_target(target.parse::<Target>()?);
    }
    if let Some(path) = document_out {
        orchestrator = orchestrator.with_document_out(path);
    }
    Ok(orchestrator)
}

fn load_identifiers(path: Option<&Path>) -> Result<Classifications, MigrateError> {
    match path {
        Some(path) => Classifications::load(path),
        None => Ok(Classifications::new()),
    }
}

/// Use `output` as-is, or pick a timestamped migration file name inside it.
fn resolve_output(output: &Path, target: Target) -> PathBuf {
    if output.is_dir() {
        let stamp = chrono::Local::now().format("%Y_%m_%d_%H%M%S");
        output.join(format!(
            "{}_create_inferred_schema.{}",
            stamp,
            target.extension()
        ))
    } else {
        output.to_path_buf()
    }
}

fn print_summary(
    summary: &sqldump_migrate::RunSummary,
    output_json: bool,
) -> Result<(), MigrateError> {
    if output_json {
        println!("{}", serde_json::to_string_pretty(summary)?);
    } else {
        println!(
            "Wrote {} ({} tables, {} indexes)",
            summary.output.display(),
            summary.tables_total,
            summary.indexes_total
        );
    }
    Ok(())
}

fn setup_logging(verbosity: &str, format: &str) -> Result<(), String> {
    let level = match verbosity.to_lowercase().as_str() {
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        other => return Err(format!("unknown verbosity '{}'", other)),
    };

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false);

    match format {
        "json" => subscriber.json().init(),
        "text" => subscriber.init(),
        other => return Err(format!("unknown log format '{}'", other)),
    }

    Ok(())
}
