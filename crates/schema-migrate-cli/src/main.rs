//! schema-migrate CLI - schema snapshot diffing and migration planning.

use clap::{Parser, Subcommand};
use schema_migrate::lint::ForeignKeyCycleRule;
use schema_migrate::{
    Config, DatabaseSnapshot, DialectCatalog, GenericSqlGenerator, JsonSchemaReader, Linter,
    MigrationOperation, ObjectKind, OperationSorter, SchemaDiffer, SchemaError, SnapshotLoader,
    SqlGenerator,
};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, Level};
use tracing_subscriber::fmt::format::FmtSpan;

#[cfg(unix)]
use tokio::signal::unix::{signal, SignalKind};

#[derive(Parser)]
#[command(name = "schema-migrate")]
#[command(about = "Schema snapshot diffing and migration planning")]
#[command(version)]
struct Cli {
    /// Path to YAML configuration file
    #[arg(short, long, default_value = "config.yaml")]
    config: PathBuf,

    /// Output JSON to stdout where the command supports it
    #[arg(long)]
    output_json: bool,

    /// Log format: text or json
    #[arg(long, default_value = "text")]
    log_format: String,

    /// Log verbosity: debug, info, warn, error (default: config file, then info)
    #[arg(long)]
    verbosity: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Verify the configuration parses and both snapshots load
    HealthCheck,

    /// Run lint rules against a snapshot
    Lint {
        /// Lint the target (desired) snapshot instead of the source
        #[arg(long)]
        target: bool,
    },

    /// Summarize a snapshot: object counts, fingerprint, table order
    Report {
        /// Report on the target (desired) snapshot instead of the source
        #[arg(long)]
        target: bool,
    },

    /// Diff the source snapshot against the target and print the plan
    Diff {
        /// Render the plan as DDL for the configured dialect
        #[arg(long)]
        sql: bool,

        /// Permit destructive operations (drops, renames, raw SQL) in the plan
        #[arg(long)]
        allow_destructive: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e.format_detailed());
            ExitCode::from(e.exit_code())
        }
    }
}

async fn run() -> Result<(), SchemaError> {
    let cli = Cli::parse();

    let config = Config::load(&cli.config)?;

    let verbosity = cli
        .verbosity
        .clone()
        .or_else(|| config.migration.verbosity.clone())
        .unwrap_or_else(|| "info".to_string());
    setup_logging(&verbosity, &cli.log_format).map_err(SchemaError::Config)?;
    info!("Loaded configuration from {:?}", cli.config);

    let cancel_token = setup_signal_handler();

    match cli.command {
        Commands::HealthCheck => {
            let catalog = DialectCatalog::with_builtins();
            let dialect = catalog.require(&config.migration.dialect)?;

            let source = load_snapshot(&config.source.path, &cancel_token).await?;
            let target = load_snapshot(&config.target.path, &cancel_token).await?;

            if cli.output_json {
                let result = serde_json::json!({
                    "healthy": true,
                    "dialect": dialect.name(),
                    "source_objects": source.object_count(),
                    "target_objects": target.object_count(),
                });
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                println!("Health Check Results:");
                println!("  Dialect: {}", dialect.name());
                println!("  Source snapshot: OK ({} objects)", source.object_count());
                println!("  Target snapshot: OK ({} objects)", target.object_count());
                println!("\n  Overall: HEALTHY");
            }
        }

        Commands::Lint { target } => {
            let path = side_path(&config, target);
            let snapshot = load_snapshot(path, &cancel_token).await?;
            let findings = Linter::with_default_rules().lint(&snapshot)?;

            if cli.output_json {
                let result: Vec<_> = findings
                    .iter()
                    .map(|f| serde_json::json!({ "rule": f.rule, "message": f.message }))
                    .collect();
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else if findings.is_empty() {
                println!("No lint findings");
            } else {
                for finding in &findings {
                    println!("  [{}] {}", finding.rule, finding.message);
                }
            }
        }

        Commands::Report { target } => {
            let path = side_path(&config, target);
            let content = std::fs::read_to_string(path)?;
            let fingerprint = schema_migrate::config::snapshot_fingerprint(&content);
            let snapshot = DatabaseSnapshot::from_json(&content)?;
            let table_order = ForeignKeyCycleRule::table_order(&snapshot)?;

            if cli.output_json {
                let result = serde_json::json!({
                    "fingerprint": fingerprint,
                    "tables": snapshot.tables.len(),
                    "views": snapshot.views.len(),
                    "sequences": snapshot.sequences.len(),
                    "synonyms": snapshot.synonyms.len(),
                    "routines": snapshot.routines.len(),
                    "table_order": table_order
                        .iter()
                        .map(ToString::to_string)
                        .collect::<Vec<_>>(),
                });
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                println!("Snapshot Report:");
                println!("  Fingerprint: {fingerprint}");
                for kind in [
                    ObjectKind::Table,
                    ObjectKind::View,
                    ObjectKind::Sequence,
                    ObjectKind::Synonym,
                    ObjectKind::Routine,
                ] {
                    println!("  {}s: {}", kind, snapshot.names(kind).len());
                }
                println!("  Table order (parents first):");
                for name in &table_order {
                    println!("    {name}");
                }
            }
        }

        Commands::Diff {
            sql,
            allow_destructive,
        } => {
            let catalog = DialectCatalog::with_builtins();
            let dialect = catalog.require(&config.migration.dialect)?;
            let registry = catalog.analyzer_registry_for(&config.migration.dialect)?;

            let source = load_snapshot(&config.source.path, &cancel_token).await?;
            let target = load_snapshot(&config.target.path, &cancel_token).await?;

            let differ = SchemaDiffer::new(dialect.resolution());
            let plan = differ.diff(&source, &target, &cancel_token)?;
            let plan = registry.analyze(plan)?;
            let plan = OperationSorter::new().sort(plan);

            let destructive = plan.iter().filter(|op| op.is_destructive()).count();
            if destructive > 0 && !(allow_destructive || config.migration.allow_destructive) {
                return Err(SchemaError::Config(format!(
                    "plan contains {destructive} destructive operation(s); \
                     re-run with --allow-destructive to accept them"
                )));
            }

            if sql {
                let generator = GenericSqlGenerator::new(dialect);
                for statement in generator.generate(&plan)? {
                    println!("{statement};");
                }
            } else if cli.output_json {
                println!("{}", serde_json::to_string_pretty(&plan)?);
            } else if plan.is_empty() {
                println!("Snapshots are identical");
            } else {
                println!("Migration plan ({} operations):", plan.len());
                for op in &plan {
                    let marker = if op.is_destructive() { "!" } else { " " };
                    println!("  {marker} {}", op.summary());
                }
            }

            log_plan(&plan);
        }
    }

    Ok(())
}

fn side_path(config: &Config, target: bool) -> &Path {
    if target {
        &config.target.path
    } else {
        &config.source.path
    }
}

async fn load_snapshot(
    path: &Path,
    cancel: &CancellationToken,
) -> Result<DatabaseSnapshot, SchemaError> {
    let reader = Arc::new(JsonSchemaReader::from_file(path)?);
    let loader = SnapshotLoader::new(reader, cancel.clone());
    loader.load_snapshot().await
}

fn log_plan(plan: &[MigrationOperation]) {
    info!(
        operations = plan.len(),
        destructive = plan.iter().filter(|op| op.is_destructive()).count(),
        "plan computed"
    );
}

fn setup_logging(verbosity: &str, format: &str) -> Result<(), String> {
    let level = match verbosity.to_lowercase().as_str() {
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_span_events(FmtSpan::CLOSE)
        .with_target(false)
        .with_writer(std::io::stderr);

    if format == "json" {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    Ok(())
}

/// Cancellation on SIGINT and SIGTERM so in-flight snapshot loads and
/// diffs stop at their next checkpoint.
#[cfg(unix)]
fn setup_signal_handler() -> CancellationToken {
    let cancel_token = CancellationToken::new();

    let token_int = cancel_token.clone();
    tokio::spawn(async move {
        let mut sigint = signal(SignalKind::interrupt()).expect("Failed to setup SIGINT handler");
        sigint.recv().await;
        eprintln!("\nReceived SIGINT. Cancelling...");
        token_int.cancel();
    });

    let token_term = cancel_token.clone();
    tokio::spawn(async move {
        let mut sigterm = signal(SignalKind::terminate()).expect("Failed to setup SIGTERM handler");
        sigterm.recv().await;
        eprintln!("\nReceived SIGTERM. Cancelling...");
        token_term.cancel();
    });

    cancel_token
}

#[cfg(not(unix))]
fn setup_signal_handler() -> CancellationToken {
    let cancel_token = CancellationToken::new();
    let token = cancel_token.clone();

    tokio::spawn(async move {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to setup Ctrl-C handler");
        eprintln!("\nReceived Ctrl-C. Cancelling...");
        token.cancel();
    });

    cancel_token
}
