//! dms-reconcile CLI - post-migration data reconciliation.

use clap::{Parser, Subcommand};
use dms_reconcile::{
    Config, DbSide, HealthCheckResult, Orchestrator, ReconcileError, RunSummary, TableCatalog,
};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{info, Level};

#[derive(Parser)]
#[command(name = "dms-reconcile")]
#[command(about = "Sample-based data reconciliation after a database migration")]
#[command(version)]
struct Cli {
    /// Path to YAML configuration file
    #[arg(short, long, default_value = "config.yaml")]
    config: PathBuf,

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
    /// Reconcile every table listed in the include files
    Reconcile {
        /// Override number of workers
        #[arg(long)]
        workers: Option<usize>,

        /// Override number of rows sampled per table
        #[arg(long)]
        sample_rows: Option<usize>,

        /// Write per-cell detail logs and the generated target queries
        #[arg(long)]
        verbose_diffs: bool,

        /// Override directory holding the include files
        #[arg(long)]
        input_dir: Option<PathBuf>,

        /// Override directory receiving the logs
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },

    /// Print the tables listed in the include files
    ListTables {
        /// Override directory holding the include files
        #[arg(long)]
        input_dir: Option<PathBuf>,
    },

    /// Test database connections
    HealthCheck,
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

async fn run() -> Result<(), ReconcileError> {
    let cli = Cli::parse();

    setup_logging(&cli.verbosity, &cli.log_format);

    let mut config = Config::load(&cli.config)?;
    info!("Loaded configuration from {:?}", cli.config);

    match cli.command {
        Commands::Reconcile {
            workers,
            sample_rows,
            verbose_diffs,
            input_dir,
            output_dir,
        } => {
            if let Some(w) = workers {
                config.reconcile.workers = Some(w);
            }
            if let Some(n) = sample_rows {
                config.reconcile.sample_rows = n;
            }
            if verbose_diffs {
                config.reconcile.verbose = true;
            }
            if let Some(dir) = input_dir {
                config.reconcile.input_dir = dir;
            }
            if let Some(dir) = output_dir {
                config.reconcile.output_dir = dir;
            }
            config.validate()?;
            let config = config.with_auto_tuning();

            let output_dir = config.reconcile.output_dir.clone();
            let orchestrator = Orchestrator::new(config).await?;
            let summary = orchestrator.run().await?;

            if cli.output_json {
                println!("{}", summary.to_json()?);
            } else {
                print_summary(&summary, &output_dir);
            }
        }

        Commands::ListTables { input_dir } => {
            let dir = input_dir.unwrap_or_else(|| config.reconcile.input_dir.clone());
            let units = TableCatalog::from_dir(&dir, &config.reconcile.include_prefix)?;

            if cli.output_json {
                println!("{}", serde_json::to_string_pretty(&units)?);
            } else {
                for unit in &units {
                    println!("{}", unit);
                }
                println!("\n{} tables", units.len());
            }
        }

        Commands::HealthCheck => {
            let result = HealthCheckResult::probe(&config).await;

            if cli.output_json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                println!("Health Check Results:");
                println!(
                    "  Source ({}): {} ({}ms)",
                    config.source.r#type,
                    if result.source_connected { "OK" } else { "FAILED" },
                    result.source_latency_ms
                );
                if let Some(ref err) = result.source_error {
                    println!("    Error: {}", err);
                }
                println!(
                    "  Target ({}): {} ({}ms)",
                    config.target.r#type,
                    if result.target_connected { "OK" } else { "FAILED" },
                    result.target_latency_ms
                );
                if let Some(ref err) = result.target_error {
                    println!("    Error: {}", err);
                }
                println!(
                    "\n  Overall: {}",
                    if result.healthy { "HEALTHY" } else { "UNHEALTHY" }
                );
            }

            if !result.healthy {
                let side = if result.source_connected {
                    DbSide::Target
                } else {
                    DbSide::Source
                };
                return Err(ReconcileError::connectivity(side, "health check failed"));
            }
        }
    }

    Ok(())
}

fn print_summary(summary: &RunSummary, output_dir: &std::path::Path) {
    println!("\nReconciliation completed!");
    println!("  Run ID: {}", summary.run_id);
    println!("  Duration: {:.2}s", summary.duration_seconds);
    println!("  Tables: {}", summary.total);
    println!("  Fully matched: {}", summary.fully_matched);
    println!("  With differences: {}", summary.with_differences);
    println!("  Skipped: {}", summary.skipped);
    println!("  Errored: {}", summary.errored);

    let differing: Vec<_> = summary
        .results
        .iter()
        .filter(|r| r.rows_with_differences > 0)
        .map(|r| r.unit().full_name())
        .collect();
    if !differing.is_empty() {
        println!("  Tables with differences: {:?}", differing);
    }
    println!("  Logs: {}", output_dir.display());
}

/// Logs go to stderr so `--output-json` stays machine-readable.
fn setup_logging(verbosity: &str, format: &str) {
    let level = match verbosity.to_lowercase().as_str() {
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false);

    if format == "json" {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
}
