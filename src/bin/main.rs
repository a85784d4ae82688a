//! Quarry CLI - infer a schema from source and generate migrations
//!
//! Usage:
//!   quarry analyze [--root <dir>]
//!   quarry validate [--root <dir>]
//!   quarry deploy [--root <dir>]
//!   quarry apply <migration.sql>
//!   quarry watch [--no-deploy]
//!
//! Examples:
//!   quarry analyze --root ./app
//!   quarry watch -v
//!   RUST_LOG=quarry=trace quarry validate

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use quarry::deploy::{DeployReport, DeployResult, Deployer};
use quarry::migration::MigrationTrigger;
use quarry::pipeline::{Pipeline, PipelineOutcome, Scan};
use quarry::report::ValidationReport;
use quarry::watch::{Driver, FsWatcher, PipelineCycle};
use quarry::Settings;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "quarry")]
#[command(about = "Quarry - infer a relational schema from source code and generate Postgres migrations")]
#[command(version)]
struct Cli {
    /// Project root to scan
    #[arg(long, global = true, default_value = ".")]
    root: PathBuf,

    /// Config file (defaults to <root>/quarry.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Increase log verbosity
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan once and write the schema, migration, report, and snapshot
    Analyze,

    /// Scan once without writing anything; fail on validation findings
    Validate,

    /// Analyze, then deploy the resulting migration
    Deploy,

    /// Deploy an existing migration file
    Apply {
        /// Path to the migration SQL file
        file: PathBuf,
    },

    /// Rerun the pipeline whenever sources change
    Watch {
        /// Write artifacts but do not deploy
        #[arg(long)]
        no_deploy: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let pipeline = match load_pipeline(&cli.root, cli.config.as_deref()) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match cli.command {
        Commands::Analyze => cmd_analyze(&pipeline),
        Commands::Validate => cmd_validate(&pipeline),
        Commands::Deploy => cmd_deploy(&pipeline).await,
        Commands::Apply { file } => cmd_apply(&pipeline, &file).await,
        Commands::Watch { no_deploy } => cmd_watch(pipeline, no_deploy).await,
    }
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "quarry=info",
        1 => "quarry=debug",
        _ => "quarry=trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn load_pipeline(root: &Path, config: Option<&Path>) -> Result<Pipeline, quarry::PipelineError> {
    match config {
        Some(path) => Ok(Pipeline::new(root, Settings::from_file(path)?)),
        None => Pipeline::discover(root),
    }
}

fn cmd_analyze(pipeline: &Pipeline) -> ExitCode {
    match pipeline.run_once(MigrationTrigger::Manual) {
        Ok(outcome) => {
            print_outcome(&outcome);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn cmd_validate(pipeline: &Pipeline) -> ExitCode {
    let scan = match pipeline.scan() {
        Ok(scan) => scan,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };
    print_scan(&scan);
    print_validation(&scan.validation);

    if scan.validation.is_valid() {
        println!("OK: {} tables, no findings", scan.model.tables.len());
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

async fn cmd_deploy(pipeline: &Pipeline) -> ExitCode {
    let outcome = match pipeline.run_once(MigrationTrigger::Manual) {
        Ok(outcome) => outcome,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };
    print_outcome(&outcome);

    let Some(migration) = &outcome.emitted.migration else {
        println!("Nothing to deploy.");
        return ExitCode::SUCCESS;
    };
    let deployer = Deployer::from_settings(&pipeline.settings().deploy, pipeline.root());
    deploy_sql(&deployer, &migration.to_sql()).await
}

async fn cmd_apply(pipeline: &Pipeline, file: &Path) -> ExitCode {
    let deployer = Deployer::from_settings(&pipeline.settings().deploy, pipeline.root());
    let result = deployer
        .deploy_file(file, &pipeline.migrations_dir())
        .await
        .map(|(staged, report)| {
            println!("Migration file: {}", staged.display());
            report
        });
    finish_deploy(result)
}

async fn deploy_sql(deployer: &Deployer, sql: &str) -> ExitCode {
    finish_deploy(deployer.deploy(sql).await)
}

fn finish_deploy(result: DeployResult<DeployReport>) -> ExitCode {
    match result {
        Ok(report) => {
            print_deploy(&report);
            if report.is_complete() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
        Err(e) => {
            eprintln!("Deployment failed: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn cmd_watch(pipeline: Pipeline, no_deploy: bool) -> ExitCode {
    let (watcher, events) = match FsWatcher::start(pipeline.root(), &pipeline.settings().scan) {
        Ok(w) => w,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let debounce = pipeline.settings().watch.debounce();
    let mut cycle = PipelineCycle::new(pipeline);
    if !no_deploy {
        let settings = &cycle.pipeline().settings().deploy;
        let deployer = Deployer::from_settings(settings, cycle.pipeline().root());
        cycle = cycle.with_deployer(deployer);
    }

    let driver = Driver::new(cycle, debounce);
    // Initial run before waiting for edits
    driver.cycle().await;
    println!("Watching {} (Ctrl-C to stop)", driver.runner().pipeline().root().display());

    driver
        .run(events, async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await;
    drop(watcher);

    let status = driver.status();
    println!("Stopped after {} cycle(s).", status.cycles);
    ExitCode::SUCCESS
}

fn print_scan(scan: &Scan) {
    println!(
        "Scanned {} file(s): {} tables, {} columns, {} relationships",
        scan.files,
        scan.model.tables.len(),
        scan.model.column_count(),
        scan.model.relationship_count()
    );
    if !scan.warnings.is_empty() {
        println!("Warnings:");
        for warning in &scan.warnings {
            println!("  {}", warning);
        }
    }
}

fn print_validation(validation: &ValidationReport) {
    if validation.is_valid() {
        return;
    }
    println!("Validation findings:");
    for finding in &validation.findings {
        println!("  - {}", finding);
    }
}

fn print_outcome(outcome: &PipelineOutcome) {
    print_scan(&outcome.scan);
    if !outcome.emitted.warnings.is_empty() {
        println!("Output warnings:");
        for warning in &outcome.emitted.warnings {
            println!("  {}", warning);
        }
    }
    print_validation(&outcome.scan.validation);

    let emitted = &outcome.emitted;
    println!("Schema: {}", emitted.schema_path.display());
    println!("Report: {}", emitted.report_path.display());
    match (&emitted.migration_path, &emitted.drift) {
        (Some(path), Some(drift)) => println!(
            "Migration: {} ({} change(s))",
            path.display(),
            drift.change_count()
        ),
        (Some(path), None) => println!("Migration: {} (full schema)", path.display()),
        (None, _) => println!("No schema changes since the last snapshot."),
    }
}

fn print_deploy(report: &DeployReport) {
    println!(
        "Deployed via {}: {} statement(s) applied",
        report.method, report.applied
    );
    for failure in &report.failures {
        println!("  statement {} failed: {}", failure.index, failure.error);
    }
}
