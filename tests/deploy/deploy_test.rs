use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use quarry::config::{DdlSettings, ModelSettings};
use quarry::deploy::{
    DeployError, DeployMethod, DeployResult, Deployer, PrimaryApplier, StatementExecutor,
};
use quarry::drift::incremental;
use quarry::facts::{Provenance, SchemaFact, Strategy};
use quarry::migration::{Migration, MigrationKind, MigrationTrigger};
use quarry::schema::build_model;
use quarry::synth::{Script, Synthesizer};

const SCRIPT: &str = "-- Added columns\n\
ALTER TABLE payments ADD COLUMN currency TEXT;\n\
ALTER TABLE payments ADD COLUMN note TEXT;\n\
\n\
-- Removed tables\n\
DROP TABLE IF EXISTS legacy CASCADE;\n";

struct FakePrimary {
    succeed: bool,
    calls: Arc<Mutex<usize>>,
}

#[async_trait]
impl PrimaryApplier for FakePrimary {
    async fn apply(&self) -> DeployResult<()> {
        *self.calls.lock().unwrap() += 1;
        if self.succeed {
            Ok(())
        } else {
            Err(DeployError::CommandFailed {
                program: "supabase".to_string(),
                status: "exit status: 1".to_string(),
                stderr: "cannot connect".to_string(),
            })
        }
    }
}

/// Records statements and rejects any containing `fail_on`.
#[derive(Default)]
struct FakeExecutor {
    fail_on: Option<&'static str>,
    seen: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl StatementExecutor for FakeExecutor {
    async fn execute(&self, statement: &str) -> DeployResult<()> {
        self.seen.lock().unwrap().push(statement.to_string());
        match self.fail_on {
            Some(needle) if statement.contains(needle) => {
                Err(DeployError::status(400, "column already exists"))
            }
            _ => Ok(()),
        }
    }
}

fn primary(succeed: bool) -> (FakePrimary, Arc<Mutex<usize>>) {
    let calls = Arc::new(Mutex::new(0));
    (
        FakePrimary {
            succeed,
            calls: Arc::clone(&calls),
        },
        calls,
    )
}

#[tokio::test]
async fn test_primary_success_skips_fallback() {
    let (primary, calls) = primary(true);
    let executor = FakeExecutor::default();
    let seen = Arc::clone(&executor.seen);

    let report = Deployer::new(primary)
        .with_fallback(executor)
        .deploy(SCRIPT)
        .await
        .unwrap();

    assert_eq!(report.method, DeployMethod::Primary);
    assert_eq!(report.applied, 3);
    assert!(report.is_complete());
    assert_eq!(*calls.lock().unwrap(), 1);
    assert!(seen.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_fallback_continues_past_failures() {
    let (primary, _) = primary(false);
    let executor = FakeExecutor {
        fail_on: Some("currency"),
        ..FakeExecutor::default()
    };
    let seen = Arc::clone(&executor.seen);

    let report = Deployer::new(primary)
        .with_fallback(executor)
        .deploy(SCRIPT)
        .await
        .unwrap();

    assert_eq!(report.method, DeployMethod::PerStatement);
    assert_eq!(report.applied, 2);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].index, 0);
    assert!(report.failures[0].error.contains("400"));
    assert!(!report.is_complete());

    // every statement was attempted, in order
    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 3);
    assert!(seen[2].ends_with("DROP TABLE IF EXISTS legacy CASCADE"));
}

#[tokio::test]
async fn test_no_fallback_surfaces_primary_error() {
    let (primary, _) = primary(false);
    let deployer = Deployer::new(primary);
    assert!(!deployer.has_fallback());

    let err = deployer.deploy(SCRIPT).await.unwrap_err();
    let DeployError::NoFallback(inner) = err else {
        panic!("expected NoFallback, got {:?}", err);
    };
    assert!(matches!(*inner, DeployError::CommandFailed { .. }));
}

fn incremental_script() -> Script {
    let src = || Provenance::new("services/prayers.ts", 1);
    let previous = build_model(
        &ModelSettings::default(),
        &[SchemaFact::column_ref(Strategy::Query, "prayers", "title", src())],
    );
    let current = build_model(
        &ModelSettings::default(),
        &[
            SchemaFact::column_ref(Strategy::Query, "prayers", "title", src()),
            SchemaFact::column_ref(Strategy::Query, "prayers", "body", src()),
            SchemaFact::column_ref(Strategy::Query, "prayers", "note", src()),
        ],
    );
    let ddl = DdlSettings::default();
    let settings = ModelSettings::default();
    incremental(&Synthesizer::new(&ddl, &settings), &previous, &current)
}

#[tokio::test]
async fn test_migration_file_deploys_statement_by_statement() {
    let created = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
    let migration = Migration::new(
        MigrationKind::Incremental,
        MigrationTrigger::Watch,
        created,
        incremental_script(),
    );
    let (primary, _) = primary(false);
    let executor = FakeExecutor::default();
    let seen = Arc::clone(&executor.seen);

    let report = Deployer::new(primary)
        .with_fallback(executor)
        .deploy(&migration.to_sql())
        .await
        .unwrap();

    assert_eq!(report.applied, 2);
    // header comments travel with the first statement
    let seen = seen.lock().unwrap();
    assert!(seen[0].starts_with("-- quarry incremental migration"));
    assert!(seen[0].ends_with("ALTER TABLE prayers ADD COLUMN body TEXT"));
    assert_eq!(seen[1], "ALTER TABLE prayers ADD COLUMN note TEXT");
}

#[cfg(unix)]
#[tokio::test]
async fn test_failing_command_falls_back() {
    use quarry::deploy::CliApplier;

    let dir = tempfile::tempdir().unwrap();
    let command = vec!["sh".to_string(), "-c".to_string(), "exit 3".to_string()];
    let executor = FakeExecutor::default();
    let seen = Arc::clone(&executor.seen);

    let report = Deployer::new(CliApplier::new(command, dir.path()))
        .with_fallback(executor)
        .deploy(SCRIPT)
        .await
        .unwrap();

    assert_eq!(report.method, DeployMethod::PerStatement);
    assert_eq!(report.applied, 3);
    assert_eq!(seen.lock().unwrap().len(), 3);
}

/// Succeeds, recording the migration files visible when it runs.
struct DirectoryPrimary {
    dir: PathBuf,
    visible: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl PrimaryApplier for DirectoryPrimary {
    async fn apply(&self) -> DeployResult<()> {
        let mut visible = self.visible.lock().unwrap();
        for entry in fs::read_dir(&self.dir).unwrap() {
            visible.push(fs::read_to_string(entry.unwrap().path()).unwrap());
        }
        Ok(())
    }
}

#[tokio::test]
async fn test_applied_file_is_staged_for_the_migration_command() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("hotfix.sql");
    fs::write(&file, SCRIPT).unwrap();
    let migrations = dir.path().join("supabase/migrations");
    let visible = Arc::new(Mutex::new(Vec::new()));
    let deployer = Deployer::new(DirectoryPrimary {
        dir: migrations.clone(),
        visible: Arc::clone(&visible),
    });

    let (staged, report) = deployer.deploy_file(&file, &migrations).await.unwrap();

    assert!(staged.starts_with(&migrations));
    assert!(staged.file_name().unwrap().to_string_lossy().ends_with("_hotfix.sql"));
    assert_eq!(*visible.lock().unwrap(), vec![SCRIPT.to_string()]);
    assert_eq!(report.method, DeployMethod::Primary);
    assert_eq!(report.applied, 3);
    // the original stays where it was
    assert!(file.exists());
}

#[tokio::test]
async fn test_file_in_migrations_dir_is_not_copied() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("20260301120000000_quarry_incremental.sql");
    fs::write(&file, SCRIPT).unwrap();
    let visible = Arc::new(Mutex::new(Vec::new()));
    let deployer = Deployer::new(DirectoryPrimary {
        dir: dir.path().to_path_buf(),
        visible: Arc::clone(&visible),
    });

    let (staged, _) = deployer.deploy_file(&file, dir.path()).await.unwrap();

    assert_eq!(staged, file.canonicalize().unwrap());
    assert_eq!(visible.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_missing_file_fails_before_deploying() {
    let dir = tempfile::tempdir().unwrap();
    let (primary, calls) = primary(true);

    let err = Deployer::new(primary)
        .deploy_file(&dir.path().join("missing.sql"), dir.path())
        .await
        .unwrap_err();

    assert!(matches!(err, DeployError::Stage { .. }));
    assert!(err.is_local());
    assert_eq!(*calls.lock().unwrap(), 0);
}
