use std::fs;
use std::path::Path;

use quarry::config::CONFIG_FILE_NAME;
use quarry::migration::{MigrationKind, MigrationTrigger};
use quarry::pipeline::{Pipeline, SCHEMA_FILE_NAME};
use quarry::Settings;

fn write(root: &Path, relative: &str, contents: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

fn project() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "services/payments.ts",
        "export const list = () => supabase.from('payments').select('id, amount, user_id');\n",
    );
    write(
        dir.path(),
        "types/user.ts",
        "export interface User {\n  email: string;\n  displayName?: string;\n}\n",
    );
    dir
}

fn migrations(pipeline: &Pipeline) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(pipeline.migrations_dir())
        .map(|entries| {
            entries
                .filter_map(Result::ok)
                .map(|e| e.file_name().to_string_lossy().into_owned())
                .collect()
        })
        .unwrap_or_default();
    names.sort();
    names
}

#[test]
fn test_rerun_without_changes_is_idempotent() {
    let dir = project();
    let pipeline = Pipeline::new(dir.path(), Settings::default());

    let first = pipeline.run_once(MigrationTrigger::Manual).unwrap();
    let schema = fs::read(&first.emitted.schema_path).unwrap();
    assert_eq!(first.emitted.schema_path.file_name().unwrap(), SCHEMA_FILE_NAME);
    assert_eq!(migrations(&pipeline).len(), 1);

    let second = pipeline.run_once(MigrationTrigger::Manual).unwrap();
    assert!(second.emitted.is_unchanged());
    assert_eq!(fs::read(&second.emitted.schema_path).unwrap(), schema);
    assert_eq!(
        second.emitted.previous_fingerprint.as_deref(),
        Some(first.emitted.fingerprint.as_str())
    );
    assert_eq!(migrations(&pipeline).len(), 1);
}

#[test]
fn test_source_change_produces_incremental_migration() {
    let dir = project();
    let pipeline = Pipeline::new(dir.path(), Settings::default());
    let first = pipeline.run_once(MigrationTrigger::Manual).unwrap();
    assert_eq!(
        first.emitted.migration.as_ref().map(|m| m.kind()),
        Some(MigrationKind::Full)
    );

    write(
        dir.path(),
        "services/payments.ts",
        "export const list = () => supabase.from('payments').select('id, amount, currency, user_id');\n",
    );
    let second = pipeline.run_once(MigrationTrigger::Watch).unwrap();

    let migration = second.emitted.migration.as_ref().unwrap();
    assert_eq!(migration.kind(), MigrationKind::Incremental);
    assert_eq!(migration.trigger(), MigrationTrigger::Watch);
    let drift = second.emitted.drift.as_ref().unwrap();
    assert_eq!(drift.change_count(), 1);

    let written = fs::read_to_string(second.emitted.migration_path.as_ref().unwrap()).unwrap();
    assert!(written.starts_with("-- quarry incremental migration\n-- trigger: watch\n"));
    assert!(written.contains("ALTER TABLE payments ADD COLUMN currency TEXT;"));
    assert!(!written.contains("CREATE TABLE"));
    assert_eq!(migrations(&pipeline).len(), 2);
}

#[test]
fn test_deleted_source_drops_its_table() {
    let dir = project();
    let pipeline = Pipeline::new(dir.path(), Settings::default());
    pipeline.run_once(MigrationTrigger::Manual).unwrap();

    fs::remove_file(dir.path().join("types/user.ts")).unwrap();
    let outcome = pipeline.run_once(MigrationTrigger::Manual).unwrap();

    let drift = outcome.emitted.drift.as_ref().unwrap();
    assert_eq!(drift.removed_tables, vec!["users"]);
    let sql = outcome.emitted.migration.as_ref().unwrap().to_sql();
    assert!(sql.contains("DROP TABLE IF EXISTS users CASCADE;"));

    // The full schema is always regenerated from the current model
    let schema = fs::read_to_string(&outcome.emitted.schema_path).unwrap();
    assert!(!schema.contains("CREATE TABLE IF NOT EXISTS users"));
}

#[test]
fn test_scan_writes_nothing() {
    let dir = project();
    let pipeline = Pipeline::new(dir.path(), Settings::default());
    let scan = pipeline.scan().unwrap();

    assert_eq!(scan.files, 2);
    assert!(scan.model.contains("payments"));
    assert!(scan.model.contains("users"));
    assert!(!pipeline.output_dir().exists());
    assert!(!scan.validation.is_valid());
}

#[test]
fn test_config_file_redirects_output() {
    let dir = project();
    write(
        dir.path(),
        CONFIG_FILE_NAME,
        "[scan]\npatterns = [\"services/**/*.ts\"]\n\n[output]\ndir = \"out\"\nmigrations_dir = \"out/migrations\"\n",
    );
    let settings = Settings::from_file(dir.path().join(CONFIG_FILE_NAME)).unwrap();
    let pipeline = Pipeline::new(dir.path(), settings);
    let outcome = pipeline.run_once(MigrationTrigger::Manual).unwrap();

    assert_eq!(outcome.scan.files, 1);
    assert!(!outcome.scan.model.contains("users"));
    assert_eq!(outcome.emitted.schema_path, dir.path().join("out").join(SCHEMA_FILE_NAME));
    assert!(outcome
        .emitted
        .migration_path
        .as_ref()
        .unwrap()
        .starts_with(dir.path().join("out/migrations")));

    let report = fs::read_to_string(&outcome.emitted.report_path).unwrap();
    assert!(report.starts_with("# Database Analysis Report"));
}
