use quarry::config::{DdlSettings, ModelSettings};
use quarry::drift::{diff, fingerprint, incremental, Snapshot, SNAPSHOT_FILE_NAME};
use quarry::facts::{Provenance, SchemaFact, Strategy};
use quarry::schema::{build_model, Model};
use quarry::sql::split_statements;
use quarry::synth::Synthesizer;
use sqlparser::ast::Statement;
use sqlparser::dialect::PostgreSqlDialect;
use sqlparser::parser::Parser;

fn build(columns: &[(&str, &str)]) -> Model {
    let facts: Vec<SchemaFact> = columns
        .iter()
        .map(|(t, c)| {
            SchemaFact::column_ref(Strategy::Query, *t, *c, Provenance::new("services/db.ts", 1))
        })
        .collect();
    build_model(&ModelSettings::default(), &facts)
}

fn incremental_sql(previous: &Model, current: &Model) -> String {
    let ddl = DdlSettings::default();
    let settings = ModelSettings::default();
    incremental(&Synthesizer::new(&ddl, &settings), previous, current).to_sql()
}

#[test]
fn test_removed_table_is_dropped_with_cascade() {
    let previous = build(&[("prayers", "title"), ("oremus_candles", "lit_at")]);
    let current = build(&[("prayers", "title")]);

    let sql = incremental_sql(&previous, &current);
    let statements = split_statements(&sql);
    assert_eq!(
        statements,
        vec!["-- Removed tables\nDROP TABLE IF EXISTS oremus_candles CASCADE"]
    );

    let parsed = Parser::parse_sql(&PostgreSqlDialect {}, &sql).unwrap();
    assert!(matches!(parsed.as_slice(), [Statement::Drop { cascade: true, .. }]));
}

#[test]
fn test_snapshot_survives_disk_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(SNAPSHOT_FILE_NAME);
    let model = build(&[("payments", "amount"), ("payments", "user_id"), ("users", "email")]);

    Snapshot::new(model.clone()).unwrap().save(&path).unwrap();
    let loaded = Snapshot::load(&path).unwrap().unwrap();

    assert_eq!(loaded.model, model);
    assert_eq!(loaded.fingerprint, fingerprint(&model).unwrap());
    assert!(diff(&loaded.model, &model).is_empty());
    assert_eq!(incremental_sql(&loaded.model, &model), "");
}

#[test]
fn test_fingerprint_tracks_model_changes() {
    let before = build(&[("prayers", "title")]);
    let same = build(&[("prayers", "title")]);
    let after = build(&[("prayers", "title"), ("prayers", "body")]);

    assert_eq!(fingerprint(&before).unwrap(), fingerprint(&same).unwrap());
    assert_ne!(fingerprint(&before).unwrap(), fingerprint(&after).unwrap());
}

#[test]
fn test_diff_is_symmetric() {
    let a = build(&[("prayers", "title"), ("prayers", "legacy"), ("candles", "lit")]);
    let b = build(&[("prayers", "title"), ("prayers", "body"), ("courses", "name")]);

    let forward = diff(&a, &b);
    let backward = diff(&b, &a);
    assert_eq!(forward.added_tables, backward.removed_tables);
    assert_eq!(forward.removed_tables, backward.added_tables);
    assert_eq!(forward.added_columns, backward.removed_columns);
    assert_eq!(forward.removed_columns, backward.added_columns);
    assert_eq!(forward.change_count(), 4);
}

#[test]
fn test_added_table_and_late_foreign_key() {
    // prayers.user_id pointed nowhere until users appeared
    let previous = build(&[("prayers", "title"), ("prayers", "user_id")]);
    let current = build(&[("prayers", "title"), ("prayers", "user_id"), ("users", "email")]);
    let sql = incremental_sql(&previous, &current);

    let create = sql.find("CREATE TABLE IF NOT EXISTS users").unwrap();
    let late_fk = sql.find("-- Foreign keys to added tables").unwrap();
    assert!(create < late_fk);
    assert!(sql[late_fk..].contains(
        "ALTER TABLE prayers ADD CONSTRAINT fk_prayers_user_id FOREIGN KEY (user_id) REFERENCES users (id) ON DELETE CASCADE;"
    ));
    assert!(!sql.contains("CREATE TABLE IF NOT EXISTS prayers"));
}

#[test]
fn test_column_changes_parse_as_postgres() {
    let previous = build(&[("prayers", "title"), ("prayers", "legacy")]);
    let current = build(&[("prayers", "title"), ("prayers", "body")]);
    let sql = incremental_sql(&previous, &current);

    for statement in split_statements(&sql) {
        let parsed = Parser::parse_sql(&PostgreSqlDialect {}, &statement)
            .unwrap_or_else(|e| panic!("invalid Postgres: {}\n{}", e, statement));
        assert!(matches!(parsed.as_slice(), [Statement::AlterTable { .. }]));
    }
    assert!(sql.contains("ALTER TABLE prayers ADD COLUMN body TEXT;"));
    assert!(sql.contains("ALTER TABLE prayers DROP COLUMN IF EXISTS legacy;"));
}
