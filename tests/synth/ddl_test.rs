use quarry::config::{DdlSettings, ModelSettings};
use quarry::facts::{Provenance, SchemaFact, Strategy};
use quarry::schema::{build_model, Model};
use quarry::sql::{split_statements, DdlStatement};
use quarry::synth::Synthesizer;
use sqlparser::ast::Statement;
use sqlparser::dialect::PostgreSqlDialect;
use sqlparser::parser::Parser;

fn parse(sql: &str) -> Statement {
    let mut statements = Parser::parse_sql(&PostgreSqlDialect {}, sql)
        .unwrap_or_else(|e| panic!("invalid Postgres: {}\n{}", e, sql));
    assert_eq!(statements.len(), 1, "{}", sql);
    statements.remove(0)
}

fn model() -> Model {
    let src = |f: &str| Provenance::new(f, 1);
    let facts = vec![
        SchemaFact::column_ref(Strategy::Declaration, "Payment", "amount", src("types/payment.ts"))
            .with_type(quarry::sql::SqlType::Numeric)
            .with_nullable(false),
        SchemaFact::column_ref(Strategy::Query, "payments", "user_id", src("services/pay.ts")),
        SchemaFact::column_ref(Strategy::Query, "payments", "firstName", src("services/pay.ts")),
        SchemaFact::column_ref(Strategy::Generated, "users", "email", src("types/db.ts")),
        SchemaFact::column_ref(Strategy::Query, "prayers", "title", src("services/prayer.ts")),
        SchemaFact::table_ref(Strategy::Query, "organizations", src("services/org.ts")),
    ];
    build_model(&ModelSettings::default(), &facts)
}

fn full_sql(model: &Model) -> String {
    let ddl = DdlSettings::default();
    let settings = ModelSettings::default();
    Synthesizer::new(&ddl, &settings).full_schema(model).to_sql()
}

#[test]
fn test_structural_statements_parse_as_postgres() {
    let ddl = DdlSettings::default();
    let settings = ModelSettings::default();
    let script = Synthesizer::new(&ddl, &settings).full_schema(&model());

    let mut creates = 0;
    let mut constraints = 0;
    for statement in script.statements() {
        let sql = statement.to_sql();
        match statement {
            DdlStatement::CreateTable(_) => {
                assert!(matches!(parse(&sql), Statement::CreateTable(_)));
                creates += 1;
            }
            DdlStatement::CreateIndex(_) => {
                assert!(matches!(parse(&sql), Statement::CreateIndex(_)));
            }
            DdlStatement::AlterTable(_) if sql.contains("ADD CONSTRAINT") => {
                assert!(matches!(parse(&sql), Statement::AlterTable { .. }));
                constraints += 1;
            }
            _ => {}
        }
    }
    assert_eq!(creates, 4);
    // payments.user_id, payments.organization_id
    assert_eq!(constraints, 2);
}

#[test]
fn test_create_table_shape() {
    let sql = full_sql(&model());
    let create = split_statements(&sql)
        .into_iter()
        .find(|s| s.starts_with("CREATE TABLE IF NOT EXISTS payments"))
        .unwrap();

    let Statement::CreateTable(table) = parse(&create) else {
        panic!("not a CREATE TABLE: {}", create);
    };
    let names: Vec<String> = table.columns.iter().map(|c| c.name.value.clone()).collect();
    assert_eq!(
        names,
        vec![
            "id",
            "amount",
            "firstName",
            "organization_id",
            "user_id",
            "created_at",
            "updated_at"
        ]
    );
    assert!(create.contains("\"firstName\""));
    assert!(create.contains("id UUID NOT NULL DEFAULT uuid_generate_v4()"));
}

#[test]
fn test_sections_in_dependency_order() {
    let sql = full_sql(&model());
    let create_users = sql.find("CREATE TABLE IF NOT EXISTS users").unwrap();
    let create_payments = sql.find("CREATE TABLE IF NOT EXISTS payments").unwrap();
    let first_fk = sql.find("FOREIGN KEY").unwrap();
    let first_policy = sql.find("CREATE POLICY").unwrap();
    let trigger = sql.find("CREATE TRIGGER").unwrap();

    assert!(sql.starts_with("-- Extensions\nCREATE EXTENSION IF NOT EXISTS \"uuid-ossp\";"));
    assert!(create_users < create_payments);
    assert!(create_payments < first_fk);
    assert!(first_fk < first_policy);
    assert!(first_policy < trigger);
}

#[test]
fn test_output_is_byte_identical_across_runs() {
    let first = full_sql(&model());
    for _ in 0..3 {
        assert_eq!(full_sql(&model()), first);
    }
}

#[test]
fn test_script_splits_into_every_statement() {
    let ddl = DdlSettings::default();
    let settings = ModelSettings::default();
    let script = Synthesizer::new(&ddl, &settings).full_schema(&model());

    let split = split_statements(&script.to_sql());
    assert_eq!(split.len(), script.statement_count());
    let function = split
        .iter()
        .find(|s| s.starts_with("CREATE OR REPLACE FUNCTION"))
        .unwrap();
    assert!(function.contains("RETURN NEW;"));
}
