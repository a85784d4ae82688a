use quarry::config::ModelSettings;
use quarry::extract::{ExtractorSet, SourceText};
use quarry::facts::{Provenance, SchemaFact, Strategy};
use quarry::report::{validate, Finding};
use quarry::schema::{build_model, Category, Model, RelationshipOrigin, NOW_DEFAULT, UUID_DEFAULT};
use quarry::sql::SqlType;

fn src(file: &str) -> Provenance {
    Provenance::new(file, 1)
}

fn permutations<T: Clone>(items: &[T]) -> Vec<Vec<T>> {
    if items.len() <= 1 {
        return vec![items.to_vec()];
    }
    let mut out = Vec::new();
    for i in 0..items.len() {
        let mut rest = items.to_vec();
        let head = rest.remove(i);
        for mut tail in permutations(&rest) {
            tail.insert(0, head.clone());
            out.push(tail);
        }
    }
    out
}

fn model_from_sources(sources: &[(&str, &str)]) -> Model {
    let settings = ModelSettings::default();
    let set = ExtractorSet::standard(&settings);
    let mut facts = Vec::new();
    for (path, contents) in sources {
        facts.extend(set.extract_file(SourceText::new(path, contents)).facts);
    }
    build_model(&settings, &facts)
}

#[test]
fn test_merge_is_commutative() {
    let facts = vec![
        SchemaFact::column_ref(Strategy::Query, "payments", "amount", src("q.ts")),
        SchemaFact::column_ref(Strategy::Declaration, "Payment", "amount", src("d.ts"))
            .with_type(SqlType::Integer)
            .with_nullable(false),
        SchemaFact::column_ref(Strategy::FormState, "payments", "amount", src("f.tsx"))
            .with_type(SqlType::Text)
            .with_nullable(true),
        SchemaFact::relationship_hint(
            Strategy::Validation,
            "payments",
            "payer_id",
            "users",
            "id",
            src("v.ts"),
        ),
    ];
    let settings = ModelSettings::default();
    let expected = build_model(&settings, &facts);

    for permutation in permutations(&facts) {
        assert_eq!(build_model(&settings, &permutation), expected);
    }

    let amount = expected.table("payments").unwrap().column("amount").unwrap();
    assert_eq!(amount.sql_type, SqlType::Integer);
    assert!(amount.nullable);
}

#[test]
fn test_split_extraction_merges_to_same_model() {
    let a = ("services/payments.ts", "supabase.from('payments').select('amount, user_id')");
    let b = (
        "types/payment.ts",
        "export interface Payment { amount: number; currency?: string }",
    );
    let together = model_from_sources(&[a, b]);
    let swapped = model_from_sources(&[b, a]);

    assert_eq!(together, swapped);
    let payments = together.table("payments").unwrap();
    assert_eq!(
        payments.column("amount").unwrap().sources.len(),
        2,
        "both files should be recorded"
    );
}

#[test]
fn test_type_is_sticky_across_runs_of_evidence() {
    // A stated type is never downgraded by later unspecific evidence.
    let model = model_from_sources(&[
        (
            "types/prayer.ts",
            "export interface Prayer { title: string; prayedAt: Date }",
        ),
        ("services/prayers.ts", "supabase.from('prayers').select('title, prayedAt')"),
    ]);
    let prayers = model.table("prayers").unwrap();

    let title = prayers.column("title").unwrap();
    assert_eq!(title.sql_type, SqlType::Text);
    assert!(!title.nullable);
    assert_eq!(prayers.column("prayedAt").unwrap().sql_type, SqlType::Timestamp);
}

#[test]
fn test_every_table_has_common_columns() {
    let model = model_from_sources(&[
        ("services/a.ts", "db.from('prayers').select('title')"),
        ("services/b.ts", "db.from('churches').select('name, priest_id')"),
        ("types/c.ts", "export interface Course { name: string }"),
    ]);
    assert_eq!(model.tables.len(), 3);

    for table in model.tables.values() {
        let id = table.column("id").unwrap();
        assert_eq!(id.sql_type, SqlType::Uuid);
        assert!(!id.nullable);
        assert_eq!(id.default.as_deref(), Some(UUID_DEFAULT));

        for name in ["created_at", "updated_at"] {
            let column = table.column(name).unwrap();
            assert_eq!(column.sql_type, SqlType::Timestamp, "{}.{}", table.name, name);
            assert_eq!(column.default.as_deref(), Some(NOW_DEFAULT));
        }
        assert_eq!(table.ordered_columns()[0].name, "id");
    }
}

#[test]
fn test_convention_and_tenant_relationships() {
    let model = model_from_sources(&[(
        "services/churches.ts",
        "supabase.from('churches').select('name, priest_id')",
    )]);
    let churches = model.table("churches").unwrap();
    assert_eq!(churches.category, Category::Core);

    let priest = churches.relationship_for("priest_id").unwrap();
    assert_eq!(priest.to_table, "priests");
    assert_eq!(priest.origin, RelationshipOrigin::Convention);
    assert_eq!(churches.column("priest_id").unwrap().sql_type, SqlType::Uuid);

    // churches is multi-tenant in the default settings
    let tenant = churches.relationship_for("organization_id").unwrap();
    assert_eq!(tenant.to_table, "organizations");
}

#[test]
fn test_convention_target_matches_queried_table_name() {
    let model = model_from_sources(&[
        (
            "services/campuses.ts",
            "supabase.from('campuses').select('name')",
        ),
        (
            "services/enrollments.ts",
            "supabase.from('enrollments').select('student_name, campus_id')",
        ),
    ]);
    let enrollments = model.table("enrollments").unwrap();
    let campus = enrollments.relationship_for("campus_id").unwrap();
    assert_eq!(campus.to_table, "campuses");
    assert!(model.contains("campuses"));
    assert!(!model.contains("campus"));

    let report = validate(&model, &ModelSettings::default());
    assert!(!report.dangling_relationships().any(|finding| matches!(
        finding,
        Finding::DanglingRelationship { column, .. } if column == "campus_id"
    )));
}
