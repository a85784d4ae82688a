use quarry::config::ModelSettings;
use quarry::extract::{
    DeclarationExtractor, Extraction, Extractor, ExtractorSet, QueryExtractor, SourceText,
};
use quarry::facts::{FactKind, SchemaFact, Strategy};
use quarry::locator::{LoadedFile, SourceFile};
use quarry::sql::SqlType;

fn loaded(relative: &str, contents: &str) -> LoadedFile {
    LoadedFile {
        file: SourceFile {
            path: relative.into(),
            relative: relative.to_string(),
        },
        contents: contents.to_string(),
    }
}

fn columns<'a>(out: &'a Extraction, table: &str) -> Vec<&'a str> {
    let mut cols: Vec<&str> = out
        .facts
        .iter()
        .filter(|f| f.kind == FactKind::ColumnRef && f.table == table)
        .filter_map(|f| f.column.as_deref())
        .collect();
    cols.sort();
    cols.dedup();
    cols
}

fn column_fact<'a>(out: &'a Extraction, table: &str, column: &str) -> &'a SchemaFact {
    out.facts
        .iter()
        .find(|f| f.table == table && f.column.as_deref() == Some(column))
        .unwrap_or_else(|| panic!("no fact for {}.{}", table, column))
}

#[test]
fn test_query_call_columns() {
    let src = r#"export async function listPayments() {
  const { data } = await supabase.from("payments").select("id, amount, user_id");
  return data;
}"#;
    let out = QueryExtractor::new().extract(SourceText::new("services/payments.ts", src));

    assert_eq!(columns(&out, "payments"), vec!["amount", "id", "user_id"]);
    let amount = column_fact(&out, "payments", "amount");
    assert_eq!(amount.strategy, Strategy::Query);
    assert_eq!(amount.source.file, "services/payments.ts");
    assert_eq!(amount.source.line, 2);
    assert!(out
        .facts
        .iter()
        .any(|f| f.kind == FactKind::TableRef && f.table == "payments"));
}

#[test]
fn test_declaration_keeps_member_names_verbatim() {
    let src = "export interface UserProfile {\n  firstName: string;\n  age?: number;\n}\n";
    let out = DeclarationExtractor::new(vec!["Props".to_string()])
        .extract(SourceText::new("types/user.ts", src));

    let first = column_fact(&out, "user_profiles", "firstName");
    assert_eq!(first.sql_type, Some(SqlType::Text));
    assert_eq!(first.nullable, Some(false));

    let age = column_fact(&out, "user_profiles", "age");
    assert_eq!(age.sql_type, Some(SqlType::Integer));
    assert_eq!(age.nullable, Some(true));
}

#[test]
fn test_standard_set_runs_every_strategy() {
    let set = ExtractorSet::standard(&ModelSettings::default());
    assert_eq!(set.len(), 5);

    let files = vec![
        loaded(
            "services/prayers.ts",
            "await supabase.from('prayers').select('title, body')",
        ),
        loaded(
            "types/course.ts",
            "export interface Course { name: string; published?: boolean }",
        ),
        loaded(
            "lib/schemas.ts",
            "export const churchSchema = z.object({ name: z.string() })",
        ),
        loaded(
            "app/payments/new.tsx",
            "const [form] = useState({ amount: 0 }); register('currency')",
        ),
    ];
    let out = set.extract_all(&files);

    let strategies: std::collections::BTreeSet<Strategy> =
        out.facts.iter().map(|f| f.strategy).collect();
    assert!(strategies.contains(&Strategy::Query));
    assert!(strategies.contains(&Strategy::Declaration));
    assert!(strategies.contains(&Strategy::Validation));
    assert!(strategies.contains(&Strategy::FormState));

    assert_eq!(columns(&out, "prayers"), vec!["body", "title"]);
    assert_eq!(columns(&out, "courses"), vec!["name", "published"]);
    assert_eq!(columns(&out, "churches"), vec!["name"]);
    assert_eq!(columns(&out, "payments"), vec!["amount", "currency"]);
}

#[test]
fn test_extraction_is_independent_of_file_order() {
    let set = ExtractorSet::standard(&ModelSettings::default());
    let mut files = vec![
        loaded("services/a.ts", "db.from('payments').insert({ amount, note })"),
        loaded("services/b.ts", "db.from('users').select('email')"),
        loaded("types/c.ts", "export type Candle = { litAt: Date | null }"),
    ];
    let forward = set.extract_all(&files);
    files.reverse();
    let backward = set.extract_all(&files);

    assert_eq!(forward, backward);
}

#[test]
fn test_malformed_file_warns_without_aborting() {
    let set = ExtractorSet::standard(&ModelSettings::default());
    let files = vec![
        loaded("types/broken.ts", "export interface Broken { name: string;"),
        loaded("services/ok.ts", "db.from('prayers').select('title')"),
    ];
    let out = set.extract_all(&files);

    assert!(!out.warnings.is_empty());
    assert!(out
        .warnings
        .iter()
        .all(|w| w.file.as_deref() == Some("types/broken.ts")));
    assert_eq!(columns(&out, "prayers"), vec!["title"]);
}
