//! Declaration extraction.
//!
//! Recognizes structural type declarations:
//!
//! ```text
//! interface UserProfile { firstName: string; age?: number }
//! type Payment = { amount: number; paid_at: Date | null }
//! ```
//!
//! The declaration name becomes a table (entity suffixes stripped, then
//! pluralized) and every property becomes a column. Property names are kept
//! verbatim.

use std::sync::LazyLock;

use regex::Regex;

use super::scan::{self, LineIndex};
use super::{Extraction, Extractor, SourceText};
use crate::facts::{Provenance, SchemaFact, Strategy, Warning};
use crate::naming;
use crate::sql::SqlType;

static INTERFACE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\binterface\s+([A-Za-z_$][\w$]*)\s*(?:<[^{]*?>)?\s*(?:extends\s+[^{]+?)?\s*\{")
        .expect("valid interface regex")
});

static TYPE_ALIAS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\btype\s+([A-Za-z_$][\w$]*)\s*(?:<[^=]*?>)?\s*=\s*\{")
        .expect("valid type alias regex")
});

static NUMBER_LITERAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^-?\d+(\.\d+)?$").expect("valid number regex"));

/// A `Tables:` member anywhere in a declaration marks a generated schema
/// container rather than an entity.
static CONTAINER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bTables\s*:\s*\{").expect("valid container regex"));

/// A mapped property type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TsType {
    pub sql_type: SqlType,
    /// The type admits `null` or `undefined`.
    pub nullable: bool,
}

/// Map a type annotation to a SQL type.
///
/// | annotation | SQL |
/// |---|---|
/// | `string`, string literals | text |
/// | `number`, integer literals | integer |
/// | `boolean`, `true`/`false` | boolean |
/// | `Date` | timestamp |
/// | `bigint` | bigint |
/// | `T[]`, `Array<T>` | array of mapped `T` |
/// | `object`, `any`, `Record<..>`, `Json`, inline `{..}` | jsonb |
/// | `Buffer`, `Uint8Array` | bytea |
/// | `unknown`, other named types | unknown |
///
/// `| null` and `| undefined` members set `nullable`. Unions of differing
/// types fall back to text.
///
/// # Examples
/// ```
/// use quarry::extract::map_ts_type;
/// use quarry::sql::SqlType;
///
/// let t = map_ts_type("string | null");
/// assert_eq!(t.sql_type, SqlType::Text);
/// assert!(t.nullable);
///
/// assert_eq!(map_ts_type("number[]").sql_type, SqlType::Array(Box::new(SqlType::Integer)));
/// ```
pub fn map_ts_type(annotation: &str) -> TsType {
    let annotation = annotation.trim().trim_end_matches([';', ',']).trim();
    let mut nullable = false;
    let mut mapped: Vec<SqlType> = Vec::new();

    for member in split_union(annotation) {
        let member = member.trim();
        match member {
            "" => {}
            "null" | "undefined" => nullable = true,
            _ => mapped.push(map_single(member)),
        }
    }

    mapped.dedup();
    let sql_type = match mapped.as_slice() {
        [] => SqlType::Unknown,
        [only] => only.clone(),
        _ => SqlType::Text,
    };

    TsType { sql_type, nullable }
}

fn map_single(ty: &str) -> SqlType {
    let ty = ty.trim();

    if let Some(inner) = ty.strip_suffix("[]") {
        let inner = inner
            .trim()
            .strip_prefix('(')
            .and_then(|s| s.strip_suffix(')'))
            .unwrap_or(inner);
        return SqlType::Array(Box::new(map_ts_type(inner).sql_type));
    }

    for wrapper in ["Array<", "ReadonlyArray<"] {
        if let Some(inner) = ty.strip_prefix(wrapper).and_then(|s| s.strip_suffix('>')) {
            return SqlType::Array(Box::new(map_ts_type(inner).sql_type));
        }
    }

    if ty.starts_with('{') || ty.starts_with("Record<") {
        return SqlType::Jsonb;
    }
    if scan::string_literal_at(ty, 0).is_some_and(|s| s.len() + 2 == ty.len()) {
        return SqlType::Text;
    }
    if NUMBER_LITERAL.is_match(ty) {
        return if ty.contains('.') {
            SqlType::Numeric
        } else {
            SqlType::Integer
        };
    }

    match ty {
        "string" | "String" => SqlType::Text,
        "number" | "Number" => SqlType::Integer,
        "boolean" | "Boolean" | "true" | "false" => SqlType::Boolean,
        "Date" | "date" => SqlType::Timestamp,
        "bigint" => SqlType::BigInt,
        "float" => SqlType::Real,
        "double" => SqlType::DoublePrecision,
        "any" | "object" | "Object" | "Json" | "JSON" => SqlType::Jsonb,
        "Buffer" | "Uint8Array" | "ArrayBuffer" | "Blob" => SqlType::Bytea,
        _ => SqlType::Unknown,
    }
}

/// Split a type on top-level `|`.
fn split_union(ty: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut start = 0;
    for (i, c) in ty.char_indices() {
        if let Some(q) = quote {
            if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '\'' | '"' | '`' => quote = Some(c),
            '<' | '(' | '{' | '[' => depth += 1,
            '>' | ')' | '}' | ']' => depth = depth.saturating_sub(1),
            '|' if depth == 0 => {
                parts.push(&ty[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&ty[start..]);
    parts
}

/// Extracts tables and columns from interface and type-alias declarations.
#[derive(Debug, Clone, Default)]
pub struct DeclarationExtractor {
    skip_suffixes: Vec<String>,
}

impl DeclarationExtractor {
    /// Declarations whose name ends in one of `skip_suffixes` are ignored.
    pub fn new(skip_suffixes: Vec<String>) -> Self {
        Self { skip_suffixes }
    }

    fn skipped(&self, name: &str) -> bool {
        self.skip_suffixes.iter().any(|s| name.ends_with(s.as_str()))
    }
}

impl Extractor for DeclarationExtractor {
    fn strategy(&self) -> Strategy {
        Strategy::Declaration
    }

    fn extract(&self, source: SourceText<'_>) -> Extraction {
        let text = source.contents;
        let lines = LineIndex::new(text);
        let mut out = Extraction::default();

        let declarations = INTERFACE
            .captures_iter(text)
            .chain(TYPE_ALIAS.captures_iter(text));

        for caps in declarations {
            let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            let name = name.as_str();
            if self.skipped(name) {
                continue;
            }
            let at = |offset: usize| Provenance::new(source.path, lines.line_of(offset));

            let open = whole.end() - 1;
            let Some((body_start, body)) = scan::block_at(text, open) else {
                out.warnings.push(Warning::at(
                    &at(whole.start()),
                    format!("unbalanced braces in declaration '{}'", name),
                ));
                continue;
            };

            if CONTAINER.is_match(body) {
                continue;
            }

            let members: Vec<(usize, scan::Member<'_>)> = scan::split_members(body)
                .into_iter()
                .filter_map(|(offset, text)| {
                    scan::parse_member(text).map(|m| (body_start + offset, m))
                })
                .collect();

            let columns: Vec<(usize, &str, TsType, bool)> = members
                .iter()
                .filter_map(|(offset, m)| {
                    let value = m.value?;
                    if is_function_type(value) {
                        return None;
                    }
                    Some((*offset, m.name, map_ts_type(value), m.optional))
                })
                .collect();

            if columns.is_empty() {
                continue;
            }
            let Some(table) = naming::declaration_table_name(name) else {
                continue;
            };

            out.facts.push(SchemaFact::table_ref(
                Strategy::Declaration,
                &table,
                at(whole.start()),
            ));
            for (offset, column, ts, optional) in columns {
                out.facts.push(
                    SchemaFact::column_ref(Strategy::Declaration, &table, column, at(offset))
                        .with_type(ts.sql_type)
                        .with_nullable(optional || ts.nullable),
                );
            }
        }

        out
    }
}

fn is_function_type(value: &str) -> bool {
    let depth0_arrow = value.starts_with('(') && value.contains("=>");
    depth0_arrow || value.starts_with("new ") || value.starts_with("Function")
}
