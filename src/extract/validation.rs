//! Validation-schema extraction.
//!
//! Recognizes builder-style schema declarations such as
//!
//! ```text
//! export const paymentSchema = z.object({
//!   amount: z.number().int(),
//!   note: z.string().optional(),
//! })
//! ```
//!
//! The variable name minus its `Schema` suffix names the table. Each field
//! whose value is a validator call becomes a column; a field is nullable
//! unless its chain marks it required.

use std::sync::LazyLock;

use regex::Regex;

use super::scan::{self, LineIndex};
use super::{Extraction, Extractor, SourceText};
use crate::facts::{Provenance, SchemaFact, Strategy, Warning};
use crate::naming;
use crate::sql::SqlType;

static SCHEMA_DECL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\b([A-Za-z_$][\w$]*?)Schema\s*=\s*(?:[A-Za-z_$][\w$]*\s*\.\s*)?object\s*\(\s*(?:\)\s*\.\s*shape\s*\(\s*)?\{",
    )
    .expect("valid schema declaration regex")
});

/// Leading validator of a field: `z.string(`, `yup.number(`, `z.coerce.date(`, `string(`.
static BASE_VALIDATOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:[A-Za-z_$][\w$]*\s*\.\s*)*?([A-Za-z]+)\s*\(").expect("valid validator regex")
});

static CHAIN_CALL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\.\s*([A-Za-z]+)\s*\(").expect("valid chain regex"));

/// Extracts columns from object-schema validator declarations.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidationExtractor;

impl ValidationExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Extractor for ValidationExtractor {
    fn strategy(&self) -> Strategy {
        Strategy::Validation
    }

    fn extract(&self, source: SourceText<'_>) -> Extraction {
        let text = source.contents;
        let lines = LineIndex::new(text);
        let mut out = Extraction::default();

        for caps in SCHEMA_DECL.captures_iter(text) {
            let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            let at = |offset: usize| Provenance::new(source.path, lines.line_of(offset));

            let Some((body_start, body)) = scan::block_at(text, whole.end() - 1) else {
                out.warnings.push(Warning::at(
                    &at(whole.start()),
                    format!("unbalanced braces in schema '{}Schema'", name.as_str()),
                ));
                continue;
            };
            let Some(table) = naming::normalize_table_name(name.as_str()) else {
                continue;
            };

            let mut columns = Vec::new();
            for (offset, member) in scan::split_members(body) {
                let Some(member) = scan::parse_member(member) else {
                    continue;
                };
                let Some(field) = member.value.and_then(field_type) else {
                    continue;
                };
                columns.push(
                    SchemaFact::column_ref(
                        Strategy::Validation,
                        &table,
                        member.name,
                        at(body_start + offset),
                    )
                    .with_type(field.sql_type)
                    .with_nullable(!field.required),
                );
            }

            if columns.is_empty() {
                continue;
            }
            out.facts.push(SchemaFact::table_ref(
                Strategy::Validation,
                &table,
                at(whole.start()),
            ));
            out.facts.extend(columns);
        }

        out
    }
}

struct Field {
    sql_type: SqlType,
    required: bool,
}

/// Type and requiredness of a validator chain, or `None` if `value` is not one.
fn field_type(value: &str) -> Option<Field> {
    let base = BASE_VALIDATOR.captures(value)?.get(1)?;
    let mut sql_type = base_type(base.as_str());
    let mut required = false;

    for call in CHAIN_CALL.captures_iter(&value[base.end()..]) {
        match call.get(1).map(|m| m.as_str()) {
            Some("required") => required = true,
            Some("uuid") if sql_type == SqlType::Text => sql_type = SqlType::Uuid,
            Some("datetime") if sql_type == SqlType::Text => sql_type = SqlType::Timestamp,
            Some("date") if sql_type == SqlType::Text => sql_type = SqlType::Date,
            _ => {}
        }
    }

    Some(Field { sql_type, required })
}

fn base_type(validator: &str) -> SqlType {
    match validator {
        "string" | "literal" | "enum" | "nativeEnum" | "email" | "url" => SqlType::Text,
        "number" | "integer" => SqlType::Integer,
        "bigint" => SqlType::BigInt,
        "boolean" | "bool" => SqlType::Boolean,
        "date" => SqlType::Timestamp,
        "uuid" => SqlType::Uuid,
        "array" | "object" | "record" | "tuple" | "mixed" => SqlType::Jsonb,
        _ => SqlType::Unknown,
    }
}
