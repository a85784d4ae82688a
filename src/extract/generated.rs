//! Generated database type extraction.
//!
//! Reads the type files emitted by database tooling:
//!
//! ```text
//! Tables: {
//!   prayers: {
//!     Row: { id: string; title: string | null }
//!     Insert: { ... }
//!     Relationships: [
//!       { columns: ["user_id"]; referencedRelation: "users"; referencedColumns: ["id"] }
//!     ]
//!   }
//! }
//! ```
//!
//! `Row` members become columns, nullable exactly when their type admits
//! `null`. `Relationships` entries become explicit relationship hints.

use std::sync::LazyLock;

use regex::Regex;

use super::declaration::map_ts_type;
use super::scan::{self, LineIndex};
use super::{Extraction, Extractor, SourceText};
use crate::facts::{Provenance, SchemaFact, Strategy, Warning};

static TABLES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bTables\s*:\s*\{").expect("valid tables regex"));

static REL_COLUMNS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\bcolumns\s*:\s*\[\s*["']([\w$]+)["']"#).expect("valid columns regex")
});

static REL_TABLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\breferencedRelation\s*:\s*["']([\w$]+)["']"#).expect("valid relation regex")
});

static REL_REF_COLUMNS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\breferencedColumns\s*:\s*\[\s*["']([\w$]+)["']"#)
        .expect("valid referenced columns regex")
});

/// Extracts tables, columns, and relationships from generated `Tables` types.
#[derive(Debug, Clone, Copy, Default)]
pub struct GeneratedExtractor;

impl GeneratedExtractor {
    pub fn new() -> Self {
        Self
    }
}

struct Context<'a> {
    text: &'a str,
    path: &'a str,
    lines: LineIndex,
    out: Extraction,
}

impl<'a> Context<'a> {
    fn at(&self, piece: &str) -> Provenance {
        let offset = scan::offset_of(self.text, piece);
        Provenance::new(self.path, self.lines.line_of(offset))
    }

    fn table(&mut self, name: &'a str, definition: &'a str) {
        let Some(body) = object_body(definition) else {
            return;
        };
        let source = self.at(definition);
        self.out
            .facts
            .push(SchemaFact::table_ref(Strategy::Generated, name, source));

        for (_, member) in scan::split_members(body) {
            let Some(member) = scan::parse_member(member) else {
                continue;
            };
            match (member.name, member.value) {
                ("Row", Some(row)) => self.row(name, row),
                ("Relationships", Some(rels)) => self.relationships(name, rels),
                _ => {}
            }
        }
    }

    fn row(&mut self, table: &str, row: &'a str) {
        let Some(body) = object_body(row) else {
            return;
        };
        for (_, member) in scan::split_members(body) {
            let Some(parsed) = scan::parse_member(member) else {
                continue;
            };
            let Some(value) = parsed.value else {
                continue;
            };
            let ts = map_ts_type(value);
            let source = self.at(member);
            self.out.facts.push(
                SchemaFact::column_ref(Strategy::Generated, table, parsed.name, source)
                    .with_type(ts.sql_type)
                    .with_nullable(ts.nullable),
            );
        }
    }

    fn relationships(&mut self, table: &str, rels: &'a str) {
        let mut i = 0;
        while let Some(n) = rels[i..].find('{') {
            let open = i + n;
            let Some(close) = scan::matching_close(rels, open) else {
                let source = self.at(&rels[open..]);
                self.out.warnings.push(Warning::at(
                    &source,
                    format!("unbalanced relationship entry for '{}'", table),
                ));
                return;
            };
            let entry = &rels[open..=close];
            if let (Some(column), Some(target)) = (
                first_capture(&REL_COLUMNS, entry),
                first_capture(&REL_TABLE, entry),
            ) {
                let referenced = first_capture(&REL_REF_COLUMNS, entry).unwrap_or("id");
                let source = self.at(entry);
                self.out.facts.push(SchemaFact::relationship_hint(
                    Strategy::Generated,
                    table,
                    column,
                    target,
                    referenced,
                    source,
                ));
            }
            i = close + 1;
        }
    }
}

fn first_capture<'t>(re: &Regex, text: &'t str) -> Option<&'t str> {
    re.captures(text).and_then(|c| c.get(1)).map(|m| m.as_str())
}

/// Inner text of a `{ ... }` value.
fn object_body(value: &str) -> Option<&str> {
    let value = value.trim();
    if !value.starts_with('{') {
        return None;
    }
    scan::block_at(value, 0).map(|(_, body)| body)
}

impl Extractor for GeneratedExtractor {
    fn strategy(&self) -> Strategy {
        Strategy::Generated
    }

    fn extract(&self, source: SourceText<'_>) -> Extraction {
        let text = source.contents;
        let mut cx = Context {
            text,
            path: source.path,
            lines: LineIndex::new(text),
            out: Extraction::default(),
        };

        for m in TABLES.find_iter(text) {
            let Some((_, body)) = scan::block_at(text, m.end() - 1) else {
                let source = cx.at(&text[m.start()..]);
                cx.out
                    .warnings
                    .push(Warning::at(&source, "unbalanced braces in generated Tables block"));
                continue;
            };
            for (_, member) in scan::split_members(body) {
                let Some(parsed) = scan::parse_member(member) else {
                    continue;
                };
                if let Some(definition) = parsed.value {
                    cx.table(parsed.name, definition);
                }
            }
        }

        cx.out
    }
}
