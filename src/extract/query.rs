//! Query-call extraction.
//!
//! Recognizes `<client>.from('table')` followed by a method chain:
//!
//! - `.select('a, b, alias:col, rel:users(name), users!author_id(*)')`
//! - `.insert({...})`, `.update({...})`, `.upsert({...})` payload keys
//! - `.eq('col', v)`, `.order('col')` and friends
//!
//! plus `leftJoin('table')`-style joins as bare table references.

use std::sync::LazyLock;

use regex::Regex;

use super::scan::{self, LineIndex};
use super::{Extraction, Extractor, SourceText};
use crate::facts::{Provenance, SchemaFact, Strategy, Warning};
use crate::sql::SqlType;

static FROM_CALL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?:([A-Za-z_$][\w$]*)\s*)?\.\s*from\(\s*(?:'([^'\n]+)'|"([^"\n]+)"|`([^`$\n]+)`)\s*\)"#,
    )
    .expect("valid from-call regex")
});

static JOIN_CALL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\.(?:leftJoin|rightJoin|innerJoin)\(\s*['"`]([A-Za-z_]\w*)['"`]"#)
        .expect("valid join regex")
});

static METHOD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_$][\w$]*").expect("valid method regex"));

static EMBEDDED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?s)^(?:([A-Za-z_]\w*)\s*:\s*)?([A-Za-z_]\w*)(?:\s*!\s*([A-Za-z_]\w*))?\s*\((.*)\)$",
    )
    .expect("valid embedded-resource regex")
});

/// Receivers whose `.from(...)` is not a table access.
const NON_TABLE_RECEIVERS: &[&str] = &[
    "Array",
    "Buffer",
    "Map",
    "Object",
    "Observable",
    "Promise",
    "Set",
    "String",
    "Uint8Array",
];

/// Chain methods whose first argument names a column.
const FILTER_METHODS: &[&str] = &[
    "containedBy",
    "contains",
    "eq",
    "gt",
    "gte",
    "ilike",
    "in",
    "is",
    "like",
    "lt",
    "lte",
    "neq",
    "order",
];

/// Embedding modifiers that are not foreign-key columns.
const JOIN_MODIFIERS: &[&str] = &["inner", "left"];

const AGGREGATES: &[&str] = &["avg", "count", "max", "min", "sum"];

/// Extracts facts from data-client query calls.
#[derive(Debug, Clone, Default)]
pub struct QueryExtractor;

impl QueryExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Extractor for QueryExtractor {
    fn strategy(&self) -> Strategy {
        Strategy::Query
    }

    fn extract(&self, source: SourceText<'_>) -> Extraction {
        let mut cx = Context {
            path: source.path,
            text: source.contents,
            lines: LineIndex::new(source.contents),
            out: Extraction::default(),
        };

        for caps in FROM_CALL.captures_iter(source.contents) {
            let receiver = caps.get(1).map(|m| m.as_str());
            if receiver.is_some_and(|r| NON_TABLE_RECEIVERS.contains(&r)) {
                continue;
            }
            let Some(name) = caps.get(2).or(caps.get(3)).or(caps.get(4)) else {
                continue;
            };
            let table = name.as_str().trim();
            if !scan::is_identifier(table) {
                continue;
            }

            cx.table_ref(table, name.start());
            let Some(call_end) = caps.get(0).map(|m| m.end()) else {
                continue;
            };
            cx.walk_chain(table, call_end);
        }

        for caps in JOIN_CALL.captures_iter(source.contents) {
            if let Some(name) = caps.get(1) {
                cx.table_ref(name.as_str(), name.start());
            }
        }

        cx.out
    }
}

struct Context<'a> {
    path: &'a str,
    text: &'a str,
    lines: LineIndex,
    out: Extraction,
}

impl<'a> Context<'a> {
    fn at(&self, offset: usize) -> Provenance {
        Provenance::new(self.path, self.lines.line_of(offset))
    }

    fn table_ref(&mut self, table: &str, offset: usize) {
        let fact = SchemaFact::table_ref(Strategy::Query, table, self.at(offset));
        self.out.facts.push(fact);
    }

    fn column_ref(&mut self, table: &str, column: &str, offset: usize) {
        let fact = SchemaFact::column_ref(Strategy::Query, table, column, self.at(offset));
        self.out.facts.push(fact);
    }

    /// Follow `.method(args)` calls after a `from(...)`.
    fn walk_chain(&mut self, table: &str, mut pos: usize) {
        let text = self.text;
        loop {
            pos = scan::skip_ws(text, pos);
            if !text[pos..].starts_with('.') {
                return;
            }
            let name_start = scan::skip_ws(text, pos + 1);
            let Some(method) = METHOD.find(&text[name_start..]) else {
                return;
            };
            let method = method.as_str();
            let open = scan::skip_ws(text, name_start + method.len());
            if !text[open..].starts_with('(') {
                return;
            }
            let Some(close) = scan::matching_close(text, open) else {
                let warning = Warning::at(
                    &self.at(open),
                    format!("unbalanced arguments to .{}() on '{}'", method, table),
                );
                self.out.warnings.push(warning);
                return;
            };

            let args_start = scan::skip_ws(text, open + 1);
            match method {
                "select" => {
                    if let Some(list) = scan::string_literal_at(text, args_start) {
                        self.select_list(table, list, args_start + 1);
                    }
                }
                "insert" | "update" | "upsert" => self.payload(table, args_start, close),
                m if FILTER_METHODS.contains(&m) => {
                    if let Some(column) = scan::string_literal_at(text, args_start) {
                        let column = strip_column_suffixes(column);
                        if scan::is_identifier(column) {
                            self.column_ref(table, column, args_start);
                        }
                    }
                }
                _ => {}
            }
            pos = close + 1;
        }
    }

    /// Object-literal payload keys become columns.
    fn payload(&mut self, table: &str, args_start: usize, close: usize) {
        let text = self.text;
        let mut open = args_start;
        if text[open..].starts_with('[') {
            match text[open..close].find('{') {
                Some(n) => open += n,
                None => return,
            }
        }
        if !text[open..].starts_with('{') {
            return;
        }
        let Some((inner_start, body)) = scan::block_at(text, open) else {
            return;
        };
        for (offset, member) in scan::split_members(body) {
            if let Some(m) = scan::parse_member(member) {
                self.column_ref(table, m.name, inner_start + offset);
            }
        }
    }

    /// Parse a select column list.
    fn select_list(&mut self, table: &str, list: &str, offset: usize) {
        for item in split_select(list) {
            let item = item.trim();
            if item.is_empty() || item == "*" {
                continue;
            }

            if let Some(caps) = EMBEDDED.captures(item) {
                let alias = caps.get(1).map(|m| m.as_str());
                let Some(related) = caps.get(2).map(|m| m.as_str()) else {
                    continue;
                };
                let fk = caps.get(3).map(|m| m.as_str());
                let inner = caps.get(4).map_or("", |m| m.as_str());

                if AGGREGATES.contains(&related) && inner.trim().is_empty() {
                    continue;
                }

                self.table_ref(related, offset);
                self.select_list(related, inner, offset);

                let local = fk.and_then(|hint| hinted_column(table, hint)).or(alias);
                if let Some(local) = local {
                    let at = self.at(offset);
                    self.out.facts.push(
                        SchemaFact::column_ref(Strategy::Query, table, local, at.clone())
                            .with_type(SqlType::Uuid),
                    );
                    self.out.facts.push(SchemaFact::relationship_hint(
                        Strategy::Query,
                        table,
                        local,
                        related,
                        "id",
                        at,
                    ));
                }
                continue;
            }

            // `alias:column` renames; the column is what exists.
            let column = match item.split_once(':') {
                Some((_, rest)) if !rest.starts_with(':') && !item.contains("::") => rest.trim(),
                _ => item,
            };
            let column = strip_column_suffixes(column);
            if scan::is_identifier(column) {
                self.column_ref(table, column, offset);
            }
        }
    }
}

/// Local column named by a `!hint`: either the column itself or a
/// `<table>_<column>_fkey` constraint name. Join modifiers name nothing.
fn hinted_column<'a>(table: &str, hint: &'a str) -> Option<&'a str> {
    if JOIN_MODIFIERS.contains(&hint) {
        return None;
    }
    let Some(constraint) = hint.strip_suffix("_fkey") else {
        return Some(hint);
    };
    constraint
        .strip_prefix(table)
        .and_then(|rest| rest.strip_prefix('_'))
        .filter(|column| !column.is_empty())
}

/// Drop `::cast` and `->json` path suffixes.
fn strip_column_suffixes(column: &str) -> &str {
    let column = column.split("::").next().unwrap_or(column);
    column.split("->").next().unwrap_or(column).trim()
}

/// Split a select list on top-level commas.
fn split_select(list: &str) -> Vec<&str> {
    let mut items = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, c) in list.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                items.push(&list[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    items.push(&list[start..]);
    items
}
