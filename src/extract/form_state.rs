//! Form and component-state extraction.
//!
//! The weakest strategy: field names seen in state initializers and form
//! registrations become untyped columns of the table suggested by the file's
//! path.
//!
//! ```text
//! app/payments/new.tsx:  useState({ amount: 0, note: '' })   -> payments.amount, payments.note
//!                        register('currency')                -> payments.currency
//! ```

use std::sync::LazyLock;

use regex::Regex;
use tracing::trace;

use super::scan::{self, LineIndex};
use super::{Extraction, Extractor, SourceText};
use crate::config::PathHint;
use crate::facts::{Provenance, SchemaFact, Strategy, Warning};

static STATE_INIT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\buseState\s*(?:<[^>]*>)?\s*\(\s*\{").expect("valid useState regex")
});

static DEFAULT_VALUES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bdefaultValues\s*:\s*\{").expect("valid defaultValues regex"));

static REGISTER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\bregister\s*\(\s*["'`]([^"'`]+)["'`]"#).expect("valid register regex")
});

/// Extracts untyped columns from component state and form registrations.
#[derive(Debug, Clone, Default)]
pub struct FormStateExtractor {
    hints: Vec<PathHint>,
}

impl FormStateExtractor {
    /// `hints` map path keywords to tables, checked in order.
    pub fn new(hints: Vec<PathHint>) -> Self {
        Self { hints }
    }

    /// Table suggested by a file path.
    ///
    /// Segments are checked from the file name back toward the root; within a
    /// segment, hints are checked in configured order. The first keyword
    /// contained in a segment wins.
    pub fn table_for_path(&self, path: &str) -> Option<&str> {
        path.rsplit('/').find_map(|segment| {
            let segment = segment.to_lowercase();
            self.hints
                .iter()
                .find(|hint| segment.contains(&hint.keyword.to_lowercase()))
                .map(|hint| hint.table.as_str())
        })
    }
}

impl Extractor for FormStateExtractor {
    fn strategy(&self) -> Strategy {
        Strategy::FormState
    }

    fn extract(&self, source: SourceText<'_>) -> Extraction {
        let mut out = Extraction::default();
        let Some(table) = self.table_for_path(source.path) else {
            trace!(file = source.path, "no table suggested by path");
            return out;
        };

        let text = source.contents;
        let lines = LineIndex::new(text);
        let at = |offset: usize| Provenance::new(source.path, lines.line_of(offset));

        for m in STATE_INIT.find_iter(text).chain(DEFAULT_VALUES.find_iter(text)) {
            let Some((body_start, body)) = scan::block_at(text, m.end() - 1) else {
                out.warnings
                    .push(Warning::at(&at(m.start()), "unbalanced braces in state initializer"));
                continue;
            };
            for (offset, member) in scan::split_members(body) {
                if let Some(member) = scan::parse_member(member) {
                    out.facts.push(SchemaFact::column_ref(
                        Strategy::FormState,
                        table,
                        member.name,
                        at(body_start + offset),
                    ));
                }
            }
        }

        for caps in REGISTER.captures_iter(text) {
            let Some(field) = caps.get(1) else {
                continue;
            };
            if scan::is_identifier(field.as_str()) {
                out.facts.push(SchemaFact::column_ref(
                    Strategy::FormState,
                    table,
                    field.as_str(),
                    at(field.start()),
                ));
            }
        }

        if !out.facts.is_empty() {
            out.facts.push(SchemaFact::table_ref(
                Strategy::FormState,
                table,
                Provenance::new(source.path, 1),
            ));
        }
        out
    }
}
