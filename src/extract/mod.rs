//! Fact extractors.
//!
//! Each extractor reads one file and emits zero or more [`SchemaFact`]s. They
//! are pure and order-independent: the full fact set of a scan is the union
//! of every extractor's output over every file, so files can be processed in
//! parallel and extractors can be added without touching the others.
//!
//! ```text
//!   LoadedFile ──┬── QueryExtractor        ─┐
//!                ├── DeclarationExtractor  ─┤
//!                ├── ValidationExtractor   ─┼──▶ sorted, deduplicated facts
//!                ├── GeneratedExtractor    ─┤
//!                └── FormStateExtractor    ─┘
//! ```

mod declaration;
mod form_state;
mod generated;
mod query;
pub mod scan;
mod validation;

pub use declaration::{map_ts_type, DeclarationExtractor, TsType};
pub use form_state::FormStateExtractor;
pub use generated::GeneratedExtractor;
pub use query::QueryExtractor;
pub use validation::ValidationExtractor;

use std::collections::BTreeSet;

use rayon::prelude::*;
use tracing::debug;

use crate::config::ModelSettings;
use crate::facts::{SchemaFact, Strategy, Warning};
use crate::locator::LoadedFile;

/// One file's text, as seen by an extractor.
#[derive(Debug, Clone, Copy)]
pub struct SourceText<'a> {
    /// Path relative to the project root, `/`-separated.
    pub path: &'a str,
    pub contents: &'a str,
}

impl<'a> SourceText<'a> {
    pub fn new(path: &'a str, contents: &'a str) -> Self {
        Self { path, contents }
    }
}

/// Output of running extractors.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Extraction {
    pub facts: Vec<SchemaFact>,
    pub warnings: Vec<Warning>,
}

impl Extraction {
    pub fn is_empty(&self) -> bool {
        self.facts.is_empty() && self.warnings.is_empty()
    }

    /// Set union of two extractions. Output is sorted and deduplicated.
    pub fn union(self, other: Extraction) -> Extraction {
        let facts: BTreeSet<SchemaFact> = self.facts.into_iter().chain(other.facts).collect();
        let warnings: BTreeSet<Warning> =
            self.warnings.into_iter().chain(other.warnings).collect();
        Extraction {
            facts: facts.into_iter().collect(),
            warnings: warnings.into_iter().collect(),
        }
    }
}

/// A pattern-driven fact extraction strategy.
pub trait Extractor: Send + Sync {
    /// Strategy tag stamped on every fact this extractor emits.
    fn strategy(&self) -> Strategy;

    /// Extract facts from one file. Must not have side effects.
    fn extract(&self, source: SourceText<'_>) -> Extraction;
}

/// An open set of extractors applied to every file.
pub struct ExtractorSet {
    extractors: Vec<Box<dyn Extractor>>,
}

impl ExtractorSet {
    /// An empty set.
    pub fn empty() -> Self {
        Self {
            extractors: Vec::new(),
        }
    }

    /// The five built-in strategies, configured from model settings.
    pub fn standard(settings: &ModelSettings) -> Self {
        Self::empty()
            .with(QueryExtractor::new())
            .with(DeclarationExtractor::new(
                settings.declaration_skip_suffixes.clone(),
            ))
            .with(ValidationExtractor::new())
            .with(GeneratedExtractor::new())
            .with(FormStateExtractor::new(settings.path_hints.clone()))
    }

    /// Add an extractor.
    pub fn with(mut self, extractor: impl Extractor + 'static) -> Self {
        self.extractors.push(Box::new(extractor));
        self
    }

    pub fn len(&self) -> usize {
        self.extractors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.extractors.is_empty()
    }

    /// Run every extractor over one file.
    pub fn extract_file(&self, source: SourceText<'_>) -> Extraction {
        self.extractors
            .iter()
            .map(|e| e.extract(source))
            .fold(Extraction::default(), Extraction::union)
    }

    /// Run every extractor over every file, in parallel.
    pub fn extract_all(&self, files: &[LoadedFile]) -> Extraction {
        let extraction = files
            .par_iter()
            .map(|f| self.extract_file(SourceText::new(&f.file.relative, &f.contents)))
            .reduce(Extraction::default, Extraction::union);

        debug!(
            files = files.len(),
            facts = extraction.facts.len(),
            warnings = extraction.warnings.len(),
            "extraction complete"
        );
        extraction
    }
}

impl std::fmt::Debug for ExtractorSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let strategies: Vec<Strategy> = self.extractors.iter().map(|e| e.strategy()).collect();
        f.debug_struct("ExtractorSet")
            .field("strategies", &strategies)
            .finish()
    }
}
