//! Schema facts: atomic, provenance-tagged observations about tables,
//! columns, and relationships.
//!
//! Facts are produced by extractors and consumed by the model builder. They
//! are plain values; the builder never mutates a fact, it only merges them.
//! Table names inside a fact are recorded as observed and normalized later,
//! so that extractors stay independent of the naming rules.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::sql::SqlType;

/// What a fact asserts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FactKind {
    /// A table exists.
    TableRef,
    /// A table has a column.
    ColumnRef,
    /// A column references another table.
    RelationshipHint,
}

/// The extraction strategy that produced a fact.
///
/// Variant order is authority order, weakest first: when two strategies give
/// a column different specific types, the more authoritative one wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    FormState,
    Query,
    Validation,
    Declaration,
    Generated,
}

impl Strategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::FormState => "form_state",
            Strategy::Query => "query",
            Strategy::Validation => "validation",
            Strategy::Declaration => "declaration",
            Strategy::Generated => "generated",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a fact was observed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Provenance {
    /// Path relative to the project root, `/`-separated.
    pub file: String,
    /// 1-based line number.
    pub line: usize,
}

impl Provenance {
    pub fn new(file: impl Into<String>, line: usize) -> Self {
        Self {
            file: file.into(),
            line,
        }
    }
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.line)
    }
}

/// A single schema observation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SchemaFact {
    pub kind: FactKind,
    /// Table identifier as written in the source.
    pub table: String,
    pub column: Option<String>,
    pub sql_type: Option<SqlType>,
    /// `None` when the source says nothing about nullability.
    pub nullable: Option<bool>,
    pub referenced_table: Option<String>,
    pub referenced_column: Option<String>,
    pub strategy: Strategy,
    pub source: Provenance,
}

impl SchemaFact {
    fn new(kind: FactKind, strategy: Strategy, table: impl Into<String>, source: Provenance) -> Self {
        Self {
            kind,
            table: table.into(),
            column: None,
            sql_type: None,
            nullable: None,
            referenced_table: None,
            referenced_column: None,
            strategy,
            source,
        }
    }

    /// A table was referenced.
    pub fn table_ref(strategy: Strategy, table: impl Into<String>, source: Provenance) -> Self {
        Self::new(FactKind::TableRef, strategy, table, source)
    }

    /// A column of `table` was referenced.
    pub fn column_ref(
        strategy: Strategy,
        table: impl Into<String>,
        column: impl Into<String>,
        source: Provenance,
    ) -> Self {
        let mut fact = Self::new(FactKind::ColumnRef, strategy, table, source);
        fact.column = Some(column.into());
        fact
    }

    /// `table.column` references `referenced_table.referenced_column`.
    pub fn relationship_hint(
        strategy: Strategy,
        table: impl Into<String>,
        column: impl Into<String>,
        referenced_table: impl Into<String>,
        referenced_column: impl Into<String>,
        source: Provenance,
    ) -> Self {
        let mut fact = Self::new(FactKind::RelationshipHint, strategy, table, source);
        fact.column = Some(column.into());
        fact.referenced_table = Some(referenced_table.into());
        fact.referenced_column = Some(referenced_column.into());
        fact
    }

    /// Attach an inferred type.
    pub fn with_type(mut self, sql_type: SqlType) -> Self {
        self.sql_type = Some(sql_type);
        self
    }

    /// Attach observed nullability.
    pub fn with_nullable(mut self, nullable: bool) -> Self {
        self.nullable = Some(nullable);
        self
    }
}

/// A non-fatal problem found while scanning.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Warning {
    pub file: Option<String>,
    pub line: Option<usize>,
    pub message: String,
}

impl Warning {
    /// A warning about a whole file.
    pub fn file(file: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            file: Some(file.into()),
            line: None,
            message: message.into(),
        }
    }

    /// A warning with no file attached.
    pub fn general(message: impl Into<String>) -> Self {
        Self {
            file: None,
            line: None,
            message: message.into(),
        }
    }

    /// A warning pointing at a source location.
    pub fn at(source: &Provenance, message: impl Into<String>) -> Self {
        Self {
            file: Some(source.file.clone()),
            line: Some(source.line),
            message: message.into(),
        }
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.file, self.line) {
            (Some(file), Some(line)) => write!(f, "{}:{}: {}", file, line, self.message),
            (Some(file), None) => write!(f, "{}: {}", file, self.message),
            _ => f.write_str(&self.message),
        }
    }
}
