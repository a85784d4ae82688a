//! Canonical schema model.
//!
//! Everything is keyed by name in `BTreeMap`s and every list is kept sorted,
//! so two models built from the same facts serialize identically.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::Category;
use crate::sql::{ReferentialAction, SqlType};

/// Names of the columns every table carries.
pub const ID_COLUMN: &str = "id";
pub const CREATED_AT_COLUMN: &str = "created_at";
pub const UPDATED_AT_COLUMN: &str = "updated_at";

/// A column of a canonical table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    #[serde(rename = "type")]
    pub sql_type: SqlType,
    pub nullable: bool,
    /// Default expression, rendered verbatim.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub unique: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub references: Option<ColumnTarget>,
    /// Files that mentioned this column. Empty for injected columns.
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub sources: BTreeSet<String>,
}

impl Column {
    pub fn new(name: impl Into<String>, sql_type: SqlType) -> Self {
        Self {
            name: name.into(),
            sql_type,
            nullable: true,
            default: None,
            unique: false,
            references: None,
            sources: BTreeSet::new(),
        }
    }

    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    pub fn with_default(mut self, expr: impl Into<String>) -> Self {
        self.default = Some(expr.into());
        self
    }
}

/// `table.column` target of a reference.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ColumnTarget {
    pub table: String,
    pub column: String,
}

/// How a relationship was established.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelationshipOrigin {
    /// An extractor observed the reference.
    Explicit,
    /// Inferred from the column name.
    Convention,
}

/// A foreign-key relationship from one column of a table.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Relationship {
    pub from_column: String,
    pub to_table: String,
    pub to_column: String,
    pub on_delete: ReferentialAction,
    pub origin: RelationshipOrigin,
}

impl Relationship {
    /// Conventional constraint name, `fk_<table>_<column>`.
    pub fn constraint_name(&self, table: &str) -> String {
        format!("fk_{}_{}", table, self.from_column.to_lowercase())
    }
}

/// A secondary index.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Index {
    pub name: String,
    pub columns: Vec<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub unique: bool,
}

/// A canonical table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    pub name: String,
    pub category: Category,
    pub columns: BTreeMap<String, Column>,
    /// Sorted by source column.
    #[serde(default)]
    pub relationships: Vec<Relationship>,
    /// Sorted by name.
    #[serde(default)]
    pub indexes: Vec<Index>,
    /// Files that contributed any fact about this table.
    #[serde(default)]
    pub sources: BTreeSet<String>,
}

impl Table {
    pub fn new(name: impl Into<String>, category: Category) -> Self {
        Self {
            name: name.into(),
            category,
            columns: BTreeMap::new(),
            relationships: Vec::new(),
            indexes: Vec::new(),
            sources: BTreeSet::new(),
        }
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.get(name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    /// Columns in DDL order: `id`, the rest by name, then `created_at`,
    /// `updated_at`.
    pub fn ordered_columns(&self) -> Vec<&Column> {
        let trailing = [CREATED_AT_COLUMN, UPDATED_AT_COLUMN];
        let mut ordered: Vec<&Column> = self.columns.get(ID_COLUMN).into_iter().collect();
        ordered.extend(
            self.columns
                .values()
                .filter(|c| c.name != ID_COLUMN && !trailing.contains(&c.name.as_str())),
        );
        ordered.extend(trailing.iter().filter_map(|name| self.columns.get(*name)));
        ordered
    }

    pub fn relationship_for(&self, column: &str) -> Option<&Relationship> {
        self.relationships.iter().find(|r| r.from_column == column)
    }
}

/// The canonical model: every table of a scan, keyed by name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Model {
    pub tables: BTreeMap<String, Table>,
}

impl Model {
    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tables.contains_key(name)
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    pub fn column_count(&self) -> usize {
        self.tables.values().map(|t| t.columns.len()).sum()
    }

    pub fn relationship_count(&self) -> usize {
        self.tables.values().map(|t| t.relationships.len()).sum()
    }

    /// Tables in schema order: by category, then by name.
    pub fn tables_in_order(&self) -> Vec<&Table> {
        let mut tables: Vec<&Table> = self.tables.values().collect();
        tables.sort_by(|a, b| (a.category, &a.name).cmp(&(b.category, &b.name)));
        tables
    }

    /// Tables grouped by category, in category order. Empty groups omitted.
    pub fn by_category(&self) -> Vec<(Category, Vec<&Table>)> {
        Category::ALL
            .iter()
            .filter_map(|category| {
                let tables: Vec<&Table> = self
                    .tables
                    .values()
                    .filter(|t| t.category == *category)
                    .collect();
                (!tables.is_empty()).then_some((*category, tables))
            })
            .collect()
    }
}
