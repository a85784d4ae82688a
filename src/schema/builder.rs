//! Model builder: merges facts into the canonical model.
//!
//! Facts are first folded into per-column evidence with commutative rules
//! (max, logical or, set union), so the result never depends on fact order.
//! The canonical tables are then derived from the evidence in one pass:
//!
//! 1. merge column evidence (sticky type, sticky nullability)
//! 2. inject the tenant column into configured multi-tenant tables
//! 3. inject `id`, `created_at`, `updated_at`
//! 4. resolve relationships (explicit hints first, then naming convention)
//! 5. derive indexes and categories

use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, trace};

use super::model::{
    Column, ColumnTarget, Index, Model, Relationship, RelationshipOrigin, Table,
    CREATED_AT_COLUMN, ID_COLUMN, UPDATED_AT_COLUMN,
};
use super::Category;
use crate::config::ModelSettings;
use crate::facts::{FactKind, SchemaFact, Strategy};
use crate::naming;
use crate::sql::{ReferentialAction, SqlType};

/// Default expression for generated primary keys.
pub const UUID_DEFAULT: &str = "uuid_generate_v4()";

/// Default expression for timestamp columns.
pub const NOW_DEFAULT: &str = "NOW()";

/// Accumulated evidence about one column.
#[derive(Debug, Default)]
struct ColumnEvidence {
    /// Most authoritative specific type seen.
    best_type: Option<(Strategy, SqlType)>,
    seen_nullable: bool,
    stated_nullability: bool,
    sources: BTreeSet<String>,
}

impl ColumnEvidence {
    fn observe(&mut self, fact: &SchemaFact) {
        if let Some(ty) = fact.sql_type.as_ref().filter(|t| t.is_known()) {
            let candidate = (fact.strategy, ty.clone());
            if self.best_type.as_ref().map_or(true, |best| candidate > *best) {
                self.best_type = Some(candidate);
            }
        }
        if let Some(nullable) = fact.nullable {
            self.stated_nullability = true;
            self.seen_nullable |= nullable;
        }
        self.sources.insert(fact.source.file.clone());
    }

    fn into_column(self, name: &str) -> Column {
        let mut column = Column::new(
            name,
            self.best_type.map_or(SqlType::Unknown, |(_, ty)| ty),
        );
        column.nullable = self.seen_nullable || !self.stated_nullability;
        column.sources = self.sources;
        column
    }
}

/// Evidence about one table.
#[derive(Debug, Default)]
struct TableEvidence {
    columns: BTreeMap<String, ColumnEvidence>,
    /// column → strongest explicit target.
    hints: BTreeMap<String, (Strategy, ColumnTarget)>,
    sources: BTreeSet<String>,
}

/// Builds a [`Model`] from schema facts.
#[derive(Debug, Clone)]
pub struct ModelBuilder<'a> {
    settings: &'a ModelSettings,
}

impl<'a> ModelBuilder<'a> {
    pub fn new(settings: &'a ModelSettings) -> Self {
        Self { settings }
    }

    /// Merge `facts` into a canonical model.
    ///
    /// Deterministic for a given fact multiset, regardless of order.
    pub fn build(&self, facts: &[SchemaFact]) -> Model {
        let evidence = self.collect(facts);

        let mut model = Model::default();
        for (name, table_evidence) in evidence {
            let table = self.build_table(&name, table_evidence);
            model.tables.insert(name, table);
        }

        debug!(
            tables = model.tables.len(),
            columns = model.column_count(),
            relationships = model.relationship_count(),
            "model built"
        );
        model
    }

    fn collect(&self, facts: &[SchemaFact]) -> BTreeMap<String, TableEvidence> {
        let mut tables: BTreeMap<String, TableEvidence> = BTreeMap::new();

        for fact in facts {
            let Some(table_name) = naming::normalize_table_name(&fact.table) else {
                trace!(table = %fact.table, "skipping fact with unusable table name");
                continue;
            };
            let table = tables.entry(table_name).or_default();
            table.sources.insert(fact.source.file.clone());

            let Some(column) = fact.column.as_deref().map(str::trim).filter(|c| !c.is_empty())
            else {
                continue;
            };
            table
                .columns
                .entry(column.to_string())
                .or_default()
                .observe(fact);

            if fact.kind != FactKind::RelationshipHint {
                continue;
            }
            let Some(target) = fact
                .referenced_table
                .as_deref()
                .and_then(naming::normalize_table_name)
            else {
                continue;
            };
            let candidate = (
                fact.strategy,
                ColumnTarget {
                    table: target,
                    column: fact
                        .referenced_column
                        .clone()
                        .unwrap_or_else(|| ID_COLUMN.to_string()),
                },
            );
            let hints = &mut table.hints;
            match hints.get(column) {
                Some(existing) if *existing >= candidate => {}
                _ => {
                    hints.insert(column.to_string(), candidate);
                }
            }
        }

        tables
    }

    fn build_table(&self, name: &str, evidence: TableEvidence) -> Table {
        let category = self
            .settings
            .categories
            .get(name)
            .copied()
            .unwrap_or_else(|| Category::infer(name));

        let mut table = Table::new(name, category);
        table.sources = evidence.sources;
        table.columns = evidence
            .columns
            .into_iter()
            .map(|(column, ev)| {
                let built = ev.into_column(&column);
                (column, built)
            })
            .collect();

        if self.settings.multi_tenant_tables.iter().any(|t| t == name) {
            table
                .columns
                .entry(self.settings.tenant_column.clone())
                .or_insert_with(|| Column::new(&self.settings.tenant_column, SqlType::Uuid));
        }

        inject_common_columns(&mut table);
        self.resolve_relationships(&mut table, &evidence.hints);
        table.indexes = self.indexes(&table);
        table
    }

    fn resolve_relationships(
        &self,
        table: &mut Table,
        hints: &BTreeMap<String, (Strategy, ColumnTarget)>,
    ) {
        let mut relationships = Vec::new();

        for column in table.columns.values_mut() {
            let (target, origin) = if let Some((_, target)) = hints.get(&column.name) {
                (target.clone(), RelationshipOrigin::Explicit)
            } else {
                let Some(inferred) = naming::reference_target(&column.name) else {
                    continue;
                };
                if inferred == table.name {
                    continue;
                }
                let target = ColumnTarget {
                    table: inferred,
                    column: ID_COLUMN.to_string(),
                };
                (target, RelationshipOrigin::Convention)
            };

            if matches!(column.sql_type, SqlType::Unknown | SqlType::Text) {
                column.sql_type = SqlType::Uuid;
            }
            relationships.push(Relationship {
                from_column: column.name.clone(),
                to_table: target.table.clone(),
                to_column: target.column.clone(),
                on_delete: ReferentialAction::Cascade,
                origin,
            });
            column.references = Some(target);
        }

        relationships.sort();
        table.relationships = relationships;
    }

    fn indexes(&self, table: &Table) -> Vec<Index> {
        let mut columns: BTreeSet<&str> = table
            .relationships
            .iter()
            .map(|r| r.from_column.as_str())
            .collect();
        for name in [
            CREATED_AT_COLUMN,
            self.settings.tenant_column.as_str(),
            self.settings.owner_column.as_str(),
        ] {
            if table.has_column(name) {
                columns.insert(name);
            }
        }

        let mut indexes: Vec<Index> = columns
            .into_iter()
            .map(|column| Index {
                name: format!("idx_{}_{}", table.name, column.to_lowercase()),
                columns: vec![column.to_string()],
                unique: false,
            })
            .collect();
        indexes.sort();
        indexes.dedup_by(|a, b| a.name == b.name);
        indexes
    }
}

/// Ensure `id`, `created_at`, `updated_at` exist with their canonical shape.
fn inject_common_columns(table: &mut Table) {
    let id = table
        .columns
        .entry(ID_COLUMN.to_string())
        .or_insert_with(|| Column::new(ID_COLUMN, SqlType::Uuid));
    id.sql_type = SqlType::Uuid;
    id.nullable = false;
    id.default = Some(UUID_DEFAULT.to_string());

    for name in [CREATED_AT_COLUMN, UPDATED_AT_COLUMN] {
        let column = table.columns.entry(name.to_string()).or_insert_with(|| {
            Column::new(name, SqlType::Timestamp)
                .not_null()
                .with_default(NOW_DEFAULT)
        });
        if matches!(column.sql_type, SqlType::Unknown | SqlType::Text) {
            column.sql_type = SqlType::Timestamp;
        }
        if column.sql_type == SqlType::Timestamp && column.default.is_none() {
            column.default = Some(NOW_DEFAULT.to_string());
        }
    }
}

/// Build a model with the given settings.
pub fn build_model(settings: &ModelSettings, facts: &[SchemaFact]) -> Model {
    ModelBuilder::new(settings).build(facts)
}
