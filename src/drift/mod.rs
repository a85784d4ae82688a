//! Drift detection between the last snapshot and the current model.
//!
//! Only additions and removals of tables and columns are detected. A column
//! whose type or nullability changed is the same column by name, so it
//! produces no drift.

mod snapshot;

pub use snapshot::{
    fingerprint, Snapshot, SnapshotError, SnapshotResult, SNAPSHOT_FILE_NAME, SNAPSHOT_VERSION,
};

use std::collections::BTreeSet;

use serde::Serialize;
use tracing::debug;

use crate::schema::{Model, Table};
use crate::sql::{AlterTable, DdlStatement, DropTable};
use crate::synth::{column_def, create_index, Section, Script, Synthesizer};

/// `table.column` named by a drift entry.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct ColumnChange {
    pub table: String,
    pub column: String,
}

impl ColumnChange {
    fn new(table: &str, column: &str) -> Self {
        Self {
            table: table.to_string(),
            column: column.to_string(),
        }
    }
}

/// Name-level differences between two models. Every list is sorted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Drift {
    pub added_tables: Vec<String>,
    pub removed_tables: Vec<String>,
    /// Columns new to a table present in both models.
    pub added_columns: Vec<ColumnChange>,
    /// Columns gone from a table present in both models.
    pub removed_columns: Vec<ColumnChange>,
}

impl Drift {
    pub fn is_empty(&self) -> bool {
        self.added_tables.is_empty()
            && self.removed_tables.is_empty()
            && self.added_columns.is_empty()
            && self.removed_columns.is_empty()
    }

    pub fn change_count(&self) -> usize {
        self.added_tables.len()
            + self.removed_tables.len()
            + self.added_columns.len()
            + self.removed_columns.len()
    }
}

/// Compare two models by table and column name.
pub fn diff(previous: &Model, current: &Model) -> Drift {
    let before: BTreeSet<&String> = previous.tables.keys().collect();
    let after: BTreeSet<&String> = current.tables.keys().collect();

    let mut drift = Drift {
        added_tables: after.difference(&before).map(|t| t.to_string()).collect(),
        removed_tables: before.difference(&after).map(|t| t.to_string()).collect(),
        ..Drift::default()
    };

    for name in before.intersection(&after) {
        let old = &previous.tables[*name];
        let new = &current.tables[*name];
        drift.added_columns.extend(
            new.columns
                .keys()
                .filter(|c| !old.columns.contains_key(*c))
                .map(|c| ColumnChange::new(name, c)),
        );
        drift.removed_columns.extend(
            old.columns
                .keys()
                .filter(|c| !new.columns.contains_key(*c))
                .map(|c| ColumnChange::new(name, c)),
        );
    }

    debug!(
        added_tables = drift.added_tables.len(),
        removed_tables = drift.removed_tables.len(),
        added_columns = drift.added_columns.len(),
        removed_columns = drift.removed_columns.len(),
        "drift computed"
    );
    drift
}

/// Statements that take a database matching `previous` to `current`.
///
/// Section order: added tables (with everything the full schema would emit
/// for them), added columns, foreign keys whose target table just appeared,
/// removed columns, removed tables. No drift yields an empty script.
pub fn incremental(synth: &Synthesizer<'_>, previous: &Model, current: &Model) -> Script {
    let drift = diff(previous, current);
    let mut script = Script::default();
    if drift.is_empty() {
        return script;
    }

    let mut added: Vec<&Table> = drift
        .added_tables
        .iter()
        .filter_map(|name| current.table(name))
        .collect();
    added.sort_by(|a, b| (a.category, &a.name).cmp(&(b.category, &b.name)));
    for section in synth.table_sections(&added, current) {
        script.push(section);
    }

    let mut columns = Section::new("Added columns");
    for change in &drift.added_columns {
        let table = &current.tables[&change.table];
        let Some(column) = table.column(&change.column) else {
            continue;
        };
        let mut group: Vec<DdlStatement> =
            vec![AlterTable::add_column(&table.name, column_def(column)).into()];
        if let Some(rel) = table.relationship_for(&column.name) {
            group.extend(synth.foreign_key(table, rel, current));
        }
        group.extend(
            table
                .indexes
                .iter()
                .filter(|index| index.columns == [column.name.as_str()])
                .map(|index| create_index(table, index).into()),
        );
        columns.push_group(group);
    }
    script.push(columns);

    script.push(resolved_foreign_keys(synth, previous, current, &drift));

    let mut dropped_columns = Section::new("Removed columns");
    for change in &drift.removed_columns {
        dropped_columns.push_group(vec![
            AlterTable::drop_column(&change.table, &change.column).into()
        ]);
    }
    script.push(dropped_columns);

    let mut dropped_tables = Section::new("Removed tables");
    dropped_tables.push_group(
        drift
            .removed_tables
            .iter()
            .map(|name| DropTable::new(name).if_exists().cascade().into())
            .collect(),
    );
    script.push(dropped_tables);

    debug!(statements = script.statement_count(), "incremental migration synthesized");
    script
}

/// Constraints for unchanged columns of surviving tables whose target table
/// was missing from `previous` and exists in `current`.
fn resolved_foreign_keys(
    synth: &Synthesizer<'_>,
    previous: &Model,
    current: &Model,
    drift: &Drift,
) -> Section {
    let mut section = Section::new("Foreign keys to added tables");
    let added_columns: BTreeSet<&ColumnChange> = drift.added_columns.iter().collect();

    for (name, table) in &current.tables {
        if !previous.contains(name) {
            continue;
        }
        let statements: Vec<DdlStatement> = table
            .relationships
            .iter()
            .filter(|rel| !previous.contains(&rel.to_table))
            .filter(|rel| !added_columns.contains(&ColumnChange::new(name, &rel.from_column)))
            .filter_map(|rel| synth.foreign_key(table, rel, current))
            .collect();
        section.push_group(statements);
    }
    section
}
