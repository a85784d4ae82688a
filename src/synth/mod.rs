//! DDL synthesizer.
//!
//! Turns the canonical model into a [`Script`] whose section order is fixed:
//!
//! ```text
//! extensions
//! tables, grouped by category (each with its table and column comments)
//! foreign keys
//! indexes (primary key first)
//! row-level security
//! policies
//! update-timestamp function and triggers
//! ```
//!
//! The full schema carries no timestamps, so the same model always renders
//! to the same bytes.

mod policy;

pub use policy::{policies_for, PolicyNames};

use std::collections::BTreeSet;

use tracing::debug;

use crate::config::{DdlSettings, ModelSettings};
use crate::schema::{
    Category, Column, Index, Model, Relationship, Table, ID_COLUMN, UPDATED_AT_COLUMN,
};
use crate::sql::{
    AlterTable, ColumnDef, Comment, CreateExtension, CreateFunction, CreateIndex, CreateTable,
    CreateTrigger, DdlStatement, TableConstraint,
};

/// Name of the shared update-timestamp trigger function.
pub const TIMESTAMP_FUNCTION: &str = "trigger_set_timestamp";

const TIMESTAMP_FUNCTION_BODY: &str = "BEGIN\n  NEW.updated_at = NOW();\n  RETURN NEW;\nEND;";

/// A titled group of statements. Groups are separated by blank lines.
#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    pub title: String,
    pub groups: Vec<Vec<DdlStatement>>,
}

impl Section {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            groups: Vec::new(),
        }
    }

    pub fn push_group(&mut self, group: Vec<DdlStatement>) {
        if !group.is_empty() {
            self.groups.push(group);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

/// An ordered, sectioned list of DDL statements.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Script {
    pub sections: Vec<Section>,
}

impl Script {
    /// Append a section, dropping it if empty.
    pub fn push(&mut self, section: Section) {
        if !section.is_empty() {
            self.sections.push(section);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    pub fn statements(&self) -> impl Iterator<Item = &DdlStatement> {
        self.sections
            .iter()
            .flat_map(|s| s.groups.iter().flatten())
    }

    pub fn statement_count(&self) -> usize {
        self.statements().count()
    }

    /// Render as SQL text, one `-- title` comment per section.
    pub fn to_sql(&self) -> String {
        let mut out = String::new();
        for (i, section) in self.sections.iter().enumerate() {
            if i > 0 {
                out.push('\n');
            }
            out.push_str(&format!("-- {}\n", section.title));
            for (j, group) in section.groups.iter().enumerate() {
                if j > 0 {
                    out.push('\n');
                }
                for statement in group {
                    out.push_str(&statement.to_sql());
                    out.push('\n');
                }
            }
        }
        out
    }
}

/// Synthesizes DDL from a model.
#[derive(Debug, Clone)]
pub struct Synthesizer<'a> {
    ddl: &'a DdlSettings,
    model_settings: &'a ModelSettings,
}

impl<'a> Synthesizer<'a> {
    pub fn new(ddl: &'a DdlSettings, model_settings: &'a ModelSettings) -> Self {
        Self {
            ddl,
            model_settings,
        }
    }

    fn policy_names(&self) -> PolicyNames<'a> {
        PolicyNames {
            identity_table: &self.ddl.identity_table,
            organization_table: &self.model_settings.organization_table,
            membership_table: &self.ddl.membership_table,
            tenant_column: &self.model_settings.tenant_column,
            owner_column: &self.model_settings.owner_column,
        }
    }

    /// The complete schema for `model`.
    pub fn full_schema(&self, model: &Model) -> Script {
        let tables = model.tables_in_order();
        let mut script = Script::default();

        script.push(self.extensions());
        for section in self.table_sections(&tables, model) {
            script.push(section);
        }

        debug!(
            tables = tables.len(),
            statements = script.statement_count(),
            "full schema synthesized"
        );
        script
    }

    /// Every section after the extensions, for the given tables.
    ///
    /// `model` is consulted for relationship targets: constraints are only
    /// emitted towards tables the model contains.
    pub fn table_sections(&self, tables: &[&Table], model: &Model) -> Vec<Section> {
        let mut sections = Vec::new();

        for category in Category::ALL {
            let mut section = Section::new(format!("Tables: {}", category));
            for table in tables.iter().filter(|t| t.category == category) {
                section.push_group(self.create_with_comments(table));
            }
            sections.push(section);
        }

        let mut fks = Section::new("Foreign keys");
        let mut indexes = Section::new("Indexes");
        let mut rls = Section::new("Row level security");
        let mut policies = Section::new("Policies");
        for table in tables {
            fks.push_group(self.foreign_keys(table, model));
            indexes.push_group(self.indexes(table));
            rls.push_group(vec![AlterTable::enable_row_level_security(&table.name).into()]);
            policies.push_group(self.policies(table));
        }
        sections.extend([fks, indexes, rls, policies, self.triggers(tables)]);
        sections.retain(|s| !s.is_empty());
        sections
    }

    pub fn extensions(&self) -> Section {
        let mut section = Section::new("Extensions");
        section.push_group(
            self.ddl
                .extensions
                .iter()
                .map(|e| CreateExtension::new(e).if_not_exists().into())
                .collect(),
        );
        section
    }

    /// The shared update-timestamp function.
    pub fn timestamp_function(&self) -> CreateFunction {
        CreateFunction::trigger(TIMESTAMP_FUNCTION, TIMESTAMP_FUNCTION_BODY)
    }

    fn timestamp_trigger(&self, table: &Table) -> CreateTrigger {
        CreateTrigger::before_update(
            format!("set_timestamp_{}", table.name),
            &table.name,
            TIMESTAMP_FUNCTION,
        )
    }

    fn triggers(&self, tables: &[&Table]) -> Section {
        let mut section = Section::new("Update timestamps");
        let stamped: Vec<&&Table> = tables
            .iter()
            .filter(|t| t.has_column(UPDATED_AT_COLUMN))
            .collect();
        if stamped.is_empty() {
            return section;
        }
        section.push_group(vec![self.timestamp_function().into()]);
        section.push_group(
            stamped
                .into_iter()
                .map(|t| self.timestamp_trigger(t).into())
                .collect(),
        );
        section
    }

    fn create_with_comments(&self, table: &Table) -> Vec<DdlStatement> {
        let create = CreateTable::new(&table.name)
            .if_not_exists()
            .columns(table.ordered_columns().into_iter().map(column_def));

        let mut statements: Vec<DdlStatement> = vec![create.into()];
        statements.push(Comment::on_table(&table.name, table_comment(table)).into());
        for column in table.ordered_columns() {
            statements.push(
                Comment::on_column(&table.name, &column.name, column_comment(column)).into(),
            );
        }
        statements
    }

    fn foreign_keys(&self, table: &Table, model: &Model) -> Vec<DdlStatement> {
        table
            .relationships
            .iter()
            .filter_map(|rel| self.foreign_key(table, rel, model))
            .collect()
    }

    /// Constraint for one relationship, or `None` when its target table is
    /// not part of the model.
    pub fn foreign_key(
        &self,
        table: &Table,
        rel: &Relationship,
        model: &Model,
    ) -> Option<DdlStatement> {
        if !model.contains(&rel.to_table) {
            debug!(
                table = %table.name,
                column = %rel.from_column,
                target = %rel.to_table,
                "no constraint for relationship to a table outside the model"
            );
            return None;
        }
        Some(
            AlterTable::add_constraint(
                &table.name,
                TableConstraint::foreign_key(
                    rel.constraint_name(&table.name),
                    [rel.from_column.as_str()],
                    &rel.to_table,
                    [rel.to_column.as_str()],
                    rel.on_delete,
                ),
            )
            .into(),
        )
    }

    fn indexes(&self, table: &Table) -> Vec<DdlStatement> {
        let mut statements: Vec<DdlStatement> = Vec::new();
        if table.has_column(ID_COLUMN) {
            statements.push(
                AlterTable::add_constraint(&table.name, TableConstraint::primary_key([ID_COLUMN]))
                    .into(),
            );
        }
        statements.extend(table.indexes.iter().map(|index| create_index(table, index).into()));
        statements
    }

    fn policies(&self, table: &Table) -> Vec<DdlStatement> {
        policies_for(table, &self.policy_names())
            .into_iter()
            .map(Into::into)
            .collect()
    }
}

/// CREATE INDEX IF NOT EXISTS for a model index.
pub fn create_index(table: &Table, index: &Index) -> CreateIndex {
    let mut create = CreateIndex::new(&index.name, &table.name).if_not_exists();
    if index.unique {
        create = create.unique();
    }
    for column in &index.columns {
        create = create.column(column);
    }
    create
}

/// Column definition for a canonical column.
pub fn column_def(column: &Column) -> ColumnDef {
    let mut def = ColumnDef::new(&column.name, column.sql_type.clone());
    if !column.nullable {
        def = def.not_null();
    }
    if let Some(default) = &column.default {
        def = def.default_expr(default);
    }
    if column.unique {
        def = def.unique();
    }
    def
}

fn table_comment(table: &Table) -> String {
    format!(
        "Category: {}. Sources: {}",
        table.category,
        join_sources(&table.sources)
    )
}

fn column_comment(column: &Column) -> String {
    if column.sources.is_empty() {
        "Standard column".to_string()
    } else {
        format!("Sources: {}", join_sources(&column.sources))
    }
}

fn join_sources(sources: &BTreeSet<String>) -> String {
    if sources.is_empty() {
        return "none".to_string();
    }
    sources.iter().map(String::as_str).collect::<Vec<_>>().join(", ")
}
