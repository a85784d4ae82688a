//! Markdown analysis report.

use std::fmt::Write;

use chrono::{DateTime, Utc};

use super::validation::{Finding, ValidationReport};
use crate::config::{DdlSettings, ModelSettings};
use crate::schema::{Model, Table, CREATED_AT_COLUMN, ID_COLUMN, UPDATED_AT_COLUMN};

/// File name of the report inside the output directory.
pub const REPORT_FILE_NAME: &str = "analysis_report.md";

/// Renders the analysis report for one run.
#[derive(Debug, Clone)]
pub struct AnalysisReport<'a> {
    pub model: &'a Model,
    pub validation: &'a ValidationReport,
    pub model_settings: &'a ModelSettings,
    pub ddl_settings: &'a DdlSettings,
    pub generated_at: DateTime<Utc>,
}

impl AnalysisReport<'_> {
    pub fn to_markdown(&self) -> String {
        let mut out = String::new();
        // Writing into a String cannot fail.
        let _ = self.write_markdown(&mut out);
        out
    }

    fn write_markdown(&self, out: &mut String) -> std::fmt::Result {
        writeln!(out, "# Database Analysis Report")?;
        writeln!(out, "Generated: {}", self.generated_at.to_rfc3339())?;
        writeln!(out)?;

        self.write_summary(out)?;
        self.write_categories(out)?;
        self.write_tables(out)?;
        self.write_findings(out)?;

        writeln!(out, "## Recommendations")?;
        let recommendations = self.recommendations();
        if recommendations.is_empty() {
            writeln!(out, "No recommendations.")?;
        }
        for rec in recommendations {
            writeln!(out, "- {}", rec)?;
        }
        Ok(())
    }

    fn write_summary(&self, out: &mut String) -> std::fmt::Result {
        let tenant = &self.model_settings.tenant_column;
        let tenant_ready = self
            .model
            .tables
            .values()
            .filter(|t| t.has_column(tenant))
            .count();

        writeln!(out, "## Executive Summary")?;
        writeln!(out, "- **Total Tables:** {}", self.model.tables.len())?;
        writeln!(out, "- **Total Columns:** {}", self.model.column_count())?;
        writeln!(out, "- **Total Relationships:** {}", self.model.relationship_count())?;
        writeln!(out, "- **Multi-tenant Ready Tables:** {}", tenant_ready)?;
        writeln!(
            out,
            "- **Validation:** {}",
            if self.validation.is_valid() {
                "passed".to_string()
            } else {
                format!("{} finding(s)", self.validation.findings.len())
            }
        )?;
        writeln!(out)
    }

    fn write_categories(&self, out: &mut String) -> std::fmt::Result {
        writeln!(out, "## Tables by Category")?;
        for (category, tables) in self.model.by_category() {
            let names: Vec<&str> = tables.iter().map(|t| t.name.as_str()).collect();
            writeln!(out, "- **{}** ({}): {}", category, tables.len(), names.join(", "))?;
        }
        writeln!(out)
    }

    fn write_tables(&self, out: &mut String) -> std::fmt::Result {
        writeln!(out, "## Tables Overview")?;
        writeln!(out)?;
        for table in self.model.tables_in_order() {
            write_table(out, table)?;
        }
        Ok(())
    }

    fn write_findings(&self, out: &mut String) -> std::fmt::Result {
        writeln!(out, "## Potential Missing Tables")?;
        let mut any = false;
        for (name, reason) in self.validation.missing_tables() {
            writeln!(out, "- **{}**: {}", name, reason)?;
            any = true;
        }
        if !any {
            writeln!(out, "No missing tables detected.")?;
        }
        writeln!(out)?;

        writeln!(out, "## Dangling Relationships")?;
        let mut any = false;
        for finding in self.validation.dangling_relationships() {
            writeln!(out, "- {}", finding)?;
            any = true;
        }
        if !any {
            writeln!(out, "All relationships point at known tables.")?;
        }
        writeln!(out)
    }

    fn recommendations(&self) -> Vec<String> {
        let settings = self.model_settings;
        let mut recs = Vec::new();

        for table in self.model.tables_in_order() {
            let name = &table.name;
            if !table.has_column(ID_COLUMN) {
                recs.push(format!("Add primary key ({}) to {} table", ID_COLUMN, name));
            }
            for stamp in [CREATED_AT_COLUMN, UPDATED_AT_COLUMN] {
                if !table.has_column(stamp) {
                    recs.push(format!("Add {} timestamp to {} table", stamp, name));
                }
            }

            let scoped = table.has_column(&settings.tenant_column)
                || table.has_column(&settings.owner_column);
            let exempt = *name == self.ddl_settings.identity_table
                || *name == settings.organization_table;
            if !scoped && !exempt {
                recs.push(format!(
                    "Consider adding {} or {} to {} for multi-tenancy",
                    settings.tenant_column, settings.owner_column, name
                ));
            }

            for rel in &table.relationships {
                let indexed = table
                    .indexes
                    .iter()
                    .any(|i| i.columns.first() == Some(&rel.from_column));
                if !indexed {
                    recs.push(format!(
                        "Add an index on {}.{} for join performance",
                        name, rel.from_column
                    ));
                }
            }
        }

        for finding in self.validation.dangling_relationships() {
            if let Finding::DanglingRelationship { table, column, target } = finding {
                recs.push(format!(
                    "Create table {} or drop the reference from {}.{}",
                    target, table, column
                ));
            }
        }
        recs
    }
}

fn write_table(out: &mut String, table: &Table) -> std::fmt::Result {
    writeln!(out, "### {}", table.name)?;
    writeln!(
        out,
        "**Category:** {} | **Columns:** {} | **Relations:** {}",
        table.category,
        table.columns.len(),
        table.relationships.len()
    )?;
    let sources: Vec<&str> = table.sources.iter().map(String::as_str).collect();
    writeln!(out, "**Source Files:** {}", sources.join(", "))?;
    writeln!(out)?;

    writeln!(out, "**Columns:**")?;
    for column in table.ordered_columns() {
        let nullable = if column.nullable { "NULL" } else { "NOT NULL" };
        write!(out, "- `{}` {} {}", column.name, column.sql_type.tag().to_uppercase(), nullable)?;
        if let Some(default) = &column.default {
            write!(out, " DEFAULT {}", default)?;
        }
        writeln!(out)?;
    }
    writeln!(out)?;

    if !table.relationships.is_empty() {
        writeln!(out, "**Relationships:**")?;
        for rel in &table.relationships {
            writeln!(out, "- `{}` → `{}.{}`", rel.from_column, rel.to_table, rel.to_column)?;
        }
        writeln!(out)?;
    }
    Ok(())
}
