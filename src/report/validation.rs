//! Validation findings over a built model.
//!
//! Findings never abort a run. They surface in the analysis report and as
//! [`ValidationReport::is_valid`], which callers may act on.

use std::fmt;

use serde::Serialize;

use crate::config::ModelSettings;
use crate::schema::Model;

/// A single finding.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Finding {
    /// A configured expected table was not inferred.
    MissingTable { name: String, reason: String },
    /// A relationship points at a table absent from the model.
    DanglingRelationship {
        table: String,
        column: String,
        target: String,
    },
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Finding::MissingTable { name, reason } => {
                write!(f, "Missing expected table '{}': {}", name, reason)
            }
            Finding::DanglingRelationship {
                table,
                column,
                target,
            } => write!(
                f,
                "{}.{} references table '{}', which is not in the model",
                table, column, target
            ),
        }
    }
}

/// All findings for one model, missing tables first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub findings: Vec<Finding>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.findings.is_empty()
    }

    pub fn missing_tables(&self) -> impl Iterator<Item = (&str, &str)> {
        self.findings.iter().filter_map(|f| match f {
            Finding::MissingTable { name, reason } => Some((name.as_str(), reason.as_str())),
            _ => None,
        })
    }

    pub fn dangling_relationships(&self) -> impl Iterator<Item = &Finding> {
        self.findings
            .iter()
            .filter(|f| matches!(f, Finding::DanglingRelationship { .. }))
    }
}

/// Check `model` against the configured expectations.
pub fn validate(model: &Model, settings: &ModelSettings) -> ValidationReport {
    let mut findings: Vec<Finding> = settings
        .expected_tables
        .iter()
        .filter(|expected| !model.contains(&expected.name))
        .map(|expected| Finding::MissingTable {
            name: expected.name.clone(),
            reason: expected.reason.clone(),
        })
        .collect();

    for table in model.tables.values() {
        for rel in &table.relationships {
            if !model.contains(&rel.to_table) {
                findings.push(Finding::DanglingRelationship {
                    table: table.name.clone(),
                    column: rel.from_column.clone(),
                    target: rel.to_table.clone(),
                });
            }
        }
    }

    ValidationReport { findings }
}
