//! Validation findings and the human-readable analysis report.

mod analysis;
mod validation;

pub use analysis::{AnalysisReport, REPORT_FILE_NAME};
pub use validation::{validate, Finding, ValidationReport};
