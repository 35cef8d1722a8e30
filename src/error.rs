//! Error types for the extraction pipeline

use thiserror::Error;

/// Structural failures that halt a run.
///
/// Validation misses, degenerate rows and null aggregation inputs are
/// filtering, not errors, and never show up here.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// E001: Configuration file not found
    #[error("[E001] Config file not found: {path}")]
    ConfigNotFound { path: String },

    /// E002: Failed to parse configuration file
    #[error("[E002] Failed to parse config {path}: {message}")]
    ConfigParse { path: String, message: String },

    /// E003: Workbook, sheet or reference file absent or unreadable
    #[error("[E003] Cannot load {path}: {message}")]
    SourceLoad { path: String, message: String },

    /// E004: A worksheet lacks a column an extractor or loader depends on
    #[error("[E004] Worksheet '{sheet}' has no column '{column}'")]
    MissingColumn { sheet: String, column: String },

    /// E005: Reference table could not be decoded at all
    #[error("[E005] Failed to parse reference table {path}: {message}")]
    ReferenceParse { path: String, message: String },

    /// E006: Output could not be written
    #[error("[E006] Failed to write {path}: {message}")]
    Output { path: String, message: String },
}

/// Result alias used by every pipeline stage
pub type PipelineResult<T> = Result<T, PipelineError>;

impl PipelineError {
    pub fn missing_column(sheet: impl Into<String>, column: impl Into<String>) -> Self {
        PipelineError::MissingColumn {
            sheet: sheet.into(),
            column: column.into(),
        }
    }

    pub fn source_load(path: impl Into<String>, message: impl ToString) -> Self {
        PipelineError::SourceLoad {
            path: path.into(),
            message: message.to_string(),
        }
    }

    pub fn output(path: impl Into<String>, message: impl ToString) -> Self {
        PipelineError::Output {
            path: path.into(),
            message: message.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_column_names_sheet_and_column() {
        let err = PipelineError::missing_column("RLP - Management", "calculatedareaha");
        let msg = err.to_string();
        assert!(msg.starts_with("[E004]"));
        assert!(msg.contains("RLP - Management"));
        assert!(msg.contains("calculatedareaha"));
    }
}
