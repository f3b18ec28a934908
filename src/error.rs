use thiserror::Error;

/// Failures that abort a pipeline stage.
///
/// Zip normalization never fails; only structural problems with a source
/// table end up here.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PipelineError {
    #[error("table '{table}' is missing required column '{column}'")]
    MissingSourceColumn { table: String, column: String },

    #[error("table '{table}' has no column at position {position}")]
    MissingOrdinalColumn { table: String, position: usize },

    #[error("table '{table}', column '{column}', row {row}: '{value}' is not a number")]
    NonNumeric {
        table: String,
        column: String,
        row: usize,
        value: String,
    },

    #[error("table '{table}', row {row}: expected {expected} values but found {found}")]
    RowWidth {
        table: String,
        row: usize,
        expected: usize,
        found: usize,
    },
}

pub type Result<T> = std::result::Result<T, PipelineError>;
