//! Import errors shared by the reader pipeline and the bank adapters.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while reading or reshaping a statement export.
///
/// Identification misses, malformed amount cells and a missing balance label
/// are not errors; they degrade to `false`, dropped rows and `None`. What
/// ends up here is a structural mismatch the caller has to report.
#[derive(Error, Debug)]
pub enum ImportError {
    /// IO error while reading the export
    #[error("reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// CSV parsing error
    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    /// A configured or built-in regular expression failed to compile
    #[error("invalid pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    /// Column expected by an adapter is not in the table
    #[error("missing required column: {0}")]
    MissingColumn(String),

    /// The column labels row that starts the transaction table was not found
    #[error("column labels row not found: {expected}")]
    MissingColumnLabels { expected: String },

    /// Non-empty date cell that does not match the adapter's date format
    #[error("invalid date {value:?} in row {row} (expected format {format})")]
    InvalidDate {
        row: usize,
        value: String,
        format: String,
    },

    /// Non-empty amount cell that is not a decimal number
    #[error("invalid amount {value:?} in row {row}")]
    InvalidAmount { row: usize, value: String },

    /// Currency that is not a 3-letter code
    #[error("invalid currency {value:?} in row {row}")]
    InvalidCurrency { row: usize, value: String },

    /// Cell with a shape the adapter cannot parse
    #[error("malformed {field} value: {value:?}")]
    MalformedField { field: String, value: String },

    /// Cell holding a different kind of value than the column requires
    #[error("unexpected value in column {column}: {value}")]
    UnexpectedValue { column: String, value: String },
}

impl ImportError {
    pub fn malformed(field: &str, value: impl Into<String>) -> Self {
        ImportError::MalformedField {
            field: field.to_string(),
            value: value.into(),
        }
    }
}
