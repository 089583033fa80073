use thiserror::Error;

// ---------------------------------------------------------------------------
// Classifier errors
// ---------------------------------------------------------------------------

/// Why a concentration could not be classified.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum ClassifyError {
    #[error("concentration {0} ng/mL is negative")]
    Negative(f64),
    #[error("concentration {0} is not a finite number")]
    NonFinite(f64),
}

/// Rejected threshold table definitions.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ThresholdError {
    #[error("threshold table needs at least one bound")]
    Empty,
    #[error("bound #{index} ({value}) must be finite and greater than zero")]
    InvalidBound { index: usize, value: f64 },
    #[error("bound #{index} ({value}) is not greater than the previous bound")]
    NotAscending { index: usize, value: f64 },
    #[error("label #{index} is empty")]
    EmptyLabel { index: usize },
    #[error("{0} bands exceed the maximum of 255")]
    TooManyBands(usize),
}

// ---------------------------------------------------------------------------
// Dataset errors
// ---------------------------------------------------------------------------

/// Failures while loading, generating or exporting a dataset.
///
/// Every variant is terminal for the current load attempt: callers keep the
/// previous dataset (or none) and never see a partially parsed table.
#[derive(Debug, Error)]
pub enum DatasetError {
    /// No troponin column and no numeric column to fall back on.
    #[error("no troponin concentration column and no numeric column to fall back on")]
    MissingColumn,

    /// A row's concentration cell cannot be classified.
    #[error("row {row}: invalid troponin value '{value}': {reason}")]
    InvalidValue {
        row: usize,
        value: String,
        reason: String,
    },

    #[error("unsupported file extension: .{0}")]
    UnsupportedFormat(String),

    #[error("malformed input: {0}")]
    Malformed(String),

    #[error("unknown column '{0}'")]
    UnknownColumn(String),

    #[error("synthetic data: {0}")]
    Generator(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),
}

impl DatasetError {
    /// True when the input could not be read as a table at all.
    pub fn is_parse_failure(&self) -> bool {
        matches!(
            self,
            DatasetError::Malformed(_)
                | DatasetError::Io(_)
                | DatasetError::Csv(_)
                | DatasetError::Json(_)
                | DatasetError::Parquet(_)
                | DatasetError::Arrow(_)
        )
    }
}

/// Result type for dataset operations.
pub type Result<T> = std::result::Result<T, DatasetError>;

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("reading config {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("parsing config {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid threshold table: {0}")]
    Threshold(#[from] ThresholdError),
    #[error("invalid setting: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_failures_are_grouped() {
        let io = DatasetError::Io(std::io::Error::new(std::io::ErrorKind::NotFound, "gone"));
        assert!(io.is_parse_failure());
        assert!(DatasetError::Malformed("bad".into()).is_parse_failure());
        assert!(!DatasetError::MissingColumn.is_parse_failure());
        assert!(!DatasetError::UnsupportedFormat("xlsx".into()).is_parse_failure());
    }

    #[test]
    fn invalid_value_message_names_row() {
        let err = DatasetError::InvalidValue {
            row: 3,
            value: "-0.2".into(),
            reason: ClassifyError::Negative(-0.2).to_string(),
        };
        let msg = err.to_string();
        assert!(msg.starts_with("row 3"));
        assert!(msg.contains("negative"));
    }
}
