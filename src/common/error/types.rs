//! Unified error type for sheet2pb.
//!
//! Every fatal condition of the pipeline maps onto one variant of [`Error`].
//! Recoverable conditions (malformed cells, mismatched merge definitions) are
//! not errors at the artifact level; they surface as
//! [`Diagnostic`](crate::header::Diagnostic) values and `tracing` warnings.
use thiserror::Error;

/// Main error type for sheet2pb operations.
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A configured spreadsheet or worksheet does not exist
    #[error("Source missing: {0}")]
    SourceMissing(String),

    /// A worksheet has no data rows below its four header rows
    #[error("Sheet '{sheet}' contains no data (only {rows} rows)")]
    EmptySheet { sheet: String, rows: usize },

    /// The spreadsheet reader failed
    #[error("Spreadsheet error: {0}")]
    Spreadsheet(String),

    /// Two header columns of one sheet declare the same field name
    #[error("Duplicate field name '{name}' in column {column} of '{artifact}'")]
    DuplicateFieldName {
        artifact: String,
        name: String,
        column: usize,
    },

    /// A unique-constrained field repeats a value
    #[error("Duplicate unique value '{value}' for field '{field}'")]
    DuplicateUniqueValue { field: String, value: String },

    /// A cell could not be parsed as its declared type
    #[error("Invalid format: {0}")]
    FormatInvalid(String),

    /// The persisted cache could not be read or written
    #[error("Cache IO error: {0}")]
    CacheIo(String),

    /// Settings or mapping file error
    #[error("Config error: {0}")]
    Config(String),

    /// Fatal error raised while processing one artifact
    #[error("Artifact '{name}' failed: {source}")]
    Artifact {
        name: String,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Wrap this error with the name of the artifact that raised it.
    pub fn in_artifact(self, name: impl Into<String>) -> Self {
        match self {
            Error::Artifact { .. } => self,
            other => Error::Artifact {
                name: name.into(),
                source: Box::new(other),
            },
        }
    }
}

/// Result type for sheet2pb operations.
pub type Result<T> = std::result::Result<T, Error>;
