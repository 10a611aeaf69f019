//! Error type shared by the importer, the store clients and the config layer.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CrmError {
    /// No CSV column is mapped to the customer name.
    #[error("no column is mapped to the name field")]
    MissingNameColumn,

    /// More than one CSV column is mapped to the customer name.
    #[error("columns {0:?} are all mapped to the name field; choose one")]
    DuplicateNameColumn(Vec<usize>),

    #[error("column {column} does not exist (file has {columns} columns)")]
    ColumnOutOfRange { column: usize, columns: usize },

    #[error("invalid value '{value}' for {kind}")]
    InvalidValue { kind: &'static str, value: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The record store answered with a non-success status.
    #[error("record store error ({status}): {message}")]
    Store { status: u16, message: String },

    #[error("record '{id}' not found in {collection}")]
    NotFound { collection: String, id: String },

    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("configuration error: {0}")]
    Config(String),
}

impl CrmError {
    pub fn invalid(kind: &'static str, value: impl Into<String>) -> Self {
        Self::InvalidValue {
            kind,
            value: value.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, CrmError>;
