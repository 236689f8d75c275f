// dbinventory — Store error types

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Database {0} does not exist. Specify a location, or use --db-create to start a new database")]
    Missing(String),

    #[error("{kind} `{name}` not found")]
    NotFound { kind: &'static str, name: String },

    #[error("{kind} `{name}` already exists")]
    Duplicate { kind: &'static str, name: String },

    #[error("could not add tag `{tag}`, group `{group}` not found")]
    UnknownGroup { tag: String, group: String },

    #[error("Invalid field: {0}")]
    InvalidField(String),

    #[error("{0}")]
    Other(String),
}
