// dbinventory — Top-level error types
//
// Aggregates errors from the vault and store modules into a single error
// enum for the application boundary. Every variant is fatal to the run.

use thiserror::Error;

/// Top-level error type for all dbinventory operations.
#[derive(Debug, Error)]
pub enum InventoryError {
    #[error(transparent)]
    Vault(#[from] crate::vault::VaultError),

    #[error(transparent)]
    Store(#[from] crate::store::StoreError),

    #[error("{0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, InventoryError>;
