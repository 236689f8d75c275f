// dbinventory — Vault error types

use thiserror::Error;

use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum VaultError {
    #[error("wrong passphrase for this database -- please provide the correct one")]
    WrongPassphrase,

    #[error("Corrupt ciphertext: {0}")]
    Corrupt(String),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}
