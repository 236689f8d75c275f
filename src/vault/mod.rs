// dbinventory — Vault Module
//
// Passphrase-derived encryption of the host credential fields. A `Vault` is
// passed explicitly to every operation that seals or unseals a credential;
// `None` means encryption is disabled for the run.

mod cipher;
mod error;
mod passphrase;

pub use cipher::{Vault, derive_key, seal, unseal};
pub use error::VaultError;
pub use passphrase::{CANARY_KEY, SALT_KEY, verify_or_initialize};
