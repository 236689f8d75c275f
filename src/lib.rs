// dbinventory — Library root
//
// Re-exports the vault, store, reconcile, inventory and CLI modules.

pub mod cli;
pub mod error;
pub mod inventory;
pub mod reconcile;
pub mod store;
pub mod vault;

pub use error::{InventoryError, Result};
