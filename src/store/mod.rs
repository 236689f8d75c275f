// dbinventory — Store Module
//
// SQLite-backed storage for hosts, tags, tag groups, host-tag assignments
// and the passphrase canary. Natural keys (host name, tag name, group name)
// are unique and every mutation commits immediately.

mod db;
mod error;
mod models;
mod repository;

pub use db::Database;
pub use error::StoreError;
pub use models::{Host, HostFields, SelectionType, Tag, TagGroup};
pub use repository::{InventoryStore, SqliteInventoryStore};
