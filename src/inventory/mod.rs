// dbinventory — Inventory Module
//
// Assembles the Ansible inventory from the store and renders it.

mod builder;
mod ssh_config;

pub use builder::{HostVars, Inventory, InventoryBuilder, META_KEY, Meta};
pub use ssh_config::render_ssh_config;
