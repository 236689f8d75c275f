// dbinventory — Inventory Builder
//
// Turns the stored hosts and tag assignments into the Ansible dynamic
// inventory shape:
//
//   { "<tag>": ["<host>", ...], "_meta": { "hostvars": { "<host>": {..} } } }
//
// Groups are named after tags, not tag groups. A host without tags still
// gets a hostvars entry.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::InventoryError;
use crate::store::{Host, InventoryStore};
use crate::vault::{Vault, VaultError, unseal};

/// Key Ansible reads per-host variables from.
pub const META_KEY: &str = "_meta";

/// Connection variables for one host. Unset, empty and zero values are left
/// out of the JSON entirely. Fields are declared in key order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HostVars {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ansible_ssh_host: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ansible_ssh_pass: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ansible_ssh_port: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ansible_ssh_user: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ansible_sudo_pass: Option<String>,
}

impl HostVars {
    /// Variables for `host`, unsealing credentials with `vault` when given.
    pub fn for_host(host: &Host, vault: Option<&Vault>) -> Result<Self, VaultError> {
        let open = |stored: Option<&str>| -> Result<Option<String>, VaultError> {
            match stored {
                Some(s) => unseal(vault, s),
                None => Ok(None),
            }
        };

        Ok(Self {
            ansible_ssh_host: non_empty(host.host_name.as_deref()),
            ansible_ssh_pass: open(host.stored_ssh_pass())?,
            ansible_ssh_port: host.ssh_port.filter(|port| *port != 0),
            ansible_ssh_user: non_empty(host.ssh_user.as_deref()),
            ansible_sudo_pass: open(host.stored_sudo_pass())?,
        })
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value.filter(|v| !v.is_empty()).map(str::to_string)
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Meta {
    pub hostvars: BTreeMap<String, HostVars>,
}

/// The full listing: tag name → hosts, plus `_meta.hostvars`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Inventory {
    #[serde(flatten)]
    pub groups: BTreeMap<String, Vec<String>>,
    #[serde(rename = "_meta")]
    pub meta: Meta,
}

impl Inventory {
    /// Tags of each host, in tag-name order.
    pub fn groups_by_host(&self) -> BTreeMap<&str, Vec<&str>> {
        let mut by_host: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
        for (group, hosts) in &self.groups {
            for host in hosts {
                by_host.entry(host.as_str()).or_default().push(group.as_str());
            }
        }
        by_host
    }
}

pub struct InventoryBuilder<'a, S: InventoryStore + ?Sized> {
    store: &'a S,
    vault: Option<&'a Vault>,
}

impl<'a, S: InventoryStore + ?Sized> InventoryBuilder<'a, S> {
    pub fn new(store: &'a S, vault: Option<&'a Vault>) -> Self {
        Self { store, vault }
    }

    /// Variables for a single host, or an empty map if it is unknown.
    pub fn single_host(&self, name: &str) -> Result<HostVars, InventoryError> {
        match self.store.get_host(name)? {
            Some(host) => Ok(HostVars::for_host(&host, self.vault)?),
            None => {
                tracing::debug!(host = %name, "Host not found; returning empty vars");
                Ok(HostVars::default())
            }
        }
    }

    /// The full inventory listing.
    pub fn build(&self) -> Result<Inventory, InventoryError> {
        let mut inventory = Inventory::default();

        for host in self.store.list_hosts()? {
            let vars = HostVars::for_host(&host, self.vault)?;

            for tag in self.store.tags_for_host(host.id)? {
                if tag.name == META_KEY {
                    tracing::warn!(host = %host.host, "Skipping tag named `{}`", META_KEY);
                    continue;
                }
                inventory.groups.entry(tag.name).or_default().push(host.host.clone());
            }

            inventory.meta.hostvars.insert(host.host, vars);
        }

        tracing::debug!(
            hosts = inventory.meta.hostvars.len(),
            groups = inventory.groups.len(),
            "Inventory assembled"
        );
        Ok(inventory)
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
