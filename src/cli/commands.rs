// dbinventory — CLI Command Handlers
//
// Each invocation performs exactly one request: open the database, then
// import, export, one create/update/delete, or print the inventory.
// Import and export run before the passphrase check.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::InventoryError;
use crate::inventory::{InventoryBuilder, render_ssh_config};
use crate::reconcile::{Reconciler, load_document};
use crate::store::{Database, HostFields, InventoryStore, SelectionType, SqliteInventoryStore, StoreError};
use crate::vault::{self, Vault};

use super::{Cli, Commands};

/// Default location of the hosts database.
pub fn default_db_path() -> PathBuf {
    let base = dirs_next::data_dir().unwrap_or_else(|| PathBuf::from("."));
    base.join("dbinventory").join("dbinventory.sqlite3")
}

/// Execute the parsed CLI request.
pub fn execute(cli: Cli) -> Result<(), InventoryError> {
    let path = cli.db_path.clone().unwrap_or_else(default_db_path);
    let db = open_db(&path, cli.db_create)?;
    let store = SqliteInventoryStore::new(&db);

    match &cli.command {
        Some(Commands::Import { file }) => return cmd_import(&store, file),
        Some(Commands::Export) => return cmd_export(&store, cli.pretty),
        _ => {}
    }

    let vault = vault::verify_or_initialize(&store, cli.db_secret.as_deref())?;
    let vault = vault.as_ref();

    match cli.command {
        Some(Commands::AddGroup { name, selection_type }) => cmd_add_group(&store, &name, selection_type),
        Some(Commands::AddTag { name, group }) => cmd_add_tag(&store, &name, &group),
        Some(Commands::AddHost { host, fields, tags }) => {
            cmd_add_host(&store, vault, &host, fields.into(), &tags)
        }
        Some(Commands::UpdateHost { host, fields, tags }) => {
            cmd_update_host(&store, vault, &host, fields.into(), tags.as_deref())
        }
        Some(Commands::DelGroup { name }) => {
            store.delete_group(&name)?;
            println!("Group `{}` deleted.", name);
            Ok(())
        }
        Some(Commands::DelTag { name }) => cmd_del_tag(&store, &name).map(|_| ()),
        Some(Commands::DelHost { host }) => {
            store.delete_host(&host)?;
            println!("Host `{}` deleted.", host);
            Ok(())
        }
        Some(Commands::Import { .. }) | Some(Commands::Export) => Ok(()),
        None => cmd_inventory(&store, vault, cli.host.as_deref(), cli.ssh_config, cli.pretty),
    }
}

// ─── Import / Export ─────────────────────────────────────────────────────────

fn cmd_import(store: &SqliteInventoryStore<'_>, file: &Path) -> Result<(), InventoryError> {
    let document = load_document(file)?;
    let summary = Reconciler::new(store).import(document)?;

    println!("imported data.");
    println!("  {}", summary);
    Ok(())
}

fn cmd_export(store: &SqliteInventoryStore<'_>, pretty: bool) -> Result<(), InventoryError> {
    let document = Reconciler::new(store).export()?;
    println!("{}", to_json(&document, pretty)?);
    Ok(())
}

// ─── Add / Update ────────────────────────────────────────────────────────────

fn cmd_add_group(
    store: &SqliteInventoryStore<'_>,
    name: &str,
    selection_type: SelectionType,
) -> Result<(), InventoryError> {
    store.insert_group(name, selection_type)?;
    println!("Added Tag Group `{}` ({})", name, selection_type);
    Ok(())
}

fn cmd_add_tag(store: &SqliteInventoryStore<'_>, name: &str, group: &str) -> Result<(), InventoryError> {
    store.insert_tag(name, group)?;
    println!("Added Tag `{}` to group `{}`", name, group);
    Ok(())
}

fn cmd_add_host(
    store: &SqliteInventoryStore<'_>,
    vault: Option<&Vault>,
    host: &str,
    fields: HostFields,
    tags: &[String],
) -> Result<(), InventoryError> {
    require_vault_for_credentials(&fields, vault)?;

    let tags = clean_tags(tags);
    let id = store.insert_host(host, &fields, &tags, vault)?;
    let assigned = store.tags_for_host(id)?.len();

    println!("Added Host `{}`", host);
    if assigned < tags.len() {
        println!("  {} of {} tags assigned (unknown tags skipped)", assigned, tags.len());
    }
    Ok(())
}

fn cmd_update_host(
    store: &SqliteInventoryStore<'_>,
    vault: Option<&Vault>,
    host: &str,
    fields: HostFields,
    tags: Option<&[String]>,
) -> Result<(), InventoryError> {
    require_vault_for_credentials(&fields, vault)?;

    let existing = store.get_host(host)?.ok_or_else(|| StoreError::NotFound {
        kind: "Host",
        name: host.to_string(),
    })?;

    if !fields.is_empty() {
        store.update_host(existing.id, &fields, vault)?;
    }
    if let Some(tags) = tags {
        store.set_host_tags(existing.id, &clean_tags(tags))?;
    }

    println!("Updated Host `{}`", host);
    Ok(())
}

/// Delete a tag and report how many hosts lost it.
fn cmd_del_tag(store: &SqliteInventoryStore<'_>, name: &str) -> Result<usize, InventoryError> {
    let tag = store.get_tag(name)?.ok_or_else(|| StoreError::NotFound {
        kind: "Tag",
        name: name.to_string(),
    })?;
    let detached = store.hosts_for_tag(tag.id)?.len();

    store.delete_tag(name)?;
    println!("Tag `{}` deleted.", name);
    if detached > 0 {
        println!("  removed from {} host(s)", detached);
    }
    Ok(detached)
}

// ─── Inventory ───────────────────────────────────────────────────────────────

fn cmd_inventory(
    store: &SqliteInventoryStore<'_>,
    vault: Option<&Vault>,
    host: Option<&str>,
    ssh_config: bool,
    pretty: bool,
) -> Result<(), InventoryError> {
    let builder = InventoryBuilder::new(store, vault);

    if let Some(name) = host {
        println!("{}", to_json(&builder.single_host(name)?, pretty)?);
        return Ok(());
    }

    let inventory = builder.build()?;
    if ssh_config {
        print!("{}", render_ssh_config(&inventory));
    } else {
        println!("{}", to_json(&inventory, pretty)?);
    }
    Ok(())
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

/// Open the database, creating it only when asked to.
fn open_db(path: &Path, create: bool) -> Result<Database, InventoryError> {
    let db = if create {
        Database::open_or_create(path)?
    } else {
        Database::open(path)?
    };

    tracing::debug!(path = %path.display(), "Database opened");
    Ok(db)
}

/// Credential fields are only editable while a passphrase is active.
fn require_vault_for_credentials(fields: &HostFields, vault: Option<&Vault>) -> Result<(), InventoryError> {
    if fields.sets_credentials() && vault.is_none() {
        return Err(InventoryError::Config(
            "Provide a --db-secret if you want to set the ssh_pass and sudo_pass variables.".to_string(),
        ));
    }
    Ok(())
}

fn clean_tags(tags: &[String]) -> Vec<String> {
    tags.iter()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect()
}

fn to_json<T: Serialize>(value: &T, pretty: bool) -> Result<String, InventoryError> {
    let text = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    Ok(text)
}

// ─── Tests ───────────────────────────────────────────────────────────────────
