// dbinventory — Inventory Store Repository
//
// CRUD over tag groups, tags, hosts and config rows, keyed by natural key.
// Host credentials are sealed with the caller's vault on the way in; the
// store never decrypts anything itself.

use rusqlite::{OptionalExtension, params};

use super::StoreError;
use super::db::Database;
use super::models::{Host, HostFields, SelectionType, Tag, TagGroup};
use crate::vault::{Vault, seal};

const HOST_COLUMNS: &str =
    "id, host, host_name, ssh_user, ssh_port, encrypted_ssh_pass, encrypted_sudo_pass";

const TAG_SELECT: &str = "SELECT t.id, t.group_id, g.name, t.name
     FROM tag t JOIN tag_group g ON g.id = t.group_id";

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over inventory storage operations.
pub trait InventoryStore {
    /// Look up a tag group by name.
    fn get_group(&self, name: &str) -> Result<Option<TagGroup>, StoreError>;

    /// All tag groups, ordered by name.
    fn list_groups(&self) -> Result<Vec<TagGroup>, StoreError>;

    /// Create a tag group. Fails with `Duplicate` if the name is taken.
    fn insert_group(&self, name: &str, selection_type: SelectionType) -> Result<i64, StoreError>;

    /// Change the selection type of an existing group.
    fn update_group(&self, id: i64, selection_type: SelectionType) -> Result<(), StoreError>;

    /// Delete a group by name, along with its tags and their assignments.
    fn delete_group(&self, name: &str) -> Result<(), StoreError>;

    fn get_tag(&self, name: &str) -> Result<Option<Tag>, StoreError>;

    /// All tags, ordered by name.
    fn list_tags(&self) -> Result<Vec<Tag>, StoreError>;

    /// Create a tag inside the named group. The group must already exist.
    fn insert_tag(&self, name: &str, group: &str) -> Result<i64, StoreError>;

    /// Move an existing tag into the named group.
    fn update_tag(&self, id: i64, group: &str) -> Result<(), StoreError>;

    /// Delete a tag by name; it is removed from every host.
    fn delete_tag(&self, name: &str) -> Result<(), StoreError>;

    fn get_host(&self, host: &str) -> Result<Option<Host>, StoreError>;

    /// All hosts, ordered by host key.
    fn list_hosts(&self) -> Result<Vec<Host>, StoreError>;

    /// Create a host with its scalar fields and initial tags. Unknown tag
    /// names are skipped.
    fn insert_host(
        &self,
        host: &str,
        fields: &HostFields,
        tags: &[String],
        vault: Option<&Vault>,
    ) -> Result<i64, StoreError>;

    /// Overwrite the scalar fields that are `Some` in `fields`. An empty
    /// credential clears the stored one. Tag membership is not touched.
    fn update_host(&self, id: i64, fields: &HostFields, vault: Option<&Vault>) -> Result<(), StoreError>;

    /// Delete a host by key, along with its tag assignments.
    fn delete_host(&self, host: &str) -> Result<(), StoreError>;

    /// Replace the full tag set of a host. Returns how many tags were assigned.
    fn set_host_tags(&self, host_id: i64, tags: &[String]) -> Result<usize, StoreError>;

    /// Tags assigned to a host, ordered by tag name.
    fn tags_for_host(&self, host_id: i64) -> Result<Vec<Tag>, StoreError>;

    /// Hosts carrying a tag, ordered by host key.
    fn hosts_for_tag(&self, tag_id: i64) -> Result<Vec<Host>, StoreError>;

    fn get_config(&self, name: &str) -> Result<Option<String>, StoreError>;

    /// Write a config row. Existing rows are never overwritten.
    fn insert_config(&self, name: &str, value: &str) -> Result<(), StoreError>;

    /// Write several config rows in one transaction. Fails without writing
    /// anything if any of the names already exists.
    fn insert_configs(&self, rows: &[(&str, &str)]) -> Result<(), StoreError>;
}

// ─── SQLite Implementation ──────────────────────────────────────────────────

pub struct SqliteInventoryStore<'a> {
    db: &'a Database,
}

impl<'a> SqliteInventoryStore<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    fn row_to_group(row: &rusqlite::Row<'_>) -> rusqlite::Result<TagGroup> {
        let selection: String = row.get(2)?;
        let selection_type = selection.parse::<SelectionType>().map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Text, Box::new(e))
        })?;

        Ok(TagGroup {
            id: row.get(0)?,
            name: row.get(1)?,
            selection_type,
        })
    }

    fn row_to_tag(row: &rusqlite::Row<'_>) -> rusqlite::Result<Tag> {
        Ok(Tag {
            id: row.get(0)?,
            group_id: row.get(1)?,
            group: row.get(2)?,
            name: row.get(3)?,
        })
    }

    fn row_to_host(row: &rusqlite::Row<'_>) -> rusqlite::Result<Host> {
        Ok(Host::new(
            row.get(0)?,
            row.get(1)?,
            row.get(2)?,
            row.get(3)?,
            row.get(4)?,
            row.get(5)?,
            row.get(6)?,
        ))
    }

    fn require_group_id(&self, tag: &str, group: &str) -> Result<i64, StoreError> {
        self.get_group(group)?
            .map(|g| g.id)
            .ok_or_else(|| StoreError::UnknownGroup {
                tag: tag.to_string(),
                group: group.to_string(),
            })
    }

    /// Resolve tag names to ids, dropping names that do not exist.
    fn resolve_tag_ids(conn: &rusqlite::Connection, tags: &[String]) -> Result<Vec<i64>, StoreError> {
        let mut stmt = conn.prepare("SELECT id FROM tag WHERE name = ?1")?;
        let mut ids = Vec::with_capacity(tags.len());

        for name in tags {
            match stmt.query_row(params![name], |row| row.get::<_, i64>(0)).optional()? {
                Some(id) => ids.push(id),
                None => tracing::debug!(tag = %name, "Skipping unknown tag"),
            }
        }

        Ok(ids)
    }

    fn assign_tags(conn: &rusqlite::Connection, host_id: i64, tags: &[String]) -> Result<usize, StoreError> {
        let ids = Self::resolve_tag_ids(conn, tags)?;
        let mut stmt =
            conn.prepare("INSERT OR IGNORE INTO host_tag_map (host_id, tag_id) VALUES (?1, ?2)")?;

        let mut assigned = 0;
        for tag_id in ids {
            assigned += stmt.execute(params![host_id, tag_id])?;
        }
        Ok(assigned)
    }

    fn collect<T>(
        &self,
        sql: &str,
        params: impl rusqlite::Params,
        map: fn(&rusqlite::Row<'_>) -> rusqlite::Result<T>,
    ) -> Result<Vec<T>, StoreError> {
        let mut stmt = self.db.conn().prepare(sql)?;
        let rows = stmt.query_map(params, map)?;

        let mut items = Vec::new();
        for row in rows {
            items.push(row?);
        }
        Ok(items)
    }
}

impl<'a> InventoryStore for SqliteInventoryStore<'a> {
    // ─── Tag groups ─────────────────────────────────────────────────────────

    fn get_group(&self, name: &str) -> Result<Option<TagGroup>, StoreError> {
        let group = self
            .db
            .conn()
            .query_row(
                "SELECT id, name, selection_type FROM tag_group WHERE name = ?1",
                params![name],
                Self::row_to_group,
            )
            .optional()?;
        Ok(group)
    }

    fn list_groups(&self) -> Result<Vec<TagGroup>, StoreError> {
        self.collect(
            "SELECT id, name, selection_type FROM tag_group ORDER BY name ASC",
            [],
            Self::row_to_group,
        )
    }

    fn insert_group(&self, name: &str, selection_type: SelectionType) -> Result<i64, StoreError> {
        if name.is_empty() {
            return Err(StoreError::InvalidField("tag group name must not be empty".to_string()));
        }
        if self.get_group(name)?.is_some() {
            return Err(StoreError::Duplicate {
                kind: "Tag Group",
                name: name.to_string(),
            });
        }

        self.db.conn().execute(
            "INSERT INTO tag_group (name, selection_type) VALUES (?1, ?2)",
            params![name, selection_type.as_str()],
        )?;
        let id = self.db.conn().last_insert_rowid();

        tracing::info!(group = %name, selection_type = %selection_type, "Tag group created");
        Ok(id)
    }

    fn update_group(&self, id: i64, selection_type: SelectionType) -> Result<(), StoreError> {
        let affected = self.db.conn().execute(
            "UPDATE tag_group SET selection_type = ?2 WHERE id = ?1",
            params![id, selection_type.as_str()],
        )?;
        if affected == 0 {
            return Err(StoreError::NotFound {
                kind: "Tag Group",
                name: format!("#{}", id),
            });
        }

        tracing::debug!(group_id = id, selection_type = %selection_type, "Tag group updated");
        Ok(())
    }

    fn delete_group(&self, name: &str) -> Result<(), StoreError> {
        let affected = self
            .db
            .conn()
            .execute("DELETE FROM tag_group WHERE name = ?1", params![name])?;
        if affected == 0 {
            return Err(StoreError::NotFound {
                kind: "Tag Group",
                name: name.to_string(),
            });
        }

        tracing::info!(group = %name, "Tag group deleted");
        Ok(())
    }

    // ─── Tags ───────────────────────────────────────────────────────────────

    fn get_tag(&self, name: &str) -> Result<Option<Tag>, StoreError> {
        let tag = self
            .db
            .conn()
            .query_row(
                &format!("{} WHERE t.name = ?1", TAG_SELECT),
                params![name],
                Self::row_to_tag,
            )
            .optional()?;
        Ok(tag)
    }

    fn list_tags(&self) -> Result<Vec<Tag>, StoreError> {
        self.collect(
            &format!("{} ORDER BY t.name ASC", TAG_SELECT),
            [],
            Self::row_to_tag,
        )
    }

    fn insert_tag(&self, name: &str, group: &str) -> Result<i64, StoreError> {
        if name.is_empty() {
            return Err(StoreError::InvalidField("tag name must not be empty".to_string()));
        }
        let group_id = self.require_group_id(name, group)?;
        if self.get_tag(name)?.is_some() {
            return Err(StoreError::Duplicate {
                kind: "Tag",
                name: name.to_string(),
            });
        }

        self.db.conn().execute(
            "INSERT INTO tag (group_id, name) VALUES (?1, ?2)",
            params![group_id, name],
        )?;
        let id = self.db.conn().last_insert_rowid();

        tracing::info!(tag = %name, group = %group, "Tag created");
        Ok(id)
    }

    fn update_tag(&self, id: i64, group: &str) -> Result<(), StoreError> {
        let name: Option<String> = self
            .db
            .conn()
            .query_row("SELECT name FROM tag WHERE id = ?1", params![id], |row| row.get(0))
            .optional()?;
        let name = name.ok_or_else(|| StoreError::NotFound {
            kind: "Tag",
            name: format!("#{}", id),
        })?;

        let group_id = self.require_group_id(&name, group)?;
        self.db.conn().execute(
            "UPDATE tag SET group_id = ?2 WHERE id = ?1",
            params![id, group_id],
        )?;

        tracing::debug!(tag = %name, group = %group, "Tag updated");
        Ok(())
    }

    fn delete_tag(&self, name: &str) -> Result<(), StoreError> {
        let affected = self
            .db
            .conn()
            .execute("DELETE FROM tag WHERE name = ?1", params![name])?;
        if affected == 0 {
            return Err(StoreError::NotFound {
                kind: "Tag",
                name: name.to_string(),
            });
        }

        tracing::info!(tag = %name, "Tag deleted");
        Ok(())
    }

    // ─── Hosts ──────────────────────────────────────────────────────────────

    fn get_host(&self, host: &str) -> Result<Option<Host>, StoreError> {
        let found = self
            .db
            .conn()
            .query_row(
                &format!("SELECT {} FROM host WHERE host = ?1", HOST_COLUMNS),
                params![host],
                Self::row_to_host,
            )
            .optional()?;
        Ok(found)
    }

    fn list_hosts(&self) -> Result<Vec<Host>, StoreError> {
        self.collect(
            &format!("SELECT {} FROM host ORDER BY host ASC", HOST_COLUMNS),
            [],
            Self::row_to_host,
        )
    }

    fn insert_host(
        &self,
        host: &str,
        fields: &HostFields,
        tags: &[String],
        vault: Option<&Vault>,
    ) -> Result<i64, StoreError> {
        if host.is_empty() {
            return Err(StoreError::InvalidField("host must not be empty".to_string()));
        }
        if self.get_host(host)?.is_some() {
            return Err(StoreError::Duplicate {
                kind: "Host",
                name: host.to_string(),
            });
        }

        let ssh_pass = fields.ssh_pass.as_deref().and_then(|p| seal(vault, p));
        let sudo_pass = fields.sudo_pass.as_deref().and_then(|p| seal(vault, p));

        let tx = self.db.conn().unchecked_transaction()?;

        tx.execute(
            "INSERT INTO host
                (host, host_name, ssh_user, ssh_port, encrypted_ssh_pass, encrypted_sudo_pass)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                host,
                fields.host_name,
                fields.ssh_user,
                fields.ssh_port,
                ssh_pass,
                sudo_pass,
            ],
        )?;
        let id = tx.last_insert_rowid();
        let assigned = Self::assign_tags(&tx, id, tags)?;

        tx.commit()?;

        tracing::info!(host = %host, tags = assigned, "Host created");
        Ok(id)
    }

    fn update_host(&self, id: i64, fields: &HostFields, vault: Option<&Vault>) -> Result<(), StoreError> {
        let ssh_pass = fields.ssh_pass.as_deref().and_then(|p| seal(vault, p));
        let sudo_pass = fields.sudo_pass.as_deref().and_then(|p| seal(vault, p));
        let clear_ssh_pass = fields.ssh_pass.as_deref() == Some("");
        let clear_sudo_pass = fields.sudo_pass.as_deref() == Some("");

        let affected = self.db.conn().execute(
            "UPDATE host SET
                host_name           = COALESCE(?2, host_name),
                ssh_user            = COALESCE(?3, ssh_user),
                ssh_port            = COALESCE(?4, ssh_port),
                encrypted_ssh_pass  = CASE WHEN ?7 THEN NULL ELSE COALESCE(?5, encrypted_ssh_pass) END,
                encrypted_sudo_pass = CASE WHEN ?8 THEN NULL ELSE COALESCE(?6, encrypted_sudo_pass) END
             WHERE id = ?1",
            params![
                id,
                fields.host_name,
                fields.ssh_user,
                fields.ssh_port,
                ssh_pass,
                sudo_pass,
                clear_ssh_pass,
                clear_sudo_pass,
            ],
        )?;
        if affected == 0 {
            return Err(StoreError::NotFound {
                kind: "Host",
                name: format!("#{}", id),
            });
        }

        tracing::debug!(host_id = id, "Host updated");
        Ok(())
    }

    fn delete_host(&self, host: &str) -> Result<(), StoreError> {
        let affected = self
            .db
            .conn()
            .execute("DELETE FROM host WHERE host = ?1", params![host])?;
        if affected == 0 {
            return Err(StoreError::NotFound {
                kind: "Host",
                name: host.to_string(),
            });
        }

        tracing::info!(host = %host, "Host deleted");
        Ok(())
    }

    fn set_host_tags(&self, host_id: i64, tags: &[String]) -> Result<usize, StoreError> {
        let tx = self.db.conn().unchecked_transaction()?;

        tx.execute("DELETE FROM host_tag_map WHERE host_id = ?1", params![host_id])?;
        let assigned = Self::assign_tags(&tx, host_id, tags)?;

        tx.commit()?;

        tracing::debug!(host_id, assigned, "Host tags replaced");
        Ok(assigned)
    }

    fn tags_for_host(&self, host_id: i64) -> Result<Vec<Tag>, StoreError> {
        self.collect(
            &format!(
                "{} JOIN host_tag_map m ON m.tag_id = t.id
                 WHERE m.host_id = ?1 ORDER BY t.name ASC",
                TAG_SELECT
            ),
            params![host_id],
            Self::row_to_tag,
        )
    }

    fn hosts_for_tag(&self, tag_id: i64) -> Result<Vec<Host>, StoreError> {
        self.collect(
            "SELECT h.id, h.host, h.host_name, h.ssh_user, h.ssh_port,
                    h.encrypted_ssh_pass, h.encrypted_sudo_pass
             FROM host h JOIN host_tag_map m ON m.host_id = h.id
             WHERE m.tag_id = ?1 ORDER BY h.host ASC",
            params![tag_id],
            Self::row_to_host,
        )
    }

    // ─── Config ─────────────────────────────────────────────────────────────

    fn get_config(&self, name: &str) -> Result<Option<String>, StoreError> {
        let value: Option<Option<String>> = self
            .db
            .conn()
            .query_row("SELECT value FROM config WHERE name = ?1", params![name], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(value.flatten())
    }

    fn insert_config(&self, name: &str, value: &str) -> Result<(), StoreError> {
        if self.get_config(name)?.is_some() {
            return Err(StoreError::Duplicate {
                kind: "Config",
                name: name.to_string(),
            });
        }

        self.db.conn().execute(
            "INSERT INTO config (name, value) VALUES (?1, ?2)",
            params![name, value],
        )?;

        tracing::debug!(config = %name, "Config row written");
        Ok(())
    }

    fn insert_configs(&self, rows: &[(&str, &str)]) -> Result<(), StoreError> {
        for (name, _) in rows {
            if self.get_config(name)?.is_some() {
                return Err(StoreError::Duplicate {
                    kind: "Config",
                    name: name.to_string(),
                });
            }
        }

        let tx = self.db.conn().unchecked_transaction()?;
        {
            let mut stmt = tx.prepare("INSERT INTO config (name, value) VALUES (?1, ?2)")?;
            for (name, value) in rows {
                stmt.execute(params![name, value])?;
            }
        }
        tx.commit()?;

        tracing::debug!(rows = rows.len(), "Config rows written");
        Ok(())
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
