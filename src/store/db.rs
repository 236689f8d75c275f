// dbinventory — SQLite Database Management
//
// Opens (or creates) the inventory database and makes sure the schema is
// present. Foreign keys are switched on for every connection so that tag,
// group and host deletions cascade to the rows that depend on them.

use std::path::Path;

use rusqlite::{Connection, OpenFlags};

use super::StoreError;

/// Wrapper around the SQLite connection that holds the inventory.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open an existing inventory database. Fails if the file does not exist.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if !path.is_file() {
            return Err(StoreError::Missing(path.display().to_string()));
        }

        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        Self::from_connection(conn)
    }

    /// Open the database at `path`, creating the file (and its parent
    /// directory) when it does not exist yet.
    pub fn open_or_create(path: &Path) -> Result<Self, StoreError> {
        if !path.exists() {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)
                    .map_err(|e| StoreError::Other(format!("cannot create {}: {}", parent.display(), e)))?;
            }
            tracing::info!(path = %path.display(), "Creating new inventory database");
        }

        let conn = Connection::open(path)?;
        Self::from_connection(conn)
    }

    /// Open an in-memory database (for testing only).
    #[cfg(test)]
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.pragma_update(None, "foreign_keys", "ON")?;

        let db = Self { conn };
        db.run_migrations()?;
        Ok(db)
    }

    /// Get a reference to the underlying connection.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Create the inventory tables when they are missing.
    fn run_migrations(&self) -> Result<(), StoreError> {
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS tag_group (
                id              INTEGER PRIMARY KEY,
                name            TEXT NOT NULL UNIQUE,
                selection_type  TEXT NOT NULL DEFAULT 'select'
                                CHECK (selection_type IN ('select', 'multiselect'))
            );

            CREATE TABLE IF NOT EXISTS tag (
                id          INTEGER PRIMARY KEY,
                group_id    INTEGER NOT NULL,
                name        TEXT NOT NULL UNIQUE,
                FOREIGN KEY(group_id) REFERENCES tag_group(id) ON DELETE CASCADE
            );

            CREATE TABLE IF NOT EXISTS host (
                id                  INTEGER PRIMARY KEY,
                host                TEXT NOT NULL UNIQUE CHECK (host <> ''),
                host_name           TEXT,
                ssh_user            TEXT,
                ssh_port            INTEGER,
                encrypted_ssh_pass  TEXT,
                encrypted_sudo_pass TEXT
            );

            CREATE TABLE IF NOT EXISTS host_tag_map (
                host_id     INTEGER NOT NULL,
                tag_id      INTEGER NOT NULL,
                PRIMARY KEY (host_id, tag_id),
                FOREIGN KEY(host_id) REFERENCES host(id) ON DELETE CASCADE,
                FOREIGN KEY(tag_id) REFERENCES tag(id) ON DELETE CASCADE
            );

            CREATE TABLE IF NOT EXISTS config (
                id      INTEGER PRIMARY KEY,
                name    TEXT NOT NULL UNIQUE,
                value   TEXT
            );

            CREATE INDEX IF NOT EXISTS idx_host_tag_map_tag
                ON host_tag_map(tag_id);
            ",
        )?;

        tracing::debug!("Database migrations completed successfully");
        Ok(())
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
