//! SQLite catalog database utilities.
//!
//! Runtime defaults:
//! - `journal_mode = WAL` so readers keep working while a merge holds the writer
//! - `busy_timeout = 5s` to absorb short lock waits before surfacing `SQLITE_BUSY`
//! - `foreign_keys = ON` so a half-finished reparent can never commit orphans

pub mod insert;
pub mod migrations;
pub mod query;
pub mod schema;

use anyhow::{Context, Result};
use rusqlite::Connection;
use std::{
    path::{Path, PathBuf},
    time::Duration,
};

/// Busy timeout used for catalog connections unless configured otherwise.
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Directory (relative to the project root) holding catalog state.
pub const CATALOG_DIR: &str = ".cellar";

/// Catalog database file name inside [`CATALOG_DIR`].
pub const CATALOG_FILE: &str = "cellar.db";

/// Default catalog path for a project root.
#[must_use]
pub fn catalog_path(project_root: &Path) -> PathBuf {
    project_root.join(CATALOG_DIR).join(CATALOG_FILE)
}

/// Open (or create) the catalog database, apply runtime pragmas, and migrate
/// the schema to the latest version.
///
/// # Errors
///
/// Returns an error if opening/configuring/migrating the database fails.
pub fn open_catalog(path: &Path, busy_timeout: Duration) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create catalog directory {}", parent.display()))?;
    }

    let mut conn = Connection::open(path)
        .with_context(|| format!("open catalog database {}", path.display()))?;

    configure_connection(&conn, busy_timeout).context("configure sqlite pragmas")?;
    migrations::migrate(&mut conn).context("apply catalog migrations")?;

    Ok(conn)
}

/// Open the catalog only if it already exists.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be opened or migrated.
pub fn try_open_catalog(path: &Path, busy_timeout: Duration) -> Result<Option<Connection>> {
    if !path.exists() {
        return Ok(None);
    }
    open_catalog(path, busy_timeout).map(Some)
}

/// Open a migrated in-memory catalog with foreign keys enforced.
///
/// # Errors
///
/// Returns an error if SQLite cannot allocate the database or migrate it.
pub fn open_in_memory() -> rusqlite::Result<Connection> {
    let mut conn = Connection::open_in_memory()?;
    conn.pragma_update(None, "foreign_keys", "ON")?;
    migrations::migrate(&mut conn)?;
    Ok(conn)
}

fn configure_connection(conn: &Connection, busy_timeout: Duration) -> rusqlite::Result<()> {
    conn.pragma_update(None, "foreign_keys", "ON")?;
    conn.pragma_update(None, "synchronous", "NORMAL")?;
    let _journal_mode: String =
        conn.query_row("PRAGMA journal_mode = WAL", [], |row| row.get(0))?;
    conn.busy_timeout(busy_timeout)?;
    Ok(())
}
