//! SQLite schema migrations for the catalog database.

use super::schema;
use rusqlite::{Connection, types::Type};
use std::collections::HashSet;

/// Latest schema version understood by this binary.
pub const LATEST_SCHEMA_VERSION: u32 = 2;

struct Step {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

const STEPS: &[Step] = &[
    Step {
        version: 1,
        name: "catalog tables",
        sql: schema::MIGRATION_V1_SQL,
    },
    Step {
        version: 2,
        name: "parent indexes and merge log",
        sql: schema::MIGRATION_V2_SQL,
    },
];

/// Columns the merge engine reads or rewrites, per table. A catalog missing
/// any of them cannot be merged safely.
const MERGE_COLUMNS: &[(&str, &[&str])] = &[
    ("regions", &["id", "country_id", "name"]),
    ("appellations", &["id", "region_id", "name"]),
    ("sub_appellations", &["id", "appellation_id", "name"]),
    ("wines", &["id", "sub_appellation_id", "name", "grape_variety"]),
    ("wine_vintages", &["id", "wine_id", "vintage"]),
    ("bottles", &["id", "wine_vintage_id"]),
    ("evolution_scores", &["id", "wine_vintage_id"]),
    (
        "suggested_appellations",
        &["id", "sub_appellation_id", "taste_profile_id", "reason"],
    ),
    (
        "suggested_wines",
        &["id", "suggested_appellation_id", "wine_id", "vintage"],
    ),
    (
        "merge_log",
        &[
            "merge_id",
            "level",
            "leader_id",
            "leader_name",
            "follower_ids",
            "followers_merged",
            "merged_at_us",
        ],
    ),
];

/// Read `PRAGMA user_version` and convert it to a Rust `u32`.
///
/// # Errors
///
/// Returns an error if querying SQLite fails or the version value cannot be
/// represented as `u32`.
pub fn current_schema_version(conn: &Connection) -> rusqlite::Result<u32> {
    let version: i64 = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;
    u32::try_from(version).map_err(|error| {
        rusqlite::Error::FromSqlConversionFailure(0, Type::Integer, Box::new(error))
    })
}

/// Bring the catalog to [`LATEST_SCHEMA_VERSION`], then check that every
/// column the merge engine touches is present.
///
/// Each pending step runs in its own transaction together with its version
/// bump, so an interrupted upgrade resumes at the first unapplied step.
///
/// # Errors
///
/// Returns an error if a step fails, or
/// [`rusqlite::Error::InvalidColumnName`] naming `table.column` when the
/// resulting catalog lacks a merge column.
pub fn migrate(conn: &mut Connection) -> rusqlite::Result<u32> {
    let from = current_schema_version(conn)?;

    for step in STEPS.iter().filter(|step| step.version > from) {
        let tx = conn.transaction()?;
        tx.execute_batch(step.sql)?;
        tx.pragma_update(None, "user_version", i64::from(step.version))?;
        tx.execute(
            "UPDATE catalog_meta SET schema_version = ?1 WHERE id = 1",
            [i64::from(step.version)],
        )?;
        tx.commit()?;
        tracing::debug!(version = step.version, step = step.name, "applied catalog migration");
    }

    check_merge_columns(conn)?;
    current_schema_version(conn)
}

fn check_merge_columns(conn: &Connection) -> rusqlite::Result<()> {
    let mut stmt = conn.prepare("SELECT name FROM pragma_table_info(?1)")?;
    for (table, columns) in MERGE_COLUMNS {
        let present = stmt
            .query_map([table], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<HashSet<String>>>()?;
        if let Some(missing) = columns.iter().find(|column| !present.contains(**column)) {
            return Err(rusqlite::Error::InvalidColumnName(format!("{table}.{missing}")));
        }
    }
    Ok(())
}
