//! Canonical SQLite schema for the cellar catalog.
//!
//! The hierarchy is modelled with explicit parent foreign keys:
//! - `countries` → `regions` → `appellations` → `sub_appellations` → `wines`
//!   → `wine_vintages` → (`bottles`, `evolution_scores`)
//! - `suggested_appellations` hang off a sub-appellation and a taste profile;
//!   `suggested_wines` join a wine to a suggested appellation
//! - every child FK is `ON DELETE RESTRICT`, so deleting a row that still has
//!   children fails instead of orphaning or cascading
//! - `catalog_meta` tracks the schema version

/// Migration v1: hierarchy tables and catalog metadata.
pub const MIGRATION_V1_SQL: &str = r"
CREATE TABLE IF NOT EXISTS countries (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS regions (
    id TEXT PRIMARY KEY,
    country_id TEXT NOT NULL REFERENCES countries(id) ON DELETE RESTRICT,
    name TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS appellations (
    id TEXT PRIMARY KEY,
    region_id TEXT NOT NULL REFERENCES regions(id) ON DELETE RESTRICT,
    name TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS sub_appellations (
    id TEXT PRIMARY KEY,
    appellation_id TEXT NOT NULL REFERENCES appellations(id) ON DELETE RESTRICT,
    name TEXT
);

CREATE TABLE IF NOT EXISTS wines (
    id TEXT PRIMARY KEY,
    sub_appellation_id TEXT NOT NULL REFERENCES sub_appellations(id) ON DELETE RESTRICT,
    name TEXT NOT NULL,
    grape_variety TEXT,
    color TEXT
);

CREATE TABLE IF NOT EXISTS wine_vintages (
    id TEXT PRIMARY KEY,
    wine_id TEXT NOT NULL REFERENCES wines(id) ON DELETE RESTRICT,
    vintage INTEGER NOT NULL,
    UNIQUE (wine_id, vintage)
);

CREATE TABLE IF NOT EXISTS bottles (
    id TEXT PRIMARY KEY,
    wine_vintage_id TEXT NOT NULL REFERENCES wine_vintages(id) ON DELETE RESTRICT,
    price REAL,
    is_drunk INTEGER NOT NULL DEFAULT 0 CHECK (is_drunk IN (0, 1)),
    drunk_at TEXT,
    note TEXT
);

CREATE TABLE IF NOT EXISTS evolution_scores (
    id TEXT PRIMARY KEY,
    wine_vintage_id TEXT NOT NULL REFERENCES wine_vintages(id) ON DELETE RESTRICT,
    year INTEGER NOT NULL,
    score REAL NOT NULL
);

CREATE TABLE IF NOT EXISTS taste_profiles (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS suggested_appellations (
    id TEXT PRIMARY KEY,
    sub_appellation_id TEXT NOT NULL REFERENCES sub_appellations(id) ON DELETE RESTRICT,
    taste_profile_id TEXT NOT NULL REFERENCES taste_profiles(id) ON DELETE RESTRICT,
    reason TEXT,
    UNIQUE (sub_appellation_id, taste_profile_id)
);

CREATE TABLE IF NOT EXISTS suggested_wines (
    id TEXT PRIMARY KEY,
    suggested_appellation_id TEXT NOT NULL
        REFERENCES suggested_appellations(id) ON DELETE RESTRICT,
    wine_id TEXT NOT NULL REFERENCES wines(id) ON DELETE RESTRICT,
    vintage TEXT,
    UNIQUE (suggested_appellation_id, wine_id)
);

CREATE TABLE IF NOT EXISTS catalog_meta (
    id INTEGER PRIMARY KEY CHECK (id = 1),
    schema_version INTEGER NOT NULL
);

INSERT OR IGNORE INTO catalog_meta (id, schema_version) VALUES (1, 1);
";

/// Migration v2: foreign-key lookup indexes and the merge audit log.
pub const MIGRATION_V2_SQL: &str = r"
CREATE INDEX IF NOT EXISTS idx_regions_country ON regions(country_id);
CREATE INDEX IF NOT EXISTS idx_appellations_region ON appellations(region_id);
CREATE INDEX IF NOT EXISTS idx_sub_appellations_appellation ON sub_appellations(appellation_id);
CREATE INDEX IF NOT EXISTS idx_wines_sub_appellation ON wines(sub_appellation_id);
CREATE INDEX IF NOT EXISTS idx_bottles_vintage ON bottles(wine_vintage_id);
CREATE INDEX IF NOT EXISTS idx_evolution_scores_vintage ON evolution_scores(wine_vintage_id);
CREATE INDEX IF NOT EXISTS idx_suggested_appellations_profile
    ON suggested_appellations(taste_profile_id);
CREATE INDEX IF NOT EXISTS idx_suggested_wines_wine ON suggested_wines(wine_id);

CREATE TABLE IF NOT EXISTS merge_log (
    merge_id INTEGER PRIMARY KEY AUTOINCREMENT,
    level TEXT NOT NULL CHECK (
        level IN ('country', 'region', 'appellation', 'sub-appellation', 'wine')
    ),
    leader_id TEXT NOT NULL,
    leader_name TEXT NOT NULL,
    follower_ids TEXT NOT NULL,
    followers_merged INTEGER NOT NULL CHECK (followers_merged > 0),
    merged_at_us INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_merge_log_merged ON merge_log(merged_at_us DESC);

UPDATE catalog_meta
SET schema_version = 2
WHERE id = 1;
";

/// Indexes expected by the merge engine's child lookups.
pub const REQUIRED_INDEXES: &[&str] = &[
    "idx_regions_country",
    "idx_appellations_region",
    "idx_sub_appellations_appellation",
    "idx_wines_sub_appellation",
    "idx_bottles_vintage",
    "idx_evolution_scores_vintage",
    "idx_suggested_appellations_profile",
    "idx_suggested_wines_wine",
    "idx_merge_log_merged",
];

#[cfg(test)]
mod tests {
    use crate::db::migrations;
    use rusqlite::Connection;

    fn query_plan_details(conn: &Connection, sql: &str) -> rusqlite::Result<Vec<String>> {
        let mut stmt = conn.prepare(&format!("EXPLAIN QUERY PLAN {sql}"))?;
        stmt.query_map([], |row| row.get::<_, String>(3))?
            .collect::<Result<Vec<_>, _>>()
    }

    fn migrated() -> rusqlite::Result<Connection> {
        let mut conn = Connection::open_in_memory()?;
        migrations::migrate(&mut conn)?;
        Ok(conn)
    }

    #[test]
    fn child_lookup_uses_parent_index() -> rusqlite::Result<()> {
        let conn = migrated()?;
        let details = query_plan_details(
            &conn,
            "SELECT id FROM wines WHERE sub_appellation_id = 'x'",
        )?;

        assert!(
            details
                .iter()
                .any(|detail| detail.contains("idx_wines_sub_appellation")),
            "expected wine parent index in plan, got: {details:?}"
        );
        Ok(())
    }

    #[test]
    fn bottle_reparent_uses_vintage_index() -> rusqlite::Result<()> {
        let conn = migrated()?;
        let details = query_plan_details(
            &conn,
            "SELECT id FROM bottles WHERE wine_vintage_id = 'x'",
        )?;

        assert!(
            details
                .iter()
                .any(|detail| detail.contains("idx_bottles_vintage")),
            "expected bottle vintage index in plan, got: {details:?}"
        );
        Ok(())
    }

    #[test]
    fn foreign_keys_restrict_orphaning_deletes() -> rusqlite::Result<()> {
        let conn = migrated()?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.execute_batch(
            "INSERT INTO countries (id, name) VALUES ('c1', 'France');
             INSERT INTO regions (id, country_id, name) VALUES ('r1', 'c1', 'Bordeaux');",
        )?;

        let deleted = conn.execute("DELETE FROM countries WHERE id = 'c1'", []);
        assert!(deleted.is_err(), "deleting a parent with children must fail");
        Ok(())
    }
}
