//! `SQLite` repository functions for the catalog.
//!
//! Every function takes a `&Connection`. A `rusqlite::Transaction` derefs to
//! `Connection`, so the merge engine passes its open transaction handle
//! straight through and every read observes the merge's own earlier writes.
//!
//! Functions return `rusqlite::Result` rather than `anyhow::Result` so callers
//! can still classify busy/locked failures as transient.

use crate::model::{
    AppellationId, AppellationRow, BottleRow, CountryId, CountryRow, EntityId, EntityKind,
    EvolutionScoreRow, MergeLevel, RegionId, RegionRow, SubAppellationId, SubAppellationRow,
    SuggestedAppellationId, SuggestedAppellationRow, SuggestedWineId, SuggestedWineRow,
    TasteProfileId, TasteProfileRow, WineId, WineRow, WineVintageId, WineVintageRow,
};
use rusqlite::{Connection, OptionalExtension, Row, params, types::Type};
use serde::Serialize;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

/// One node of a hierarchy listing with its direct child count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NodeSummary {
    pub id: Uuid,
    pub name: Option<String>,
    pub parent_id: Option<Uuid>,
    pub children: i64,
}

/// Bottle and evolution-score totals beneath one wine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct LeafCounts {
    pub bottles: i64,
    pub evolution_scores: i64,
}

/// A committed merge, as recorded in `merge_log`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MergeLogEntry {
    pub merge_id: i64,
    pub level: MergeLevel,
    pub leader_id: Uuid,
    pub leader_name: String,
    pub follower_ids: Vec<Uuid>,
    pub followers_merged: i64,
    pub merged_at_us: i64,
}

// ---------------------------------------------------------------------------
// Row mappers
// ---------------------------------------------------------------------------

fn country_from_row(row: &Row<'_>) -> rusqlite::Result<CountryRow> {
    Ok(CountryRow {
        id: row.get(0)?,
        name: row.get(1)?,
    })
}

fn region_from_row(row: &Row<'_>) -> rusqlite::Result<RegionRow> {
    Ok(RegionRow {
        id: row.get(0)?,
        country_id: row.get(1)?,
        name: row.get(2)?,
    })
}

fn appellation_from_row(row: &Row<'_>) -> rusqlite::Result<AppellationRow> {
    Ok(AppellationRow {
        id: row.get(0)?,
        region_id: row.get(1)?,
        name: row.get(2)?,
    })
}

fn sub_appellation_from_row(row: &Row<'_>) -> rusqlite::Result<SubAppellationRow> {
    Ok(SubAppellationRow {
        id: row.get(0)?,
        appellation_id: row.get(1)?,
        name: row.get(2)?,
    })
}

fn wine_from_row(row: &Row<'_>) -> rusqlite::Result<WineRow> {
    Ok(WineRow {
        id: row.get(0)?,
        sub_appellation_id: row.get(1)?,
        name: row.get(2)?,
        grape_variety: row.get(3)?,
        color: row.get(4)?,
    })
}

fn vintage_from_row(row: &Row<'_>) -> rusqlite::Result<WineVintageRow> {
    Ok(WineVintageRow {
        id: row.get(0)?,
        wine_id: row.get(1)?,
        vintage: row.get(2)?,
    })
}

fn bottle_from_row(row: &Row<'_>) -> rusqlite::Result<BottleRow> {
    Ok(BottleRow {
        id: row.get(0)?,
        wine_vintage_id: row.get(1)?,
        price: row.get(2)?,
        is_drunk: row.get(3)?,
        drunk_at: row.get(4)?,
        note: row.get(5)?,
    })
}

fn score_from_row(row: &Row<'_>) -> rusqlite::Result<EvolutionScoreRow> {
    Ok(EvolutionScoreRow {
        id: row.get(0)?,
        wine_vintage_id: row.get(1)?,
        year: row.get(2)?,
        score: row.get(3)?,
    })
}

fn suggested_appellation_from_row(row: &Row<'_>) -> rusqlite::Result<SuggestedAppellationRow> {
    Ok(SuggestedAppellationRow {
        id: row.get(0)?,
        sub_appellation_id: row.get(1)?,
        taste_profile_id: row.get(2)?,
        reason: row.get(3)?,
    })
}

fn suggested_wine_from_row(row: &Row<'_>) -> rusqlite::Result<SuggestedWineRow> {
    Ok(SuggestedWineRow {
        id: row.get(0)?,
        suggested_appellation_id: row.get(1)?,
        wine_id: row.get(2)?,
        vintage: row.get(3)?,
    })
}

fn uuid_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<Uuid> {
    let text: String = row.get(idx)?;
    Uuid::parse_str(&text)
        .map_err(|err| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err)))
}

fn collect<T, P: rusqlite::Params>(
    conn: &Connection,
    sql: &str,
    params: P,
    map: fn(&Row<'_>) -> rusqlite::Result<T>,
) -> rusqlite::Result<Vec<T>> {
    let mut stmt = conn.prepare_cached(sql)?;
    let rows = stmt.query_map(params, map)?;
    rows.collect()
}

// ---------------------------------------------------------------------------
// Single-row lookups
// ---------------------------------------------------------------------------

/// Fetch a country by id.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn get_country(conn: &Connection, id: CountryId) -> rusqlite::Result<Option<CountryRow>> {
    conn.query_row(
        "SELECT id, name FROM countries WHERE id = ?1",
        [id],
        country_from_row,
    )
    .optional()
}

/// Fetch a region by id.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn get_region(conn: &Connection, id: RegionId) -> rusqlite::Result<Option<RegionRow>> {
    conn.query_row(
        "SELECT id, country_id, name FROM regions WHERE id = ?1",
        [id],
        region_from_row,
    )
    .optional()
}

/// Fetch an appellation by id.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn get_appellation(
    conn: &Connection,
    id: AppellationId,
) -> rusqlite::Result<Option<AppellationRow>> {
    conn.query_row(
        "SELECT id, region_id, name FROM appellations WHERE id = ?1",
        [id],
        appellation_from_row,
    )
    .optional()
}

/// Fetch a sub-appellation by id.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn get_sub_appellation(
    conn: &Connection,
    id: SubAppellationId,
) -> rusqlite::Result<Option<SubAppellationRow>> {
    conn.query_row(
        "SELECT id, appellation_id, name FROM sub_appellations WHERE id = ?1",
        [id],
        sub_appellation_from_row,
    )
    .optional()
}

/// Fetch a wine by id.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn get_wine(conn: &Connection, id: WineId) -> rusqlite::Result<Option<WineRow>> {
    conn.query_row(
        "SELECT id, sub_appellation_id, name, grape_variety, color FROM wines WHERE id = ?1",
        [id],
        wine_from_row,
    )
    .optional()
}

/// Fetch a taste profile by id.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn get_taste_profile(
    conn: &Connection,
    id: TasteProfileId,
) -> rusqlite::Result<Option<TasteProfileRow>> {
    conn.query_row(
        "SELECT id, name FROM taste_profiles WHERE id = ?1",
        [id],
        |row| {
            Ok(TasteProfileRow {
                id: row.get(0)?,
                name: row.get(1)?,
            })
        },
    )
    .optional()
}

/// Whether a row with this id exists.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn exists<I: EntityId>(conn: &Connection, id: I) -> rusqlite::Result<bool> {
    let sql = format!(
        "SELECT EXISTS(SELECT 1 FROM {} WHERE id = ?1)",
        I::KIND.table()
    );
    conn.prepare_cached(&sql)?.query_row([id], |row| row.get(0))
}

// ---------------------------------------------------------------------------
// Children by parent id (insertion order)
// ---------------------------------------------------------------------------

/// Regions of a country.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn regions_of(conn: &Connection, country: CountryId) -> rusqlite::Result<Vec<RegionRow>> {
    collect(
        conn,
        "SELECT id, country_id, name FROM regions WHERE country_id = ?1 ORDER BY rowid",
        [country],
        region_from_row,
    )
}

/// Appellations of a region.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn appellations_of(
    conn: &Connection,
    region: RegionId,
) -> rusqlite::Result<Vec<AppellationRow>> {
    collect(
        conn,
        "SELECT id, region_id, name FROM appellations WHERE region_id = ?1 ORDER BY rowid",
        [region],
        appellation_from_row,
    )
}

/// Sub-appellations of an appellation.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn sub_appellations_of(
    conn: &Connection,
    appellation: AppellationId,
) -> rusqlite::Result<Vec<SubAppellationRow>> {
    collect(
        conn,
        "SELECT id, appellation_id, name FROM sub_appellations
         WHERE appellation_id = ?1 ORDER BY rowid",
        [appellation],
        sub_appellation_from_row,
    )
}

/// Wines of a sub-appellation.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn wines_of(conn: &Connection, sub: SubAppellationId) -> rusqlite::Result<Vec<WineRow>> {
    collect(
        conn,
        "SELECT id, sub_appellation_id, name, grape_variety, color FROM wines
         WHERE sub_appellation_id = ?1 ORDER BY rowid",
        [sub],
        wine_from_row,
    )
}

/// Vintages of a wine.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn vintages_of(conn: &Connection, wine: WineId) -> rusqlite::Result<Vec<WineVintageRow>> {
    collect(
        conn,
        "SELECT id, wine_id, vintage FROM wine_vintages WHERE wine_id = ?1 ORDER BY rowid",
        [wine],
        vintage_from_row,
    )
}

/// Bottles of a vintage.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn bottles_of(conn: &Connection, vintage: WineVintageId) -> rusqlite::Result<Vec<BottleRow>> {
    collect(
        conn,
        "SELECT id, wine_vintage_id, price, is_drunk, drunk_at, note FROM bottles
         WHERE wine_vintage_id = ?1 ORDER BY rowid",
        [vintage],
        bottle_from_row,
    )
}

/// Evolution scores of a vintage.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn evolution_scores_of(
    conn: &Connection,
    vintage: WineVintageId,
) -> rusqlite::Result<Vec<EvolutionScoreRow>> {
    collect(
        conn,
        "SELECT id, wine_vintage_id, year, score FROM evolution_scores
         WHERE wine_vintage_id = ?1 ORDER BY rowid",
        [vintage],
        score_from_row,
    )
}

/// Suggested appellations attached to a sub-appellation.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn suggested_appellations_of(
    conn: &Connection,
    sub: SubAppellationId,
) -> rusqlite::Result<Vec<SuggestedAppellationRow>> {
    collect(
        conn,
        "SELECT id, sub_appellation_id, taste_profile_id, reason FROM suggested_appellations
         WHERE sub_appellation_id = ?1 ORDER BY rowid",
        [sub],
        suggested_appellation_from_row,
    )
}

/// Suggested-wine rows pointing at a wine.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn suggested_wines_of_wine(
    conn: &Connection,
    wine: WineId,
) -> rusqlite::Result<Vec<SuggestedWineRow>> {
    collect(
        conn,
        "SELECT id, suggested_appellation_id, wine_id, vintage FROM suggested_wines
         WHERE wine_id = ?1 ORDER BY rowid",
        [wine],
        suggested_wine_from_row,
    )
}

/// Suggested-wine rows owned by a suggested appellation.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn suggested_wines_of_appellation(
    conn: &Connection,
    suggested: SuggestedAppellationId,
) -> rusqlite::Result<Vec<SuggestedWineRow>> {
    collect(
        conn,
        "SELECT id, suggested_appellation_id, wine_id, vintage FROM suggested_wines
         WHERE suggested_appellation_id = ?1 ORDER BY rowid",
        [suggested],
        suggested_wine_from_row,
    )
}

// ---------------------------------------------------------------------------
// Reparenting
// ---------------------------------------------------------------------------

/// Point one row's foreign key `column` at `parent`. Fails with
/// `QueryReturnedNoRows` when the row is gone.
fn set_parent<I: EntityId, P: EntityId>(
    conn: &Connection,
    column: &str,
    id: I,
    parent: P,
) -> rusqlite::Result<()> {
    let sql = format!("UPDATE {} SET {column} = ?1 WHERE id = ?2", I::KIND.table());
    let changed = conn.prepare_cached(&sql)?.execute(params![parent, id])?;
    if changed == 0 {
        return Err(rusqlite::Error::QueryReturnedNoRows);
    }
    Ok(())
}

/// Move a region under another country.
///
/// # Errors
///
/// Returns an error if the update fails or the region no longer exists.
pub fn reparent_region(conn: &Connection, id: RegionId, to: CountryId) -> rusqlite::Result<()> {
    set_parent(conn, "country_id", id, to)
}

/// Move an appellation under another region.
///
/// # Errors
///
/// Returns an error if the update fails or the appellation no longer exists.
pub fn reparent_appellation(
    conn: &Connection,
    id: AppellationId,
    to: RegionId,
) -> rusqlite::Result<()> {
    set_parent(conn, "region_id", id, to)
}

/// Move a sub-appellation under another appellation.
///
/// # Errors
///
/// Returns an error if the update fails or the row no longer exists.
pub fn reparent_sub_appellation(
    conn: &Connection,
    id: SubAppellationId,
    to: AppellationId,
) -> rusqlite::Result<()> {
    set_parent(conn, "appellation_id", id, to)
}

/// Move a wine under another sub-appellation.
///
/// # Errors
///
/// Returns an error if the update fails or the wine no longer exists.
pub fn reparent_wine(conn: &Connection, id: WineId, to: SubAppellationId) -> rusqlite::Result<()> {
    set_parent(conn, "sub_appellation_id", id, to)
}

/// Move a vintage under another wine.
///
/// # Errors
///
/// Returns an error if the update fails or the vintage no longer exists.
pub fn reparent_vintage(conn: &Connection, id: WineVintageId, to: WineId) -> rusqlite::Result<()> {
    set_parent(conn, "wine_id", id, to)
}

/// Move a suggested appellation under another sub-appellation.
///
/// # Errors
///
/// Returns an error if the update fails or the row no longer exists.
pub fn reparent_suggested_appellation(
    conn: &Connection,
    id: SuggestedAppellationId,
    to: SubAppellationId,
) -> rusqlite::Result<()> {
    set_parent(conn, "sub_appellation_id", id, to)
}

/// Point a suggested wine at another wine.
///
/// # Errors
///
/// Returns an error if the update fails or the row no longer exists.
pub fn reparent_suggested_wine_to_wine(
    conn: &Connection,
    id: SuggestedWineId,
    to: WineId,
) -> rusqlite::Result<()> {
    set_parent(conn, "wine_id", id, to)
}

/// Move a suggested wine under another suggested appellation.
///
/// # Errors
///
/// Returns an error if the update fails or the row no longer exists.
pub fn reparent_suggested_wine_to_appellation(
    conn: &Connection,
    id: SuggestedWineId,
    to: SuggestedAppellationId,
) -> rusqlite::Result<()> {
    set_parent(conn, "suggested_appellation_id", id, to)
}

/// Move every bottle of `from` to `to`, returning how many moved.
///
/// # Errors
///
/// Returns an error if the update fails.
pub fn move_bottles(
    conn: &Connection,
    from: WineVintageId,
    to: WineVintageId,
) -> rusqlite::Result<usize> {
    conn.prepare_cached("UPDATE bottles SET wine_vintage_id = ?1 WHERE wine_vintage_id = ?2")?
        .execute(params![to, from])
}

/// Move every evolution score of `from` to `to`, returning how many moved.
///
/// # Errors
///
/// Returns an error if the update fails.
pub fn move_evolution_scores(
    conn: &Connection,
    from: WineVintageId,
    to: WineVintageId,
) -> rusqlite::Result<usize> {
    conn.prepare_cached(
        "UPDATE evolution_scores SET wine_vintage_id = ?1 WHERE wine_vintage_id = ?2",
    )?
    .execute(params![to, from])
}

// ---------------------------------------------------------------------------
// Backfills: only ever fill an empty value, never overwrite
// ---------------------------------------------------------------------------

/// Set the wine's grape variety when it is currently empty.
///
/// # Errors
///
/// Returns an error if the update fails.
pub fn backfill_grape_variety(
    conn: &Connection,
    wine: WineId,
    value: &str,
) -> rusqlite::Result<bool> {
    let changed = conn
        .prepare_cached(
            "UPDATE wines SET grape_variety = ?1
             WHERE id = ?2 AND (grape_variety IS NULL OR trim(grape_variety) = '')",
        )?
        .execute(params![value, wine])?;
    Ok(changed > 0)
}

/// Set the suggested appellation's reason when it is currently empty.
///
/// # Errors
///
/// Returns an error if the update fails.
pub fn backfill_reason(
    conn: &Connection,
    suggested: SuggestedAppellationId,
    value: &str,
) -> rusqlite::Result<bool> {
    let changed = conn
        .prepare_cached(
            "UPDATE suggested_appellations SET reason = ?1
             WHERE id = ?2 AND (reason IS NULL OR trim(reason) = '')",
        )?
        .execute(params![value, suggested])?;
    Ok(changed > 0)
}

/// Set the suggested wine's vintage text when it is currently empty.
///
/// # Errors
///
/// Returns an error if the update fails.
pub fn backfill_suggested_vintage(
    conn: &Connection,
    suggested: SuggestedWineId,
    value: &str,
) -> rusqlite::Result<bool> {
    let changed = conn
        .prepare_cached(
            "UPDATE suggested_wines SET vintage = ?1
             WHERE id = ?2 AND (vintage IS NULL OR trim(vintage) = '')",
        )?
        .execute(params![value, suggested])?;
    Ok(changed > 0)
}

// ---------------------------------------------------------------------------
// Deletion
// ---------------------------------------------------------------------------

/// Delete one row by id. Fails with `QueryReturnedNoRows` when the row is
/// already gone, and with a constraint error if children still reference it.
///
/// # Errors
///
/// Returns an error if the delete fails.
pub fn delete_by_id<I: EntityId>(conn: &Connection, id: I) -> rusqlite::Result<()> {
    let sql = format!("DELETE FROM {} WHERE id = ?1", I::KIND.table());
    let deleted = conn.prepare_cached(&sql)?.execute([id])?;
    if deleted == 0 {
        return Err(rusqlite::Error::QueryReturnedNoRows);
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Counts and listings
// ---------------------------------------------------------------------------

/// Total number of rows of one entity kind.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn count_rows(conn: &Connection, kind: EntityKind) -> rusqlite::Result<i64> {
    let sql = format!("SELECT COUNT(*) FROM {}", kind.table());
    conn.query_row(&sql, [], |row| row.get(0))
}

/// Bottle and evolution-score totals across every vintage of a wine.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn leaf_counts_for_wine(conn: &Connection, wine: WineId) -> rusqlite::Result<LeafCounts> {
    conn.query_row(
        "SELECT
            (SELECT COUNT(*) FROM bottles b
               JOIN wine_vintages v ON v.id = b.wine_vintage_id
              WHERE v.wine_id = ?1),
            (SELECT COUNT(*) FROM evolution_scores s
               JOIN wine_vintages v ON v.id = s.wine_vintage_id
              WHERE v.wine_id = ?1)",
        [wine],
        |row| {
            Ok(LeafCounts {
                bottles: row.get(0)?,
                evolution_scores: row.get(1)?,
            })
        },
    )
}

const fn listing_sql(level: MergeLevel) -> (&'static str, &'static str) {
    match level {
        MergeLevel::Country => (
            "SELECT c.id, c.name, NULL,
                    (SELECT COUNT(*) FROM regions r WHERE r.country_id = c.id)
             FROM countries c",
            "NULL",
        ),
        MergeLevel::Region => (
            "SELECT r.id, r.name, r.country_id,
                    (SELECT COUNT(*) FROM appellations a WHERE a.region_id = r.id)
             FROM regions r",
            "r.country_id",
        ),
        MergeLevel::Appellation => (
            "SELECT a.id, a.name, a.region_id,
                    (SELECT COUNT(*) FROM sub_appellations s WHERE s.appellation_id = a.id)
             FROM appellations a",
            "a.region_id",
        ),
        MergeLevel::SubAppellation => (
            "SELECT s.id, s.name, s.appellation_id,
                    (SELECT COUNT(*) FROM wines w WHERE w.sub_appellation_id = s.id)
             FROM sub_appellations s",
            "s.appellation_id",
        ),
        MergeLevel::Wine => (
            "SELECT w.id, w.name, w.sub_appellation_id,
                    (SELECT COUNT(*) FROM wine_vintages v WHERE v.wine_id = w.id)
             FROM wines w",
            "w.sub_appellation_id",
        ),
    }
}

/// List the nodes of one level, optionally restricted to a parent, ordered by
/// name (case-insensitive) then id.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn list_nodes(
    conn: &Connection,
    level: MergeLevel,
    parent: Option<Uuid>,
) -> rusqlite::Result<Vec<NodeSummary>> {
    let (select, parent_column) = listing_sql(level);
    let map = |row: &Row<'_>| -> rusqlite::Result<NodeSummary> {
        let parent_id: Option<String> = row.get(2)?;
        let parent_id = parent_id
            .map(|text| {
                Uuid::parse_str(&text).map_err(|err| {
                    rusqlite::Error::FromSqlConversionFailure(2, Type::Text, Box::new(err))
                })
            })
            .transpose()?;
        Ok(NodeSummary {
            id: uuid_at(row, 0)?,
            name: row.get(1)?,
            parent_id,
            children: row.get(3)?,
        })
    };

    let order = "ORDER BY lower(trim(COALESCE(name, ''))), 1";
    match parent {
        Some(parent) => {
            let sql = format!("{select} WHERE {parent_column} = ?1 {order}");
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map([parent.to_string()], map)?;
            rows.collect()
        }
        None => {
            let sql = format!("{select} {order}");
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map([], map)?;
            rows.collect()
        }
    }
}

// ---------------------------------------------------------------------------
// Merge audit log
// ---------------------------------------------------------------------------

/// Append a committed merge to `merge_log`, returning its row id.
///
/// # Errors
///
/// Returns an error if the insert fails.
pub fn record_merge(
    conn: &Connection,
    level: MergeLevel,
    leader_id: Uuid,
    leader_name: &str,
    follower_ids: &[Uuid],
    merged_at_us: i64,
) -> rusqlite::Result<i64> {
    let followers_json = serde_json::to_string(follower_ids)
        .map_err(|err| rusqlite::Error::ToSqlConversionFailure(Box::new(err)))?;
    let followers_merged = i64::try_from(follower_ids.len())
        .map_err(|err| rusqlite::Error::ToSqlConversionFailure(Box::new(err)))?;

    conn.prepare_cached(
        "INSERT INTO merge_log
            (level, leader_id, leader_name, follower_ids, followers_merged, merged_at_us)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
    )?
    .execute(params![
        level.as_str(),
        leader_id.to_string(),
        leader_name,
        followers_json,
        followers_merged,
        merged_at_us,
    ])?;
    Ok(conn.last_insert_rowid())
}

/// Most recent merges first.
///
/// # Errors
///
/// Returns an error if the query fails or a stored row is malformed.
pub fn recent_merges(conn: &Connection, limit: u32) -> rusqlite::Result<Vec<MergeLogEntry>> {
    let mut stmt = conn.prepare(
        "SELECT merge_id, level, leader_id, leader_name, follower_ids,
                followers_merged, merged_at_us
         FROM merge_log
         ORDER BY merged_at_us DESC, merge_id DESC
         LIMIT ?1",
    )?;
    let rows = stmt.query_map([i64::from(limit)], |row| {
        let level: String = row.get(1)?;
        let level = level.parse::<MergeLevel>().map_err(|err| {
            rusqlite::Error::FromSqlConversionFailure(1, Type::Text, Box::new(err))
        })?;
        let followers: String = row.get(4)?;
        let follower_ids: Vec<Uuid> = serde_json::from_str(&followers).map_err(|err| {
            rusqlite::Error::FromSqlConversionFailure(4, Type::Text, Box::new(err))
        })?;
        Ok(MergeLogEntry {
            merge_id: row.get(0)?,
            level,
            leader_id: uuid_at(row, 2)?,
            leader_name: row.get(3)?,
            follower_ids,
            followers_merged: row.get(5)?,
            merged_at_us: row.get(6)?,
        })
    })?;
    rows.collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{insert, open_in_memory};

    fn seeded() -> (Connection, CountryRow, RegionRow) {
        let conn = open_in_memory().expect("open catalog");
        let country = CountryRow {
            id: CountryId::generate(),
            name: "France".into(),
        };
        insert::insert_country(&conn, &country).expect("insert country");
        let region = RegionRow {
            id: RegionId::generate(),
            country_id: country.id,
            name: "Bordeaux".into(),
        };
        insert::insert_region(&conn, &region).expect("insert region");
        (conn, country, region)
    }

    #[test]
    fn get_returns_none_for_missing_rows() {
        let (conn, _, _) = seeded();
        assert!(
            get_country(&conn, CountryId::generate())
                .expect("query")
                .is_none()
        );
        assert!(!exists(&conn, RegionId::generate()).expect("exists"));
    }

    #[test]
    fn children_follow_insertion_order() {
        let (conn, country, first) = seeded();
        let second = RegionRow {
            id: RegionId::generate(),
            country_id: country.id,
            name: "Alsace".into(),
        };
        insert::insert_region(&conn, &second).expect("insert region");

        let regions = regions_of(&conn, country.id).expect("regions");
        assert_eq!(regions, vec![first, second]);
    }

    #[test]
    fn reparent_missing_row_is_an_error() {
        let (conn, country, _) = seeded();
        let result = reparent_region(&conn, RegionId::generate(), country.id);
        assert!(matches!(result, Err(rusqlite::Error::QueryReturnedNoRows)));
    }

    #[test]
    fn delete_with_children_is_restricted() {
        let (conn, country, region) = seeded();
        assert!(delete_by_id(&conn, country.id).is_err());
        delete_by_id(&conn, region.id).expect("delete leaf region");
        delete_by_id(&conn, country.id).expect("delete now-empty country");
        assert!(matches!(
            delete_by_id(&conn, country.id),
            Err(rusqlite::Error::QueryReturnedNoRows)
        ));
    }

    #[test]
    fn backfill_never_overwrites() {
        let (conn, _, region) = seeded();
        let appellation = AppellationRow {
            id: AppellationId::generate(),
            region_id: region.id,
            name: "Pauillac".into(),
        };
        insert::insert_appellation(&conn, &appellation).expect("appellation");
        let sub = SubAppellationRow {
            id: SubAppellationId::generate(),
            appellation_id: appellation.id,
            name: None,
        };
        insert::insert_sub_appellation(&conn, &sub).expect("sub");
        let wine = WineRow {
            id: WineId::generate(),
            sub_appellation_id: sub.id,
            name: "Grand Vin".into(),
            grape_variety: Some("  ".into()),
            color: None,
        };
        insert::insert_wine(&conn, &wine).expect("wine");

        assert!(backfill_grape_variety(&conn, wine.id, "Cabernet Sauvignon").expect("fill"));
        assert!(!backfill_grape_variety(&conn, wine.id, "Merlot").expect("second fill"));
        let stored = get_wine(&conn, wine.id).expect("get").expect("present");
        assert_eq!(stored.grape_variety.as_deref(), Some("Cabernet Sauvignon"));
    }

    #[test]
    fn list_nodes_filters_by_parent_and_counts_children() {
        let (conn, country, region) = seeded();
        let other = CountryRow {
            id: CountryId::generate(),
            name: "Spain".into(),
        };
        insert::insert_country(&conn, &other).expect("insert");

        let countries = list_nodes(&conn, MergeLevel::Country, None).expect("list");
        assert_eq!(countries.len(), 2);
        assert_eq!(countries[0].name.as_deref(), Some("France"));
        assert_eq!(countries[0].children, 1);
        assert_eq!(countries[1].children, 0);

        let regions =
            list_nodes(&conn, MergeLevel::Region, Some(country.id.as_uuid())).expect("list");
        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].id, region.id.as_uuid());
        assert_eq!(regions[0].parent_id, Some(country.id.as_uuid()));

        let none = list_nodes(&conn, MergeLevel::Region, Some(other.id.as_uuid())).expect("list");
        assert!(none.is_empty());
    }

    #[test]
    fn merge_log_round_trips_followers() {
        let (conn, country, _) = seeded();
        let followers = vec![Uuid::new_v4(), Uuid::new_v4()];
        record_merge(
            &conn,
            MergeLevel::Country,
            country.id.as_uuid(),
            &country.name,
            &followers,
            1_000,
        )
        .expect("record");
        record_merge(
            &conn,
            MergeLevel::Country,
            country.id.as_uuid(),
            &country.name,
            &followers[..1],
            2_000,
        )
        .expect("record");

        let entries = recent_merges(&conn, 10).expect("recent");
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].merged_at_us, 2_000);
        assert_eq!(entries[0].followers_merged, 1);
        assert_eq!(entries[1].follower_ids, followers);
        assert_eq!(entries[1].level, MergeLevel::Country);
    }
}
