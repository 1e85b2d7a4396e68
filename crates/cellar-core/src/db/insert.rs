//! Row inserts used by catalog import and tests.
//!
//! The merge engine never inserts: it only reparents, backfills, and deletes.

use crate::model::{
    AppellationRow, BottleRow, CountryRow, EvolutionScoreRow, RegionRow, SubAppellationRow,
    SuggestedAppellationRow, SuggestedWineRow, TasteProfileRow, WineRow, WineVintageRow,
};
use rusqlite::{Connection, params};

/// # Errors
///
/// Returns an error if the insert violates a constraint or `SQLite` fails.
pub fn insert_country(conn: &Connection, row: &CountryRow) -> rusqlite::Result<()> {
    conn.prepare_cached("INSERT INTO countries (id, name) VALUES (?1, ?2)")?
        .execute(params![row.id, row.name])?;
    Ok(())
}

/// # Errors
///
/// Returns an error if the insert violates a constraint or `SQLite` fails.
pub fn insert_region(conn: &Connection, row: &RegionRow) -> rusqlite::Result<()> {
    conn.prepare_cached("INSERT INTO regions (id, country_id, name) VALUES (?1, ?2, ?3)")?
        .execute(params![row.id, row.country_id, row.name])?;
    Ok(())
}

/// # Errors
///
/// Returns an error if the insert violates a constraint or `SQLite` fails.
pub fn insert_appellation(conn: &Connection, row: &AppellationRow) -> rusqlite::Result<()> {
    conn.prepare_cached("INSERT INTO appellations (id, region_id, name) VALUES (?1, ?2, ?3)")?
        .execute(params![row.id, row.region_id, row.name])?;
    Ok(())
}

/// # Errors
///
/// Returns an error if the insert violates a constraint or `SQLite` fails.
pub fn insert_sub_appellation(conn: &Connection, row: &SubAppellationRow) -> rusqlite::Result<()> {
    conn.prepare_cached(
        "INSERT INTO sub_appellations (id, appellation_id, name) VALUES (?1, ?2, ?3)",
    )?
    .execute(params![row.id, row.appellation_id, row.name])?;
    Ok(())
}

/// # Errors
///
/// Returns an error if the insert violates a constraint or `SQLite` fails.
pub fn insert_wine(conn: &Connection, row: &WineRow) -> rusqlite::Result<()> {
    conn.prepare_cached(
        "INSERT INTO wines (id, sub_appellation_id, name, grape_variety, color)
         VALUES (?1, ?2, ?3, ?4, ?5)",
    )?
    .execute(params![
        row.id,
        row.sub_appellation_id,
        row.name,
        row.grape_variety,
        row.color,
    ])?;
    Ok(())
}

/// # Errors
///
/// Returns an error if the insert violates a constraint or `SQLite` fails.
pub fn insert_vintage(conn: &Connection, row: &WineVintageRow) -> rusqlite::Result<()> {
    conn.prepare_cached("INSERT INTO wine_vintages (id, wine_id, vintage) VALUES (?1, ?2, ?3)")?
        .execute(params![row.id, row.wine_id, row.vintage])?;
    Ok(())
}

/// # Errors
///
/// Returns an error if the insert violates a constraint or `SQLite` fails.
pub fn insert_bottle(conn: &Connection, row: &BottleRow) -> rusqlite::Result<()> {
    conn.prepare_cached(
        "INSERT INTO bottles (id, wine_vintage_id, price, is_drunk, drunk_at, note)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
    )?
    .execute(params![
        row.id,
        row.wine_vintage_id,
        row.price,
        row.is_drunk,
        row.drunk_at,
        row.note,
    ])?;
    Ok(())
}

/// # Errors
///
/// Returns an error if the insert violates a constraint or `SQLite` fails.
pub fn insert_evolution_score(conn: &Connection, row: &EvolutionScoreRow) -> rusqlite::Result<()> {
    conn.prepare_cached(
        "INSERT INTO evolution_scores (id, wine_vintage_id, year, score)
         VALUES (?1, ?2, ?3, ?4)",
    )?
    .execute(params![row.id, row.wine_vintage_id, row.year, row.score])?;
    Ok(())
}

/// # Errors
///
/// Returns an error if the insert violates a constraint or `SQLite` fails.
pub fn insert_taste_profile(conn: &Connection, row: &TasteProfileRow) -> rusqlite::Result<()> {
    conn.prepare_cached("INSERT INTO taste_profiles (id, name) VALUES (?1, ?2)")?
        .execute(params![row.id, row.name])?;
    Ok(())
}

/// # Errors
///
/// Returns an error if the insert violates a constraint or `SQLite` fails.
pub fn insert_suggested_appellation(
    conn: &Connection,
    row: &SuggestedAppellationRow,
) -> rusqlite::Result<()> {
    conn.prepare_cached(
        "INSERT INTO suggested_appellations (id, sub_appellation_id, taste_profile_id, reason)
         VALUES (?1, ?2, ?3, ?4)",
    )?
    .execute(params![
        row.id,
        row.sub_appellation_id,
        row.taste_profile_id,
        row.reason,
    ])?;
    Ok(())
}

/// # Errors
///
/// Returns an error if the insert violates a constraint or `SQLite` fails.
pub fn insert_suggested_wine(conn: &Connection, row: &SuggestedWineRow) -> rusqlite::Result<()> {
    conn.prepare_cached(
        "INSERT INTO suggested_wines (id, suggested_appellation_id, wine_id, vintage)
         VALUES (?1, ?2, ?3, ?4)",
    )?
    .execute(params![
        row.id,
        row.suggested_appellation_id,
        row.wine_id,
        row.vintage,
    ])?;
    Ok(())
}
