//! Adapters below the wine level: vintages and the suggestion rows.
//!
//! Bottles and evolution scores are never deduplicated; a duplicate vintage
//! hands all of them to the surviving vintage in two bulk updates.

use super::error::MergeError;
use super::key::non_blank;
use super::reconcile::{Node, Scope, Tier, reconcile_children};
use crate::db::query;
use crate::model::{
    SubAppellationId, SuggestedAppellationId, SuggestedAppellationRow, SuggestedWineId,
    SuggestedWineRow, TasteProfileId, WineId, WineVintageId, WineVintageRow,
};
use rusqlite::Connection;

pub(crate) struct Vintages;
pub(crate) struct SuggestedAppellations;
/// Suggested wines seen from their wine, keyed by suggested appellation.
pub(crate) struct SuggestedWinesByWine;
/// Suggested wines seen from their suggested appellation, keyed by wine.
pub(crate) struct SuggestedWinesByAppellation;

// ---------------------------------------------------------------------------
// Vintages
// ---------------------------------------------------------------------------

impl Node for Vintages {
    type Id = WineVintageId;
    type Row = WineVintageRow;

    fn id(row: &WineVintageRow) -> WineVintageId {
        row.id
    }

    fn absorb(
        conn: &Connection,
        scope: &mut Scope<'_>,
        survivor: &WineVintageRow,
        duplicate: &WineVintageRow,
    ) -> Result<(), MergeError> {
        let bottles = query::move_bottles(conn, duplicate.id, survivor.id)?;
        let scores = query::move_evolution_scores(conn, duplicate.id, survivor.id)?;
        scope.stats.leaves_moved += u64::try_from(bottles + scores).unwrap_or(u64::MAX);
        tracing::debug!(
            vintage = survivor.vintage,
            survivor = %survivor.id,
            bottles,
            scores,
            "moved vintage leaves"
        );
        Ok(())
    }
}

impl Tier for Vintages {
    type ParentId = WineId;
    type Key = i32;

    fn key(row: &WineVintageRow) -> i32 {
        row.vintage
    }

    fn children(conn: &Connection, parent: WineId) -> rusqlite::Result<Vec<WineVintageRow>> {
        query::vintages_of(conn, parent)
    }

    fn reparent(conn: &Connection, id: WineVintageId, parent: WineId) -> rusqlite::Result<()> {
        query::reparent_vintage(conn, id, parent)
    }
}

// ---------------------------------------------------------------------------
// Suggested wines
// ---------------------------------------------------------------------------

fn absorb_suggested_wine(
    conn: &Connection,
    survivor: &SuggestedWineRow,
    duplicate: &SuggestedWineRow,
) -> Result<(), MergeError> {
    if let Some(vintage) = non_blank(duplicate.vintage.as_deref()) {
        query::backfill_suggested_vintage(conn, survivor.id, vintage)?;
    }
    Ok(())
}

impl Node for SuggestedWinesByWine {
    type Id = SuggestedWineId;
    type Row = SuggestedWineRow;

    fn id(row: &SuggestedWineRow) -> SuggestedWineId {
        row.id
    }

    fn absorb(
        conn: &Connection,
        _scope: &mut Scope<'_>,
        survivor: &SuggestedWineRow,
        duplicate: &SuggestedWineRow,
    ) -> Result<(), MergeError> {
        absorb_suggested_wine(conn, survivor, duplicate)
    }
}

impl Tier for SuggestedWinesByWine {
    type ParentId = WineId;
    type Key = SuggestedAppellationId;

    fn key(row: &SuggestedWineRow) -> SuggestedAppellationId {
        row.suggested_appellation_id
    }

    fn children(conn: &Connection, parent: WineId) -> rusqlite::Result<Vec<SuggestedWineRow>> {
        query::suggested_wines_of_wine(conn, parent)
    }

    fn reparent(conn: &Connection, id: SuggestedWineId, parent: WineId) -> rusqlite::Result<()> {
        query::reparent_suggested_wine_to_wine(conn, id, parent)
    }
}

impl Node for SuggestedWinesByAppellation {
    type Id = SuggestedWineId;
    type Row = SuggestedWineRow;

    fn id(row: &SuggestedWineRow) -> SuggestedWineId {
        row.id
    }

    fn absorb(
        conn: &Connection,
        _scope: &mut Scope<'_>,
        survivor: &SuggestedWineRow,
        duplicate: &SuggestedWineRow,
    ) -> Result<(), MergeError> {
        absorb_suggested_wine(conn, survivor, duplicate)
    }
}

impl Tier for SuggestedWinesByAppellation {
    type ParentId = SuggestedAppellationId;
    type Key = WineId;

    fn key(row: &SuggestedWineRow) -> WineId {
        row.wine_id
    }

    fn children(
        conn: &Connection,
        parent: SuggestedAppellationId,
    ) -> rusqlite::Result<Vec<SuggestedWineRow>> {
        query::suggested_wines_of_appellation(conn, parent)
    }

    fn reparent(
        conn: &Connection,
        id: SuggestedWineId,
        parent: SuggestedAppellationId,
    ) -> rusqlite::Result<()> {
        query::reparent_suggested_wine_to_appellation(conn, id, parent)
    }
}

// ---------------------------------------------------------------------------
// Suggested appellations
// ---------------------------------------------------------------------------

impl Node for SuggestedAppellations {
    type Id = SuggestedAppellationId;
    type Row = SuggestedAppellationRow;

    fn id(row: &SuggestedAppellationRow) -> SuggestedAppellationId {
        row.id
    }

    fn absorb(
        conn: &Connection,
        scope: &mut Scope<'_>,
        survivor: &SuggestedAppellationRow,
        duplicate: &SuggestedAppellationRow,
    ) -> Result<(), MergeError> {
        if let Some(reason) = non_blank(duplicate.reason.as_deref()) {
            query::backfill_reason(conn, survivor.id, reason)?;
        }
        reconcile_children::<SuggestedWinesByAppellation>(conn, scope, survivor.id, duplicate.id)
    }
}

impl Tier for SuggestedAppellations {
    type ParentId = SubAppellationId;
    type Key = TasteProfileId;

    fn key(row: &SuggestedAppellationRow) -> TasteProfileId {
        row.taste_profile_id
    }

    fn children(
        conn: &Connection,
        parent: SubAppellationId,
    ) -> rusqlite::Result<Vec<SuggestedAppellationRow>> {
        query::suggested_appellations_of(conn, parent)
    }

    fn reparent(
        conn: &Connection,
        id: SuggestedAppellationId,
        parent: SubAppellationId,
    ) -> rusqlite::Result<()> {
        query::reparent_suggested_appellation(conn, id, parent)
    }
}
