//! Adapters for the named levels: country down to wine.

use super::error::MergeError;
use super::key::{NameKey, non_blank};
use super::leaf::{SuggestedAppellations, SuggestedWinesByWine, Vintages};
use super::reconcile::{Node, Scope, Tier, reconcile_children};
use crate::db::query;
use crate::model::{
    AppellationId, AppellationRow, CountryId, CountryRow, MergeLevel, RegionId, RegionRow,
    SubAppellationId, SubAppellationRow, WineId, WineRow,
};
use rusqlite::Connection;

/// A level that can be the target of a top-level merge request.
pub(crate) trait Level: Node {
    const LEVEL: MergeLevel;

    fn fetch(conn: &Connection, id: Self::Id) -> rusqlite::Result<Option<Self::Row>>;

    /// Display name reported back to the caller.
    fn label(row: &Self::Row) -> String;
}

pub(crate) struct Countries;
pub(crate) struct Regions;
pub(crate) struct Appellations;
pub(crate) struct SubAppellations;
pub(crate) struct Wines;

// ---------------------------------------------------------------------------
// Country
// ---------------------------------------------------------------------------

impl Node for Countries {
    type Id = CountryId;
    type Row = CountryRow;

    fn id(row: &CountryRow) -> CountryId {
        row.id
    }

    fn absorb(
        conn: &Connection,
        scope: &mut Scope<'_>,
        survivor: &CountryRow,
        duplicate: &CountryRow,
    ) -> Result<(), MergeError> {
        reconcile_children::<Regions>(conn, scope, survivor.id, duplicate.id)
    }
}

impl Level for Countries {
    const LEVEL: MergeLevel = MergeLevel::Country;

    fn fetch(conn: &Connection, id: CountryId) -> rusqlite::Result<Option<CountryRow>> {
        query::get_country(conn, id)
    }

    fn label(row: &CountryRow) -> String {
        row.name.trim().to_string()
    }
}

// ---------------------------------------------------------------------------
// Region
// ---------------------------------------------------------------------------

impl Node for Regions {
    type Id = RegionId;
    type Row = RegionRow;

    fn id(row: &RegionRow) -> RegionId {
        row.id
    }

    fn absorb(
        conn: &Connection,
        scope: &mut Scope<'_>,
        survivor: &RegionRow,
        duplicate: &RegionRow,
    ) -> Result<(), MergeError> {
        reconcile_children::<Appellations>(conn, scope, survivor.id, duplicate.id)
    }
}

impl Tier for Regions {
    type ParentId = CountryId;
    type Key = NameKey;

    fn key(row: &RegionRow) -> NameKey {
        NameKey::named(&row.name)
    }

    fn children(conn: &Connection, parent: CountryId) -> rusqlite::Result<Vec<RegionRow>> {
        query::regions_of(conn, parent)
    }

    fn reparent(conn: &Connection, id: RegionId, parent: CountryId) -> rusqlite::Result<()> {
        query::reparent_region(conn, id, parent)
    }
}

impl Level for Regions {
    const LEVEL: MergeLevel = MergeLevel::Region;

    fn fetch(conn: &Connection, id: RegionId) -> rusqlite::Result<Option<RegionRow>> {
        query::get_region(conn, id)
    }

    fn label(row: &RegionRow) -> String {
        row.name.trim().to_string()
    }
}

// ---------------------------------------------------------------------------
// Appellation
// ---------------------------------------------------------------------------

impl Node for Appellations {
    type Id = AppellationId;
    type Row = AppellationRow;

    fn id(row: &AppellationRow) -> AppellationId {
        row.id
    }

    fn absorb(
        conn: &Connection,
        scope: &mut Scope<'_>,
        survivor: &AppellationRow,
        duplicate: &AppellationRow,
    ) -> Result<(), MergeError> {
        reconcile_children::<SubAppellations>(conn, scope, survivor.id, duplicate.id)
    }
}

impl Tier for Appellations {
    type ParentId = RegionId;
    type Key = NameKey;

    fn key(row: &AppellationRow) -> NameKey {
        NameKey::named(&row.name)
    }

    fn children(conn: &Connection, parent: RegionId) -> rusqlite::Result<Vec<AppellationRow>> {
        query::appellations_of(conn, parent)
    }

    fn reparent(conn: &Connection, id: AppellationId, parent: RegionId) -> rusqlite::Result<()> {
        query::reparent_appellation(conn, id, parent)
    }
}

impl Level for Appellations {
    const LEVEL: MergeLevel = MergeLevel::Appellation;

    fn fetch(conn: &Connection, id: AppellationId) -> rusqlite::Result<Option<AppellationRow>> {
        query::get_appellation(conn, id)
    }

    fn label(row: &AppellationRow) -> String {
        row.name.trim().to_string()
    }
}

// ---------------------------------------------------------------------------
// Sub-appellation
// ---------------------------------------------------------------------------

impl Node for SubAppellations {
    type Id = SubAppellationId;
    type Row = SubAppellationRow;

    fn id(row: &SubAppellationRow) -> SubAppellationId {
        row.id
    }

    // Wines go first so suggested wines already point at surviving wines when
    // their suggested appellations are reconciled.
    fn absorb(
        conn: &Connection,
        scope: &mut Scope<'_>,
        survivor: &SubAppellationRow,
        duplicate: &SubAppellationRow,
    ) -> Result<(), MergeError> {
        reconcile_children::<Wines>(conn, scope, survivor.id, duplicate.id)?;
        reconcile_children::<SuggestedAppellations>(conn, scope, survivor.id, duplicate.id)
    }
}

impl Tier for SubAppellations {
    type ParentId = AppellationId;
    type Key = NameKey;

    fn key(row: &SubAppellationRow) -> NameKey {
        NameKey::of(row.name.as_deref())
    }

    fn children(
        conn: &Connection,
        parent: AppellationId,
    ) -> rusqlite::Result<Vec<SubAppellationRow>> {
        query::sub_appellations_of(conn, parent)
    }

    fn reparent(
        conn: &Connection,
        id: SubAppellationId,
        parent: AppellationId,
    ) -> rusqlite::Result<()> {
        query::reparent_sub_appellation(conn, id, parent)
    }
}

impl Level for SubAppellations {
    const LEVEL: MergeLevel = MergeLevel::SubAppellation;

    fn fetch(
        conn: &Connection,
        id: SubAppellationId,
    ) -> rusqlite::Result<Option<SubAppellationRow>> {
        query::get_sub_appellation(conn, id)
    }

    fn label(row: &SubAppellationRow) -> String {
        non_blank(row.name.as_deref())
            .map_or_else(|| "(unnamed)".to_string(), |name| name.trim().to_string())
    }
}

// ---------------------------------------------------------------------------
// Wine
// ---------------------------------------------------------------------------

impl Node for Wines {
    type Id = WineId;
    type Row = WineRow;

    fn id(row: &WineRow) -> WineId {
        row.id
    }

    fn absorb(
        conn: &Connection,
        scope: &mut Scope<'_>,
        survivor: &WineRow,
        duplicate: &WineRow,
    ) -> Result<(), MergeError> {
        if let Some(grape) = non_blank(duplicate.grape_variety.as_deref()) {
            query::backfill_grape_variety(conn, survivor.id, grape)?;
        }
        reconcile_children::<Vintages>(conn, scope, survivor.id, duplicate.id)?;
        reconcile_children::<SuggestedWinesByWine>(conn, scope, survivor.id, duplicate.id)
    }
}

impl Tier for Wines {
    type ParentId = SubAppellationId;
    type Key = NameKey;

    fn key(row: &WineRow) -> NameKey {
        NameKey::named(&row.name)
    }

    fn children(conn: &Connection, parent: SubAppellationId) -> rusqlite::Result<Vec<WineRow>> {
        query::wines_of(conn, parent)
    }

    fn reparent(conn: &Connection, id: WineId, parent: SubAppellationId) -> rusqlite::Result<()> {
        query::reparent_wine(conn, id, parent)
    }
}

impl Level for Wines {
    const LEVEL: MergeLevel = MergeLevel::Wine;

    fn fetch(conn: &Connection, id: WineId) -> rusqlite::Result<Option<WineRow>> {
        query::get_wine(conn, id)
    }

    fn label(row: &WineRow) -> String {
        row.name.trim().to_string()
    }
}
