//! Plain row structs, one per catalog table.
//!
//! Parents are referenced by explicit foreign-key fields; nothing here holds a
//! pointer to another row.

use super::id::{
    AppellationId, BottleId, CountryId, EvolutionScoreId, RegionId, SubAppellationId,
    SuggestedAppellationId, SuggestedWineId, TasteProfileId, WineId, WineVintageId,
};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CountryRow {
    pub id: CountryId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegionRow {
    pub id: RegionId,
    pub country_id: CountryId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppellationRow {
    pub id: AppellationId,
    pub region_id: RegionId,
    pub name: String,
}

/// A sub-appellation. The name is optional: many appellations have a single
/// unnamed sub-appellation that holds their wines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubAppellationRow {
    pub id: SubAppellationId,
    pub appellation_id: AppellationId,
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WineRow {
    pub id: WineId,
    pub sub_appellation_id: SubAppellationId,
    pub name: String,
    pub grape_variety: Option<String>,
    pub color: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WineVintageRow {
    pub id: WineVintageId,
    pub wine_id: WineId,
    pub vintage: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BottleRow {
    pub id: BottleId,
    pub wine_vintage_id: WineVintageId,
    pub price: Option<f64>,
    pub is_drunk: bool,
    pub drunk_at: Option<String>,
    pub note: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvolutionScoreRow {
    pub id: EvolutionScoreId,
    pub wine_vintage_id: WineVintageId,
    pub year: i32,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TasteProfileRow {
    pub id: TasteProfileId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SuggestedAppellationRow {
    pub id: SuggestedAppellationId,
    pub sub_appellation_id: SubAppellationId,
    pub taste_profile_id: TasteProfileId,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SuggestedWineRow {
    pub id: SuggestedWineId,
    pub suggested_appellation_id: SuggestedAppellationId,
    pub wine_id: WineId,
    pub vintage: Option<String>,
}
