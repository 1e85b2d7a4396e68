//! Catalog domain types: typed ids, hierarchy levels, and row structs.

pub mod id;
pub mod level;
pub mod row;

pub use id::{
    AppellationId, BottleId, CountryId, EntityId, EvolutionScoreId, RegionId, SubAppellationId,
    SuggestedAppellationId, SuggestedWineId, TasteProfileId, WineId, WineVintageId,
};
pub use level::{EntityKind, MergeLevel, ParseLevelError};
pub use row::*;
