//! Strongly typed row identifiers.
//!
//! Every entity kind gets its own UUID newtype so a `RegionId` can never be
//! passed where a `WineId` is expected. Ids are stored in SQLite as canonical
//! hyphenated text. The nil UUID is the "empty" id and never names a row.

use super::level::EntityKind;
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use std::{fmt, hash::Hash, str::FromStr};
use uuid::Uuid;

/// Behaviour shared by all typed ids.
pub trait EntityId:
    Copy + Eq + Hash + Ord + fmt::Debug + fmt::Display + ToSql + FromSql
{
    /// The entity kind this id names.
    const KIND: EntityKind;

    fn from_uuid(uuid: Uuid) -> Self;

    fn as_uuid(self) -> Uuid;

    /// Whether this is the empty (nil) id.
    fn is_nil(self) -> bool {
        self.as_uuid().is_nil()
    }

    /// Parse user input, returning `None` for blank, malformed, or nil ids.
    fn parse_lenient(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }
        Uuid::parse_str(trimmed)
            .ok()
            .filter(|uuid| !uuid.is_nil())
            .map(Self::from_uuid)
    }
}

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident => $kind:expr) => {
        $(#[$meta])*
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            serde::Serialize,
            serde::Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Generate a fresh random id.
            #[must_use]
            pub fn generate() -> Self {
                Self(Uuid::new_v4())
            }
        }

        impl EntityId for $name {
            const KIND: EntityKind = $kind;

            fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            fn as_uuid(self) -> Uuid {
                self.0
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Display::fmt(&self.0, f)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s.trim()).map(Self)
            }
        }

        impl ToSql for $name {
            fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
                Ok(ToSqlOutput::from(self.0.to_string()))
            }
        }

        impl FromSql for $name {
            fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
                uuid_from_sql(value).map(Self)
            }
        }
    };
}

/// Decode a UUID stored as text.
pub(crate) fn uuid_from_sql(value: ValueRef<'_>) -> FromSqlResult<Uuid> {
    let text = value.as_str()?;
    Uuid::parse_str(text).map_err(|err| FromSqlError::Other(Box::new(err)))
}

entity_id!(CountryId => EntityKind::Country);
entity_id!(RegionId => EntityKind::Region);
entity_id!(AppellationId => EntityKind::Appellation);
entity_id!(SubAppellationId => EntityKind::SubAppellation);
entity_id!(WineId => EntityKind::Wine);
entity_id!(WineVintageId => EntityKind::WineVintage);
entity_id!(BottleId => EntityKind::Bottle);
entity_id!(EvolutionScoreId => EntityKind::EvolutionScore);
entity_id!(TasteProfileId => EntityKind::TasteProfile);
entity_id!(SuggestedAppellationId => EntityKind::SuggestedAppellation);
entity_id!(SuggestedWineId => EntityKind::SuggestedWine);
