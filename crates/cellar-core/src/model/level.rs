use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Every kind of row the catalog stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Country,
    Region,
    Appellation,
    SubAppellation,
    Wine,
    WineVintage,
    Bottle,
    EvolutionScore,
    TasteProfile,
    SuggestedAppellation,
    SuggestedWine,
}

impl EntityKind {
    /// Lowercase singular noun used in messages.
    #[must_use]
    pub const fn noun(self) -> &'static str {
        match self {
            Self::Country => "country",
            Self::Region => "region",
            Self::Appellation => "appellation",
            Self::SubAppellation => "sub-appellation",
            Self::Wine => "wine",
            Self::WineVintage => "wine vintage",
            Self::Bottle => "bottle",
            Self::EvolutionScore => "evolution score",
            Self::TasteProfile => "taste profile",
            Self::SuggestedAppellation => "suggested appellation",
            Self::SuggestedWine => "suggested wine",
        }
    }

    /// Lowercase plural noun used in messages.
    #[must_use]
    pub const fn plural(self) -> &'static str {
        match self {
            Self::Country => "countries",
            Self::Region => "regions",
            Self::Appellation => "appellations",
            Self::SubAppellation => "sub-appellations",
            Self::Wine => "wines",
            Self::WineVintage => "wine vintages",
            Self::Bottle => "bottles",
            Self::EvolutionScore => "evolution scores",
            Self::TasteProfile => "taste profiles",
            Self::SuggestedAppellation => "suggested appellations",
            Self::SuggestedWine => "suggested wines",
        }
    }

    /// Backing table name.
    #[must_use]
    pub const fn table(self) -> &'static str {
        match self {
            Self::Country => "countries",
            Self::Region => "regions",
            Self::Appellation => "appellations",
            Self::SubAppellation => "sub_appellations",
            Self::Wine => "wines",
            Self::WineVintage => "wine_vintages",
            Self::Bottle => "bottles",
            Self::EvolutionScore => "evolution_scores",
            Self::TasteProfile => "taste_profiles",
            Self::SuggestedAppellation => "suggested_appellations",
            Self::SuggestedWine => "suggested_wines",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.noun())
    }
}

/// The five levels a merge can be requested at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MergeLevel {
    Country,
    Region,
    Appellation,
    SubAppellation,
    Wine,
}

impl MergeLevel {
    pub const ALL: [Self; 5] = [
        Self::Country,
        Self::Region,
        Self::Appellation,
        Self::SubAppellation,
        Self::Wine,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Country => "country",
            Self::Region => "region",
            Self::Appellation => "appellation",
            Self::SubAppellation => "sub-appellation",
            Self::Wine => "wine",
        }
    }

    /// The entity kind merged at this level.
    #[must_use]
    pub const fn kind(self) -> EntityKind {
        match self {
            Self::Country => EntityKind::Country,
            Self::Region => EntityKind::Region,
            Self::Appellation => EntityKind::Appellation,
            Self::SubAppellation => EntityKind::SubAppellation,
            Self::Wine => EntityKind::Wine,
        }
    }

    /// The level directly above this one, if any.
    #[must_use]
    pub const fn parent(self) -> Option<Self> {
        match self {
            Self::Country => None,
            Self::Region => Some(Self::Country),
            Self::Appellation => Some(Self::Region),
            Self::SubAppellation => Some(Self::Appellation),
            Self::Wine => Some(Self::SubAppellation),
        }
    }
}

impl fmt::Display for MergeLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing a level name from text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseLevelError {
    pub got: String,
}

impl fmt::Display for ParseLevelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid level '{}': expected one of country, region, appellation, sub-appellation, wine",
            self.got
        )
    }
}

impl std::error::Error for ParseLevelError {}

impl FromStr for MergeLevel {
    type Err = ParseLevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('_', "-");
        match normalized.as_str() {
            "country" | "countries" => Ok(Self::Country),
            "region" | "regions" => Ok(Self::Region),
            "appellation" | "appellations" => Ok(Self::Appellation),
            "sub-appellation" | "sub-appellations" | "subappellation" => {
                Ok(Self::SubAppellation)
            }
            "wine" | "wines" => Ok(Self::Wine),
            _ => Err(ParseLevelError { got: s.to_string() }),
        }
    }
}
