//! Load a nested JSON catalog document into the store.
//!
//! Import never deduplicates: two sibling regions both called "Bordeaux" are
//! inserted as two rows, ready to be merged. The document is inserted in one
//! transaction, so a bad row leaves the catalog unchanged.
//!
//! ```json
//! {
//!   "taste_profiles": [{ "id": "…", "name": "Bold reds" }],
//!   "countries": [{
//!     "name": "France",
//!     "regions": [{
//!       "name": "Bordeaux",
//!       "appellations": [{
//!         "name": "Pauillac",
//!         "sub_appellations": [{
//!           "name": null,
//!           "wines": [{
//!             "id": "…", "name": "Grand Vin", "grape_variety": "Cabernet Sauvignon",
//!             "vintages": [{
//!               "vintage": 2015,
//!               "bottles": [{ "price": 120.0 }],
//!               "evolution_scores": [{ "year": 2030, "score": 94.5 }]
//!             }]
//!           }],
//!           "suggested_appellations": [{
//!             "taste_profile_id": "…", "reason": "Structured",
//!             "wines": [{ "wine_id": "…", "vintage": "2015" }]
//!           }]
//!         }]
//!       }]
//!     }]
//!   }]
//! }
//! ```
//!
//! Ids are optional everywhere; missing or nil ids get a fresh v4 UUID.
//! Suggestions are inserted after the whole tree, so `wine_id` may refer to a
//! wine anywhere in the document.

use crate::db::insert;
use crate::model::{
    AppellationId, AppellationRow, BottleId, BottleRow, CountryId, CountryRow, EntityId,
    EvolutionScoreId, EvolutionScoreRow, RegionId, RegionRow, SubAppellationId,
    SubAppellationRow, SuggestedAppellationId, SuggestedAppellationRow, SuggestedWineId,
    SuggestedWineRow, TasteProfileId, TasteProfileRow, WineId, WineRow, WineVintageId,
    WineVintageRow,
};
use anyhow::{Context, Result};
use rusqlite::{Connection, TransactionBehavior};
use serde::{Deserialize, Serialize};
use std::path::Path;
use uuid::Uuid;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CatalogDoc {
    #[serde(default)]
    pub taste_profiles: Vec<TasteProfileDoc>,
    #[serde(default)]
    pub countries: Vec<CountryDoc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TasteProfileDoc {
    #[serde(default)]
    pub id: Option<Uuid>,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CountryDoc {
    #[serde(default)]
    pub id: Option<Uuid>,
    pub name: String,
    #[serde(default)]
    pub regions: Vec<RegionDoc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegionDoc {
    #[serde(default)]
    pub id: Option<Uuid>,
    pub name: String,
    #[serde(default)]
    pub appellations: Vec<AppellationDoc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AppellationDoc {
    #[serde(default)]
    pub id: Option<Uuid>,
    pub name: String,
    #[serde(default)]
    pub sub_appellations: Vec<SubAppellationDoc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SubAppellationDoc {
    #[serde(default)]
    pub id: Option<Uuid>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub wines: Vec<WineDoc>,
    #[serde(default)]
    pub suggested_appellations: Vec<SuggestedAppellationDoc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WineDoc {
    #[serde(default)]
    pub id: Option<Uuid>,
    pub name: String,
    #[serde(default)]
    pub grape_variety: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub vintages: Vec<VintageDoc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VintageDoc {
    #[serde(default)]
    pub id: Option<Uuid>,
    pub vintage: i32,
    #[serde(default)]
    pub bottles: Vec<BottleDoc>,
    #[serde(default)]
    pub evolution_scores: Vec<EvolutionScoreDoc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BottleDoc {
    #[serde(default)]
    pub id: Option<Uuid>,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub is_drunk: bool,
    #[serde(default)]
    pub drunk_at: Option<String>,
    #[serde(default)]
    pub note: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EvolutionScoreDoc {
    #[serde(default)]
    pub id: Option<Uuid>,
    pub year: i32,
    pub score: f64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SuggestedAppellationDoc {
    #[serde(default)]
    pub id: Option<Uuid>,
    pub taste_profile_id: Uuid,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub wines: Vec<SuggestedWineDoc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SuggestedWineDoc {
    #[serde(default)]
    pub id: Option<Uuid>,
    pub wine_id: Uuid,
    #[serde(default)]
    pub vintage: Option<String>,
}

/// Row counts inserted by one import.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    pub taste_profiles: usize,
    pub countries: usize,
    pub regions: usize,
    pub appellations: usize,
    pub sub_appellations: usize,
    pub wines: usize,
    pub vintages: usize,
    pub bottles: usize,
    pub evolution_scores: usize,
    pub suggested_appellations: usize,
    pub suggested_wines: usize,
}

impl ImportReport {
    #[must_use]
    pub const fn total(&self) -> usize {
        self.taste_profiles
            + self.countries
            + self.regions
            + self.appellations
            + self.sub_appellations
            + self.wines
            + self.vintages
            + self.bottles
            + self.evolution_scores
            + self.suggested_appellations
            + self.suggested_wines
    }
}

fn assign<I: EntityId>(id: Option<Uuid>) -> I {
    I::from_uuid(
        id.filter(|uuid| !uuid.is_nil())
            .unwrap_or_else(Uuid::new_v4),
    )
}

/// Parse a catalog document from JSON text.
///
/// # Errors
///
/// Returns an error if the text is not a valid catalog document.
pub fn parse_catalog(json: &str) -> Result<CatalogDoc> {
    serde_json::from_str(json).context("parse catalog document")
}

/// Read and import a catalog document from a file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, or any row fails
/// to insert.
pub fn import_file(conn: &mut Connection, path: &Path) -> Result<ImportReport> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("read catalog document {}", path.display()))?;
    let doc = parse_catalog(&text).with_context(|| format!("in {}", path.display()))?;
    import_catalog(conn, &doc)
}

/// Insert every row of `doc` in one transaction.
///
/// # Errors
///
/// Returns an error if any row violates a constraint (unknown taste profile
/// or wine reference, duplicate vintage year under one wine, reused id).
pub fn import_catalog(conn: &mut Connection, doc: &CatalogDoc) -> Result<ImportReport> {
    let tx = conn
        .transaction_with_behavior(TransactionBehavior::Immediate)
        .context("begin import transaction")?;

    let mut importer = Importer {
        conn: &tx,
        report: ImportReport::default(),
        pending: Vec::new(),
    };
    importer.run(doc)?;
    let report = importer.report;

    tx.commit().context("commit import transaction")?;
    tracing::info!(rows = report.total(), "imported catalog document");
    Ok(report)
}

struct Importer<'a, 'doc> {
    conn: &'a Connection,
    report: ImportReport,
    pending: Vec<(SubAppellationId, &'doc SuggestedAppellationDoc)>,
}

impl<'doc> Importer<'_, 'doc> {
    fn run(&mut self, doc: &'doc CatalogDoc) -> Result<()> {
        for profile in &doc.taste_profiles {
            let row = TasteProfileRow {
                id: assign::<TasteProfileId>(profile.id),
                name: profile.name.clone(),
            };
            insert::insert_taste_profile(self.conn, &row)
                .with_context(|| format!("insert taste profile '{}'", profile.name))?;
            self.report.taste_profiles += 1;
        }

        for country in &doc.countries {
            self.country(country)?;
        }

        for (sub_appellation_id, suggested) in std::mem::take(&mut self.pending) {
            self.suggested_appellation(sub_appellation_id, suggested)?;
        }
        Ok(())
    }

    fn country(&mut self, doc: &'doc CountryDoc) -> Result<()> {
        let row = CountryRow {
            id: assign::<CountryId>(doc.id),
            name: doc.name.clone(),
        };
        insert::insert_country(self.conn, &row)
            .with_context(|| format!("insert country '{}'", doc.name))?;
        self.report.countries += 1;

        for region in &doc.regions {
            self.region(row.id, region)?;
        }
        Ok(())
    }

    fn region(&mut self, country_id: CountryId, doc: &'doc RegionDoc) -> Result<()> {
        let row = RegionRow {
            id: assign::<RegionId>(doc.id),
            country_id,
            name: doc.name.clone(),
        };
        insert::insert_region(self.conn, &row)
            .with_context(|| format!("insert region '{}'", doc.name))?;
        self.report.regions += 1;

        for appellation in &doc.appellations {
            self.appellation(row.id, appellation)?;
        }
        Ok(())
    }

    fn appellation(&mut self, region_id: RegionId, doc: &'doc AppellationDoc) -> Result<()> {
        let row = AppellationRow {
            id: assign::<AppellationId>(doc.id),
            region_id,
            name: doc.name.clone(),
        };
        insert::insert_appellation(self.conn, &row)
            .with_context(|| format!("insert appellation '{}'", doc.name))?;
        self.report.appellations += 1;

        for sub in &doc.sub_appellations {
            self.sub_appellation(row.id, sub)?;
        }
        Ok(())
    }

    fn sub_appellation(
        &mut self,
        appellation_id: AppellationId,
        doc: &'doc SubAppellationDoc,
    ) -> Result<()> {
        let row = SubAppellationRow {
            id: assign::<SubAppellationId>(doc.id),
            appellation_id,
            name: doc.name.clone(),
        };
        insert::insert_sub_appellation(self.conn, &row).with_context(|| {
            format!(
                "insert sub-appellation '{}'",
                doc.name.as_deref().unwrap_or("(unnamed)")
            )
        })?;
        self.report.sub_appellations += 1;

        for wine in &doc.wines {
            self.wine(row.id, wine)?;
        }
        self.pending
            .extend(doc.suggested_appellations.iter().map(|s| (row.id, s)));
        Ok(())
    }

    fn wine(&mut self, sub_appellation_id: SubAppellationId, doc: &WineDoc) -> Result<()> {
        let row = WineRow {
            id: assign::<WineId>(doc.id),
            sub_appellation_id,
            name: doc.name.clone(),
            grape_variety: doc.grape_variety.clone(),
            color: doc.color.clone(),
        };
        insert::insert_wine(self.conn, &row)
            .with_context(|| format!("insert wine '{}'", doc.name))?;
        self.report.wines += 1;

        for vintage in &doc.vintages {
            self.vintage(row.id, &doc.name, vintage)?;
        }
        Ok(())
    }

    fn vintage(&mut self, wine_id: WineId, wine_name: &str, doc: &VintageDoc) -> Result<()> {
        let row = WineVintageRow {
            id: assign::<WineVintageId>(doc.id),
            wine_id,
            vintage: doc.vintage,
        };
        insert::insert_vintage(self.conn, &row)
            .with_context(|| format!("insert vintage {} of '{wine_name}'", doc.vintage))?;
        self.report.vintages += 1;

        for bottle in &doc.bottles {
            let bottle = BottleRow {
                id: assign::<BottleId>(bottle.id),
                wine_vintage_id: row.id,
                price: bottle.price,
                is_drunk: bottle.is_drunk,
                drunk_at: bottle.drunk_at.clone(),
                note: bottle.note.clone(),
            };
            insert::insert_bottle(self.conn, &bottle)
                .with_context(|| format!("insert bottle of '{wine_name}' {}", doc.vintage))?;
            self.report.bottles += 1;
        }

        for score in &doc.evolution_scores {
            let score = EvolutionScoreRow {
                id: assign::<EvolutionScoreId>(score.id),
                wine_vintage_id: row.id,
                year: score.year,
                score: score.score,
            };
            insert::insert_evolution_score(self.conn, &score).with_context(|| {
                format!("insert evolution score of '{wine_name}' {}", doc.vintage)
            })?;
            self.report.evolution_scores += 1;
        }
        Ok(())
    }

    fn suggested_appellation(
        &mut self,
        sub_appellation_id: SubAppellationId,
        doc: &SuggestedAppellationDoc,
    ) -> Result<()> {
        let row = SuggestedAppellationRow {
            id: assign::<SuggestedAppellationId>(doc.id),
            sub_appellation_id,
            taste_profile_id: TasteProfileId::from_uuid(doc.taste_profile_id),
            reason: doc.reason.clone(),
        };
        insert::insert_suggested_appellation(self.conn, &row).with_context(|| {
            format!(
                "insert suggested appellation for taste profile {}",
                doc.taste_profile_id
            )
        })?;
        self.report.suggested_appellations += 1;

        for wine in &doc.wines {
            let suggested = SuggestedWineRow {
                id: assign::<SuggestedWineId>(wine.id),
                suggested_appellation_id: row.id,
                wine_id: WineId::from_uuid(wine.wine_id),
                vintage: wine.vintage.clone(),
            };
            insert::insert_suggested_wine(self.conn, &suggested)
                .with_context(|| format!("insert suggested wine {}", wine.wine_id))?;
            self.report.suggested_wines += 1;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{open_in_memory, query};
    use crate::model::{EntityKind, MergeLevel};

    const DOC: &str = r#"{
        "taste_profiles": [
            { "id": "6f0b6a52-3c0e-4d1e-9a55-0d1c5e2f0a01", "name": "Bold reds" }
        ],
        "countries": [{
            "name": "France",
            "regions": [
                { "name": "Bordeaux", "appellations": [{
                    "name": "Pauillac",
                    "sub_appellations": [{
                        "wines": [{
                            "id": "9b2d7c1e-0000-4000-8000-000000000001",
                            "name": "Grand Vin",
                            "vintages": [{
                                "vintage": 2015,
                                "bottles": [{ "price": 120.0 }, { "is_drunk": true }],
                                "evolution_scores": [{ "year": 2030, "score": 94.5 }]
                            }]
                        }],
                        "suggested_appellations": [{
                            "taste_profile_id": "6f0b6a52-3c0e-4d1e-9a55-0d1c5e2f0a01",
                            "wines": [{ "wine_id": "9b2d7c1e-0000-4000-8000-000000000001" }]
                        }]
                    }]
                }]},
                { "name": "bordeaux " }
            ]
        }]
    }"#;

    #[test]
    fn imports_nested_document_without_deduplicating() {
        let mut conn = open_in_memory().expect("open");
        let doc = parse_catalog(DOC).expect("parse");
        let report = import_catalog(&mut conn, &doc).expect("import");

        assert_eq!(report.countries, 1);
        assert_eq!(report.regions, 2);
        assert_eq!(report.bottles, 2);
        assert_eq!(report.evolution_scores, 1);
        assert_eq!(report.suggested_wines, 1);
        assert_eq!(report.total(), 13);

        assert_eq!(query::count_rows(&conn, EntityKind::Region).expect("count"), 2);
        let regions = query::list_nodes(&conn, MergeLevel::Region, None).expect("list");
        assert_eq!(regions.len(), 2);
    }

    #[test]
    fn bad_reference_rolls_back_everything() {
        let mut conn = open_in_memory().expect("open");
        let doc = parse_catalog(
            r#"{
                "countries": [{ "name": "Italy", "regions": [{ "name": "Piemonte",
                    "appellations": [{ "name": "Barolo", "sub_appellations": [{
                        "suggested_appellations": [{
                            "taste_profile_id": "00000000-0000-4000-8000-0000000000aa"
                        }]
                    }]}]
                }]}]
            }"#,
        )
        .expect("parse");

        let err = import_catalog(&mut conn, &doc).expect_err("unknown taste profile");
        assert!(format!("{err:#}").contains("taste profile"), "got: {err:#}");
        assert_eq!(query::count_rows(&conn, EntityKind::Country).expect("count"), 0);
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let err = parse_catalog(r#"{ "countries": [{ "name": "Spain", "regoins": [] }] }"#)
            .expect_err("typo must fail");
        assert!(format!("{err:#}").contains("regoins"), "got: {err:#}");
    }
}
