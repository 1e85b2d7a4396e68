//! Catalog builder shared by the integration tests.
//!
//! Included from sibling test files with `#[path = "fixture.rs"]`.

#![allow(dead_code)]

use cellar_core::db::{self, insert, query};
use cellar_core::model::{
    AppellationId, AppellationRow, BottleId, BottleRow, CountryId, CountryRow, EntityKind,
    EvolutionScoreId, EvolutionScoreRow, RegionId, RegionRow, SubAppellationId,
    SubAppellationRow, SuggestedAppellationId, SuggestedAppellationRow, SuggestedWineId,
    SuggestedWineRow, TasteProfileId, TasteProfileRow, WineId, WineRow, WineVintageId,
    WineVintageRow,
};
use rusqlite::Connection;

pub struct Catalog {
    pub conn: Connection,
}

impl Catalog {
    pub fn new() -> Self {
        Self {
            conn: db::open_in_memory().expect("open in-memory catalog"),
        }
    }

    pub fn country(&self, name: &str) -> CountryId {
        let row = CountryRow {
            id: CountryId::generate(),
            name: name.to_string(),
        };
        insert::insert_country(&self.conn, &row).expect("insert country");
        row.id
    }

    pub fn region(&self, country_id: CountryId, name: &str) -> RegionId {
        let row = RegionRow {
            id: RegionId::generate(),
            country_id,
            name: name.to_string(),
        };
        insert::insert_region(&self.conn, &row).expect("insert region");
        row.id
    }

    pub fn appellation(&self, region_id: RegionId, name: &str) -> AppellationId {
        let row = AppellationRow {
            id: AppellationId::generate(),
            region_id,
            name: name.to_string(),
        };
        insert::insert_appellation(&self.conn, &row).expect("insert appellation");
        row.id
    }

    pub fn sub_appellation(
        &self,
        appellation_id: AppellationId,
        name: Option<&str>,
    ) -> SubAppellationId {
        let row = SubAppellationRow {
            id: SubAppellationId::generate(),
            appellation_id,
            name: name.map(str::to_string),
        };
        insert::insert_sub_appellation(&self.conn, &row).expect("insert sub-appellation");
        row.id
    }

    pub fn wine(&self, sub_appellation_id: SubAppellationId, name: &str) -> WineId {
        self.wine_with_grape(sub_appellation_id, name, None)
    }

    pub fn wine_with_grape(
        &self,
        sub_appellation_id: SubAppellationId,
        name: &str,
        grape_variety: Option<&str>,
    ) -> WineId {
        let row = WineRow {
            id: WineId::generate(),
            sub_appellation_id,
            name: name.to_string(),
            grape_variety: grape_variety.map(str::to_string),
            color: None,
        };
        insert::insert_wine(&self.conn, &row).expect("insert wine");
        row.id
    }

    pub fn vintage(&self, wine_id: WineId, vintage: i32) -> WineVintageId {
        let row = WineVintageRow {
            id: WineVintageId::generate(),
            wine_id,
            vintage,
        };
        insert::insert_vintage(&self.conn, &row).expect("insert vintage");
        row.id
    }

    pub fn bottles(&self, wine_vintage_id: WineVintageId, count: usize) -> Vec<BottleId> {
        (0..count)
            .map(|_| {
                let row = BottleRow {
                    id: BottleId::generate(),
                    wine_vintage_id,
                    price: Some(25.0),
                    is_drunk: false,
                    drunk_at: None,
                    note: None,
                };
                insert::insert_bottle(&self.conn, &row).expect("insert bottle");
                row.id
            })
            .collect()
    }

    pub fn score(&self, wine_vintage_id: WineVintageId, year: i32, score: f64) -> EvolutionScoreId {
        let row = EvolutionScoreRow {
            id: EvolutionScoreId::generate(),
            wine_vintage_id,
            year,
            score,
        };
        insert::insert_evolution_score(&self.conn, &row).expect("insert score");
        row.id
    }

    pub fn taste_profile(&self, name: &str) -> TasteProfileId {
        let row = TasteProfileRow {
            id: TasteProfileId::generate(),
            name: name.to_string(),
        };
        insert::insert_taste_profile(&self.conn, &row).expect("insert taste profile");
        row.id
    }

    pub fn suggested_appellation(
        &self,
        sub_appellation_id: SubAppellationId,
        taste_profile_id: TasteProfileId,
        reason: Option<&str>,
    ) -> SuggestedAppellationId {
        let row = SuggestedAppellationRow {
            id: SuggestedAppellationId::generate(),
            sub_appellation_id,
            taste_profile_id,
            reason: reason.map(str::to_string),
        };
        insert::insert_suggested_appellation(&self.conn, &row)
            .expect("insert suggested appellation");
        row.id
    }

    pub fn suggested_wine(
        &self,
        suggested_appellation_id: SuggestedAppellationId,
        wine_id: WineId,
        vintage: Option<&str>,
    ) -> SuggestedWineId {
        let row = SuggestedWineRow {
            id: SuggestedWineId::generate(),
            suggested_appellation_id,
            wine_id,
            vintage: vintage.map(str::to_string),
        };
        insert::insert_suggested_wine(&self.conn, &row).expect("insert suggested wine");
        row.id
    }

    pub fn count(&self, kind: EntityKind) -> i64 {
        query::count_rows(&self.conn, kind).expect("count rows")
    }

    /// Every row of every table, for before/after equality checks.
    pub fn snapshot(&self) -> Vec<String> {
        let tables = [
            "countries",
            "regions",
            "appellations",
            "sub_appellations",
            "wines",
            "wine_vintages",
            "bottles",
            "evolution_scores",
            "taste_profiles",
            "suggested_appellations",
            "suggested_wines",
            "merge_log",
        ];
        let mut lines = Vec::new();
        for table in tables {
            let mut stmt = self
                .conn
                .prepare(&format!("SELECT * FROM {table} ORDER BY 1"))
                .expect("prepare snapshot");
            let columns = stmt.column_count();
            let rows = stmt
                .query_map([], |row| {
                    let mut cells = Vec::with_capacity(columns);
                    for idx in 0..columns {
                        cells.push(format!("{:?}", row.get_ref(idx)?));
                    }
                    Ok(format!("{table}: {}", cells.join(" | ")))
                })
                .expect("query snapshot");
            for line in rows {
                lines.push(line.expect("snapshot row"));
            }
        }
        lines
    }
}
