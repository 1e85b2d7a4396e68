//! Level merge operations.
//!
//! Each entry point folds one or more follower records into a leader record
//! at the same level, reconciling every descendant subtree so no two siblings
//! share a key afterwards, then deletes the followers. The whole operation is
//! one transaction: it either commits completely or leaves the catalog
//! untouched.
//!
//! ```text
//! merge_regions(conn, leader, [f1, f2], ctx)
//!   normalize followers (drop nil, drop leader, dedup)
//!   BEGIN IMMEDIATE
//!     load leader + followers          -> NotFound if any is gone
//!     for each follower: reconcile appellations ... bottles, then delete it
//!     append merge_log row
//!   COMMIT
//! ```

pub mod error;
pub mod key;
mod leaf;
mod reconcile;
mod tiers;
pub mod tx;

pub use error::MergeError;
pub use key::NameKey;
pub use reconcile::MergeStats;
pub use tx::{CancelToken, MergeContext, RetryPolicy};

use crate::db::query;
use crate::model::{
    AppellationId, CountryId, EntityId, MergeLevel, RegionId, SubAppellationId, WineId,
};
use reconcile::{Scope, absorb_into};
use rusqlite::Connection;
use serde::Serialize;
use std::collections::HashSet;
use tiers::{Appellations, Countries, Level, Regions, SubAppellations, Wines};
use tx::{run_in_transaction, with_retry};
use uuid::Uuid;

/// Result of a committed merge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MergeOutcome {
    pub level: MergeLevel,
    pub leader_id: Uuid,
    pub leader_name: String,
    /// Number of distinct followers folded into the leader.
    pub followers_merged: usize,
    pub stats: MergeStats,
}

impl MergeOutcome {
    /// One-line status message, e.g. `Merged 3 regions into Bordeaux.`
    #[must_use]
    pub fn summary(&self) -> String {
        let kind = self.level.kind();
        let noun = if self.followers_merged == 1 {
            kind.noun()
        } else {
            kind.plural()
        };
        format!(
            "Merged {} {noun} into {}.",
            self.followers_merged, self.leader_name
        )
    }
}

/// Drop nil ids and the leader's own id, then dedup keeping first-seen order.
#[must_use]
pub fn normalize_followers<I: EntityId>(leader: I, followers: &[I]) -> Vec<I> {
    let mut seen = HashSet::with_capacity(followers.len());
    followers
        .iter()
        .copied()
        .filter(|id| !id.is_nil() && *id != leader && seen.insert(*id))
        .collect()
}

/// Merge follower countries into `leader`.
///
/// # Errors
///
/// See [`MergeError`]. On any error nothing has been written.
pub fn merge_countries(
    conn: &mut Connection,
    leader: CountryId,
    followers: &[CountryId],
    ctx: &MergeContext,
) -> Result<MergeOutcome, MergeError> {
    merge_level::<Countries>(conn, leader, followers, ctx)
}

/// Merge follower regions into `leader`.
///
/// # Errors
///
/// See [`MergeError`]. On any error nothing has been written.
pub fn merge_regions(
    conn: &mut Connection,
    leader: RegionId,
    followers: &[RegionId],
    ctx: &MergeContext,
) -> Result<MergeOutcome, MergeError> {
    merge_level::<Regions>(conn, leader, followers, ctx)
}

/// Merge follower appellations into `leader`.
///
/// # Errors
///
/// See [`MergeError`]. On any error nothing has been written.
pub fn merge_appellations(
    conn: &mut Connection,
    leader: AppellationId,
    followers: &[AppellationId],
    ctx: &MergeContext,
) -> Result<MergeOutcome, MergeError> {
    merge_level::<Appellations>(conn, leader, followers, ctx)
}

/// Merge follower sub-appellations into `leader`.
///
/// # Errors
///
/// See [`MergeError`]. On any error nothing has been written.
pub fn merge_sub_appellations(
    conn: &mut Connection,
    leader: SubAppellationId,
    followers: &[SubAppellationId],
    ctx: &MergeContext,
) -> Result<MergeOutcome, MergeError> {
    merge_level::<SubAppellations>(conn, leader, followers, ctx)
}

/// Merge follower wines into `leader`.
///
/// # Errors
///
/// See [`MergeError`]. On any error nothing has been written.
pub fn merge_wines(
    conn: &mut Connection,
    leader: WineId,
    followers: &[WineId],
    ctx: &MergeContext,
) -> Result<MergeOutcome, MergeError> {
    merge_level::<Wines>(conn, leader, followers, ctx)
}

/// Merge at a level chosen at runtime, with untyped ids.
///
/// # Errors
///
/// See [`MergeError`]. On any error nothing has been written.
pub fn merge(
    conn: &mut Connection,
    level: MergeLevel,
    leader: Uuid,
    followers: &[Uuid],
    ctx: &MergeContext,
) -> Result<MergeOutcome, MergeError> {
    match level {
        MergeLevel::Country => merge_untyped::<Countries>(conn, leader, followers, ctx),
        MergeLevel::Region => merge_untyped::<Regions>(conn, leader, followers, ctx),
        MergeLevel::Appellation => merge_untyped::<Appellations>(conn, leader, followers, ctx),
        MergeLevel::SubAppellation => {
            merge_untyped::<SubAppellations>(conn, leader, followers, ctx)
        }
        MergeLevel::Wine => merge_untyped::<Wines>(conn, leader, followers, ctx),
    }
}

fn merge_untyped<L: Level>(
    conn: &mut Connection,
    leader: Uuid,
    followers: &[Uuid],
    ctx: &MergeContext,
) -> Result<MergeOutcome, MergeError> {
    let followers: Vec<L::Id> = followers.iter().copied().map(L::Id::from_uuid).collect();
    merge_level::<L>(conn, L::Id::from_uuid(leader), &followers, ctx)
}

fn merge_level<L: Level>(
    conn: &mut Connection,
    leader: L::Id,
    followers: &[L::Id],
    ctx: &MergeContext,
) -> Result<MergeOutcome, MergeError> {
    let followers = normalize_followers(leader, followers);
    if followers.is_empty() {
        return Err(MergeError::Validation { level: L::LEVEL });
    }

    let span = tracing::info_span!(
        "merge",
        level = %L::LEVEL,
        leader = %leader,
        followers = followers.len()
    );
    let _entered = span.enter();

    let result = with_retry(&ctx.retry, &ctx.cancel, |attempt| {
        tracing::debug!(attempt, "starting merge attempt");
        run_in_transaction(conn, |tx| {
            merge_body::<L>(tx, leader, &followers, &ctx.cancel)
        })
    });

    match &result {
        Ok(outcome) => tracing::info!(
            leader_name = %outcome.leader_name,
            followers_merged = outcome.followers_merged,
            reparented = outcome.stats.reparented,
            absorbed = outcome.stats.absorbed,
            leaves_moved = outcome.stats.leaves_moved,
            "merge committed"
        ),
        Err(err) => tracing::warn!(error = %err, code = %err.code(), "merge rolled back"),
    }
    result
}

// Existence is checked here, under the write lock, rather than before BEGIN:
// a row found before the lock could be merged away by another writer before
// this body runs.
fn merge_body<L: Level>(
    conn: &Connection,
    leader: L::Id,
    followers: &[L::Id],
    cancel: &CancelToken,
) -> Result<MergeOutcome, MergeError> {
    let leader_row = L::fetch(conn, leader)?.ok_or_else(|| MergeError::not_found(leader))?;

    let mut follower_rows = Vec::with_capacity(followers.len());
    for &id in followers {
        let row = L::fetch(conn, id)?.ok_or_else(|| MergeError::not_found(id))?;
        follower_rows.push(row);
    }

    let mut scope = Scope::new(cancel);
    for follower in &follower_rows {
        absorb_into::<L>(conn, &mut scope, &leader_row, follower)?;
    }

    let leader_name = L::label(&leader_row);
    let follower_ids: Vec<Uuid> = followers.iter().map(|id| id.as_uuid()).collect();
    let merged_at_us = chrono::Utc::now().timestamp_micros();
    query::record_merge(
        conn,
        L::LEVEL,
        leader.as_uuid(),
        &leader_name,
        &follower_ids,
        merged_at_us,
    )?;

    Ok(MergeOutcome {
        level: L::LEVEL,
        leader_id: leader.as_uuid(),
        leader_name,
        followers_merged: followers.len(),
        stats: scope.stats,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_drops_leader_nil_and_duplicates() {
        let leader = RegionId::generate();
        let a = RegionId::generate();
        let b = RegionId::generate();
        let nil = RegionId::from_uuid(Uuid::nil());

        let normalized = normalize_followers(leader, &[a, leader, nil, b, a, b]);
        assert_eq!(normalized, vec![a, b]);
    }

    #[test]
    fn summary_pluralizes() {
        let mut outcome = MergeOutcome {
            level: MergeLevel::Region,
            leader_id: Uuid::new_v4(),
            leader_name: "Bordeaux".into(),
            followers_merged: 3,
            stats: MergeStats::default(),
        };
        assert_eq!(outcome.summary(), "Merged 3 regions into Bordeaux.");
        outcome.followers_merged = 1;
        assert_eq!(outcome.summary(), "Merged 1 region into Bordeaux.");
    }
}
