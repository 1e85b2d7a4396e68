//! Merges against an on-disk catalog shared by two connections.

use std::time::Duration;

use cellar_core::db::{self, insert, query};
use cellar_core::merge::{CancelToken, MergeContext, MergeError, RetryPolicy, merge_regions};
use cellar_core::model::{CountryId, CountryRow, RegionId, RegionRow};
use rusqlite::Connection;
use tempfile::TempDir;

fn open_pair() -> (TempDir, Connection, Connection) {
    let dir = TempDir::new().expect("create temp dir");
    let path = db::catalog_path(dir.path());
    let first = db::open_catalog(&path, Duration::ZERO).expect("open first");
    let second = db::open_catalog(&path, Duration::ZERO).expect("open second");
    (dir, first, second)
}

fn seed(conn: &Connection) -> (RegionId, RegionId) {
    let country = CountryRow {
        id: CountryId::generate(),
        name: "France".into(),
    };
    insert::insert_country(conn, &country).expect("country");
    let mut ids = Vec::new();
    for name in ["Loire", "Loire Valley"] {
        let region = RegionRow {
            id: RegionId::generate(),
            country_id: country.id,
            name: name.into(),
        };
        insert::insert_region(conn, &region).expect("region");
        ids.push(region.id);
    }
    (ids[0], ids[1])
}

fn quick_retry(max_attempts: u32) -> MergeContext {
    MergeContext::new(
        RetryPolicy {
            max_attempts,
            initial_backoff: Duration::from_millis(1),
            max_backoff: Duration::from_millis(5),
        },
        CancelToken::new(),
    )
}

#[test]
fn held_write_lock_exhausts_retries_then_merge_succeeds() {
    let (_dir, mut merger, holder) = open_pair();
    let (leader, follower) = seed(&merger);

    holder
        .execute_batch("BEGIN IMMEDIATE")
        .expect("take write lock");

    let err = merge_regions(&mut merger, leader, &[follower], &quick_retry(3))
        .expect_err("writer is blocked");
    assert!(matches!(err, MergeError::Failed(_)), "got {err:?}");
    assert!(query::get_region(&merger, follower).expect("get").is_some());

    holder.execute_batch("COMMIT").expect("release write lock");

    let outcome =
        merge_regions(&mut merger, leader, &[follower], &quick_retry(3)).expect("merge");
    assert_eq!(outcome.followers_merged, 1);
}

#[test]
fn overlapping_merge_sees_consumed_follower_as_not_found() {
    let (_dir, mut first, mut second) = open_pair();
    let (leader, follower) = seed(&first);

    merge_regions(&mut first, leader, &[follower], &quick_retry(1)).expect("first merge");

    let err = merge_regions(&mut second, leader, &[follower], &quick_retry(1))
        .expect_err("follower already consumed");
    assert!(matches!(err, MergeError::NotFound { .. }), "got {err:?}");
    assert_eq!(query::recent_merges(&second, 10).expect("log").len(), 1);
}
