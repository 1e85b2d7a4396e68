//! Generic subtree reconciliation.
//!
//! Every level of the hierarchy is described by a zero-sized adapter that
//! implements [`Node`] (how to fold one row into another) and, for levels that
//! have a parent, [`Tier`] (how to key, list, and move children). A single
//! walk in [`reconcile_children`] then serves every level:
//!
//! 1. index the leader parent's children by key (first row wins)
//! 2. for each follower child in insertion order: absorb it into the indexed
//!    sibling with the same key, or reparent it to the leader and index it
//!
//! Absorbing recurses through the adapter's own [`Node::absorb`], and the
//! absorbed row is deleted only after everything beneath it has moved.

use super::error::MergeError;
use super::tx::CancelToken;
use crate::db::query;
use crate::model::EntityId;
use rusqlite::Connection;
use serde::Serialize;
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::hash::Hash;

/// Counters accumulated over one merge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MergeStats {
    /// Children moved under a new parent without a collision.
    pub reparented: u64,
    /// Rows folded into a same-key sibling and deleted, followers included.
    pub absorbed: u64,
    /// Bottles and evolution scores moved between vintages.
    pub leaves_moved: u64,
}

/// Mutable state threaded through one merge walk.
pub(crate) struct Scope<'a> {
    cancel: &'a CancelToken,
    pub(crate) stats: MergeStats,
}

impl<'a> Scope<'a> {
    pub(crate) fn new(cancel: &'a CancelToken) -> Self {
        Self {
            cancel,
            stats: MergeStats::default(),
        }
    }

    pub(crate) fn checkpoint(&self) -> Result<(), MergeError> {
        self.cancel.check()
    }
}

/// A row kind that can absorb a duplicate of itself.
pub(crate) trait Node {
    type Id: EntityId;
    type Row;

    fn id(row: &Self::Row) -> Self::Id;

    /// Move everything `duplicate` owns onto `survivor` and backfill any
    /// empty survivor fields. Must leave `duplicate` with no children.
    fn absorb(
        conn: &Connection,
        scope: &mut Scope<'_>,
        survivor: &Self::Row,
        duplicate: &Self::Row,
    ) -> Result<(), MergeError>;
}

/// A row kind that lives under a parent and is deduplicated by key there.
pub(crate) trait Tier: Node {
    type ParentId: EntityId;
    type Key: Eq + Hash;

    fn key(row: &Self::Row) -> Self::Key;

    fn children(conn: &Connection, parent: Self::ParentId) -> rusqlite::Result<Vec<Self::Row>>;

    fn reparent(conn: &Connection, id: Self::Id, parent: Self::ParentId) -> rusqlite::Result<()>;
}

/// Fold `duplicate` into `survivor`, then delete `duplicate`.
pub(crate) fn absorb_into<N: Node>(
    conn: &Connection,
    scope: &mut Scope<'_>,
    survivor: &N::Row,
    duplicate: &N::Row,
) -> Result<(), MergeError> {
    scope.checkpoint()?;
    N::absorb(conn, scope, survivor, duplicate)?;
    query::delete_by_id(conn, N::id(duplicate))?;
    scope.stats.absorbed += 1;
    tracing::debug!(
        kind = %<N::Id as EntityId>::KIND,
        survivor = %N::id(survivor),
        duplicate = %N::id(duplicate),
        "absorbed duplicate"
    );
    Ok(())
}

/// Reconcile the children of `follower` into the children of `leader`.
pub(crate) fn reconcile_children<T: Tier>(
    conn: &Connection,
    scope: &mut Scope<'_>,
    leader: T::ParentId,
    follower: T::ParentId,
) -> Result<(), MergeError> {
    let mut index: HashMap<T::Key, T::Row> = HashMap::new();
    for child in T::children(conn, leader)? {
        index.entry(T::key(&child)).or_insert(child);
    }

    for child in T::children(conn, follower)? {
        scope.checkpoint()?;
        match index.entry(T::key(&child)) {
            Entry::Occupied(slot) => absorb_into::<T>(conn, scope, slot.get(), &child)?,
            Entry::Vacant(slot) => {
                let id = T::id(&child);
                T::reparent(conn, id, leader)?;
                scope.stats.reparented += 1;
                tracing::debug!(
                    kind = %<T::Id as EntityId>::KIND,
                    id = %id,
                    parent = %leader,
                    "reparented child"
                );
                slot.insert(child);
            }
        }
    }

    Ok(())
}
