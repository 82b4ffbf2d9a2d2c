//! Directional like/dislike ledger and mutual-like detection.

use anyhow::Result;
use async_trait::async_trait;
use sqlx::postgres::PgPool;
use tracing::{debug, info};

use super::Decision;
use crate::db;

pub use crate::db::Choice;

/// Storage of judgments, one edge per ordered (chooser, chosen) pair
#[async_trait]
pub trait ChoiceLedger: Send + Sync {
    /// Insert an edge unless the pair is already judged. Returns `true` when
    /// a new edge was written.
    async fn insert_choice(&self, chooser_id: i64, chosen_id: i64, decision: Decision) -> Result<bool>;

    async fn has_liked(&self, chooser_id: i64, chosen_id: i64) -> Result<bool>;

    async fn judged_ids(&self, chooser_id: i64) -> Result<Vec<i64>>;
}

#[async_trait]
impl ChoiceLedger for PgPool {
    async fn insert_choice(&self, chooser_id: i64, chosen_id: i64, decision: Decision) -> Result<bool> {
        db::insert_choice(self, chooser_id, chosen_id, decision).await
    }

    async fn has_liked(&self, chooser_id: i64, chosen_id: i64) -> Result<bool> {
        db::has_liked(self, chooser_id, chosen_id).await
    }

    async fn judged_ids(&self, chooser_id: i64) -> Result<Vec<i64>> {
        db::list_judged_ids(self, chooser_id).await
    }
}

/// Outcome of recording a judgment
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Judgment {
    /// The pair was judged before; the earlier decision stands.
    AlreadyRecorded,
    Recorded,
    /// A new LIKE completed a pair of reciprocal likes.
    MutualMatch,
}

/// Record `chooser_id`'s decision about `chosen_id` and check for a match.
///
/// The reciprocal edge is only consulted after a LIKE was newly inserted, so
/// a given pair is reported as a match exactly once.
pub async fn record_judgment<L>(
    ledger: &L,
    chooser_id: i64,
    chosen_id: i64,
    decision: Decision,
) -> Result<Judgment>
where
    L: ChoiceLedger + ?Sized,
{
    if !ledger.insert_choice(chooser_id, chosen_id, decision).await? {
        debug!(chooser_id, chosen_id, "Pair already judged, keeping earlier decision");
        return Ok(Judgment::AlreadyRecorded);
    }

    if decision == Decision::Dislike {
        return Ok(Judgment::Recorded);
    }

    if ledger.has_liked(chosen_id, chooser_id).await? {
        info!(chooser_id, chosen_id, "Mutual like detected");
        Ok(Judgment::MutualMatch)
    } else {
        Ok(Judgment::Recorded)
    }
}
