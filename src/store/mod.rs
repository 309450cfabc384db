//! Persistence seam for committed ratings.
//!
//! [`RatingStore`] is implemented by whatever layer owns rating storage.
//! [`MemoryRatingStore`] keeps entries in memory and backs the CLI's CSV file.

mod memory;

pub use memory::MemoryRatingStore;

use anyhow::Result;
use serde::Serialize;
use tracing::info;

use crate::analyzers::types::{ImportCommit, RatingEntry};

/// Whether an upsert created a new rating or replaced an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
    Created,
    Updated,
}

/// Writes ratings keyed by (problem, criterion, rater).
pub trait RatingStore {
    /// Inserts `entry`, replacing any rating with the same key.
    fn upsert(&mut self, entry: RatingEntry) -> Result<Upsert>;
}

/// Counts reported after applying a commit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ApplySummary {
    pub created: usize,
    pub updated: usize,
    pub skipped: usize,
}

/// Applies a commit's write-set to `store`.
///
/// Entries are written in order; a store error stops the remaining writes and
/// is returned, earlier writes stay applied.
pub fn apply_commit<S: RatingStore + ?Sized>(
    store: &mut S,
    commit: &ImportCommit,
) -> Result<ApplySummary> {
    let mut summary = ApplySummary {
        skipped: commit.skipped.len(),
        ..Default::default()
    };

    for entry in &commit.entries {
        match store.upsert(entry.clone())? {
            Upsert::Created => summary.created += 1,
            Upsert::Updated => summary.updated += 1,
        }
    }

    info!(
        created = summary.created,
        updated = summary.updated,
        skipped = summary.skipped,
        "Ratings commit applied"
    );
    Ok(summary)
}
