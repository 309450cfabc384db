use anyhow::Result;
use std::collections::BTreeMap;

use super::{RatingStore, Upsert};
use crate::analyzers::types::RatingEntry;

type RatingKey = (u64, u64, String);

/// In-memory rating store, ordered by (problem, criterion, rater).
#[derive(Debug, Default, Clone)]
pub struct MemoryRatingStore {
    entries: BTreeMap<RatingKey, RatingEntry>,
}

impl MemoryRatingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a store from previously saved entries. Later duplicates replace earlier ones.
    pub fn from_entries(entries: impl IntoIterator<Item = RatingEntry>) -> Self {
        let mut store = Self::new();
        for entry in entries {
            store.insert(entry);
        }
        store
    }

    /// The rating `rater` gave `problem_id` on `criterion_id`, if any.
    pub fn get(&self, problem_id: u64, criterion_id: u64, rater: &str) -> Option<&RatingEntry> {
        self.entries.get(&(problem_id, criterion_id, rater.to_string()))
    }

    pub fn entries(&self) -> impl Iterator<Item = &RatingEntry> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn insert(&mut self, entry: RatingEntry) -> Option<RatingEntry> {
        let key = (entry.problem_id, entry.criterion_id, entry.rater.clone());
        self.entries.insert(key, entry)
    }
}

impl RatingStore for MemoryRatingStore {
    fn upsert(&mut self, entry: RatingEntry) -> Result<Upsert> {
        Ok(match self.insert(entry) {
            Some(_) => Upsert::Updated,
            None => Upsert::Created,
        })
    }
}
