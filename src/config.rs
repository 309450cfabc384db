use anyhow::{Context, Result};
use serde::Deserialize;

use crate::analyzers::types::{ProblemBank, Rubric};

/// The rubric and problem bank an import resolves against.
///
/// Stored as a JSON object on disk:
/// ```json
/// {
///   "rubric": {
///     "id": 1,
///     "name": "Problem quality",
///     "criteria": [
///       { "id": 11, "order": 1, "label": "Clarity",
///         "options": [{ "label": "Poor", "value": 1 }, { "label": "Good", "value": 3 }] }
///     ]
///   },
///   "bank": {
///     "id": 5,
///     "name": "Week 1",
///     "problems": [{ "id": 501, "order": 1, "title": "Two sum" }]
///   }
/// }
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct Catalog {
    pub rubric: Rubric,
    pub bank: ProblemBank,
}

impl Catalog {
    /// Loads the catalog from a JSON file at `path`.
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read catalog '{path}'"))?;
        Self::from_json(&content).with_context(|| format!("invalid catalog '{path}'"))
    }

    /// Parses a catalog from JSON text.
    pub fn from_json(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }
}
