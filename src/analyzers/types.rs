//! Data types shared by the import and analytics pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::ImportError;

/// One labeled point on a criterion's scale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScaleOption {
    pub label: String,
    pub value: f64,
}

/// A single dimension of a rubric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RubricCriterion {
    pub id: u64,
    pub order: u32,
    pub label: String,
    #[serde(default)]
    pub options: Vec<ScaleOption>,
}

impl RubricCriterion {
    /// Looks up a scale option by label, ignoring case and surrounding whitespace.
    pub fn option_value(&self, label: &str) -> Option<f64> {
        let wanted = canonical_label(label);
        self.options
            .iter()
            .find(|o| canonical_label(&o.label) == wanted)
            .map(|o| o.value)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rubric {
    pub id: u64,
    pub name: String,
    pub criteria: Vec<RubricCriterion>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Problem {
    pub id: u64,
    /// Position of the problem inside its bank. Ratings files refer to problems by this number.
    pub order: u32,
    #[serde(default)]
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProblemBank {
    pub id: u64,
    pub name: String,
    pub problems: Vec<Problem>,
}

impl ProblemBank {
    /// Finds the problem at bank position `order`.
    pub fn problem_by_order(&self, order: u32) -> Option<&Problem> {
        self.problems.iter().find(|p| p.order == order)
    }
}

/// A stored rating: one rater's value for one problem on one criterion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingEntry {
    pub problem_id: u64,
    pub criterion_id: u64,
    pub value: f64,
    pub rater: String,
}

/// A data row from an ingested table, keyed by trimmed header text.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParsedRow {
    /// 1-based line number in the source file.
    pub line: u64,
    pub cells: BTreeMap<String, String>,
}

impl ParsedRow {
    pub fn get(&self, header: &str) -> Option<&str> {
        self.cells.get(header).map(String::as_str)
    }
}

/// Output of the tabular ingestor.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParsedTable {
    pub headers: Vec<String>,
    /// The header text (as it appears in `headers`) of the subject column.
    pub subject_header: String,
    pub rows: Vec<ParsedRow>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportMode {
    Preview,
    Commit,
}

/// What the user would import, shown before committing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImportPreview {
    pub headers: Vec<String>,
    pub rows: Vec<BTreeMap<String, String>>,
}

/// A non-empty cell that could not be read as a value for its criterion.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IgnoredCell {
    pub line: u64,
    pub header: String,
    pub value: String,
}

/// The write-set produced by a committed import.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ImportCommit {
    pub entries: Vec<RatingEntry>,
    pub skipped: Vec<ImportError>,
    pub ignored_cells: Vec<IgnoredCell>,
    pub ignored_headers: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ImportResult {
    Preview(ImportPreview),
    Commit(ImportCommit),
}

/// Two measures recorded for one subject inside a scope (e.g. one quiz).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScorePair {
    pub scope: String,
    pub subject: String,
    pub a: f64,
    pub b: f64,
}

/// A numeric rating tagged with the rater group it came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgreementRow {
    pub group: String,
    pub criterion: String,
    pub subject: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupPair {
    pub first: String,
    pub second: String,
}

impl GroupPair {
    pub fn new(first: impl Into<String>, second: impl Into<String>) -> Self {
        Self {
            first: first.into(),
            second: second.into(),
        }
    }

    pub fn label(&self) -> String {
        format!("{} vs {}", self.first, self.second)
    }
}

/// Correlation between the two measures within one scope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationRecord {
    pub scope: String,
    pub count: usize,
    pub r: Option<f64>,
    pub p: Option<f64>,
}

/// Paired comparison of two groups on one criterion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgreementRecord {
    pub group_pair: String,
    pub criterion: String,
    pub mean_difference: Option<f64>,
    pub t_statistic: Option<f64>,
    pub p_value: Option<f64>,
    pub common_problems: usize,
}

/// Envelope for reports written by the CLI.
#[derive(Debug, Serialize)]
pub struct Report<T> {
    pub generated_at: DateTime<Utc>,
    pub results: T,
}

impl<T> Report<T> {
    pub fn new(results: T) -> Self {
        Self {
            generated_at: Utc::now(),
            results,
        }
    }
}

/// Canonical form used for every label comparison: trimmed and lowercased.
pub fn canonical_label(label: &str) -> String {
    label.trim().to_lowercase()
}
