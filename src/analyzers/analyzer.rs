use crate::analyzers::quadrant::{
    QuadrantCounts, QuadrantSummary, classify_pairs, quadrants_by_scope,
};
use crate::analyzers::types::{AgreementRow, RatingEntry, ScorePair};
use crate::store::MemoryRatingStore;
use anyhow::{Context, Result};
use csv::{ReaderBuilder, Trim};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info};

/// A row of a scores CSV. Either measure may be blank.
#[derive(Debug, Deserialize)]
struct ScoreRow {
    scope: String,
    subject: String,
    a: Option<f64>,
    b: Option<f64>,
}

/// Quadrant counts for every scope plus their elementwise sum.
#[derive(Debug, Serialize)]
pub struct QuadrantReport {
    pub global: QuadrantCounts,
    /// Medians and counts of all pairs pooled as one collection.
    pub pooled: QuadrantSummary,
    pub scopes: BTreeMap<String, QuadrantSummary>,
}

/// Classifies each scope on its own medians and sums the counts.
pub fn analyze_quadrants(pairs: &[ScorePair]) -> QuadrantReport {
    let scopes = quadrants_by_scope(pairs);
    let global = scopes.values().map(|s| s.counts).sum();

    QuadrantReport {
        global,
        pooled: classify_pairs(pairs),
        scopes,
    }
}

/// Loads score pairs from a CSV with `scope,subject,a,b` columns.
///
/// Rows missing either measure are dropped.
pub fn load_score_pairs(path: &str) -> Result<Vec<ScorePair>> {
    let rows: Vec<ScoreRow> = read_csv(path)?;
    let total = rows.len();

    let pairs: Vec<ScorePair> = rows
        .into_iter()
        .filter_map(|row| match (row.a, row.b) {
            (Some(a), Some(b)) => Some(ScorePair {
                scope: row.scope,
                subject: row.subject,
                a,
                b,
            }),
            _ => {
                debug!(scope = %row.scope, subject = %row.subject, "Score row missing a measure");
                None
            }
        })
        .collect();

    info!(
        path,
        rows = total,
        pairs = pairs.len(),
        incomplete = total - pairs.len(),
        "Score pairs loaded"
    );
    Ok(pairs)
}

/// Loads agreement rows from a CSV with `group,criterion,subject,value` columns.
pub fn load_agreement_rows(path: &str) -> Result<Vec<AgreementRow>> {
    let rows: Vec<AgreementRow> = read_csv(path)?;
    info!(path, rows = rows.len(), "Agreement rows loaded");
    Ok(rows)
}

/// Loads a CSV-backed rating store. A missing file is an empty store.
pub fn load_ratings(path: &str) -> Result<MemoryRatingStore> {
    if !Path::new(path).exists() {
        debug!(path, "No rating store yet, starting empty");
        return Ok(MemoryRatingStore::new());
    }

    let entries: Vec<RatingEntry> = read_csv(path)?;
    Ok(MemoryRatingStore::from_entries(entries))
}

fn read_csv<T: DeserializeOwned>(path: &str) -> Result<Vec<T>> {
    let mut rdr = ReaderBuilder::new()
        .trim(Trim::All)
        .from_path(path)
        .with_context(|| format!("failed to open '{path}'"))?;

    let mut rows = Vec::new();
    for result in rdr.deserialize() {
        let record: T = result.with_context(|| format!("bad row in '{path}'"))?;
        rows.push(record);
    }

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_score_pairs_drops_incomplete_rows() {
        let file = write_temp("scope,subject,a,b\nq1,s1,80,10\nq1,s2,,15\nq1, s3 ,70,12\n");
        let pairs = load_score_pairs(file.path().to_str().unwrap()).unwrap();

        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[1].subject, "s3");
        assert_eq!(pairs[1].a, 70.0);
    }

    #[test]
    fn test_load_agreement_rows() {
        let file = write_temp("group,criterion,subject,value\nta,Clarity,1,3\n");
        let rows = load_agreement_rows(file.path().to_str().unwrap()).unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].group, "ta");
        assert_eq!(rows[0].value, 3.0);
    }

    #[test]
    fn test_load_ratings_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ratings.csv");
        let store = load_ratings(path.to_str().unwrap()).unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn test_analyze_quadrants_sums_scopes() {
        let pair = |scope: &str, subject: &str, a: f64, b: f64| ScorePair {
            scope: scope.to_string(),
            subject: subject.to_string(),
            a,
            b,
        };
        let pairs = vec![
            pair("q1", "s1", 80.0, 10.0),
            pair("q1", "s2", 90.0, 15.0),
            pair("q2", "s1", 70.0, 12.0),
            pair("q2", "s2", 85.0, 14.0),
        ];
        let report = analyze_quadrants(&pairs);

        assert_eq!(report.global.total(), 4);
        assert_eq!(report.global.masters, 2);
        assert_eq!(report.global.strugglers, 2);
        assert_eq!(report.pooled.counts.total(), 4);
        assert_eq!(report.scopes.len(), 2);
    }
}
