use crate::analyzers::types::{
    IgnoredCell, ImportCommit, ImportMode, ImportPreview, ImportResult, ParsedRow, ParsedTable,
    Problem, ProblemBank, RatingEntry, Rubric, RubricCriterion, canonical_label,
};
use crate::error::ImportError;
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use tracing::{debug, info, warn};

/// Everything needed to turn an ingested table into ratings.
#[derive(Debug, Clone, Copy)]
pub struct ImportRequest<'a> {
    pub table: &'a ParsedTable,
    pub rubric: &'a Rubric,
    pub bank: &'a ProblemBank,
    pub rater: &'a str,
    pub mode: ImportMode,
}

/// Lookup from canonical criterion label to criterion, built once per import.
#[derive(Debug)]
pub struct CriterionIndex<'a> {
    by_label: HashMap<String, &'a RubricCriterion>,
}

impl<'a> CriterionIndex<'a> {
    /// Indexes the rubric's criteria. When two criteria share a label the one
    /// with the lower order index wins.
    pub fn build(rubric: &'a Rubric) -> Self {
        let mut by_label: HashMap<String, &RubricCriterion> = HashMap::new();

        for criterion in &rubric.criteria {
            match by_label.entry(canonical_label(&criterion.label)) {
                Entry::Vacant(slot) => {
                    slot.insert(criterion);
                }
                Entry::Occupied(mut slot) => {
                    warn!(label = %criterion.label, "Duplicate criterion label in rubric");
                    if criterion.order < slot.get().order {
                        slot.insert(criterion);
                    }
                }
            }
        }

        Self { by_label }
    }

    pub fn resolve(&self, header: &str) -> Option<&'a RubricCriterion> {
        self.by_label.get(&canonical_label(header)).copied()
    }
}

/// Maps an ingested table onto ratings for `request.rater`.
///
/// In preview mode the table is echoed back untouched. In commit mode the full
/// write-set is computed; the caller hands it to a
/// [`RatingStore`](crate::store::RatingStore) to apply.
pub fn aggregate_ratings(request: &ImportRequest<'_>) -> ImportResult {
    match request.mode {
        ImportMode::Preview => ImportResult::Preview(preview(request.table)),
        ImportMode::Commit => ImportResult::Commit(commit(request)),
    }
}

fn preview(table: &ParsedTable) -> ImportPreview {
    ImportPreview {
        headers: table.headers.clone(),
        rows: table.rows.iter().map(|r| r.cells.clone()).collect(),
    }
}

fn commit(request: &ImportRequest<'_>) -> ImportCommit {
    let table = request.table;
    let index = CriterionIndex::build(request.rubric);

    let mut result = ImportCommit::default();
    let mut columns = Vec::new();

    for header in &table.headers {
        if header.is_empty() || *header == table.subject_header {
            continue;
        }
        match index.resolve(header) {
            Some(criterion) => columns.push((header.as_str(), criterion)),
            None => {
                debug!(header = %header, "Column matches no rubric criterion, ignoring");
                result.ignored_headers.push(header.clone());
            }
        }
    }

    // (problem, criterion) -> position in result.entries
    let mut positions: HashMap<(u64, u64), usize> = HashMap::new();

    for row in &table.rows {
        let problem = match resolve_subject(request.bank, row, &table.subject_header) {
            Ok(problem) => problem,
            Err(e) => {
                warn!(error = %e, "Skipping row");
                result.skipped.push(e);
                continue;
            }
        };

        for (header, criterion) in &columns {
            let Some(cell) = row.get(header).filter(|c| !c.is_empty()) else {
                continue;
            };

            let Some(value) = resolve_value(criterion, cell) else {
                debug!(line = row.line, header = %header, value = %cell, "Unreadable rating value");
                result.ignored_cells.push(IgnoredCell {
                    line: row.line,
                    header: header.to_string(),
                    value: cell.to_string(),
                });
                continue;
            };

            let entry = RatingEntry {
                problem_id: problem.id,
                criterion_id: criterion.id,
                value,
                rater: request.rater.to_string(),
            };

            // Later rows overwrite earlier ones for the same pair.
            match positions.entry((problem.id, criterion.id)) {
                Entry::Occupied(slot) => result.entries[*slot.get()] = entry,
                Entry::Vacant(slot) => {
                    slot.insert(result.entries.len());
                    result.entries.push(entry);
                }
            }
        }
    }

    info!(
        rater = request.rater,
        rows = table.rows.len(),
        criteria_columns = columns.len(),
        entries = result.entries.len(),
        skipped = result.skipped.len(),
        ignored_cells = result.ignored_cells.len(),
        ignored_headers = result.ignored_headers.len(),
        "Ratings import resolved"
    );

    result
}

/// Reads a cell as a number, or failing that as one of the criterion's scale labels.
pub fn resolve_value(criterion: &RubricCriterion, cell: &str) -> Option<f64> {
    let cell = cell.trim();
    match cell.parse::<f64>() {
        Ok(v) if v.is_finite() => Some(v),
        _ => criterion.option_value(cell),
    }
}

/// Finds the problem whose bank order matches the row's subject cell.
///
/// Integral decimals such as `"3.0"` are accepted, as spreadsheet exports
/// often write whole numbers that way.
pub fn resolve_subject<'b>(
    bank: &'b ProblemBank,
    row: &ParsedRow,
    subject_header: &str,
) -> Result<&'b Problem, ImportError> {
    let raw = row.get(subject_header).unwrap_or_default().trim();
    let unresolved = |reason: String| ImportError::UnresolvedSubject {
        line: row.line,
        value: raw.to_string(),
        reason,
    };

    if raw.is_empty() {
        return Err(unresolved("problem number is empty".to_string()));
    }

    let order = parse_order(raw)
        .ok_or_else(|| unresolved("problem number is not a whole number".to_string()))?;

    bank.problem_by_order(order)
        .ok_or_else(|| unresolved(format!("no problem {order} in bank '{}'", bank.name)))
}

fn parse_order(raw: &str) -> Option<u32> {
    if let Ok(order) = raw.parse::<u32>() {
        return Some(order);
    }
    let v = raw.parse::<f64>().ok()?;
    if v.is_finite() && v.fract() == 0.0 && v >= 0.0 && v <= f64::from(u32::MAX) {
        Some(v as u32)
    } else {
        None
    }
}
