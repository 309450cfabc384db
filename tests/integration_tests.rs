use rubric_rater::analyzers::aggregate::{ImportRequest, aggregate_ratings};
use rubric_rater::analyzers::agreement::{all_group_pairs, compare_groups};
use rubric_rater::analyzers::analyzer::{analyze_quadrants, load_agreement_rows, load_score_pairs};
use rubric_rater::analyzers::correlation::correlate_by_scope;
use rubric_rater::analyzers::quadrant::classify_pairs;
use rubric_rater::analyzers::types::{ImportCommit, ImportMode, ImportResult, ScorePair};
use rubric_rater::config::Catalog;
use rubric_rater::parser::{TextEncoding, parse_table};
use rubric_rater::store::{MemoryRatingStore, RatingStore, apply_commit};

fn fixture(name: &str) -> String {
    format!("{}/tests/fixtures/{}", env!("CARGO_MANIFEST_DIR"), name)
}

fn catalog() -> Catalog {
    Catalog::load(&fixture("catalog.json")).expect("Failed to load catalog")
}

fn import(bytes: &[u8], mode: ImportMode) -> ImportResult {
    let catalog = catalog();
    let table = parse_table(bytes, TextEncoding::Utf8).expect("Failed to parse table");
    aggregate_ratings(&ImportRequest {
        table: &table,
        rubric: &catalog.rubric,
        bank: &catalog.bank,
        rater: "alice",
        mode,
    })
}

fn commit_of(result: ImportResult) -> ImportCommit {
    match result {
        ImportResult::Commit(commit) => commit,
        ImportResult::Preview(_) => panic!("expected a commit"),
    }
}

#[test]
fn test_single_rating_end_to_end() {
    let commit = commit_of(import(b"Problem,Criterion1\n1,5", ImportMode::Commit));

    let mut store = MemoryRatingStore::new();
    let summary = apply_commit(&mut store, &commit).unwrap();

    assert_eq!(summary.created, 1);
    assert_eq!(store.len(), 1);
    assert_eq!(store.get(501, 11, "alice").map(|e| e.value), Some(5.0));
}

#[test]
fn test_spreadsheet_export_commit() {
    let bytes = std::fs::read(fixture("ratings_export.csv")).unwrap();
    let commit = commit_of(import(&bytes, ImportMode::Commit));

    let written: Vec<_> = commit
        .entries
        .iter()
        .map(|e| (e.problem_id, e.criterion_id, e.value))
        .collect();
    assert_eq!(
        written,
        vec![
            (501, 11, 5.0),
            (501, 12, 3.0),
            (502, 11, 3.0),
            (502, 12, 4.0),
            (503, 12, 2.0),
        ]
    );
    assert_eq!(commit.skipped.len(), 1);
    assert_eq!(commit.ignored_cells.len(), 1);
    assert_eq!(commit.ignored_cells[0].value, "n/a");
    assert_eq!(commit.ignored_headers, vec!["Reviewer notes"]);
}

#[test]
fn test_spreadsheet_export_preview() {
    let bytes = std::fs::read(fixture("ratings_export.csv")).unwrap();

    let ImportResult::Preview(preview) = import(&bytes, ImportMode::Preview) else {
        panic!("expected a preview");
    };

    assert_eq!(
        preview.headers,
        vec!["problem", "Criterion1", "clarity", "Reviewer notes"]
    );
    assert_eq!(preview.rows.len(), 5);
    assert_eq!(preview.rows[3]["problem"], "8");
}

#[test]
fn test_commit_twice_is_idempotent() {
    let bytes = std::fs::read(fixture("ratings_export.csv")).unwrap();
    let commit = commit_of(import(&bytes, ImportMode::Commit));

    let mut store = MemoryRatingStore::new();
    apply_commit(&mut store, &commit).unwrap();
    let first: Vec<_> = store.entries().cloned().collect();

    let again = commit_of(import(&bytes, ImportMode::Commit));
    let summary = apply_commit(&mut store, &again).unwrap();

    assert_eq!(summary.created, 0);
    assert_eq!(summary.updated, first.len());
    assert_eq!(store.entries().cloned().collect::<Vec<_>>(), first);
}

#[test]
fn test_store_trait_object() {
    let commit = commit_of(import(b"Problem,Clarity\n2,Excellent\n", ImportMode::Commit));
    let mut store = MemoryRatingStore::new();
    let dyn_store: &mut dyn RatingStore = &mut store;

    let summary = apply_commit(dyn_store, &commit).unwrap();
    assert_eq!(summary.created, 1);
    assert_eq!(store.get(502, 12, "alice").map(|e| e.value), Some(4.0));
}

#[test]
fn test_four_subject_quadrants() {
    let pairs: Vec<ScorePair> = [(80.0, 10.0), (90.0, 15.0), (70.0, 12.0), (85.0, 14.0)]
        .iter()
        .enumerate()
        .map(|(i, &(a, b))| ScorePair {
            scope: "quiz".to_string(),
            subject: format!("s{i}"),
            a,
            b,
        })
        .collect();

    let summary = classify_pairs(&pairs);
    assert_eq!(summary.counts.total(), 4);
}

#[test]
fn test_scores_file_analytics() {
    let pairs = load_score_pairs(&fixture("scores.csv")).unwrap();
    assert_eq!(pairs.len(), 6);

    let report = analyze_quadrants(&pairs);
    assert_eq!(report.scopes.len(), 3);
    assert_eq!(report.scopes["Quiz 1"].counts.total(), 4);
    assert_eq!(report.global.total(), 6);

    let records = correlate_by_scope(&pairs);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].scope, "Quiz 1");
    assert_eq!(records[0].count, 4);
    let r = records[0].r.unwrap();
    assert!((r - 0.638).abs() < 1e-3, "got {r}");
    let p = records[0].p.unwrap();
    assert!(p > 0.0 && p < 1.0);
}

#[test]
fn test_agreement_file() {
    let rows = load_agreement_rows(&fixture("agreement.csv")).unwrap();
    let pairs = all_group_pairs(&rows);
    let records = compare_groups(&rows, &pairs);

    assert_eq!(records.len(), 2);

    let clarity = &records[0];
    assert_eq!(clarity.group_pair, "instructor vs ta");
    assert_eq!(clarity.criterion, "Clarity");
    assert_eq!(clarity.common_problems, 4);
    assert_eq!(clarity.mean_difference, Some(-1.0));
    assert!(clarity.t_statistic.unwrap() < 0.0);
    let p = clarity.p_value.unwrap();
    assert!(p > 0.05 && p < 0.15, "got {p}");

    let depth = &records[1];
    assert_eq!(depth.common_problems, 0);
    assert_eq!(depth.t_statistic, None);
    assert_eq!(depth.p_value, None);
}
