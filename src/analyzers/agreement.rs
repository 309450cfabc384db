//! Inter-group agreement via paired t-tests per criterion.
//!
//! Ratings from two groups (for example TAs and instructors) are paired by the
//! subject they rate. A subject rated more than once inside a group contributes
//! the mean of its ratings.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::debug;

use crate::analyzers::distribution::student_t_two_sided;
use crate::analyzers::types::{AgreementRecord, AgreementRow, GroupPair};
use crate::analyzers::utility::{mean, sample_stddev};

/// Minimum number of matched subjects for the test to run.
pub const MIN_MATCHED: usize = 2;

/// Spread of the differences, in units of the mean's rounding error, below
/// which they are treated as constant.
const ZERO_VARIANCE_ULPS: f64 = 8.0;

/// Outcome of a paired-difference t-test.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PairedTest {
    pub n: usize,
    pub mean_difference: Option<f64>,
    pub t_statistic: Option<f64>,
    pub p_value: Option<f64>,
}

/// Paired t-test on `first[i] - second[i]`, two-sided, with n - 1 degrees of freedom.
///
/// Extra values in the longer slice are ignored. With fewer than two pairs the
/// statistic and p-value are `None`. When the differences are constant (up to
/// floating-point rounding) the statistic is `None` and the p-value is 1 if
/// that difference is zero, `None` otherwise.
pub fn paired_t_test(first: &[f64], second: &[f64]) -> PairedTest {
    let diffs: Vec<f64> = first.iter().zip(second).map(|(a, b)| a - b).collect();
    let n = diffs.len();

    if n == 0 {
        return PairedTest {
            n,
            mean_difference: None,
            t_statistic: None,
            p_value: None,
        };
    }

    let mean_diff = mean(&diffs);
    let mut result = PairedTest {
        n,
        mean_difference: Some(mean_diff),
        t_statistic: None,
        p_value: None,
    };

    if n < MIN_MATCHED {
        return result;
    }

    let sd = sample_stddev(&diffs, mean_diff);
    let tolerance = f64::EPSILON * mean_diff.abs().max(1.0) * ZERO_VARIANCE_ULPS;
    if sd <= tolerance {
        if mean_diff.abs() <= tolerance {
            result.p_value = Some(1.0);
        }
        return result;
    }

    let se = sd / (n as f64).sqrt();
    let t = mean_diff / se;
    result.t_statistic = Some(t);
    result.p_value = student_t_two_sided(t, (n - 1) as f64);
    result
}

/// Runs one paired test per (group pair, criterion).
///
/// Criteria are reported in order of first appearance in `rows`, for every
/// requested pair, including those where the groups share no subjects.
pub fn compare_groups(rows: &[AgreementRow], pairs: &[GroupPair]) -> Vec<AgreementRecord> {
    let index = RatingIndex::build(rows);
    let mut records = Vec::with_capacity(pairs.len() * index.criteria.len());

    for pair in pairs {
        for criterion in &index.criteria {
            let (first, second) = index.matched(criterion, &pair.first, &pair.second);
            let test = paired_t_test(&first, &second);

            if test.n < MIN_MATCHED {
                debug!(
                    pair = %pair.label(),
                    criterion = %criterion,
                    common_problems = test.n,
                    "Too few matched subjects for a paired test"
                );
            }

            records.push(AgreementRecord {
                group_pair: pair.label(),
                criterion: criterion.to_string(),
                mean_difference: test.mean_difference,
                t_statistic: test.t_statistic,
                p_value: test.p_value,
                common_problems: test.n,
            });
        }
    }

    records
}

/// Every unordered pair of distinct groups found in `rows`, sorted by label.
pub fn all_group_pairs(rows: &[AgreementRow]) -> Vec<GroupPair> {
    let groups: Vec<&str> = rows
        .iter()
        .map(|r| r.group.as_str())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let mut pairs = Vec::new();
    for (i, first) in groups.iter().enumerate() {
        for second in &groups[i + 1..] {
            pairs.push(GroupPair::new(*first, *second));
        }
    }
    pairs
}

type SubjectValues<'a> = BTreeMap<&'a str, Vec<f64>>;

/// criterion -> group -> subject -> values
struct RatingIndex<'a> {
    criteria: Vec<&'a str>,
    values: HashMap<&'a str, HashMap<&'a str, SubjectValues<'a>>>,
}

impl<'a> RatingIndex<'a> {
    fn build(rows: &'a [AgreementRow]) -> Self {
        let mut criteria = Vec::new();
        let mut values: HashMap<&str, HashMap<&str, SubjectValues>> = HashMap::new();

        for row in rows {
            let by_group = values.entry(row.criterion.as_str()).or_insert_with(|| {
                criteria.push(row.criterion.as_str());
                HashMap::new()
            });
            by_group
                .entry(row.group.as_str())
                .or_default()
                .entry(row.subject.as_str())
                .or_default()
                .push(row.value);
        }

        Self { criteria, values }
    }

    /// Per-subject means for subjects rated by both groups, ordered by subject.
    fn matched(&self, criterion: &str, first: &str, second: &str) -> (Vec<f64>, Vec<f64>) {
        let groups = self.values.get(criterion);
        let (Some(a), Some(b)) = (
            groups.and_then(|g| g.get(first)),
            groups.and_then(|g| g.get(second)),
        ) else {
            return (Vec::new(), Vec::new());
        };

        a.iter()
            .filter_map(|(subject, a_values)| {
                b.get(subject)
                    .map(|b_values| (mean(a_values), mean(b_values)))
            })
            .unzip()
    }
}
