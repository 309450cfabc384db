//! Median-split classification of subjects by two measures.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign};

use crate::analyzers::types::ScorePair;
use crate::analyzers::utility::median;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Quadrant {
    /// High on both measures.
    Masters,
    /// High on measure A only.
    Implementers,
    /// High on measure B only.
    Conceptualizers,
    /// Low on both measures.
    Strugglers,
}

impl fmt::Display for Quadrant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Quadrant::Masters => "masters",
            Quadrant::Implementers => "implementers",
            Quadrant::Conceptualizers => "conceptualizers",
            Quadrant::Strugglers => "strugglers",
        };
        f.write_str(name)
    }
}

/// Places a pair relative to the medians. Values equal to a median count as high.
///
/// | A vs median_a | B vs median_b | Quadrant        |
/// |---------------|---------------|-----------------|
/// | >=            | >=            | masters         |
/// | >=            | <             | implementers    |
/// | <             | >=            | conceptualizers |
/// | <             | <             | strugglers      |
pub fn classify(a: f64, b: f64, median_a: f64, median_b: f64) -> Quadrant {
    match (a >= median_a, b >= median_b) {
        (true, true) => Quadrant::Masters,
        (true, false) => Quadrant::Implementers,
        (false, true) => Quadrant::Conceptualizers,
        (false, false) => Quadrant::Strugglers,
    }
}

/// Number of subjects in each quadrant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuadrantCounts {
    pub masters: usize,
    pub implementers: usize,
    pub conceptualizers: usize,
    pub strugglers: usize,
}

impl QuadrantCounts {
    pub fn record(&mut self, quadrant: Quadrant) {
        match quadrant {
            Quadrant::Masters => self.masters += 1,
            Quadrant::Implementers => self.implementers += 1,
            Quadrant::Conceptualizers => self.conceptualizers += 1,
            Quadrant::Strugglers => self.strugglers += 1,
        }
    }

    pub fn get(&self, quadrant: Quadrant) -> usize {
        match quadrant {
            Quadrant::Masters => self.masters,
            Quadrant::Implementers => self.implementers,
            Quadrant::Conceptualizers => self.conceptualizers,
            Quadrant::Strugglers => self.strugglers,
        }
    }

    pub fn total(&self) -> usize {
        self.masters + self.implementers + self.conceptualizers + self.strugglers
    }
}

impl AddAssign for QuadrantCounts {
    fn add_assign(&mut self, rhs: Self) {
        self.masters += rhs.masters;
        self.implementers += rhs.implementers;
        self.conceptualizers += rhs.conceptualizers;
        self.strugglers += rhs.strugglers;
    }
}

impl Add for QuadrantCounts {
    type Output = Self;

    fn add(mut self, rhs: Self) -> Self {
        self += rhs;
        self
    }
}

impl Sum for QuadrantCounts {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

/// Medians and quadrant counts for one collection of pairs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuadrantSummary {
    pub median_a: Option<f64>,
    pub median_b: Option<f64>,
    pub counts: QuadrantCounts,
}

/// Assigns every pair to a quadrant. Returns an empty list for empty input.
pub fn assign_quadrants(pairs: &[ScorePair]) -> Vec<(&ScorePair, Quadrant)> {
    let Some((median_a, median_b)) = medians(pairs) else {
        return Vec::new();
    };

    pairs
        .iter()
        .map(|p| (p, classify(p.a, p.b, median_a, median_b)))
        .collect()
}

/// Classifies a flat collection of pairs against its own medians.
///
/// Scope labels are ignored; an empty collection yields zero counts and no medians.
pub fn classify_pairs(pairs: &[ScorePair]) -> QuadrantSummary {
    let Some((median_a, median_b)) = medians(pairs) else {
        return QuadrantSummary::default();
    };

    let mut counts = QuadrantCounts::default();
    for p in pairs {
        counts.record(classify(p.a, p.b, median_a, median_b));
    }

    QuadrantSummary {
        median_a: Some(median_a),
        median_b: Some(median_b),
        counts,
    }
}

/// Classifies each scope against that scope's own medians.
pub fn quadrants_by_scope(pairs: &[ScorePair]) -> BTreeMap<String, QuadrantSummary> {
    let mut scopes: BTreeMap<&str, Vec<ScorePair>> = BTreeMap::new();
    for p in pairs {
        scopes.entry(p.scope.as_str()).or_default().push(p.clone());
    }

    scopes
        .into_iter()
        .map(|(scope, members)| (scope.to_string(), classify_pairs(&members)))
        .collect()
}

fn medians(pairs: &[ScorePair]) -> Option<(f64, f64)> {
    if pairs.is_empty() {
        return None;
    }
    let a: Vec<f64> = pairs.iter().map(|p| p.a).collect();
    let b: Vec<f64> = pairs.iter().map(|p| p.b).collect();
    Some((median(&a)?, median(&b)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(scope: &str, subject: &str, a: f64, b: f64) -> ScorePair {
        ScorePair {
            scope: scope.to_string(),
            subject: subject.to_string(),
            a,
            b,
        }
    }

    fn sample() -> Vec<ScorePair> {
        vec![
            pair("quiz-1", "s1", 80.0, 10.0),
            pair("quiz-1", "s2", 90.0, 15.0),
            pair("quiz-1", "s3", 70.0, 12.0),
            pair("quiz-1", "s4", 85.0, 14.0),
        ]
    }

    #[test]
    fn test_classify_boundaries() {
        assert_eq!(classify(5.0, 5.0, 5.0, 5.0), Quadrant::Masters);
        assert_eq!(classify(5.0, 4.9, 5.0, 5.0), Quadrant::Implementers);
        assert_eq!(classify(4.9, 5.0, 5.0, 5.0), Quadrant::Conceptualizers);
        assert_eq!(classify(4.9, 4.9, 5.0, 5.0), Quadrant::Strugglers);
    }

    #[test]
    fn test_classify_pairs_sums_to_input_size() {
        let summary = classify_pairs(&sample());

        assert_eq!(summary.median_a, Some(82.5));
        assert_eq!(summary.median_b, Some(13.0));
        assert_eq!(summary.counts.total(), 4);
        assert_eq!(summary.counts.masters, 2);
        assert_eq!(summary.counts.strugglers, 2);
    }

    #[test]
    fn test_empty_input_gives_zero_counts() {
        let summary = classify_pairs(&[]);

        assert_eq!(summary.counts, QuadrantCounts::default());
        assert_eq!(summary.median_a, None);
        assert!(assign_quadrants(&[]).is_empty());
    }

    #[test]
    fn test_subject_at_both_medians_is_master() {
        let pairs = vec![
            pair("q", "low", 1.0, 1.0),
            pair("q", "mid", 2.0, 2.0),
            pair("q", "high", 3.0, 3.0),
        ];
        let assigned = assign_quadrants(&pairs);

        assert_eq!(assigned[1].0.subject, "mid");
        assert_eq!(assigned[1].1, Quadrant::Masters);
    }

    #[test]
    fn test_single_pair_is_master() {
        let summary = classify_pairs(&[pair("q", "only", 40.0, 3.0)]);
        assert_eq!(summary.counts.masters, 1);
    }

    #[test]
    fn test_scopes_are_classified_independently_and_summed() {
        let mut pairs = sample();
        pairs.push(pair("quiz-2", "s1", 10.0, 90.0));
        pairs.push(pair("quiz-2", "s5", 20.0, 80.0));

        let by_scope = quadrants_by_scope(&pairs);
        assert_eq!(by_scope.len(), 2);
        assert_eq!(by_scope["quiz-2"].counts.total(), 2);
        // quiz-2 medians: a = 15, b = 85
        assert_eq!(by_scope["quiz-2"].counts.conceptualizers, 1);
        assert_eq!(by_scope["quiz-2"].counts.implementers, 1);

        let global: QuadrantCounts = by_scope.values().map(|s| s.counts).sum();
        // s1 appears in both scopes and is counted twice.
        assert_eq!(global.total(), 6);
        assert_eq!(global.get(Quadrant::Masters), 2);
    }

    #[test]
    fn test_quadrant_display() {
        assert_eq!(Quadrant::Conceptualizers.to_string(), "conceptualizers");
    }
}
