//! Pearson correlation between the two measures of a scope.

use std::collections::BTreeMap;
use tracing::debug;

use crate::analyzers::distribution::student_t_two_sided;
use crate::analyzers::types::{CorrelationRecord, ScorePair};
use crate::analyzers::utility::mean;

/// Minimum number of observations for a coefficient to be attempted.
pub const MIN_OBSERVATIONS: usize = 2;

/// Pearson product-moment correlation coefficient.
///
/// Returns `None` for fewer than two points, mismatched lengths, or when either
/// series has zero variance.
pub fn pearson(xs: &[f64], ys: &[f64]) -> Option<f64> {
    if xs.len() != ys.len() || xs.len() < MIN_OBSERVATIONS {
        return None;
    }
    if is_constant(xs) || is_constant(ys) {
        return None;
    }

    let mx = mean(xs);
    let my = mean(ys);

    let mut sxy = 0.0;
    let mut sxx = 0.0;
    let mut syy = 0.0;
    for (x, y) in xs.iter().zip(ys) {
        let dx = x - mx;
        let dy = y - my;
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }

    let den = (sxx * syy).sqrt();
    if den == 0.0 || !den.is_finite() {
        return None;
    }

    Some((sxy / den).clamp(-1.0, 1.0))
}

/// Two-sided significance of `r` over `n` observations, via t with n - 2 degrees of freedom.
///
/// Undefined (`None`) for n <= 2, where the coefficient is forced to ±1.
pub fn correlation_p_value(r: f64, n: usize) -> Option<f64> {
    if n <= MIN_OBSERVATIONS {
        return None;
    }
    if r.abs() >= 1.0 {
        return Some(0.0);
    }

    let df = (n - 2) as f64;
    let t = r * (df / (1.0 - r * r)).sqrt();
    student_t_two_sided(t, df)
}

/// Correlates measure A with measure B over the given pairs, labelled `scope`.
///
/// Returns `None` when fewer than two pairs are available.
pub fn correlate(scope: &str, pairs: &[ScorePair]) -> Option<CorrelationRecord> {
    let count = pairs.len();
    if count < MIN_OBSERVATIONS {
        debug!(scope, count, "Too few observations to correlate, omitting scope");
        return None;
    }

    let a: Vec<f64> = pairs.iter().map(|p| p.a).collect();
    let b: Vec<f64> = pairs.iter().map(|p| p.b).collect();

    let r = pearson(&a, &b);
    if r.is_none() {
        debug!(scope, count, "Zero variance in a measure, coefficient undefined");
    }
    let p = r.and_then(|r| correlation_p_value(r, count));

    Some(CorrelationRecord {
        scope: scope.to_string(),
        count,
        r,
        p,
    })
}

/// Correlates each scope separately, ordered by scope label. Scopes with fewer
/// than two pairs are left out.
pub fn correlate_by_scope(pairs: &[ScorePair]) -> Vec<CorrelationRecord> {
    let mut scopes: BTreeMap<&str, Vec<ScorePair>> = BTreeMap::new();
    for p in pairs {
        scopes.entry(p.scope.as_str()).or_default().push(p.clone());
    }

    scopes
        .iter()
        .filter_map(|(scope, members)| correlate(scope, members))
        .collect()
}

fn is_constant(values: &[f64]) -> bool {
    values.windows(2).all(|w| w[0] == w[1])
}
