//! Cross-metric correlation discovery.
//!
//! Every pair of metrics in a table is compared, optionally with a lag of one
//! or more periods (does today's step count relate to tomorrow's resting heart
//! rate?). Pairs are reported only when the correlation is strong on at least
//! one coefficient and not negligible on any.

use chrono::NaiveDate;
use log::debug;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use crate::core::domain::MetricTable;
use crate::time::calendar::{next_period_start, PeriodKind};

/// Correlation coefficient flavour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorrelationKind {
    Pearson,
    Spearman,
    Kendall,
}

impl CorrelationKind {
    pub fn all() -> [CorrelationKind; 3] {
        [
            CorrelationKind::Pearson,
            CorrelationKind::Spearman,
            CorrelationKind::Kendall,
        ]
    }
}

/// Pearson product-moment correlation. `None` for mismatched or too short
/// inputs, or when either series is constant.
pub fn pearson(x: &[f64], y: &[f64]) -> Option<f64> {
    if x.len() != y.len() || x.len() < 2 {
        return None;
    }
    let n = x.len() as f64;
    let mean_x = x.iter().sum::<f64>() / n;
    let mean_y = y.iter().sum::<f64>() / n;

    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (a, b) in x.iter().zip(y) {
        let dx = a - mean_x;
        let dy = b - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    if var_x == 0.0 || var_y == 0.0 {
        return None;
    }
    Some((cov / (var_x.sqrt() * var_y.sqrt())).clamp(-1.0, 1.0))
}

/// 1-based ranks, ties share the average of their ranks.
fn average_ranks(values: &[f64]) -> Vec<f64> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|a, b| {
        values[*a]
            .partial_cmp(&values[*b])
            .unwrap_or(Ordering::Equal)
    });

    let mut ranks = vec![0.0; values.len()];
    let mut i = 0;
    while i < order.len() {
        let mut j = i;
        while j + 1 < order.len() && values[order[j + 1]] == values[order[i]] {
            j += 1;
        }
        let rank = (i + j) as f64 / 2.0 + 1.0;
        for idx in &order[i..=j] {
            ranks[*idx] = rank;
        }
        i = j + 1;
    }
    ranks
}

/// Spearman rank correlation.
pub fn spearman(x: &[f64], y: &[f64]) -> Option<f64> {
    if x.len() != y.len() {
        return None;
    }
    pearson(&average_ranks(x), &average_ranks(y))
}

/// Kendall tau-b, which corrects for ties in either series.
pub fn kendall_tau_b(x: &[f64], y: &[f64]) -> Option<f64> {
    if x.len() != y.len() || x.len() < 2 {
        return None;
    }

    let n = x.len();
    let mut concordant = 0i64;
    let mut discordant = 0i64;
    let mut ties_x = 0i64;
    let mut ties_y = 0i64;

    for i in 0..n {
        for j in (i + 1)..n {
            let dx = x[i] - x[j];
            let dy = y[i] - y[j];
            if dx == 0.0 {
                ties_x += 1;
            }
            if dy == 0.0 {
                ties_y += 1;
            }
            if dx == 0.0 || dy == 0.0 {
                continue;
            }
            if (dx > 0.0) == (dy > 0.0) {
                concordant += 1;
            } else {
                discordant += 1;
            }
        }
    }

    let pairs = (n * (n - 1) / 2) as i64;
    let denominator = (((pairs - ties_x) * (pairs - ties_y)) as f64).sqrt();
    if denominator == 0.0 {
        return None;
    }
    Some((concordant - discordant) as f64 / denominator)
}

/// All three coefficients, or `None` if any is undefined.
pub fn correlations(x: &[f64], y: &[f64]) -> Option<BTreeMap<CorrelationKind, f64>> {
    let mut result = BTreeMap::new();
    result.insert(CorrelationKind::Pearson, pearson(x, y)?);
    result.insert(CorrelationKind::Spearman, spearman(x, y)?);
    result.insert(CorrelationKind::Kendall, kendall_tau_b(x, y)?);
    Some(result)
}

/// Thresholds and exclusions for [`discover_correlations`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorrelationParams {
    /// A pair is interesting if any coefficient reaches its cutoff.
    pub cutoffs: BTreeMap<CorrelationKind, f64>,
    /// Every coefficient must be at least this strong.
    pub min_acceptable: f64,
    pub min_datapoints: usize,
    /// Metrics left out of the comparison entirely.
    #[serde(default)]
    pub ignored_metrics: Vec<String>,
    /// Pairs known to move together by construction (energy burned vs steps).
    #[serde(default)]
    pub correlated_pairs: Vec<(String, String)>,
}

impl Default for CorrelationParams {
    fn default() -> Self {
        let cutoffs = BTreeMap::from([
            (CorrelationKind::Pearson, 0.5),
            (CorrelationKind::Spearman, 0.5),
            (CorrelationKind::Kendall, 0.4),
        ]);
        Self {
            cutoffs,
            min_acceptable: 0.2,
            min_datapoints: 30,
            ignored_metrics: Vec::new(),
            correlated_pairs: Vec::new(),
        }
    }
}

impl CorrelationParams {
    fn is_ignored(&self, metric: &str) -> bool {
        self.ignored_metrics.iter().any(|m| m == metric)
    }

    fn is_known_pair(&self, a: &str, b: &str) -> bool {
        self.correlated_pairs
            .iter()
            .any(|(x, y)| (x == a && y == b) || (x == b && y == a))
    }

    fn accepts(&self, coefficients: &BTreeMap<CorrelationKind, f64>) -> bool {
        let any_above_cutoff = self.cutoffs.iter().any(|(kind, cutoff)| {
            coefficients
                .get(kind)
                .map(|c| c.abs() >= *cutoff)
                .unwrap_or(false)
        });
        let all_acceptable = coefficients
            .values()
            .all(|c| c.abs() >= self.min_acceptable);
        any_above_cutoff && all_acceptable
    }
}

/// A correlated metric pair. `metric_b` is read `delta` periods after `metric_a`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricCorrelation {
    pub metric_a: String,
    pub metric_b: String,
    pub period: PeriodKind,
    pub delta: u32,
    pub datapoints: usize,
    pub coefficients: BTreeMap<CorrelationKind, f64>,
}

/// Pair `a[d]` with `b[d + delta periods]` for every date where both exist.
pub fn align_lagged(
    a: &BTreeMap<NaiveDate, f64>,
    b: &BTreeMap<NaiveDate, f64>,
    period: PeriodKind,
    delta: u32,
) -> (Vec<f64>, Vec<f64>) {
    let mut xs = Vec::new();
    let mut ys = Vec::new();
    for (date, value) in a {
        let Some(target) = next_period_start(*date, period, delta) else {
            continue;
        };
        if let Some(other) = b.get(&target) {
            xs.push(*value);
            ys.push(*other);
        }
    }
    (xs, ys)
}

/// Compare every metric pair of `table` for lags `0..=max_delta` periods.
///
/// With no lag each unordered pair is compared once; with a lag both
/// directions are compared. Results are ordered by lag, then metric names.
pub fn discover_correlations(
    table: &MetricTable,
    period: PeriodKind,
    max_delta: u32,
    params: &CorrelationParams,
) -> Vec<MetricCorrelation> {
    let metrics: Vec<String> = table
        .metric_names()
        .into_iter()
        .filter(|m| !params.is_ignored(m))
        .collect();
    let series: BTreeMap<&str, BTreeMap<NaiveDate, f64>> = metrics
        .iter()
        .map(|m| (m.as_str(), table.series(m)))
        .collect();

    let mut found = Vec::new();
    for delta in 0..=max_delta {
        let mut seen: BTreeSet<(&str, &str)> = BTreeSet::new();
        for a in &metrics {
            for b in &metrics {
                if a == b || params.is_known_pair(a, b) {
                    continue;
                }
                if delta == 0 {
                    let key = if a < b { (a.as_str(), b.as_str()) } else { (b.as_str(), a.as_str()) };
                    if !seen.insert(key) {
                        continue;
                    }
                }

                let (xs, ys) = align_lagged(&series[a.as_str()], &series[b.as_str()], period, delta);
                if xs.len() < params.min_datapoints {
                    continue;
                }
                let Some(coefficients) = correlations(&xs, &ys) else {
                    continue;
                };
                if !params.accepts(&coefficients) {
                    continue;
                }

                debug!(
                    "{} vs {} (+{} {}): {:?}",
                    a,
                    b,
                    delta,
                    period.unit_label(),
                    coefficients
                );
                found.push(MetricCorrelation {
                    metric_a: a.clone(),
                    metric_b: b.clone(),
                    period,
                    delta,
                    datapoints: xs.len(),
                    coefficients,
                });
            }
        }
    }

    found
}
