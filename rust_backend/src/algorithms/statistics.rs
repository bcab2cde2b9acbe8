//! Descriptive statistics over metric series.
//!
//! Percentiles use nearest-rank selection: the result is always one of the
//! observed values, never an interpolation between two of them.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Percentiles always reported by [`SeriesStats::compute`].
pub const DEFAULT_PERCENTILES: [u32; 7] = [5, 10, 25, 50, 75, 90, 95];

/// Round to two decimal places, halves away from zero.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub fn sum(values: &[f64]) -> f64 {
    values.iter().sum()
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(sum(values) / values.len() as f64)
}

/// Population standard deviation.
pub fn std_dev(values: &[f64]) -> Option<f64> {
    let avg = mean(values)?;
    let variance = values
        .iter()
        .map(|v| {
            let diff = v - avg;
            diff * diff
        })
        .sum::<f64>()
        / values.len() as f64;
    Some(variance.sqrt())
}

fn sorted_copy(values: &[f64]) -> Vec<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    sorted
}

/// Index picked by nearest-rank selection: `(n - 1) * p / 100`, ties rounded
/// to the even index.
fn nearest_rank_index(len: usize, percentile: f64) -> usize {
    let position = (len - 1) as f64 * percentile / 100.0;
    (position.round_ties_even() as usize).min(len - 1)
}

/// Nearest-rank percentile of unsorted values, `percentile` in `[0, 100]`.
///
/// # Examples
///
/// ```
/// use health_export::algorithms::statistics::nearest_rank_percentile;
///
/// assert_eq!(nearest_rank_percentile(&[60.0, 62.0, 61.0, 90.0, 59.0], 50.0), Some(61.0));
/// // Even count: picks an observed value, not the midpoint
/// assert_eq!(nearest_rank_percentile(&[1.0, 2.0, 3.0, 4.0], 50.0), Some(3.0));
/// assert_eq!(nearest_rank_percentile(&[], 50.0), None);
/// ```
pub fn nearest_rank_percentile(values: &[f64], percentile: f64) -> Option<f64> {
    if values.is_empty() || !(0.0..=100.0).contains(&percentile) {
        return None;
    }
    let sorted = sorted_copy(values);
    Some(sorted[nearest_rank_index(sorted.len(), percentile)])
}

pub fn median(values: &[f64]) -> Option<f64> {
    nearest_rank_percentile(values, 50.0)
}

/// `mean ± n·σ` interval.
pub fn nsigma_interval(values: &[f64], nsigma: f64) -> Option<(f64, f64)> {
    let avg = mean(values)?;
    let sd = std_dev(values)?;
    Some((avg - nsigma * sd, avg + nsigma * sd))
}

/// Summary of a single metric series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesStats {
    pub count: usize,
    pub average: f64,
    pub median: f64,
    pub std_dev: f64,
    /// Biased sample skewness
    pub skew: f64,
    /// Biased excess kurtosis (0 for a normal distribution)
    pub kurtosis: f64,
    pub min: f64,
    pub max: f64,
    pub percentiles: BTreeMap<u32, f64>,
    pub middle_50: (f64, f64),
    pub middle_80: (f64, f64),
    pub middle_90: (f64, f64),
}

impl SeriesStats {
    /// Compute statistics; `extra_percentiles` outside `(0, 100)` are ignored.
    pub fn compute(values: &[f64], extra_percentiles: &[u32]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }

        let sorted = sorted_copy(values);
        let count = sorted.len();
        let average = sum(&sorted) / count as f64;
        let std_dev = std_dev(&sorted)?;

        let central_moment = |k: i32| -> f64 {
            sorted.iter().map(|v| (v - average).powi(k)).sum::<f64>() / count as f64
        };
        let m2 = central_moment(2);
        let (skew, kurtosis) = if m2 > 0.0 {
            (
                central_moment(3) / m2.powf(1.5),
                central_moment(4) / (m2 * m2) - 3.0,
            )
        } else {
            (0.0, -3.0)
        };

        let percentiles: BTreeMap<u32, f64> = DEFAULT_PERCENTILES
            .iter()
            .chain(extra_percentiles.iter().filter(|p| **p > 0 && **p < 100))
            .map(|p| (*p, sorted[nearest_rank_index(count, f64::from(*p))]))
            .collect();

        Some(Self {
            count,
            average,
            median: percentiles[&50],
            std_dev,
            skew,
            kurtosis,
            min: sorted[0],
            max: sorted[count - 1],
            middle_50: (percentiles[&25], percentiles[&75]),
            middle_80: (percentiles[&10], percentiles[&90]),
            middle_90: (percentiles[&5], percentiles[&95]),
            percentiles,
        })
    }
}
