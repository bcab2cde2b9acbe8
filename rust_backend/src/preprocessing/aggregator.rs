//! Two-stage reduction of accumulated readings: per hour, then per day.

use chrono::NaiveDate;
use std::collections::BTreeMap;

use crate::algorithms::statistics::{mean, median, round2, sum};
use crate::core::domain::{AggregationPolicy, MetricCatalog, MetricId};
use crate::preprocessing::classifier::Classification;

/// Raw readings grouped as `metric -> date -> hour -> values`.
#[derive(Debug, Clone, Default)]
pub struct Accumulation {
    values: BTreeMap<MetricId, BTreeMap<NaiveDate, BTreeMap<u32, Vec<f64>>>>,
    len: usize,
}

impl Accumulation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, classification: Classification) {
        self.values
            .entry(classification.metric)
            .or_default()
            .entry(classification.date)
            .or_default()
            .entry(classification.hour)
            .or_default()
            .push(classification.value);
        self.len += 1;
    }

    /// Number of readings accumulated.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// Reduce `values` by `policy`. Empty input gives `None` for every policy.
pub fn reduce(policy: AggregationPolicy, values: &[f64]) -> Option<f64> {
    match policy {
        AggregationPolicy::Sum if values.is_empty() => None,
        AggregationPolicy::Sum => Some(sum(values)),
        AggregationPolicy::Average => mean(values),
        AggregationPolicy::Median => median(values),
    }
}

/// One scalar per metric per day: `metric -> date -> value`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DailySeries {
    values: BTreeMap<MetricId, BTreeMap<NaiveDate, f64>>,
}

impl DailySeries {
    pub fn get(&self, metric: MetricId, date: NaiveDate) -> Option<f64> {
        self.values.get(&metric)?.get(&date).copied()
    }

    pub fn metric(&self, metric: MetricId) -> Option<&BTreeMap<NaiveDate, f64>> {
        self.values.get(&metric)
    }

    pub fn iter(&self) -> impl Iterator<Item = (MetricId, &BTreeMap<NaiveDate, f64>)> {
        self.values.iter().map(|(id, days)| (*id, days))
    }

    /// Total number of (metric, date) entries.
    pub fn len(&self) -> usize {
        self.values.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Collapse an accumulation into daily values.
///
/// Each hour's readings are reduced by the metric's policy, then the day's
/// hourly results are reduced by the same policy. Only the daily value is
/// rounded, to two decimals.
pub fn aggregate(accumulation: Accumulation, catalog: &MetricCatalog) -> DailySeries {
    let mut series = DailySeries::default();

    for (metric, days) in accumulation.values {
        let policy = catalog.policy(metric);
        let daily: BTreeMap<NaiveDate, f64> = days
            .into_iter()
            .filter_map(|(date, hours)| {
                let hourly: Vec<f64> = hours
                    .values()
                    .filter_map(|readings| reduce(policy, readings))
                    .collect();
                reduce(policy, &hourly).map(|value| (date, round2(value)))
            })
            .collect();

        if !daily.is_empty() {
            series.values.insert(metric, daily);
        }
    }

    series
}
