//! Pivot daily series into a date-indexed table.

use std::collections::BTreeSet;

use crate::core::domain::{AggregationPolicy, DailyTable, MetricCatalog};
use crate::preprocessing::aggregator::DailySeries;

/// Build one row per date that has any value.
///
/// Summed metrics are filled with `0.0` on every row where they have no
/// value: a day without steps recorded counts as zero steps. Averaged and
/// median metrics stay absent.
pub fn build_daily_table(series: &DailySeries, catalog: &MetricCatalog) -> DailyTable {
    let mut table = DailyTable::new();

    for (metric, days) in series.iter() {
        let name = catalog.name(metric);
        for (date, value) in days {
            table.insert(*date, name, *value);
        }
    }

    let dates: BTreeSet<_> = table.dates().collect();
    for id in catalog.ids() {
        if catalog.policy(id) != AggregationPolicy::Sum {
            continue;
        }
        let name = catalog.name(id);
        for date in &dates {
            table
                .row_mut(*date)
                .entry(name.to_string())
                .or_insert(0.0);
        }
    }

    table
}
