use chrono::NaiveDate;

use crate::core::domain::MetricTable;

/// Keep rows with `start <= date < end`.
pub fn filter_by_date_range(
    table: &MetricTable,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<MetricTable, String> {
    if end <= start {
        return Err(format!(
            "Invalid date range: end {} must be after start {}",
            end, start
        ));
    }

    let mut filtered = MetricTable::new();
    for (date, row) in table.rows() {
        if *date >= start && *date < end {
            for (metric, value) in row {
                filtered.insert(*date, metric, *value);
            }
        }
    }
    Ok(filtered)
}

/// Keep only the named metrics; rows left without any value are dropped.
pub fn select_metrics(table: &MetricTable, metrics: &[&str]) -> MetricTable {
    let mut selected = MetricTable::new();
    for (date, row) in table.rows() {
        for (metric, value) in row {
            if metrics.contains(&metric.as_str()) {
                selected.insert(*date, metric, *value);
            }
        }
    }
    selected
}
