use std::collections::BTreeMap;

use crate::algorithms::statistics::{mean, round2};
use crate::core::domain::MetricTable;
use crate::time::calendar::{period_start, PeriodKind};

/// Average daily values over weeks, months or quarters.
///
/// Rows are keyed by the first day of each period. A metric's value is the
/// mean of the days on which it has a value, rounded to two decimals; days
/// where it is absent do not count towards the mean.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use health_export::core::domain::MetricTable;
/// use health_export::time::PeriodKind;
/// use health_export::transformations::aggregate_by_period;
///
/// let mut daily = MetricTable::new();
/// daily.insert(NaiveDate::from_ymd_opt(2024, 5, 13).unwrap(), "StepCount", 1000.0);
/// daily.insert(NaiveDate::from_ymd_opt(2024, 5, 15).unwrap(), "StepCount", 2001.0);
///
/// let weekly = aggregate_by_period(&daily, PeriodKind::Weekly).unwrap();
/// assert_eq!(weekly.get(NaiveDate::from_ymd_opt(2024, 5, 13).unwrap(), "StepCount"), Some(1500.5));
/// ```
pub fn aggregate_by_period(daily: &MetricTable, kind: PeriodKind) -> Result<MetricTable, String> {
    if kind == PeriodKind::Daily {
        return Err("Daily tables are already aggregated by day".to_string());
    }

    let mut grouped: BTreeMap<_, BTreeMap<&str, Vec<f64>>> = BTreeMap::new();
    for (date, row) in daily.rows() {
        let bucket = grouped.entry(period_start(*date, kind)).or_default();
        for (metric, value) in row {
            bucket.entry(metric.as_str()).or_default().push(*value);
        }
    }

    let mut table = MetricTable::new();
    for (start, metrics) in grouped {
        for (metric, values) in metrics {
            if let Some(avg) = mean(&values) {
                table.insert(start, metric, round2(avg));
            }
        }
    }

    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn daily_table() -> MetricTable {
        let mut table = MetricTable::new();
        // Sunday 2024-03-31 closes a week, a month and a quarter
        table.insert(date(2024, 3, 29), "StepCount", 100.0);
        table.insert(date(2024, 3, 31), "StepCount", 200.0);
        table.insert(date(2024, 3, 31), "HeartRate", 60.0);
        table.insert(date(2024, 4, 1), "StepCount", 400.0);
        table.insert(date(2024, 4, 2), "HeartRate", 65.0);
        table.insert(date(2024, 4, 3), "HeartRate", 66.0);
        table
    }

    #[test]
    fn test_weekly_groups_by_monday() {
        let weekly = aggregate_by_period(&daily_table(), PeriodKind::Weekly).unwrap();
        assert_eq!(weekly.dates().collect::<Vec<_>>(), vec![date(2024, 3, 25), date(2024, 4, 1)]);
        assert_eq!(weekly.get(date(2024, 3, 25), "StepCount"), Some(150.0));
        assert_eq!(weekly.get(date(2024, 4, 1), "StepCount"), Some(400.0));
        assert_eq!(weekly.get(date(2024, 4, 1), "HeartRate"), Some(65.5));
    }

    #[test]
    fn test_monthly_and_quarterly() {
        let table = daily_table();
        let monthly = aggregate_by_period(&table, PeriodKind::Monthly).unwrap();
        assert_eq!(monthly.get(date(2024, 3, 1), "HeartRate"), Some(60.0));
        assert_eq!(monthly.get(date(2024, 4, 1), "HeartRate"), Some(65.5));

        let quarterly = aggregate_by_period(&table, PeriodKind::Quarterly).unwrap();
        assert_eq!(quarterly.len(), 2);
        assert_eq!(quarterly.get(date(2024, 1, 1), "StepCount"), Some(150.0));
        assert_eq!(quarterly.get(date(2024, 4, 1), "HeartRate"), Some(65.5));
    }

    #[test]
    fn test_absent_days_do_not_dilute_mean() {
        let mut table = MetricTable::new();
        table.insert(date(2024, 1, 1), "BodyMass", 70.0);
        table.insert(date(2024, 1, 2), "StepCount", 10.0);
        table.insert(date(2024, 1, 3), "BodyMass", 71.0);
        let weekly = aggregate_by_period(&table, PeriodKind::Weekly).unwrap();
        assert_eq!(weekly.get(date(2024, 1, 1), "BodyMass"), Some(70.5));
    }

    #[test]
    fn test_mean_is_rounded() {
        let mut table = MetricTable::new();
        for (day, v) in [(1, 1.0), (2, 1.0), (3, 2.0)] {
            table.insert(date(2024, 1, day), "WalkingSpeed", v);
        }
        let weekly = aggregate_by_period(&table, PeriodKind::Weekly).unwrap();
        assert_eq!(weekly.get(date(2024, 1, 1), "WalkingSpeed"), Some(1.33));
    }

    #[test]
    fn test_daily_is_rejected() {
        assert!(aggregate_by_period(&daily_table(), PeriodKind::Daily).is_err());
        assert!(aggregate_by_period(&MetricTable::new(), PeriodKind::Monthly)
            .unwrap()
            .is_empty());
    }
}
