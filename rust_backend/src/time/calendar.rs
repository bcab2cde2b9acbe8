//! Calendar period boundaries.

use chrono::{Datelike, Days, Months, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Length of an aggregation period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeriodKind {
    Daily,
    Weekly,
    Monthly,
    Quarterly,
}

impl PeriodKind {
    /// Plural noun used in report headings ("No. of Weeks").
    pub fn unit_label(&self) -> &'static str {
        match self {
            PeriodKind::Daily => "Days",
            PeriodKind::Weekly => "Weeks",
            PeriodKind::Monthly => "Months",
            PeriodKind::Quarterly => "Quarters",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            PeriodKind::Daily => "DAILY",
            PeriodKind::Weekly => "WEEKLY",
            PeriodKind::Monthly => "MONTHLY",
            PeriodKind::Quarterly => "QUARTERLY",
        }
    }
}

impl fmt::Display for PeriodKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PeriodKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "daily" | "day" => Ok(PeriodKind::Daily),
            "weekly" | "week" => Ok(PeriodKind::Weekly),
            "monthly" | "month" => Ok(PeriodKind::Monthly),
            "quarterly" | "quarter" => Ok(PeriodKind::Quarterly),
            _ => Err(format!(
                "Invalid period: {}. Must be 'daily', 'weekly', 'monthly' or 'quarterly'",
                s
            )),
        }
    }
}

/// First day of the period containing `date`. Weeks start on Monday.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use health_export::time::{period_start, PeriodKind};
///
/// let d = NaiveDate::from_ymd_opt(2024, 5, 16).unwrap(); // Thursday
/// assert_eq!(period_start(d, PeriodKind::Weekly), NaiveDate::from_ymd_opt(2024, 5, 13).unwrap());
/// assert_eq!(period_start(d, PeriodKind::Quarterly), NaiveDate::from_ymd_opt(2024, 4, 1).unwrap());
/// ```
pub fn period_start(date: NaiveDate, kind: PeriodKind) -> NaiveDate {
    match kind {
        PeriodKind::Daily => date,
        PeriodKind::Weekly => {
            let back = u64::from(date.weekday().num_days_from_monday());
            date - Days::new(back)
        }
        PeriodKind::Monthly => date.with_day(1).unwrap_or(date),
        PeriodKind::Quarterly => {
            let first_month = (date.month0() / 3) * 3 + 1;
            NaiveDate::from_ymd_opt(date.year(), first_month, 1).unwrap_or(date)
        }
    }
}

/// Start of the period `n` periods after the one containing `date`.
/// `None` if the result falls outside chrono's date range.
pub fn next_period_start(date: NaiveDate, kind: PeriodKind, n: u32) -> Option<NaiveDate> {
    let start = period_start(date, kind);
    match kind {
        PeriodKind::Daily => start.checked_add_days(Days::new(u64::from(n))),
        PeriodKind::Weekly => start.checked_add_days(Days::new(7 * u64::from(n))),
        PeriodKind::Monthly => start.checked_add_months(Months::new(n)),
        PeriodKind::Quarterly => start.checked_add_months(Months::new(3 * n)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_week_start_is_monday() {
        assert_eq!(period_start(date(2024, 1, 7), PeriodKind::Weekly), date(2024, 1, 1));
        assert_eq!(period_start(date(2024, 1, 1), PeriodKind::Weekly), date(2024, 1, 1));
        // Week spanning a year boundary
        assert_eq!(period_start(date(2025, 1, 2), PeriodKind::Weekly), date(2024, 12, 30));
    }

    #[test]
    fn test_month_and_quarter_start() {
        assert_eq!(period_start(date(2024, 2, 29), PeriodKind::Monthly), date(2024, 2, 1));
        assert_eq!(period_start(date(2024, 12, 31), PeriodKind::Quarterly), date(2024, 10, 1));
        assert_eq!(period_start(date(2024, 3, 31), PeriodKind::Quarterly), date(2024, 1, 1));
        assert_eq!(period_start(date(2024, 3, 31), PeriodKind::Daily), date(2024, 3, 31));
    }

    #[test]
    fn test_next_period_start() {
        let d = date(2024, 1, 31);
        assert_eq!(next_period_start(d, PeriodKind::Daily, 1), Some(date(2024, 2, 1)));
        assert_eq!(next_period_start(d, PeriodKind::Weekly, 1), Some(date(2024, 2, 5)));
        assert_eq!(next_period_start(d, PeriodKind::Monthly, 1), Some(date(2024, 2, 1)));
        assert_eq!(next_period_start(d, PeriodKind::Quarterly, 2), Some(date(2024, 7, 1)));
        assert_eq!(next_period_start(d, PeriodKind::Monthly, 0), Some(date(2024, 1, 1)));
    }

    #[test]
    fn test_period_kind_parsing() {
        assert_eq!("Weekly".parse::<PeriodKind>(), Ok(PeriodKind::Weekly));
        assert_eq!("quarter".parse::<PeriodKind>(), Ok(PeriodKind::Quarterly));
        assert!("hourly".parse::<PeriodKind>().is_err());
        assert_eq!(PeriodKind::Monthly.to_string(), "MONTHLY");
    }
}
