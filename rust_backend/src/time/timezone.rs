//! Timezone resolution for record timestamps.
//!
//! Exports stamp every reading with the offset of the device at export time,
//! not the offset in effect where the reading was taken. A [`TimezoneHistory`]
//! describes where the wearer actually was, as a piecewise-constant list of
//! UTC offsets, and re-places each instant on its true local date and hour.
//!
//! Windows are inclusive on both ends. Two contiguous rules share a boundary
//! date; an instant on that date is attributed to the earlier rule whenever the
//! earlier rule's offset puts it there.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};

/// `startDate`/`endDate` attribute format, e.g. `2024-03-01 08:15:00 -0800`.
pub const RECORD_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S %z";

/// Parse a record timestamp, keeping its embedded offset.
pub fn parse_record_timestamp(value: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_str(value.trim(), RECORD_TIMESTAMP_FORMAT).ok()
}

/// Parse a UTC offset written as `+HH:MM`, `-HH:MM`, `+HHMM` or `-HHMM`.
///
/// # Examples
///
/// ```
/// use health_export::time::parse_utc_offset;
///
/// assert_eq!(parse_utc_offset("+05:30").unwrap().local_minus_utc(), 19_800);
/// assert_eq!(parse_utc_offset("-0800").unwrap().local_minus_utc(), -28_800);
/// assert!(parse_utc_offset("8").is_err());
/// ```
pub fn parse_utc_offset(value: &str) -> ConfigResult<FixedOffset> {
    let invalid = || ConfigError::InvalidUtcOffset(value.to_string());
    let trimmed = value.trim();

    let (sign, rest) = match trimmed.chars().next() {
        Some('+') => (1, &trimmed[1..]),
        Some('-') => (-1, &trimmed[1..]),
        _ => return Err(invalid()),
    };
    let digits: String = rest.chars().filter(|c| *c != ':').collect();
    if digits.len() != 4 || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid());
    }
    let hours: i32 = digits[..2].parse().map_err(|_| invalid())?;
    let minutes: i32 = digits[2..].parse().map_err(|_| invalid())?;
    if hours > 23 || minutes > 59 {
        return Err(invalid());
    }

    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60)).ok_or_else(invalid)
}

/// How record timestamps are mapped to local dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimezoneMode {
    /// Use the timezone history to find where the reading was taken.
    #[default]
    DataTimezone,
    /// Use the offset embedded in the timestamp (the export device's zone).
    ExportTimezone,
}

impl TimezoneMode {
    pub fn name(&self) -> &'static str {
        match self {
            TimezoneMode::DataTimezone => "DATA_TIMEZONE",
            TimezoneMode::ExportTimezone => "EXPORT_TIMEZONE",
        }
    }
}

/// A span of dates during which a single UTC offset was in effect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimezoneRule {
    pub label: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub offset: FixedOffset,
}

impl TimezoneRule {
    pub fn new(label: &str, start: NaiveDate, end: NaiveDate, offset: FixedOffset) -> Self {
        Self {
            label: label.to_string(),
            start,
            end,
            offset,
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// Ordered, validated list of timezone rules.
#[derive(Debug, Clone, Default)]
pub struct TimezoneHistory {
    rules: Vec<TimezoneRule>,
}

impl TimezoneHistory {
    /// Build a history without validating it. Call [`validate`](Self::validate)
    /// before use; the pipeline does so when it is constructed.
    pub fn new(rules: Vec<TimezoneRule>) -> Self {
        Self { rules }
    }

    /// Check that every rule ends after it starts and that rules are sorted and
    /// non-overlapping. Gaps between rules are allowed.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.rules.is_empty() {
            return Err(ConfigError::EmptyTimezoneHistory);
        }

        let mut previous_end: Option<NaiveDate> = None;
        for (index, rule) in self.rules.iter().enumerate() {
            if rule.end <= rule.start {
                return Err(ConfigError::InvertedTimezoneRule {
                    index,
                    label: rule.label.clone(),
                    start: rule.start,
                    end: rule.end,
                });
            }
            if let Some(previous_end) = previous_end {
                if rule.start < previous_end {
                    return Err(ConfigError::OverlappingTimezoneRules {
                        index,
                        label: rule.label.clone(),
                        start: rule.start,
                        previous_end,
                    });
                }
            }
            previous_end = Some(rule.end);
        }

        Ok(())
    }

    pub fn rules(&self) -> &[TimezoneRule] {
        &self.rules
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// First date covered by the history.
    pub fn first_date(&self) -> Option<NaiveDate> {
        self.rules.first().map(|rule| rule.start)
    }

    /// Re-place an instant on its true local date and time.
    ///
    /// Each rule's offset is tried in order. An instant whose local date under
    /// the first rule predates the history fails immediately; otherwise the
    /// first rule whose end date is on or after the candidate date decides, and
    /// the instant resolves only if that rule's window contains the candidate.
    /// `None` means the instant predates the history, falls in a gap, or comes
    /// after the last rule.
    pub fn resolve(&self, instant: &DateTime<FixedOffset>) -> Option<NaiveDateTime> {
        let first_date = self.first_date()?;

        for (index, rule) in self.rules.iter().enumerate() {
            let local = instant.with_timezone(&rule.offset).naive_local();
            let date = local.date();
            if index == 0 && date < first_date {
                return None;
            }
            if date <= rule.end {
                return rule.contains(date).then_some(local);
            }
        }

        None
    }

    /// Local date and time of an instant under the given mode.
    pub fn localize(
        &self,
        instant: &DateTime<FixedOffset>,
        mode: TimezoneMode,
    ) -> Option<NaiveDateTime> {
        match mode {
            TimezoneMode::DataTimezone => self.resolve(instant),
            TimezoneMode::ExportTimezone => Some(instant.naive_local()),
        }
    }
}

/// Reporting window: inclusive start date, exclusive end date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportingWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl ReportingWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> ConfigResult<Self> {
        let window = Self { start, end };
        window.validate()?;
        Ok(window)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.end <= self.start {
            return Err(ConfigError::InvalidWindow {
                start: self.start,
                end: self.end,
            });
        }
        Ok(())
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date < self.end
    }

    /// Number of days covered by the window.
    pub fn num_days(&self) -> i64 {
        (self.end - self.start).num_days()
    }
}
