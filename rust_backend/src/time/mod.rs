//! Time handling for health exports.
//!
//! - [`timezone`]: record timestamp parsing and the piecewise timezone history
//!   that places each reading on its true local calendar date
//! - [`calendar`]: period boundaries (week, month, quarter) used by the
//!   period aggregation and lagged correlation code

pub mod calendar;
pub mod timezone;

#[cfg(test)]
mod timezone_tests;

pub use calendar::{next_period_start, period_start, PeriodKind};
pub use timezone::{
    parse_record_timestamp, parse_utc_offset, ReportingWindow, TimezoneHistory, TimezoneMode,
    TimezoneRule, RECORD_TIMESTAMP_FORMAT,
};
