//! Per-record classification.
//!
//! A [`RecordClassifier`] decides, for one raw record, whether it contributes
//! to a metric and if so on which local date and hour. Every other outcome is
//! a [`Rejection`] that the pipeline counts and skips.

use chrono::{NaiveDate, Timelike};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

use crate::config::ExtractionConfig;
use crate::core::domain::{MetricCatalog, MetricId, RawRecord};
use crate::error::ConfigResult;
use crate::time::timezone::{
    parse_record_timestamp, ReportingWindow, TimezoneHistory, TimezoneMode,
};

/// Why a record was considered malformed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MalformedReason {
    MissingType,
    MissingUnit,
    MissingValue,
    MissingStartDate,
    MissingEndDate,
    InvalidEndDate,
    InvalidValue,
}

/// Outcome of a record that does not contribute to any metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rejection {
    /// A required attribute is absent or unparsable.
    Malformed(MalformedReason),
    /// The timezone history does not cover the record's end instant.
    Unresolvable,
    /// Resolved to a local date outside the reporting window.
    OutOfRange,
    /// Dropped by the source-device exclusion rule.
    ExcludedSource,
    /// No configured metric has this type and unit.
    Unmatched,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::Malformed(reason) => write!(f, "malformed record ({:?})", reason),
            Rejection::Unresolvable => f.write_str("unresolvable timestamp"),
            Rejection::OutOfRange => f.write_str("outside reporting window"),
            Rejection::ExcludedSource => f.write_str("excluded source device"),
            Rejection::Unmatched => f.write_str("no matching metric"),
        }
    }
}

/// A record accepted for aggregation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Classification {
    pub metric: MetricId,
    pub date: NaiveDate,
    pub hour: u32,
    pub value: f64,
}

/// Drop records of some metrics when the source name contains a marker.
#[derive(Debug, Clone, Default)]
pub struct ExclusionRule {
    source_substring: String,
    wire_types: HashSet<String>,
}

impl ExclusionRule {
    pub fn new(source_substring: &str, wire_types: impl IntoIterator<Item = String>) -> Self {
        Self {
            source_substring: source_substring.to_string(),
            wire_types: wire_types.into_iter().collect(),
        }
    }

    /// An empty substring disables the rule.
    pub fn excludes(&self, type_name: &str, source_name: Option<&str>) -> bool {
        if self.source_substring.is_empty() || !self.wire_types.contains(type_name) {
            return false;
        }
        source_name.is_some_and(|source| source.contains(&self.source_substring))
    }
}

/// Parse a numeric attribute with a strict literal grammar:
/// `[+-]digits[.digits][(e|E)[+-]digits]`, finite only.
///
/// # Examples
///
/// ```
/// use health_export::preprocessing::classifier::parse_numeric_literal;
///
/// assert_eq!(parse_numeric_literal("72"), Some(72.0));
/// assert_eq!(parse_numeric_literal(" -0.5e2 "), Some(-50.0));
/// assert_eq!(parse_numeric_literal("1+1"), None);
/// assert_eq!(parse_numeric_literal("nan"), None);
/// ```
pub fn parse_numeric_literal(text: &str) -> Option<f64> {
    fn all_digits(s: &str) -> bool {
        !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
    }

    let literal = text.trim();
    let unsigned = literal
        .strip_prefix(&['+', '-'][..])
        .unwrap_or(literal);

    let (mantissa, exponent) = match unsigned.find(&['e', 'E'][..]) {
        Some(pos) => (&unsigned[..pos], Some(&unsigned[pos + 1..])),
        None => (unsigned, None),
    };

    let mantissa_ok = match mantissa.split_once('.') {
        Some((int_part, frac_part)) => all_digits(int_part) && all_digits(frac_part),
        None => all_digits(mantissa),
    };
    let exponent_ok = exponent.map_or(true, |exp| {
        all_digits(exp.strip_prefix(&['+', '-'][..]).unwrap_or(exp))
    });
    if !mantissa_ok || !exponent_ok {
        return None;
    }

    literal.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Classifies raw records against a fixed configuration.
#[derive(Debug, Clone)]
pub struct RecordClassifier {
    catalog: MetricCatalog,
    history: TimezoneHistory,
    mode: TimezoneMode,
    window: ReportingWindow,
    exclusion: ExclusionRule,
}

impl RecordClassifier {
    /// Assemble a classifier from parts that have already been validated.
    pub fn new(
        catalog: MetricCatalog,
        history: TimezoneHistory,
        mode: TimezoneMode,
        window: ReportingWindow,
        exclusion: ExclusionRule,
    ) -> Self {
        Self {
            catalog,
            history,
            mode,
            window,
            exclusion,
        }
    }

    /// Validate `config` and build a classifier from it.
    pub fn from_config(config: &ExtractionConfig) -> ConfigResult<Self> {
        config.validate()?;

        let catalog = config.catalog()?;
        let history = if config.timezones.is_empty() {
            TimezoneHistory::default()
        } else {
            config.timezone_history()?
        };
        let exclusion = ExclusionRule::new(
            &config.exclusion.source_substring,
            config
                .exclusion
                .metrics
                .iter()
                .map(|name| catalog.wire_type(name)),
        );

        Ok(Self::new(
            catalog,
            history,
            config.timezone_mode,
            config.window,
            exclusion,
        ))
    }

    pub fn catalog(&self) -> &MetricCatalog {
        &self.catalog
    }

    pub fn window(&self) -> &ReportingWindow {
        &self.window
    }

    pub fn mode(&self) -> TimezoneMode {
        self.mode
    }

    pub fn classify(&self, record: &RawRecord) -> Result<Classification, Rejection> {
        use MalformedReason::*;

        let type_name = required(&record.type_name, MissingType)?;
        let unit = required(&record.unit, MissingUnit)?;
        let raw_value = required(&record.value, MissingValue)?;
        required(&record.start_date, MissingStartDate)?;
        let end_date = required(&record.end_date, MissingEndDate)?;

        let instant = parse_record_timestamp(end_date)
            .ok_or(Rejection::Malformed(InvalidEndDate))?;
        let local = self
            .history
            .localize(&instant, self.mode)
            .ok_or(Rejection::Unresolvable)?;
        if !self.window.contains(local.date()) {
            return Err(Rejection::OutOfRange);
        }

        if self
            .exclusion
            .excludes(type_name, record.source_name.as_deref())
        {
            return Err(Rejection::ExcludedSource);
        }

        let metric = self
            .catalog
            .lookup(type_name, unit)
            .ok_or(Rejection::Unmatched)?;
        let value =
            parse_numeric_literal(raw_value).ok_or(Rejection::Malformed(InvalidValue))?;

        Ok(Classification {
            metric,
            date: local.date(),
            hour: local.hour(),
            value,
        })
    }
}

fn required(field: &Option<String>, reason: MalformedReason) -> Result<&str, Rejection> {
    field
        .as_deref()
        .ok_or(Rejection::Malformed(reason))
}
