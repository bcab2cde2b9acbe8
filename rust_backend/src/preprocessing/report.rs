//! Run report for one extraction pass.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::preprocessing::classifier::{MalformedReason, Rejection};

/// Counts of every classification outcome seen during a run.
///
/// `unresolvable_dates` keeps the calendar dates (at the offset embedded in
/// the export) of records whose timestamp fell outside the timezone history,
/// grouped by record type, so a missing or mis-dated rule can be located
/// quickly. One entry per type and day, however many records share it.
///
/// # Examples
///
/// ```
/// use health_export::preprocessing::report::ExtractionReport;
/// use health_export::preprocessing::classifier::Rejection;
///
/// let mut report = ExtractionReport::default();
/// report.record_accepted("StepCount");
/// report.record_rejection(&Rejection::OutOfRange);
/// assert_eq!(report.total_records, 2);
/// assert_eq!(report.accepted, 1);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractionReport {
    pub total_records: usize,
    pub accepted: usize,
    pub malformed: usize,
    pub unresolvable: usize,
    pub out_of_range: usize,
    pub excluded_source: usize,
    pub unmatched: usize,
    pub malformed_reasons: BTreeMap<String, usize>,
    pub accepted_by_metric: BTreeMap<String, usize>,
    pub unresolvable_dates: BTreeMap<String, BTreeSet<NaiveDate>>,
    /// Number of (metric, date) values produced
    pub daily_values: usize,
    /// SHA-256 of the export file, when read from disk
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_checksum: Option<String>,
}

impl ExtractionReport {
    pub fn record_accepted(&mut self, metric_name: &str) {
        self.total_records += 1;
        self.accepted += 1;
        *self
            .accepted_by_metric
            .entry(metric_name.to_string())
            .or_insert(0) += 1;
    }

    pub fn record_rejection(&mut self, rejection: &Rejection) {
        self.total_records += 1;
        match rejection {
            Rejection::Malformed(reason) => {
                self.malformed += 1;
                *self
                    .malformed_reasons
                    .entry(reason_key(reason).to_string())
                    .or_insert(0) += 1;
            }
            Rejection::Unresolvable => self.unresolvable += 1,
            Rejection::OutOfRange => self.out_of_range += 1,
            Rejection::ExcludedSource => self.excluded_source += 1,
            Rejection::Unmatched => self.unmatched += 1,
        }
    }

    /// Remember the day of an unresolvable record.
    pub fn record_unresolvable_date(&mut self, type_name: &str, date: NaiveDate) {
        match self.unresolvable_dates.get_mut(type_name) {
            Some(dates) => {
                dates.insert(date);
            }
            None => {
                self.unresolvable_dates
                    .insert(type_name.to_string(), BTreeSet::from([date]));
            }
        }
    }

    /// Records that were skipped for any reason.
    pub fn rejected(&self) -> usize {
        self.total_records - self.accepted
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

fn reason_key(reason: &MalformedReason) -> &'static str {
    match reason {
        MalformedReason::MissingType => "missing_type",
        MalformedReason::MissingUnit => "missing_unit",
        MalformedReason::MissingValue => "missing_value",
        MalformedReason::MissingStartDate => "missing_start_date",
        MalformedReason::MissingEndDate => "missing_end_date",
        MalformedReason::InvalidEndDate => "invalid_end_date",
        MalformedReason::InvalidValue => "invalid_value",
    }
}
