use log::{debug, info, warn};

use crate::config::ExtractionConfig;
use crate::core::domain::{DailyTable, MetricCatalog, RawRecord};
use crate::error::ConfigResult;
use crate::preprocessing::aggregator::{aggregate, Accumulation, DailySeries};
use crate::preprocessing::classifier::{Rejection, RecordClassifier};
use crate::preprocessing::report::ExtractionReport;
use crate::preprocessing::table::build_daily_table;
use crate::time::timezone::parse_record_timestamp;

/// Progress is logged every this many records.
pub const CHECKPOINT_EVERY: usize = 1_000_000;

/// Result of one extraction pass
#[derive(Debug, Clone)]
pub struct Extraction {
    pub series: DailySeries,
    pub report: ExtractionReport,
}

/// Single-pass extraction from raw records to daily metric values.
///
/// Configuration is validated when the pipeline is built, so a bad window or
/// timezone table fails before the first record is read. Individual records
/// never abort a run; they are classified, counted and skipped.
pub struct ExtractionPipeline {
    classifier: RecordClassifier,
}

impl ExtractionPipeline {
    /// Validate `config` and build a pipeline for it.
    pub fn new(config: &ExtractionConfig) -> ConfigResult<Self> {
        let classifier = RecordClassifier::from_config(config)?;
        debug!(
            "Pipeline ready: {} metrics, window {} to {}, mode {}",
            classifier.catalog().len(),
            classifier.window().start,
            classifier.window().end,
            classifier.mode().name()
        );
        Ok(Self { classifier })
    }

    /// Build a pipeline around an already assembled classifier
    pub fn with_classifier(classifier: RecordClassifier) -> Self {
        Self { classifier }
    }

    pub fn catalog(&self) -> &MetricCatalog {
        self.classifier.catalog()
    }

    pub fn classifier(&self) -> &RecordClassifier {
        &self.classifier
    }

    /// Classify and accumulate every record, then aggregate once.
    pub fn run<I>(&self, records: I) -> Extraction
    where
        I: IntoIterator<Item = RawRecord>,
    {
        let catalog = self.classifier.catalog();
        let mut accumulation = Accumulation::new();
        let mut report = ExtractionReport::default();

        for (index, record) in records.into_iter().enumerate() {
            if index > 0 && index % CHECKPOINT_EVERY == 0 {
                info!("Processed: {}", index);
            }

            match self.classifier.classify(&record) {
                Ok(classification) => {
                    report.record_accepted(catalog.name(classification.metric));
                    accumulation.push(classification);
                }
                Err(rejection) => {
                    if rejection == Rejection::Unresolvable {
                        let instant = record.end_date.as_deref().and_then(parse_record_timestamp);
                        if let (Some(type_name), Some(instant)) =
                            (record.type_name.as_deref(), instant)
                        {
                            report.record_unresolvable_date(type_name, instant.date_naive());
                        }
                    }
                    report.record_rejection(&rejection);
                }
            }
        }

        let series = aggregate(accumulation, catalog);
        report.daily_values = series.len();

        info!(
            "Processed {} records: {} accepted, {} malformed, {} out of range, {} excluded, {} unmatched",
            report.total_records,
            report.accepted,
            report.malformed,
            report.out_of_range,
            report.excluded_source,
            report.unmatched
        );
        if report.unresolvable > 0 {
            warn!(
                "{} records could not be placed in the timezone history",
                report.unresolvable
            );
            for (type_name, dates) in &report.unresolvable_dates {
                if let (Some(first), Some(last)) = (dates.first(), dates.last()) {
                    warn!(
                        "  {}: {} distinct dates, from {} to {}",
                        type_name,
                        dates.len(),
                        first,
                        last
                    );
                }
            }
        }

        Extraction { series, report }
    }

    /// Run and pivot the result into a daily table.
    pub fn extract<I>(&self, records: I) -> (DailyTable, ExtractionReport)
    where
        I: IntoIterator<Item = RawRecord>,
    {
        let extraction = self.run(records);
        let table = build_daily_table(&extraction.series, self.catalog());
        (table, extraction.report)
    }
}
