//! Record classification, aggregation and daily table construction.
//!
//! [`ExtractionPipeline`] ties the pieces together: every raw record goes
//! through the [`RecordClassifier`], accepted readings are accumulated by
//! metric, date and hour, and the accumulation is collapsed once at the end
//! of the pass.

pub mod aggregator;
pub mod classifier;
pub mod pipeline;
pub mod report;
pub mod table;


pub use aggregator::{aggregate, reduce, Accumulation, DailySeries};
pub use classifier::{
    parse_numeric_literal, Classification, ExclusionRule, MalformedReason, RecordClassifier,
    Rejection,
};
pub use pipeline::{Extraction, ExtractionPipeline, CHECKPOINT_EVERY};
pub use report::ExtractionReport;
pub use table::build_daily_table;
