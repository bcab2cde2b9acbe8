//! Analyses over finished metric tables.
//!
//! These functions only read a [`MetricTable`](crate::core::domain::MetricTable);
//! a table can be shared between any number of analyses.
//!
//! # Components
//!
//! - [`statistics`]: nearest-rank percentiles and per-series summaries
//! - [`correlation`]: lagged cross-metric correlation discovery

pub mod correlation;
pub mod statistics;

pub use correlation::{
    discover_correlations, CorrelationKind, CorrelationParams, MetricCorrelation,
};
pub use statistics::{nearest_rank_percentile, round2, SeriesStats};
