//! Core domain models for health export processing.
//!
//! This module defines the fundamental data structures used throughout the crate,
//! representing raw export records, metric definitions and date-indexed metric tables.

pub mod domain;

pub use domain::{
    AggregationPolicy, DailyTable, MetricCatalog, MetricDefinition, MetricId, MetricTable,
    RawRecord,
};
