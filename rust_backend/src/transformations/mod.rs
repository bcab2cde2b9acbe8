//! Transformations over finished metric tables.
//!
//! # Modules
//!
//! - [`periods`]: Average daily tables into weekly, monthly or quarterly tables
//! - [`filtering`]: Restrict a table to a date range or a set of metrics
//!
//! # Example
//!
//! ```no_run
//! use health_export::io::read_table_from_path;
//! use health_export::time::PeriodKind;
//! use health_export::transformations::{aggregate_by_period, select_metrics};
//! use std::path::Path;
//!
//! let daily = read_table_from_path(Path::new("daily.csv")).expect("Failed to read");
//! let steps = select_metrics(&daily, &["StepCount"]);
//! let monthly = aggregate_by_period(&steps, PeriodKind::Monthly).expect("Failed to aggregate");
//! ```

pub mod filtering;
pub mod periods;

pub use filtering::{filter_by_date_range, select_metrics};
pub use periods::aggregate_by_period;
