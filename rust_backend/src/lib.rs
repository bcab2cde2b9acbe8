//! Health export processing: turn an Apple-Health style XML export into a
//! timezone-correct table of daily metric values, and analyse the result.
//!
//! ```no_run
//! use health_export::config::ExtractionConfig;
//! use health_export::io::{write_table_to_path, ExportLoader};
//! use std::path::Path;
//!
//! # fn main() -> anyhow::Result<()> {
//! let config = ExtractionConfig::from_file("health_export.toml")?;
//! let result = ExportLoader::load_from_file(Path::new("export.xml"), &config)?;
//! write_table_to_path(&result.table, Path::new("daily.csv"))?;
//! # Ok(())
//! # }
//! ```

pub mod algorithms;
pub mod config;
pub mod core;
pub mod error;
pub mod io;
pub mod parsing;
pub mod preprocessing;
pub mod time;
pub mod transformations;

pub use config::ExtractionConfig;
pub use core::domain::{DailyTable, MetricTable, RawRecord};
pub use error::{ConfigError, ExportError};
pub use preprocessing::{ExtractionPipeline, ExtractionReport};
