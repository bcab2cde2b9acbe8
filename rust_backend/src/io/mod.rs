//! High-level loading and table file utilities.
//!
//! [`loaders`] combines the XML reader with an extraction pipeline and
//! fingerprints the input; [`daily_csv`] writes and reads the resulting tables.
//!
//! # Example
//!
//! ```no_run
//! use health_export::config::ExtractionConfig;
//! use health_export::io::{daily_csv, ExportLoader};
//! use std::path::Path;
//!
//! let result = ExportLoader::load_from_file(Path::new("export.xml"), &ExtractionConfig::reference())
//!     .expect("Failed to load");
//! daily_csv::write_table_to_path(&result.table, Path::new("daily.csv"))
//!     .expect("Failed to write");
//! println!("Extracted {} days", result.table.len());
//! ```

pub mod daily_csv;
pub mod loaders;


pub use daily_csv::{read_table, read_table_from_path, write_table, write_table_to_path};
pub use loaders::{calculate_checksum, file_checksum, ExportLoadResult, ExportLoader};
