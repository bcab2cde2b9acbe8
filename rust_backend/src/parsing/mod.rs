//! Parsers for health export input formats.
//!
//! # Parsers
//!
//! - [`health_xml`]: Stream `Record` elements out of an Apple-Health style XML export
//!
//! # Example
//!
//! ```no_run
//! use health_export::parsing::HealthXmlReader;
//! use std::path::Path;
//!
//! let reader = HealthXmlReader::from_path(Path::new("export.xml"))
//!     .expect("Failed to open export");
//! for record in reader {
//!     let record = record.expect("Malformed XML");
//!     println!("{:?}", record.type_name);
//! }
//! ```

pub mod health_xml;


pub use health_xml::{parse_health_xml_str, HealthXmlReader};
