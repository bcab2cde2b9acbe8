//! Error types for configuration loading and export I/O.
//!
//! Per-record problems are not errors: they are [`Rejection`]s, counted in the
//! run report and skipped. Only configuration problems and broken input files
//! stop a run.
//!
//! [`Rejection`]: crate::preprocessing::classifier::Rejection

use chrono::NaiveDate;

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Fatal configuration problems, raised before any record is processed.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid reporting window: end {end} must be after start {start}")]
    InvalidWindow { start: NaiveDate, end: NaiveDate },

    #[error("No timezone rules configured")]
    EmptyTimezoneHistory,

    #[error("Timezone rule {index} ({label}): end {end} must be after start {start}")]
    InvertedTimezoneRule {
        index: usize,
        label: String,
        start: NaiveDate,
        end: NaiveDate,
    },

    #[error("Timezone rule {index} ({label}) starts {start}, before the previous rule ends {previous_end}")]
    OverlappingTimezoneRules {
        index: usize,
        label: String,
        start: NaiveDate,
        previous_end: NaiveDate,
    },

    #[error("Invalid UTC offset '{0}': expected +HH:MM or -HH:MM")]
    InvalidUtcOffset(String),

    #[error("No metric definitions configured")]
    EmptyMetricCatalog,

    #[error("Duplicate metric definition: {0}")]
    DuplicateMetric(String),

    #[error("Excluded metric '{0}' is not a configured metric")]
    UnknownExcludedMetric(String),

    #[error("Failed to read config file: {0}")]
    Read(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Result type for export and table file operations
pub type ExportResult<T> = Result<T, ExportError>;

/// Errors raised while reading an export or reading/writing metric tables.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("XML error at byte {position}: {source}")]
    Xml {
        position: usize,
        #[source]
        source: quick_xml::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Table header must start with 'date', found '{0}'")]
    MissingDateColumn(String),

    #[error("Row {row}: invalid date '{value}'")]
    InvalidDate { row: usize, value: String },

    #[error("Row {row}, column '{column}': invalid value '{value}'")]
    InvalidCell {
        row: usize,
        column: String,
        value: String,
    },
}
