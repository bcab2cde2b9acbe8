//! Extraction configuration file support.
//!
//! Configuration is read from TOML (or taken from [`ExtractionConfig::reference`])
//! and validated once, explicitly, before any record is processed.
//!
//! ```toml
//! type_prefix = "HKQuantityTypeIdentifier"
//! timezone_mode = "data_timezone"
//!
//! [window]
//! start = "2021-01-01"
//! end = "2025-03-01"
//!
//! [exclusion]
//! source_substring = "iPhone"
//! metrics = ["StepCount"]
//!
//! [[metrics]]
//! name = "StepCount"
//! unit = "count"
//! policy = "sum"
//!
//! [[timezones]]
//! label = "PDT"
//! start = "2020-01-01"
//! end = "2023-05-24"
//! utc_offset = "-08:00"
//! ```

use chrono::NaiveDate;
use log::debug;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::core::domain::{AggregationPolicy, MetricCatalog, MetricDefinition};
use crate::error::{ConfigError, ConfigResult};
use crate::time::timezone::{
    parse_utc_offset, ReportingWindow, TimezoneHistory, TimezoneMode, TimezoneRule,
};

/// Prefix Apple Health puts in front of quantity type names.
pub const DEFAULT_TYPE_PREFIX: &str = "HKQuantityTypeIdentifier";

/// File name searched for by [`ExtractionConfig::from_default_location`].
pub const CONFIG_FILE_NAME: &str = "health_export.toml";

static REFERENCE_METRICS: Lazy<Vec<MetricDefinition>> = Lazy::new(|| {
    use AggregationPolicy::*;
    [
        ("ActiveEnergyBurned", "Cal", Sum),
        ("AppleExerciseTime", "min", Sum),
        ("AppleStandTime", "min", Sum),
        ("BodyMass", "kg", Average),
        ("DistanceWalkingRunning", "km", Sum),
        ("FlightsClimbed", "count", Sum),
        ("HeartRate", "count/min", Median),
        ("HeartRateRecoveryOneMinute", "count/min", Median),
        ("PhysicalEffort", "kcal/hr·kg", Median),
        ("RespiratoryRate", "count/min", Median),
        ("RestingHeartRate", "count/min", Median),
        ("StairAscentSpeed", "m/s", Median),
        ("StairDescentSpeed", "m/s", Median),
        ("StepCount", "count", Sum),
        ("TimeInDaylight", "min", Sum),
        ("VO2Max", "mL/min·kg", Average),
        ("WalkingAsymmetryPercentage", "%", Average),
        ("WalkingDoubleSupportPercentage", "%", Average),
        ("WalkingSpeed", "km/hr", Median),
    ]
    .iter()
    .map(|(name, unit, policy)| MetricDefinition::new(name, unit, *policy))
    .collect()
});

/// Top-level extraction configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionConfig {
    #[serde(default = "default_type_prefix")]
    pub type_prefix: String,
    #[serde(default)]
    pub timezone_mode: TimezoneMode,
    pub window: ReportingWindow,
    #[serde(default)]
    pub exclusion: ExclusionSettings,
    pub metrics: Vec<MetricDefinition>,
    #[serde(default)]
    pub timezones: Vec<TimezoneSettings>,
}

/// Source-device exclusion: records of the listed metrics whose source name
/// contains `source_substring` are dropped, because a second device reports
/// the same activity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExclusionSettings {
    #[serde(default)]
    pub source_substring: String,
    #[serde(default)]
    pub metrics: Vec<String>,
}

/// One timezone history entry as written in the config file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimezoneSettings {
    #[serde(default)]
    pub label: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub utc_offset: String,
}

fn default_type_prefix() -> String {
    DEFAULT_TYPE_PREFIX.to_string()
}

fn ymd(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or(NaiveDate::MIN)
}

impl ExtractionConfig {
    /// Load configuration from a TOML file. The result is not yet validated.
    pub fn from_file<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Load `health_export.toml` from the current directory, `rust_backend/`
    /// or the parent directory, falling back to the reference deployment.
    pub fn from_default_location() -> ConfigResult<Self> {
        let search_paths = [
            PathBuf::from(CONFIG_FILE_NAME),
            PathBuf::from("rust_backend").join(CONFIG_FILE_NAME),
            PathBuf::from("..").join(CONFIG_FILE_NAME),
        ];

        for path in search_paths {
            if path.exists() {
                debug!("Loading configuration from {}", path.display());
                return Self::from_file(&path);
            }
        }

        debug!("No {} found, using reference configuration", CONFIG_FILE_NAME);
        Ok(Self::reference())
    }

    /// The reference deployment: Apple Watch metrics, iPhone duplicates
    /// excluded, and the travel history of the reference data set.
    pub fn reference() -> Self {
        let tz = |label: &str, start: NaiveDate, end: NaiveDate, offset: &str| TimezoneSettings {
            label: label.to_string(),
            start,
            end,
            utc_offset: offset.to_string(),
        };

        Self {
            type_prefix: default_type_prefix(),
            timezone_mode: TimezoneMode::DataTimezone,
            window: ReportingWindow {
                start: ymd(2021, 1, 1),
                end: ymd(2025, 3, 1),
            },
            exclusion: ExclusionSettings {
                source_substring: "iPhone".to_string(),
                metrics: vec![
                    "DistanceWalkingRunning".to_string(),
                    "FlightsClimbed".to_string(),
                    "StepCount".to_string(),
                ],
            },
            metrics: REFERENCE_METRICS.clone(),
            timezones: vec![
                tz("PDT", ymd(2020, 1, 1), ymd(2023, 5, 24), "-08:00"),
                tz("BST", ymd(2023, 5, 24), ymd(2023, 12, 30), "+01:00"),
                tz("IST", ymd(2023, 12, 30), ymd(2024, 1, 21), "+05:30"),
                tz("CST", ymd(2024, 1, 21), ymd(2024, 2, 19), "+08:00"),
                tz("IST", ymd(2024, 2, 19), ymd(2024, 11, 3), "+05:30"),
                tz("CST", ymd(2024, 11, 3), ymd(2025, 2, 12), "+08:00"),
                tz("IST", ymd(2025, 2, 12), ymd(2025, 5, 31), "+05:30"),
            ],
        }
    }

    /// Build the metric catalog, rejecting duplicates.
    pub fn catalog(&self) -> ConfigResult<MetricCatalog> {
        MetricCatalog::new(&self.type_prefix, self.metrics.clone())
    }

    /// Build the timezone history and check its ordering.
    pub fn timezone_history(&self) -> ConfigResult<TimezoneHistory> {
        let rules = self
            .timezones
            .iter()
            .map(|tz| {
                Ok(TimezoneRule::new(
                    &tz.label,
                    tz.start,
                    tz.end,
                    parse_utc_offset(&tz.utc_offset)?,
                ))
            })
            .collect::<ConfigResult<Vec<_>>>()?;

        let history = TimezoneHistory::new(rules);
        history.validate()?;
        Ok(history)
    }

    /// Validate every part of the configuration.
    ///
    /// The timezone history may be empty in export-timezone mode, where it is
    /// never consulted; if rules are given they must still be well formed.
    pub fn validate(&self) -> ConfigResult<()> {
        self.window.validate()?;

        let catalog = self.catalog()?;
        for name in &self.exclusion.metrics {
            if catalog.id_by_name(name).is_none() {
                return Err(ConfigError::UnknownExcludedMetric(name.clone()));
            }
        }

        match self.timezone_mode {
            TimezoneMode::DataTimezone => {
                self.timezone_history()?;
            }
            TimezoneMode::ExportTimezone if !self.timezones.is_empty() => {
                self.timezone_history()?;
            }
            TimezoneMode::ExportTimezone => {}
        }

        Ok(())
    }
}
