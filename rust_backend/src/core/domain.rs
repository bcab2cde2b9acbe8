//! Domain models for health export records, metric definitions and metric tables.
//!
//! This module provides the core data structures shared by the extraction
//! pipeline and the downstream analyses: the raw records read from an export,
//! the catalog of metrics we know how to aggregate, and the date-indexed tables
//! the pipeline emits.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use crate::error::{ConfigError, ConfigResult};

/// Reduction applied to a metric's readings, first per hour and then per day.
///
/// # Examples
///
/// ```
/// use health_export::core::domain::AggregationPolicy;
///
/// assert_eq!(AggregationPolicy::Sum.label(), "Totals");
/// assert_eq!(AggregationPolicy::Median.label(), "Medians");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregationPolicy {
    Sum,
    Average,
    Median,
}

impl AggregationPolicy {
    /// Human readable plural used in reports ("Daily Totals", "Daily Medians").
    pub fn label(&self) -> &'static str {
        match self {
            AggregationPolicy::Sum => "Totals",
            AggregationPolicy::Average => "Averages",
            AggregationPolicy::Median => "Medians",
        }
    }
}

/// Opaque identifier of a metric inside a [`MetricCatalog`].
///
/// Ids are only handed out by the catalog, so holding one means the metric was
/// validated at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MetricId(usize);

impl MetricId {
    pub fn index(&self) -> usize {
        self.0
    }
}

/// A named, unit-tagged measurement category with a fixed aggregation policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricDefinition {
    pub name: String,
    pub unit: String,
    pub policy: AggregationPolicy,
}

impl MetricDefinition {
    pub fn new(name: &str, unit: &str, policy: AggregationPolicy) -> Self {
        Self {
            name: name.to_string(),
            unit: unit.to_string(),
            policy,
        }
    }
}

/// The fixed set of metrics a pipeline run aggregates.
///
/// Each definition is matched against records by its wire type
/// (`type_prefix + name`) together with its unit. The catalog refuses duplicate
/// names and duplicate (wire type, unit) pairs, so a record can be attributed
/// to at most one metric.
///
/// # Examples
///
/// ```
/// use health_export::core::domain::{AggregationPolicy, MetricCatalog, MetricDefinition};
///
/// let catalog = MetricCatalog::new(
///     "HKQuantityTypeIdentifier",
///     vec![MetricDefinition::new("StepCount", "count", AggregationPolicy::Sum)],
/// )
/// .unwrap();
///
/// let id = catalog.lookup("HKQuantityTypeIdentifierStepCount", "count").unwrap();
/// assert_eq!(catalog.definition(id).name, "StepCount");
/// assert!(catalog.lookup("HKQuantityTypeIdentifierStepCount", "km").is_none());
/// ```
#[derive(Debug, Clone)]
pub struct MetricCatalog {
    type_prefix: String,
    definitions: Vec<MetricDefinition>,
    by_wire: HashMap<(String, String), MetricId>,
    by_name: HashMap<String, MetricId>,
}

impl MetricCatalog {
    pub fn new(type_prefix: &str, definitions: Vec<MetricDefinition>) -> ConfigResult<Self> {
        if definitions.is_empty() {
            return Err(ConfigError::EmptyMetricCatalog);
        }

        let mut by_wire = HashMap::with_capacity(definitions.len());
        let mut by_name = HashMap::with_capacity(definitions.len());

        for (index, def) in definitions.iter().enumerate() {
            let id = MetricId(index);
            let wire = (format!("{}{}", type_prefix, def.name), def.unit.clone());
            if by_name.insert(def.name.clone(), id).is_some()
                || by_wire.insert(wire, id).is_some()
            {
                return Err(ConfigError::DuplicateMetric(def.name.clone()));
            }
        }

        Ok(Self {
            type_prefix: type_prefix.to_string(),
            definitions,
            by_wire,
            by_name,
        })
    }

    /// Find the metric whose wire type and unit both match.
    pub fn lookup(&self, type_name: &str, unit: &str) -> Option<MetricId> {
        self.by_wire
            .get(&(type_name.to_string(), unit.to_string()))
            .copied()
    }

    pub fn id_by_name(&self, name: &str) -> Option<MetricId> {
        self.by_name.get(name).copied()
    }

    pub fn definition(&self, id: MetricId) -> &MetricDefinition {
        &self.definitions[id.0]
    }

    pub fn policy(&self, id: MetricId) -> AggregationPolicy {
        self.definitions[id.0].policy
    }

    pub fn name(&self, id: MetricId) -> &str {
        &self.definitions[id.0].name
    }

    /// Wire type string as it appears in the export's `type` attribute.
    pub fn wire_type(&self, name: &str) -> String {
        format!("{}{}", self.type_prefix, name)
    }

    pub fn ids(&self) -> impl Iterator<Item = MetricId> + '_ {
        (0..self.definitions.len()).map(MetricId)
    }

    pub fn definitions(&self) -> &[MetricDefinition] {
        &self.definitions
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

/// One `Record` element as read from the export. Every attribute is optional
/// because real exports contain partial records.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRecord {
    pub type_name: Option<String>,
    pub unit: Option<String>,
    pub value: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub source_name: Option<String>,
}

/// Date-indexed table of metric values: `date -> metric name -> value`.
///
/// Used for daily tables produced by the pipeline and for the weekly/monthly/
/// quarterly tables derived from them, where the date is the period start.
/// A metric missing from a row means "no usable sample", which is different
/// from a stored zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricTable {
    rows: BTreeMap<NaiveDate, BTreeMap<String, f64>>,
}

/// The pipeline's final output.
pub type DailyTable = MetricTable;

impl MetricTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, date: NaiveDate, metric: &str, value: f64) {
        self.rows
            .entry(date)
            .or_default()
            .insert(metric.to_string(), value);
    }

    pub fn get(&self, date: NaiveDate, metric: &str) -> Option<f64> {
        self.rows.get(&date).and_then(|row| row.get(metric)).copied()
    }

    pub fn row(&self, date: NaiveDate) -> Option<&BTreeMap<String, f64>> {
        self.rows.get(&date)
    }

    /// Mutable row access, creating an empty row for `date` if needed.
    pub fn row_mut(&mut self, date: NaiveDate) -> &mut BTreeMap<String, f64> {
        self.rows.entry(date).or_default()
    }

    pub fn rows(&self) -> impl Iterator<Item = (&NaiveDate, &BTreeMap<String, f64>)> {
        self.rows.iter()
    }

    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.rows.keys().copied()
    }

    /// Sorted, de-duplicated metric names present in any row.
    pub fn metric_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .rows
            .values()
            .flat_map(|row| row.keys().cloned())
            .collect();
        names.sort();
        names.dedup();
        names
    }

    /// Time series of a single metric, skipping dates where it is absent.
    pub fn series(&self, metric: &str) -> BTreeMap<NaiveDate, f64> {
        self.rows
            .iter()
            .filter_map(|(date, row)| row.get(metric).map(|v| (*date, *v)))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
