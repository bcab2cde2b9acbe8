//! CSV form of a [`MetricTable`].
//!
//! The header is `date` followed by the sorted metric names. Rows are sorted
//! by date; a metric without a value on a date is written as `NA`, which is
//! distinct from a stored zero. Values use the shortest representation that
//! parses back to the same `f64`, so a write followed by a read returns an
//! identical table.

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use chrono::NaiveDate;

use crate::core::domain::MetricTable;
use crate::error::{ExportError, ExportResult};

/// Name of the first column.
pub const DATE_COLUMN: &str = "date";

/// Cell written for an absent value.
pub const MISSING: &str = "NA";

pub fn write_table<W: Write>(table: &MetricTable, writer: W) -> ExportResult<()> {
    let metrics = table.metric_names();
    let mut csv_writer = csv::Writer::from_writer(writer);

    let mut header = Vec::with_capacity(metrics.len() + 1);
    header.push(DATE_COLUMN.to_string());
    header.extend(metrics.iter().cloned());
    csv_writer.write_record(&header)?;

    for (date, row) in table.rows() {
        let mut record = Vec::with_capacity(header.len());
        record.push(date.format("%Y-%m-%d").to_string());
        for metric in &metrics {
            record.push(match row.get(metric) {
                Some(value) => value.to_string(),
                None => MISSING.to_string(),
            });
        }
        csv_writer.write_record(&record)?;
    }

    csv_writer.flush()?;
    Ok(())
}

pub fn write_table_to_path(table: &MetricTable, path: &Path) -> ExportResult<()> {
    let file = File::create(path)?;
    write_table(table, file)
}

/// Read a table written by [`write_table`]. `NA` and empty cells are absent.
pub fn read_table<R: Read>(reader: R) -> ExportResult<MetricTable> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(reader);

    let headers = csv_reader.headers()?.clone();
    match headers.get(0) {
        Some(first) if first == DATE_COLUMN => {}
        other => {
            return Err(ExportError::MissingDateColumn(
                other.unwrap_or_default().to_string(),
            ))
        }
    }
    let metrics: Vec<String> = headers.iter().skip(1).map(str::to_string).collect();

    let mut table = MetricTable::new();
    for (index, result) in csv_reader.records().enumerate() {
        let record = result?;
        let row = index + 1;

        let raw_date = record.get(0).unwrap_or_default();
        let date = NaiveDate::parse_from_str(raw_date, "%Y-%m-%d").map_err(|_| {
            ExportError::InvalidDate {
                row,
                value: raw_date.to_string(),
            }
        })?;

        for (metric, cell) in metrics.iter().zip(record.iter().skip(1)) {
            let cell = cell.trim();
            if cell.is_empty() || cell == MISSING {
                continue;
            }
            let value: f64 = cell.parse().map_err(|_| ExportError::InvalidCell {
                row,
                column: metric.clone(),
                value: cell.to_string(),
            })?;
            table.insert(date, metric, value);
        }
    }

    Ok(table)
}

pub fn read_table_from_path(path: &Path) -> ExportResult<MetricTable> {
    let file = File::open(path)?;
    read_table(file)
}
