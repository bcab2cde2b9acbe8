use anyhow::{Context, Result};
use log::info;
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{self, BufRead};
use std::path::Path;
use std::time::Instant;

use crate::config::ExtractionConfig;
use crate::core::domain::DailyTable;
use crate::error::ExportError;
use crate::parsing::health_xml::HealthXmlReader;
use crate::preprocessing::pipeline::ExtractionPipeline;
use crate::preprocessing::report::ExtractionReport;

/// Result of extracting a daily table from an export
#[derive(Debug)]
pub struct ExportLoadResult {
    pub table: DailyTable,
    pub report: ExtractionReport,
}

/// SHA-256 checksum of in-memory content, hex encoded.
pub fn calculate_checksum(content: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content);
    hex::encode(hasher.finalize())
}

/// SHA-256 checksum of a file, streamed from disk.
pub fn file_checksum(path: &Path) -> Result<String> {
    let mut file = File::open(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;
    let mut hasher = Sha256::new();
    io::copy(&mut file, &mut hasher)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    Ok(hex::encode(hasher.finalize()))
}

/// Loads health exports and runs them through an extraction pipeline
pub struct ExportLoader;

impl ExportLoader {
    /// Validate `config`, then extract the daily table from an export file
    pub fn load_from_file(path: &Path, config: &ExtractionConfig) -> Result<ExportLoadResult> {
        let pipeline = ExtractionPipeline::new(config).context("Invalid configuration")?;
        Self::load_with_pipeline(path, &pipeline)
    }

    /// Extract from an export file with an existing pipeline.
    ///
    /// The report carries the file's checksum so runs can be matched to
    /// their input.
    pub fn load_with_pipeline(path: &Path, pipeline: &ExtractionPipeline) -> Result<ExportLoadResult> {
        let start = Instant::now();
        let reader = HealthXmlReader::from_path(path)
            .with_context(|| format!("Failed to open export {}", path.display()))?;

        let mut result = Self::extract(reader, pipeline)
            .with_context(|| format!("Failed to parse export {}", path.display()))?;
        result.report.input_checksum = Some(file_checksum(path)?);

        info!(
            "Extracted {} days from {} in {:.1?}",
            result.table.len(),
            path.display(),
            start.elapsed()
        );
        Ok(result)
    }

    /// Extract from an in-memory export
    pub fn load_from_str(xml: &str, pipeline: &ExtractionPipeline) -> Result<ExportLoadResult> {
        let mut result = Self::extract(HealthXmlReader::new(xml.as_bytes()), pipeline)
            .context("Failed to parse export")?;
        result.report.input_checksum = Some(calculate_checksum(xml.as_bytes()));
        Ok(result)
    }

    fn extract<R: BufRead>(
        reader: HealthXmlReader<R>,
        pipeline: &ExtractionPipeline,
    ) -> Result<ExportLoadResult, ExportError> {
        let mut xml_error = None;
        let records = reader.map_while(|record| match record {
            Ok(record) => Some(record),
            Err(e) => {
                xml_error = Some(e);
                None
            }
        });

        let (table, report) = pipeline.extract(records);
        match xml_error {
            Some(e) => Err(e),
            None => Ok(ExportLoadResult { table, report }),
        }
    }
}
