//! End-to-end tests: export file and config file in, daily table and derived
//! analyses out.

use chrono::NaiveDate;
use health_export::algorithms::correlation::{discover_correlations, CorrelationParams};
use health_export::algorithms::statistics::SeriesStats;
use health_export::config::ExtractionConfig;
use health_export::core::domain::{MetricTable, RawRecord};
use health_export::io::{read_table_from_path, write_table_to_path, ExportLoader};
use health_export::preprocessing::ExtractionPipeline;
use health_export::time::PeriodKind;
use health_export::transformations::aggregate_by_period;
use health_export::ExtractionReport;
use std::io::Write;
use tempfile::{NamedTempFile, TempDir};

// ==================== Helper Functions ====================

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn write_temp(content: &str, suffix: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

fn record_xml(kind: &str, unit: &str, value: &str, end: &str, source: &str) -> String {
    format!(
        r#" <Record type="HKQuantityTypeIdentifier{}" sourceName="{}" unit="{}" startDate="{}" endDate="{}" value="{}"/>"#,
        kind, source, unit, end, end, value
    )
}

fn export_xml(records: &[String]) -> String {
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<HealthData locale=\"en_US\">\n{}\n</HealthData>\n",
        records.join("\n")
    )
}

const CONFIG: &str = r#"
type_prefix = "HKQuantityTypeIdentifier"
timezone_mode = "data_timezone"

[window]
start = "2024-01-01"
end = "2024-04-01"

[exclusion]
source_substring = "iPhone"
metrics = ["StepCount"]

[[metrics]]
name = "StepCount"
unit = "count"
policy = "sum"

[[metrics]]
name = "RestingHeartRate"
unit = "count/min"
policy = "median"

[[metrics]]
name = "BodyMass"
unit = "kg"
policy = "average"

[[timezones]]
label = "GMT"
start = "2023-12-01"
end = "2024-02-01"
utc_offset = "+00:00"

[[timezones]]
label = "JST"
start = "2024-02-01"
end = "2024-06-01"
utc_offset = "+09:00"
"#;

// ==================== End-to-end extraction ====================

#[test]
fn test_extract_write_and_read_back() {
    let xml = export_xml(&[
        record_xml("StepCount", "count", "500", "2024-01-10 08:05:00 +0000", "Watch"),
        record_xml("StepCount", "count", "300", "2024-01-10 08:40:00 +0000", "Watch"),
        record_xml("StepCount", "count", "1200", "2024-01-10 14:00:00 +0000", "Watch"),
        record_xml("StepCount", "count", "999", "2024-01-10 14:00:00 +0000", "Lee's iPhone"),
        record_xml("RestingHeartRate", "count/min", "58", "2024-01-11 07:00:00 +0000", "Watch"),
        record_xml("BodyMass", "kg", "71.3", "2024-01-11 07:00:00 +0000", "Scale"),
        record_xml("BodyMass", "lb", "157", "2024-01-11 07:00:00 +0000", "Scale"),
    ]);
    let export = write_temp(&xml, ".xml");
    let config_file = write_temp(CONFIG, ".toml");

    let config = ExtractionConfig::from_file(config_file.path()).unwrap();
    let result = ExportLoader::load_from_file(export.path(), &config).unwrap();

    assert_eq!(result.table.get(date(2024, 1, 10), "StepCount"), Some(2000.0));
    assert_eq!(result.table.get(date(2024, 1, 11), "StepCount"), Some(0.0));
    assert_eq!(result.table.get(date(2024, 1, 11), "RestingHeartRate"), Some(58.0));
    assert_eq!(result.table.get(date(2024, 1, 10), "BodyMass"), None);
    assert_eq!(result.report.excluded_source, 1);
    assert_eq!(result.report.unmatched, 1);

    let dir = TempDir::new().unwrap();
    let csv_path = dir.path().join("daily.csv");
    write_table_to_path(&result.table, &csv_path).unwrap();
    let text = std::fs::read_to_string(&csv_path).unwrap();
    assert!(text.starts_with("date,BodyMass,RestingHeartRate,StepCount\n"));
    assert!(text.contains("2024-01-10,NA,NA,2000\n"));

    let read_back = read_table_from_path(&csv_path).unwrap();
    assert_eq!(read_back, result.table);
}

#[test]
fn test_travel_moves_readings_to_local_dates() {
    // Device set to +05:30 at export time; wearer was in GMT, then JST
    let xml = export_xml(&[
        record_xml("StepCount", "count", "100", "2024-01-31 05:00:00 +0530", "Watch"),
        record_xml("StepCount", "count", "200", "2024-02-10 02:00:00 +0530", "Watch"),
    ]);
    let export = write_temp(&xml, ".xml");
    let config = ExtractionConfig::from_toml_str(CONFIG).unwrap();

    let result = ExportLoader::load_from_file(export.path(), &config).unwrap();

    // 2024-01-30 23:30 GMT
    assert_eq!(result.table.get(date(2024, 1, 30), "StepCount"), Some(100.0));
    // 2024-02-09 20:30 UTC is 2024-02-10 05:30 in JST
    assert_eq!(result.table.get(date(2024, 2, 10), "StepCount"), Some(200.0));
    assert_eq!(result.table.len(), 2);
}

#[test]
fn test_unresolvable_records_are_reported() {
    let xml = export_xml(&[
        record_xml("StepCount", "count", "100", "2023-11-15 12:00:00 +0000", "Watch"),
        record_xml("StepCount", "count", "100", "2024-07-01 12:00:00 +0000", "Watch"),
        record_xml("StepCount", "count", "100", "2024-01-15 12:00:00 +0000", "Watch"),
    ]);
    let export = write_temp(&xml, ".xml");
    let config = ExtractionConfig::from_toml_str(CONFIG).unwrap();

    let report = ExportLoader::load_from_file(export.path(), &config)
        .unwrap()
        .report;
    assert_eq!(report.unresolvable, 2);
    assert_eq!(report.accepted, 1);
    assert_eq!(
        report.unresolvable_dates["HKQuantityTypeIdentifierStepCount"].len(),
        2
    );

    let json = report.to_json().unwrap();
    let parsed: ExtractionReport = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, report);
    assert!(parsed.input_checksum.is_some());
}

#[test]
fn test_invalid_config_fails_before_reading() {
    let mut config = ExtractionConfig::from_toml_str(CONFIG).unwrap();
    config.timezones[1].start = date(2024, 1, 15);

    let result = ExportLoader::load_from_file(std::path::Path::new("/nonexistent.xml"), &config);
    let message = format!("{:#}", result.unwrap_err());
    assert!(message.contains("Invalid configuration"));
}

#[test]
fn test_pipeline_accepts_any_record_source() {
    let pipeline = ExtractionPipeline::new(&ExtractionConfig::from_toml_str(CONFIG).unwrap()).unwrap();
    let records = (1..=5).map(|day| RawRecord {
        type_name: Some("HKQuantityTypeIdentifierBodyMass".to_string()),
        unit: Some("kg".to_string()),
        value: Some(format!("{}.5", 70 + day)),
        start_date: Some(format!("2024-03-0{} 07:00:00 +0900", day)),
        end_date: Some(format!("2024-03-0{} 07:00:00 +0900", day)),
        source_name: None,
    });

    let (table, report) = pipeline.extract(records);
    assert_eq!(report.accepted, 5);
    assert_eq!(table.get(date(2024, 3, 3), "BodyMass"), Some(73.5));
}

// ==================== Downstream analyses ====================

fn long_table() -> MetricTable {
    let mut table = MetricTable::new();
    let start = date(2024, 1, 1);
    for i in 0..60u32 {
        let day = start + chrono::Duration::days(i64::from(i));
        let wobble = f64::from(i % 7);
        table.insert(day, "StepCount", 5000.0 + 100.0 * f64::from(i) + wobble);
        // Tracks yesterday's steps
        table.insert(day, "ActiveEnergyBurned", 200.0 + 4.0 * f64::from(i.saturating_sub(1)));
        table.insert(day, "BodyMass", 70.0 + f64::from((i * 37) % 11) / 10.0);
    }
    table
}

#[test]
fn test_weekly_aggregation_and_stats() {
    let table = long_table();
    let weekly = aggregate_by_period(&table, PeriodKind::Weekly).unwrap();

    // 2024-01-01 is a Monday: 60 days span 9 weeks
    assert_eq!(weekly.len(), 9);
    assert!(weekly.dates().all(|d| d.format("%a").to_string() == "Mon"));

    let steps: Vec<f64> = table.series("StepCount").into_values().collect();
    let stats = SeriesStats::compute(&steps, &[]).unwrap();
    assert_eq!(stats.count, 60);
    assert!(stats.min < stats.median && stats.median < stats.max);
}

#[test]
fn test_lagged_correlation_discovered() {
    let params = CorrelationParams::default();
    let found = discover_correlations(&long_table(), PeriodKind::Daily, 1, &params);

    let lagged = found
        .iter()
        .find(|c| c.delta == 1 && c.metric_a == "StepCount" && c.metric_b == "ActiveEnergyBurned")
        .expect("lagged pair");
    assert!(lagged.datapoints >= params.min_datapoints);
    assert!(lagged.coefficients.values().all(|c| *c > 0.9));

    assert!(found
        .iter()
        .all(|c| c.metric_a != "BodyMass" && c.metric_b != "BodyMass"));
}
