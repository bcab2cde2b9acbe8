use anyhow::{bail, Context, Result};
use env_logger::Env;
use log::info;
use chrono::NaiveDate;
use std::fs;
use std::path::Path;

use health_export::algorithms::correlation::{discover_correlations, CorrelationParams};
use health_export::algorithms::statistics::{nsigma_interval, SeriesStats};
use health_export::config::ExtractionConfig;
use health_export::core::domain::MetricTable;
use health_export::io::{read_table_from_path, write_table_to_path, ExportLoader};
use health_export::time::PeriodKind;
use health_export::transformations::{aggregate_by_period, filter_by_date_range, select_metrics};

const USAGE: &str = "\
Usage:
  health_export extract <export.xml> <out.csv> [config.toml] [--report <report.json>]
  health_export aggregate <daily.csv> <out.csv> <weekly|monthly|quarterly>
  health_export stats <daily.csv> [table options]
  health_export correlate <table.csv> <daily|weekly|monthly|quarterly> <max_delta> [table options]

Table options:
  --from <YYYY-MM-DD>   first date to keep
  --to <YYYY-MM-DD>     keep dates before this one
  --metrics <a,b,...>   keep only these metrics";

/// Row and column restrictions shared by the table-reading commands.
#[derive(Debug, Default, PartialEq)]
struct TableOptions {
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
    metrics: Vec<String>,
}

impl TableOptions {
    /// Split `args` into positional arguments and table options.
    fn parse(args: &[String]) -> Result<(Vec<String>, Self)> {
        let mut positional = Vec::new();
        let mut options = Self::default();
        let mut iter = args.iter();
        while let Some(arg) = iter.next() {
            match arg.as_str() {
                "--from" | "--to" => {
                    let value = iter
                        .next()
                        .with_context(|| format!("{} needs a date", arg))?;
                    let date = NaiveDate::parse_from_str(value, "%Y-%m-%d")
                        .with_context(|| format!("Invalid date for {}: {}", arg, value))?;
                    if arg == "--from" {
                        options.from = Some(date);
                    } else {
                        options.to = Some(date);
                    }
                }
                "--metrics" => {
                    let value = iter.next().context("--metrics needs a metric list")?;
                    options.metrics = value
                        .split(',')
                        .map(str::trim)
                        .filter(|m| !m.is_empty())
                        .map(str::to_string)
                        .collect();
                }
                _ => positional.push(arg.clone()),
            }
        }
        Ok((positional, options))
    }

    fn apply(&self, table: MetricTable) -> Result<MetricTable> {
        let table = if self.from.is_some() || self.to.is_some() {
            let start = self.from.unwrap_or(NaiveDate::MIN);
            let end = self.to.unwrap_or(NaiveDate::MAX);
            filter_by_date_range(&table, start, end).map_err(anyhow::Error::msg)?
        } else {
            table
        };
        if self.metrics.is_empty() {
            return Ok(table);
        }
        let names: Vec<&str> = self.metrics.iter().map(String::as_str).collect();
        Ok(select_metrics(&table, &names))
    }
}

fn read_restricted_table(path: &str, options: &TableOptions) -> Result<MetricTable> {
    let table = read_table_from_path(Path::new(path))
        .with_context(|| format!("Failed to read {}", path))?;
    options.apply(table)
}

fn run_extract(args: &[String]) -> Result<()> {
    let mut positional = Vec::new();
    let mut report_path = None;
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if arg == "--report" {
            report_path = Some(iter.next().context("--report needs a file path")?);
        } else {
            positional.push(arg.as_str());
        }
    }

    let (xml_path, out_path, config_path) = match positional.as_slice() {
        [xml, out] => (*xml, *out, None),
        [xml, out, config] => (*xml, *out, Some(*config)),
        _ => bail!("extract expects <export.xml> <out.csv> [config.toml]"),
    };

    let config = match config_path {
        Some(path) => ExtractionConfig::from_file(path)
            .with_context(|| format!("Failed to load config {}", path))?,
        None => ExtractionConfig::from_default_location()?,
    };

    println!("=== Health Export Extraction ===");
    println!("Export file: {}", xml_path);
    println!("Output file: {}", out_path);
    println!(
        "Window: {} to {} ({})",
        config.window.start,
        config.window.end,
        config.timezone_mode.name()
    );
    println!();

    let result = ExportLoader::load_from_file(Path::new(xml_path), &config)?;
    write_table_to_path(&result.table, Path::new(out_path))
        .with_context(|| format!("Failed to write {}", out_path))?;

    let report = &result.report;
    println!("✓ Wrote {} days", result.table.len());
    println!("  Records:      {}", report.total_records);
    println!("  Accepted:     {}", report.accepted);
    println!("  Malformed:    {}", report.malformed);
    println!("  Unresolvable: {}", report.unresolvable);
    println!("  Out of range: {}", report.out_of_range);
    println!("  Excluded:     {}", report.excluded_source);
    for metric in &config.metrics {
        let readings = report.accepted_by_metric.get(&metric.name).copied().unwrap_or(0);
        println!(
            "  {} (Daily {}): {} readings",
            metric.name,
            metric.policy.label(),
            readings
        );
    }

    if let Some(path) = report_path {
        fs::write(path, report.to_json()?)
            .with_context(|| format!("Failed to write report {}", path))?;
        info!("Report written to {}", path);
    }

    Ok(())
}

fn run_aggregate(args: &[String]) -> Result<()> {
    let [daily_path, out_path, period] = args else {
        bail!("aggregate expects <daily.csv> <out.csv> <period>");
    };
    let kind: PeriodKind = period.parse().map_err(anyhow::Error::msg)?;

    let daily = read_table_from_path(Path::new(daily_path))
        .with_context(|| format!("Failed to read {}", daily_path))?;
    let table = aggregate_by_period(&daily, kind).map_err(anyhow::Error::msg)?;
    write_table_to_path(&table, Path::new(out_path))
        .with_context(|| format!("Failed to write {}", out_path))?;

    println!(
        "✓ Aggregated {} days into {} {}",
        daily.len(),
        table.len(),
        kind.unit_label().to_lowercase()
    );
    Ok(())
}

fn run_stats(args: &[String]) -> Result<()> {
    let (positional, options) = TableOptions::parse(args)?;
    let [path] = positional.as_slice() else {
        bail!("stats expects <daily.csv>");
    };
    let table = read_restricted_table(path, &options)?;

    for metric in table.metric_names() {
        let values: Vec<f64> = table.series(&metric).into_values().collect();
        let Some(stats) = SeriesStats::compute(&values, &[]) else {
            continue;
        };
        println!("{}", metric);
        println!("  No. of Days: {}", stats.count);
        println!("  Average:     {:.2}", stats.average);
        println!("  Median:      {:.2}", stats.median);
        println!("  Std Dev:     {:.2}", stats.std_dev);
        println!("  Skew:        {:.2}", stats.skew);
        println!("  Kurtosis:    {:.2}", stats.kurtosis);
        println!("  Min / Max:   {:.2} / {:.2}", stats.min, stats.max);
        println!(
            "  Middle 50%:  {:.2} - {:.2}",
            stats.middle_50.0, stats.middle_50.1
        );
        println!(
            "  Middle 90%:  {:.2} - {:.2}",
            stats.middle_90.0, stats.middle_90.1
        );
        if let Some((low, high)) = nsigma_interval(&values, 2.0) {
            println!("  Mean ± 2σ:   {:.2} - {:.2}", low, high);
        }
    }
    Ok(())
}

fn run_correlate(args: &[String]) -> Result<()> {
    let (positional, options) = TableOptions::parse(args)?;
    let [path, period, max_delta] = positional.as_slice() else {
        bail!("correlate expects <table.csv> <period> <max_delta>");
    };
    let kind: PeriodKind = period.parse().map_err(anyhow::Error::msg)?;
    let max_delta: u32 = max_delta
        .parse()
        .with_context(|| format!("Invalid max_delta: {}", max_delta))?;

    let table = read_restricted_table(path, &options)?;
    let found = discover_correlations(&table, kind, max_delta, &CorrelationParams::default());

    println!("{} correlated pairs", found.len());
    for c in &found {
        let coefficients: Vec<String> = c
            .coefficients
            .iter()
            .map(|(coefficient, value)| format!("{:?}={:.3}", coefficient, value))
            .collect();
        println!(
            "  {} -> {} (+{} {}, n={}): {}",
            c.metric_a,
            c.metric_b,
            c.delta,
            kind.unit_label().to_lowercase(),
            c.datapoints,
            coefficients.join(" ")
        );
    }
    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let args: Vec<String> = std::env::args().collect();
    let rest = args.get(2..).unwrap_or_default();

    match args.get(1).map(String::as_str) {
        Some("extract") => run_extract(rest),
        Some("aggregate") => run_aggregate(rest),
        Some("stats") => run_stats(rest),
        Some("correlate") => run_correlate(rest),
        _ => {
            eprintln!("{}", USAGE);
            std::process::exit(2);
        }
    }
}
