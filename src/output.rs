//! Output formatting and persistence for aggregate reports.
//!
//! Supports pretty-printing, JSON serialization, and CSV tables.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use csv::WriterBuilder;
use serde::Serialize;
use tracing::{debug, info};

use crate::analyzers::types::{AggregateReport, AverageRow, Distribution, ScoreGroup};

/// Writes any report using Rust's debug pretty-print format.
pub fn write_pretty<W: Write, T: std::fmt::Debug>(mut writer: W, value: &T) -> Result<()> {
    writeln!(writer, "{value:#?}")?;
    Ok(())
}

/// [`write_pretty`] to stdout.
pub fn print_pretty<T: std::fmt::Debug>(value: &T) -> Result<()> {
    write_pretty(std::io::stdout().lock(), value)
}

/// [`write_pretty`] to a file, creating parent directories.
pub fn save_pretty<T: std::fmt::Debug>(path: &Path, value: &T) -> Result<()> {
    create_parent(path)?;
    let file = fs::File::create(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    write_pretty(file, value)?;
    info!(path = %path.display(), "Report written");
    Ok(())
}

pub fn to_json<T: Serialize>(value: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

/// Writes a value as pretty-printed JSON to stdout.
pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = to_json(value)?;
    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{json}")?;
    Ok(())
}

/// Writes a value as pretty-printed JSON, creating parent directories.
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    create_parent(path)?;
    fs::write(path, to_json(value)?)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    info!(path = %path.display(), "JSON written");
    Ok(())
}

#[derive(Debug, Serialize)]
struct DistributionRecord<'a> {
    label: &'a str,
    count: usize,
    percentage: f64,
}

/// Writes one row per bucket: `label,count,percentage`.
pub fn write_distribution_csv<W: Write>(writer: W, distribution: &Distribution) -> Result<()> {
    let mut writer = WriterBuilder::new().has_headers(true).from_writer(writer);

    for bucket in &distribution.buckets {
        writer.serialize(DistributionRecord {
            label: &bucket.label,
            count: bucket.count,
            percentage: bucket.percentage,
        })?;
    }
    writer.flush()?;

    Ok(())
}

#[derive(Debug, Serialize)]
struct AverageRecord<'a> {
    respondent: &'a str,
    category: &'a str,
    question: &'a str,
    indicator: &'a str,
    average: f64,
    responses: usize,
    rating: &'a str,
    gauge: &'a str,
}

/// Writes one row per average group. Absent key parts are empty cells.
pub fn write_averages_csv<W: Write>(writer: W, rows: &[AverageRow]) -> Result<()> {
    let mut writer = WriterBuilder::new().has_headers(true).from_writer(writer);

    for row in rows {
        writer.serialize(AverageRecord {
            respondent: row.respondent.as_deref().unwrap_or_default(),
            category: row.category.as_deref().unwrap_or_default(),
            question: row.question.as_deref().unwrap_or_default(),
            indicator: row.indicator.as_deref().unwrap_or_default(),
            average: row.average,
            responses: row.responses,
            rating: row.rating.label(),
            gauge: row.gauge.label(),
        })?;
    }
    writer.flush()?;

    Ok(())
}

#[derive(Debug, Serialize)]
struct ScoreGroupRecord<'a> {
    group: &'a str,
    average: f64,
    records: usize,
    rating: &'a str,
    gauge: &'a str,
    fulfilled_pct: f64,
    status: &'a str,
}

/// Writes one row per score group, with its fulfillment status
/// ("Puas" above the satisfaction threshold, "Tidak Puas" otherwise).
pub fn write_score_groups_csv<W: Write>(writer: W, groups: &[ScoreGroup]) -> Result<()> {
    let mut writer = WriterBuilder::new().has_headers(true).from_writer(writer);

    for group in groups {
        writer.serialize(ScoreGroupRecord {
            group: &group.group,
            average: group.average,
            records: group.records,
            rating: group.rating.label(),
            gauge: group.gauge.label(),
            fulfilled_pct: group.fulfillment.fulfilled_pct,
            status: if group.fulfillment.satisfied {
                "Puas"
            } else {
                "Tidak Puas"
            },
        })?;
    }
    writer.flush()?;

    Ok(())
}

/// Writes `<stem>.distribution.csv` and `<stem>.averages.csv` next to each other.
pub fn write_report_csv(stem: &Path, report: &AggregateReport) -> Result<(PathBuf, PathBuf)> {
    let distribution_path = with_suffix(stem, ".distribution.csv");
    let averages_path = with_suffix(stem, ".averages.csv");
    create_parent(&distribution_path)?;
    debug!(stem = %stem.display(), "Writing report CSVs");

    let file = fs::File::create(&distribution_path)
        .with_context(|| format!("Failed to create {}", distribution_path.display()))?;
    write_distribution_csv(file, &report.distribution)?;

    let file = fs::File::create(&averages_path)
        .with_context(|| format!("Failed to create {}", averages_path.display()))?;
    write_averages_csv(file, &report.averages.rows)?;

    info!(
        distribution = %distribution_path.display(),
        averages = %averages_path.display(),
        "CSV report written"
    );
    Ok((distribution_path, averages_path))
}

/// Appends `suffix` to the whole file name, dots included.
fn with_suffix(stem: &Path, suffix: &str) -> PathBuf {
    let mut name = stem.as_os_str().to_owned();
    name.push(suffix);
    PathBuf::from(name)
}

fn create_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }
    Ok(())
}
