use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::Deserialize;
use std::fs::File;
use std::path::Path;
use std::time::Instant;
use tracing::info;

use crate::dataset::{Dataset, SubscriberRecord};
use crate::error::DatasetError;
use crate::excel::{self, EXCEL_EXTENSIONS};
use crate::sqlite;

const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%d.%m.%Y"];
const SQLITE_EXTENSIONS: [&str; 3] = ["db", "sqlite", "sqlite3"];

/// Column layout of the CSV export. The Russian headers of the legacy
/// spreadsheet are accepted as aliases.
#[derive(Debug, Deserialize)]
struct CsvRow {
    #[serde(alias = "Конкурент")]
    competitor: String,
    #[serde(alias = "Дата")]
    date: String,
    #[serde(alias = "ВК")]
    vk: Option<i64>,
    #[serde(alias = "Телеграмм")]
    telegram: Option<i64>,
    #[serde(alias = "Инстаграмм")]
    instagram: Option<i64>,
}

/// Parses `YYYY-MM-DD` or `DD.MM.YYYY`; a trailing time part is dropped.
pub fn parse_date(raw: &str, line: usize) -> Result<NaiveDate, DatasetError> {
    let trimmed = raw.trim();
    let date_part = trimmed.split([' ', 'T']).next().unwrap_or(trimmed);

    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(date_part, fmt).ok())
        .ok_or_else(|| DatasetError::InvalidDate {
            line,
            value: raw.to_string(),
        })
}

pub(crate) fn checked_count(
    value: Option<i64>,
    line: usize,
    column: &'static str,
) -> Result<Option<u64>, DatasetError> {
    match value {
        Some(v) if v < 0 => Err(DatasetError::NegativeCount {
            line,
            column,
            value: v,
        }),
        other => Ok(other.map(|v| v as u64)),
    }
}

pub fn load_csv_dataset(path: &Path) -> Result<Dataset> {
    let start_time = Instant::now();
    info!(action = "start", component = "csv_loader", path = ?path, "Loading dataset from CSV");

    if !path.exists() {
        anyhow::bail!("Dataset file not found at {:?}", path);
    }

    let file = File::open(path).with_context(|| format!("Failed to open {:?}", path))?;
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(file);
    let headers = reader
        .headers()
        .context("Failed to read CSV header")?
        .clone();

    let mut records = Vec::new();
    for result in reader.records() {
        let raw = result.context("Failed to read CSV record")?;
        let line = raw.position().map(|p| p.line() as usize).unwrap_or(0);
        let row: CsvRow = raw
            .deserialize(Some(&headers))
            .with_context(|| format!("line {}: malformed row", line))?;

        records.push(SubscriberRecord {
            competitor: row.competitor,
            date: parse_date(&row.date, line)?,
            vk_count: checked_count(row.vk, line, "vk")?,
            telegram_count: checked_count(row.telegram, line, "telegram")?,
            instagram_count: checked_count(row.instagram, line, "instagram")?,
        });
    }

    let dataset = Dataset::from_records(records)?;
    info!(
        action = "complete",
        component = "csv_loader",
        records = dataset.len(),
        duration_ms = start_time.elapsed().as_millis(),
        "Dataset loaded"
    );
    Ok(dataset)
}

fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| extensions.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

fn is_sqlite_path(path: &Path) -> bool {
    has_extension(path, &SQLITE_EXTENSIONS)
}

/// Loads the dataset, choosing the reader from the file extension.
pub fn load_dataset(path: &Path, table: &str) -> Result<Dataset> {
    if is_sqlite_path(path) {
        sqlite::load_sqlite_dataset(path, table)
    } else if has_extension(path, &EXCEL_EXTENSIONS) {
        excel::load_excel_dataset(path)
    } else {
        load_csv_dataset(path)
    }
}
