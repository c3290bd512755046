//! Spreadsheet reader for the legacy `.xlsx` export.
//!
//! The first worksheet is read. Its first row holds the headers, English or
//! Russian, in any column order. Empty cells are absent values and a `0` cell
//! is a real zero.

use anyhow::{Context, Result};
use calamine::{open_workbook_auto, Data, Reader};
use chrono::{Days, NaiveDate};
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info};

use crate::dataset::{Dataset, SubscriberRecord};
use crate::error::DatasetError;
use crate::loader::{checked_count, parse_date};

pub(crate) const EXCEL_EXTENSIONS: [&str; 4] = ["xlsx", "xlsm", "xls", "ods"];

const COMPETITOR_HEADERS: [&str; 2] = ["competitor", "конкурент"];
const DATE_HEADERS: [&str; 2] = ["date", "дата"];
const VK_HEADERS: [&str; 2] = ["vk", "вк"];
const TELEGRAM_HEADERS: [&str; 2] = ["telegram", "телеграмм"];
const INSTAGRAM_HEADERS: [&str; 2] = ["instagram", "инстаграмм"];

/// Spreadsheet dates count days from 1899-12-30.
fn excel_epoch() -> NaiveDate {
    NaiveDate::from_ymd_opt(1899, 12, 30).unwrap_or_default()
}

struct Columns {
    competitor: usize,
    date: usize,
    vk: usize,
    telegram: usize,
    instagram: usize,
}

fn find_column(header: &[Data], names: &[&str]) -> Result<usize> {
    header
        .iter()
        .position(|cell| {
            let label = cell.to_string().trim().to_lowercase();
            names.contains(&label.as_str())
        })
        .ok_or_else(|| anyhow::anyhow!("Missing column {:?} in spreadsheet header", names[0]))
}

impl Columns {
    fn from_header(header: &[Data]) -> Result<Self> {
        Ok(Self {
            competitor: find_column(header, &COMPETITOR_HEADERS)?,
            date: find_column(header, &DATE_HEADERS)?,
            vk: find_column(header, &VK_HEADERS)?,
            telegram: find_column(header, &TELEGRAM_HEADERS)?,
            instagram: find_column(header, &INSTAGRAM_HEADERS)?,
        })
    }
}

fn serial_to_date(serial: f64, line: usize) -> Result<NaiveDate, DatasetError> {
    let invalid = || DatasetError::InvalidDate {
        line,
        value: serial.to_string(),
    };
    if !serial.is_finite() || serial < 0.0 {
        return Err(invalid());
    }
    excel_epoch()
        .checked_add_days(Days::new(serial.trunc() as u64))
        .ok_or_else(invalid)
}

fn cell_date(cell: Option<&Data>, line: usize) -> Result<NaiveDate, DatasetError> {
    match cell {
        Some(Data::DateTime(dt)) => serial_to_date(dt.as_f64(), line),
        Some(Data::Float(f)) => serial_to_date(*f, line),
        Some(Data::Int(i)) => serial_to_date(*i as f64, line),
        Some(Data::String(s)) | Some(Data::DateTimeIso(s)) => parse_date(s, line),
        other => Err(DatasetError::InvalidDate {
            line,
            value: other.map(|c| c.to_string()).unwrap_or_default(),
        }),
    }
}

fn cell_count(
    cell: Option<&Data>,
    line: usize,
    column: &'static str,
) -> Result<Option<u64>, DatasetError> {
    let invalid = |value: String| DatasetError::InvalidCount {
        line,
        column,
        value,
    };
    match cell {
        None | Some(Data::Empty) => Ok(None),
        Some(Data::Int(i)) => checked_count(Some(*i), line, column),
        Some(Data::Float(f)) if f.fract() == 0.0 && f.is_finite() => {
            checked_count(Some(*f as i64), line, column)
        }
        Some(Data::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Data::String(s)) => match s.trim().parse::<i64>() {
            Ok(v) => checked_count(Some(v), line, column),
            Err(_) => Err(invalid(s.clone())),
        },
        Some(other) => Err(invalid(other.to_string())),
    }
}

pub fn load_excel_dataset(path: &Path) -> Result<Dataset> {
    let start_time = Instant::now();
    info!(action = "start", component = "excel_loader", path = ?path, "Loading dataset from spreadsheet");

    if !path.exists() {
        anyhow::bail!("Dataset file not found at {:?}", path);
    }

    let mut workbook =
        open_workbook_auto(path).with_context(|| format!("Failed to open workbook {:?}", path))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| anyhow::anyhow!("Workbook {:?} has no worksheets", path))?
        .with_context(|| format!("Failed to read first worksheet of {:?}", path))?;

    // Line numbers are 1-based sheet rows, like the CSV reader's.
    let first_row = range.start().map(|(row, _)| row as usize).unwrap_or(0);
    let mut rows = range.rows();
    let header = match rows.next() {
        Some(header) => header,
        None => anyhow::bail!("Worksheet in {:?} is empty", path),
    };
    let columns = Columns::from_header(header)?;
    debug!(action = "header", component = "excel_loader", first_row, "Spreadsheet columns resolved");

    let mut records = Vec::new();
    for (index, row) in rows.enumerate() {
        let line = first_row + index + 2;
        if row.iter().all(|cell| matches!(cell, Data::Empty)) {
            continue;
        }

        records.push(SubscriberRecord {
            competitor: row
                .get(columns.competitor)
                .map(|c| c.to_string().trim().to_string())
                .unwrap_or_default(),
            date: cell_date(row.get(columns.date), line)?,
            vk_count: cell_count(row.get(columns.vk), line, "vk")?,
            telegram_count: cell_count(row.get(columns.telegram), line, "telegram")?,
            instagram_count: cell_count(row.get(columns.instagram), line, "instagram")?,
        });
    }

    let dataset = Dataset::from_records(records)?;
    info!(
        action = "complete",
        component = "excel_loader",
        records = dataset.len(),
        duration_ms = start_time.elapsed().as_millis(),
        "Dataset loaded"
    );
    Ok(dataset)
}
