use anyhow::{Context, Result};
use rusqlite::{Connection, OpenFlags, Result as SqliteResult};
use std::path::Path;
use std::time::Instant;
use tracing::info;

use crate::dataset::{Dataset, SubscriberRecord};
use crate::loader::{checked_count, parse_date};

/// Raw row as stored; counts are signed in SQLite and checked on conversion.
struct StoredRow {
    competitor: String,
    date: String,
    vk: Option<i64>,
    telegram: Option<i64>,
    instagram: Option<i64>,
}

fn is_valid_table_name(table: &str) -> bool {
    !table.is_empty() && table.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Reads subscriber records from `table`, in rowid order.
///
/// NULL counts become absent values.
pub fn load_sqlite_dataset(path: &Path, table: &str) -> Result<Dataset> {
    let start_time = Instant::now();
    info!(action = "start", component = "sqlite_loader", path = ?path, table = table, "Loading dataset from SQLite");

    if !is_valid_table_name(table) {
        anyhow::bail!("Invalid table name '{}'", table);
    }
    if !path.exists() {
        anyhow::bail!("Dataset file not found at {:?}", path);
    }

    let conn = Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY)
        .with_context(|| format!("Failed to open SQLite database {:?}", path))?;

    let query = format!(
        "SELECT competitor, date, vk, telegram, instagram FROM {} ORDER BY rowid",
        table
    );
    let rows: Vec<StoredRow> = conn
        .prepare(&query)
        .with_context(|| format!("Failed to query table '{}'", table))?
        .query_map([], |row| {
            Ok(StoredRow {
                competitor: row.get(0)?,
                date: row.get(1)?,
                vk: row.get(2)?,
                telegram: row.get(3)?,
                instagram: row.get(4)?,
            })
        })?
        .collect::<SqliteResult<Vec<StoredRow>>>()?;

    let query_time = start_time.elapsed();
    info!(
        action = "query",
        component = "sqlite_loader",
        row_count = rows.len(),
        duration_ms = query_time.as_millis(),
        "Fetched subscriber rows"
    );

    let mut records = Vec::with_capacity(rows.len());
    for (index, row) in rows.into_iter().enumerate() {
        let line = index + 1;
        records.push(SubscriberRecord {
            competitor: row.competitor.trim().to_string(),
            date: parse_date(&row.date, line)?,
            vk_count: checked_count(row.vk, line, "vk")?,
            telegram_count: checked_count(row.telegram, line, "telegram")?,
            instagram_count: checked_count(row.instagram, line, "instagram")?,
        });
    }

    let dataset = Dataset::from_records(records)?;
    info!(
        action = "complete",
        component = "sqlite_loader",
        records = dataset.len(),
        duration_ms = start_time.elapsed().as_millis(),
        "Dataset loaded"
    );
    Ok(dataset)
}
