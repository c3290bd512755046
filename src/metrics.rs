//! Point-in-time comparison metrics: current vs previous period totals,
//! per-platform leaders and each competitor's platform mix.

use chrono::NaiveDate;
use serde::Serialize;

use crate::dataset::{Platform, SubscriberRecord};
use crate::error::{availability, MetricsError};
use crate::filter::FilteredView;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Leader {
    pub competitor: String,
    pub value: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodMetrics {
    pub platform: Platform,
    pub current_date: NaiveDate,
    pub previous_date: Option<NaiveDate>,
    pub total_current: u128,
    pub total_previous: Option<u128>,
    /// Unrounded percent change, or the reason it is not available.
    #[serde(serialize_with = "availability::serialize")]
    pub pct_change: Result<f64, MetricsError>,
    pub leader: Option<Leader>,
}

impl PeriodMetrics {
    /// Percent change rounded to two decimals for display.
    pub fn pct_change_rounded(&self) -> Option<f64> {
        self.pct_change.ok().map(round2)
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Sum of the platform value over `rows`, skipping absent values.
///
/// Summed as u128 so that any number of u64 counts fits.
fn platform_total(rows: &[&SubscriberRecord], platform: Platform) -> u128 {
    rows.iter()
        .filter_map(|r| r.count(platform))
        .map(u128::from)
        .sum()
}

/// Percent change from `previous` to `current`, undefined when `previous` is zero.
pub fn percent_change(current: u128, previous: u128) -> Result<f64, MetricsError> {
    if previous == 0 {
        return Err(MetricsError::UndefinedRatio);
    }
    let previous = previous as f64;
    Ok((current as f64 - previous) / previous * 100.0)
}

/// Competitor with the highest value on `platform`.
///
/// Ties go to the row that comes first in load order; rows without a value
/// for the platform are ignored.
pub fn find_leader(rows: &[&SubscriberRecord], platform: Platform) -> Option<Leader> {
    let mut best: Option<(&SubscriberRecord, u64)> = None;
    for &row in rows {
        if let Some(value) = row.count(platform) {
            match best {
                Some((_, best_value)) if value <= best_value => {}
                _ => best = Some((row, value)),
            }
        }
    }
    best.map(|(row, value)| Leader {
        competitor: row.competitor.clone(),
        value,
    })
}

/// Compares the latest date in `view` with the one before it for `platform`.
///
/// Fails only when the view is empty. A missing previous period or a zero
/// previous total is reported through `pct_change`.
pub fn compute_period_metrics(
    view: &FilteredView<'_>,
    platform: Platform,
) -> Result<PeriodMetrics, MetricsError> {
    let current_date = view.latest_date().ok_or(MetricsError::NoData)?;
    let current_rows = view.rows_at(current_date);
    let total_current = platform_total(&current_rows, platform);
    let leader = find_leader(&current_rows, platform);

    let previous_date = view.previous_date(current_date);
    let (total_previous, pct_change) = match previous_date {
        Some(date) => {
            let total = platform_total(&view.rows_at(date), platform);
            (Some(total), percent_change(total_current, total))
        }
        None => (None, Err(MetricsError::NoPreviousPeriod)),
    };

    Ok(PeriodMetrics {
        platform,
        current_date,
        previous_date,
        total_current,
        total_previous,
        pct_change,
        leader,
    })
}

/// Percentage of one competitor's subscribers on each platform.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Shares {
    pub vk: Option<f64>,
    pub telegram: Option<f64>,
    pub instagram: Option<f64>,
}

impl Shares {
    pub fn get(&self, platform: Platform) -> Option<f64> {
        match platform {
            Platform::Vk => self.vk,
            Platform::Telegram => self.telegram,
            Platform::Instagram => self.instagram,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShareRow {
    pub competitor: String,
    pub date: NaiveDate,
    pub vk_count: Option<u64>,
    pub telegram_count: Option<u64>,
    pub instagram_count: Option<u64>,
    pub total: u128,
    #[serde(serialize_with = "availability::serialize")]
    pub shares: Result<Shares, MetricsError>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ShareTable {
    pub rows: Vec<ShareRow>,
}

fn share_row(row: &SubscriberRecord) -> ShareRow {
    let counts = Platform::ALL.map(|p| row.count(p));
    let total: u128 = counts.iter().flatten().map(|&v| u128::from(v)).sum();

    let shares = if counts.iter().all(Option::is_none) {
        Err(MetricsError::NoData)
    } else if total == 0 {
        Err(MetricsError::UndefinedRatio)
    } else {
        let share = |count: Option<u64>| count.map(|v| v as f64 / total as f64 * 100.0);
        Ok(Shares {
            vk: share(counts[0]),
            telegram: share(counts[1]),
            instagram: share(counts[2]),
        })
    };

    ShareRow {
        competitor: row.competitor.clone(),
        date: row.date,
        vk_count: row.vk_count,
        telegram_count: row.telegram_count,
        instagram_count: row.instagram_count,
        total,
        shares,
    }
}

/// Splits each competitor's total audience across the three platforms.
///
/// Rows with no recorded values report `NoData`; rows whose values sum to
/// zero report `UndefinedRatio`.
pub fn compute_normalized_shares(latest_rows: &[&SubscriberRecord]) -> ShareTable {
    ShareTable {
        rows: latest_rows.iter().map(|row| share_row(row)).collect(),
    }
}
