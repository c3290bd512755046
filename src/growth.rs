//! Period-over-period growth series for charting.
//!
//! `compute_growth_series` emits one point per record. The first point and
//! any point whose neighbour value is missing carry no growth values; a zero
//! predecessor leaves the percentage empty but keeps the absolute change.

use chrono::NaiveDate;
use serde::Serialize;

use crate::dataset::{Platform, SubscriberRecord};
use crate::filter::FilteredView;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GrowthPoint {
    pub date: NaiveDate,
    pub competitor: String,
    pub value: Option<u64>,
    pub abs_growth: Option<i64>,
    pub pct_growth: Option<f64>,
}

/// Records of `view` sorted by date; equal dates keep their load order.
fn sorted_by_date<'a>(view: &FilteredView<'a>) -> Vec<&'a SubscriberRecord> {
    let mut rows: Vec<&SubscriberRecord> = view.iter().collect();
    rows.sort_by_key(|r| r.date);
    rows
}

fn growth_between(previous: Option<u64>, current: Option<u64>) -> (Option<i64>, Option<f64>) {
    let (Some(previous), Some(current)) = (previous, current) else {
        return (None, None);
    };
    // Counts span the full u64 range, so the difference is taken in i128.
    let diff = i128::from(current) - i128::from(previous);
    let pct = if previous == 0 {
        None
    } else {
        Some(diff as f64 / previous as f64 * 100.0).filter(|p| p.is_finite())
    };
    (i64::try_from(diff).ok(), pct)
}

/// Growth of `platform` between consecutive records of `view`.
pub fn compute_growth_series(view: &FilteredView<'_>, platform: Platform) -> Vec<GrowthPoint> {
    let rows = sorted_by_date(view);
    let mut previous: Option<&SubscriberRecord> = None;

    rows.into_iter()
        .map(|row| {
            let value = row.count(platform);
            let (abs_growth, pct_growth) = match previous {
                Some(prev) => growth_between(prev.count(platform), value),
                None => (None, None),
            };
            previous = Some(row);
            GrowthPoint {
                date: row.date,
                competitor: row.competitor.clone(),
                value,
                abs_growth,
                pct_growth,
            }
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompetitorSeries {
    pub competitor: String,
    pub points: Vec<(NaiveDate, Option<u64>)>,
}

/// Raw subscriber counts on `platform`, one date-ordered series per
/// competitor in first-seen order.
pub fn compute_platform_series(view: &FilteredView<'_>, platform: Platform) -> Vec<CompetitorSeries> {
    let mut series: Vec<CompetitorSeries> = Vec::new();
    for row in sorted_by_date(view) {
        let point = (row.date, row.count(platform));
        match series.iter_mut().find(|s| s.competitor == row.competitor) {
            Some(existing) => existing.points.push(point),
            None => series.push(CompetitorSeries {
                competitor: row.competitor.clone(),
                points: vec![point],
            }),
        }
    }

    // Order series by first appearance in load order, not by first date.
    let order: Vec<&str> = {
        let mut seen = Vec::new();
        for row in view.iter() {
            if !seen.contains(&row.competitor.as_str()) {
                seen.push(row.competitor.as_str());
            }
        }
        seen
    };
    series.sort_by_key(|s| order.iter().position(|name| *name == s.competitor));
    series
}
