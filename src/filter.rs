use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeSet;
use tracing::debug;

use crate::dataset::{Dataset, SubscriberRecord};

/// Inclusive `[start, end]` range of calendar dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Pulls both ends inside `bounds`. An inverted range stays inverted.
    pub fn clamp_to(&self, bounds: DateRange) -> DateRange {
        DateRange {
            start: self.start.clamp(bounds.start, bounds.end),
            end: self.end.clamp(bounds.start, bounds.end),
        }
    }
}

/// Borrowed, read-only selection of dataset records in load order.
#[derive(Debug, Clone)]
pub struct FilteredView<'a> {
    range: DateRange,
    records: Vec<&'a SubscriberRecord>,
}

impl<'a> FilteredView<'a> {
    pub fn range(&self) -> DateRange {
        self.range
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a SubscriberRecord> + '_ {
        self.records.iter().copied()
    }

    pub fn latest_date(&self) -> Option<NaiveDate> {
        self.iter().map(|r| r.date).max()
    }

    /// Latest date strictly before `date`.
    pub fn previous_date(&self, date: NaiveDate) -> Option<NaiveDate> {
        self.iter().map(|r| r.date).filter(|d| *d < date).max()
    }

    pub fn rows_at(&self, date: NaiveDate) -> Vec<&'a SubscriberRecord> {
        self.iter().filter(|r| r.date == date).collect()
    }

    /// Records observed on the most recent date of the view.
    pub fn latest_rows(&self) -> Vec<&'a SubscriberRecord> {
        match self.latest_date() {
            Some(date) => self.rows_at(date),
            None => Vec::new(),
        }
    }
}

/// Narrows `dataset` to `range` and the competitors in `competitors`.
///
/// An empty competitor set selects nothing, and so does a range whose start
/// is after its end.
pub fn filter<'a>(
    dataset: &'a Dataset,
    range: DateRange,
    competitors: &BTreeSet<String>,
) -> FilteredView<'a> {
    let records: Vec<&SubscriberRecord> = dataset
        .records()
        .iter()
        .filter(|r| range.contains(r.date) && competitors.contains(&r.competitor))
        .collect();

    debug!(
        action = "filter",
        component = "filter_engine",
        start = %range.start,
        end = %range.end,
        competitors = competitors.len(),
        kept = records.len(),
        total = dataset.len(),
        "Filtered dataset"
    );

    FilteredView { range, records }
}
