use chrono::NaiveDate;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

use crate::error::DatasetError;
use crate::filter::DateRange;

/// Social network tracked for every competitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Vk,
    Telegram,
    Instagram,
}

impl Platform {
    pub const ALL: [Platform; 3] = [Platform::Vk, Platform::Telegram, Platform::Instagram];

    pub fn label(&self) -> &'static str {
        match self {
            Platform::Vk => "VK",
            Platform::Telegram => "Telegram",
            Platform::Instagram => "Instagram",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One observation of a competitor's subscriber counts on a given date.
///
/// A `None` count means the value was not recorded, which is different from
/// a recorded zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriberRecord {
    pub competitor: String,
    pub date: NaiveDate,
    pub vk_count: Option<u64>,
    pub telegram_count: Option<u64>,
    pub instagram_count: Option<u64>,
}

impl SubscriberRecord {
    pub fn new(
        competitor: impl Into<String>,
        date: NaiveDate,
        vk_count: Option<u64>,
        telegram_count: Option<u64>,
        instagram_count: Option<u64>,
    ) -> Self {
        Self {
            competitor: competitor.into(),
            date,
            vk_count,
            telegram_count,
            instagram_count,
        }
    }

    pub fn count(&self, platform: Platform) -> Option<u64> {
        match platform {
            Platform::Vk => self.vk_count,
            Platform::Telegram => self.telegram_count,
            Platform::Instagram => self.instagram_count,
        }
    }
}

/// Immutable collection of subscriber records in load order.
///
/// Construction rejects empty competitor names and duplicate
/// `(competitor, date)` keys; nothing is merged.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    records: Vec<SubscriberRecord>,
}

impl Dataset {
    pub fn from_records(records: Vec<SubscriberRecord>) -> Result<Self, DatasetError> {
        {
            let mut seen: HashSet<(&str, NaiveDate)> = HashSet::with_capacity(records.len());
            for (index, record) in records.iter().enumerate() {
                if record.competitor.trim().is_empty() {
                    return Err(DatasetError::EmptyCompetitor { index });
                }
                if !seen.insert((record.competitor.as_str(), record.date)) {
                    return Err(DatasetError::DuplicateRecord {
                        competitor: record.competitor.clone(),
                        date: record.date,
                    });
                }
            }
        }

        Ok(Self { records })
    }

    pub fn records(&self) -> &[SubscriberRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Earliest and latest date present, or `None` for an empty dataset.
    pub fn date_bounds(&self) -> Option<DateRange> {
        let start = self.records.iter().map(|r| r.date).min()?;
        let end = self.records.iter().map(|r| r.date).max()?;
        Some(DateRange::new(start, end))
    }

    /// Distinct competitor names in the order they first appear.
    pub fn competitors(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.records
            .iter()
            .map(|r| r.competitor.as_str())
            .filter(|name| seen.insert(*name))
            .collect()
    }
}
