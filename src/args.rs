use chrono::NaiveDate;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

use crate::dataset::Platform;

/// Dashboard page to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Page {
    /// Side-by-side comparison of the selected competitors
    Compare,
    /// Growth statistics for a single competitor
    Competitor,
}

#[derive(Parser, Debug)]
#[command(
    name = "rivals",
    about = "Compare competitors' VK, Telegram and Instagram subscriber counts over time",
    version,
    long_about = None
)]
pub struct Args {
    /// Dataset file (.csv, or .db/.sqlite/.sqlite3)
    #[arg(short, long, default_value = "competitors.csv")]
    pub data: PathBuf,

    /// Table to read when the dataset is a SQLite database
    #[arg(long, default_value = "subscribers")]
    pub table: String,

    /// Page to render
    #[arg(long, value_enum, default_value_t = Page::Compare)]
    pub page: Page,

    /// First date of the period (YYYY-MM-DD), defaults to the earliest date
    #[arg(long)]
    pub start: Option<NaiveDate>,

    /// Last date of the period (YYYY-MM-DD), defaults to the latest date
    #[arg(long)]
    pub end: Option<NaiveDate>,

    /// Competitor to include (repeatable); all competitors when omitted
    #[arg(short, long = "competitor")]
    pub competitors: Vec<String>,

    /// Platform to report on (repeatable); all platforms when omitted
    #[arg(short, long = "platform", value_enum)]
    pub platforms: Vec<Platform>,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    pub fn selected_platforms(&self) -> Vec<Platform> {
        if self.platforms.is_empty() {
            return Platform::ALL.to_vec();
        }
        Platform::ALL
            .into_iter()
            .filter(|p| self.platforms.contains(p))
            .collect()
    }
}
