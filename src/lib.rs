pub mod args;
pub mod dashboard;
pub mod dataset;
pub mod error;
pub mod excel;
pub mod filter;
pub mod growth;
pub mod loader;
pub mod metrics;
pub mod sqlite;
pub mod utils;

pub use args::Args;
pub use dashboard::{print_dashboard, run, run_dashboard, DashboardReport};
pub use dataset::{Dataset, Platform, SubscriberRecord};
pub use error::{DatasetError, MetricsError};
pub use filter::{filter, DateRange, FilteredView};
pub use growth::{compute_growth_series, compute_platform_series, CompetitorSeries, GrowthPoint};
pub use loader::load_dataset;
pub use metrics::{
    compute_normalized_shares, compute_period_metrics, Leader, PeriodMetrics, ShareRow, ShareTable,
    Shares,
};
