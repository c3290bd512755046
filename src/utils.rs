use time::macros::format_description;
use tracing_subscriber::fmt::time::LocalTime;
use tracing_subscriber::EnvFilter;

use crate::args::{Args, Page};
use crate::error::MetricsError;

/// Logs go to stderr so `--json` output stays clean. `RUST_LOG` wins over
/// the verbosity flag.
pub fn setup_logging(verbose: bool) {
    let default_level = if verbose { "info" } else { "error" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let timer = LocalTime::new(format_description!(
        "[hour]:[minute]:[second].[subsecond digits:3]"
    ));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_timer(timer)
        .with_writer(std::io::stderr)
        .init();
}

pub fn format_number(num: u128) -> String {
    let digits = num.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

pub fn format_signed(num: i64) -> String {
    let sign = if num < 0 { '-' } else { '+' };
    format!("{}{}", sign, format_number(u128::from(num.unsigned_abs())))
}

pub fn format_count(value: Option<u64>) -> String {
    value
        .map(|v| format_number(u128::from(v)))
        .unwrap_or_else(|| "-".to_string())
}

pub fn format_pct(value: Option<f64>, decimals: usize) -> String {
    match value {
        Some(v) => format!("{:+.*}%", decimals, v),
        None => "n/a".to_string(),
    }
}

/// Short reason shown in place of an unavailable number.
pub fn describe_unavailable(err: MetricsError) -> &'static str {
    match err {
        MetricsError::NoData => "n/a (no data)",
        MetricsError::NoPreviousPeriod => "n/a (no previous period)",
        MetricsError::UndefinedRatio => "n/a (previous total is zero)",
    }
}

pub fn validate_args(args: &Args) -> anyhow::Result<()> {
    if let (Some(start), Some(end)) = (args.start, args.end) {
        if start > end {
            anyhow::bail!("--start ({}) must not be after --end ({})", start, end);
        }
    }

    if args.table.trim().is_empty() {
        anyhow::bail!("--table must not be empty");
    }

    if args.page == Page::Competitor && args.competitors.len() != 1 {
        anyhow::bail!("--page competitor needs exactly one --competitor");
    }

    if args.competitors.iter().any(|c| c.trim().is_empty()) {
        anyhow::bail!("--competitor must not be empty");
    }

    Ok(())
}
