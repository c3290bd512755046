use anyhow::Result;
use serde::Serialize;
use std::collections::BTreeSet;
use std::time::Instant;
use tracing::{info, warn};

use crate::dataset::{Dataset, Platform};
use crate::error::{availability, MetricsError};
use crate::filter::{filter, DateRange};
use crate::growth::{compute_growth_series, compute_platform_series, CompetitorSeries, GrowthPoint};
use crate::metrics::{compute_normalized_shares, compute_period_metrics, PeriodMetrics, ShareTable};
use crate::utils::{
    describe_unavailable, format_count, format_number, format_pct, format_signed, validate_args,
};
use crate::args::Page;
use crate::{loader, Args};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlatformSection {
    pub platform: Platform,
    #[serde(serialize_with = "availability::serialize")]
    pub metrics: Result<PeriodMetrics, MetricsError>,
    /// Raw subscriber counts per competitor, for the dynamics chart.
    pub series: Vec<CompetitorSeries>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonPage {
    pub range: DateRange,
    pub competitors: Vec<String>,
    pub records: usize,
    pub platforms: Vec<PlatformSection>,
    pub shares: ShareTable,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GrowthSection {
    pub platform: Platform,
    #[serde(serialize_with = "availability::serialize")]
    pub metrics: Result<PeriodMetrics, MetricsError>,
    pub growth: Vec<GrowthPoint>,
    pub series: Vec<CompetitorSeries>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompetitorPage {
    pub range: DateRange,
    pub competitor: String,
    pub records: usize,
    pub platforms: Vec<GrowthSection>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "page", rename_all = "snake_case")]
pub enum DashboardReport {
    Compare(ComparisonPage),
    Competitor(CompetitorPage),
}

/// Metrics, leaders, shares and dynamics for a set of competitors.
pub fn build_comparison_page(
    dataset: &Dataset,
    range: DateRange,
    competitors: &BTreeSet<String>,
    platforms: &[Platform],
) -> ComparisonPage {
    let view = filter(dataset, range, competitors);

    let sections = platforms
        .iter()
        .map(|&platform| PlatformSection {
            platform,
            metrics: compute_period_metrics(&view, platform),
            series: compute_platform_series(&view, platform),
        })
        .collect();

    ComparisonPage {
        range,
        competitors: competitors.iter().cloned().collect(),
        records: view.len(),
        platforms: sections,
        shares: compute_normalized_shares(&view.latest_rows()),
    }
}

/// Metrics and growth series for one competitor.
pub fn build_competitor_page(
    dataset: &Dataset,
    range: DateRange,
    competitor: &str,
    platforms: &[Platform],
) -> CompetitorPage {
    let selection = BTreeSet::from([competitor.to_string()]);
    let view = filter(dataset, range, &selection);

    let sections = platforms
        .iter()
        .map(|&platform| GrowthSection {
            platform,
            metrics: compute_period_metrics(&view, platform),
            growth: compute_growth_series(&view, platform),
            series: compute_platform_series(&view, platform),
        })
        .collect();

    CompetitorPage {
        range,
        competitor: competitor.to_string(),
        records: view.len(),
        platforms: sections,
    }
}

/// Turns the optional `--start`/`--end` into a range inside the dataset bounds.
pub fn resolve_range(dataset: &Dataset, args: &Args) -> Result<DateRange> {
    let bounds = match dataset.date_bounds() {
        Some(bounds) => bounds,
        None => anyhow::bail!("Dataset {:?} contains no records", args.data),
    };
    let requested = DateRange::new(
        args.start.unwrap_or(bounds.start),
        args.end.unwrap_or(bounds.end),
    );
    let range = requested.clamp_to(bounds);
    if range != requested {
        info!(action = "clamp", component = "dashboard", start = %range.start, end = %range.end, "Requested period clamped to dataset bounds");
    }
    Ok(range)
}

/// Competitors named on the command line, or every competitor when none are.
pub fn resolve_competitors(dataset: &Dataset, args: &Args) -> BTreeSet<String> {
    let known = dataset.competitors();
    if args.competitors.is_empty() {
        return known.into_iter().map(String::from).collect();
    }
    for name in &args.competitors {
        if !known.contains(&name.as_str()) {
            warn!(action = "resolve", component = "dashboard", competitor = %name, "Competitor not present in dataset");
        }
    }
    args.competitors.iter().cloned().collect()
}

pub fn run_dashboard(args: &Args) -> Result<DashboardReport> {
    let total_start_time = Instant::now();
    info!(action = "start", component = "dashboard", page = ?args.page, "Building dashboard");

    let dataset = loader::load_dataset(&args.data, &args.table)?;
    let range = resolve_range(&dataset, args)?;
    let competitors = resolve_competitors(&dataset, args);
    let platforms = args.selected_platforms();

    let report = match args.page {
        Page::Compare => DashboardReport::Compare(build_comparison_page(
            &dataset,
            range,
            &competitors,
            &platforms,
        )),
        Page::Competitor => {
            let name = competitors
                .iter()
                .next()
                .ok_or_else(|| anyhow::anyhow!("--page competitor needs a --competitor"))?;
            DashboardReport::Competitor(build_competitor_page(&dataset, range, name, &platforms))
        }
    };

    info!(
        action = "complete",
        component = "dashboard",
        duration_ms = total_start_time.elapsed().as_millis(),
        "Dashboard built"
    );
    Ok(report)
}

fn print_metrics_line(platform: Platform, metrics: &Result<PeriodMetrics, MetricsError>, with_leader: bool) {
    let m = match metrics {
        Ok(m) => m,
        Err(e) => {
            println!("- {}: {}", platform, describe_unavailable(*e));
            return;
        }
    };

    let delta = match m.pct_change {
        Ok(_) => format_pct(m.pct_change_rounded(), 2),
        Err(e) => describe_unavailable(e).to_string(),
    };
    print!(
        "- {}: {} subscribers ({})",
        platform,
        format_number(m.total_current),
        delta
    );
    if with_leader {
        match &m.leader {
            Some(leader) => print!(" | leader: {} ({})", leader.competitor, format_number(leader.value.into())),
            None => print!(" | leader: n/a"),
        }
    }
    println!();
}

fn print_comparison(page: &ComparisonPage) {
    println!("\n--- Competitor comparison ---");
    println!(
        "Period: {} to {} ({} competitors, {} records)",
        page.range.start,
        page.range.end,
        page.competitors.len(),
        format_number(page.records as u128)
    );

    println!("\nKey metrics:");
    for section in &page.platforms {
        print_metrics_line(section.platform, &section.metrics, true);
    }

    if let Some(first) = page.shares.rows.first() {
        println!("\nPlatform shares on {}:", first.date);
    }
    for row in &page.shares.rows {
        match &row.shares {
            Ok(shares) => {
                let parts: Vec<String> = page
                    .platforms
                    .iter()
                    .map(|s| {
                        let count = match s.platform {
                            Platform::Vk => row.vk_count,
                            Platform::Telegram => row.telegram_count,
                            Platform::Instagram => row.instagram_count,
                        };
                        let share = shares
                            .get(s.platform)
                            .map(|v| format!("{:.1}%", v))
                            .unwrap_or_else(|| "n/a".to_string());
                        format!("{} {} ({})", s.platform, format_count(count), share)
                    })
                    .collect();
                println!("- {}: {}", row.competitor, parts.join(", "));
            }
            Err(e) => println!("- {}: {}", row.competitor, describe_unavailable(*e)),
        }
    }
}

fn print_competitor(page: &CompetitorPage) {
    println!("\n--- {} statistics ---", page.competitor);
    println!(
        "Period: {} to {} ({} records)",
        page.range.start,
        page.range.end,
        format_number(page.records as u128)
    );

    println!("\nKey metrics:");
    for section in &page.platforms {
        print_metrics_line(section.platform, &section.metrics, false);
    }

    for section in &page.platforms {
        println!("\nGrowth in {}:", section.platform);
        for point in &section.growth {
            match point.abs_growth {
                Some(abs) => println!(
                    "- {}: {} ({}, {})",
                    point.date,
                    format_count(point.value),
                    format_signed(abs),
                    format_pct(point.pct_growth, 1)
                ),
                None => println!("- {}: {}", point.date, format_count(point.value)),
            }
        }
    }
}

/// Validates `args`, builds the requested page and prints it. Every failure
/// comes back as one error for the caller to report.
pub fn run(args: &Args) -> Result<()> {
    validate_args(args)?;
    let report = run_dashboard(args)?;
    print_dashboard(&report, args.json)
}

pub fn print_dashboard(report: &DashboardReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }
    match report {
        DashboardReport::Compare(page) => print_comparison(page),
        DashboardReport::Competitor(page) => print_competitor(page),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::tests::{day, rec};
    use clap::Parser;

    fn dataset() -> Dataset {
        Dataset::from_records(vec![
            rec("A", 1, Some(100), Some(10), Some(0)),
            rec("B", 1, Some(500), Some(20), Some(5)),
            rec("A", 2, Some(150), Some(30), Some(0)),
            rec("B", 2, Some(500), Some(10), Some(5)),
        ])
        .unwrap()
    }

    #[test]
    fn range_defaults_to_dataset_bounds_and_clamps() {
        let data = dataset();
        let args = Args::parse_from(["rivals"]);
        assert_eq!(resolve_range(&data, &args).unwrap(), DateRange::new(day(1), day(2)));

        let args = Args::parse_from(["rivals", "--start", "2024-02-01", "--end", "2024-03-01"]);
        assert_eq!(resolve_range(&data, &args).unwrap(), DateRange::new(day(1), day(1)));
    }

    #[test]
    fn empty_dataset_has_no_range() {
        let args = Args::parse_from(["rivals"]);
        assert!(resolve_range(&Dataset::default(), &args).is_err());
    }

    #[test]
    fn no_competitor_flag_selects_everyone() {
        let data = dataset();
        let args = Args::parse_from(["rivals"]);
        let selected: Vec<String> = resolve_competitors(&data, &args).into_iter().collect();
        assert_eq!(selected, vec!["A".to_string(), "B".to_string()]);
    }

    #[test]
    fn comparison_page_reports_each_platform() {
        let data = dataset();
        let all = resolve_competitors(&data, &Args::parse_from(["rivals"]));
        let page = build_comparison_page(&data, DateRange::new(day(1), day(2)), &all, &Platform::ALL);

        assert_eq!(page.records, 4);
        assert_eq!(page.platforms.len(), 3);

        let vk = page.platforms[0].metrics.as_ref().unwrap();
        assert_eq!(vk.total_current, 650);
        assert_eq!(vk.leader.as_ref().unwrap().competitor, "B");

        let ig = page.platforms[2].metrics.as_ref().unwrap();
        assert_eq!(ig.pct_change, Ok(0.0));

        assert_eq!(page.shares.rows.len(), 2);
        assert_eq!(page.platforms[0].series.len(), 2);
    }

    #[test]
    fn competitor_page_tracks_growth() {
        let data = dataset();
        let page = build_competitor_page(&data, DateRange::new(day(1), day(2)), "A", &[Platform::Telegram]);

        assert_eq!(page.records, 2);
        let section = &page.platforms[0];
        assert_eq!(section.growth.len(), 2);
        assert_eq!(section.growth[1].abs_growth, Some(20));
        assert_eq!(section.growth[1].pct_growth, Some(200.0));
    }

    #[test]
    fn unknown_competitor_gives_empty_page_not_error() {
        let data = dataset();
        let page = build_competitor_page(&data, DateRange::new(day(1), day(2)), "Nobody", &[Platform::Vk]);

        assert_eq!(page.records, 0);
        assert_eq!(page.platforms[0].metrics, Err(MetricsError::NoData));
        assert!(page.platforms[0].growth.is_empty());
    }

    #[test]
    fn json_output_marks_unavailable_values() {
        let data = dataset();
        let page = build_competitor_page(&data, DateRange::new(day(1), day(1)), "A", &[Platform::Vk]);
        let json = serde_json::to_value(DashboardReport::Competitor(page)).unwrap();

        assert_eq!(json["page"], "competitor");
        let metrics = &json["platforms"][0]["metrics"];
        assert_eq!(metrics["status"], "ok");
        assert_eq!(metrics["value"]["total_current"], 100);
        assert_eq!(metrics["value"]["pct_change"], serde_json::json!({"status": "no_previous_period"}));
    }

    #[test]
    fn json_output_marks_missing_metrics_and_shares() {
        let data = Dataset::from_records(vec![
            rec("A", 1, None, None, None),
            rec("B", 1, Some(0), Some(0), None),
        ])
        .unwrap();
        let page = build_competitor_page(&data, DateRange::new(day(1), day(1)), "Nobody", &[Platform::Vk]);
        let json = serde_json::to_value(DashboardReport::Competitor(page)).unwrap();
        assert_eq!(json["platforms"][0]["metrics"], serde_json::json!({"status": "no_data"}));

        let all = resolve_competitors(&data, &Args::parse_from(["rivals"]));
        let page = build_comparison_page(&data, DateRange::new(day(1), day(1)), &all, &[Platform::Vk]);
        let json = serde_json::to_value(DashboardReport::Compare(page)).unwrap();
        assert_eq!(json["shares"]["rows"][0]["shares"], serde_json::json!({"status": "no_data"}));
        assert_eq!(json["shares"]["rows"][1]["shares"], serde_json::json!({"status": "undefined_ratio"}));
    }

    #[test]
    fn invalid_arguments_fail_through_run_before_loading() {
        let dir = tempfile::TempDir::new().unwrap();
        let missing = dir.path().join("absent.csv");
        let data = missing.to_str().unwrap();

        let args = Args::parse_from(["rivals", "-d", data, "--start", "2024-03-10", "--end", "2024-03-01"]);
        let err = run(&args).unwrap_err();
        assert!(err.to_string().contains("--start"));

        // Valid arguments get as far as the loader and fail there instead
        let args = Args::parse_from(["rivals", "-d", data]);
        let err = run(&args).unwrap_err();
        assert!(err.to_string().contains("not found"));
    }
}
