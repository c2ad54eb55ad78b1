//! Subcommand bodies and their terminal output.

use std::path::Path;
use std::time::Instant;

use outbreak_analysis::pipeline::{self, FieldScreen};
use outbreak_analysis::{AnalysisConfig, RunReport};
use outbreak_cli_utils::{MultiProgress, SamplingBar};
use outbreak_table::DayTable;
use outbreak_table::paths::{day_table_path, ensure_dir};

type CliResult = Result<(), Box<dyn std::error::Error>>;

pub fn days(config: &AnalysisConfig, catalog: &Path, top: usize) -> CliResult {
    let events = pipeline::load_events(catalog, config)?;
    let outbreaks = pipeline::classify(&events, config)?;
    let thresholds = outbreaks.thresholds();

    println!(
        "{} convective days from {} to {}: {} with >= {} events, {} with >= {}",
        outbreaks.total_days(),
        events.start,
        events.end,
        outbreaks.med_days().count(),
        thresholds.medium(),
        outbreaks.big_days().count(),
        thresholds.big(),
    );
    println!();
    println!(
        "{:<4} {:<12} {:>6} {:>12} {:>12} {:>5} {:>5}",
        "#", "DATE", "EVENTS", "ATE (J)", "MEDIAN (J)", "INJ", "FAT"
    );
    println!("{}", "-".repeat(62));
    for (rank, group) in outbreaks.top_by_energy(top).iter().enumerate() {
        let stats = &group.stats;
        println!(
            "{:<4} {:<12} {:>6} {:>12.3e} {:>12.3e} {:>5} {:>5}",
            rank + 1,
            stats.date.to_string(),
            stats.count,
            stats.total_energy,
            stats.median_energy,
            stats.injuries,
            stats.fatalities,
        );
    }
    Ok(())
}

pub async fn sample(
    config: &AnalysisConfig,
    catalog: &Path,
    output: &Path,
    multi: &MultiProgress,
) -> CliResult {
    let start = Instant::now();
    let events = pipeline::load_events(catalog, config)?;
    let outbreaks = pipeline::classify(&events, config)?;
    let plan = pipeline::plan_sampling(&outbreaks, &events, config)?;
    let source = pipeline::build_source(config)?;

    let progress = SamplingBar::new(multi, "Sampling");
    let table = pipeline::sample(source.as_ref(), plan, config, progress.as_ref()).await;

    ensure_dir(output)?;
    let path = day_table_path(output);
    table.save(&path)?;
    println!(
        "Wrote {} days to {} in {:.1}s",
        table.len(),
        path.display(),
        start.elapsed().as_secs_f64()
    );
    for (label, count) in table.status_counts() {
        println!("  {label:<14} {count}");
    }
    Ok(())
}

pub fn screen(config: &AnalysisConfig, table: &Path, output: &Path) -> CliResult {
    let table = DayTable::load(table)?;
    let screens = pipeline::run_screens(&table, config)?;
    pipeline::write_screens(output, &screens)?;
    print_screens(&screens);
    Ok(())
}

pub fn trend(config: &AnalysisConfig, catalog: &Path, output: &Path) -> CliResult {
    let events = pipeline::load_events(catalog, config)?;
    let outbreaks = pipeline::classify(&events, config)?;
    let trends = pipeline::annual_trends(&outbreaks, &events)?;
    pipeline::write_annual(output, &trends)?;

    println!(
        "{:<24} {:>12} {:>8} {:>8} {:>4}",
        "SERIES", "SLOPE/YR", "R", "P", "N"
    );
    println!("{}", "-".repeat(60));
    for (name, trend) in &trends.trends {
        println!(
            "{name:<24} {:>12.4} {:>8.3} {:>8.4} {:>4}",
            trend.slope, trend.r, trend.p_value, trend.n
        );
    }
    Ok(())
}

fn print_screens(screens: &[FieldScreen]) {
    println!(
        "{:<16} {:>4} {:>8} {:>12} {:>12}",
        "COLUMN", "N", "MAX |R|", "ANGLE", "SIGNIFICANT"
    );
    println!("{}", "-".repeat(56));
    for field in screens {
        let profile = &field.profile;
        let angles: Vec<String> = profile
            .max_abs_angles()
            .iter()
            .map(|a| format!("{a}"))
            .collect();
        println!(
            "{:<16} {:>4} {:>8.3} {:>12} {:>12}",
            field.column,
            profile.n,
            profile.max_abs_r().unwrap_or(f64::NAN),
            angles.join(","),
            profile.significant().len(),
        );
    }
}

pub fn print_report(report: &RunReport) {
    println!(
        "{} events, {} medium days, {} outbreak days, {} baseline days",
        report.events, report.medium_days, report.outbreak_days, report.baseline_days
    );
    for (label, count) in &report.status_counts {
        println!("  {label:<14} {count}");
    }
    if !report.missing.is_empty() {
        println!();
        println!("Missing days:");
        for day in &report.missing {
            println!("  {} {:<9} {}", day.date, day.kind.to_string(), day.reason);
        }
    }
    if !report.screens.is_empty() {
        println!();
        for screen in &report.screens {
            match screen.max_abs_r {
                Some(r) => println!(
                    "  {:<16} max |r| {r:.3} at {:?} (n = {})",
                    screen.column, screen.angles, screen.n
                ),
                None => println!("  {:<16} undefined (n = {})", screen.column, screen.n),
            }
        }
    }
}
