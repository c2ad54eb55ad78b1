//! Analysis stages and the run that chains them.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use chrono::{Datelike as _, NaiveDate};
use outbreak_correlation::{LinearTrend, ScreenProfile, linear_trend, log_standardize, screen};
use outbreak_days::{
    DayGroup, OutbreakAggregator, Outbreaks, YearSummary, annual_summaries, convective_day,
};
use outbreak_energy::{EnergyModel, NormalizationReport, normalize};
use outbreak_environment::{
    BaselineSampler, BatchOptions, DayRequest, DirectoryGridSource, EnvironmentalSampler,
    GridSource, HttpGridSource, ProgressCallback, month_weights, sample_days,
};
use outbreak_environment_models::{DayKind, SampleStatus, sample_column};
use outbreak_event_models::{RawEvent, TaggedEvent};
use outbreak_spatial::{AlbersEqualArea, hull_for_events};
use outbreak_table::paths::{
    annual_summary_path, day_table_path, ensure_dir, screen_profile_path, screens_dir,
};
use outbreak_table::{DayRecord, DayTable, write_annual_summaries, write_screen_profile};
use rand::SeedableRng as _;
use rand::rngs::StdRng;

use crate::config::GridSourceConfig;
use crate::{AnalysisConfig, AnalysisError, RunReport};

/// Footprint label of baseline rows.
pub const REGION_FOOTPRINT: &str = "region";

// ── Events ───────────────────────────────────────────────────────────────

/// Energy-tagged events inside the study interval.
#[derive(Debug, Clone)]
pub struct PreparedEvents {
    pub events: Vec<TaggedEvent>,
    /// First convective day studied.
    pub start: NaiveDate,
    /// Last convective day studied.
    pub end: NaiveDate,
    pub normalization: NormalizationReport,
}

impl PreparedEvents {
    /// Calendar years spanned by the study interval.
    #[must_use]
    pub fn years(&self) -> std::ops::RangeInclusive<i32> {
        self.start.year()..=self.end.year()
    }
}

/// Normalizes the whole catalog, tags each event with its energy, and keeps
/// the events whose convective day is in the study interval.
///
/// Normalization runs over every record so catalog-wide minimums do not
/// depend on the interval.
///
/// # Errors
///
/// Returns [`AnalysisError::Energy`] for out-of-range ratings,
/// [`AnalysisError::InvalidConfig`] if the catalog is empty and no interval
/// is configured, and [`AnalysisError::NoEvents`] if the interval holds no
/// events.
pub fn prepare_events(
    raw: &[RawEvent],
    config: &AnalysisConfig,
) -> Result<PreparedEvents, AnalysisError> {
    let (events, normalization) = normalize(raw, &config.normalize_options())?;

    let days = || events.iter().map(|e| convective_day(e.timestamp));
    let (Some(start), Some(end)) = (
        config.study.start.or_else(|| days().min()),
        config.study.end.or_else(|| days().max()),
    ) else {
        return Err(AnalysisError::InvalidConfig {
            message: "the catalog is empty and no study interval is configured".to_string(),
        });
    };

    let in_study: Vec<_> = events
        .into_iter()
        .filter(|e| (start..=end).contains(&convective_day(e.timestamp)))
        .collect();
    if in_study.is_empty() {
        return Err(AnalysisError::NoEvents { start, end });
    }

    let events = EnergyModel::new().tag(in_study)?;
    log::info!("{} events between {start} and {end}", events.len());

    Ok(PreparedEvents {
        events,
        start,
        end,
        normalization,
    })
}

/// Reads the catalog at `path`. Skipped rows are counted and logged by
/// the reader.
///
/// # Errors
///
/// Returns [`AnalysisError::Ingest`] if the catalog cannot be read.
pub fn read_catalog(path: &Path) -> Result<Vec<RawEvent>, AnalysisError> {
    let (raw, _report) = outbreak_ingest::load_catalog(path)?;
    Ok(raw)
}

/// Reads the catalog at `path` and prepares its events.
///
/// # Errors
///
/// See [`read_catalog`] and [`prepare_events`].
pub fn load_events(path: &Path, config: &AnalysisConfig) -> Result<PreparedEvents, AnalysisError> {
    prepare_events(&read_catalog(path)?, config)
}

/// Groups events into convective days and keeps the outbreak days.
///
/// # Errors
///
/// Returns [`AnalysisError::InvalidConfig`] for inconsistent thresholds and
/// [`AnalysisError::Days`] if a retained day has non-positive energy.
pub fn classify(
    events: &PreparedEvents,
    config: &AnalysisConfig,
) -> Result<Outbreaks, AnalysisError> {
    let aggregator = OutbreakAggregator::new(config.thresholds()?);
    Ok(aggregator.aggregate(events.events.clone())?)
}

// ── Sampling plan ────────────────────────────────────────────────────────

/// A table row and, unless planning already failed, the request that
/// samples it.
#[derive(Debug, Clone)]
pub struct PlannedDay {
    pub record: DayRecord,
    pub request: Option<DayRequest>,
}

/// Every day to sample: big outbreak days in date order, then baseline days
/// in date order.
#[derive(Debug, Clone, Default)]
pub struct SamplingPlan {
    pub days: Vec<PlannedDay>,
}

impl SamplingPlan {
    /// Requests to hand to the batch sampler, in plan order.
    #[must_use]
    pub fn requests(&self) -> Vec<DayRequest> {
        self.days.iter().filter_map(|d| d.request.clone()).collect()
    }

    /// Number of planned days of `kind`.
    #[must_use]
    pub fn count(&self, kind: DayKind) -> usize {
        self.days.iter().filter(|d| d.record.kind == kind).count()
    }
}

/// Builds a footprint for every big day and draws the baseline days.
///
/// A big day whose footprint cannot be built is kept as a missing row.
/// Baseline days follow the month distribution of big days, avoid every
/// medium day, and share the configured region as their footprint.
///
/// # Errors
///
/// Returns [`AnalysisError::Spatial`] if the sampling region cannot be
/// loaded and [`AnalysisError::Sampling`] if the baseline draw fails.
pub fn plan_sampling(
    outbreaks: &Outbreaks,
    events: &PreparedEvents,
    config: &AnalysisConfig,
) -> Result<SamplingPlan, AnalysisError> {
    let projection = AlbersEqualArea::conus();
    let mut days: Vec<PlannedDay> = outbreaks
        .big_days()
        .map(|group| plan_outbreak_day(group, &projection, config))
        .collect();

    let baseline_count = config.sampling.baseline_days;
    if baseline_count == 0 {
        log::info!("No baseline days requested");
    } else if days.is_empty() {
        log::warn!("No big outbreak days, so no month distribution to draw baseline days from");
    } else {
        let weights = month_weights(&outbreaks.big_day_month_counts())?;
        let sampler =
            BaselineSampler::new(events.start, events.end, &weights, outbreaks.med_dates())?;
        let mut rng = StdRng::seed_from_u64(config.sampling.seed);
        let dates = sampler.draw(baseline_count, &mut rng)?;

        let region = Arc::new(config.sampling.region.footprint(&projection)?);
        days.extend(dates.into_iter().map(|date| {
            let mut record = DayRecord::new(date, DayKind::Baseline);
            record.footprint = Some(REGION_FOOTPRINT.to_string());
            PlannedDay {
                record,
                request: Some(DayRequest {
                    date,
                    kind: DayKind::Baseline,
                    footprint: Arc::clone(&region),
                }),
            }
        }));
    }

    let plan = SamplingPlan { days };
    log::info!(
        "Planned {} outbreak days and {} baseline days",
        plan.count(DayKind::Outbreak),
        plan.count(DayKind::Baseline),
    );
    Ok(plan)
}

fn plan_outbreak_day(
    group: &DayGroup,
    projection: &AlbersEqualArea,
    config: &AnalysisConfig,
) -> PlannedDay {
    let date = group.day.date;
    let mut record = DayRecord::new(date, DayKind::Outbreak).with_stats(&group.stats);

    let footprint = hull_for_events(&group.day.events, projection).and_then(|hull| {
        record.centroid_x = Some(hull.centroid.x());
        record.centroid_y = Some(hull.centroid.y());
        record.area_km2 = Some(hull.area_km2());
        config.sampling.footprint.select(&hull)
    });

    match footprint {
        Ok(footprint) => {
            record.footprint = Some(footprint.kind().to_string());
            PlannedDay {
                record,
                request: Some(DayRequest {
                    date,
                    kind: DayKind::Outbreak,
                    footprint: Arc::new(footprint),
                }),
            }
        }
        Err(e) => {
            log::warn!("{date} has no usable footprint: {e}");
            record.status = SampleStatus::Missing {
                reason: e.to_string(),
            };
            PlannedDay {
                record,
                request: None,
            }
        }
    }
}

// ── Environmental sampling ───────────────────────────────────────────────

/// Builds the grid source named by the configuration.
///
/// # Errors
///
/// Returns [`AnalysisError::Http`] if the HTTP client cannot be built.
pub fn build_source(config: &AnalysisConfig) -> Result<Box<dyn GridSource>, AnalysisError> {
    let window = config.grid.window();
    Ok(match &config.grid.source {
        GridSourceConfig::Directory { root } => {
            log::info!("Reading grids from {}", root.display());
            Box::new(DirectoryGridSource::new(root.clone(), window))
        }
        GridSourceConfig::Http { url_template } => {
            log::info!("Fetching grids from {url_template}");
            let client = reqwest::Client::builder()
                .user_agent(concat!("outbreak/", env!("CARGO_PKG_VERSION")))
                .build()?;
            Box::new(HttpGridSource::new(client, url_template.clone(), window))
        }
    })
}

/// Batch options from the configuration.
#[must_use]
pub fn batch_options(config: &AnalysisConfig) -> BatchOptions {
    BatchOptions {
        hour: config.grid.analysis_hour,
        max_concurrency: config.grid.max_concurrency,
        retry: config.grid.retry_policy(),
        catalog: config.fields.clone(),
        sampler: EnvironmentalSampler::new(config.sampling.aggregations.clone()),
        projection: AlbersEqualArea::conus(),
    }
}

/// Samples every planned day and assembles the day table.
pub async fn sample(
    source: &dyn GridSource,
    plan: SamplingPlan,
    config: &AnalysisConfig,
    progress: &dyn ProgressCallback,
) -> DayTable {
    let requests = plan.requests();
    let mut results = sample_days(source, &requests, &batch_options(config), progress)
        .await
        .into_iter();

    let records = plan
        .days
        .into_iter()
        .map(|day| {
            if day.request.is_none() {
                return day.record;
            }
            match results.next() {
                Some(samples) => day.record.with_samples(samples),
                None => day.record,
            }
        })
        .collect();

    DayTable::new(records)
}

// ── Correlation screens ──────────────────────────────────────────────────

/// Screen of one sample column against the day-count/energy plane.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldScreen {
    /// Reference column, e.g. `cape_max`.
    pub column: String,
    pub profile: ScreenProfile,
}

/// Screens each configured field's reference column against standardized
/// `ln(event count)` and `ln(median energy)` of the sampled outbreak days.
///
/// # Errors
///
/// Returns [`AnalysisError::Correlation`] if a count or median energy is
/// not positive or the screen settings are invalid.
pub fn run_screens(
    table: &DayTable,
    config: &AnalysisConfig,
) -> Result<Vec<FieldScreen>, AnalysisError> {
    let rows: Vec<&DayRecord> = table
        .sampled(DayKind::Outbreak)
        .filter(|r| {
            let usable = r.n_events > 0 && r.median_energy.is_some_and(|m| m > 0.0);
            if !usable {
                log::warn!(
                    "Dropping {} from screens: no positive event count and median energy",
                    r.date
                );
            }
            usable
        })
        .collect();
    if rows.len() < 2 {
        log::warn!(
            "Only {} sampled outbreak days, skipping correlation screens",
            rows.len()
        );
        return Ok(Vec::new());
    }

    #[allow(clippy::cast_precision_loss)]
    let counts: Vec<f64> = rows.iter().map(|r| r.n_events as f64).collect();
    let medians: Vec<f64> = rows
        .iter()
        .filter_map(|r| r.median_energy)
        .collect();
    let x = log_standardize(&counts)?;
    let y = log_standardize(&medians)?;

    let range = config.screen.range();
    let mut screens = Vec::new();
    for field in config.fields.names() {
        let column = sample_column(field, config.screen.reference);
        let reference: Vec<f64> = rows
            .iter()
            .map(|r| r.sample(&column).unwrap_or(f64::NAN))
            .collect();
        let profile = screen(&x, &y, &reference, &range, config.screen.significance)?;

        match profile.max_abs_r() {
            Some(r) => log::info!(
                "{column}: max |r| = {r:.3} at {:?}° over {} days, {} significant angles",
                profile.max_abs_angles(),
                profile.n,
                profile.significant().len(),
            ),
            None => log::info!("{column}: correlation undefined over {} days", profile.n),
        }
        screens.push(FieldScreen { column, profile });
    }
    Ok(screens)
}

// ── Annual trends ────────────────────────────────────────────────────────

/// Per-year summaries and the trend of each series against year.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnualTrends {
    pub summaries: Vec<YearSummary>,
    /// `(series, trend)` in a fixed order.
    pub trends: Vec<(&'static str, LinearTrend)>,
}

/// Summarizes outbreak activity per year of the study interval and fits
/// a linear trend to each series. Years without big days are skipped in
/// the mean-events series.
///
/// # Errors
///
/// Returns [`AnalysisError::Correlation`] if a trend cannot be fitted.
pub fn annual_trends(
    outbreaks: &Outbreaks,
    events: &PreparedEvents,
) -> Result<AnnualTrends, AnalysisError> {
    let summaries = annual_summaries(outbreaks, events.years());
    let years: Vec<f64> = summaries.iter().map(|s| f64::from(s.year)).collect();

    #[allow(clippy::cast_precision_loss)]
    let series: [(&'static str, Vec<f64>); 4] = [
        (
            "medium_days",
            summaries.iter().map(|s| s.medium_days as f64).collect(),
        ),
        (
            "big_days",
            summaries.iter().map(|s| s.big_days as f64).collect(),
        ),
        (
            "big_day_energy",
            summaries.iter().map(|s| s.big_day_energy).collect(),
        ),
        (
            "mean_events_per_big_day",
            summaries
                .iter()
                .map(|s| s.mean_events_per_big_day().unwrap_or(f64::NAN))
                .collect(),
        ),
    ];

    let mut trends = Vec::with_capacity(series.len());
    for (name, values) in series {
        let trend = linear_trend(&years, &values)?;
        log::info!(
            "{name}: slope {:.4}/yr (r = {:.3}, p = {:.4}, n = {})",
            trend.slope,
            trend.r,
            trend.p_value,
            trend.n
        );
        trends.push((name, trend));
    }

    Ok(AnnualTrends { summaries, trends })
}

// ── Outputs ──────────────────────────────────────────────────────────────

/// Writes one profile CSV per screened column under `root/screens`.
///
/// # Errors
///
/// Returns [`AnalysisError`] if a file cannot be written.
pub fn write_screens(root: &Path, screens: &[FieldScreen]) -> Result<(), AnalysisError> {
    ensure_dir(&screens_dir(root))?;
    for field in screens {
        let path = screen_profile_path(root, &field.column);
        write_screen_profile(&field.profile, std::fs::File::create(&path)?)?;
        log::debug!("Wrote {}", path.display());
    }
    Ok(())
}

/// Writes the annual summary table under `root`.
///
/// # Errors
///
/// Returns [`AnalysisError`] if the file cannot be written.
pub fn write_annual(root: &Path, trends: &AnnualTrends) -> Result<(), AnalysisError> {
    ensure_dir(root)?;
    let path = annual_summary_path(root);
    write_annual_summaries(&trends.summaries, std::fs::File::create(&path)?)?;
    log::info!("Wrote {} yearly summaries to {}", trends.summaries.len(), path.display());
    Ok(())
}

// ── Full run ─────────────────────────────────────────────────────────────

/// Runs every stage on the catalog at `catalog` and writes the day table,
/// screens, and annual summaries under `output`.
///
/// # Errors
///
/// Returns [`AnalysisError`] for any failure that is not local to one day.
pub async fn run(
    config: &AnalysisConfig,
    catalog: &Path,
    output: &Path,
    progress: &dyn ProgressCallback,
) -> Result<RunReport, AnalysisError> {
    let raw = read_catalog(catalog)?;
    let source = build_source(config)?;
    run_with_source(config, &raw, source.as_ref(), output, progress).await
}

/// [`run`] over already-read catalog records and a given grid source.
///
/// # Errors
///
/// Returns [`AnalysisError`] for any failure that is not local to one day.
pub async fn run_with_source(
    config: &AnalysisConfig,
    raw: &[RawEvent],
    source: &dyn GridSource,
    output: &Path,
    progress: &dyn ProgressCallback,
) -> Result<RunReport, AnalysisError> {
    let run_start = Instant::now();

    let events = prepare_events(raw, config)?;
    let outbreaks = classify(&events, config)?;
    for (rank, group) in outbreaks.top_by_energy(config.study.top_n).iter().enumerate() {
        log::info!(
            "#{:<2} {} {} events, ATE {:.3e} J",
            rank + 1,
            group.day.date,
            group.stats.count,
            group.stats.total_energy
        );
    }

    let plan = plan_sampling(&outbreaks, &events, config)?;
    let table = sample(source, plan, config, progress).await;

    ensure_dir(output)?;
    let table_path = day_table_path(output);
    table.save(&table_path)?;

    let screens = run_screens(&table, config)?;
    write_screens(output, &screens)?;

    let trends = annual_trends(&outbreaks, &events)?;
    write_annual(output, &trends)?;

    let report = RunReport::new(&events, &outbreaks, &table, &screens);
    report.log();
    log::info!(
        "Analysis complete in {:.1}s",
        run_start.elapsed().as_secs_f64()
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use chrono::{Datelike as _, NaiveDateTime};
    use outbreak_environment::{ArchiveWindow, MemoryGridSource, NullProgress};

    use super::*;

    const CONFIG: &str = r#"
        [thresholds]
        medium = 3
        big = 5

        [study]
        start = "2011-01-01"
        end = "2011-12-31"

        [grid]
        available_from = "2011-01-01"
        available_until = "2011-12-31"
        max_attempts = 2
        backoff_base_ms = 0

        [fields]
        vector = []

        [[fields.scalar]]
        name = "cape"
        source = "CAPE"

        [sampling]
        baseline_days = 4
        seed = 11
        region = { kind = "bounding_box", min_lon = -104.0, min_lat = 31.0, max_lon = -91.0, max_lat = 39.0 }
    "#;

    fn config() -> AnalysisConfig {
        AnalysisConfig::from_toml(CONFIG).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn raw(timestamp: &str, rating: i32, lon: f64, lat: f64) -> RawEvent {
        RawEvent {
            timestamp: NaiveDateTime::parse_from_str(timestamp, "%Y-%m-%d %H:%M").unwrap(),
            state: "OK".to_string(),
            rating: Some(rating),
            injuries: 1,
            fatalities: 0,
            longitude: lon,
            latitude: lat,
            length_mi: 5.0,
            width_yd: 100.0,
        }
    }

    /// Two big days, one medium day, one quiet day, and an event in 2010.
    fn catalog() -> Vec<RawEvent> {
        let mut events = Vec::new();
        let spread = [
            (-100.0, 33.0),
            (-96.0, 33.0),
            (-96.0, 37.0),
            (-100.0, 37.0),
            (-98.0, 35.0),
            (-97.0, 34.0),
        ];
        for (i, (lon, lat)) in spread.iter().enumerate() {
            events.push(raw("2011-04-27 15:00", 1 + (i % 3) as i32, *lon, *lat));
        }
        for (lon, lat) in &spread[..5] {
            events.push(raw("2011-05-24 20:30", 2, *lon, *lat));
        }
        // Before 06:00, so on 2011-05-24 as well.
        events.push(raw("2011-05-25 04:00", 4, -97.5, 35.5));
        for _ in 0..3 {
            events.push(raw("2011-06-10 18:00", 0, -95.0, 38.0));
        }
        events.push(raw("2011-07-04 12:00", 0, -95.0, 38.0));
        events.push(raw("2010-04-01 12:00", 1, -95.0, 38.0));
        events
    }

    fn source() -> MemoryGridSource {
        let source = MemoryGridSource::new(ArchiveWindow::new(date(2011, 1, 1), date(2011, 5, 31)));
        source.insert(MemoryGridSource::uniform(date(2011, 4, 27), 18, "CAPE", 2_500.0).unwrap());
        source.insert(MemoryGridSource::uniform(date(2011, 5, 24), 18, "CAPE", 1_800.0).unwrap());
        source
    }

    #[test]
    fn prepares_events_inside_the_study_interval() {
        let events = prepare_events(&catalog(), &config()).unwrap();
        assert_eq!(events.events.len(), 16);
        assert_eq!(events.normalization.events, 17);
        assert_eq!(events.years(), 2011..=2011);
        assert!(events.events.iter().all(|e| e.energy > 0.0));
    }

    #[test]
    fn study_interval_defaults_to_catalog_span() {
        let mut config = config();
        config.study.start = None;
        config.study.end = None;
        let events = prepare_events(&catalog(), &config).unwrap();
        assert_eq!(events.start, date(2010, 4, 1));
        assert_eq!(events.end, date(2011, 7, 4));
        assert_eq!(events.events.len(), 17);
    }

    #[test]
    fn empty_interval_is_an_error() {
        let mut config = config();
        config.study.start = Some(date(2012, 1, 1));
        config.study.end = Some(date(2012, 12, 31));
        assert!(matches!(
            prepare_events(&catalog(), &config),
            Err(AnalysisError::NoEvents { .. })
        ));
        assert!(matches!(
            prepare_events(&[], &AnalysisConfig::default()),
            Err(AnalysisError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn classifies_medium_and_big_days() {
        let config = config();
        let events = prepare_events(&catalog(), &config).unwrap();
        let outbreaks = classify(&events, &config).unwrap();

        let big: Vec<NaiveDate> = outbreaks.big_days().map(|g| g.day.date).collect();
        assert_eq!(big, vec![date(2011, 4, 27), date(2011, 5, 24)]);
        assert_eq!(outbreaks.med_days().count(), 3);
        assert_eq!(outbreaks.get(date(2011, 5, 24)).unwrap().stats.count, 6);
    }

    #[test]
    fn plan_avoids_medium_days_and_follows_big_day_months() {
        let config = config();
        let events = prepare_events(&catalog(), &config).unwrap();
        let outbreaks = classify(&events, &config).unwrap();
        let plan = plan_sampling(&outbreaks, &events, &config).unwrap();

        assert_eq!(plan.count(DayKind::Outbreak), 2);
        assert_eq!(plan.count(DayKind::Baseline), 4);
        assert_eq!(plan.requests().len(), 6);

        let outbreak = &plan.days[0].record;
        assert_eq!(outbreak.footprint.as_deref(), Some("area"));
        assert!(outbreak.area_km2.unwrap() > 2_500.0);
        assert_eq!(outbreak.n_events, 6);

        let med = outbreaks.med_dates();
        for day in plan.days.iter().filter(|d| d.record.kind == DayKind::Baseline) {
            let date = day.record.date;
            assert!(!med.contains(&date));
            assert!(matches!(date.month(), 4 | 5), "{date} not in a big-day month");
            assert_eq!(day.record.footprint.as_deref(), Some(REGION_FOOTPRINT));
        }

        let again = plan_sampling(&outbreaks, &events, &config).unwrap();
        let dates = |p: &SamplingPlan| p.days.iter().map(|d| d.record.date).collect::<Vec<_>>();
        assert_eq!(dates(&plan), dates(&again));
    }

    #[test]
    fn no_baseline_without_big_days() {
        let mut config = config();
        config.thresholds.medium = 30;
        config.thresholds.big = 40;
        let events = prepare_events(&catalog(), &config).unwrap();
        let outbreaks = classify(&events, &config).unwrap();
        let plan = plan_sampling(&outbreaks, &events, &config).unwrap();
        assert!(plan.days.is_empty());
    }

    #[tokio::test]
    async fn samples_planned_days_in_plan_order() {
        let config = config();
        let events = prepare_events(&catalog(), &config).unwrap();
        let outbreaks = classify(&events, &config).unwrap();
        let plan = plan_sampling(&outbreaks, &events, &config).unwrap();
        let source = source();

        let table = sample(&source, plan, &config, &NullProgress).await;
        assert_eq!(table.len(), 6);
        assert_eq!(table.columns(), ["cape_max", "cape_mean", "cape_min"]);

        let first = &table.records()[0];
        assert_eq!(first.date, date(2011, 4, 27));
        assert_eq!(first.status, SampleStatus::Sampled);
        assert!((first.sample("cape_max").unwrap() - 2_500.0).abs() < 1e-9);
        assert!((table.records()[1].sample("cape_mean").unwrap() - 1_800.0).abs() < 1e-9);

        // Baseline days fall in April or May but have no grids.
        for record in &table.records()[2..] {
            assert_eq!(record.kind, DayKind::Baseline);
            assert!(matches!(record.status, SampleStatus::Missing { .. }));
            assert!(record.samples.is_empty());
        }
    }

    fn screened_record(n_events: usize, median: f64, cape: Option<f64>) -> DayRecord {
        let mut record = DayRecord::new(date(2011, 4, 1), DayKind::Outbreak);
        record.status = SampleStatus::Sampled;
        record.n_events = n_events;
        record.median_energy = Some(median);
        if let Some(cape) = cape {
            record.samples = BTreeMap::from([("cape_max".to_string(), cape)]);
        }
        record
    }

    #[test]
    fn screen_finds_the_count_axis() {
        #[allow(clippy::cast_precision_loss)]
        let records = [(20, 1e6), (25, 3e6), (30, 2e6), (40, 5e6), (50, 4e6)]
            .into_iter()
            .map(|(n, m)| screened_record(n, m, Some((n as f64).ln())))
            .chain(std::iter::once(screened_record(60, 6e6, None)))
            .collect();
        let table = DayTable::new(records);

        let screens = run_screens(&table, &config()).unwrap();
        assert_eq!(screens.len(), 1);
        let profile = &screens[0].profile;
        assert_eq!(screens[0].column, "cape_max");
        assert_eq!(profile.points.len(), 180);
        // The day without a cape sample is dropped.
        assert_eq!(profile.n, 5);
        assert_eq!(profile.max_abs_angles(), vec![180.0]);
        assert!((profile.max_abs_r().unwrap() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn screen_skips_days_without_median_energy() {
        #[allow(clippy::cast_precision_loss)]
        let mut records: Vec<DayRecord> = [(20, 1e6), (25, 3e6), (30, 2e6), (40, 5e6)]
            .into_iter()
            .map(|(n, m)| screened_record(n, m, Some((n as f64).ln())))
            .collect();
        let mut blank = screened_record(45, 1.0, Some(3.0));
        blank.median_energy = None;
        records.push(blank);
        let table = DayTable::new(records);

        let screens = run_screens(&table, &config()).unwrap();
        assert_eq!(screens.len(), 1);
        assert_eq!(screens[0].profile.n, 4);
        assert_eq!(screens[0].profile.max_abs_angles(), vec![180.0]);
    }

    #[test]
    fn screen_needs_two_sampled_days() {
        let table = DayTable::new(vec![screened_record(20, 1e6, Some(1.0))]);
        assert!(run_screens(&table, &config()).unwrap().is_empty());
    }

    #[test]
    fn annual_trends_cover_every_series() {
        let mut config = config();
        config.study.start = None;
        let events = prepare_events(&catalog(), &config).unwrap();
        let outbreaks = classify(&events, &config).unwrap();
        let trends = annual_trends(&outbreaks, &events).unwrap();

        assert_eq!(trends.summaries.len(), 2);
        assert_eq!(trends.summaries[1].big_days, 2);
        let names: Vec<&str> = trends.trends.iter().map(|(name, _)| *name).collect();
        assert_eq!(
            names,
            ["medium_days", "big_days", "big_day_energy", "mean_events_per_big_day"]
        );
        // Two years give fewer than three points.
        assert!(trends.trends[1].1.slope.is_nan());
    }

    #[tokio::test]
    async fn full_run_writes_outputs() {
        let output = std::env::temp_dir().join(format!("outbreak-run-{}", std::process::id()));
        let report = run_with_source(&config(), &catalog(), &source(), &output, &NullProgress)
            .await
            .unwrap();

        assert_eq!(report.outbreak_days, 2);
        assert_eq!(report.baseline_days, 4);
        assert_eq!(report.status_counts.get("sampled"), Some(&2));

        let table = DayTable::load(&day_table_path(&output)).unwrap();
        assert_eq!(table.len(), 6);
        assert!(annual_summary_path(&output).exists());
        // Two sampled outbreak days are enough to screen.
        assert!(screen_profile_path(&output, "cape_max").exists());

        std::fs::remove_dir_all(&output).unwrap();
    }
}
