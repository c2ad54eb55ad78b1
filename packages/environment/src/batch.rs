//! Concurrent sampling of many days.
//!
//! Each day is fetched (with retry), prepared, and reduced independently.
//! Up to `max_concurrency` fetches are in flight at once; results come back
//! in completion order and are put back in request order before returning.
//! A failure local to one day never aborts the batch: the day is recorded
//! as [`SampleStatus::Missing`], or [`SampleStatus::OutOfRange`] if its
//! date is outside the archive.

use std::sync::{Arc, Mutex, PoisonError};

use chrono::NaiveDate;
use futures::StreamExt as _;
use outbreak_environment_models::{
    DayKind, DaySamples, FootprintSample, GridGeometry, SampleStatus,
};
use outbreak_spatial::{AlbersEqualArea, CellIndex, Footprint};

use crate::progress::ProgressCallback;
use crate::retry::{RetryPolicy, fetch_with_retry};
use crate::{EnvironmentalSampler, FieldCatalog, GridSource, SamplingError};

/// Default number of days fetched concurrently.
pub const DEFAULT_MAX_CONCURRENCY: usize = 8;

/// Default analysis hour (UTC).
pub const DEFAULT_ANALYSIS_HOUR: u32 = 18;

/// One day to sample.
#[derive(Debug, Clone)]
pub struct DayRequest {
    /// Day whose grid is fetched.
    pub date: NaiveDate,
    pub kind: DayKind,
    /// Shared so every baseline day can point at the same region.
    pub footprint: Arc<Footprint>,
}

/// Everything needed to turn a fetched grid into samples.
#[derive(Debug, Clone)]
pub struct BatchOptions {
    /// Analysis hour requested from the source.
    pub hour: u32,
    /// Maximum fetches in flight.
    pub max_concurrency: usize,
    pub retry: RetryPolicy,
    pub catalog: FieldCatalog,
    pub sampler: EnvironmentalSampler,
    /// Plane the footprints were built in.
    pub projection: AlbersEqualArea,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            hour: DEFAULT_ANALYSIS_HOUR,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            retry: RetryPolicy::default(),
            catalog: FieldCatalog::default(),
            sampler: EnvironmentalSampler::default(),
            projection: AlbersEqualArea::conus(),
        }
    }
}

/// Samples every requested day; the result is in request order.
pub async fn sample_days(
    source: &dyn GridSource,
    requests: &[DayRequest],
    options: &BatchOptions,
    progress: &dyn ProgressCallback,
) -> Vec<DaySamples> {
    progress.set_total(requests.len() as u64);
    progress.set_message("Sampling environments".to_string());

    let cache = IndexCache::default();
    let mut results: Vec<(usize, DaySamples)> = futures::stream::iter(requests.iter().enumerate())
        .map(|(i, request)| {
            let cache = &cache;
            async move {
                let samples = sample_day(source, request, options, cache).await;
                progress.inc(1);
                (i, samples)
            }
        })
        .buffer_unordered(options.max_concurrency.max(1))
        .collect()
        .await;
    results.sort_by_key(|(i, _)| *i);
    let days: Vec<DaySamples> = results.into_iter().map(|(_, day)| day).collect();

    let count = |label: &str| days.iter().filter(|d| d.status.label() == label).count();
    let summary = format!(
        "{} days: {} sampled, {} missing, {} out of range",
        days.len(),
        count("sampled"),
        count("missing"),
        count("out_of_range")
    );
    log::info!("{summary}");
    progress.finish(summary);
    days
}

async fn sample_day(
    source: &dyn GridSource,
    request: &DayRequest,
    options: &BatchOptions,
    cache: &IndexCache,
) -> DaySamples {
    let (status, samples) = if source.window().contains(request.date) {
        match try_sample_day(source, request, options, cache).await {
            Ok(samples) => (SampleStatus::Sampled, samples),
            Err(e) => {
                log::warn!("{} {} day not sampled: {e}", request.date, request.kind);
                (
                    SampleStatus::Missing {
                        reason: e.to_string(),
                    },
                    Vec::new(),
                )
            }
        }
    } else {
        log::debug!("{} is outside the grid archive", request.date);
        (SampleStatus::OutOfRange, Vec::new())
    };

    DaySamples {
        date: request.date,
        kind: request.kind,
        status,
        samples,
    }
}

async fn try_sample_day(
    source: &dyn GridSource,
    request: &DayRequest,
    options: &BatchOptions,
    cache: &IndexCache,
) -> Result<Vec<FootprintSample>, SamplingError> {
    let raw = fetch_with_retry(source, request.date, options.hour, &options.retry).await?;
    let fields = options.catalog.prepare(&raw)?;
    let index = cache.get_or_build(&fields.geometry, &options.projection);
    options.sampler.sample(&fields, &index, &request.footprint)
}

/// Last-built cell index. Archive days usually share one grid, so the
/// index is rebuilt only when the geometry changes.
#[derive(Default)]
struct IndexCache {
    slot: Mutex<Option<(Arc<GridGeometry>, Arc<CellIndex>)>>,
}

impl IndexCache {
    fn get_or_build(&self, geometry: &Arc<GridGeometry>, projection: &AlbersEqualArea) -> Arc<CellIndex> {
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some((cached, index)) = slot.as_ref()
            && (Arc::ptr_eq(cached, geometry) || **cached == **geometry)
        {
            return index.clone();
        }
        let index = Arc::new(CellIndex::new(
            geometry.longitudes(),
            geometry.latitudes(),
            projection,
        ));
        *slot = Some((geometry.clone(), index.clone()));
        index
    }
}
