//! Grid field sources.
//!
//! A [`GridSource`] returns every field of one date at a fixed analysis
//! hour. Sources cover a fixed archive window; dates outside it fail with
//! [`GridSourceError::Unavailable`] and the batch sampler records them as
//! out of range without issuing a request.
//!
//! Both concrete sources read the same JSON payload:
//!
//! ```json
//! {
//!   "rows": 2, "cols": 2,
//!   "longitudes": [-98.0, -97.0, -98.0, -97.0],
//!   "latitudes": [35.0, 35.0, 36.0, 36.0],
//!   "fields": { "CAPE": [1200.0, 900.5, null, 0.0] }
//! }
//! ```
//!
//! `null` cells decode to NaN and are skipped by the sampler.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use chrono::{Datelike as _, NaiveDate};
use outbreak_environment_models::{Grid2D, GridFields, GridGeometry, GridShapeError};
use serde::{Deserialize, Serialize};

use crate::GridSourceError;

/// Inclusive date range an archive covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveWindow {
    /// First covered date.
    pub from: NaiveDate,
    /// Last covered date.
    pub until: NaiveDate,
}

impl ArchiveWindow {
    #[must_use]
    pub const fn new(from: NaiveDate, until: NaiveDate) -> Self {
        Self { from, until }
    }

    /// Whether `date` is covered.
    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.from <= date && date <= self.until
    }

    fn check(&self, date: NaiveDate) -> Result<(), GridSourceError> {
        if self.contains(date) {
            Ok(())
        } else {
            Err(GridSourceError::Unavailable {
                date,
                reason: format!("outside archive {} to {}", self.from, self.until),
            })
        }
    }
}

/// Supplies the gridded analysis fields for a date.
#[async_trait]
pub trait GridSource: Send + Sync {
    /// Dates this source can serve.
    fn window(&self) -> ArchiveWindow;

    /// Fetches every field at `hour` UTC on `date`.
    ///
    /// # Errors
    ///
    /// Returns [`GridSourceError::Unavailable`] for dates outside
    /// [`GridSource::window`] or missing from the archive, and other
    /// variants for transport or decode failures.
    async fn fetch(&self, date: NaiveDate, hour: u32) -> Result<GridFields, GridSourceError>;
}

/// Wire form of one day's grid.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridPayload {
    pub rows: usize,
    pub cols: usize,
    /// Cell-center longitudes, row-major.
    pub longitudes: Vec<f64>,
    /// Cell-center latitudes, row-major.
    pub latitudes: Vec<f64>,
    /// Row-major values per source field name. `null` marks a missing cell.
    pub fields: BTreeMap<String, Vec<Option<f64>>>,
}

impl GridPayload {
    /// Converts the payload into validated fields, mapping `null` to NaN.
    ///
    /// # Errors
    ///
    /// Returns [`GridShapeError`] if any array does not hold `rows * cols`
    /// values.
    pub fn into_fields(self, date: NaiveDate, hour: u32) -> Result<GridFields, GridShapeError> {
        let geometry = GridGeometry::new(self.rows, self.cols, self.longitudes, self.latitudes)?;
        let mut fields = BTreeMap::new();
        for (name, values) in self.fields {
            let values = values.into_iter().map(|v| v.unwrap_or(f64::NAN)).collect();
            let grid = Grid2D::new(self.rows, self.cols, values).map_err(|e| GridShapeError {
                what: format!("field {name}"),
                ..e
            })?;
            fields.insert(name, grid);
        }
        GridFields::new(date, hour, Arc::new(geometry), fields)
    }
}

/// Decodes a JSON grid payload.
///
/// # Errors
///
/// Returns [`GridSourceError::Json`] for malformed JSON and
/// [`GridSourceError::Shape`] for inconsistent dimensions.
pub fn parse_payload(text: &str, date: NaiveDate, hour: u32) -> Result<GridFields, GridSourceError> {
    let payload: GridPayload = serde_json::from_str(text)?;
    Ok(payload.into_fields(date, hour)?)
}

/// Reads `root/YYYY/YYYYMMDD_HH.json` files from local disk.
pub struct DirectoryGridSource {
    root: PathBuf,
    window: ArchiveWindow,
}

impl DirectoryGridSource {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>, window: ArchiveWindow) -> Self {
        Self {
            root: root.into(),
            window,
        }
    }

    /// File holding `date` at `hour`.
    #[must_use]
    pub fn path_for(&self, date: NaiveDate, hour: u32) -> PathBuf {
        day_file(&self.root, date, hour)
    }
}

fn day_file(root: &Path, date: NaiveDate, hour: u32) -> PathBuf {
    root.join(format!("{:04}", date.year()))
        .join(format!("{}_{hour:02}.json", date.format("%Y%m%d")))
}

#[async_trait]
impl GridSource for DirectoryGridSource {
    fn window(&self) -> ArchiveWindow {
        self.window
    }

    async fn fetch(&self, date: NaiveDate, hour: u32) -> Result<GridFields, GridSourceError> {
        self.window.check(date)?;
        let path = self.path_for(date, hour);
        let text = match tokio::fs::read_to_string(&path).await {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(GridSourceError::Unavailable {
                    date,
                    reason: format!("{} not found", path.display()),
                });
            }
            Err(e) => return Err(e.into()),
        };
        log::debug!("Read {} ({} bytes)", path.display(), text.len());
        parse_payload(&text, date, hour)
    }
}

/// Downloads payloads from a URL template.
///
/// The template may use `{year}`, `{month}`, `{day}`, and `{hour}`; month,
/// day, and hour are zero-padded to two digits.
pub struct HttpGridSource {
    client: reqwest::Client,
    url_template: String,
    window: ArchiveWindow,
}

impl HttpGridSource {
    #[must_use]
    pub fn new(client: reqwest::Client, url_template: impl Into<String>, window: ArchiveWindow) -> Self {
        Self {
            client,
            url_template: url_template.into(),
            window,
        }
    }

    /// URL of `date` at `hour`.
    #[must_use]
    pub fn url_for(&self, date: NaiveDate, hour: u32) -> String {
        self.url_template
            .replace("{year}", &format!("{:04}", date.year()))
            .replace("{month}", &format!("{:02}", date.month()))
            .replace("{day}", &format!("{:02}", date.day()))
            .replace("{hour}", &format!("{hour:02}"))
    }
}

#[async_trait]
impl GridSource for HttpGridSource {
    fn window(&self) -> ArchiveWindow {
        self.window
    }

    async fn fetch(&self, date: NaiveDate, hour: u32) -> Result<GridFields, GridSourceError> {
        self.window.check(date)?;
        let url = self.url_for(date, hour);
        let response = self.client.get(&url).send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
            return Err(GridSourceError::Transient {
                message: format!("HTTP {status} from {url}"),
            });
        }
        if !status.is_success() {
            return Err(GridSourceError::Unavailable {
                date,
                reason: format!("HTTP {status} from {url}"),
            });
        }

        let text = response.text().await?;
        log::debug!("Fetched {url} ({} bytes)", text.len());
        parse_payload(&text, date, hour)
    }
}

/// In-memory source for tests and dry runs.
///
/// Dates not inserted are unavailable. [`MemoryGridSource::fail_transiently`]
/// makes the next `n` fetches of a date fail with a transient error.
pub struct MemoryGridSource {
    window: ArchiveWindow,
    days: Mutex<BTreeMap<NaiveDate, GridFields>>,
    failures: Mutex<BTreeMap<NaiveDate, u32>>,
    calls: AtomicUsize,
}

impl MemoryGridSource {
    #[must_use]
    pub fn new(window: ArchiveWindow) -> Self {
        Self {
            window,
            days: Mutex::new(BTreeMap::new()),
            failures: Mutex::new(BTreeMap::new()),
            calls: AtomicUsize::new(0),
        }
    }

    /// Stores the fields served for `fields.date`.
    pub fn insert(&self, fields: GridFields) {
        self.days
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(fields.date, fields);
    }

    /// Makes the next `times` fetches of `date` fail transiently.
    pub fn fail_transiently(&self, date: NaiveDate, times: u32) {
        self.failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(date, times);
    }

    /// Number of fetches issued so far.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// One field of constant `value` on a 1° grid spanning 105W-90W and
    /// 30N-40N.
    ///
    /// # Errors
    ///
    /// Never fails in practice; the field is built to match the geometry.
    pub fn uniform(
        date: NaiveDate,
        hour: u32,
        field: &str,
        value: f64,
    ) -> Result<GridFields, GridShapeError> {
        let lons: Vec<f64> = (-105..=-90).map(f64::from).collect();
        let lats: Vec<f64> = (30..=40).map(f64::from).collect();
        let geometry = GridGeometry::regular(&lons, &lats);
        let mut fields = BTreeMap::new();
        fields.insert(
            field.to_string(),
            Grid2D::new(geometry.rows(), geometry.cols(), vec![value; geometry.len()])?,
        );
        GridFields::new(date, hour, Arc::new(geometry), fields)
    }
}

#[async_trait]
impl GridSource for MemoryGridSource {
    fn window(&self) -> ArchiveWindow {
        self.window
    }

    async fn fetch(&self, date: NaiveDate, hour: u32) -> Result<GridFields, GridSourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.window.check(date)?;

        {
            let mut failures = self.failures.lock().unwrap_or_else(PoisonError::into_inner);
            if let Some(remaining) = failures.get_mut(&date)
                && *remaining > 0
            {
                *remaining -= 1;
                return Err(GridSourceError::Transient {
                    message: format!("simulated failure for {date}"),
                });
            }
        }

        let days = self.days.lock().unwrap_or_else(PoisonError::into_inner);
        days.get(&date)
            .map(|fields| GridFields {
                hour,
                ..fields.clone()
            })
            .ok_or_else(|| GridSourceError::Unavailable {
                date,
                reason: "not in memory archive".to_string(),
            })
    }
}
