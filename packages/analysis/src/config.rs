//! Analysis configuration.
//!
//! Read from a TOML file (default `outbreak.toml`). Every section and key
//! has a default, so an empty file is a valid configuration:
//!
//! ```toml
//! [thresholds]
//! medium = 10
//! big = 20
//!
//! [study]
//! start = "1994-01-01"
//! end = "2013-12-31"
//!
//! [grid]
//! analysis_hour = 18
//! available_from = "1979-01-01"
//! available_until = "2014-12-31"
//! source = { kind = "directory", root = "data/grids" }
//!
//! [sampling]
//! baseline_days = 500
//! region = { kind = "geo_json", path = "data/plains.geojson" }
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::NaiveDate;
use outbreak_correlation::AngleRange;
use outbreak_days::Thresholds;
use outbreak_energy::NormalizeOptions;
use outbreak_environment::batch::{DEFAULT_ANALYSIS_HOUR, DEFAULT_MAX_CONCURRENCY};
use outbreak_environment::retry::{DEFAULT_MAX_ATTEMPTS, RetryPolicy};
use outbreak_environment::{ArchiveWindow, FieldCatalog};
use outbreak_environment_models::Aggregation;
use outbreak_spatial::{FootprintPolicy, SamplingRegion};
use serde::{Deserialize, Serialize};

use crate::AnalysisError;

/// Default configuration file name.
pub const DEFAULT_CONFIG_FILE: &str = "outbreak.toml";

/// Complete analysis configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub thresholds: ThresholdsConfig,
    pub energy: EnergyConfig,
    pub study: StudyConfig,
    pub grid: GridConfig,
    pub fields: FieldCatalog,
    pub sampling: SamplingConfig,
    pub screen: ScreenConfig,
}

impl AnalysisConfig {
    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::ConfigParse`] for malformed TOML and
    /// [`AnalysisError::InvalidConfig`] for inconsistent values.
    pub fn from_toml(text: &str) -> Result<Self, AnalysisError> {
        let config: Self = toml::de::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads a config file; a missing file yields the defaults.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError`] if the file exists but cannot be read,
    /// parsed, or validated.
    pub fn load(path: &Path) -> Result<Self, AnalysisError> {
        if !path.exists() {
            log::info!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_toml(&text)?;
        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Checks cross-field constraints.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::InvalidConfig`] describing the first
    /// violated constraint.
    pub fn validate(&self) -> Result<(), AnalysisError> {
        self.thresholds()?;
        if let (Some(start), Some(end)) = (self.study.start, self.study.end)
            && start > end
        {
            return Err(invalid(format!("study start {start} is after end {end}")));
        }
        if self.grid.available_from > self.grid.available_until {
            return Err(invalid(format!(
                "grid archive starts {} after it ends {}",
                self.grid.available_from, self.grid.available_until
            )));
        }
        if self.grid.analysis_hour > 23 {
            return Err(invalid(format!(
                "analysis hour {} is not an hour of the day",
                self.grid.analysis_hour
            )));
        }
        if self.sampling.aggregations.is_empty() {
            return Err(invalid("at least one aggregation is required".to_string()));
        }
        if !self.sampling.aggregations.contains(&self.screen.reference) {
            return Err(invalid(format!(
                "screen reference {} is not a sampled aggregation",
                self.screen.reference
            )));
        }
        if self.fields.names().is_empty() {
            return Err(invalid("at least one field is required".to_string()));
        }
        self.screen
            .range()
            .angles()
            .map_err(|e| invalid(e.to_string()))?;
        if self.screen.significance.is_nan()
            || self.screen.significance <= 0.0
            || self.screen.significance >= 1.0
        {
            return Err(invalid(format!(
                "significance {} must lie strictly between 0 and 1",
                self.screen.significance
            )));
        }
        Ok(())
    }

    /// Validated outbreak thresholds.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::InvalidConfig`] if `big < medium` or
    /// `medium` is zero.
    pub fn thresholds(&self) -> Result<Thresholds, AnalysisError> {
        Thresholds::new(self.thresholds.medium, self.thresholds.big)
            .map_err(|e| invalid(e.to_string()))
    }

    /// Normalization options for the energy stage.
    #[must_use]
    pub const fn normalize_options(&self) -> NormalizeOptions {
        NormalizeOptions {
            short_path_miles: self.energy.short_path_miles,
            width_era_cutoff_year: self.energy.width_era_cutoff_year,
        }
    }
}

fn invalid(message: String) -> AnalysisError {
    AnalysisError::InvalidConfig { message }
}

// ── Sections ─────────────────────────────────────────────────────────────

/// Event-count thresholds for outbreak days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThresholdsConfig {
    pub medium: usize,
    pub big: usize,
}

impl Default for ThresholdsConfig {
    fn default() -> Self {
        let defaults = Thresholds::default();
        Self {
            medium: defaults.medium(),
            big: defaults.big(),
        }
    }
}

/// Record normalization parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnergyConfig {
    /// Unrated events no longer than this (statute miles) get EF0.
    pub short_path_miles: f64,
    /// First year whose widths are scaled by π/4.
    pub width_era_cutoff_year: i32,
}

impl Default for EnergyConfig {
    fn default() -> Self {
        let defaults = NormalizeOptions::default();
        Self {
            short_path_miles: defaults.short_path_miles,
            width_era_cutoff_year: defaults.width_era_cutoff_year,
        }
    }
}

/// Study interval and listing size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StudyConfig {
    /// First convective day studied; the catalog's first day if unset.
    pub start: Option<NaiveDate>,
    /// Last convective day studied; the catalog's last day if unset.
    pub end: Option<NaiveDate>,
    /// Outbreak days listed by energy.
    pub top_n: usize,
}

impl Default for StudyConfig {
    fn default() -> Self {
        Self {
            start: None,
            end: None,
            top_n: 10,
        }
    }
}

/// Where grids come from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GridSourceConfig {
    /// `root/YYYY/YYYYMMDD_HH.json` files.
    Directory { root: PathBuf },
    /// A URL template with `{year}`, `{month}`, `{day}`, `{hour}`.
    Http { url_template: String },
}

impl Default for GridSourceConfig {
    fn default() -> Self {
        Self::Directory {
            root: PathBuf::from("data/grids"),
        }
    }
}

/// Grid archive access.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    /// Analysis hour (UTC) sampled on every day.
    pub analysis_hour: u32,
    /// First date the archive covers.
    pub available_from: NaiveDate,
    /// Last date the archive covers; later days are out of range.
    pub available_until: NaiveDate,
    pub max_concurrency: usize,
    /// Attempts per fetch, including the first.
    pub max_attempts: u32,
    /// Delay before the first retry, doubled for each later one.
    pub backoff_base_ms: u64,
    pub source: GridSourceConfig,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            analysis_hour: DEFAULT_ANALYSIS_HOUR,
            available_from: NaiveDate::from_ymd_opt(1979, 1, 1).unwrap_or_default(),
            available_until: NaiveDate::from_ymd_opt(2014, 12, 31).unwrap_or_default(),
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            backoff_base_ms: 1_000,
            source: GridSourceConfig::default(),
        }
    }
}

impl GridConfig {
    #[must_use]
    pub const fn window(&self) -> ArchiveWindow {
        ArchiveWindow::new(self.available_from, self.available_until)
    }

    #[must_use]
    pub const fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            base_delay: Duration::from_millis(self.backoff_base_ms),
        }
    }
}

/// Footprints and baseline-day selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplingConfig {
    pub aggregations: Vec<Aggregation>,
    #[serde(flatten)]
    pub footprint: FootprintPolicy,
    /// Number of baseline days drawn.
    pub baseline_days: usize,
    /// Seed of the baseline-day draw.
    pub seed: u64,
    /// Region baseline days are sampled over.
    pub region: SamplingRegion,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            aggregations: Aggregation::all().to_vec(),
            footprint: FootprintPolicy::default(),
            baseline_days: 200,
            seed: 2_014,
            region: SamplingRegion::default(),
        }
    }
}

/// Correlation screen settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScreenConfig {
    pub start_deg: f64,
    pub end_deg: f64,
    pub step_deg: f64,
    pub significance: f64,
    /// Aggregation whose column is screened for every field.
    pub reference: Aggregation,
}

impl Default for ScreenConfig {
    fn default() -> Self {
        let range = AngleRange::half_turn();
        Self {
            start_deg: range.start_deg,
            end_deg: range.end_deg,
            step_deg: range.step_deg,
            significance: 0.05,
            reference: Aggregation::Max,
        }
    }
}

impl ScreenConfig {
    #[must_use]
    pub const fn range(&self) -> AngleRange {
        AngleRange {
            start_deg: self.start_deg,
            end_deg: self.end_deg,
            step_deg: self.step_deg,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_is_default() {
        let config = AnalysisConfig::from_toml("").unwrap();
        assert_eq!(config, AnalysisConfig::default());
        let thresholds = config.thresholds().unwrap();
        assert_eq!((thresholds.medium(), thresholds.big()), (10, 20));
        assert_eq!(config.grid.analysis_hour, 18);
        assert_eq!(config.fields.names(), vec!["cape", "hlcy", "cin", "shear"]);
        assert!((config.sampling.footprint.min_hull_area_km2 - 2_500.0).abs() < f64::EPSILON);
        assert_eq!(config.screen.reference, Aggregation::Max);
    }

    #[test]
    fn parses_every_section() {
        let text = r#"
            [thresholds]
            medium = 6
            big = 12

            [energy]
            width_era_cutoff_year = 1994

            [study]
            start = "1994-01-01"
            end = "2013-12-31"
            top_n = 5

            [grid]
            available_until = "2014-10-01"
            max_concurrency = 4
            backoff_base_ms = 250
            source = { kind = "http", url_template = "https://grids.example.org/{year}/{month}{day}_{hour}.json" }

            [[fields.scalar]]
            name = "cin"
            source = "CIN"
            negate = true

            [[fields.vector]]
            name = "shear"
            u = "USTM"
            v = "VSTM"

            [sampling]
            aggregations = ["mean", "max"]
            min_hull_area_km2 = 1000.0
            baseline_days = 50
            seed = 7
            region = { kind = "bounding_box", min_lon = -104.0, min_lat = 29.0, max_lon = -88.0, max_lat = 43.0 }

            [screen]
            start_deg = -90.0
            end_deg = 270.0
            reference = "mean"
        "#;
        let config = AnalysisConfig::from_toml(text).unwrap();
        assert_eq!(config.thresholds.big, 12);
        assert!((config.energy.short_path_miles - 5.0).abs() < f64::EPSILON);
        assert_eq!(config.study.top_n, 5);
        assert_eq!(
            config.grid.window().until,
            NaiveDate::from_ymd_opt(2014, 10, 1).unwrap()
        );
        assert_eq!(
            config.grid.retry_policy().delay_before(2),
            Duration::from_millis(500)
        );
        assert!(matches!(config.grid.source, GridSourceConfig::Http { .. }));
        assert_eq!(config.fields.names(), vec!["cin", "shear"]);
        assert!((config.sampling.footprint.fallback_radius_km - 100.0).abs() < f64::EPSILON);
        assert_eq!(config.sampling.baseline_days, 50);
        assert_eq!(config.screen.range().angles().unwrap().len(), 361);
    }

    #[test]
    fn rejects_big_below_medium() {
        let err = AnalysisConfig::from_toml("[thresholds]\nmedium = 20\nbig = 10\n").unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidConfig { .. }));
    }

    #[test]
    fn rejects_unsampled_reference() {
        let text = "[sampling]\naggregations = [\"mean\"]\n";
        assert!(matches!(
            AnalysisConfig::from_toml(text),
            Err(AnalysisError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn rejects_a_vanishing_angle_step() {
        let text = "[screen]\nstart_deg = 0.0\nend_deg = 180.0\nstep_deg = 1e-300\n";
        assert!(matches!(
            AnalysisConfig::from_toml(text),
            Err(AnalysisError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn rejects_malformed_toml() {
        assert!(matches!(
            AnalysisConfig::from_toml("[thresholds\nmedium = 1"),
            Err(AnalysisError::ConfigParse(_))
        ));
    }
}
