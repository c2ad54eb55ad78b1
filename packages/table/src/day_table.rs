//! The persisted day-level table.

use std::collections::{BTreeMap, BTreeSet};
use std::io;
use std::path::Path;

use chrono::NaiveDate;
use outbreak_days::DayStats;
use outbreak_environment_models::{DayKind, DaySamples, SampleStatus};

use crate::TableError;

/// Columns every table starts with, before the pivoted sample columns.
pub const FIXED_COLUMNS: [&str; 14] = [
    "date",
    "kind",
    "status",
    "reason",
    "n_events",
    "ate",
    "gm_energy",
    "median_energy",
    "q75_energy",
    "q95_energy",
    "centroid_x",
    "centroid_y",
    "area_km2",
    "footprint",
];

/// One row: a sampled day.
///
/// Energy and hull columns are empty for baseline days.
#[derive(Debug, Clone, PartialEq)]
pub struct DayRecord {
    pub date: NaiveDate,
    pub kind: DayKind,
    pub status: SampleStatus,
    /// Events on the day (nT); zero for baseline days.
    pub n_events: usize,
    /// Accumulated tornado energy.
    pub ate: Option<f64>,
    pub gm_energy: Option<f64>,
    pub median_energy: Option<f64>,
    pub q75_energy: Option<f64>,
    pub q95_energy: Option<f64>,
    /// Hull centroid in projected meters.
    pub centroid_x: Option<f64>,
    pub centroid_y: Option<f64>,
    /// Hull area.
    pub area_km2: Option<f64>,
    /// Footprint kind sampled over (`area`, `disc`, or `region`).
    pub footprint: Option<String>,
    /// Sample values keyed by `{field}_{aggregation}`.
    pub samples: BTreeMap<String, f64>,
}

impl DayRecord {
    /// A row with no statistics and no samples yet.
    #[must_use]
    pub const fn new(date: NaiveDate, kind: DayKind) -> Self {
        Self {
            date,
            kind,
            status: SampleStatus::OutOfRange,
            n_events: 0,
            ate: None,
            gm_energy: None,
            median_energy: None,
            q75_energy: None,
            q95_energy: None,
            centroid_x: None,
            centroid_y: None,
            area_km2: None,
            footprint: None,
            samples: BTreeMap::new(),
        }
    }

    /// Fills the event-count and energy columns.
    #[must_use]
    pub fn with_stats(mut self, stats: &DayStats) -> Self {
        self.n_events = stats.count;
        self.ate = Some(stats.total_energy);
        self.gm_energy = Some(stats.geometric_mean_energy);
        self.median_energy = Some(stats.median_energy);
        self.q75_energy = Some(stats.q75_energy);
        self.q95_energy = Some(stats.q95_energy);
        self
    }

    /// Takes the status and pivots the samples into columns.
    #[must_use]
    pub fn with_samples(mut self, day: DaySamples) -> Self {
        self.status = day.status;
        self.samples = day
            .samples
            .into_iter()
            .map(|s| (s.column(), s.value))
            .collect();
        self
    }

    /// Value of a sample column.
    #[must_use]
    pub fn sample(&self, column: &str) -> Option<f64> {
        self.samples.get(column).copied()
    }
}

/// All rows of a run, in date order per kind as produced by the pipeline.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DayTable {
    columns: Vec<String>,
    records: Vec<DayRecord>,
}

impl DayTable {
    /// Builds a table whose sample columns are the union of the records'
    /// sample keys, sorted.
    #[must_use]
    pub fn new(records: Vec<DayRecord>) -> Self {
        let columns: BTreeSet<&String> = records.iter().flat_map(|r| r.samples.keys()).collect();
        let columns = columns.into_iter().cloned().collect();
        Self { columns, records }
    }

    /// Pivoted sample column names.
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    #[must_use]
    pub fn records(&self) -> &[DayRecord] {
        &self.records
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Rows of `kind` that were sampled successfully.
    pub fn sampled(&self, kind: DayKind) -> impl Iterator<Item = &DayRecord> {
        self.records
            .iter()
            .filter(move |r| r.kind == kind && r.status == SampleStatus::Sampled)
    }

    /// Count of rows per status label.
    #[must_use]
    pub fn status_counts(&self) -> BTreeMap<&'static str, usize> {
        let mut counts = BTreeMap::new();
        for record in &self.records {
            *counts.entry(record.status.label()).or_insert(0) += 1;
        }
        counts
    }

    /// Writes the table as CSV.
    ///
    /// # Errors
    ///
    /// Returns [`TableError::Csv`] if writing fails.
    pub fn write<W: io::Write>(&self, writer: W) -> Result<(), TableError> {
        let mut csv = csv::Writer::from_writer(writer);
        csv.write_record(
            FIXED_COLUMNS
                .iter()
                .copied()
                .chain(self.columns.iter().map(String::as_str)),
        )?;

        for record in &self.records {
            let mut row = vec![
                record.date.to_string(),
                record.kind.to_string(),
                record.status.label().to_string(),
                record.status.reason().unwrap_or_default().to_string(),
                record.n_events.to_string(),
                fmt_opt(record.ate),
                fmt_opt(record.gm_energy),
                fmt_opt(record.median_energy),
                fmt_opt(record.q75_energy),
                fmt_opt(record.q95_energy),
                fmt_opt(record.centroid_x),
                fmt_opt(record.centroid_y),
                fmt_opt(record.area_km2),
                record.footprint.clone().unwrap_or_default(),
            ];
            row.extend(self.columns.iter().map(|c| fmt_opt(record.sample(c))));
            csv.write_record(&row)?;
        }
        csv.flush()?;
        Ok(())
    }

    /// Reads a table written by [`DayTable::write`]. Every column after
    /// the fixed ones is a sample column.
    ///
    /// # Errors
    ///
    /// Returns [`TableError`] if a fixed column is missing or a cell cannot
    /// be parsed.
    pub fn read<R: io::Read>(reader: R) -> Result<Self, TableError> {
        let mut csv = csv::Reader::from_reader(reader);
        let headers = csv.headers()?.clone();

        let mut fixed = [0usize; FIXED_COLUMNS.len()];
        for (slot, name) in fixed.iter_mut().zip(FIXED_COLUMNS) {
            *slot = headers
                .iter()
                .position(|h| h == name)
                .ok_or(TableError::MissingColumn(name))?;
        }
        let sample_columns: Vec<(usize, String)> = headers
            .iter()
            .enumerate()
            .filter(|(_, h)| !FIXED_COLUMNS.contains(h))
            .map(|(i, h)| (i, h.to_string()))
            .collect();

        let mut records = Vec::new();
        for (i, row) in csv.records().enumerate() {
            let row = row?;
            let cells = Cells { row: &row, number: i + 1 };
            let get = |c: usize| cells.text(fixed[c]);

            let status = match get(2) {
                "sampled" => SampleStatus::Sampled,
                "missing" => SampleStatus::Missing {
                    reason: get(3).to_string(),
                },
                "out_of_range" => SampleStatus::OutOfRange,
                other => return Err(cells.invalid("status", other)),
            };

            let mut samples = BTreeMap::new();
            for (index, name) in &sample_columns {
                if let Some(value) = cells.opt_f64(*index, name)? {
                    samples.insert(name.clone(), value);
                }
            }

            records.push(DayRecord {
                date: get(0)
                    .parse()
                    .map_err(|_| cells.invalid("date", get(0)))?,
                kind: get(1)
                    .parse()
                    .map_err(|_| cells.invalid("kind", get(1)))?,
                status,
                n_events: get(4)
                    .parse()
                    .map_err(|_| cells.invalid("n_events", get(4)))?,
                ate: cells.opt_f64(fixed[5], "ate")?,
                gm_energy: cells.opt_f64(fixed[6], "gm_energy")?,
                median_energy: cells.opt_f64(fixed[7], "median_energy")?,
                q75_energy: cells.opt_f64(fixed[8], "q75_energy")?,
                q95_energy: cells.opt_f64(fixed[9], "q95_energy")?,
                centroid_x: cells.opt_f64(fixed[10], "centroid_x")?,
                centroid_y: cells.opt_f64(fixed[11], "centroid_y")?,
                area_km2: cells.opt_f64(fixed[12], "area_km2")?,
                footprint: Some(get(13).to_string()).filter(|s| !s.is_empty()),
                samples,
            });
        }

        Ok(Self {
            columns: sample_columns.into_iter().map(|(_, name)| name).collect(),
            records,
        })
    }

    /// Writes the table to `path`.
    ///
    /// # Errors
    ///
    /// Returns [`TableError`] if the file cannot be created or written.
    pub fn save(&self, path: &Path) -> Result<(), TableError> {
        let file = std::fs::File::create(path)?;
        self.write(io::BufWriter::new(file))?;
        log::info!("Wrote {} day rows to {}", self.len(), path.display());
        Ok(())
    }

    /// Reads the table from `path`.
    ///
    /// # Errors
    ///
    /// Returns [`TableError`] if the file cannot be opened or parsed.
    pub fn load(path: &Path) -> Result<Self, TableError> {
        let file = std::fs::File::open(path)?;
        let table = Self::read(io::BufReader::new(file))?;
        log::info!("Read {} day rows from {}", table.len(), path.display());
        Ok(table)
    }
}

fn fmt_opt(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

struct Cells<'a> {
    row: &'a csv::StringRecord,
    number: usize,
}

impl<'a> Cells<'a> {
    fn text(&self, index: usize) -> &'a str {
        self.row.get(index).unwrap_or_default()
    }

    fn opt_f64(&self, index: usize, column: &str) -> Result<Option<f64>, TableError> {
        let text = self.text(index).trim();
        if text.is_empty() {
            return Ok(None);
        }
        text.parse()
            .map(Some)
            .map_err(|_| self.invalid(column, text))
    }

    fn invalid(&self, column: &str, value: &str) -> TableError {
        TableError::InvalidValue {
            row: self.number,
            column: column.to_string(),
            value: value.to_string(),
        }
    }
}
