#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Reader for the SPC tornado catalog CSV.
//!
//! Uses the columns `yr, mo, dy, time, st, mag, inj, fat, slat, slon, len,
//! wid` and, when present, `sg`. Other columns are ignored. Rows that cannot
//! be parsed, have no touchdown location, or are state segments of a
//! longer track (`sg = 2`) are skipped and counted.

use std::io;
use std::path::Path;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use outbreak_event_models::{RawEvent, UNRATED_SENTINEL};
use serde::Deserialize;
use thiserror::Error;

/// Segment code of a per-state piece of a multi-state track.
const STATE_SEGMENT: i32 = 2;

/// Errors that abort reading the catalog.
#[derive(Debug, Error)]
pub enum IngestError {
    /// The CSV header could not be read.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// The file could not be opened.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Counts from one catalog read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestReport {
    /// Data rows seen.
    pub rows: usize,
    /// Events produced.
    pub events: usize,
    /// Events without a rating (`mag = -9`).
    pub unrated: usize,
    /// Rows with unparseable fields or an invalid date or time.
    pub malformed: usize,
    /// Rows with a zero or out-of-range touchdown point.
    pub missing_location: usize,
    /// State segments of multi-state tracks.
    pub segments: usize,
}

#[derive(Debug, Deserialize)]
struct CatalogRow {
    yr: i32,
    mo: u32,
    dy: u32,
    time: String,
    st: String,
    mag: i32,
    inj: u32,
    fat: u32,
    slat: f64,
    slon: f64,
    len: f64,
    wid: f64,
    #[serde(default)]
    sg: Option<i32>,
}

fn parse_time(text: &str) -> Option<NaiveTime> {
    let text = text.trim();
    NaiveTime::parse_from_str(text, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(text, "%H:%M"))
        .ok()
}

impl CatalogRow {
    fn timestamp(&self) -> Option<NaiveDateTime> {
        let date = NaiveDate::from_ymd_opt(self.yr, self.mo, self.dy)?;
        Some(date.and_time(parse_time(&self.time)?))
    }

    fn has_location(&self) -> bool {
        let lat_ok = self.slat.is_finite() && self.slat != 0.0 && self.slat.abs() <= 90.0;
        let lon_ok = self.slon.is_finite() && self.slon != 0.0 && self.slon.abs() <= 180.0;
        lat_ok && lon_ok
    }
}

/// Reads every usable event from catalog CSV text.
///
/// # Errors
///
/// Returns [`IngestError::Csv`] if the header row cannot be read. Bad data
/// rows are skipped, logged, and counted in the report.
pub fn read_catalog<R: io::Read>(reader: R) -> Result<(Vec<RawEvent>, IngestReport), IngestError> {
    let mut csv = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);
    csv.headers()?;

    let mut report = IngestReport::default();
    let mut events = Vec::new();

    for (i, result) in csv.deserialize::<CatalogRow>().enumerate() {
        report.rows += 1;
        let line = i + 2;

        let row = match result {
            Ok(row) => row,
            Err(e) => {
                log::warn!("Skipping catalog line {line}: {e}");
                report.malformed += 1;
                continue;
            }
        };

        if row.sg == Some(STATE_SEGMENT) {
            report.segments += 1;
            continue;
        }
        let Some(timestamp) = row.timestamp() else {
            log::warn!(
                "Skipping catalog line {line}: invalid date/time {}-{}-{} {}",
                row.yr,
                row.mo,
                row.dy,
                row.time
            );
            report.malformed += 1;
            continue;
        };
        if !row.has_location() {
            log::debug!("Skipping catalog line {line}: no touchdown location");
            report.missing_location += 1;
            continue;
        }

        let rating = (row.mag != UNRATED_SENTINEL).then_some(row.mag);
        if rating.is_none() {
            report.unrated += 1;
        }
        events.push(RawEvent {
            timestamp,
            state: row.st,
            rating,
            injuries: row.inj,
            fatalities: row.fat,
            longitude: row.slon,
            latitude: row.slat,
            length_mi: row.len,
            width_yd: row.wid,
        });
    }

    report.events = events.len();
    log::info!(
        "Read {} catalog rows: {} events ({} unrated), {} malformed, {} without location, {} state segments",
        report.rows,
        report.events,
        report.unrated,
        report.malformed,
        report.missing_location,
        report.segments
    );
    Ok((events, report))
}

/// Reads the catalog from a file.
///
/// # Errors
///
/// Returns [`IngestError`] if the file cannot be opened or its header read.
pub fn load_catalog(path: &Path) -> Result<(Vec<RawEvent>, IngestReport), IngestError> {
    log::info!("Reading tornado catalog {}", path.display());
    let file = std::fs::File::open(path)?;
    read_catalog(io::BufReader::new(file))
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "om,yr,mo,dy,date,time,tz,st,stf,stn,mag,inj,fat,loss,closs,slat,slon,elat,elon,len,wid,ns,sn,sg";

    fn catalog(rows: &[&str]) -> String {
        let mut text = String::from(HEADER);
        for row in rows {
            text.push('\n');
            text.push_str(row);
        }
        text
    }

    #[test]
    fn reads_rated_and_unrated_events() {
        let text = catalog(&[
            "1,2011,4,27,2011-04-27,15:05:00,3,AL,1,0,4,100,20,0,0,33.03,-87.62,33.57,-86.60,80.7,2600,1,1,1",
            "2,2016,5,9,2016-05-09,05:40:00,3,OK,40,0,-9,0,0,0,0,34.5,-97.1,34.55,-97.0,0.5,30,1,1,1",
        ]);
        let (events, report) = read_catalog(text.as_bytes()).unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(report.unrated, 1);

        let first = &events[0];
        assert_eq!(first.rating, Some(4));
        assert_eq!(first.state, "AL");
        assert_eq!(first.fatalities, 20);
        assert!((first.length_mi - 80.7).abs() < 1e-12);
        assert!((first.width_yd - 2600.0).abs() < 1e-12);
        assert_eq!(first.timestamp.to_string(), "2011-04-27 15:05:00");

        assert!(events[1].is_unrated());
    }

    #[test]
    fn skips_bad_rows_and_segments() {
        let text = catalog(&[
            "1,2011,4,27,2011-04-27,15:05:00,3,AL,1,0,4,100,20,0,0,33.03,-87.62,0,0,80.7,2600,2,1,1",
            "1,2011,4,27,2011-04-27,15:05:00,3,AL,1,0,4,50,10,0,0,33.03,-87.62,0,0,40.0,2600,2,0,2",
            "3,2011,2,30,2011-02-30,12:00:00,3,TX,48,0,1,0,0,0,0,31.0,-97.0,0,0,1.0,50,1,1,1",
            "4,2011,5,1,2011-05-01,noon,3,TX,48,0,1,0,0,0,0,31.0,-97.0,0,0,1.0,50,1,1,1",
            "5,2011,5,2,2011-05-02,12:00:00,3,TX,48,0,one,0,0,0,0,31.0,-97.0,0,0,1.0,50,1,1,1",
            "6,2011,5,3,2011-05-03,12:00:00,3,TX,48,0,0,0,0,0,0,0.0,0.0,0,0,1.0,50,1,1,1",
        ]);
        let (events, report) = read_catalog(text.as_bytes()).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(
            report,
            IngestReport {
                rows: 6,
                events: 1,
                unrated: 0,
                malformed: 3,
                missing_location: 1,
                segments: 1,
            }
        );
    }

    #[test]
    fn sg_column_is_optional() {
        let text = "yr,mo,dy,time,st,mag,inj,fat,slat,slon,len,wid\n1999,5,3,18:26,OK,5,583,36,35.0,-97.9,37.0,1430\n";
        let (events, report) = read_catalog(text.as_bytes()).unwrap();
        assert_eq!(report.events, 1);
        assert_eq!(events[0].timestamp.to_string(), "1999-05-03 18:26:00");
    }
}
