//! Summary of a finished run.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use outbreak_days::Outbreaks;
use outbreak_environment_models::DayKind;
use outbreak_table::DayTable;

use crate::pipeline::{FieldScreen, PreparedEvents};

/// A day that could not be sampled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingDay {
    pub date: NaiveDate,
    pub kind: DayKind,
    pub reason: String,
}

/// Extremum of one correlation screen.
#[derive(Debug, Clone, PartialEq)]
pub struct ScreenSummary {
    pub column: String,
    /// Complete days screened.
    pub n: usize,
    /// `None` when the correlation is undefined at every angle.
    pub max_abs_r: Option<f64>,
    pub angles: Vec<f64>,
    /// Angles at or below the significance threshold.
    pub significant: usize,
}

/// Counts and per-day outcomes of a run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    /// Events inside the study interval.
    pub events: usize,
    /// Days at or above the medium threshold.
    pub medium_days: usize,
    /// Days at or above the big threshold.
    pub outbreak_days: usize,
    /// Baseline rows in the day table.
    pub baseline_days: usize,
    /// Rows per status label (`sampled`, `missing`, `out_of_range`).
    pub status_counts: BTreeMap<String, usize>,
    /// Days whose sampling failed, with the reason.
    pub missing: Vec<MissingDay>,
    /// One summary per screened field column.
    pub screens: Vec<ScreenSummary>,
}

impl RunReport {
    /// Tallies the run's events, day classes, and table statuses.
    #[must_use]
    pub fn new(
        events: &PreparedEvents,
        outbreaks: &Outbreaks,
        table: &DayTable,
        screens: &[FieldScreen],
    ) -> Self {
        let count = |kind| table.records().iter().filter(|r| r.kind == kind).count();
        Self {
            events: events.events.len(),
            medium_days: outbreaks.med_days().count(),
            outbreak_days: count(DayKind::Outbreak),
            baseline_days: count(DayKind::Baseline),
            status_counts: table
                .status_counts()
                .into_iter()
                .map(|(label, n)| (label.to_string(), n))
                .collect(),
            missing: table
                .records()
                .iter()
                .filter_map(|r| {
                    r.status.reason().map(|reason| MissingDay {
                        date: r.date,
                        kind: r.kind,
                        reason: reason.to_string(),
                    })
                })
                .collect(),
            screens: screens
                .iter()
                .map(|s| ScreenSummary {
                    column: s.column.clone(),
                    n: s.profile.n,
                    max_abs_r: s.profile.max_abs_r(),
                    angles: s.profile.max_abs_angles(),
                    significant: s.profile.significant().len(),
                })
                .collect(),
        }
    }

    /// Rows with the given status label.
    #[must_use]
    pub fn status_count(&self, label: &str) -> usize {
        self.status_counts.get(label).copied().unwrap_or(0)
    }

    /// Logs the summary and each missing day.
    pub fn log(&self) {
        log::info!(
            "{} events, {} medium days, {} outbreak days, {} baseline days",
            self.events,
            self.medium_days,
            self.outbreak_days,
            self.baseline_days
        );
        log::info!(
            "Sampling: {} sampled, {} missing, {} out of range",
            self.status_count("sampled"),
            self.status_count("missing"),
            self.status_count("out_of_range"),
        );
        for day in &self.missing {
            log::warn!("Missing {} {}: {}", day.kind, day.date, day.reason);
        }
        for screen in &self.screens {
            match screen.max_abs_r {
                Some(r) => log::info!(
                    "Screen {}: max |r| {r:.3} at {:?}° (n = {}, {} significant)",
                    screen.column,
                    screen.angles,
                    screen.n,
                    screen.significant
                ),
                None => log::info!("Screen {}: undefined (n = {})", screen.column, screen.n),
            }
        }
    }
}
