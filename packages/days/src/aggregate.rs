//! Grouping events into convective days and classifying outbreak days.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use outbreak_event_models::{DamageRating, TaggedEvent};
use serde::{Deserialize, Serialize};

use crate::{DaysError, convective::convective_day, stats};

/// Default event count for a medium outbreak day.
pub const DEFAULT_MEDIUM_THRESHOLD: usize = 10;

/// Default event count for a big outbreak day.
pub const DEFAULT_BIG_THRESHOLD: usize = 20;

/// Event-count thresholds. `big >= medium >= 1` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Thresholds {
    medium: usize,
    big: usize,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            medium: DEFAULT_MEDIUM_THRESHOLD,
            big: DEFAULT_BIG_THRESHOLD,
        }
    }
}

impl Thresholds {
    /// Creates a validated threshold pair.
    ///
    /// # Errors
    ///
    /// Returns [`DaysError::InvalidThresholds`] if `big < medium` or
    /// `medium` is zero.
    pub const fn new(medium: usize, big: usize) -> Result<Self, DaysError> {
        if medium == 0 || big < medium {
            return Err(DaysError::InvalidThresholds { medium, big });
        }
        Ok(Self { medium, big })
    }

    /// Minimum event count for a medium day.
    #[must_use]
    pub const fn medium(&self) -> usize {
        self.medium
    }

    /// Minimum event count for a big (outbreak) day.
    #[must_use]
    pub const fn big(&self) -> usize {
        self.big
    }
}

/// The events of one 06:00-to-06:00 convective day, ordered by time.
#[derive(Debug, Clone, PartialEq)]
pub struct ConvectiveDay {
    /// Calendar date the day is named for.
    pub date: NaiveDate,
    /// Member events in timestamp order.
    pub events: Vec<TaggedEvent>,
}

impl ConvectiveDay {
    /// Number of events on this day.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether the day has no events.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Summary statistics over the day's events.
    ///
    /// # Errors
    ///
    /// Returns [`DaysError::EmptyDay`] for a day without events and
    /// [`DaysError::NonPositiveEnergy`] if any energy is not strictly
    /// positive.
    pub fn stats(&self) -> Result<DayStats, DaysError> {
        if self.events.is_empty() {
            return Err(DaysError::EmptyDay { date: self.date });
        }

        let mut energies: Vec<f64> = self.events.iter().map(|e| e.energy).collect();
        let geometric_mean_energy =
            stats::geometric_mean(&energies).map_err(|energy| DaysError::NonPositiveEnergy {
                date: self.date,
                energy,
            })?;
        energies.sort_by(f64::total_cmp);

        Ok(DayStats {
            date: self.date,
            count: self.events.len(),
            total_energy: energies.iter().sum(),
            geometric_mean_energy,
            median_energy: stats::quantile_sorted(&energies, 0.5),
            q75_energy: stats::quantile_sorted(&energies, 0.75),
            q95_energy: stats::quantile_sorted(&energies, 0.95),
            max_rating: self
                .events
                .iter()
                .map(|e| e.event.rating)
                .max()
                .unwrap_or(DamageRating::Ef0),
            injuries: self.events.iter().map(|e| e.event.injuries).sum(),
            fatalities: self.events.iter().map(|e| e.event.fatalities).sum(),
        })
    }
}

/// Day-level statistics of a convective day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayStats {
    /// Convective day.
    pub date: NaiveDate,
    /// Number of events (nT).
    pub count: usize,
    /// Accumulated tornado energy (ATE), the sum over events.
    pub total_energy: f64,
    /// `exp(mean(ln energy))`.
    pub geometric_mean_energy: f64,
    /// Median event energy.
    pub median_energy: f64,
    /// 75th percentile event energy.
    pub q75_energy: f64,
    /// 95th percentile event energy.
    pub q95_energy: f64,
    /// Strongest rating of the day.
    pub max_rating: DamageRating,
    /// Total injuries.
    pub injuries: u32,
    /// Total fatalities.
    pub fatalities: u32,
}

/// A convective day together with its statistics.
#[derive(Debug, Clone, PartialEq)]
pub struct DayGroup {
    /// The grouped events.
    pub day: ConvectiveDay,
    /// Statistics of the events.
    pub stats: DayStats,
}

/// Groups tagged events by convective day. Days come back in date order,
/// events within a day in timestamp order.
#[must_use]
pub fn group_by_convective_day(events: Vec<TaggedEvent>) -> Vec<ConvectiveDay> {
    let mut by_date: BTreeMap<NaiveDate, Vec<TaggedEvent>> = BTreeMap::new();
    for event in events {
        by_date
            .entry(convective_day(event.event.timestamp))
            .or_default()
            .push(event);
    }

    by_date
        .into_iter()
        .map(|(date, mut events)| {
            events.sort_by_key(|e| e.event.timestamp);
            ConvectiveDay { date, events }
        })
        .collect()
}

/// Groups events into days and classifies medium and big outbreak days.
#[derive(Debug, Clone, Copy, Default)]
pub struct OutbreakAggregator {
    thresholds: Thresholds,
}

impl OutbreakAggregator {
    /// Creates an aggregator with the given thresholds.
    #[must_use]
    pub const fn new(thresholds: Thresholds) -> Self {
        Self { thresholds }
    }

    /// Groups `events` and keeps the days meeting the medium threshold.
    ///
    /// # Errors
    ///
    /// Returns [`DaysError::NonPositiveEnergy`] if a retained day has an
    /// event with non-positive energy.
    pub fn aggregate(&self, events: Vec<TaggedEvent>) -> Result<Outbreaks, DaysError> {
        let days = group_by_convective_day(events);
        let total_days = days.len();

        let groups = days
            .into_iter()
            .filter(|day| day.len() >= self.thresholds.medium())
            .map(|day| {
                let stats = day.stats()?;
                Ok(DayGroup { day, stats })
            })
            .collect::<Result<Vec<_>, DaysError>>()?;

        let outbreaks = Outbreaks {
            thresholds: self.thresholds,
            total_days,
            groups,
        };

        log::info!(
            "Grouped events into {total_days} convective days: {} medium days (>= {}), \
             {} big days (>= {})",
            outbreaks.med_days().count(),
            self.thresholds.medium(),
            outbreaks.big_days().count(),
            self.thresholds.big(),
        );

        Ok(outbreaks)
    }
}

/// Result of outbreak classification.
///
/// Only days meeting the medium threshold are kept; big days are a filter
/// over the same set, so every big day is also a medium day.
#[derive(Debug, Clone, PartialEq)]
pub struct Outbreaks {
    thresholds: Thresholds,
    total_days: usize,
    groups: Vec<DayGroup>,
}

impl Outbreaks {
    /// Thresholds used for classification.
    #[must_use]
    pub const fn thresholds(&self) -> Thresholds {
        self.thresholds
    }

    /// Number of convective days with at least one event.
    #[must_use]
    pub const fn total_days(&self) -> usize {
        self.total_days
    }

    /// Days with at least the medium threshold of events, in date order.
    pub fn med_days(&self) -> impl Iterator<Item = &DayGroup> {
        self.groups.iter()
    }

    /// Days with at least the big threshold of events, in date order.
    pub fn big_days(&self) -> impl Iterator<Item = &DayGroup> {
        let big = self.thresholds.big();
        self.groups.iter().filter(move |g| g.stats.count >= big)
    }

    /// Dates of every medium day.
    #[must_use]
    pub fn med_dates(&self) -> BTreeSet<NaiveDate> {
        self.groups.iter().map(|g| g.day.date).collect()
    }

    /// Looks up a medium day by date.
    #[must_use]
    pub fn get(&self, date: NaiveDate) -> Option<&DayGroup> {
        self.groups
            .binary_search_by_key(&date, |g| g.day.date)
            .ok()
            .map(|i| &self.groups[i])
    }

    /// The `n` big days with the highest total energy; ties go to the
    /// earlier date.
    #[must_use]
    pub fn top_by_energy(&self, n: usize) -> Vec<&DayGroup> {
        let mut days: Vec<&DayGroup> = self.big_days().collect();
        days.sort_by(|a, b| {
            b.stats
                .total_energy
                .total_cmp(&a.stats.total_energy)
                .then_with(|| a.day.date.cmp(&b.day.date))
        });
        days.truncate(n);
        days
    }

    /// Empirical month-of-year frequency of big days, indexed January
    /// first. Months without big days carry zero.
    #[must_use]
    pub fn big_day_month_counts(&self) -> [usize; 12] {
        use chrono::Datelike as _;

        let mut counts = [0usize; 12];
        for group in self.big_days() {
            counts[group.day.date.month0() as usize] += 1;
        }
        counts
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDateTime;
    use outbreak_energy::EnergyModel;
    use outbreak_event_models::{Event, miles_to_meters, yards_to_meters};

    use super::*;

    fn ts(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    fn tagged(model: &EnergyModel, timestamp: NaiveDateTime, rating: DamageRating) -> TaggedEvent {
        let event = Event {
            timestamp,
            state: "KS".to_string(),
            rating,
            injuries: 1,
            fatalities: 0,
            longitude: -98.0,
            latitude: 38.0,
            length_m: miles_to_meters(1.0),
            width_m: yards_to_meters(50.0),
        };
        let energy = model.energy(&event).unwrap();
        TaggedEvent { event, energy }
    }

    fn day_of(model: &EnergyModel, date: (i32, u32, u32), n: usize) -> Vec<TaggedEvent> {
        (0..n)
            .map(|i| {
                tagged(
                    model,
                    ts(date.0, date.1, date.2, 12 + (i % 10) as u32),
                    DamageRating::Ef1,
                )
            })
            .collect()
    }

    #[test]
    fn rejects_inverted_thresholds() {
        assert!(Thresholds::new(10, 5).is_err());
        assert!(Thresholds::new(0, 5).is_err());
        assert!(Thresholds::new(5, 5).is_ok());
    }

    #[test]
    fn three_event_day_meets_medium_threshold() {
        let model = EnergyModel::new();
        let events = vec![
            tagged(&model, ts(1990, 6, 2, 16), DamageRating::Ef1),
            tagged(&model, ts(1990, 6, 2, 19), DamageRating::Ef1),
            // 02:00 the next morning still belongs to June 2nd.
            tagged(&model, ts(1990, 6, 3, 2), DamageRating::Ef3),
        ];

        let outbreaks = OutbreakAggregator::new(Thresholds::new(3, 3).unwrap())
            .aggregate(events)
            .unwrap();

        let day = outbreaks
            .get(NaiveDate::from_ymd_opt(1990, 6, 2).unwrap())
            .unwrap();
        assert_eq!(day.stats.count, 3);
        let expected = 1.359_727e10;
        assert!(
            ((day.stats.total_energy - expected) / expected).abs() < 5e-7,
            "ATE {} differs from {expected}",
            day.stats.total_energy
        );
        assert_eq!(day.stats.max_rating, DamageRating::Ef3);
        assert_eq!(day.stats.injuries, 3);
    }

    #[test]
    fn big_days_are_subset_of_medium_days() {
        let model = EnergyModel::new();
        let mut events = day_of(&model, (2011, 4, 27), 25);
        events.extend(day_of(&model, (2011, 4, 15), 12));
        events.extend(day_of(&model, (2011, 5, 24), 4));

        for (medium, big) in [(1, 1), (5, 20), (10, 12), (12, 30), (4, 4)] {
            let outbreaks = OutbreakAggregator::new(Thresholds::new(medium, big).unwrap())
                .aggregate(events.clone())
                .unwrap();
            let med = outbreaks.med_dates();
            for group in outbreaks.big_days() {
                assert!(med.contains(&group.day.date));
                assert!(group.stats.count >= big);
            }
            assert!(outbreaks.med_days().all(|g| g.stats.count >= medium));
        }
    }

    #[test]
    fn top_listing_orders_by_energy_then_date() {
        let model = EnergyModel::new();
        let mut events = day_of(&model, (2000, 5, 1), 3);
        events.extend(day_of(&model, (2000, 4, 1), 3));
        events.extend(day_of(&model, (2000, 6, 1), 5));

        let outbreaks = OutbreakAggregator::new(Thresholds::new(3, 3).unwrap())
            .aggregate(events)
            .unwrap();
        let top: Vec<NaiveDate> = outbreaks
            .top_by_energy(3)
            .iter()
            .map(|g| g.day.date)
            .collect();

        assert_eq!(
            top,
            vec![
                NaiveDate::from_ymd_opt(2000, 6, 1).unwrap(),
                NaiveDate::from_ymd_opt(2000, 4, 1).unwrap(),
                NaiveDate::from_ymd_opt(2000, 5, 1).unwrap(),
            ]
        );
    }

    #[test]
    fn stats_fail_on_non_positive_energy() {
        let model = EnergyModel::new();
        let mut events = day_of(&model, (2000, 5, 1), 2);
        events[1].energy = 0.0;
        let day = ConvectiveDay {
            date: NaiveDate::from_ymd_opt(2000, 5, 1).unwrap(),
            events,
        };
        assert!(matches!(
            day.stats(),
            Err(DaysError::NonPositiveEnergy { .. })
        ));
    }

    #[test]
    fn month_counts_cover_all_twelve_months() {
        let model = EnergyModel::new();
        let mut events = day_of(&model, (2001, 4, 10), 3);
        events.extend(day_of(&model, (2002, 4, 11), 3));
        events.extend(day_of(&model, (2002, 11, 9), 3));

        let outbreaks = OutbreakAggregator::new(Thresholds::new(3, 3).unwrap())
            .aggregate(events)
            .unwrap();
        let counts = outbreaks.big_day_month_counts();
        assert_eq!(counts.len(), 12);
        assert_eq!(counts[3], 2);
        assert_eq!(counts[10], 1);
        assert_eq!(counts.iter().sum::<usize>(), 3);
    }
}
