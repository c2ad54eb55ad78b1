#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Tornado event types and damage-rating definitions.
//!
//! This crate defines the event records shared by every stage of the
//! outbreak pipeline: the raw catalog record as read from disk, the
//! normalized [`Event`] with metric path dimensions and a resolved
//! [`DamageRating`], and the energy-tagged [`TaggedEvent`] consumed by the
//! day aggregator.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Catalog value used for events that were never assigned a damage rating.
pub const UNRATED_SENTINEL: i32 = -9;

/// Meters in one statute mile.
pub const METERS_PER_MILE: f64 = 1609.344;

/// Meters in one yard.
pub const METERS_PER_YARD: f64 = 0.9144;

/// Converts statute miles to meters.
#[must_use]
pub fn miles_to_meters(miles: f64) -> f64 {
    miles * METERS_PER_MILE
}

/// Converts yards to meters.
#[must_use]
pub fn yards_to_meters(yards: f64) -> f64 {
    yards * METERS_PER_YARD
}

/// Damage-intensity rating on the (Enhanced) Fujita scale, 0 through 5.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum DamageRating {
    /// Light damage
    Ef0 = 0,
    /// Moderate damage
    Ef1 = 1,
    /// Considerable damage
    Ef2 = 2,
    /// Severe damage
    Ef3 = 3,
    /// Devastating damage
    Ef4 = 4,
    /// Incredible damage
    Ef5 = 5,
}

impl DamageRating {
    /// Returns the numeric value of this rating.
    #[must_use]
    pub const fn value(self) -> u8 {
        self as u8
    }

    /// Returns the row index of this rating in per-rating lookup tables.
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Creates a rating from a numeric catalog value.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is not in the range 0-5.
    pub const fn from_value(value: i32) -> Result<Self, InvalidRatingError> {
        match value {
            0 => Ok(Self::Ef0),
            1 => Ok(Self::Ef1),
            2 => Ok(Self::Ef2),
            3 => Ok(Self::Ef3),
            4 => Ok(Self::Ef4),
            5 => Ok(Self::Ef5),
            _ => Err(InvalidRatingError { value }),
        }
    }

    /// Returns all variants of this enum, weakest first.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Ef0,
            Self::Ef1,
            Self::Ef2,
            Self::Ef3,
            Self::Ef4,
            Self::Ef5,
        ]
    }
}

/// Error returned when a numeric value does not name a [`DamageRating`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidRatingError {
    /// The invalid rating value that was provided.
    pub value: i32,
}

impl std::fmt::Display for InvalidRatingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid damage rating {}: expected 0-5", self.value)
    }
}

impl std::error::Error for InvalidRatingError {}

/// A tornado record as it appears in the source catalog.
///
/// Path dimensions are still in catalog units and the rating may be
/// missing. Converted into an [`Event`] by the energy crate's
/// normalization step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawEvent {
    /// Local civil date and time of touchdown, as recorded.
    pub timestamp: NaiveDateTime,
    /// Two-letter state abbreviation.
    pub state: String,
    /// Catalog damage rating, `None` when unrated.
    pub rating: Option<i32>,
    /// Number of injuries.
    pub injuries: u32,
    /// Number of fatalities.
    pub fatalities: u32,
    /// Touchdown longitude (degrees east).
    pub longitude: f64,
    /// Touchdown latitude (degrees north).
    pub latitude: f64,
    /// Path length in statute miles.
    pub length_mi: f64,
    /// Path width in yards.
    pub width_yd: f64,
}

impl RawEvent {
    /// Whether the catalog left this event without a rating.
    #[must_use]
    pub const fn is_unrated(&self) -> bool {
        self.rating.is_none()
    }
}

/// A normalized tornado event: rating resolved, path in meters, width
/// corrected to a single measurement convention.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    /// Local civil date and time of touchdown.
    pub timestamp: NaiveDateTime,
    /// Two-letter state abbreviation.
    pub state: String,
    /// Resolved damage rating.
    pub rating: DamageRating,
    /// Number of injuries.
    pub injuries: u32,
    /// Number of fatalities.
    pub fatalities: u32,
    /// Touchdown longitude (degrees east).
    pub longitude: f64,
    /// Touchdown latitude (degrees north).
    pub latitude: f64,
    /// Path length in meters.
    pub length_m: f64,
    /// Path width in meters.
    pub width_m: f64,
}

impl Event {
    /// Damage path area in square meters.
    #[must_use]
    pub fn path_area_m2(&self) -> f64 {
        self.length_m * self.width_m
    }
}

/// An [`Event`] with its modeled energy dissipation (watts).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaggedEvent {
    /// The underlying event.
    pub event: Event,
    /// Modeled energy dissipation.
    pub energy: f64,
}
