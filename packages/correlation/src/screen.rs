//! Angular correlation screen.
//!
//! For each angle θ in a range the combination `cos(θ)·X + sin(θ)·Y` is
//! correlated with a reference series. θ = 0 reproduces `corr(X, ref)`,
//! θ = 90 reproduces `corr(Y, ref)`, and the angle of largest `|r|` is the
//! direction in the `(X, Y)` plane the reference varies along most.

use serde::{Deserialize, Serialize};

use crate::{CorrelationError, fisher_test, pearson};

/// Tolerance for treating two `|r|` values as tied.
const TIE_TOLERANCE: f64 = 1e-12;

/// Most angles a single scan may hold (a full turn at 0.01°).
pub const MAX_ANGLES: usize = 36_001;

/// Angles scanned, in degrees, both ends inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct AngleRange {
    /// First angle scanned.
    pub start_deg: f64,
    /// Last angle scanned, if the step lands on it.
    pub end_deg: f64,
    /// Spacing between consecutive angles.
    pub step_deg: f64,
}

impl Default for AngleRange {
    fn default() -> Self {
        Self::half_turn()
    }
}

impl AngleRange {
    /// 1° to 180° in 1° steps. Opposite angles only flip the sign of `r`.
    #[must_use]
    pub const fn half_turn() -> Self {
        Self {
            start_deg: 1.0,
            end_deg: 180.0,
            step_deg: 1.0,
        }
    }

    /// -90° to 270° in 1° steps, for a signed (directional) profile.
    #[must_use]
    pub const fn full_turn() -> Self {
        Self {
            start_deg: -90.0,
            end_deg: 270.0,
            step_deg: 1.0,
        }
    }

    /// Every angle in the range.
    ///
    /// # Errors
    ///
    /// Returns [`CorrelationError::InvalidAngleRange`] if a bound or the
    /// step is not finite, the step is not positive, `start > end`, or the
    /// range holds more than [`MAX_ANGLES`] angles.
    pub fn angles(&self) -> Result<Vec<f64>, CorrelationError> {
        let Self {
            start_deg,
            end_deg,
            step_deg,
        } = *self;
        if !start_deg.is_finite() || !end_deg.is_finite() || !step_deg.is_finite() {
            return Err(CorrelationError::InvalidAngleRange {
                message: format!("{start_deg}..={end_deg} step {step_deg} is not finite"),
            });
        }
        if step_deg <= 0.0 || start_deg > end_deg {
            return Err(CorrelationError::InvalidAngleRange {
                message: format!("{start_deg}..={end_deg} step {step_deg} is empty"),
            });
        }

        let intervals = ((end_deg - start_deg) / step_deg + 1e-9).floor();
        #[allow(clippy::cast_precision_loss)]
        let limit = MAX_ANGLES as f64;
        if !intervals.is_finite() || intervals >= limit {
            return Err(CorrelationError::InvalidAngleRange {
                message: format!(
                    "{start_deg}..={end_deg} step {step_deg} exceeds {MAX_ANGLES} angles"
                ),
            });
        }
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let steps = intervals as usize;
        #[allow(clippy::cast_precision_loss)]
        let angles = (0..=steps)
            .map(|i| step_deg.mul_add(i as f64, start_deg))
            .collect();
        Ok(angles)
    }
}

/// Correlation at one angle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScreenPoint {
    /// Rotation angle in degrees.
    pub angle_deg: f64,
    /// Pearson correlation with the reference. NaN when undefined.
    pub r: f64,
    /// Two-sided p-value from the Fisher z-test.
    pub p_value: f64,
    /// Lower confidence bound on `r`.
    pub ci_low: f64,
    /// Upper confidence bound on `r`.
    pub ci_high: f64,
}

/// The full angular profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScreenProfile {
    /// One point per angle, in scan order.
    pub points: Vec<ScreenPoint>,
    /// Complete cases used.
    pub n: usize,
    /// Threshold applied by [`ScreenProfile::significant`].
    pub significance: f64,
}

impl ScreenProfile {
    /// Largest `|r|` over angles with a defined correlation.
    #[must_use]
    pub fn max_abs_r(&self) -> Option<f64> {
        self.points
            .iter()
            .map(|p| p.r.abs())
            .filter(|r| !r.is_nan())
            .reduce(f64::max)
    }

    /// Every angle attaining the largest `|r|`, in scan order.
    #[must_use]
    pub fn max_abs_angles(&self) -> Vec<f64> {
        let Some(max) = self.max_abs_r() else {
            return Vec::new();
        };
        self.points
            .iter()
            .filter(|p| (p.r.abs() - max).abs() <= TIE_TOLERANCE)
            .map(|p| p.angle_deg)
            .collect()
    }

    /// Points whose p-value is at or below the significance threshold.
    #[must_use]
    pub fn significant(&self) -> Vec<&ScreenPoint> {
        self.points
            .iter()
            .filter(|p| p.p_value <= self.significance)
            .collect()
    }

    /// Point at `angle_deg`, if scanned.
    #[must_use]
    pub fn at(&self, angle_deg: f64) -> Option<&ScreenPoint> {
        self.points
            .iter()
            .find(|p| (p.angle_deg - angle_deg).abs() < 1e-9)
    }
}

/// Scans `cos(θ)·x + sin(θ)·y` against `reference` over `range`.
///
/// Rows where any of the three series is NaN or infinite are dropped
/// first. Angles where the combination or the reference has zero
/// variance get NaN for every statistic.
///
/// # Errors
///
/// Returns [`CorrelationError::LengthMismatch`] for unequal lengths and
/// propagates invalid ranges or significance levels.
pub fn screen(
    x: &[f64],
    y: &[f64],
    reference: &[f64],
    range: &AngleRange,
    significance: f64,
) -> Result<ScreenProfile, CorrelationError> {
    for other in [y.len(), reference.len()] {
        if other != x.len() {
            return Err(CorrelationError::LengthMismatch {
                left: x.len(),
                right: other,
            });
        }
    }
    let angles = range.angles()?;

    let complete: Vec<(f64, f64, f64)> = x
        .iter()
        .zip(y)
        .zip(reference)
        .map(|((a, b), c)| (*a, *b, *c))
        .filter(|(a, b, c)| a.is_finite() && b.is_finite() && c.is_finite())
        .collect();
    if complete.len() < x.len() {
        log::debug!(
            "Correlation screen dropped {} incomplete rows of {}",
            x.len() - complete.len(),
            x.len()
        );
    }
    let n = complete.len();
    let reference: Vec<f64> = complete.iter().map(|(_, _, c)| *c).collect();

    let mut points = Vec::with_capacity(angles.len());
    let mut combination = vec![0.0; n];
    for angle_deg in angles {
        let (sin, cos) = angle_deg.to_radians().sin_cos();
        for (slot, (a, b, _)) in combination.iter_mut().zip(&complete) {
            *slot = cos.mul_add(*a, sin * b);
        }
        let r = pearson(&combination, &reference)?;
        let test = fisher_test(r, n, significance)?;
        points.push(ScreenPoint {
            angle_deg,
            r,
            p_value: test.p_value,
            ci_low: test.ci_low,
            ci_high: test.ci_high,
        });
    }

    Ok(ScreenProfile {
        points,
        n,
        significance,
    })
}
