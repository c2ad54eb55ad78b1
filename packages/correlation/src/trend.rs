//! Ordinary least-squares trend of a series against time.

use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF as _, StudentsT};

use crate::stats::mean;
use crate::{CorrelationError, pearson};

/// Fitted line `y = intercept + slope * x` with a t-test on the slope.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinearTrend {
    pub slope: f64,
    pub intercept: f64,
    /// Pearson correlation of `x` and `y`.
    pub r: f64,
    /// Two-sided p-value of the slope against zero (n - 2 degrees of freedom).
    pub p_value: f64,
    pub n: usize,
}

/// Fits `y` against `x`, skipping pairs with a non-finite value.
///
/// With fewer than three pairs or a constant `x` every statistic is NaN.
///
/// # Errors
///
/// Returns [`CorrelationError::LengthMismatch`] for unequal lengths.
pub fn linear_trend(x: &[f64], y: &[f64]) -> Result<LinearTrend, CorrelationError> {
    if x.len() != y.len() {
        return Err(CorrelationError::LengthMismatch {
            left: x.len(),
            right: y.len(),
        });
    }
    let (x, y): (Vec<f64>, Vec<f64>) = x
        .iter()
        .zip(y)
        .filter(|(a, b)| a.is_finite() && b.is_finite())
        .map(|(a, b)| (*a, *b))
        .unzip();
    let n = x.len();

    let undefined = LinearTrend {
        slope: f64::NAN,
        intercept: f64::NAN,
        r: f64::NAN,
        p_value: f64::NAN,
        n,
    };
    if n < 3 {
        return Ok(undefined);
    }

    let mx = mean(&x);
    let my = mean(&y);
    let sxx: f64 = x.iter().map(|v| (v - mx).powi(2)).sum();
    if sxx <= 0.0 {
        return Ok(undefined);
    }
    let sxy: f64 = x.iter().zip(&y).map(|(a, b)| (a - mx) * (b - my)).sum();
    let slope = sxy / sxx;
    let intercept = slope.mul_add(-mx, my);
    let r = pearson(&x, &y)?;

    #[allow(clippy::cast_precision_loss)]
    let df = (n - 2) as f64;
    let p_value = if r.is_nan() {
        // Constant y: the slope is exactly zero.
        f64::NAN
    } else if r.abs() >= 1.0 {
        0.0
    } else {
        let t = r * (df / r.mul_add(-r, 1.0)).sqrt();
        let dist = StudentsT::new(0.0, 1.0, df).map_err(|e| CorrelationError::Distribution {
            message: e.to_string(),
        })?;
        (2.0 * (1.0 - dist.cdf(t.abs()))).clamp(0.0, 1.0)
    };

    Ok(LinearTrend {
        slope,
        intercept,
        r,
        p_value,
        n,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_line() {
        let x: Vec<f64> = (1994..=2013).map(f64::from).collect();
        let y: Vec<f64> = x.iter().map(|v| 2.0f64.mul_add(*v, -3900.0)).collect();
        let trend = linear_trend(&x, &y).unwrap();
        assert!((trend.slope - 2.0).abs() < 1e-9);
        assert!((trend.intercept + 3900.0).abs() < 1e-6);
        assert!((trend.r - 1.0).abs() < 1e-12);
        assert!(trend.p_value.abs() < 1e-12);
        assert_eq!(trend.n, 20);
    }

    #[test]
    fn flat_series_is_not_significant() {
        let x = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let y = [1.0, 3.0, 2.0, 2.0, 3.0, 1.0];
        let trend = linear_trend(&x, &y).unwrap();
        assert!(trend.slope.abs() < 1e-12);
        assert!((trend.p_value - 1.0).abs() < 1e-9);
    }

    #[test]
    fn noisy_increase_is_significant() {
        let x: Vec<f64> = (1..=10).map(f64::from).collect();
        let y = [2.1, 3.9, 6.2, 7.8, 10.1, 12.2, 13.8, 16.1, 18.0, 20.2];
        let trend = linear_trend(&x, &y).unwrap();
        assert!((trend.slope - 2.0).abs() < 0.05);
        assert!(trend.p_value < 1e-6);
    }

    #[test]
    fn skips_missing_years_and_handles_degenerate_input() {
        let trend = linear_trend(&[1.0, 2.0, 3.0, 4.0], &[1.0, f64::NAN, 3.0, 4.0]).unwrap();
        assert_eq!(trend.n, 3);
        assert!(linear_trend(&[1.0, 2.0], &[1.0, 2.0]).unwrap().slope.is_nan());
        assert!(linear_trend(&[5.0, 5.0, 5.0], &[1.0, 2.0, 3.0]).unwrap().slope.is_nan());
        assert!(linear_trend(&[1.0], &[]).is_err());
    }
}
