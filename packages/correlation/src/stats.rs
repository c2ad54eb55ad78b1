//! Moments, standardization, and Pearson correlation.
//!
//! Undefined results (too few values, zero variance) are NaN rather than 0.

use crate::CorrelationError;

/// Arithmetic mean; NaN for an empty slice.
#[must_use]
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / len_f64(values)
}

/// Sample standard deviation (n - 1 denominator); NaN below two values.
#[must_use]
pub fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return f64::NAN;
    }
    let m = mean(values);
    let ss: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    (ss / (len_f64(values) - 1.0)).sqrt()
}

/// Rescales to zero mean and unit sample variance.
///
/// A constant series has no defined scale and comes back all NaN.
#[must_use]
pub fn standardize(values: &[f64]) -> Vec<f64> {
    let m = mean(values);
    let sd = std_dev(values);
    if sd.is_nan() || sd <= 0.0 {
        return vec![f64::NAN; values.len()];
    }
    values.iter().map(|v| (v - m) / sd).collect()
}

/// Natural log, then [`standardize`].
///
/// # Errors
///
/// Returns [`CorrelationError::NonPositive`] for the first value ≤ 0.
pub fn log_standardize(values: &[f64]) -> Result<Vec<f64>, CorrelationError> {
    let logs = values
        .iter()
        .map(|v| {
            if *v > 0.0 {
                Ok(v.ln())
            } else {
                Err(CorrelationError::NonPositive { value: *v })
            }
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(standardize(&logs))
}

/// Pearson correlation coefficient.
///
/// NaN when either series has zero variance, fewer than two values, or
/// contains NaN.
///
/// # Errors
///
/// Returns [`CorrelationError::LengthMismatch`] if the lengths differ.
pub fn pearson(x: &[f64], y: &[f64]) -> Result<f64, CorrelationError> {
    if x.len() != y.len() {
        return Err(CorrelationError::LengthMismatch {
            left: x.len(),
            right: y.len(),
        });
    }
    if x.len() < 2 {
        return Ok(f64::NAN);
    }

    let mx = mean(x);
    let my = mean(y);
    let (mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0);
    for (a, b) in x.iter().zip(y) {
        let dx = a - mx;
        let dy = b - my;
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }
    if sxx <= 0.0 || syy <= 0.0 {
        return Ok(f64::NAN);
    }
    Ok((sxy / (sxx * syy).sqrt()).clamp(-1.0, 1.0))
}

#[allow(clippy::cast_precision_loss)]
fn len_f64(values: &[f64]) -> f64 {
    values.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standardized_series_has_unit_moments() {
        let z = standardize(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]);
        assert!(mean(&z).abs() < 1e-12);
        assert!((std_dev(&z) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn constant_series_standardizes_to_nan() {
        assert!(standardize(&[3.0, 3.0, 3.0]).iter().all(|v| v.is_nan()));
        assert!(standardize(&[3.0]).iter().all(|v| v.is_nan()));
    }

    #[test]
    fn log_standardize_rejects_zero() {
        assert!(matches!(
            log_standardize(&[1.0, 0.0]),
            Err(CorrelationError::NonPositive { .. })
        ));
        let z = log_standardize(&[1.0, std::f64::consts::E]).unwrap();
        assert!((z[0] + std::f64::consts::FRAC_1_SQRT_2).abs() < 1e-12);
    }

    #[test]
    fn pearson_extremes() {
        let x = [1.0, 2.0, 3.0, 4.0];
        assert!((pearson(&x, &[2.0, 4.0, 6.0, 8.0]).unwrap() - 1.0).abs() < 1e-12);
        assert!((pearson(&x, &[8.0, 6.0, 4.0, 2.0]).unwrap() + 1.0).abs() < 1e-12);
        assert!(pearson(&x, &[1.0, 1.0, 1.0, 1.0]).unwrap().is_nan());
        assert!(pearson(&x, &[1.0, f64::NAN, 3.0, 4.0]).unwrap().is_nan());
        assert!(pearson(&x, &[1.0]).is_err());
    }

    #[test]
    fn pearson_known_value() {
        // r = 0.8 exactly for this pair.
        let x = [1.0, 2.0, 3.0, 4.0, 5.0];
        let y = [2.0, 1.0, 4.0, 3.0, 5.0];
        assert!((pearson(&x, &y).unwrap() - 0.8).abs() < 1e-12);
    }
}
