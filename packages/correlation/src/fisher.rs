//! Inference on a correlation coefficient via Fisher's z-transform.

use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF as _, Normal};

use crate::CorrelationError;

/// A correlation with its two-sided p-value and confidence interval.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CorrelationTest {
    /// Pearson correlation coefficient.
    pub r: f64,
    /// Two-sided p-value for `r = 0`.
    pub p_value: f64,
    /// Lower bound of the confidence interval, back-transformed from z.
    pub ci_low: f64,
    /// Upper bound of the confidence interval.
    pub ci_high: f64,
}

impl CorrelationTest {
    const UNDEFINED: Self = Self {
        r: f64::NAN,
        p_value: f64::NAN,
        ci_low: f64::NAN,
        ci_high: f64::NAN,
    };
}

/// Tests `r` from `n` pairs against zero correlation.
///
/// `z = atanh(r)` is taken as normal with standard error `1/sqrt(n - 3)`.
/// The interval has confidence `1 - significance`. With `n <= 3` or a NaN
/// `r`, every statistic is NaN (`r` itself is kept).
///
/// # Errors
///
/// Returns [`CorrelationError::InvalidSignificance`] unless
/// `0 < significance < 1`.
pub fn fisher_test(r: f64, n: usize, significance: f64) -> Result<CorrelationTest, CorrelationError> {
    if significance.is_nan() || significance <= 0.0 || significance >= 1.0 {
        return Err(CorrelationError::InvalidSignificance(significance));
    }
    if n <= 3 || r.is_nan() {
        return Ok(CorrelationTest {
            r,
            ..CorrelationTest::UNDEFINED
        });
    }

    let normal = standard_normal()?;
    let z = r.clamp(-1.0, 1.0).atanh();
    #[allow(clippy::cast_precision_loss)]
    let se = 1.0 / ((n - 3) as f64).sqrt();
    let p_value = 2.0 * (1.0 - normal.cdf(z.abs() / se));
    let critical = normal.inverse_cdf(1.0 - significance / 2.0);

    Ok(CorrelationTest {
        r,
        p_value: p_value.clamp(0.0, 1.0),
        ci_low: critical.mul_add(-se, z).tanh(),
        ci_high: critical.mul_add(se, z).tanh(),
    })
}

pub(crate) fn standard_normal() -> Result<Normal, CorrelationError> {
    Normal::new(0.0, 1.0).map_err(|e| CorrelationError::Distribution {
        message: e.to_string(),
    })
}
