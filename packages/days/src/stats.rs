//! Small order statistics over energy samples.

/// Linear-interpolation quantile (Hyndman-Fan type 7) of `values`.
///
/// `p` is clamped to `[0, 1]`. Returns `None` for an empty slice.
#[must_use]
pub fn quantile(values: &[f64], p: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    Some(quantile_sorted(&sorted, p))
}

/// [`quantile`] over an already ascending, non-empty slice.
#[must_use]
pub fn quantile_sorted(sorted: &[f64], p: f64) -> f64 {
    let p = p.clamp(0.0, 1.0);
    let h = (sorted.len() - 1) as f64 * p;
    let lo = h.floor() as usize;
    let hi = (lo + 1).min(sorted.len() - 1);
    let frac = h - lo as f64;
    sorted[lo] + frac * (sorted[hi] - sorted[lo])
}

/// Median via the type-7 estimator.
#[must_use]
pub fn median(values: &[f64]) -> Option<f64> {
    quantile(values, 0.5)
}

/// `exp(mean(ln x))`. Returns the first non-positive value as the error.
///
/// # Errors
///
/// Returns `Err(value)` with the first value that is not strictly positive.
pub fn geometric_mean(values: &[f64]) -> Result<f64, f64> {
    let mut log_sum = 0.0;
    for v in values {
        if *v <= 0.0 || v.is_nan() {
            return Err(*v);
        }
        log_sum += v.ln();
    }
    Ok((log_sum / values.len() as f64).exp())
}
