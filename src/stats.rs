//! Null-aware column helpers.
//!
//! Missing observations are skipped instead of coerced to zero; the
//! arithmetic itself is `u_numflow::stats`.

use u_numflow::stats;

/// Collects the present values of a nullable column.
///
/// Missing entries are dropped, never replaced.
pub fn present(values: impl IntoIterator<Item = Option<f64>>) -> Vec<f64> {
    values.into_iter().flatten().collect()
}

/// Mean of the present values of a nullable column.
///
/// Returns `NaN` when no value is present, matching the usual
/// "mean of nothing" convention for grouped aggregates.
///
/// # Examples
///
/// ```
/// use u_abtest::stats::nan_mean;
///
/// let scores = [Some(8.0), None, Some(6.0), None];
/// assert_eq!(nan_mean(scores), 7.0);
/// assert!(nan_mean([None, None]).is_nan());
/// ```
pub fn nan_mean(values: impl IntoIterator<Item = Option<f64>>) -> f64 {
    stats::mean(&present(values)).unwrap_or(f64::NAN)
}

/// Proportion of `true` values, `NaN` for an empty input.
pub fn proportion(flags: impl IntoIterator<Item = bool>) -> f64 {
    let (hits, n) = flags
        .into_iter()
        .fold((0usize, 0usize), |(h, n), f| (h + usize::from(f), n + 1));
    if n == 0 {
        f64::NAN
    } else {
        hits as f64 / n as f64
    }
}
