//! Missing-value-aware arithmetic over aligned series.
//!
//! Every helper here upholds one post-condition: the output never contains
//! ±infinity or NaN. A zero or missing denominator, or a non-finite result,
//! degrades to a missing value. Downstream tables and charts must never
//! see infinity, and nothing in the engine raises on bad arithmetic.

/// Divides two optional scalars safely.
///
/// Returns `None` when either operand is missing, the denominator is zero,
/// or the result is non-finite.
#[must_use]
pub fn safe_div(numerator: Option<f64>, denominator: Option<f64>) -> Option<f64> {
    let n = numerator?;
    let d = denominator?;
    if d == 0.0 {
        return None;
    }
    let out = n / d;
    out.is_finite().then_some(out)
}

/// Elementwise safe division of two series aligned to the same year index.
#[must_use]
pub fn safe_div_series(numerator: &[Option<f64>], denominator: &[Option<f64>]) -> Vec<Option<f64>> {
    debug_assert_eq!(numerator.len(), denominator.len());
    numerator
        .iter()
        .zip(denominator)
        .map(|(&n, &d)| safe_div(n, d))
        .collect()
}

/// Safe division of a scalar numerator broadcast over a series denominator.
#[must_use]
pub fn safe_div_scalar(numerator: f64, denominator: &[Option<f64>]) -> Vec<Option<f64>> {
    denominator
        .iter()
        .map(|&d| safe_div(Some(numerator), d))
        .collect()
}

/// Elementwise addition with missing-value propagation.
#[must_use]
pub fn add_series(a: &[Option<f64>], b: &[Option<f64>]) -> Vec<Option<f64>> {
    debug_assert_eq!(a.len(), b.len());
    a.iter()
        .zip(b)
        .map(|(&x, &y)| Some(x? + y?))
        .collect()
}

/// Elementwise subtraction with missing-value propagation.
#[must_use]
pub fn sub_series(a: &[Option<f64>], b: &[Option<f64>]) -> Vec<Option<f64>> {
    debug_assert_eq!(a.len(), b.len());
    a.iter()
        .zip(b)
        .map(|(&x, &y)| Some(x? - y?))
        .collect()
}

/// Elementwise absolute value, preserving missing slots.
#[must_use]
pub fn abs_series(values: &[Option<f64>]) -> Vec<Option<f64>> {
    values.iter().map(|v| v.map(f64::abs)).collect()
}

/// Two-period average over an aligned series: the mean of the current and
/// prior slot.
///
/// The earliest slot is always missing (no prior period exists), and a
/// missing neighbour makes the average missing. This models the "average
/// balance" convention of ratios that mix a flow with a stock quantity.
#[must_use]
pub fn two_period_average(values: &[Option<f64>]) -> Vec<Option<f64>> {
    (0..values.len())
        .map(|i| {
            if i == 0 {
                return None;
            }
            Some((values[i]? + values[i - 1]?) / 2.0)
        })
        .collect()
}
