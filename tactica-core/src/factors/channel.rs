//! Channel factors: highest / lowest close over a lookback window.
//!
//! NaN observations are skipped (treated as missing days). A window with no
//! valid observation yields NaN.

/// Highest non-NaN close in `window`.
pub fn rolling_max(window: &[f64]) -> f64 {
    extremum(window, f64::max)
}

/// Lowest non-NaN close in `window`.
pub fn rolling_min(window: &[f64]) -> f64 {
    extremum(window, f64::min)
}

fn extremum(window: &[f64], pick: fn(f64, f64) -> f64) -> f64 {
    window
        .iter()
        .copied()
        .filter(|v| !v.is_nan())
        .reduce(pick)
        .unwrap_or(f64::NAN)
}
