//! Momentum factors: trailing returns over one or several horizons.
//!
//! simple[t]    = (close[last] - close[first]) / close[first]
//! rate(N days) = (close[last] - close[last-N]) / close[last-N]
//! 13612        = blend of the 1, 3, 6 and 12 month rates
//!
//! A zero or NaN baseline yields NaN instead of an infinity.

use serde::{Deserialize, Serialize};

use super::{months, TRADING_DAYS_PER_MONTH};

/// Observations needed by the 13612 composite: twelve months plus the base close.
pub const COMPOSITE_WINDOW: usize = 12 * TRADING_DAYS_PER_MONTH + 1;

/// How the four 13612 sub-returns are blended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompositeVariant {
    /// (r1 + r3 + r6 + r12) / 4
    Average,
    /// (12·r1 + 4·r3 + 2·r6 + r12) / 4
    Weighted,
}

/// Relative change from the first to the last close of `window`.
pub fn simple_momentum(window: &[f64]) -> f64 {
    match (window.first(), window.last()) {
        (Some(&first), Some(&last)) => relative_change(first, last),
        _ => f64::NAN,
    }
}

/// Trailing return over the last `days` observations.
///
/// Needs `days + 1` closes; fewer yields NaN.
pub fn trailing_rate(window: &[f64], days: usize) -> f64 {
    let n = window.len();
    if days == 0 || n <= days {
        return f64::NAN;
    }
    relative_change(window[n - 1 - days], window[n - 1])
}

/// 13612 composite momentum over a year-long window.
///
/// Windows shorter than [`COMPOSITE_WINDOW`] yield NaN.
pub fn composite_momentum_13612(window: &[f64], variant: CompositeVariant) -> f64 {
    if window.len() < COMPOSITE_WINDOW {
        return f64::NAN;
    }
    let r1 = trailing_rate(window, months(1));
    let r3 = trailing_rate(window, months(3));
    let r6 = trailing_rate(window, months(6));
    let r12 = trailing_rate(window, months(12));

    match variant {
        CompositeVariant::Average => (r1 + r3 + r6 + r12) / 4.0,
        CompositeVariant::Weighted => (12.0 * r1 + 4.0 * r3 + 2.0 * r6 + r12) / 4.0,
    }
}

fn relative_change(base: f64, last: f64) -> f64 {
    if base == 0.0 || !base.is_finite() {
        return f64::NAN;
    }
    (last - base) / base
}
