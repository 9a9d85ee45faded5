//! Factor library: pure functions from a price window to one scalar.
//!
//! Factors are dispatched through the [`FactorKind`] tag instead of one type
//! per factor. Each kind declares how many trailing closes it needs; a shorter
//! window, a zero baseline or an all-missing window yields `f64::NAN`, which
//! downstream selection treats as "no signal".
//!
//! Channel kinds measure the closes *before* the latest one, so the latest
//! close can break out of its own channel.

pub mod channel;
pub mod momentum;

pub use channel::{rolling_max, rolling_min};
pub use momentum::{
    composite_momentum_13612, simple_momentum, trailing_rate, CompositeVariant, COMPOSITE_WINDOW,
};

use crate::data::PriceSource;
use crate::domain::{Asset, PriceWindow};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Trading days per month used by every horizon in the library.
pub const TRADING_DAYS_PER_MONTH: usize = 21;

/// Number of trading days in `n` months.
pub const fn months(n: usize) -> usize {
    n * TRADING_DAYS_PER_MONTH
}

/// A factor a strategy can ask for, with its lookback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FactorKind {
    /// Latest close.
    Close,
    /// Simple momentum over `days` observations.
    Momentum { days: usize },
    /// 13612 composite momentum.
    Composite { variant: CompositeVariant },
    /// Highest of the `days` closes preceding the latest (upper channel).
    ChannelHigh { days: usize },
    /// Lowest of the `days` closes preceding the latest (lower channel).
    ChannelLow { days: usize },
}

impl FactorKind {
    /// Number of trailing closes the factor needs.
    pub fn window_len(&self) -> usize {
        match *self {
            Self::Close => 1,
            Self::Momentum { days } => days,
            Self::ChannelHigh { days } | Self::ChannelLow { days } => days + 1,
            Self::Composite { .. } => COMPOSITE_WINDOW,
        }
    }

    /// Stable short name, e.g. `momentum_126`, `up6`, `down12`, `13612w`.
    pub fn key(&self) -> String {
        match *self {
            Self::Close => "close".into(),
            Self::Momentum { days } => format!("momentum_{days}"),
            Self::Composite {
                variant: CompositeVariant::Average,
            } => "13612a".into(),
            Self::Composite {
                variant: CompositeVariant::Weighted,
            } => "13612w".into(),
            Self::ChannelHigh { days } => channel_key("up", days),
            Self::ChannelLow { days } => channel_key("down", days),
        }
    }

    /// Evaluate on the trailing `window_len()` closes of `window`.
    pub fn compute(&self, window: &PriceWindow) -> f64 {
        let Some(closes) = window.trailing(self.window_len()) else {
            return f64::NAN;
        };
        match *self {
            Self::Close => closes.last().copied().unwrap_or(f64::NAN),
            Self::Momentum { .. } => simple_momentum(closes),
            Self::Composite { variant } => composite_momentum_13612(closes, variant),
            Self::ChannelHigh { .. } => rolling_max(prior(closes)),
            Self::ChannelLow { .. } => rolling_min(prior(closes)),
        }
    }
}

impl fmt::Display for FactorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key())
    }
}

/// Every close except the latest.
fn prior(closes: &[f64]) -> &[f64] {
    &closes[..closes.len().saturating_sub(1)]
}

fn channel_key(prefix: &str, days: usize) -> String {
    if days > 0 && days % TRADING_DAYS_PER_MONTH == 0 {
        format!("{prefix}{}", days / TRADING_DAYS_PER_MONTH)
    } else {
        format!("{prefix}_{days}d")
    }
}

/// Factor values computed for one evaluation cycle.
///
/// Built once per cycle from the price source, then queried by asset and kind.
/// A missing entry and a NaN entry both mean "no signal".
#[derive(Debug, Clone, Default)]
pub struct FactorTable {
    values: HashMap<Asset, BTreeMap<FactorKind, f64>>,
}

impl FactorTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch one window per asset, long enough for every kind requested for
    /// it, and evaluate each kind on that window.
    ///
    /// An asset the source cannot supply gets NaN for all its kinds.
    pub fn compute(requests: &[(Asset, FactorKind)], source: &dyn PriceSource) -> Self {
        let mut by_asset: BTreeMap<&Asset, Vec<FactorKind>> = BTreeMap::new();
        for (asset, kind) in requests {
            by_asset.entry(asset).or_default().push(*kind);
        }

        let mut table = Self::new();
        for (asset, kinds) in by_asset {
            let len = kinds.iter().map(FactorKind::window_len).max().unwrap_or(0);
            let window = source.window(asset, len);
            for kind in kinds {
                let value = window.as_ref().map_or(f64::NAN, |w| kind.compute(w));
                table.insert(asset.clone(), kind, value);
            }
        }
        table
    }

    pub fn insert(&mut self, asset: Asset, kind: FactorKind, value: f64) {
        self.values.entry(asset).or_default().insert(kind, value);
    }

    /// Stored value, `None` if never computed. May be NaN.
    pub fn get(&self, asset: &Asset, kind: FactorKind) -> Option<f64> {
        self.values.get(asset).and_then(|m| m.get(&kind).copied())
    }

    /// Stored value with "never computed" folded into NaN.
    pub fn value(&self, asset: &Asset, kind: FactorKind) -> f64 {
        self.get(asset, kind).unwrap_or(f64::NAN)
    }

    /// Defined (non-NaN) value, if any.
    pub fn defined(&self, asset: &Asset, kind: FactorKind) -> Option<f64> {
        self.get(asset, kind).filter(|v| !v.is_nan())
    }

    /// True if at least one stored value is not NaN.
    pub fn has_any_defined(&self) -> bool {
        self.values
            .values()
            .flat_map(|m| m.values())
            .any(|v| !v.is_nan())
    }

    /// Number of (asset, kind) entries stored.
    pub fn len(&self) -> usize {
        self.values.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for factor tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
