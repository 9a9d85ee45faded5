//! Named presets reproducing the reference strategy instances.

use std::fmt;
use std::str::FromStr;

use crate::config::{ConfigError, FixedWeight, PolicyConfig, SliceConfig, StrategyConfig};
use crate::domain::Asset;
use crate::factors::{months, FactorKind};

/// Named strategy presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyPreset {
    /// SPY 60% / IEF 40%, rebalanced every cycle.
    SixtyForty,
    /// Four two-asset buckets, best positive 6-month momentum per bucket.
    CompositeDualMomentum,
    /// Credit rotation: best 6-month momentum among LQD, HYG, BIL.
    GlobalEquityFixedIncome,
    /// Four channel-breakout slices, three risky and one stress hedge.
    ChannelSlices,
}

fn assets(symbols: &[&str]) -> Vec<Asset> {
    symbols.iter().map(|s| Asset::from(*s)).collect()
}

impl StrategyPreset {
    pub fn name(self) -> &'static str {
        match self {
            Self::SixtyForty => "sixty_forty",
            Self::CompositeDualMomentum => "composite_dual_momentum",
            Self::GlobalEquityFixedIncome => "global_equity_fixed_income",
            Self::ChannelSlices => "channel_slices",
        }
    }

    /// Convert to a `StrategyConfig` with the reference parameters.
    pub fn to_config(self) -> StrategyConfig {
        let six_month_momentum = FactorKind::Momentum { days: months(6) };
        let policy = match self {
            Self::SixtyForty => PolicyConfig::FixedWeights {
                weights: vec![FixedWeight::new("SPY", 0.6), FixedWeight::new("IEF", 0.4)],
            },
            Self::CompositeDualMomentum => PolicyConfig::TopMomentumInGroup {
                factor: six_month_momentum,
                groups: vec![
                    assets(&["SPY", "EFA"]),
                    assets(&["LQD", "HYG"]),
                    assets(&["VNQ", "REM"]),
                    assets(&["GLD", "TLT"]),
                ],
                group_share: Some(0.25),
            },
            Self::GlobalEquityFixedIncome => PolicyConfig::TopMomentumOverall {
                factor: six_month_momentum,
                universe: assets(&["LQD", "HYG", "BIL"]),
            },
            Self::ChannelSlices => PolicyConfig::EqualShareAcrossSlices {
                slices: vec![
                    SliceConfig::new("SPY", "IEF", 6, 12),
                    SliceConfig::new("VNQ", "IEF", 6, 12),
                    SliceConfig::new("VWO", "VWOB", 6, 12),
                    SliceConfig::new("GLD", "TLT", 12, 6),
                ],
            },
        };
        StrategyConfig::new(self.name(), policy)
    }

    /// All presets as a slice.
    pub fn all() -> &'static [StrategyPreset] {
        &[
            Self::SixtyForty,
            Self::CompositeDualMomentum,
            Self::GlobalEquityFixedIncome,
            Self::ChannelSlices,
        ]
    }
}

impl fmt::Display for StrategyPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for StrategyPreset {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .copied()
            .find(|p| p.name() == s)
            .ok_or_else(|| ConfigError::UnknownPreset(s.to_string()))
    }
}
