//! Regime slices: hysteretic risk-on / defensive switch for one asset pair.
//!
//! Each slice watches its risk asset against two channels of different
//! lookbacks:
//! - RiskOn stays RiskOn while price > lower channel (stop-out on a break below).
//! - Defensive flips to RiskOn only when price > upper channel (breakout re-entry).
//! - Unknown (never evaluated) takes its first bias from the lower channel.
//!
//! Entry and exit use different thresholds, so a price hovering around one
//! level cannot whipsaw the slice. A slice also signals the first time it is
//! evaluated in a new period, which floors the rebalance frequency.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::SliceConfig;
use crate::domain::{Asset, PeriodId};
use crate::factors::{months, FactorKind, FactorTable};

/// Current regime of a slice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Regime {
    /// Not evaluated yet.
    #[default]
    Unknown,
    /// Holding the risk asset.
    RiskOn,
    /// Holding the defensive asset.
    Defensive,
}

/// Inputs for one transition: the risk asset's latest close and its channels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChannelReading {
    pub price: f64,
    pub upper: f64,
    pub lower: f64,
}

impl ChannelReading {
    pub fn new(price: f64, upper: f64, lower: f64) -> Self {
        Self {
            price,
            upper,
            lower,
        }
    }

    /// True when every input is a usable number.
    pub fn is_defined(&self) -> bool {
        !(self.price.is_nan() || self.upper.is_nan() || self.lower.is_nan())
    }
}

/// Pure transition rule. Comparisons are strict.
pub fn next_regime(current: Regime, reading: &ChannelReading) -> Regime {
    let risk_on = match current {
        Regime::Unknown | Regime::RiskOn => reading.price > reading.lower,
        Regime::Defensive => reading.price > reading.upper,
    };
    if risk_on {
        Regime::RiskOn
    } else {
        Regime::Defensive
    }
}

/// Outcome of evaluating a slice once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SliceTransition {
    pub previous: Regime,
    pub next: Regime,
    /// Regime changed or a new period started.
    pub signaled: bool,
}

impl SliceTransition {
    pub fn flipped(&self) -> bool {
        self.previous != self.next
    }
}

/// Risk / defensive asset pair with its regime state.
///
/// Owned by the rebalance controller, which is its only mutator. State
/// lives as long as the controller; nothing here is persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct RegimeSlice {
    risk: Asset,
    defensive: Asset,
    upper: FactorKind,
    lower: FactorKind,
    state: Regime,
    last_rebalance: Option<PeriodId>,
}

impl RegimeSlice {
    /// New slice in the `Unknown` state. Lookbacks are in trading days.
    pub fn new(risk: Asset, defensive: Asset, upper_days: usize, lower_days: usize) -> Self {
        Self {
            risk,
            defensive,
            upper: FactorKind::ChannelHigh { days: upper_days },
            lower: FactorKind::ChannelLow { days: lower_days },
            state: Regime::Unknown,
            last_rebalance: None,
        }
    }

    pub fn from_config(config: &SliceConfig) -> Self {
        Self::new(
            config.risk.clone(),
            config.defensive.clone(),
            months(config.upper_months),
            months(config.lower_months),
        )
    }

    pub fn risk(&self) -> &Asset {
        &self.risk
    }

    pub fn defensive(&self) -> &Asset {
        &self.defensive
    }

    /// Upper channel factor (re-entry threshold).
    pub fn upper_channel(&self) -> FactorKind {
        self.upper
    }

    /// Lower channel factor (stop-out threshold).
    pub fn lower_channel(&self) -> FactorKind {
        self.lower
    }

    pub fn state(&self) -> Regime {
        self.state
    }

    pub fn last_rebalance(&self) -> Option<PeriodId> {
        self.last_rebalance
    }

    pub fn is_risk_on(&self) -> bool {
        self.state == Regime::RiskOn
    }

    pub fn assets(&self) -> [&Asset; 2] {
        [&self.risk, &self.defensive]
    }

    /// Factors the slice reads, all on its risk asset.
    pub fn required_factors(&self) -> [(Asset, FactorKind); 3] {
        [
            (self.risk.clone(), FactorKind::Close),
            (self.risk.clone(), self.upper),
            (self.risk.clone(), self.lower),
        ]
    }

    /// Asset the slice currently wants to hold: the risk asset when RiskOn,
    /// the defensive asset otherwise (including Unknown).
    pub fn current(&self) -> &Asset {
        if self.is_risk_on() {
            &self.risk
        } else {
            &self.defensive
        }
    }

    /// Pull this slice's inputs out of a cycle's factor table.
    pub fn reading(&self, factors: &FactorTable) -> ChannelReading {
        ChannelReading::new(
            factors.value(&self.risk, FactorKind::Close),
            factors.value(&self.risk, self.upper),
            factors.value(&self.risk, self.lower),
        )
    }

    /// Advance the state machine by one evaluation in `period`.
    ///
    /// Returns `None` and leaves the slice untouched when the reading is
    /// undefined. Otherwise the state always moves to the next regime, and
    /// the last-rebalance period is updated only when the slice signals.
    pub fn evaluate(&mut self, reading: ChannelReading, period: PeriodId) -> Option<SliceTransition> {
        if !reading.is_defined() {
            return None;
        }

        let previous = self.state;
        let next = next_regime(previous, &reading);
        let signaled = next != previous || self.last_rebalance != Some(period);

        self.state = next;
        if signaled {
            self.last_rebalance = Some(period);
        }

        debug!(
            risk = %self.risk,
            ?previous,
            ?next,
            signaled,
            price = reading.price,
            upper = reading.upper,
            lower = reading.lower,
            "slice evaluated"
        );

        Some(SliceTransition {
            previous,
            next,
            signaled,
        })
    }
}
