//! Rebalance controller: runs one allocation cycle at a time.
//!
//! A cycle:
//! 1. Collects the factor values the configured policy needs from the price
//!    source (one window per asset, sized for its longest factor).
//! 2. Runs the policy, or evaluates every regime slice.
//! 3. Replaces the running allocation map when the policy produced one.
//!
//! The controller is the sole owner and mutator of the regime slices and the
//! running map. Cycles are expected to run back to back, never overlapping.

use std::collections::BTreeMap;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::{ConfigError, ConfigHash, PolicyConfig, StrategyConfig};
use crate::data::{PriceSource, WindowRequest};
use crate::domain::{AllocationMap, Asset, PeriodId};
use crate::factors::{FactorKind, FactorTable};
use crate::policy::{
    equal_share_across_slices, fixed_weights, top_momentum_in_group, top_momentum_overall,
};
use crate::regime::{ChannelReading, RegimeSlice};

/// Errors a cycle can surface to the caller.
///
/// Missing or degenerate data for some assets is not an error; it only
/// removes those assets from selection. A universe where nothing at all can
/// be evaluated points at a data or configuration problem.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum CycleError {
    #[error("strategy '{strategy}': no valid factor values across the universe in period {period}")]
    NoValidFactors { strategy: String, period: PeriodId },
}

/// What one cycle did.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CycleReport {
    pub period: PeriodId,
    /// A new map was produced this cycle.
    pub rebalanced: bool,
    /// Running allocation after the cycle.
    pub allocation: AllocationMap,
    /// Per-slice signal flags, in configuration order (empty for non-slice policies).
    pub signals: Vec<bool>,
    /// Slices currently in the risk-on regime.
    pub risk_on: usize,
    /// Assets with a non-zero target.
    pub held: usize,
}

/// Drives allocation cycles for one strategy instance.
#[derive(Debug, Clone)]
pub struct RebalanceController {
    config: StrategyConfig,
    fingerprint: ConfigHash,
    slices: Vec<RegimeSlice>,
    allocation: AllocationMap,
    cycles: u64,
}

impl RebalanceController {
    /// Validate `config` and set up fresh state: slices `Unknown`, empty map.
    pub fn new(config: StrategyConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let fingerprint = config.fingerprint()?;
        let slices = match &config.policy {
            PolicyConfig::EqualShareAcrossSlices { slices } => {
                slices.iter().map(RegimeSlice::from_config).collect()
            }
            _ => Vec::new(),
        };

        info!(
            strategy = %config.name,
            policy = config.policy.kind(),
            fingerprint = fingerprint.short(),
            "controller ready"
        );

        Ok(Self {
            config,
            fingerprint,
            slices,
            allocation: AllocationMap::new(),
            cycles: 0,
        })
    }

    pub fn config(&self) -> &StrategyConfig {
        &self.config
    }

    pub fn fingerprint(&self) -> &ConfigHash {
        &self.fingerprint
    }

    pub fn slices(&self) -> &[RegimeSlice] {
        &self.slices
    }

    /// Running allocation (empty before the first rebalance).
    pub fn allocation(&self) -> &AllocationMap {
        &self.allocation
    }

    /// Number of cycles completed, successful or not.
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Every `(asset, factor)` pair the next cycle reads.
    pub fn required_factors(&self) -> Vec<(Asset, FactorKind)> {
        match &self.config.policy {
            PolicyConfig::FixedWeights { .. } => Vec::new(),
            PolicyConfig::TopMomentumInGroup { factor, groups, .. } => groups
                .iter()
                .flatten()
                .map(|asset| (asset.clone(), *factor))
                .collect(),
            PolicyConfig::TopMomentumOverall { factor, universe } => universe
                .iter()
                .map(|asset| (asset.clone(), *factor))
                .collect(),
            PolicyConfig::EqualShareAcrossSlices { .. } => self
                .slices
                .iter()
                .flat_map(RegimeSlice::required_factors)
                .collect(),
        }
    }

    /// Windows to request from the price source, one per asset at the
    /// longest length any of its factors needs, sorted by asset.
    pub fn required_windows(&self) -> Vec<WindowRequest> {
        let mut longest: BTreeMap<Asset, usize> = BTreeMap::new();
        for (asset, kind) in self.required_factors() {
            let len = longest.entry(asset).or_insert(0);
            *len = (*len).max(kind.window_len());
        }
        longest
            .into_iter()
            .map(|(asset, len)| WindowRequest { asset, len })
            .collect()
    }

    /// Run one cycle against `source` in `period`.
    pub fn run_cycle(
        &mut self,
        source: &dyn PriceSource,
        period: PeriodId,
    ) -> Result<CycleReport, CycleError> {
        let factors = FactorTable::compute(&self.required_factors(), source);
        self.run_cycle_with(&factors, period)
    }

    /// Run one cycle on precomputed factor values.
    pub fn run_cycle_with(
        &mut self,
        factors: &FactorTable,
        period: PeriodId,
    ) -> Result<CycleReport, CycleError> {
        self.cycles += 1;
        let strategy = self.config.name.as_str();
        let total = self.config.total_allocatable;

        let (next, signals) = match &self.config.policy {
            PolicyConfig::FixedWeights { weights } => (Some(fixed_weights(weights, total)), Vec::new()),
            PolicyConfig::TopMomentumInGroup { factor, groups, .. } => {
                ensure_defined(factors, strategy, period)?;
                let share = self.config.group_share().unwrap_or(0.0) * total;
                let mut map = AllocationMap::new();
                for group in groups {
                    map.merge(top_momentum_in_group(group, factors, *factor, share));
                }
                (Some(map), Vec::new())
            }
            PolicyConfig::TopMomentumOverall { factor, universe } => {
                if let Err(err) = ensure_defined(factors, strategy, period) {
                    let symbols: Vec<&str> = universe.iter().map(Asset::symbol).collect();
                    warn!(
                        strategy,
                        %period,
                        factor = %factor,
                        universe = ?symbols,
                        "empty candidate set: no asset has a defined factor value"
                    );
                    return Err(err);
                }
                (
                    Some(top_momentum_overall(universe, factors, *factor, total)),
                    Vec::new(),
                )
            }
            PolicyConfig::EqualShareAcrossSlices { .. } => {
                let signals = evaluate_slices(&mut self.slices, factors, strategy, period)?;
                let next = signals
                    .iter()
                    .any(|&s| s)
                    .then(|| equal_share_across_slices(&self.slices, total));
                (next, signals)
            }
        };

        let rebalanced = next.is_some();
        match next {
            Some(map) => {
                if !signals.is_empty() {
                    info!(strategy, %period, ?signals, "signaled");
                }
                info!(strategy, %period, allocation = %map.summary(), "allocation");
                for (asset, weight) in map.iter() {
                    debug!("target {asset} {weight}");
                }
                self.allocation = map;
            }
            None => debug!(strategy, %period, "no signal, keeping previous allocation"),
        }

        Ok(CycleReport {
            period,
            rebalanced,
            allocation: self.allocation.clone(),
            signals,
            risk_on: self.slices.iter().filter(|s| s.is_risk_on()).count(),
            held: self.allocation.held(),
        })
    }
}

fn ensure_defined(factors: &FactorTable, strategy: &str, period: PeriodId) -> Result<(), CycleError> {
    if factors.has_any_defined() {
        Ok(())
    } else {
        Err(CycleError::NoValidFactors {
            strategy: strategy.to_string(),
            period,
        })
    }
}

/// Evaluate every slice, returning one signal flag per slice.
///
/// Slices with undefined inputs are skipped for the cycle. If no slice can
/// be evaluated, nothing is mutated and the cycle fails.
fn evaluate_slices(
    slices: &mut [RegimeSlice],
    factors: &FactorTable,
    strategy: &str,
    period: PeriodId,
) -> Result<Vec<bool>, CycleError> {
    let readings: Vec<ChannelReading> = slices.iter().map(|s| s.reading(factors)).collect();
    if !readings.iter().any(ChannelReading::is_defined) {
        return Err(CycleError::NoValidFactors {
            strategy: strategy.to_string(),
            period,
        });
    }

    let mut signals = Vec::with_capacity(slices.len());
    for (slice, reading) in slices.iter_mut().zip(readings) {
        match slice.evaluate(reading, period) {
            Some(transition) => {
                if transition.flipped() {
                    info!(
                        strategy,
                        risk = %slice.risk(),
                        %period,
                        from = ?transition.previous,
                        to = ?transition.next,
                        "regime flipped"
                    );
                }
                signals.push(transition.signaled);
            }
            None => {
                warn!(
                    strategy,
                    risk = %slice.risk(),
                    %period,
                    "slice skipped: undefined price or channel"
                );
                signals.push(false);
            }
        }
    }
    Ok(signals)
}
