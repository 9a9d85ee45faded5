//! Momentum-ranked selection within one universe group.

use tracing::warn;

use crate::domain::{AllocationMap, Asset};
use crate::factors::{FactorKind, FactorTable};

/// Which candidates may be selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MomentumScreen {
    /// Only strictly positive momentum is eligible.
    PositiveOnly,
    /// Every defined momentum is eligible.
    Unfiltered,
}

/// Highest-momentum asset of `group` that passes `screen`.
///
/// Undefined values never qualify. Ties go to the asset declared first.
pub fn select_top<'a>(
    group: &'a [Asset],
    factors: &FactorTable,
    factor: FactorKind,
    screen: MomentumScreen,
) -> Option<(&'a Asset, f64)> {
    let mut best: Option<(&Asset, f64)> = None;
    for asset in group {
        let Some(value) = factors.defined(asset, factor) else {
            continue;
        };
        if screen == MomentumScreen::PositiveOnly && value <= 0.0 {
            continue;
        }
        match best {
            Some((_, top)) if value <= top => {}
            _ => best = Some((asset, value)),
        }
    }
    best
}

/// Dual-momentum bucket: the best positive-momentum asset gets `share`,
/// everything else in the group gets zero. No eligible asset means the
/// group sits in cash for the cycle.
pub fn top_momentum_in_group(
    group: &[Asset],
    factors: &FactorTable,
    factor: FactorKind,
    share: f64,
) -> AllocationMap {
    let mut map = AllocationMap::zeroed(group);
    if let Some((asset, _)) = select_top(group, factors, factor, MomentumScreen::PositiveOnly) {
        map.set(asset.clone(), share);
    }
    map
}

/// Single-bucket rotation: the best asset gets `share` regardless of sign.
///
/// An empty candidate set should not happen for a static universe, so it is
/// reported as an anomaly before abstaining. When the group is the whole
/// universe the controller sees this first, logs the same anomaly and fails
/// the cycle with `CycleError::NoValidFactors`.
pub fn top_momentum_overall(
    group: &[Asset],
    factors: &FactorTable,
    factor: FactorKind,
    share: f64,
) -> AllocationMap {
    let mut map = AllocationMap::zeroed(group);
    match select_top(group, factors, factor, MomentumScreen::Unfiltered) {
        Some((asset, _)) => map.set(asset.clone(), share),
        None => {
            let symbols: Vec<&str> = group.iter().map(Asset::symbol).collect();
            warn!(
                factor = %factor,
                group = ?symbols,
                "empty candidate set: no asset has a defined factor value"
            );
        }
    }
    map
}
