//! Property tests for factor invariants.
//!
//! Uses proptest to verify:
//! 1. Momentum sign follows a strictly monotone window
//! 2. Channel ordering: rolling max never below rolling min
//! 3. Determinism: identical windows give bit-identical values

use proptest::prelude::*;
use tactica_core::factors::{
    composite_momentum_13612, rolling_max, rolling_min, simple_momentum, CompositeVariant,
    FactorKind, COMPOSITE_WINDOW,
};
use tactica_core::PriceWindow;

// ── Strategies (proptest) ────────────────────────────────────────────

/// Strictly increasing series: positive start, positive steps.
fn arb_rising(min_len: usize) -> impl Strategy<Value = Vec<f64>> {
    (
        1.0..500.0_f64,
        prop::collection::vec(0.001..5.0_f64, min_len - 1..min_len + 40),
    )
        .prop_map(|(start, steps)| {
            let mut out = Vec::with_capacity(steps.len() + 1);
            let mut p = start;
            out.push(p);
            for s in steps {
                p += s;
                out.push(p);
            }
            out
        })
}

/// Strictly decreasing series that stays positive.
fn arb_falling(min_len: usize) -> impl Strategy<Value = Vec<f64>> {
    (
        100.0..500.0_f64,
        prop::collection::vec(0.0001..0.01_f64, min_len - 1..min_len + 40),
    )
        .prop_map(|(start, cuts)| {
            let mut out = Vec::with_capacity(cuts.len() + 1);
            let mut p = start;
            out.push(p);
            for c in cuts {
                p *= 1.0 - c;
                out.push(p);
            }
            out
        })
}

fn arb_prices() -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(0.01..1000.0_f64, 1..300)
}

// ── 1. Momentum sign ─────────────────────────────────────────────────

proptest! {
    #[test]
    fn simple_momentum_positive_on_rising(window in arb_rising(2)) {
        prop_assert!(simple_momentum(&window) > 0.0);
    }

    #[test]
    fn simple_momentum_negative_on_falling(window in arb_falling(2)) {
        prop_assert!(simple_momentum(&window) < 0.0);
    }

    #[test]
    fn composite_positive_on_rising(window in arb_rising(COMPOSITE_WINDOW)) {
        prop_assert!(composite_momentum_13612(&window, CompositeVariant::Average) > 0.0);
        prop_assert!(composite_momentum_13612(&window, CompositeVariant::Weighted) > 0.0);
    }

    #[test]
    fn composite_negative_on_falling(window in arb_falling(COMPOSITE_WINDOW)) {
        prop_assert!(composite_momentum_13612(&window, CompositeVariant::Average) < 0.0);
        prop_assert!(composite_momentum_13612(&window, CompositeVariant::Weighted) < 0.0);
    }

    #[test]
    fn momentum_kind_positive_on_rising(window in arb_rising(126)) {
        let kind = FactorKind::Momentum { days: 126 };
        prop_assert!(kind.compute(&PriceWindow::new(window)) > 0.0);
    }
}

// ── 2. Channel ordering ──────────────────────────────────────────────

proptest! {
    #[test]
    fn max_not_below_min(window in arb_prices()) {
        prop_assert!(rolling_max(&window) >= rolling_min(&window));
    }

    #[test]
    fn extrema_are_members(window in arb_prices()) {
        let hi = rolling_max(&window);
        let lo = rolling_min(&window);
        prop_assert!(window.contains(&hi));
        prop_assert!(window.contains(&lo));
        prop_assert!(window.iter().all(|&p| p <= hi && p >= lo));
    }

    #[test]
    fn nan_holes_do_not_change_extrema(
        window in arb_prices(),
        holes in prop::collection::vec(any::<prop::sample::Index>(), 0..5),
    ) {
        let mut holed = window.clone();
        holed.push(f64::NAN);
        for h in holes {
            let i = h.index(holed.len());
            holed.insert(i, f64::NAN);
        }
        prop_assert_eq!(rolling_max(&holed), rolling_max(&window));
        prop_assert_eq!(rolling_min(&holed), rolling_min(&window));
    }
}

// ── 3. Determinism ───────────────────────────────────────────────────

proptest! {
    #[test]
    fn factors_are_deterministic(window in arb_prices()) {
        let w = PriceWindow::new(window);
        for kind in [
            FactorKind::Close,
            FactorKind::Momentum { days: 5 },
            FactorKind::ChannelHigh { days: 20 },
            FactorKind::ChannelLow { days: 20 },
            FactorKind::Composite { variant: CompositeVariant::Weighted },
        ] {
            let a = kind.compute(&w);
            let b = kind.compute(&w.clone());
            prop_assert!(a.to_bits() == b.to_bits());
        }
    }
}
