//! Regime slice hysteresis and periodic rebalance floor.

use proptest::prelude::*;
use tactica_core::regime::next_regime;
use tactica_core::{Asset, ChannelReading, PeriodId, Regime, RegimeSlice};

const UPPER: f64 = 120.0;
const LOWER: f64 = 80.0;
const EPS: f64 = 1e-9;

fn slice() -> RegimeSlice {
    RegimeSlice::new(Asset::from("SPY"), Asset::from("IEF"), 126, 252)
}

fn at(price: f64) -> ChannelReading {
    ChannelReading::new(price, UPPER, LOWER)
}

fn risk_on_slice() -> RegimeSlice {
    let mut s = slice();
    s.evaluate(at(100.0), PeriodId(2020)).unwrap();
    assert_eq!(s.state(), Regime::RiskOn);
    s
}

fn defensive_slice() -> RegimeSlice {
    let mut s = slice();
    s.evaluate(at(70.0), PeriodId(2020)).unwrap();
    assert_eq!(s.state(), Regime::Defensive);
    s
}

#[test]
fn risk_on_holds_just_above_lower() {
    let mut s = risk_on_slice();
    let t = s.evaluate(at(LOWER + EPS), PeriodId(2020)).unwrap();
    assert_eq!(t.next, Regime::RiskOn);
    assert_eq!(s.current(), &Asset::from("SPY"));
}

#[test]
fn risk_on_flips_just_below_lower() {
    let mut s = risk_on_slice();
    let t = s.evaluate(at(LOWER - EPS), PeriodId(2020)).unwrap();
    assert_eq!(t.next, Regime::Defensive);
    assert!(t.signaled);
    assert_eq!(s.current(), &Asset::from("IEF"));
}

#[test]
fn risk_on_flips_exactly_at_lower() {
    let mut s = risk_on_slice();
    let t = s.evaluate(at(LOWER), PeriodId(2020)).unwrap();
    assert_eq!(t.next, Regime::Defensive);
}

#[test]
fn defensive_flips_just_above_upper() {
    let mut s = defensive_slice();
    let t = s.evaluate(at(UPPER + EPS), PeriodId(2020)).unwrap();
    assert_eq!(t.next, Regime::RiskOn);
    assert!(t.signaled);
}

#[test]
fn defensive_holds_just_below_upper() {
    let mut s = defensive_slice();
    let t = s.evaluate(at(UPPER - EPS), PeriodId(2020)).unwrap();
    assert_eq!(t.next, Regime::Defensive);
    assert!(!t.signaled);
}

#[test]
fn whipsaw_between_channels_does_not_flip() {
    let mut s = risk_on_slice();
    for price in [85.0, 115.0, 81.0, 119.0, 100.0] {
        assert!(!s.evaluate(at(price), PeriodId(2020)).unwrap().signaled);
        assert_eq!(s.state(), Regime::RiskOn);
    }
    s.evaluate(at(79.0), PeriodId(2020)).unwrap();
    for price in [85.0, 115.0, 81.0, 119.0, 100.0] {
        assert!(!s.evaluate(at(price), PeriodId(2020)).unwrap().signaled);
        assert_eq!(s.state(), Regime::Defensive);
    }
}

#[test]
fn same_year_second_call_does_not_signal() {
    let mut s = slice();
    assert!(s.evaluate(at(100.0), PeriodId(2020)).unwrap().signaled);
    assert!(!s.evaluate(at(100.0), PeriodId(2020)).unwrap().signaled);
}

#[test]
fn next_year_signals_from_boundary_alone() {
    let mut s = slice();
    s.evaluate(at(100.0), PeriodId(2020)).unwrap();
    s.evaluate(at(100.0), PeriodId(2020)).unwrap();
    let t = s.evaluate(at(100.0), PeriodId(2021)).unwrap();
    assert!(t.signaled);
    assert_eq!(t.previous, t.next);
    assert_eq!(s.last_rebalance(), Some(PeriodId(2021)));
}

#[test]
fn first_evaluation_always_signals() {
    for price in [10.0, 100.0, 1000.0] {
        let mut s = slice();
        assert!(s.evaluate(at(price), PeriodId(2020)).unwrap().signaled);
    }
}

#[test]
fn unknown_bias_uses_exit_threshold() {
    // Between channels: an entry-threshold rule would start Defensive.
    let mut s = slice();
    let t = s.evaluate(at(100.0), PeriodId(2020)).unwrap();
    assert_eq!(t.previous, Regime::Unknown);
    assert_eq!(t.next, Regime::RiskOn);
}

// ── Properties ───────────────────────────────────────────────────────

/// Channels with `lower < upper` and a price strictly between them.
fn arb_band() -> impl Strategy<Value = (f64, f64, f64)> {
    (1.0..1_000.0f64, 1.0..500.0f64, 0.01..0.99f64).prop_map(|(lower, width, t)| {
        let upper = lower + width;
        (lower, upper, lower + width * t)
    })
}

fn arb_settled() -> impl Strategy<Value = Regime> {
    prop_oneof![Just(Regime::RiskOn), Just(Regime::Defensive)]
}

/// Drive a fresh slice into `regime` within `period`.
fn settle(regime: Regime, lower: f64, upper: f64, period: PeriodId) -> RegimeSlice {
    let mut s = slice();
    let price = match regime {
        Regime::Defensive => lower - 1.0,
        _ => upper + 1.0,
    };
    s.evaluate(ChannelReading::new(price, upper, lower), period)
        .unwrap();
    assert_eq!(s.state(), regime);
    s
}

proptest! {
    #[test]
    fn price_inside_band_keeps_settled_state(
        (lower, upper, price) in arb_band(),
        state in arb_settled(),
    ) {
        let reading = ChannelReading::new(price, upper, lower);
        prop_assert_eq!(next_regime(state, &reading), state);
    }

    #[test]
    fn repeat_inside_band_in_same_period_is_silent(
        (lower, upper, price) in arb_band(),
        state in arb_settled(),
        year in 1990i64..2100,
    ) {
        let mut s = settle(state, lower, upper, PeriodId(year));
        let t = s
            .evaluate(ChannelReading::new(price, upper, lower), PeriodId(year))
            .unwrap();
        prop_assert!(!t.signaled);
        prop_assert!(!t.flipped());
        prop_assert_eq!(s.state(), state);
        prop_assert_eq!(s.last_rebalance(), Some(PeriodId(year)));
    }

    #[test]
    fn new_period_always_signals(
        (lower, upper, _inside) in arb_band(),
        state in arb_settled(),
        price in 0.0..2_000.0f64,
        year in 1990i64..2100,
        gap in 1i64..5,
    ) {
        let mut s = settle(state, lower, upper, PeriodId(year));
        let next = PeriodId(year + gap);
        let t = s
            .evaluate(ChannelReading::new(price, upper, lower), next)
            .unwrap();
        prop_assert!(t.signaled);
        prop_assert_eq!(s.last_rebalance(), Some(next));
    }

    #[test]
    fn crossing_the_active_threshold_always_flips(
        (lower, upper, _inside) in arb_band(),
        state in arb_settled(),
        offset in 0.001..100.0f64,
    ) {
        let mut s = settle(state, lower, upper, PeriodId(2020));
        let price = match state {
            Regime::RiskOn => lower - offset,
            _ => upper + offset,
        };
        let t = s
            .evaluate(ChannelReading::new(price, upper, lower), PeriodId(2020))
            .unwrap();
        prop_assert!(t.flipped());
        prop_assert!(t.signaled);
    }
}
