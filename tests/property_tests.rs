//! Property tests for decision and selection invariants.
//!
//! Uses proptest to verify:
//! 1. Trade plan arithmetic: invested and expected profit are the rounded
//!    products of shares and prices
//! 2. Stop losses sit below entry
//! 3. Position size never exceeds the ticker's allocation, with or without
//!    trailing closes
//! 4. Selection is deterministic and bounded

mod common;

use common::*;
use daytrader::domain::decision::{decide, derive_params};
use daytrader::domain::indicator::analyze;
use daytrader::domain::regime::{detect_regime, Regime};
use daytrader::domain::selection::select;
use daytrader::domain::trade_plan::round2;
use proptest::prelude::*;

// ── Strategies (proptest) ────────────────────────────────────────────

fn arb_bar(ticker: &'static str) -> impl Strategy<Value = MarketBar> {
    (1.0..1000.0_f64, 0.0..0.15_f64, 0.0..0.15_f64, 0.0..=1.0_f64, 1_000u64..50_000_000)
        .prop_map(move |(open, up, down, t, volume)| {
            let open = round2(open);
            let high = open * (1.0 + up);
            let low = open * (1.0 - down);
            let mut bar = make_bar(ticker, date(2024, 3, 4), open, high, low, low + t * (high - low));
            bar.volume = volume;
            bar
        })
}

fn arb_regime() -> impl Strategy<Value = Regime> {
    prop_oneof![
        Just(Regime::HighVolatility),
        Just(Regime::Normal),
        Just(Regime::LowVolatility),
    ]
}

/// Absent, short or long enough to feed every indicator.
fn arb_history() -> impl Strategy<Value = Option<Vec<f64>>> {
    prop::option::of(prop::collection::vec(50.0..150.0_f64, 0..=40))
}

fn arb_snapshot() -> impl Strategy<Value = MarketSnapshot> {
    (
        arb_bar("AAPL"),
        arb_bar("MSFT"),
        arb_bar("NVDA"),
        arb_bar("AMD"),
        arb_bar("INTC"),
        arb_bar("ORCL"),
        arb_bar("CSCO"),
    )
        .prop_map(|(a, b, c, d, e, f, g)| [a, b, c, d, e, f, g].into_iter().collect())
}

// ── 1-3. Decision invariants ─────────────────────────────────────────

proptest! {
    #[test]
    fn plan_amounts_are_rounded_products(
        bar in arb_bar("AAPL"),
        regime in arb_regime(),
        funds in 1_000.0..200_000.0_f64,
        min_tickers in 1usize..20,
        history in arb_history(),
    ) {
        let plan = decide(Some(&bar), funds, min_tickers, regime, history.as_deref());
        let entry = plan.entry.unwrap();

        if plan.shares > 0 {
            let exit = plan.exit.unwrap();
            prop_assert!(exit > entry);
            prop_assert_eq!(plan.invested, round2(plan.shares as f64 * entry));
            prop_assert_eq!(plan.expected_profit, round2((exit - entry) * plan.shares as f64));
        } else {
            prop_assert_eq!(plan.invested, 0.0);
            prop_assert_eq!(plan.expected_profit, 0.0);
        }
        prop_assert!(plan.expected_profit >= 0.0);
    }

    #[test]
    fn stop_loss_below_entry(bar in arb_bar("AAPL"), regime in arb_regime(), history in arb_history()) {
        let plan = decide(Some(&bar), 25_000.0, 5, regime, history.as_deref());
        prop_assert!(plan.stop_loss.unwrap() < plan.entry.unwrap());
    }

    #[test]
    fn position_fits_the_allocation(
        bar in arb_bar("AAPL"),
        regime in arb_regime(),
        funds in 1_000.0..200_000.0_f64,
        min_tickers in 1usize..20,
        history in arb_history(),
    ) {
        let history = history.as_deref();
        let plan = decide(Some(&bar), funds, min_tickers, regime, history);

        let signal = analyze(&bar, history);
        prop_assert_eq!(plan.signal, Some(signal));
        let params = derive_params(regime, signal.overall_signal, bar.open, history);
        let ceiling = funds / min_tickers as f64 * params.max_allocation;
        prop_assert!(plan.shares as f64 * bar.open <= ceiling + 1e-6);
    }

    #[test]
    fn skipped_plans_carry_no_exit(bar in arb_bar("AAPL"), regime in arb_regime(), history in arb_history()) {
        let plan = decide(Some(&bar), 25_000.0, 5, regime, history.as_deref());
        if plan.is_skipped() {
            prop_assert!(plan.exit.is_none());
            prop_assert_eq!(plan.shares, 0);
        }
    }
}

// ── 4. Selection ─────────────────────────────────────────────────────

proptest! {
    #[test]
    fn selection_is_deterministic_and_bounded(snapshot in arb_snapshot(), cap in 1usize..10) {
        let allowed = vec!["Tech".to_string()];
        let regime = detect_regime(&snapshot);

        let first = select(&snapshot, regime, &allowed, None, cap);
        let second = select(&snapshot, regime, &allowed, None, cap);

        prop_assert_eq!(&first, &second);
        prop_assert!(first.len() <= cap);
        for ticker in &first {
            prop_assert!(snapshot.contains(ticker));
        }
        let mut unique = first.clone();
        unique.sort();
        unique.dedup();
        prop_assert_eq!(unique.len(), first.len());
    }
}
