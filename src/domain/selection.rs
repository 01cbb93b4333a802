//! Regime-aware ticker scoring and diversified selection.
//!
//! Steps:
//! 1. Market statistics over every ticker with a usable open: mean gain,
//!    mean volume and median volume.
//! 2. Filter by sector and by the regime's gain/volatility/volume thresholds.
//! 3. Score survivors with regime weights, plus a technical bonus when
//!    history for the ticker is available.
//! 4. Rank, then diversify: the best technically positive candidate per
//!    sector first, then fill by rank up to the cap.
//! 5. If fewer than five tickers made it, add any ticker that moved more than
//!    0.05% until five are reached.

use crate::domain::indicator::{analyze, OverallSignal, TechnicalSignal};
use crate::domain::indicator::bollinger::BollingerSignal;
use crate::domain::indicator::fibonacci::FibonacciSignal;
use crate::domain::indicator::rsi::RsiSignal;
use crate::domain::market::{MarketBar, MarketSnapshot, PriceHistory};
use crate::domain::regime::{detect_regime, Regime};
use std::collections::HashSet;
use tracing::debug;

pub const DEFAULT_CAP: usize = 15;
pub const RELAXED_MINIMUM: usize = 5;
pub const RELAXED_MIN_MOVE: f64 = 0.0005;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelectionThresholds {
    pub min_gain: f64,
    pub min_volatility: f64,
    pub max_volatility: f64,
    /// Fraction of the median volume a ticker must trade.
    pub volume_threshold: f64,
}

impl SelectionThresholds {
    pub fn for_regime(regime: Regime) -> Self {
        match regime {
            Regime::HighVolatility => SelectionThresholds {
                min_gain: 0.0008,
                min_volatility: 0.012,
                max_volatility: 0.15,
                volume_threshold: 0.25,
            },
            Regime::LowVolatility => SelectionThresholds {
                min_gain: -0.008,
                min_volatility: 0.003,
                max_volatility: 0.08,
                volume_threshold: 0.15,
            },
            Regime::Normal => SelectionThresholds {
                min_gain: 0.0003,
                min_volatility: 0.005,
                max_volatility: 0.12,
                volume_threshold: 0.20,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreWeights {
    pub gain: f64,
    pub volume: f64,
    pub volatility: f64,
    pub relative_strength: f64,
    /// Score the size of the move rather than its direction.
    pub absolute_gain: bool,
}

impl ScoreWeights {
    pub fn for_regime(regime: Regime) -> Self {
        match regime {
            Regime::HighVolatility => ScoreWeights {
                gain: 0.4,
                volume: 0.3,
                volatility: 0.2,
                relative_strength: 0.1,
                absolute_gain: false,
            },
            Regime::LowVolatility => ScoreWeights {
                gain: 0.3,
                volume: 0.2,
                volatility: 0.2,
                relative_strength: 0.3,
                absolute_gain: true,
            },
            Regime::Normal => ScoreWeights {
                gain: 0.4,
                volume: 0.25,
                volatility: 0.2,
                relative_strength: 0.15,
                absolute_gain: false,
            },
        }
    }

    pub fn score(&self, gain_pct: f64, vol_score: f64, volatility: f64, rel_strength: f64) -> f64 {
        let gain = if self.absolute_gain {
            gain_pct.abs()
        } else {
            gain_pct
        };
        self.gain * gain
            + self.volume * vol_score
            + self.volatility * volatility
            + self.relative_strength * rel_strength
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SelectionCandidate {
    pub ticker: String,
    pub score: f64,
    pub gain_pct: f64,
    pub volume: u64,
    pub volatility: f64,
    pub sector: String,
    pub technical_bonus: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct MarketStats {
    avg_gain: f64,
    avg_volume: f64,
    median_volume: f64,
}

impl MarketStats {
    fn compute(snapshot: &MarketSnapshot) -> Option<Self> {
        let mut gains = Vec::new();
        let mut volumes = Vec::new();
        for bar in snapshot.bars() {
            if let Some(gain) = bar.gain_pct().filter(|g| g.is_finite()) {
                gains.push(gain);
                volumes.push(bar.volume as f64);
            }
        }

        if gains.is_empty() {
            return None;
        }

        let n = gains.len() as f64;
        Some(MarketStats {
            avg_gain: gains.iter().sum::<f64>() / n,
            avg_volume: volumes.iter().sum::<f64>() / n,
            median_volume: median(&mut volumes),
        })
    }
}

fn median(values: &mut [f64]) -> f64 {
    values.sort_by(|a, b| a.total_cmp(b));
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) / 2.0
    } else {
        values[mid]
    }
}

/// Score adjustment from a ticker's technical picture.
pub fn technical_bonus(signal: &TechnicalSignal) -> f64 {
    let mut bonus = match signal.overall_signal {
        OverallSignal::StrongBuy => 0.3 * signal.confidence,
        OverallSignal::Buy => 0.2 * signal.confidence,
        OverallSignal::StrongSell => -0.2 * signal.confidence,
        OverallSignal::Sell => -0.1 * signal.confidence,
        OverallSignal::Neutral => 0.0,
    };

    if signal.bollinger_signal == BollingerSignal::OversoldBuy {
        bonus += 0.1;
    }
    if signal.rsi_signal == RsiSignal::OversoldBuy {
        bonus += 0.1;
    }
    if signal.fibonacci_signal == FibonacciSignal::StrongSupport {
        bonus += 0.05;
    }
    bonus
}

fn score_candidate(
    bar: &MarketBar,
    regime: Regime,
    stats: &MarketStats,
    thresholds: &SelectionThresholds,
    history: Option<&PriceHistory>,
) -> Option<SelectionCandidate> {
    let gain_pct = bar.gain_pct().filter(|g| g.is_finite())?;
    let volatility = bar.volatility().filter(|v| v.is_finite())?;
    let volume = bar.volume as f64;

    let passes = gain_pct >= thresholds.min_gain
        && (thresholds.min_volatility..=thresholds.max_volatility).contains(&volatility)
        && volume >= stats.median_volume * thresholds.volume_threshold;
    if !passes {
        return None;
    }

    let rel_strength = gain_pct - stats.avg_gain;
    let vol_score = if stats.avg_volume > 0.0 {
        volume / stats.avg_volume
    } else {
        0.0
    };
    let base_score = ScoreWeights::for_regime(regime).score(gain_pct, vol_score, volatility, rel_strength);

    let technical_bonus = history
        .and_then(|h| h.get(&bar.ticker))
        .map(|closes| technical_bonus(&analyze(bar, Some(closes.as_slice()))))
        .unwrap_or(0.0);

    Some(SelectionCandidate {
        ticker: bar.ticker.clone(),
        score: base_score + technical_bonus,
        gain_pct,
        volume: bar.volume,
        volatility,
        sector: bar.sector.clone(),
        technical_bonus,
    })
}

/// Score every eligible ticker, best first. Ties keep ticker order.
pub fn rank_candidates(
    snapshot: &MarketSnapshot,
    regime: Regime,
    allowed_sectors: &[String],
    history: Option<&PriceHistory>,
) -> Vec<SelectionCandidate> {
    let Some(stats) = MarketStats::compute(snapshot) else {
        return Vec::new();
    };
    let thresholds = SelectionThresholds::for_regime(regime);

    let mut candidates: Vec<SelectionCandidate> = snapshot
        .bars()
        .filter(|bar| allowed_sectors.is_empty() || allowed_sectors.contains(&bar.sector))
        .filter_map(|bar| {
            let candidate = score_candidate(bar, regime, &stats, &thresholds, history);
            if candidate.is_none() {
                debug!(ticker = %bar.ticker, "filtered out of selection");
            }
            candidate
        })
        .collect();

    candidates.sort_by(|a, b| b.score.total_cmp(&a.score));
    candidates
}

fn diversify(ranked: &[SelectionCandidate], allowed_sectors: &[String], cap: usize) -> Vec<String> {
    let mut picked: Vec<String> = Vec::new();
    let mut used: HashSet<&str> = HashSet::new();

    for sector in allowed_sectors {
        if let Some(best) = ranked.iter().find(|c| {
            &c.sector == sector && c.technical_bonus > 0.0 && !used.contains(c.ticker.as_str())
        }) {
            used.insert(best.ticker.as_str());
            picked.push(best.ticker.clone());
        }
    }

    for candidate in ranked {
        if picked.len() >= cap {
            break;
        }
        if used.insert(candidate.ticker.as_str()) {
            picked.push(candidate.ticker.clone());
        }
    }

    picked
}

fn relax(snapshot: &MarketSnapshot, picked: &mut Vec<String>, cap: usize) {
    let target = RELAXED_MINIMUM.min(cap);
    for bar in snapshot.bars() {
        if picked.len() >= target {
            break;
        }
        if picked.iter().any(|t| t == &bar.ticker) {
            continue;
        }
        if bar
            .gain_pct()
            .is_some_and(|g| g.is_finite() && g.abs() > RELAXED_MIN_MOVE)
        {
            debug!(ticker = %bar.ticker, "added by relaxed selection");
            picked.push(bar.ticker.clone());
        }
    }
}

/// Select up to `cap` tickers for the next session.
pub fn select(
    snapshot: &MarketSnapshot,
    regime: Regime,
    allowed_sectors: &[String],
    history: Option<&PriceHistory>,
    cap: usize,
) -> Vec<String> {
    if snapshot.is_empty() || cap == 0 {
        return Vec::new();
    }

    let ranked = rank_candidates(snapshot, regime, allowed_sectors, history);
    let mut picked = diversify(&ranked, allowed_sectors, cap);

    if picked.len() < RELAXED_MINIMUM {
        relax(snapshot, &mut picked, cap);
    }

    picked.truncate(cap);
    debug!(%regime, candidates = ranked.len(), selected = picked.len(), "selection complete");
    picked
}

/// Convenience entry point that detects the regime from the same snapshot.
pub fn select_tickers(
    snapshot: &MarketSnapshot,
    allowed_sectors: &[String],
    history: Option<&PriceHistory>,
) -> Vec<String> {
    select(
        snapshot,
        detect_regime(snapshot),
        allowed_sectors,
        history,
        DEFAULT_CAP,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::config::default_allowed_sectors;
    use chrono::NaiveDate;

    fn bar(ticker: &str, sector: &str, open: f64, close: f64, range: f64, volume: u64) -> MarketBar {
        MarketBar {
            ticker: ticker.into(),
            date: NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
            open,
            high: open.max(close) + range / 2.0,
            low: open.min(close) - range / 2.0,
            close,
            volume,
            sector: sector.into(),
        }
    }

    fn snapshot(bars: Vec<MarketBar>) -> MarketSnapshot {
        bars.into_iter().collect()
    }

    #[test]
    fn empty_snapshot_selects_nothing() {
        let picked = select(
            &MarketSnapshot::default(),
            Regime::Normal,
            &default_allowed_sectors(),
            None,
            DEFAULT_CAP,
        );
        assert!(picked.is_empty());
    }

    #[test]
    fn threshold_tables() {
        let high = SelectionThresholds::for_regime(Regime::HighVolatility);
        assert_eq!(high.min_gain, 0.0008);
        assert_eq!(high.max_volatility, 0.15);
        let low = SelectionThresholds::for_regime(Regime::LowVolatility);
        assert_eq!(low.min_gain, -0.008);
        assert_eq!(low.volume_threshold, 0.15);
        let normal = SelectionThresholds::for_regime(Regime::Normal);
        assert_eq!(normal.min_volatility, 0.005);
        assert_eq!(normal.volume_threshold, 0.20);
    }

    #[test]
    fn low_volatility_scores_absolute_gain() {
        let w = ScoreWeights::for_regime(Regime::LowVolatility);
        let up = w.score(0.01, 1.0, 0.02, 0.0);
        let down = w.score(-0.01, 1.0, 0.02, 0.0);
        assert!((up - down).abs() < 1e-12);

        let n = ScoreWeights::for_regime(Regime::Normal);
        assert!(n.score(0.01, 1.0, 0.02, 0.0) > n.score(-0.01, 1.0, 0.02, 0.0));
    }

    #[test]
    fn ranks_by_score_descending() {
        let snap = snapshot(vec![
            bar("AAA", "Tech", 100.0, 101.0, 1.0, 1_000_000),
            bar("BBB", "Tech", 100.0, 103.0, 1.0, 1_000_000),
            bar("CCC", "Media", 100.0, 102.0, 1.0, 1_000_000),
        ]);
        let ranked = rank_candidates(&snap, Regime::Normal, &default_allowed_sectors(), None);
        let order: Vec<&str> = ranked.iter().map(|c| c.ticker.as_str()).collect();
        assert_eq!(order, vec!["BBB", "CCC", "AAA"]);
        assert!(ranked.iter().all(|c| c.technical_bonus == 0.0));
    }

    #[test]
    fn disallowed_sector_is_excluded_from_ranking() {
        let snap = snapshot(vec![
            bar("AAA", "Tech", 100.0, 101.0, 1.0, 1_000_000),
            bar("UTL", "Utilities", 100.0, 105.0, 1.0, 1_000_000),
        ]);
        let ranked = rank_candidates(&snap, Regime::Normal, &default_allowed_sectors(), None);
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].ticker, "AAA");
    }

    #[test]
    fn thin_volume_is_filtered() {
        let snap = snapshot(vec![
            bar("AAA", "Tech", 100.0, 101.0, 1.0, 1_000_000),
            bar("BBB", "Tech", 100.0, 101.0, 1.0, 1_000_000),
            bar("THIN", "Tech", 100.0, 102.0, 1.0, 10_000),
        ]);
        let ranked = rank_candidates(&snap, Regime::Normal, &default_allowed_sectors(), None);
        assert!(ranked.iter().all(|c| c.ticker != "THIN"));
    }

    #[test]
    fn excessive_volatility_is_filtered() {
        let snap = snapshot(vec![
            bar("AAA", "Tech", 100.0, 101.0, 1.0, 1_000_000),
            bar("WILD", "Tech", 100.0, 101.0, 20.0, 1_000_000),
        ]);
        let ranked = rank_candidates(&snap, Regime::Normal, &default_allowed_sectors(), None);
        assert_eq!(ranked.len(), 1);
    }

    #[test]
    fn technical_bonus_values() {
        let strong = TechnicalSignal {
            overall_signal: OverallSignal::StrongBuy,
            confidence: 0.9,
            bollinger_signal: BollingerSignal::OversoldBuy,
            rsi_signal: RsiSignal::OversoldBuy,
            fibonacci_signal: FibonacciSignal::StrongSupport,
            ..TechnicalSignal::default()
        };
        assert!((technical_bonus(&strong) - (0.27 + 0.25)).abs() < 1e-12);

        let sell = TechnicalSignal {
            overall_signal: OverallSignal::StrongSell,
            confidence: 0.9,
            ..TechnicalSignal::default()
        };
        assert!((technical_bonus(&sell) + 0.18).abs() < 1e-12);

        assert_eq!(technical_bonus(&TechnicalSignal::default()), 0.0);
    }

    #[test]
    fn diversification_prefers_technically_positive_per_sector() {
        let ranked = vec![
            SelectionCandidate {
                ticker: "T1".into(),
                score: 0.9,
                gain_pct: 0.01,
                volume: 1,
                volatility: 0.02,
                sector: "Tech".into(),
                technical_bonus: 0.0,
            },
            SelectionCandidate {
                ticker: "T2".into(),
                score: 0.8,
                gain_pct: 0.01,
                volume: 1,
                volatility: 0.02,
                sector: "Tech".into(),
                technical_bonus: 0.1,
            },
            SelectionCandidate {
                ticker: "M1".into(),
                score: 0.5,
                gain_pct: 0.01,
                volume: 1,
                volatility: 0.02,
                sector: "Media".into(),
                technical_bonus: 0.2,
            },
        ];
        let picked = diversify(&ranked, &default_allowed_sectors(), 15);
        assert_eq!(picked, vec!["T2", "M1", "T1"]);

        let capped = diversify(&ranked, &default_allowed_sectors(), 2);
        assert_eq!(capped, vec!["T2", "M1"]);
    }

    #[test]
    fn relaxation_fills_to_five_in_ticker_order() {
        // Only AAA passes the normal filters; the rest are flat or declining.
        let snap = snapshot(vec![
            bar("AAA", "Tech", 100.0, 101.0, 1.0, 1_000_000),
            bar("BBB", "Tech", 100.0, 99.0, 1.0, 1_000_000),
            bar("CCC", "Tech", 100.0, 100.01, 1.0, 1_000_000),
            bar("DDD", "Tech", 100.0, 98.0, 1.0, 1_000_000),
            bar("EEE", "Utilities", 100.0, 102.0, 1.0, 1_000_000),
            bar("FFF", "Tech", 100.0, 97.0, 1.0, 1_000_000),
            bar("GGG", "Tech", 100.0, 96.0, 1.0, 1_000_000),
        ]);
        let picked = select(&snap, Regime::Normal, &default_allowed_sectors(), None, DEFAULT_CAP);
        // CCC moved 0.01% and is skipped; EEE's sector is not checked when relaxing.
        assert_eq!(picked, vec!["AAA", "BBB", "DDD", "EEE", "FFF"]);
    }

    #[test]
    fn respects_cap() {
        let bars: Vec<MarketBar> = (0..20)
            .map(|i| {
                bar(
                    &format!("T{i:02}"),
                    "Tech",
                    100.0,
                    100.5 + i as f64 * 0.1,
                    1.0,
                    1_000_000,
                )
            })
            .collect();
        let snap = snapshot(bars);
        let picked = select(&snap, Regime::Normal, &default_allowed_sectors(), None, 15);
        assert_eq!(picked.len(), 15);
        assert_eq!(picked[0], "T19");
    }

    #[test]
    fn selection_is_idempotent() {
        let snap = snapshot(vec![
            bar("AAA", "Tech", 100.0, 101.0, 1.0, 1_000_000),
            bar("BBB", "Media", 50.0, 51.0, 1.0, 2_000_000),
            bar("CCC", "Auto", 20.0, 20.3, 0.5, 500_000),
        ]);
        let mut history = PriceHistory::new();
        history.insert("AAA".into(), (0..30).map(|i| 120.0 - i as f64).collect());
        let first = select(&snap, Regime::Normal, &default_allowed_sectors(), Some(&history), 15);
        let second = select(&snap, Regime::Normal, &default_allowed_sectors(), Some(&history), 15);
        assert_eq!(first, second);
    }

    #[test]
    fn legacy_entry_point_detects_regime() {
        let snap = snapshot(vec![
            bar("AAA", "Tech", 100.0, 101.0, 1.0, 1_000_000),
            bar("BBB", "Media", 50.0, 51.0, 1.0, 2_000_000),
        ]);
        let regime = detect_regime(&snap);
        assert_eq!(
            select_tickers(&snap, &default_allowed_sectors(), None),
            select(&snap, regime, &default_allowed_sectors(), None, DEFAULT_CAP)
        );
    }
}
