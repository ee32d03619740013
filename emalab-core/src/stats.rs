//! Signal statistics: a pure function of the trade list and the event list.
//!
//! Always recomputed from scratch; results from earlier runs are never merged in.

use serde::{Deserialize, Serialize};

use crate::domain::{CrossoverEvent, SignalType, TradeRecord};

/// Aggregate outcome of one run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SignalStatistics {
    /// All detected crossovers, actionable or not.
    pub total_signals: usize,
    pub buy_count: usize,
    pub sell_count: usize,
    pub completed_trades: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,
    pub win_rate_pct: f64,
    pub avg_return_pct: f64,
    pub avg_days_held: f64,
    /// Simple sum of per-trade percentage returns (not compounded).
    pub total_return_pct: f64,
}

impl SignalStatistics {
    pub fn aggregate(trades: &[TradeRecord], events: &[CrossoverEvent]) -> Self {
        let buy_count = events
            .iter()
            .filter(|e| e.signal_type == SignalType::Buy)
            .count();
        let completed_trades = trades.len();
        let winning_trades = trades.iter().filter(|t| t.is_winner()).count();
        let total_return_pct = total_return_pct(trades);

        Self {
            total_signals: events.len(),
            buy_count,
            sell_count: events.len() - buy_count,
            completed_trades,
            winning_trades,
            losing_trades: completed_trades - winning_trades,
            win_rate_pct: win_rate_pct(trades),
            avg_return_pct: per_trade(total_return_pct, completed_trades),
            avg_days_held: avg_days_held(trades),
            total_return_pct,
        }
    }
}

// ─── Individual metric functions ────────────────────────────────────

/// Percentage of trades that were winners; 0 with no trades.
pub fn win_rate_pct(trades: &[TradeRecord]) -> f64 {
    if trades.is_empty() {
        return 0.0;
    }
    let winners = trades.iter().filter(|t| t.is_winner()).count();
    winners as f64 / trades.len() as f64 * 100.0
}

pub fn total_return_pct(trades: &[TradeRecord]) -> f64 {
    trades.iter().map(|t| t.return_pct).sum()
}

pub fn avg_days_held(trades: &[TradeRecord]) -> f64 {
    let total: usize = trades.iter().map(|t| t.days_held).sum();
    per_trade(total as f64, trades.len())
}

fn per_trade(total: f64, count: usize) -> f64 {
    if count == 0 {
        0.0
    } else {
        total / count as f64
    }
}
