//! End-to-end scenarios over the full pipeline.
//!
//! Each test drives `run_pipeline` from raw ingested rows so the whole chain
//! (ingest → EMA → crossovers → simulator → statistics) is exercised.

use emalab_core::data::{ingest, RawSample};
use emalab_core::domain::{IgnoreReason, SignalStatus, SignalType, TradeResult};
use emalab_core::engine::{run_pipeline, LatestSignalType, PipelineOutput};
use emalab_core::{EngineError, SignalParams};

// ──────────────────────────────────────────────
// Helpers
// ──────────────────────────────────────────────

/// Consecutive calendar-day rows starting 2024-01-01.
fn rows(prices: &[f64]) -> Vec<RawSample> {
    let base = chrono::NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    prices
        .iter()
        .enumerate()
        .map(|(i, &p)| {
            let date = base + chrono::Duration::days(i as i64);
            RawSample::new(date.format("%Y-%m-%d").to_string(), p)
        })
        .collect()
}

fn run(prices: &[f64], ema_period: i64, min_hold: i64) -> Result<PipelineOutput, EngineError> {
    let params = SignalParams::new(ema_period, min_hold)?;
    let report = ingest(&rows(prices));
    run_pipeline(&report.points, &params)
}

const REFERENCE: [f64; 8] = [100.0, 102.0, 101.0, 99.0, 98.0, 103.0, 105.0, 104.0];

// ──────────────────────────────────────────────
// Scenarios
// ──────────────────────────────────────────────

#[test]
fn reference_series_period_3_hold_2() {
    let out = run(&REFERENCE, 3, 2).unwrap();

    let ema: Vec<f64> = out.series.iter().map(|p| p.ema).collect();
    assert_eq!(ema, vec![100.0, 101.0, 101.0, 100.0, 99.0, 101.0, 103.0, 103.5]);

    // The BUY after the dip fires at 103, the first close above the EMA since index 3.
    let buy_after_dip = out
        .events
        .iter()
        .find(|e| e.signal_type == SignalType::Buy && e.index > 3)
        .unwrap();
    assert_eq!(buy_after_dip.index, 5);
    assert_eq!(buy_after_dip.price, 103.0);

    // No SELL is honoured until 2 steps after its BUY.
    for trade in &out.simulation.trades {
        assert!(trade.days_held >= 2);
    }
    assert_eq!(out.simulation.trades.len(), 1);
    assert_eq!(out.simulation.trades[0].result, TradeResult::Loss);
}

#[test]
fn empty_series_is_insufficient_data() {
    assert!(matches!(
        run(&[], 3, 2),
        Err(EngineError::InsufficientData { .. })
    ));
}

#[test]
fn invalid_parameters_fail_fast() {
    assert!(matches!(run(&REFERENCE, 0, 2), Err(EngineError::InvalidParameter(_))));
    assert!(matches!(run(&REFERENCE, 3, -1), Err(EngineError::InvalidParameter(_))));
}

#[test]
fn zero_hold_closes_on_next_step() {
    // period 2: ema 100, 106.67, 95.56 → BUY@1, SELL@2
    let out = run(&[100.0, 110.0, 90.0], 2, 0).unwrap();
    assert_eq!(out.simulation.trades.len(), 1);
    assert_eq!(out.simulation.trades[0].days_held, 1);
    assert!(out.simulation.ignored.is_empty());
}

#[test]
fn flat_series_has_no_signals_and_zero_win_rate() {
    let out = run(&[1500.0; 30], 4, 2).unwrap();
    assert!(out.events.is_empty());
    assert!(out.simulation.trades.is_empty());
    assert_eq!(out.statistics.win_rate_pct, 0.0);
    assert_eq!(out.statistics.avg_return_pct, 0.0);
    assert_eq!(out.latest.signal_type, LatestSignalType::Hold);
}

#[test]
fn open_position_at_end_is_not_a_trade() {
    // BUY@1 then rising: no SELL ever arrives
    let out = run(&[100.0, 101.0, 102.0, 103.0, 104.0], 3, 2).unwrap();
    assert_eq!(out.events.len(), 1);
    assert_eq!(out.events[0].signal_type, SignalType::Buy);
    assert!(out.simulation.trades.is_empty());
    assert!(out.simulation.ignored.is_empty());
    let open = out.simulation.open_position.as_ref().unwrap();
    assert_eq!(open.entry_index, 1);
    assert_eq!(out.statistics.completed_trades, 0);
    assert_eq!(out.signals.len(), 1);
    assert_eq!(out.signals[0].status, SignalStatus::OpenPosition);
}

#[test]
fn consecutive_buys_while_long() {
    let out = run(&[100.0, 110.0, 105.0, 110.0], 3, 2).unwrap();
    assert_eq!(out.simulation.ignored.len(), 1);
    let ignored = &out.simulation.ignored[0];
    assert_eq!(ignored.signal_type, SignalType::Buy);
    assert!(matches!(ignored.reason, IgnoreReason::PositionAlreadyOpen { .. }));
    assert!(ignored.reason.to_string().contains("already open"));

    // Still reported as the current market state.
    let current = out.current.unwrap();
    assert_eq!(current.event.index, 3);
    assert_eq!(current.status, SignalStatus::Current);
    assert_eq!(out.latest.signal_type, LatestSignalType::Buy);
}

#[test]
fn duplicate_and_bad_rows_do_not_change_the_result() {
    let clean = run(&REFERENCE, 3, 2).unwrap();

    let mut noisy = rows(&REFERENCE);
    noisy.insert(2, RawSample::new("not-a-date", 1.0));
    noisy.push(RawSample::new("2024-01-09", f64::NAN));
    // An earlier stale value for 2024-01-04 followed by the corrected one.
    noisy.insert(3, RawSample::new("2024-01-04", 500.0));
    noisy.reverse();
    noisy.push(RawSample::new("2024-01-04", 99.0));

    let report = ingest(&noisy);
    assert_eq!(report.skipped.len(), 2);
    assert_eq!(report.duplicates_collapsed, 2);
    let params = SignalParams::new(3, 2).unwrap();
    let out = run_pipeline(&report.points, &params).unwrap();
    assert_eq!(out, clean);
}

#[test]
fn statistics_count_all_crossovers() {
    // min hold 3: SELL@3 ignored, BUY@5 ignored, but all three are counted
    let out = run(&REFERENCE, 3, 3).unwrap();
    assert_eq!(out.statistics.total_signals, 3);
    assert_eq!(out.statistics.buy_count, 2);
    assert_eq!(out.statistics.sell_count, 1);
    assert_eq!(out.statistics.completed_trades, 0);
}
