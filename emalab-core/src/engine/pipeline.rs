//! Batch pipeline: prices → EMA → crossovers → simulation → statistics.
//!
//! Pure and synchronous. All input is materialized before the call and all
//! output is returned at once; persistence is the caller's job.

use serde::{Deserialize, Serialize};

use super::current::{current_signal, latest_signal, signal_rows, CurrentSignal, LatestSignal};
use super::simulator::{simulate, SimulationResult};
use crate::data::{screen_points, SkippedSample};
use crate::domain::{CrossoverEvent, EmaPoint, PricePoint, SignalRow};
use crate::error::EngineError;
use crate::indicators::ema_points;
use crate::params::SignalParams;
use crate::signals::detect_crossovers;
use crate::stats::SignalStatistics;

/// Everything one run derives from a price series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineOutput {
    pub params: SignalParams,
    /// Canonical series the run was computed over.
    pub points: Vec<PricePoint>,
    /// Input points dropped for a non-finite or non-positive price.
    pub skipped: Vec<SkippedSample>,
    pub series: Vec<EmaPoint>,
    pub events: Vec<CrossoverEvent>,
    pub simulation: SimulationResult,
    pub current: Option<CurrentSignal>,
    pub latest: LatestSignal,
    pub signals: Vec<SignalRow>,
    pub statistics: SignalStatistics,
}

/// Run the full pipeline over `points`.
///
/// Points with a non-finite or non-positive price are dropped and returned in
/// `skipped`. Fails fast with `InsufficientData` when fewer than
/// `params.required_points()` samples remain after screening and canonicalization.
pub fn run_pipeline(
    points: &[PricePoint],
    params: &SignalParams,
) -> Result<PipelineOutput, EngineError> {
    let screened = screen_points(points);
    let (points, skipped) = (screened.points, screened.skipped);
    let required = params.required_points();
    if points.len() < required {
        return Err(EngineError::InsufficientData {
            required,
            available: points.len(),
        });
    }

    let series = ema_points(&points, params.ema_period())?;
    let events = detect_crossovers(&series);
    let simulation = simulate(&series, &events, params.min_holding_days())?;
    let statistics = SignalStatistics::aggregate(&simulation.trades, &events);
    let current = current_signal(&events, &simulation);
    let signals = signal_rows(&events, &simulation);
    let latest = latest_signal(&series, &events, &simulation, params.min_holding_days())
        .ok_or(EngineError::InsufficientData {
            required,
            available: 0,
        })?;

    Ok(PipelineOutput {
        params: *params,
        points,
        skipped,
        series,
        events,
        simulation,
        current,
        latest,
        signals,
        statistics,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::SkipReason;
    use crate::domain::SignalStatus;
    use crate::indicators::make_points;

    #[test]
    fn empty_series_is_insufficient() {
        let params = SignalParams::new(3, 2).unwrap();
        assert!(matches!(
            run_pipeline(&[], &params),
            Err(EngineError::InsufficientData {
                required: 4,
                available: 0
            })
        ));
    }

    #[test]
    fn short_series_is_insufficient() {
        let params = SignalParams::new(20, 3).unwrap();
        let points = make_points(&[100.0; 20]);
        assert!(matches!(
            run_pipeline(&points, &params),
            Err(EngineError::InsufficientData { required: 21, available: 20 })
        ));
    }

    #[test]
    fn reference_run() {
        let params = SignalParams::new(3, 2).unwrap();
        let points = make_points(&[100.0, 102.0, 101.0, 99.0, 98.0, 103.0, 105.0, 104.0]);
        let out = run_pipeline(&points, &params).unwrap();

        assert_eq!(out.series.len(), 8);
        assert_eq!(out.events.len(), 3);
        assert_eq!(out.statistics.completed_trades, 1);
        assert_eq!(out.statistics.losing_trades, 1);
        assert_eq!(out.statistics.total_signals, 3);
        assert_eq!(out.current.unwrap().status, SignalStatus::OpenPosition);
        assert_eq!(out.signals.len(), 3);
    }

    #[test]
    fn unsorted_input_is_canonicalized() {
        let params = SignalParams::new(3, 2).unwrap();
        let mut points = make_points(&[100.0, 102.0, 101.0, 99.0, 98.0, 103.0, 105.0, 104.0]);
        let sorted = run_pipeline(&points, &params).unwrap();
        points.reverse();
        let reversed = run_pipeline(&points, &params).unwrap();
        assert_eq!(sorted, reversed);
    }

    const ELEVEN: [f64; 11] = [
        100.0, 102.0, 104.0, 101.0, 98.0, 97.0, 103.0, 106.0, 100.0, 96.0, 99.0,
    ];

    #[test]
    fn nan_price_is_skipped_not_propagated() {
        let params = SignalParams::new(3, 2).unwrap();
        let clean_points = make_points(&ELEVEN);
        let mut dirty_points = clean_points.clone();
        dirty_points.insert(2, PricePoint::new(clean_points[1].date, f64::NAN));
        dirty_points.insert(5, PricePoint::new(clean_points[3].date, f64::NAN));

        let clean = run_pipeline(&clean_points, &params).unwrap();
        let dirty = run_pipeline(&dirty_points, &params).unwrap();

        assert_eq!(dirty.skipped.len(), 2);
        assert!(dirty.skipped.iter().all(|s| s.reason == SkipReason::NonFinitePrice));
        assert_eq!(dirty.skipped[0].row, 2);
        assert!(dirty.series.iter().all(|p| p.ema.is_finite()));
        assert_eq!(dirty.events, clean.events);
        assert_eq!(dirty.simulation.trades, clean.simulation.trades);
        assert!(!clean.simulation.trades.is_empty());
    }

    #[test]
    fn non_positive_prices_are_skipped() {
        let params = SignalParams::new(3, 2).unwrap();
        let points = make_points(&[0.0, 0.0, 5.0, 1.0, 6.0, 0.5]);
        let out = run_pipeline(&points, &params).unwrap();

        let rows: Vec<usize> = out.skipped.iter().map(|s| s.row).collect();
        assert_eq!(rows, vec![0, 1]);
        assert!(out
            .skipped
            .iter()
            .all(|s| s.reason == SkipReason::NonPositivePrice));
        assert_eq!(out.points.len(), 4);
        assert_eq!(out.series[0].ema, 5.0);
        assert!(out.simulation.trades.iter().all(|t| t.return_pct.is_finite()));
    }

    #[test]
    fn bad_prices_count_against_minimum_data() {
        let params = SignalParams::new(3, 2).unwrap();
        let points = make_points(&[0.0, -1.0, f64::INFINITY, 100.0, 101.0, 99.0]);
        assert!(matches!(
            run_pipeline(&points, &params),
            Err(EngineError::InsufficientData {
                required: 4,
                available: 3
            })
        ));
    }
}
