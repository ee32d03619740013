//! Exponential Moving Average (EMA).
//!
//! Recursive: EMA[t] = alpha * price[t] + (1 - alpha) * EMA[t-1], alpha = 2 / (period + 1).
//! Seed: EMA[0] = price[0] (no simple-average warm-up), so the output is defined
//! at every index and has the same length as the input.

use crate::domain::{EmaPoint, PricePoint};
use crate::error::EngineError;

/// Smoothing factor for a given span.
pub fn alpha(period: usize) -> f64 {
    2.0 / (period as f64 + 1.0)
}

/// Compute the EMA of `prices` with span `period`.
///
/// Fails with `InvalidParameter` when `period == 0` or `prices` is empty.
pub fn calculate_ema(prices: &[f64], period: usize) -> Result<Vec<f64>, EngineError> {
    if period == 0 {
        return Err(EngineError::invalid("EMA period must be >= 1"));
    }
    let Some((&first, rest)) = prices.split_first() else {
        return Err(EngineError::invalid("EMA input must not be empty"));
    };

    let a = alpha(period);
    let mut result = Vec::with_capacity(prices.len());
    result.push(first);

    let mut prev = first;
    for &price in rest {
        let ema = a * price + (1.0 - a) * prev;
        result.push(ema);
        prev = ema;
    }

    Ok(result)
}

/// Annotate a price series with its EMA.
pub fn ema_points(points: &[PricePoint], period: usize) -> Result<Vec<EmaPoint>, EngineError> {
    let prices: Vec<f64> = points.iter().map(|p| p.price).collect();
    let ema = calculate_ema(&prices, period)?;
    Ok(points
        .iter()
        .zip(ema)
        .map(|(p, ema)| EmaPoint {
            date: p.date,
            price: p.price,
            ema,
        })
        .collect())
}
