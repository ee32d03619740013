//! Indicator implementations over plain price series.

pub mod ema;

pub use ema::{alpha, calculate_ema, ema_points};

/// Create consecutive-day price points for testing.
#[cfg(test)]
pub fn make_points(prices: &[f64]) -> Vec<crate::domain::PricePoint> {
    use crate::domain::PricePoint;
    let base_date = chrono::NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
    prices
        .iter()
        .enumerate()
        .map(|(i, &price)| PricePoint::new(base_date + chrono::Duration::days(i as i64), price))
        .collect()
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
