//! Deterministic RNG hierarchy and synthetic index series.
//!
//! A master seed generates deterministic sub-seeds per `(symbol, iteration)`.
//! Sub-seeds are derived via BLAKE3 hashing, independently of call order, so a
//! synthetic series depends only on its inputs.

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::domain::PricePoint;

/// Deterministic RNG hierarchy.
#[derive(Debug, Clone)]
pub struct RngHierarchy {
    master_seed: u64,
}

impl RngHierarchy {
    pub fn new(master_seed: u64) -> Self {
        Self { master_seed }
    }

    pub fn master_seed(&self) -> u64 {
        self.master_seed
    }

    /// Derive a deterministic sub-seed for `(symbol, iteration)`.
    pub fn sub_seed(&self, symbol: &str, iteration: u64) -> u64 {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&self.master_seed.to_le_bytes());
        hasher.update(symbol.as_bytes());
        hasher.update(&iteration.to_le_bytes());
        let hash = hasher.finalize();
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&hash.as_bytes()[..8]);
        u64::from_le_bytes(bytes)
    }

    /// Create a seeded StdRng from a sub-seed.
    pub fn rng_for(&self, symbol: &str, iteration: u64) -> StdRng {
        StdRng::seed_from_u64(self.sub_seed(symbol, iteration))
    }
}

/// Parameters of a synthetic daily index series.
#[derive(Debug, Clone)]
pub struct SyntheticSpec {
    pub start_date: NaiveDate,
    pub days: usize,
    pub start_value: f64,
    /// Maximum absolute daily move as a fraction (0.02 = ±2%).
    pub max_daily_move: f64,
}

/// Generate a weekday-only random walk for `symbol`.
///
/// Identical `(hierarchy seed, symbol, spec)` always produce the identical series.
pub fn synthetic_series(
    hierarchy: &RngHierarchy,
    symbol: &str,
    spec: &SyntheticSpec,
) -> Vec<PricePoint> {
    let mut rng = hierarchy.rng_for(symbol, 0);
    let mut points = Vec::with_capacity(spec.days);
    let mut date = spec.start_date;
    let mut value = spec.start_value;
    let max_move = spec.max_daily_move.abs();

    while points.len() < spec.days {
        if !matches!(date.weekday(), Weekday::Sat | Weekday::Sun) {
            points.push(PricePoint::new(date, (value * 100.0).round() / 100.0));
            let step: f64 = if max_move > 0.0 {
                rng.gen_range(-max_move..=max_move)
            } else {
                0.0
            };
            value = (value * (1.0 + step)).max(0.01);
        }
        date += Duration::days(1);
    }
    points
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(days: usize) -> SyntheticSpec {
        SyntheticSpec {
            start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            days,
            start_value: 2000.0,
            max_daily_move: 0.02,
        }
    }

    #[test]
    fn sub_seeds_are_deterministic() {
        let h = RngHierarchy::new(42);
        assert_eq!(h.sub_seed("NEPSE", 0), h.sub_seed("NEPSE", 0));
    }

    #[test]
    fn different_symbols_different_seeds() {
        let h = RngHierarchy::new(42);
        assert_ne!(h.sub_seed("NEPSE", 0), h.sub_seed("SENSITIVE", 0));
    }

    #[test]
    fn different_master_seeds_different_output() {
        assert_ne!(
            RngHierarchy::new(42).sub_seed("NEPSE", 0),
            RngHierarchy::new(43).sub_seed("NEPSE", 0)
        );
    }

    #[test]
    fn synthetic_series_is_reproducible() {
        let h = RngHierarchy::new(7);
        let a = synthetic_series(&h, "NEPSE", &spec(60));
        let b = synthetic_series(&h, "NEPSE", &spec(60));
        assert_eq!(a, b);
        assert_eq!(a.len(), 60);
        assert_eq!(a[0].price, 2000.0);
    }

    #[test]
    fn synthetic_series_skips_weekends_and_stays_positive() {
        let points = synthetic_series(&RngHierarchy::new(1), "NEPSE", &spec(30));
        assert!(points
            .iter()
            .all(|p| !matches!(p.date.weekday(), Weekday::Sat | Weekday::Sun)));
        assert!(points.iter().all(|p| p.price > 0.0));
        assert!(points.windows(2).all(|w| w[0].date < w[1].date));
    }

    #[test]
    fn zero_move_is_flat() {
        let mut s = spec(10);
        s.max_daily_move = 0.0;
        let points = synthetic_series(&RngHierarchy::new(1), "NEPSE", &s);
        assert!(points.iter().all(|p| p.price == 2000.0));
    }
}
