//! Price/EMA crossover detection.
//!
//! For each index i >= 1:
//! - BUY  when price[i] > ema[i] and price[i-1] <= ema[i-1]
//! - SELL when price[i] < ema[i] and price[i-1] >= ema[i-1]
//!
//! Equality is only tolerated on the prior sample, so a price sitting exactly
//! on its EMA on both samples produces nothing.

use crate::domain::{CrossoverEvent, EmaPoint, Side, SignalType};

/// Classify the transition from `prev` to `curr`.
pub fn classify(prev: &EmaPoint, curr: &EmaPoint) -> Option<SignalType> {
    match (prev.side(), curr.side()) {
        (Side::Below | Side::On, Side::Above) => Some(SignalType::Buy),
        (Side::Above | Side::On, Side::Below) => Some(SignalType::Sell),
        _ => None,
    }
}

/// Lazy iterator over the crossovers of an EMA-annotated series.
///
/// Holds no state beyond its cursor; build a new one to restart.
#[derive(Debug, Clone)]
pub struct Crossovers<'a> {
    series: &'a [EmaPoint],
    next: usize,
}

impl<'a> Crossovers<'a> {
    pub fn new(series: &'a [EmaPoint]) -> Self {
        Self { series, next: 1 }
    }
}

impl Iterator for Crossovers<'_> {
    type Item = CrossoverEvent;

    fn next(&mut self) -> Option<Self::Item> {
        while self.next < self.series.len() {
            let i = self.next;
            self.next += 1;
            let curr = &self.series[i];
            if let Some(signal_type) = classify(&self.series[i - 1], curr) {
                return Some(CrossoverEvent {
                    index: i,
                    date: curr.date,
                    signal_type,
                    price: curr.price,
                    ema: curr.ema,
                });
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.series.len().saturating_sub(self.next)))
    }
}

/// Collect every crossover of `series` in chronological order.
pub fn detect_crossovers(series: &[EmaPoint]) -> Vec<CrossoverEvent> {
    Crossovers::new(series).collect()
}
