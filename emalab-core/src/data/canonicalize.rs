//! Canonical ordering for price series: ascending by date, one sample per date.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::domain::PricePoint;

/// Sort ascending by date and collapse duplicate dates, keeping the latest
/// sample in input order.
///
/// Returns the canonical series and the number of duplicates dropped.
pub fn canonicalize(points: &[PricePoint]) -> (Vec<PricePoint>, usize) {
    let mut by_date: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    for p in points {
        by_date.insert(p.date, p.price);
    }
    let duplicates = points.len() - by_date.len();
    let series = by_date
        .into_iter()
        .map(|(date, price)| PricePoint { date, price })
        .collect();
    (series, duplicates)
}

/// True when the series is strictly ascending by date.
pub fn is_canonical(points: &[PricePoint]) -> bool {
    points.windows(2).all(|w| w[0].date < w[1].date)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(day: u32, price: f64) -> PricePoint {
        PricePoint::new(NaiveDate::from_ymd_opt(2024, 2, day).unwrap(), price)
    }

    #[test]
    fn sorts_data() {
        let (series, dups) = canonicalize(&[p(3, 3.0), p(1, 1.0), p(2, 2.0)]);
        assert_eq!(dups, 0);
        let prices: Vec<f64> = series.iter().map(|x| x.price).collect();
        assert_eq!(prices, vec![1.0, 2.0, 3.0]);
        assert!(is_canonical(&series));
    }

    #[test]
    fn duplicate_keeps_latest_occurrence() {
        let (series, dups) = canonicalize(&[p(1, 100.0), p(2, 101.0), p(1, 105.0)]);
        assert_eq!(dups, 1);
        assert_eq!(series.len(), 2);
        assert_eq!(series[0].price, 105.0);
    }

    #[test]
    fn detects_non_canonical() {
        assert!(!is_canonical(&[p(2, 1.0), p(1, 1.0)]));
        assert!(!is_canonical(&[p(1, 1.0), p(1, 2.0)]));
        assert!(is_canonical(&[]));
    }
}
