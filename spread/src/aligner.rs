//! Series Aligner.
//!
//! Inner-joins two price series on exact timestamp equality. There is no
//! interpolation and no nearest-match fallback: a timestamp missing from
//! either side simply produces no spread point.

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::types::{PricePoint, SpreadPoint, SpreadSeries};

/// Aligns `series_a` against `series_b` and computes the spread at every
/// shared timestamp.
///
/// Output follows `series_a`'s order. If `series_a` is not strictly
/// time-ascending it is normalised first (stable sort, last value wins on
/// duplicate timestamps), the same rule the lookup applies to `series_b`.
pub fn align(series_a: &[PricePoint], series_b: &[PricePoint]) -> SpreadSeries {
    if series_a.is_empty() || series_b.is_empty() {
        return SpreadSeries::default();
    }

    let lookup: HashMap<i64, f64> = series_b.iter().map(|p| (p.time, p.price)).collect();

    let points: Vec<SpreadPoint> = series_a
        .iter()
        .filter_map(|a| {
            lookup
                .get(&a.time)
                .map(|&price_b| SpreadPoint::from_prices(a.time, a.price, price_b))
        })
        .collect();

    let ordered = series_a.windows(2).all(|w| w[0].time < w[1].time);
    let series = if ordered {
        SpreadSeries::from_sorted(points)
    } else {
        warn!(
            len_a = series_a.len(),
            "series A is not strictly time-ascending; normalising before join"
        );
        SpreadSeries::from_points(points)
    };

    debug!(
        len_a = series_a.len(),
        len_b = series_b.len(),
        aligned = series.len(),
        "series aligned"
    );

    series
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pts(v: &[(i64, f64)]) -> Vec<PricePoint> {
        v.iter().map(|&(t, p)| PricePoint::new(t, p)).collect()
    }

    #[test]
    fn three_point_scenario() {
        let a = pts(&[(100, 10.0), (200, 10.0), (300, 10.0)]);
        let b = pts(&[(100, 10.0), (200, 9.0), (300, 10.0)]);

        let s = align(&a, &b);

        assert_eq!(s.len(), 3);
        assert_eq!(s[0].spread_absolute, 0.0);
        assert_eq!(s[0].spread_percent, 0.0);
        assert_eq!(s[1].time, 200);
        assert_eq!(s[1].spread_absolute, 1.0);
        assert!((s[1].spread_percent - 11.11).abs() < 0.01);
        assert_eq!(s[2].spread_percent, 0.0);
    }

    #[test]
    fn empty_inputs_give_empty_series() {
        let a = pts(&[(1, 1.0)]);
        assert!(align(&a, &[]).is_empty());
        assert!(align(&[], &a).is_empty());
    }

    #[test]
    fn only_shared_timestamps_survive() {
        let a = pts(&[(1, 10.0), (2, 11.0), (3, 12.0), (5, 13.0)]);
        let b = pts(&[(2, 10.0), (4, 10.0), (5, 10.0)]);

        let times: Vec<i64> = align(&a, &b).iter().map(|p| p.time).collect();
        assert_eq!(times, vec![2, 5]);
    }

    #[test]
    fn unsorted_series_a_is_normalised() {
        let a = pts(&[(3, 12.0), (1, 10.0), (3, 13.0), (2, 11.0)]);
        let b = pts(&[(1, 10.0), (2, 10.0), (3, 10.0)]);

        let s = align(&a, &b);
        let times: Vec<i64> = s.iter().map(|p| p.time).collect();

        assert_eq!(times, vec![1, 2, 3]);
        assert_eq!(s[2].price_a, 13.0);
    }

    #[test]
    fn duplicate_timestamp_in_b_uses_last_value() {
        let a = pts(&[(1, 10.0)]);
        let b = pts(&[(1, 8.0), (1, 5.0)]);

        assert_eq!(align(&a, &b)[0].price_b, 5.0);
    }

    #[test]
    fn zero_reference_price_is_not_an_error() {
        let a = pts(&[(1, 10.0)]);
        let b = pts(&[(1, 0.0)]);

        let s = align(&a, &b);
        assert_eq!(s.len(), 1);
        assert!(s[0].spread_percent.is_infinite());
    }
}
