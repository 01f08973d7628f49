use std::ops::Deref;

use serde::{Deserialize, Serialize};

/// Closing price of one candle, as produced by a price source.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    /// Unix seconds.
    pub time: i64,
    pub price: f64,
}

impl PricePoint {
    pub fn new(time: i64, price: f64) -> Self {
        Self { time, price }
    }
}

/// Spread between two sources at a shared timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpreadPoint {
    pub time: i64,
    pub price_a: f64,
    pub price_b: f64,
    /// `price_a - price_b`.
    pub spread_absolute: f64,
    /// `spread_absolute / price_b * 100`. Non-finite when `price_b == 0`.
    pub spread_percent: f64,
}

impl SpreadPoint {
    /// Single-pair spread primitive shared by the batch aligner and the
    /// live feed.
    pub fn from_prices(time: i64, price_a: f64, price_b: f64) -> Self {
        let spread_absolute = price_a - price_b;
        Self {
            time,
            price_a,
            price_b,
            spread_absolute,
            spread_percent: spread_absolute / price_b * 100.0,
        }
    }

    /// Magnitude used by peak detection and zone assignment.
    pub fn abs_percent(&self) -> f64 {
        self.spread_percent.abs()
    }
}

/// Time-ascending spread series without duplicate timestamps.
///
/// Only constructed by [`crate::align`] (or from points already known to
/// satisfy the ordering), so consumers can rely on the ordering.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SpreadSeries(Vec<SpreadPoint>);

impl SpreadSeries {
    pub(crate) fn from_sorted(points: Vec<SpreadPoint>) -> Self {
        debug_assert!(points.windows(2).all(|w| w[0].time < w[1].time));
        Self(points)
    }

    /// Builds a series from arbitrary points, sorting by time and keeping the
    /// last point for a repeated timestamp.
    pub fn from_points(mut points: Vec<SpreadPoint>) -> Self {
        points.sort_by_key(|p| p.time);
        let mut out: Vec<SpreadPoint> = Vec::with_capacity(points.len());
        for p in points {
            match out.last_mut() {
                Some(last) if last.time == p.time => *last = p,
                _ => out.push(p),
            }
        }
        Self(out)
    }

    /// Seconds between the first and the last sample, 0 when empty.
    pub fn time_range_secs(&self) -> i64 {
        match (self.0.first(), self.0.last()) {
            (Some(first), Some(last)) => last.time - first.time,
            _ => 0,
        }
    }
}

impl Deref for SpreadSeries {
    type Target = [SpreadPoint];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<'a> IntoIterator for &'a SpreadSeries {
    type Item = &'a SpreadPoint;
    type IntoIter = std::slice::Iter<'a, SpreadPoint>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
