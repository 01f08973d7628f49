//! Peak / Convergence Detector.
//!
//! A peak is a local widening of the absolute spread. For each peak the
//! detector looks a bounded distance ahead for the first sample where the
//! spread has retraced by at least 30%. Peaks that never converge inside
//! the window are dropped.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::types::SpreadSeries;

/// Samples scanned after a peak, exclusive upper bound relative to the peak.
pub const LOOKAHEAD: usize = 50;

/// A sample exceeding its predecessor by this factor is a spike.
pub const SPIKE_FACTOR: f64 = 1.1;

/// Convergence when the spread falls to this fraction of the peak.
pub const CONVERGENCE_RATIO: f64 = 0.7;

/// A converged peak. Immutable once detected.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PeakEvent {
    pub peak_index: usize,
    /// Absolute spread percent at the peak.
    pub peak_abs_spread: f64,
    pub peak_time: i64,
    pub convergence_index: usize,
    pub convergence_time: i64,
    /// Absolute spread percent at the convergence sample.
    pub convergence_spread: f64,
    /// `convergence_time - peak_time`.
    pub convergence_secs: i64,
    /// `peak_abs_spread - convergence_spread`.
    pub profit: f64,
}

fn is_peak(prev: f64, curr: f64, next: f64) -> bool {
    (curr > prev && curr > next) || curr > prev * SPIKE_FACTOR
}

/// Scans `series` for converged peaks, in index order.
pub fn detect(series: &SpreadSeries) -> Vec<PeakEvent> {
    let abs: Vec<f64> = series.iter().map(|p| p.abs_percent()).collect();
    let n = abs.len();
    let mut events = Vec::new();

    if n < 3 {
        return events;
    }

    for i in 1..n - 1 {
        let curr = abs[i];
        if !is_peak(abs[i - 1], curr, abs[i + 1]) {
            continue;
        }

        let target = curr * CONVERGENCE_RATIO;
        let window_end = (i + LOOKAHEAD).min(n);
        let Some(j) = (i + 1..window_end).find(|&j| abs[j] <= target) else {
            continue;
        };

        let peak = &series[i];
        let conv = &series[j];
        events.push(PeakEvent {
            peak_index: i,
            peak_abs_spread: curr,
            peak_time: peak.time,
            convergence_index: j,
            convergence_time: conv.time,
            convergence_spread: abs[j],
            convergence_secs: conv.time - peak.time,
            profit: curr - abs[j],
        });
    }

    debug!(samples = n, peaks = events.len(), "peak detection finished");

    events
}


#[cfg(test)]
mod proptests {
    use super::*;
    use crate::types::{SpreadPoint, SpreadSeries};
    use proptest::prelude::*;

    fn build(values: &[f64]) -> SpreadSeries {
        SpreadSeries::from_points(
            values
                .iter()
                .enumerate()
                .map(|(k, &v)| SpreadPoint::from_prices(k as i64 * 30, 100.0 + v, 100.0))
                .collect(),
        )
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(300))]
        #[test]
        fn emitted_peaks_respect_retracement_and_window(
            values in prop::collection::vec(-5.0..5.0f64, 0..200)
        ) {
            let s = build(&values);
            let events = detect(&s);

            for e in &events {
                prop_assert!(e.convergence_spread <= e.peak_abs_spread * CONVERGENCE_RATIO + 1e-9);
                prop_assert!(e.convergence_index > e.peak_index);
                prop_assert!(e.convergence_index < e.peak_index + LOOKAHEAD);
                prop_assert_eq!(e.profit, e.peak_abs_spread - e.convergence_spread);
            }
            prop_assert!(events.windows(2).all(|w| w[0].peak_index < w[1].peak_index));
            prop_assert_eq!(detect(&s), events);
        }
    }
}
