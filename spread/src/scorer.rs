//! Bucketed Recommendation Scorer.
//!
//! Groups converged peaks into 0.1 percentage-point buckets by peak
//! magnitude and ranks buckets by a weighted score of frequency, profit
//! and reversion speed.

use std::cmp::Ordering;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::detector::PeakEvent;

/// Number of recommendations surfaced to the user.
pub const TOP_RECOMMENDATIONS: usize = 5;

/// Buckets with fewer members are treated as noise.
pub const MIN_BUCKET_SIZE: usize = 2;

const FREQUENCY_WEIGHT: f64 = 0.3;
const PROFIT_WEIGHT: f64 = 0.4;
const SPEED_WEIGHT: f64 = 0.3;

/// Frequency saturates at this many occurrences.
const FREQUENCY_CAP: f64 = 10.0;
/// Profit saturates at this many percentage points.
const PROFIT_CAP: f64 = 2.0;
/// Speed decays linearly to zero at one hour.
const SPEED_HORIZON_SECS: f64 = 3_600.0;

/// Reported success rate. Only converged peaks are ever bucketed.
pub const SUCCESS_RATE: f64 = 100.0;

/// Ranked entry level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    /// Bucket centre, in absolute spread percent.
    pub entry_spread: f64,
    pub frequency: usize,
    pub avg_convergence_secs: f64,
    pub avg_profit: f64,
    pub avg_exit_spread: f64,
    pub success_rate: f64,
    pub score: f64,
}

/// Bucket key: peak magnitude in tenths of a percentage point.
///
/// Non-finite magnitudes (a zero reference price) share one bucket that
/// reports an infinite entry spread.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum BucketKey {
    Tenths(i64),
    Unbounded,
}

impl BucketKey {
    fn of(peak_abs_spread: f64) -> Self {
        if peak_abs_spread.is_finite() {
            BucketKey::Tenths((peak_abs_spread * 10.0).round() as i64)
        } else {
            BucketKey::Unbounded
        }
    }

    fn entry_spread(self) -> f64 {
        match self {
            BucketKey::Tenths(tenths) => tenths as f64 / 10.0,
            BucketKey::Unbounded => f64::INFINITY,
        }
    }
}

#[derive(Debug, Default)]
struct BucketAggregate {
    count: usize,
    sum_convergence_secs: f64,
    sum_profit: f64,
    sum_exit_spread: f64,
}

impl BucketAggregate {
    fn push(&mut self, e: &PeakEvent) {
        self.count += 1;
        self.sum_convergence_secs += e.convergence_secs as f64;
        self.sum_profit += e.profit;
        self.sum_exit_spread += e.convergence_spread;
    }

    fn into_recommendation(self, key: BucketKey) -> Recommendation {
        let n = self.count as f64;
        let avg_convergence_secs = self.sum_convergence_secs / n;
        let avg_profit = self.sum_profit / n;

        Recommendation {
            entry_spread: key.entry_spread(),
            frequency: self.count,
            avg_convergence_secs,
            avg_profit,
            avg_exit_spread: self.sum_exit_spread / n,
            success_rate: SUCCESS_RATE,
            score: weighted_score(self.count, avg_profit, avg_convergence_secs),
        }
    }
}

/// `0.3 * frequency + 0.4 * profit + 0.3 * speed`, each term in `[0, 1]`
/// except profit, which goes negative with a negative average profit.
pub fn weighted_score(frequency: usize, avg_profit: f64, avg_convergence_secs: f64) -> f64 {
    let frequency_score = (frequency as f64 / FREQUENCY_CAP).min(1.0);
    let profit_score = (avg_profit / PROFIT_CAP).min(1.0);
    let speed_score = if avg_convergence_secs > 0.0 {
        (1.0 - avg_convergence_secs / SPEED_HORIZON_SECS).max(0.0)
    } else {
        0.0
    };

    frequency_score * FREQUENCY_WEIGHT + profit_score * PROFIT_WEIGHT + speed_score * SPEED_WEIGHT
}

/// Buckets `events` and returns every bucket with at least
/// [`MIN_BUCKET_SIZE`] members, best score first.
///
/// Ties keep the order in which buckets were first seen.
pub fn score(events: &[PeakEvent]) -> Vec<Recommendation> {
    let mut order: Vec<BucketKey> = Vec::new();
    let mut buckets: HashMap<BucketKey, BucketAggregate> = HashMap::new();

    for e in events {
        let key = BucketKey::of(e.peak_abs_spread);
        buckets
            .entry(key)
            .or_insert_with(|| {
                order.push(key);
                BucketAggregate::default()
            })
            .push(e);
    }

    let mut recommendations: Vec<Recommendation> = order
        .into_iter()
        .filter_map(|key| {
            let agg = buckets.remove(&key)?;
            (agg.count >= MIN_BUCKET_SIZE).then(|| agg.into_recommendation(key))
        })
        .collect();

    // Stable sort; NaN scores sink to the end.
    recommendations.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or_else(|| nan_last(a, b))
    });

    debug!(
        peaks = events.len(),
        recommendations = recommendations.len(),
        "recommendations scored"
    );

    recommendations
}

fn nan_last(a: &Recommendation, b: &Recommendation) -> Ordering {
    a.score.is_nan().cmp(&b.score.is_nan())
}
