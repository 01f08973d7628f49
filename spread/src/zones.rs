//! Zone Duration Analyzer.
//!
//! Partitions `[0, ∞)` into magnitude zones and measures, per zone, how
//! long the spread stays inside it and how often it comes back.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::SpreadError;
use crate::types::SpreadSeries;

/// Half-open magnitude interval `[lower, upper)` in absolute spread percent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    pub lower: f64,
    pub upper: f64,
    pub label: String,
}

impl Zone {
    /// Stable identifier such as `"1-2"` or `"3-∞"`.
    pub fn key(&self) -> String {
        if self.upper.is_infinite() {
            format!("{}-∞", self.lower)
        } else {
            format!("{}-{}", self.lower, self.upper)
        }
    }

    pub fn contains(&self, magnitude: f64) -> bool {
        magnitude >= self.lower && magnitude < self.upper
    }
}

/// Ordered zone list partitioning `[0, ∞)`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ZoneSet {
    zones: Vec<Zone>,
}

impl ZoneSet {
    /// Builds zones from ascending upper thresholds. Each zone starts at the
    /// previous threshold (0 for the first) and the last zone is open-ended
    /// whatever its supplied threshold.
    pub fn from_thresholds<I, S>(thresholds: I) -> Result<Self, SpreadError>
    where
        I: IntoIterator<Item = (f64, S)>,
        S: Into<String>,
    {
        let mut zones: Vec<Zone> = Vec::new();
        let mut lower = 0.0;

        for (upper, label) in thresholds {
            if !(upper > 0.0) {
                return Err(SpreadError::NonPositiveThreshold(upper));
            }
            if !(upper > lower) {
                return Err(SpreadError::UnorderedZones {
                    prev: lower,
                    next: upper,
                });
            }
            zones.push(Zone {
                lower,
                upper,
                label: label.into(),
            });
            lower = upper;
        }

        let last = zones.last_mut().ok_or(SpreadError::NoZones)?;
        last.upper = f64::INFINITY;

        Ok(Self { zones })
    }

    /// Builds zones from interior cut points, labelled like the default
    /// set: `[1, 2]` gives `< 1%`, `1-2%` and `≥ 2%`.
    pub fn from_boundaries(bounds: &[f64]) -> Result<Self, SpreadError> {
        let mut thresholds: Vec<(f64, String)> = Vec::with_capacity(bounds.len() + 1);
        let mut lower: Option<f64> = None;

        for &upper in bounds {
            let label = match lower {
                None => format!("< {upper}%"),
                Some(lower) => format!("{lower}-{upper}%"),
            };
            thresholds.push((upper, label));
            lower = Some(upper);
        }
        thresholds.push((f64::INFINITY, format!("≥ {}%", lower.unwrap_or(0.0))));

        Self::from_thresholds(thresholds)
    }

    pub fn zones(&self) -> &[Zone] {
        &self.zones
    }

    /// Index of the first zone containing `magnitude`. `None` for NaN and +∞.
    pub fn assign(&self, magnitude: f64) -> Option<usize> {
        self.zones.iter().position(|z| z.contains(magnitude))
    }
}

impl Default for ZoneSet {
    fn default() -> Self {
        Self {
            zones: vec![
                Zone {
                    lower: 0.0,
                    upper: 1.0,
                    label: "< 1%".into(),
                },
                Zone {
                    lower: 1.0,
                    upper: 2.0,
                    label: "1-2%".into(),
                },
                Zone {
                    lower: 2.0,
                    upper: 3.0,
                    label: "2-3%".into(),
                },
                Zone {
                    lower: 3.0,
                    upper: f64::INFINITY,
                    label: "≥ 3%".into(),
                },
            ],
        }
    }
}

/// Dwell and recurrence statistics for one zone. Durations and intervals
/// are in seconds.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ZoneStat {
    pub key: String,
    pub label: String,
    pub count: usize,
    pub durations: Vec<i64>,
    pub intervals: Vec<i64>,
    pub avg_duration: f64,
    pub min_duration: i64,
    pub max_duration: i64,
    pub avg_interval: f64,
    pub min_interval: i64,
    pub max_interval: i64,
}

impl ZoneStat {
    fn new(zone: &Zone) -> Self {
        Self {
            key: zone.key(),
            label: zone.label.clone(),
            count: 0,
            durations: Vec::new(),
            intervals: Vec::new(),
            avg_duration: 0.0,
            min_duration: 0,
            max_duration: 0,
            avg_interval: 0.0,
            min_interval: 0,
            max_interval: 0,
        }
    }

    fn finalize(&mut self) {
        (self.avg_duration, self.min_duration, self.max_duration) = summarize(&self.durations);
        (self.avg_interval, self.min_interval, self.max_interval) = summarize(&self.intervals);
    }
}

/// `(avg, min, max)`, all zero for an empty list.
fn summarize(values: &[i64]) -> (f64, i64, i64) {
    if values.is_empty() {
        return (0.0, 0, 0);
    }
    let sum: i64 = values.iter().sum();
    let min = values.iter().copied().min().unwrap_or_default();
    let max = values.iter().copied().max().unwrap_or_default();
    (sum as f64 / values.len() as f64, min, max)
}

/// Per-zone statistics in zone order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ZoneReport {
    pub stats: Vec<ZoneStat>,
    /// Key of the zone with the most occurrences; first zone wins ties.
    pub most_frequent: Option<String>,
}

impl ZoneReport {
    pub fn get(&self, key: &str) -> Option<&ZoneStat> {
        self.stats.iter().find(|s| s.key == key)
    }
}

/// Single pass over `series` tracking the current zone.
pub fn analyze(series: &SpreadSeries, zones: &ZoneSet) -> ZoneReport {
    let mut stats: Vec<ZoneStat> = zones.zones().iter().map(ZoneStat::new).collect();
    let mut last_start: Vec<Option<i64>> = vec![None; stats.len()];
    let mut current: Option<usize> = None;
    let mut dwell_start = 0i64;

    for point in series {
        let Some(zone) = zones.assign(point.abs_percent()) else {
            continue;
        };
        if current == Some(zone) {
            continue;
        }

        if let Some(prev) = current {
            stats[prev].durations.push(point.time - dwell_start);
        }

        current = Some(zone);
        dwell_start = point.time;
        stats[zone].count += 1;

        if let Some(prev_start) = last_start[zone] {
            stats[zone].intervals.push(point.time - prev_start);
        }
        last_start[zone] = Some(point.time);
    }

    // Final dwell is cut short by the end of the data but still recorded.
    if let (Some(zone), Some(last)) = (current, series.last()) {
        stats[zone].durations.push(last.time - dwell_start);
    }

    let mut most_frequent = None;
    let mut max_count = 0;
    for s in &mut stats {
        s.finalize();
        if s.count > max_count {
            max_count = s.count;
            most_frequent = Some(s.key.clone());
        }
    }

    debug!(
        samples = series.len(),
        zones = stats.len(),
        most_frequent = ?most_frequent,
        "zone analysis finished"
    );

    ZoneReport {
        stats,
        most_frequent,
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(300))]
        #[test]
        fn every_finite_magnitude_lands_in_exactly_one_zone(
            steps in prop::collection::vec(0.01..5.0f64, 0..8),
            magnitude in 0.0..1e9f64,
        ) {
            let bounds: Vec<f64> = steps
                .iter()
                .scan(0.0, |acc, step| {
                    *acc += step;
                    Some(*acc)
                })
                .collect();
            let zones = ZoneSet::from_boundaries(&bounds).unwrap();

            let idx = zones.assign(magnitude);
            prop_assert!(idx.is_some());
            let hits = zones.zones().iter().filter(|z| z.contains(magnitude)).count();
            prop_assert_eq!(hits, 1);

            for &b in &bounds {
                prop_assert!(zones.assign(b).is_some());
            }
        }
    }
}
