//! Batch analysis entry points.
//!
//! Data flow:
//! SpreadSeries → detect → score → top recommendations
//! SpreadSeries → zone analysis
//!
//! The two branches only read the series, so they can run side by side.

use std::sync::Arc;

use serde::Serialize;
use tracing::{info, instrument};

use crate::detector::detect;
use crate::error::SpreadError;
use crate::scorer::{Recommendation, TOP_RECOMMENDATIONS, score};
use crate::types::{SpreadPoint, SpreadSeries};
use crate::zones::{ZoneReport, ZoneSet, analyze};

/// Default magnitude (percent) used by [`find_opportunities`] callers.
pub const DEFAULT_OPPORTUNITY_THRESHOLD: f64 = 0.5;

/// Everything the batch path derives from one spread series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpreadReport {
    pub zones: ZoneReport,
    /// Best entry levels, at most [`TOP_RECOMMENDATIONS`].
    pub recommendations: Vec<Recommendation>,
    pub peaks_detected: usize,
    pub total_data_points: usize,
    pub time_range_secs: i64,
}

fn top_recommendations(series: &SpreadSeries) -> (usize, Vec<Recommendation>) {
    let peaks = detect(series);
    let mut recs = score(&peaks);
    recs.truncate(TOP_RECOMMENDATIONS);
    (peaks.len(), recs)
}

fn assemble(
    series: &SpreadSeries,
    zones: ZoneReport,
    peaks_detected: usize,
    recommendations: Vec<Recommendation>,
) -> SpreadReport {
    let report = SpreadReport {
        zones,
        recommendations,
        peaks_detected,
        total_data_points: series.len(),
        time_range_secs: series.time_range_secs(),
    };

    info!(
        points = report.total_data_points,
        range_secs = report.time_range_secs,
        peaks = report.peaks_detected,
        recommendations = report.recommendations.len(),
        most_frequent_zone = ?report.zones.most_frequent,
        "spread analysis complete"
    );

    report
}

/// Runs both analyses on the calling thread.
#[instrument(skip_all, fields(points = series.len()))]
pub fn analyze_spread(series: &SpreadSeries, zones: &ZoneSet) -> SpreadReport {
    let (peaks_detected, recommendations) = top_recommendations(series);
    let zone_report = analyze(series, zones);
    assemble(series, zone_report, peaks_detected, recommendations)
}

/// Runs peak scoring and zone analysis on two blocking tasks.
#[instrument(skip_all, fields(points = series.len()))]
pub async fn analyze_spread_parallel(
    series: Arc<SpreadSeries>,
    zones: Arc<ZoneSet>,
) -> Result<SpreadReport, SpreadError> {
    let peaks_series = Arc::clone(&series);
    let zones_series = Arc::clone(&series);

    let peaks = tokio::task::spawn_blocking(move || top_recommendations(&peaks_series));
    let zone_report = tokio::task::spawn_blocking(move || analyze(&zones_series, &zones));

    let (peaks, zone_report) = tokio::try_join!(peaks, zone_report)
        .map_err(|e| SpreadError::Join(e.to_string()))?;
    let (peaks_detected, recommendations) = peaks;

    Ok(assemble(&series, zone_report, peaks_detected, recommendations))
}

/// Samples whose spread magnitude reaches `threshold` percent.
pub fn find_opportunities(series: &SpreadSeries, threshold: f64) -> Vec<SpreadPoint> {
    series
        .iter()
        .filter(|p| p.abs_percent() >= threshold)
        .copied()
        .collect()
}

/// Compact human duration: `45s`, `12m`, `1.5h`.
pub fn format_duration(secs: f64) -> String {
    if secs < 60.0 {
        format!("{}s", secs.round())
    } else if secs < 3_600.0 {
        format!("{}m", (secs / 60.0).round())
    } else {
        format!("{:.1}h", secs / 3_600.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn oscillating(n: usize) -> SpreadSeries {
        // 0.2, 1.2, 0.2, 1.2, ... one minute apart
        SpreadSeries::from_points(
            (0..n)
                .map(|k| {
                    let pct = if k % 2 == 1 { 1.2 } else { 0.2 };
                    SpreadPoint::from_prices(k as i64 * 60, 100.0 + pct, 100.0)
                })
                .collect(),
        )
    }

    #[test]
    fn report_combines_both_branches() {
        let s = oscillating(21);

        let report = analyze_spread(&s, &ZoneSet::default());

        assert_eq!(report.total_data_points, 21);
        assert_eq!(report.time_range_secs, 1_200);
        assert_eq!(report.peaks_detected, 10);
        assert_eq!(report.recommendations.len(), 1);

        let r = &report.recommendations[0];
        assert_eq!(r.entry_spread, 1.2);
        assert_eq!(r.frequency, 10);
        assert!((r.avg_convergence_secs - 60.0).abs() < 1e-9);

        // 0.2 starts 11 dwells, 1.2 starts 10.
        assert_eq!(report.zones.most_frequent.as_deref(), Some("0-1"));
    }

    #[test]
    fn empty_series_reports_nothing() {
        let report = analyze_spread(&SpreadSeries::default(), &ZoneSet::default());
        assert_eq!(report.total_data_points, 0);
        assert_eq!(report.time_range_secs, 0);
        assert!(report.recommendations.is_empty());
        assert_eq!(report.zones.most_frequent, None);
    }

    #[tokio::test]
    async fn parallel_matches_sequential() {
        let s = oscillating(41);
        let zones = ZoneSet::default();

        let sequential = analyze_spread(&s, &zones);
        let parallel = analyze_spread_parallel(Arc::new(s), Arc::new(zones))
            .await
            .unwrap();

        assert_eq!(sequential, parallel);
    }

    #[test]
    fn opportunities_filter_by_magnitude() {
        let s = SpreadSeries::from_points(vec![
            SpreadPoint::from_prices(1, 100.4, 100.0),
            SpreadPoint::from_prices(2, 99.0, 100.0),
            SpreadPoint::from_prices(3, 100.6, 100.0),
        ]);

        let times: Vec<i64> = find_opportunities(&s, DEFAULT_OPPORTUNITY_THRESHOLD)
            .iter()
            .map(|p| p.time)
            .collect();
        assert_eq!(times, vec![2, 3]);
    }

    #[test]
    fn durations_format_by_magnitude() {
        assert_eq!(format_duration(42.4), "42s");
        assert_eq!(format_duration(150.0), "3m");
        assert_eq!(format_duration(5_400.0), "1.5h");
    }
}
