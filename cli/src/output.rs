use std::fmt::{self, Write};

use chrono::{DateTime, Utc};
use spread::report::format_duration;
use spread::{SpreadPoint, SpreadReport, SpreadSeries};

fn timestamp(secs: i64) -> String {
    DateTime::<Utc>::from_timestamp(secs, 0)
        .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| secs.to_string())
}

/// Plain-text rendering of a batch report.
pub fn render_report(
    pair: &str,
    series: &SpreadSeries,
    report: &SpreadReport,
    opportunities: &[SpreadPoint],
) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail.
    let _ = write_report(&mut out, pair, series, report, opportunities);
    out
}

fn write_report(
    out: &mut String,
    pair: &str,
    series: &SpreadSeries,
    report: &SpreadReport,
    opportunities: &[SpreadPoint],
) -> fmt::Result {
    writeln!(out, "📊 {pair}")?;

    let (Some(first), Some(last)) = (series.first(), series.last()) else {
        writeln!(out, "no overlapping candles")?;
        return Ok(());
    };

    writeln!(
        out,
        "{} points, {} → {} ({})",
        report.total_data_points,
        timestamp(first.time),
        timestamp(last.time),
        format_duration(report.time_range_secs as f64)
    )?;
    writeln!(out, "{} converged peaks", report.peaks_detected)?;

    writeln!(out, "\nBest entry levels")?;
    if report.recommendations.is_empty() {
        writeln!(out, "  none (no spread level converged twice)")?;
    }
    for (rank, r) in report.recommendations.iter().enumerate() {
        writeln!(
            out,
            "  #{} entry {:.1}%  seen {}x  exit ~{:.3}%  profit ~{:.3}%  converges in {}  score {:.1}",
            rank + 1,
            r.entry_spread,
            r.frequency,
            r.avg_exit_spread,
            r.avg_profit,
            format_duration(r.avg_convergence_secs),
            r.score
        )?;
    }

    writeln!(out, "\nZones")?;
    for s in &report.zones.stats {
        write!(out, "  {:<8} entered {:>3}x", s.label, s.count)?;
        if s.count > 0 {
            write!(
                out,
                "  dwell avg {} (min {}, max {})",
                format_duration(s.avg_duration),
                format_duration(s.min_duration as f64),
                format_duration(s.max_duration as f64)
            )?;
        }
        if !s.intervals.is_empty() {
            write!(out, "  recurs every ~{}", format_duration(s.avg_interval))?;
        }
        writeln!(out)?;
    }
    if let Some(key) = &report.zones.most_frequent {
        writeln!(out, "  most frequent: {key}")?;
    }

    if !opportunities.is_empty() {
        writeln!(out, "\nOpportunities ({})", opportunities.len())?;
        for p in opportunities {
            writeln!(
                out,
                "  {}  {:+.3}%  a={} b={}",
                timestamp(p.time),
                p.spread_percent,
                p.price_a,
                p.price_b
            )?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use spread::{PricePoint, ZoneSet, align, analyze_spread};

    #[test]
    fn text_report_mentions_levels_and_zones() {
        let a: Vec<PricePoint> = (0..8)
            .map(|k| PricePoint::new(k * 60, if k % 2 == 1 { 101.5 } else { 100.1 }))
            .collect();
        let b: Vec<PricePoint> = (0..8).map(|k| PricePoint::new(k * 60, 100.0)).collect();
        let series = align(&a, &b);
        let report = analyze_spread(&series, &ZoneSet::default());

        let text = render_report("a/b", &series, &report, &[]);

        assert!(text.contains("8 points, 1970-01-01 00:00 → 1970-01-01 00:07 (7m)"));
        assert!(text.contains("#1 entry 1.5%  seen 3x"));
        assert!(text.contains("most frequent: 0-1"));
        assert!(!text.contains("Opportunities"));
    }

    #[test]
    fn empty_series_is_reported() {
        let series = align(&[], &[]);
        let report = analyze_spread(&series, &ZoneSet::default());

        let text = render_report("a/b", &series, &report, &[]);
        assert!(text.contains("no overlapping candles"));
    }
}
