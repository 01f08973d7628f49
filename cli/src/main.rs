mod cli;
mod config;
mod output;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use common::logger::{TraceId, annotate_span, init_logger, root_span};
use monitor::{AlertMonitor, LogSink, MonitorConfig, PairFeed};
use sources::{PriceSource, Timeframe, fetch_series_or_empty, source_for};
use spread::{ZoneSet, align, analyze_spread_parallel, find_opportunities};
use tracing::{Instrument, info, warn};

use crate::cli::{AnalyzeArgs, Cli, Command, MonitorArgs, PairArgs};
use crate::config::AppConfig;

fn pair_label(p: &PairArgs) -> String {
    format!("{}:{} vs {}:{}", p.source_a, p.symbol_a, p.source_b, p.symbol_b)
}

fn build_sources(
    p: &PairArgs,
    cfg: &AppConfig,
) -> anyhow::Result<(Arc<dyn PriceSource>, Arc<dyn PriceSource>)> {
    let a = source_for(p.source_a, &cfg.sources).context("building source A")?;
    let b = source_for(p.source_b, &cfg.sources).context("building source B")?;
    Ok((a, b))
}

/// Seconds between the first and last of `limit` consecutive candles.
fn requested_span_secs(timeframe: Timeframe, limit: usize) -> i64 {
    timeframe.seconds() * limit.saturating_sub(1) as i64
}

fn zone_set(bounds: &[f64]) -> anyhow::Result<ZoneSet> {
    if bounds.is_empty() {
        return Ok(ZoneSet::default());
    }
    ZoneSet::from_boundaries(bounds).context("invalid --zone-thresholds")
}

/// One-shot batch analysis over the last `limit` candles of both legs.
async fn run_analyze(args: AnalyzeArgs, cfg: &AppConfig) -> anyhow::Result<()> {
    let label = pair_label(&args.pair);
    let zones = zone_set(&args.zone_thresholds)?;
    let (a, b) = build_sources(&args.pair, cfg)?;

    let span = root_span("analyze", &TraceId::default());
    span.in_scope(|| annotate_span(&label));

    let (series_a, series_b) = tokio::join!(
        fetch_series_or_empty(&*a, &args.pair.symbol_a, args.timeframe, args.limit),
        fetch_series_or_empty(&*b, &args.pair.symbol_b, args.timeframe, args.limit),
    );
    info!(
        parent: &span,
        candles_a = series_a.len(),
        candles_b = series_b.len(),
        "history fetched"
    );

    let series = Arc::new(align(&series_a, &series_b));
    let requested = requested_span_secs(args.timeframe, args.limit);
    if series.time_range_secs() < requested / 2 {
        warn!(
            parent: &span,
            covered_secs = series.time_range_secs(),
            requested_secs = requested,
            "aligned series covers less than half of the requested window"
        );
    }

    let report = analyze_spread_parallel(Arc::clone(&series), Arc::new(zones))
        .instrument(span)
        .await?;

    let opportunities = args
        .opportunities
        .map(|threshold| find_opportunities(&series, threshold))
        .unwrap_or_default();

    if args.json {
        let body = serde_json::json!({
            "pair": label,
            "report": report,
            "opportunities": opportunities,
        });
        println!("{}", serde_json::to_string_pretty(&body)?);
    } else {
        print!("{}", output::render_report(&label, &series, &report, &opportunities));
    }

    Ok(())
}

/// Live alerting until Ctrl-C.
async fn run_monitor(args: MonitorArgs, cfg: &AppConfig) -> anyhow::Result<()> {
    let (a, b) = build_sources(&args.pair, cfg)?;
    let feed = PairFeed::new(a, args.pair.symbol_a.clone(), b, args.pair.symbol_b.clone());

    let monitor = AlertMonitor::new(
        Arc::new(feed),
        Arc::new(LogSink),
        MonitorConfig {
            interval: Duration::from_secs(args.interval_secs),
            cooldown: Duration::from_secs(args.cooldown_secs),
            zones: args.zones,
            sound_enabled: !args.mute,
            notifications_enabled: args.notify,
        },
    );

    for zone in monitor.zones() {
        info!(zone = %zone, "alert zone");
    }

    monitor.start()?;
    tokio::signal::ctrl_c()
        .await
        .context("waiting for Ctrl-C")?;
    monitor.stop().await;

    let history = monitor.history();
    info!(alerts = history.len(), "session finished");
    if let Some(last) = history.first() {
        info!(spread_pct = last.spread_percent, at_ms = last.timestamp_ms, "last alert");
    }

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cfg = AppConfig::from_env();

    init_logger("spreadwatch", cli.json_logs || cfg.production);

    match cli.command {
        Command::Analyze(args) => run_analyze(args, &cfg).await,
        Command::Monitor(args) => run_monitor(args, &cfg).await,
    }
}
