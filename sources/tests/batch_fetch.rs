use std::sync::Arc;

use sources::{PriceSource, StaticSource, Timeframe, fetch_series_or_empty};
use spread::{PricePoint, align};

fn candles(prices: &[f64]) -> Vec<PricePoint> {
    prices
        .iter()
        .enumerate()
        .map(|(k, &p)| PricePoint::new(1_700_000_000 + k as i64 * 60, p))
        .collect()
}

#[tokio::test]
async fn two_sources_feed_the_aligner() -> anyhow::Result<()> {
    let a: Arc<dyn PriceSource> =
        Arc::new(StaticSource::new("a").with_history("BTCUSDT", candles(&[100.0, 101.0, 102.0])));
    let b: Arc<dyn PriceSource> =
        Arc::new(StaticSource::new("b").with_history("BTC-USDT", candles(&[100.0, 100.0, 100.0])));

    let (sa, sb) = tokio::try_join!(
        a.fetch_series("BTCUSDT", Timeframe::OneMinute, 200),
        b.fetch_series("BTC-USDT", Timeframe::OneMinute, 200),
    )?;

    let series = align(&sa, &sb);

    assert_eq!(series.len(), 3);
    assert!((series[2].spread_percent - 2.0).abs() < 1e-9);
    Ok(())
}

#[tokio::test]
async fn failed_fetch_degrades_to_empty_series() {
    let a = StaticSource::new("a").with_history("BTCUSDT", candles(&[100.0]));
    let missing = StaticSource::new("b");

    let sa = fetch_series_or_empty(&a, "BTCUSDT", Timeframe::OneMinute, 10).await;
    let sb = fetch_series_or_empty(&missing, "BTCUSDT", Timeframe::OneMinute, 10).await;

    assert_eq!(sa.len(), 1);
    assert!(sb.is_empty());
    assert!(align(&sa, &sb).is_empty());
}
