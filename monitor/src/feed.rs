use std::sync::Arc;

use async_trait::async_trait;
use sources::{PriceSource, SourceError};
use spread::{SpreadPoint, align};
use tracing::debug;

/// Source of live spread samples for the monitor loop.
#[async_trait]
pub trait LiveFeed: Send + Sync {
    /// Human readable pair label for logs.
    fn label(&self) -> String;

    /// Latest spread, or `None` when the two latest candles do not share a
    /// timestamp.
    async fn latest(&self) -> Result<Option<SpreadPoint>, SourceError>;
}

/// Latest candle from two price sources, joined like the batch path.
#[derive(Clone)]
pub struct PairFeed {
    source_a: Arc<dyn PriceSource>,
    symbol_a: String,
    source_b: Arc<dyn PriceSource>,
    symbol_b: String,
}

impl PairFeed {
    pub fn new(
        source_a: Arc<dyn PriceSource>,
        symbol_a: impl Into<String>,
        source_b: Arc<dyn PriceSource>,
        symbol_b: impl Into<String>,
    ) -> Self {
        Self {
            source_a,
            symbol_a: symbol_a.into(),
            source_b,
            symbol_b: symbol_b.into(),
        }
    }
}

#[async_trait]
impl LiveFeed for PairFeed {
    fn label(&self) -> String {
        format!(
            "{}:{}/{}:{}",
            self.source_a.name(),
            self.symbol_a,
            self.source_b.name(),
            self.symbol_b
        )
    }

    async fn latest(&self) -> Result<Option<SpreadPoint>, SourceError> {
        let (a, b) = tokio::try_join!(
            self.source_a.fetch_latest(&self.symbol_a),
            self.source_b.fetch_latest(&self.symbol_b),
        )?;

        let sample = align(&[a], &[b]).first().copied();
        if sample.is_none() {
            debug!(time_a = a.time, time_b = b.time, "latest candles not aligned");
        }

        Ok(sample)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sources::StaticSource;
    use spread::PricePoint;

    #[tokio::test]
    async fn aligned_latest_candles_make_a_sample() {
        let a = StaticSource::new("a");
        a.push_live(Ok(PricePoint::new(60, 10.0)));
        let b = StaticSource::new("b");
        b.push_live(Ok(PricePoint::new(60, 9.0)));

        let feed = PairFeed::new(Arc::new(a), "X", Arc::new(b), "Y");
        let sample = feed.latest().await.unwrap().unwrap();

        assert_eq!(sample.spread_absolute, 1.0);
        assert_eq!(feed.label(), "a:X/b:Y");
    }

    #[tokio::test]
    async fn mismatched_candles_yield_no_sample() {
        let a = StaticSource::new("a");
        a.push_live(Ok(PricePoint::new(60, 10.0)));
        let b = StaticSource::new("b");
        b.push_live(Ok(PricePoint::new(120, 9.0)));

        let feed = PairFeed::new(Arc::new(a), "X", Arc::new(b), "Y");
        assert_eq!(feed.latest().await.unwrap(), None);
    }

    #[tokio::test]
    async fn either_side_failing_fails_the_fetch() {
        let a = StaticSource::new("a");
        a.push_live(Ok(PricePoint::new(60, 10.0)));
        let b = StaticSource::new("b");
        b.push_live(Err("maintenance".into()));

        let feed = PairFeed::new(Arc::new(a), "X", Arc::new(b), "Y");
        assert!(feed.latest().await.is_err());
    }
}
