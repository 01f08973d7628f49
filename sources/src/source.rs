use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use spread::PricePoint;
use tracing::warn;

use crate::errors::SourceError;
use crate::timeframe::Timeframe;

/// Exchanges with a built-in adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SourceId {
    BinanceSpot,
    BinanceFutures,
    Okx,
    Bybit,
}

impl SourceId {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceId::BinanceSpot => "binance-spot",
            SourceId::BinanceFutures => "binance-futures",
            SourceId::Okx => "okx",
            SourceId::Bybit => "bybit",
        }
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceId {
    type Err = SourceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "binance" | "binance-spot" => Ok(SourceId::BinanceSpot),
            "binance-futures" => Ok(SourceId::BinanceFutures),
            "okx" => Ok(SourceId::Okx),
            "bybit" => Ok(SourceId::Bybit),
            _ => Err(SourceError::UnknownSource(s.to_string())),
        }
    }
}

/// Capability interface over one exchange's candle API.
///
/// Implementations return closing prices, oldest first, with `time` in
/// unix seconds.
#[async_trait]
pub trait PriceSource: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    async fn fetch_series(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        limit: usize,
    ) -> Result<Vec<PricePoint>, SourceError>;

    /// Most recent one-minute close.
    async fn fetch_latest(&self, symbol: &str) -> Result<PricePoint, SourceError> {
        self.fetch_series(symbol, Timeframe::OneMinute, 1)
            .await?
            .pop()
            .ok_or_else(|| SourceError::Empty(symbol.to_string()))
    }
}

/// Batch-path wrapper: a failed fetch is logged and yields no data.
pub async fn fetch_series_or_empty(
    source: &dyn PriceSource,
    symbol: &str,
    timeframe: Timeframe,
    limit: usize,
) -> Vec<PricePoint> {
    match source.fetch_series(symbol, timeframe, limit).await {
        Ok(points) => points,
        Err(e) => {
            warn!(
                source = source.name(),
                symbol,
                timeframe = %timeframe,
                error = %e,
                "series fetch failed; continuing with empty series"
            );
            Vec::new()
        }
    }
}
