use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use spread::PricePoint;
use tracing::{debug, instrument};

use crate::candle::decode_rows;
use crate::errors::SourceError;
use crate::source::PriceSource;
use crate::timeframe::Timeframe;

pub const SPOT_URL: &str = "https://api.binance.com";
pub const FUTURES_URL: &str = "https://fapi.binance.com";

/// Which Binance product the client talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinanceMarket {
    Spot,
    Futures,
}

impl BinanceMarket {
    fn klines_path(&self) -> &'static str {
        match self {
            BinanceMarket::Spot => "/api/v3/klines",
            BinanceMarket::Futures => "/fapi/v1/klines",
        }
    }
}

#[derive(Debug, Deserialize)]
struct BinanceApiError {
    code: i64,
    msg: String,
}

/// Binance spot or USDⓈ-M futures kline client.
#[derive(Clone)]
pub struct BinanceClient {
    http: Client,
    url: String,
    market: BinanceMarket,
}

impl BinanceClient {
    pub fn new(url: String, market: BinanceMarket, timeout: Duration) -> Result<Self, SourceError> {
        let http = Client::builder()
            .timeout(timeout)
            .pool_idle_timeout(Duration::from_secs(30))
            .tcp_keepalive(Duration::from_secs(30))
            .build()?;

        Ok(Self { http, url, market })
    }

    /// `btc/usdt`, `BTC-USDT` → `BTCUSDT`.
    pub fn normalize_symbol(symbol: &str) -> String {
        symbol.replace(['/', '-'], "").to_uppercase()
    }
}

#[async_trait]
impl PriceSource for BinanceClient {
    fn name(&self) -> &str {
        match self.market {
            BinanceMarket::Spot => "binance-spot",
            BinanceMarket::Futures => "binance-futures",
        }
    }

    #[instrument(skip(self), level = "debug")]
    async fn fetch_series(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        limit: usize,
    ) -> Result<Vec<PricePoint>, SourceError> {
        let url = format!("{}{}", self.url, self.market.klines_path());
        let limit = limit.to_string();
        let query = [
            ("symbol", Self::normalize_symbol(symbol)),
            ("interval", timeframe.as_str().to_string()),
            ("limit", limit),
        ];

        let resp = self.http.get(&url).query(&query).send().await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await?;
            return Err(match serde_json::from_str::<BinanceApiError>(&body) {
                Ok(e) => SourceError::Api {
                    source_name: "binance",
                    code: e.code.to_string(),
                    msg: e.msg,
                },
                Err(_) => SourceError::Api {
                    source_name: "binance",
                    code: status.as_u16().to_string(),
                    msg: body,
                },
            });
        }

        let rows: Vec<Vec<Value>> = resp.json().await?;
        let points = decode_rows(&rows)?;

        debug!(candles = points.len(), "binance klines fetched");

        Ok(points)
    }
}
