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

pub const BYBIT_URL: &str = "https://api.bybit.com";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct KlineEnvelope {
    ret_code: i64,
    #[serde(default)]
    ret_msg: String,
    result: Option<KlineResult>,
}

#[derive(Debug, Deserialize)]
struct KlineResult {
    #[serde(default)]
    list: Vec<Vec<Value>>,
}

/// Bybit v5 spot kline client.
#[derive(Clone)]
pub struct BybitClient {
    http: Client,
    url: String,
}

impl BybitClient {
    pub fn new(url: String, timeout: Duration) -> Result<Self, SourceError> {
        let http = Client::builder()
            .timeout(timeout)
            .pool_idle_timeout(Duration::from_secs(30))
            .tcp_keepalive(Duration::from_secs(30))
            .build()?;

        Ok(Self { http, url })
    }

    pub fn normalize_symbol(symbol: &str) -> String {
        symbol.replace(['/', '-'], "").to_uppercase()
    }
}

#[async_trait]
impl PriceSource for BybitClient {
    fn name(&self) -> &str {
        "bybit"
    }

    #[instrument(skip(self), level = "debug")]
    async fn fetch_series(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        limit: usize,
    ) -> Result<Vec<PricePoint>, SourceError> {
        let url = format!("{}/v5/market/kline", self.url);
        let query = [
            ("category", "spot".to_string()),
            ("symbol", Self::normalize_symbol(symbol)),
            ("interval", timeframe.bybit_interval().to_string()),
            ("limit", limit.to_string()),
        ];

        let envelope: KlineEnvelope = self
            .http
            .get(&url)
            .query(&query)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if envelope.ret_code != 0 {
            return Err(SourceError::Api {
                source_name: "bybit",
                code: envelope.ret_code.to_string(),
                msg: envelope.ret_msg,
            });
        }

        let rows = envelope.result.map(|r| r.list).unwrap_or_default();

        // Bybit lists newest first.
        let mut points = decode_rows(&rows)?;
        points.reverse();

        debug!(candles = points.len(), "bybit klines fetched");

        Ok(points)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn minute_interval_uses_bybit_spelling() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v5/market/kline"))
            .and(query_param("category", "spot"))
            .and(query_param("symbol", "ETHUSDT"))
            .and(query_param("interval", "15"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "retCode": 0,
                "retMsg": "OK",
                "result": {
                    "symbol": "ETHUSDT",
                    "category": "spot",
                    "list": [
                        ["1700000900000", "1", "1", "1", "2001", "1", "1"],
                        ["1700000000000", "1", "1", "1", "2000", "1", "1"]
                    ]
                }
            })))
            .mount(&server)
            .await;

        let client = BybitClient::new(server.uri(), Duration::from_secs(2)).unwrap();
        let points = client
            .fetch_series("ETH/USDT", Timeframe::FifteenMinutes, 2)
            .await
            .unwrap();

        assert_eq!(points[0], PricePoint::new(1_700_000_000, 2_000.0));
        assert_eq!(points[1], PricePoint::new(1_700_000_900, 2_001.0));
    }

    #[tokio::test]
    async fn error_code_is_reported() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v5/market/kline"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "retCode": 10001,
                "retMsg": "Not supported symbols",
                "result": {}
            })))
            .mount(&server)
            .await;

        let client = BybitClient::new(server.uri(), Duration::from_secs(2)).unwrap();
        let err = client
            .fetch_series("XXX", Timeframe::OneMinute, 1)
            .await
            .unwrap_err();

        assert!(matches!(err, SourceError::Api { source_name: "bybit", .. }));
    }

    #[tokio::test]
    async fn empty_list_makes_latest_fail() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v5/market/kline"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "retCode": 0,
                "retMsg": "OK",
                "result": { "list": [] }
            })))
            .mount(&server)
            .await;

        let client = BybitClient::new(server.uri(), Duration::from_secs(2)).unwrap();
        let err = client.fetch_latest("BTCUSDT").await.unwrap_err();

        assert!(matches!(err, SourceError::Empty(_)));
    }
}
