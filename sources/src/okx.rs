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

pub const OKX_URL: &str = "https://www.okx.com";

/// Quote currencies recognised when inserting OKX's dash separator.
const QUOTES: [&str; 3] = ["USDT", "BUSD", "USD"];

#[derive(Debug, Deserialize)]
struct CandlesEnvelope {
    code: String,
    #[serde(default)]
    msg: String,
    #[serde(default)]
    data: Vec<Vec<Value>>,
}

#[derive(Clone)]
pub struct OkxClient {
    http: Client,
    url: String,
}

impl OkxClient {
    pub fn new(url: String, timeout: Duration) -> Result<Self, SourceError> {
        let http = Client::builder()
            .timeout(timeout)
            .pool_idle_timeout(Duration::from_secs(30))
            .tcp_keepalive(Duration::from_secs(30))
            .build()?;

        Ok(Self { http, url })
    }

    /// `BTCUSDT` → `BTC-USDT`; symbols already containing `-` pass through.
    pub fn normalize_symbol(symbol: &str) -> String {
        let symbol = symbol.replace('/', "-").to_uppercase();
        if symbol.contains('-') {
            return symbol;
        }
        QUOTES
            .iter()
            .find_map(|q| {
                symbol
                    .strip_suffix(q)
                    .filter(|base| !base.is_empty())
                    .map(|base| format!("{base}-{q}"))
            })
            .unwrap_or(symbol)
    }
}

#[async_trait]
impl PriceSource for OkxClient {
    fn name(&self) -> &str {
        "okx"
    }

    #[instrument(skip(self), level = "debug")]
    async fn fetch_series(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        limit: usize,
    ) -> Result<Vec<PricePoint>, SourceError> {
        let url = format!("{}/api/v5/market/candles", self.url);
        let query = [
            ("instId", Self::normalize_symbol(symbol)),
            ("bar", timeframe.okx_bar().to_string()),
            ("limit", limit.to_string()),
        ];

        let envelope: CandlesEnvelope = self
            .http
            .get(&url)
            .query(&query)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if envelope.code != "0" {
            return Err(SourceError::Api {
                source_name: "okx",
                code: envelope.code,
                msg: envelope.msg,
            });
        }

        // OKX lists newest first.
        let mut points = decode_rows(&envelope.data)?;
        points.reverse();

        debug!(candles = points.len(), "okx candles fetched");

        Ok(points)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn dash_is_inserted_before_known_quotes() {
        assert_eq!(OkxClient::normalize_symbol("BTCUSDT"), "BTC-USDT");
        assert_eq!(OkxClient::normalize_symbol("ethbusd"), "ETH-BUSD");
        assert_eq!(OkxClient::normalize_symbol("BTCUSD"), "BTC-USD");
        assert_eq!(OkxClient::normalize_symbol("BTC/USDT"), "BTC-USDT");
        assert_eq!(OkxClient::normalize_symbol("SOL-USDC"), "SOL-USDC");
        assert_eq!(OkxClient::normalize_symbol("BTCEUR"), "BTCEUR");
    }

    #[tokio::test]
    async fn newest_first_payload_is_reversed() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/v5/market/candles"))
            .and(query_param("instId", "BTC-USDT"))
            .and(query_param("bar", "1H"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "code": "0",
                "msg": "",
                "data": [
                    ["1700003600000", "1", "1", "1", "101.5", "1", "1", "1", "1"],
                    ["1700000000000", "1", "1", "1", "100.5", "1", "1", "1", "1"]
                ]
            })))
            .mount(&server)
            .await;

        let client = OkxClient::new(server.uri(), Duration::from_secs(2)).unwrap();
        let points = client
            .fetch_series("BTCUSDT", Timeframe::OneHour, 2)
            .await
            .unwrap();

        assert_eq!(
            points,
            vec![
                PricePoint::new(1_700_000_000, 100.5),
                PricePoint::new(1_700_003_600, 101.5)
            ]
        );
    }

    #[tokio::test]
    async fn non_zero_code_is_an_api_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/v5/market/candles"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "code": "51001",
                "msg": "Instrument ID does not exist",
                "data": []
            })))
            .mount(&server)
            .await;

        let client = OkxClient::new(server.uri(), Duration::from_secs(2)).unwrap();
        let err = client
            .fetch_series("NOPEUSDT", Timeframe::OneMinute, 10)
            .await
            .unwrap_err();

        assert!(matches!(err, SourceError::Api { ref code, .. } if code == "51001"));
    }
}
