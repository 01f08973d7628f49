use std::sync::Arc;
use std::time::Duration;

use crate::binance::{self, BinanceClient, BinanceMarket};
use crate::bybit::{self, BybitClient};
use crate::errors::SourceError;
use crate::okx::{self, OkxClient};
use crate::source::{PriceSource, SourceId};

/// Endpoints and transport settings for the built-in adapters.
#[derive(Clone, Debug)]
pub struct SourcesConfig {
    pub binance_spot_url: String,
    pub binance_futures_url: String,
    pub okx_url: String,
    pub bybit_url: String,
    pub http_timeout: Duration,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            binance_spot_url: binance::SPOT_URL.to_string(),
            binance_futures_url: binance::FUTURES_URL.to_string(),
            okx_url: okx::OKX_URL.to_string(),
            bybit_url: bybit::BYBIT_URL.to_string(),
            http_timeout: Duration::from_secs(5),
        }
    }
}

/// Builds the adapter for `id`.
pub fn source_for(id: SourceId, cfg: &SourcesConfig) -> Result<Arc<dyn PriceSource>, SourceError> {
    let source: Arc<dyn PriceSource> = match id {
        SourceId::BinanceSpot => Arc::new(BinanceClient::new(
            cfg.binance_spot_url.clone(),
            BinanceMarket::Spot,
            cfg.http_timeout,
        )?),
        SourceId::BinanceFutures => Arc::new(BinanceClient::new(
            cfg.binance_futures_url.clone(),
            BinanceMarket::Futures,
            cfg.http_timeout,
        )?),
        SourceId::Okx => Arc::new(OkxClient::new(cfg.okx_url.clone(), cfg.http_timeout)?),
        SourceId::Bybit => Arc::new(BybitClient::new(cfg.bybit_url.clone(), cfg.http_timeout)?),
    };

    Ok(source)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn factory_selects_adapter_by_id() {
        let cfg = SourcesConfig::default();

        for (id, name) in [
            (SourceId::BinanceSpot, "binance-spot"),
            (SourceId::BinanceFutures, "binance-futures"),
            (SourceId::Okx, "okx"),
            (SourceId::Bybit, "bybit"),
        ] {
            assert_eq!(source_for(id, &cfg).unwrap().name(), name);
        }
    }
}
