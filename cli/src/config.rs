use std::time::Duration;

use sources::SourcesConfig;

#[derive(Clone, Debug)]
pub struct AppConfig {
    /// Exchange endpoints and HTTP timeout for the price adapters.
    ///
    /// Overridable per exchange so tests and proxies can point the
    /// adapters elsewhere.
    pub sources: SourcesConfig,

    /// `APP_ENV=production` switches logs to JSON.
    pub production: bool,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`AppConfig::from_env`] with an injectable variable source.
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = SourcesConfig::default();

        let http_timeout = get("SPREADWATCH_HTTP_TIMEOUT_SECS")
            .and_then(|v| v.trim().parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
            .unwrap_or(defaults.http_timeout);

        Self {
            sources: SourcesConfig {
                binance_spot_url: get("SPREADWATCH_BINANCE_URL").unwrap_or(defaults.binance_spot_url),
                binance_futures_url: get("SPREADWATCH_BINANCE_FUTURES_URL")
                    .unwrap_or(defaults.binance_futures_url),
                okx_url: get("SPREADWATCH_OKX_URL").unwrap_or(defaults.okx_url),
                bybit_url: get("SPREADWATCH_BYBIT_URL").unwrap_or(defaults.bybit_url),
                http_timeout,
            },
            production: get("APP_ENV").is_some_and(|v| v == "production"),
        }
    }
}
