use thiserror::Error;

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{source_name} api error {code}: {msg}")]
    Api {
        source_name: &'static str,
        code: String,
        msg: String,
    },

    #[error("malformed candle: {0}")]
    Parse(String),

    #[error("no candles returned for {0}")]
    Empty(String),

    #[error("unknown price source: {0}")]
    UnknownSource(String),

    #[error("unknown timeframe: {0}")]
    UnknownTimeframe(String),
}
