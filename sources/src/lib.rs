//! Exchange price adapters.
//!
//! Every exchange is one [`PriceSource`] implementation returning closing
//! prices in ascending time order. [`source_for`] picks the implementation
//! for a [`SourceId`].

pub mod binance;
pub mod bybit;
mod candle;
pub mod errors;
pub mod factory;
pub mod okx;
pub mod source;
pub mod static_source;
pub mod timeframe;

pub use errors::SourceError;
pub use factory::{SourcesConfig, source_for};
pub use source::{PriceSource, SourceId, fetch_series_or_empty};
pub use static_source::StaticSource;
pub use timeframe::Timeframe;
