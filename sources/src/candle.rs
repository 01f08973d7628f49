//! Shared candle decoding helpers.

use serde_json::Value;
use spread::PricePoint;

use crate::errors::SourceError;

/// Builds a point from a millisecond open time and a decimal close.
pub(crate) fn close_point(open_time_ms: i64, close: &str) -> Result<PricePoint, SourceError> {
    let price: f64 = close
        .trim()
        .parse()
        .map_err(|_| SourceError::Parse(format!("close price {close:?}")))?;
    Ok(PricePoint::new(open_time_ms / 1_000, price))
}

/// Open time in milliseconds, sent as a JSON number or a numeric string.
pub(crate) fn millis(v: &Value) -> Result<i64, SourceError> {
    match v {
        Value::Number(n) => n
            .as_i64()
            .ok_or_else(|| SourceError::Parse(format!("open time {n}"))),
        Value::String(s) => s
            .parse()
            .map_err(|_| SourceError::Parse(format!("open time {s:?}"))),
        other => Err(SourceError::Parse(format!("open time {other}"))),
    }
}

/// Decodes `[open_time, open, high, low, close, ...]` rows.
pub(crate) fn decode_rows(rows: &[Vec<Value>]) -> Result<Vec<PricePoint>, SourceError> {
    rows.iter()
        .map(|row| {
            let (Some(open_time), Some(close)) = (row.first(), row.get(4)) else {
                return Err(SourceError::Parse(format!("short row of {} fields", row.len())));
            };
            let close = close
                .as_str()
                .ok_or_else(|| SourceError::Parse(format!("close {close}")))?;
            close_point(millis(open_time)?, close)
        })
        .collect()
}
