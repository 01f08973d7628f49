use std::collections::{HashMap, VecDeque};

use async_trait::async_trait;
use parking_lot::Mutex;
use spread::PricePoint;

use crate::errors::SourceError;
use crate::source::PriceSource;
use crate::timeframe::Timeframe;

/// In-memory source for demos and tests.
///
/// `fetch_series` serves the stored history per symbol. `fetch_latest`
/// pops scripted live results in order, then keeps answering with the last
/// point of the history.
#[derive(Default)]
pub struct StaticSource {
    name: String,
    history: Mutex<HashMap<String, Vec<PricePoint>>>,
    live: Mutex<VecDeque<Result<PricePoint, String>>>,
}

impl StaticSource {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_history(self, symbol: &str, points: Vec<PricePoint>) -> Self {
        self.history.lock().insert(symbol.to_string(), points);
        self
    }

    /// Queue one live answer. `Err` is returned as an API failure.
    pub fn push_live(&self, answer: Result<PricePoint, String>) {
        self.live.lock().push_back(answer);
    }
}

#[async_trait]
impl PriceSource for StaticSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch_series(
        &self,
        symbol: &str,
        _timeframe: Timeframe,
        limit: usize,
    ) -> Result<Vec<PricePoint>, SourceError> {
        let history = self.history.lock();
        let points = history
            .get(symbol)
            .ok_or_else(|| SourceError::Empty(symbol.to_string()))?;
        let skip = points.len().saturating_sub(limit);
        Ok(points[skip..].to_vec())
    }

    async fn fetch_latest(&self, symbol: &str) -> Result<PricePoint, SourceError> {
        if let Some(answer) = self.live.lock().pop_front() {
            return answer.map_err(|msg| SourceError::Api {
                source_name: "static",
                code: "scripted".to_string(),
                msg,
            });
        }

        self.history
            .lock()
            .get(symbol)
            .and_then(|points| points.last().copied())
            .ok_or_else(|| SourceError::Empty(symbol.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn history_is_truncated_to_the_newest_points() {
        let src = StaticSource::new("a").with_history(
            "BTCUSDT",
            vec![PricePoint::new(1, 1.0), PricePoint::new(2, 2.0), PricePoint::new(3, 3.0)],
        );

        let points = src
            .fetch_series("BTCUSDT", Timeframe::OneMinute, 2)
            .await
            .unwrap();
        assert_eq!(points, vec![PricePoint::new(2, 2.0), PricePoint::new(3, 3.0)]);
    }

    #[tokio::test]
    async fn scripted_live_answers_come_first() {
        let src = StaticSource::new("a").with_history("X", vec![PricePoint::new(9, 9.0)]);
        src.push_live(Ok(PricePoint::new(1, 1.0)));
        src.push_live(Err("down".into()));

        assert_eq!(src.fetch_latest("X").await.unwrap(), PricePoint::new(1, 1.0));
        assert!(src.fetch_latest("X").await.is_err());
        assert_eq!(src.fetch_latest("X").await.unwrap(), PricePoint::new(9, 9.0));
    }
}
