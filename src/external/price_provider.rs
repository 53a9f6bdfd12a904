use async_trait::async_trait;
use chrono::NaiveDate;
use thiserror::Error;

use crate::models::PriceBar;

#[derive(Debug, Clone, PartialEq)]
pub struct ExternalBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl From<ExternalBar> for PriceBar {
    fn from(b: ExternalBar) -> Self {
        PriceBar::new(b.date, b.open, b.high, b.low, b.close, b.volume)
    }
}

#[derive(Debug, Error)]
pub enum PriceProviderError {
    #[error("network error: {0}")]
    Network(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("bad response: {0}")]
    BadResponse(String),

    #[error("parse error: {0}")]
    Parse(String),
}

/// Source of daily OHLCV history, oldest bar first.
#[async_trait]
pub trait PriceProvider: Send + Sync {
    async fn fetch_daily_history(
        &self,
        ticker: &str,
        days: u32,
    ) -> Result<Vec<ExternalBar>, PriceProviderError>;
}
