use std::path::PathBuf;

use async_trait::async_trait;
use chrono::NaiveDate;
use csv::ReaderBuilder;
use serde::Deserialize;
use tracing::debug;

use crate::external::price_provider::{ExternalBar, PriceProvider, PriceProviderError};

/// Reads `<dir>/<TICKER>.csv` files in the usual daily-download layout:
/// `Date,Open,High,Low,Close,Volume` with any extra columns ignored.
pub struct CsvProvider {
    dir: PathBuf,
}

#[derive(Debug, Deserialize)]
struct CsvRow {
    #[serde(rename = "Date")]
    date: String,
    #[serde(rename = "Open")]
    open: f64,
    #[serde(rename = "High")]
    high: f64,
    #[serde(rename = "Low")]
    low: f64,
    #[serde(rename = "Close")]
    close: f64,
    #[serde(rename = "Volume", default)]
    volume: f64,
}

impl CsvProvider {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, ticker: &str) -> PathBuf {
        self.dir.join(format!("{}.csv", ticker))
    }
}

fn parse_date(raw: &str) -> Result<NaiveDate, PriceProviderError> {
    // Some exports append a time component ("2024-01-02 00:00:00-05:00").
    let day = raw.trim().get(..10).unwrap_or(raw);
    NaiveDate::parse_from_str(day, "%Y-%m-%d")
        .map_err(|e| PriceProviderError::Parse(format!("bad date {:?}: {}", raw, e)))
}

pub(crate) fn parse_csv(data: &[u8]) -> Result<Vec<ExternalBar>, PriceProviderError> {
    let mut reader = ReaderBuilder::new().trim(csv::Trim::All).from_reader(data);

    let mut bars = Vec::new();
    for record in reader.deserialize::<CsvRow>() {
        let row = record.map_err(|e| PriceProviderError::Parse(e.to_string()))?;
        bars.push(ExternalBar {
            date: parse_date(&row.date)?,
            open: row.open,
            high: row.high,
            low: row.low,
            close: row.close,
            volume: row.volume,
        });
    }

    bars.sort_by_key(|b| b.date);
    Ok(bars)
}

#[async_trait]
impl PriceProvider for CsvProvider {
    async fn fetch_daily_history(
        &self,
        ticker: &str,
        days: u32,
    ) -> Result<Vec<ExternalBar>, PriceProviderError> {
        let path = self.path_for(ticker);
        let data = tokio::fs::read(&path).await.map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => PriceProviderError::NotFound(path.display().to_string()),
            _ => PriceProviderError::BadResponse(format!("{}: {}", path.display(), e)),
        })?;

        let mut bars = parse_csv(&data)?;
        let keep = days as usize;
        if bars.len() > keep {
            bars.drain(..bars.len() - keep);
        }

        debug!("Loaded {} bars for {} from {}", bars.len(), ticker, path.display());
        Ok(bars)
    }
}
