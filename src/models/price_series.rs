use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::errors::EngineError;

// One trading day of OHLCV data.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl PriceBar {
    pub fn new(date: NaiveDate, open: f64, high: f64, low: f64, close: f64, volume: f64) -> Self {
        Self { date, open, high, low, close, volume }
    }

    /// Bar where open, high, low and close all equal `close`.
    pub fn flat(date: NaiveDate, close: f64) -> Self {
        Self::new(date, close, close, close, close, 0.0)
    }
}

/// Daily history for one symbol, ordered by date.
///
/// Construction validates that dates strictly increase, that prices are
/// finite and positive and that volume is finite and non-negative. Trading
/// calendar gaps are allowed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceSeries {
    symbol: String,
    bars: Vec<PriceBar>,
}

impl PriceSeries {
    pub fn new(symbol: impl Into<String>, bars: Vec<PriceBar>) -> Result<Self, EngineError> {
        let symbol = symbol.into();

        for (i, bar) in bars.iter().enumerate() {
            let prices = [bar.open, bar.high, bar.low, bar.close];
            if prices.iter().any(|p| !p.is_finite() || *p <= 0.0) {
                return Err(EngineError::InvalidSeries {
                    symbol,
                    reason: format!("non-positive or non-finite price on {}", bar.date),
                });
            }
            if !bar.volume.is_finite() || bar.volume < 0.0 {
                return Err(EngineError::InvalidSeries {
                    symbol,
                    reason: format!("invalid volume on {}", bar.date),
                });
            }
            if i > 0 && bars[i - 1].date >= bar.date {
                return Err(EngineError::InvalidSeries {
                    symbol,
                    reason: format!("dates not strictly increasing at {}", bar.date),
                });
            }
        }

        Ok(Self { symbol, bars })
    }

    /// Convenience constructor for close-only data (open/high/low = close).
    pub fn from_closes(
        symbol: impl Into<String>,
        dates: &[NaiveDate],
        closes: &[f64],
    ) -> Result<Self, EngineError> {
        let symbol = symbol.into();
        if dates.len() != closes.len() {
            return Err(EngineError::InvalidSeries {
                symbol,
                reason: format!("{} dates for {} closes", dates.len(), closes.len()),
            });
        }
        let bars = dates
            .iter()
            .zip(closes)
            .map(|(&d, &c)| PriceBar::flat(d, c))
            .collect();
        Self::new(symbol, bars)
    }

    #[cfg(test)]
    pub(crate) fn new_unchecked(symbol: &str, bars: Vec<PriceBar>) -> Self {
        Self { symbol: symbol.to_string(), bars }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn bars(&self) -> &[PriceBar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn last(&self) -> Option<&PriceBar> {
        self.bars.last()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    /// Same series with every price multiplied by `factor`. Volume is kept.
    pub fn scaled(&self, factor: f64) -> Result<Self, EngineError> {
        let bars = self
            .bars
            .iter()
            .map(|b| PriceBar {
                open: b.open * factor,
                high: b.high * factor,
                low: b.low * factor,
                close: b.close * factor,
                ..*b
            })
            .collect();
        Self::new(self.symbol.clone(), bars)
    }
}

/// All series fetched in one refresh cycle, keyed by symbol.
#[derive(Debug, Clone, Default)]
pub struct PriceDataset {
    series: BTreeMap<String, PriceSeries>,
}

impl PriceDataset {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a series under its own symbol, replacing any previous entry.
    pub fn insert(&mut self, series: PriceSeries) {
        self.series.insert(series.symbol().to_string(), series);
    }

    pub fn get(&self, symbol: &str) -> Option<&PriceSeries> {
        self.series.get(symbol)
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.series.contains_key(symbol)
    }

    pub fn symbols(&self) -> impl Iterator<Item = &str> {
        self.series.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }
}

impl FromIterator<PriceSeries> for PriceDataset {
    fn from_iter<T: IntoIterator<Item = PriceSeries>>(iter: T) -> Self {
        let mut dataset = PriceDataset::new();
        for series in iter {
            dataset.insert(series);
        }
        dataset
    }
}
