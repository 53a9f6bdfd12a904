use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Qualitative pattern classification for a ticker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PatternFlag {
    #[default]
    None,
    Contracting,
}

impl PatternFlag {
    pub fn as_str(&self) -> &'static str {
        match self {
            PatternFlag::None => "none",
            PatternFlag::Contracting => "contracting",
        }
    }
}

/// Computed metrics for one ticker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricRow {
    pub symbol: String,
    pub as_of: NaiveDate,
    pub latest_price: f64,
    pub daily_return: f64,
    /// RS keyed by lookback window in trading days. Windows without enough
    /// history are absent.
    pub relative_strength: BTreeMap<usize, f64>,
    /// Current simple moving average keyed by window.
    pub moving_averages: BTreeMap<usize, f64>,
    pub pattern: PatternFlag,
}

impl MetricRow {
    pub fn rs(&self, window: usize) -> Option<f64> {
        self.relative_strength.get(&window).copied()
    }

    pub fn ma(&self, window: usize) -> Option<f64> {
        self.moving_averages.get(&window).copied()
    }
}

/// A symbol that was left out of the ranking, with the reason.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedSymbol {
    pub symbol: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedTable {
    pub benchmark: String,
    pub sort_window: usize,
    pub rows: Vec<MetricRow>,
    pub skipped: Vec<SkippedSymbol>,
}

impl RankedTable {
    pub fn symbols(&self) -> Vec<&str> {
        self.rows.iter().map(|r| r.symbol.as_str()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// One point of the normalised relative-strength line (starts at 100).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RsLinePoint {
    pub date: NaiveDate,
    pub value: f64,
}
