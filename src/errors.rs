use chrono::NaiveDate;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error("Insufficient history for {symbol}: need {required} observations, have {available}")]
    InsufficientHistory {
        symbol: String,
        required: usize,
        available: usize,
    },
    #[error("Benchmark close is zero on {date} while computing {symbol}")]
    DivisionByZero { symbol: String, date: NaiveDate },
    #[error("Symbol not found in dataset: {0}")]
    MissingSymbol(String),
    #[error("Benchmark unavailable: {0}")]
    BenchmarkUnavailable(String),
    #[error("Dates do not line up for {symbol}: {series_date} vs benchmark {benchmark_date}")]
    MisalignedDates {
        symbol: String,
        series_date: NaiveDate,
        benchmark_date: NaiveDate,
    },
    #[error("Invalid price series for {symbol}: {reason}")]
    InvalidSeries { symbol: String, reason: String },
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl EngineError {
    pub fn insufficient(symbol: &str, required: usize, available: usize) -> Self {
        EngineError::InsufficientHistory {
            symbol: symbol.to_string(),
            required,
            available,
        }
    }
}

impl From<String> for EngineError {
    fn from(value: String) -> Self {
        EngineError::InvalidConfig(value)
    }
}
