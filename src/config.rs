use std::path::PathBuf;

use crate::errors::EngineError;
use crate::services::contraction::ContractionPolicy;
use crate::services::ranking_service::{
    RankingConfig, DEFAULT_MA_WINDOWS, DEFAULT_RS_WINDOWS, DEFAULT_SORT_WINDOW,
};

pub const DEFAULT_WATCHLIST: &str = "AAPL, MSFT, NVDA, TSLA, AMD, META, GOOGL, AMZN, NFLX, COIN, MSTR, LLY";
pub const DEFAULT_BENCHMARK: &str = "SPY";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScreenConfig {
    pub watchlist: Vec<String>,
    pub benchmark: String,
    pub sort_window: usize,
    pub rs_windows: Vec<usize>,
    pub ma_windows: Vec<usize>,
    pub require_all_windows: bool,
    pub data_dir: PathBuf,
    pub history_days: u32,
    pub output: OutputFormat,
    pub rs_line_symbol: Option<String>,
}

impl ScreenConfig {
    pub fn from_env() -> Result<Self, EngineError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup; unset keys take defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, EngineError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let watchlist = parse_watchlist(&lookup("RS_WATCHLIST").unwrap_or_else(|| DEFAULT_WATCHLIST.to_string()));
        let benchmark = lookup("RS_BENCHMARK")
            .map(|b| b.trim().to_uppercase())
            .unwrap_or_else(|| DEFAULT_BENCHMARK.to_string());

        let sort_window = match lookup("RS_SORT_WINDOW") {
            Some(raw) => parse_number("RS_SORT_WINDOW", &raw)?,
            None => DEFAULT_SORT_WINDOW,
        };
        let rs_windows = match lookup("RS_WINDOWS") {
            Some(raw) => parse_windows("RS_WINDOWS", &raw)?,
            None => DEFAULT_RS_WINDOWS.to_vec(),
        };
        let ma_windows = match lookup("MA_WINDOWS") {
            Some(raw) => parse_windows("MA_WINDOWS", &raw)?,
            None => DEFAULT_MA_WINDOWS.to_vec(),
        };
        let history_days = match lookup("RS_HISTORY_DAYS") {
            Some(raw) => parse_number("RS_HISTORY_DAYS", &raw)?,
            None => 300,
        };

        let require_all_windows = match lookup("RS_REQUIRE_ALL_WINDOWS") {
            Some(raw) => parse_flag("RS_REQUIRE_ALL_WINDOWS", &raw)?,
            None => false,
        };

        let output = match lookup("RS_OUTPUT").as_deref().map(str::trim) {
            None | Some("") | Some("table") => OutputFormat::Table,
            Some("json") => OutputFormat::Json,
            Some(other) => {
                return Err(EngineError::InvalidConfig(format!(
                    "RS_OUTPUT must be 'table' or 'json', got {:?}",
                    other
                )))
            }
        };

        Ok(Self {
            watchlist,
            benchmark,
            sort_window,
            rs_windows,
            ma_windows,
            require_all_windows,
            data_dir: lookup("RS_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("./data")),
            history_days,
            output,
            rs_line_symbol: lookup("RS_LINE_SYMBOL")
                .map(|s| s.trim().to_uppercase())
                .filter(|s| !s.is_empty()),
        })
    }

    pub fn ranking(&self) -> RankingConfig {
        RankingConfig {
            benchmark: self.benchmark.clone(),
            watchlist: self.watchlist.clone(),
            rs_windows: self.rs_windows.clone(),
            ma_windows: self.ma_windows.clone(),
            sort_window: self.sort_window,
            require_all_windows: self.require_all_windows,
            contraction: ContractionPolicy::default(),
        }
    }
}

/// Splits on commas, whitespace and newlines; trims, upper-cases, drops empties.
pub fn parse_watchlist(raw: &str) -> Vec<String> {
    raw.split(|c: char| c == ',' || c.is_whitespace())
        .map(|t| t.trim().to_uppercase())
        .filter(|t| !t.is_empty())
        .collect()
}

fn parse_number<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T, EngineError> {
    raw.trim()
        .parse()
        .map_err(|_| EngineError::InvalidConfig(format!("{} is not a valid number: {:?}", key, raw)))
}

fn parse_flag(key: &str, raw: &str) -> Result<bool, EngineError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" | "" => Ok(false),
        _ => Err(EngineError::InvalidConfig(format!("{} is not a valid flag: {:?}", key, raw))),
    }
}

fn parse_windows(key: &str, raw: &str) -> Result<Vec<usize>, EngineError> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| parse_number(key, s))
        .collect()
}
