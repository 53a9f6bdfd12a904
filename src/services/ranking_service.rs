use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::errors::EngineError;
use crate::models::{MetricRow, PriceDataset, PriceSeries, RankedTable, SkippedSymbol};
use crate::services::contraction::{detect_contraction_with, ContractionPolicy};
use crate::services::indicators::{daily_return, latest_moving_average};
use crate::services::relative_strength::compute_rs;

pub const DEFAULT_RS_WINDOWS: [usize; 3] = [21, 63, 252];
pub const DEFAULT_MA_WINDOWS: [usize; 4] = [10, 20, 50, 200];
pub const DEFAULT_SORT_WINDOW: usize = 63;

/// Everything a ranking pass needs besides the data itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingConfig {
    pub benchmark: String,
    /// Symbols to rank. Empty means every symbol in the dataset.
    #[serde(default)]
    pub watchlist: Vec<String>,
    pub rs_windows: Vec<usize>,
    pub ma_windows: Vec<usize>,
    pub sort_window: usize,
    /// Drop a symbol when any RS window lacks history, not only the sort window.
    #[serde(default)]
    pub require_all_windows: bool,
    #[serde(default)]
    pub contraction: ContractionPolicy,
}

impl RankingConfig {
    pub fn new(benchmark: impl Into<String>, sort_window: usize) -> Self {
        Self {
            benchmark: benchmark.into(),
            watchlist: Vec::new(),
            rs_windows: DEFAULT_RS_WINDOWS.to_vec(),
            ma_windows: DEFAULT_MA_WINDOWS.to_vec(),
            sort_window,
            require_all_windows: false,
            contraction: ContractionPolicy::default(),
        }
    }

    pub fn with_watchlist(mut self, watchlist: Vec<String>) -> Self {
        self.watchlist = watchlist;
        self
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        if self.benchmark.trim().is_empty() {
            return Err(EngineError::InvalidConfig("benchmark symbol is empty".to_string()));
        }
        if self.sort_window == 0 {
            return Err(EngineError::InvalidConfig("sort window must be positive".to_string()));
        }
        if self.rs_windows.iter().chain(&self.ma_windows).any(|&w| w == 0) {
            return Err(EngineError::InvalidConfig("windows must be positive".to_string()));
        }
        self.contraction.validate()?;
        Ok(())
    }

    /// RS windows to compute, always including the sort window.
    fn effective_rs_windows(&self) -> BTreeSet<usize> {
        self.rs_windows
            .iter()
            .copied()
            .chain(std::iter::once(self.sort_window))
            .collect()
    }

    fn is_required(&self, window: usize) -> bool {
        window == self.sort_window || self.require_all_windows
    }
}

/// Rank every non-benchmark symbol with the default RS and MA windows.
pub fn rank(
    dataset: &PriceDataset,
    benchmark_symbol: &str,
    sort_window: usize,
) -> Result<RankedTable, EngineError> {
    rank_with(dataset, &RankingConfig::new(benchmark_symbol, sort_window))
}

/// Rank the configured symbols by RS at `config.sort_window`, strongest first.
///
/// Per-symbol failures never abort the pass: the symbol is left out of the
/// table and listed in `skipped`. Only a missing benchmark (or an invalid
/// configuration) is returned as an error.
pub fn rank_with(dataset: &PriceDataset, config: &RankingConfig) -> Result<RankedTable, EngineError> {
    config.validate()?;

    let benchmark = dataset
        .get(&config.benchmark)
        .ok_or_else(|| EngineError::BenchmarkUnavailable(config.benchmark.clone()))?;

    let mut rows = Vec::new();
    let mut skipped = Vec::new();

    for symbol in candidates(dataset, config) {
        let result = dataset
            .get(&symbol)
            .ok_or_else(|| EngineError::MissingSymbol(symbol.clone()))
            .and_then(|series| compute_row(series, benchmark, config));

        match result {
            Ok(row) => rows.push(row),
            Err(e) => {
                warn!("Skipping {} in ranking: {}", symbol, e);
                skipped.push(SkippedSymbol { symbol, reason: e.to_string() });
            }
        }
    }

    let sort_window = config.sort_window;
    rows.sort_by(|a, b| compare_rows(a, b, sort_window));

    info!(
        "Ranked {} symbols against {} ({} skipped)",
        rows.len(),
        config.benchmark,
        skipped.len()
    );

    Ok(RankedTable {
        benchmark: config.benchmark.clone(),
        sort_window,
        rows,
        skipped,
    })
}

/// Symbols to rank, in order, without duplicates or the benchmark.
fn candidates(dataset: &PriceDataset, config: &RankingConfig) -> Vec<String> {
    let mut seen = BTreeSet::new();
    let source: Vec<String> = if config.watchlist.is_empty() {
        dataset.symbols().map(str::to_string).collect()
    } else {
        config.watchlist.clone()
    };

    source
        .into_iter()
        .filter(|s| *s != config.benchmark)
        .filter(|s| seen.insert(s.clone()))
        .collect()
}

fn compute_row(
    series: &PriceSeries,
    benchmark: &PriceSeries,
    config: &RankingConfig,
) -> Result<MetricRow, EngineError> {
    let last = series
        .last()
        .ok_or_else(|| EngineError::insufficient(series.symbol(), 1, 0))?;

    let mut relative_strength = BTreeMap::new();
    for window in config.effective_rs_windows() {
        match compute_rs(series, benchmark, window) {
            Ok(rs) => {
                relative_strength.insert(window, rs);
            }
            Err(
                e @ (EngineError::InsufficientHistory { .. } | EngineError::MisalignedDates { .. }),
            ) if !config.is_required(window) => {
                debug!("{}: no {}-day RS: {}", series.symbol(), window, e);
            }
            Err(e) => return Err(e),
        }
    }

    let moving_averages = config
        .ma_windows
        .iter()
        .filter_map(|&w| latest_moving_average(series, w).ok().map(|ma| (w, ma)))
        .collect();

    Ok(MetricRow {
        symbol: series.symbol().to_string(),
        as_of: last.date,
        latest_price: last.close,
        daily_return: daily_return(series)?,
        relative_strength,
        moving_averages,
        pattern: detect_contraction_with(series, &config.contraction),
    })
}

fn compare_rows(a: &MetricRow, b: &MetricRow, window: usize) -> Ordering {
    let rs_a = a.rs(window).unwrap_or(f64::NEG_INFINITY);
    let rs_b = b.rs(window).unwrap_or(f64::NEG_INFINITY);
    rs_b.total_cmp(&rs_a).then_with(|| a.symbol.cmp(&b.symbol))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn dates(n: usize) -> Vec<NaiveDate> {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        (0..n).map(|i| start + chrono::Duration::days(i as i64)).collect()
    }

    /// Series growing by `step` per day from 100.
    fn trend(symbol: &str, n: usize, step: f64) -> PriceSeries {
        let closes: Vec<f64> = (0..n).map(|i| 100.0 + step * i as f64).collect();
        PriceSeries::from_closes(symbol, &dates(n), &closes).unwrap()
    }

    fn dataset(series: Vec<PriceSeries>) -> PriceDataset {
        series.into_iter().collect()
    }

    #[test]
    fn test_rank_orders_by_sort_window() {
        let data = dataset(vec![
            trend("SPY", 100, 0.0),
            trend("SLOW", 100, 0.1),
            trend("FAST", 100, 1.0),
            trend("DOWN", 100, -0.5),
        ]);

        let table = rank(&data, "SPY", 63).unwrap();
        assert_eq!(table.symbols(), vec!["FAST", "SLOW", "DOWN"]);
        assert!(table.skipped.is_empty());
    }

    #[test]
    fn test_rank_breaks_ties_by_symbol() {
        let data = dataset(vec![
            trend("SPY", 70, 0.2),
            trend("ZZZ", 70, 0.5),
            trend("AAA", 70, 0.5),
            trend("MMM", 70, 0.5),
        ]);

        let table = rank(&data, "SPY", 21).unwrap();
        assert_eq!(table.symbols(), vec!["AAA", "MMM", "ZZZ"]);
    }

    #[test]
    fn test_rank_excludes_short_history() {
        // Newly listed: only the last 40 sessions.
        let closes: Vec<f64> = (0..40).map(|i| 20.0 + i as f64).collect();
        let ipo = PriceSeries::from_closes("IPO", &dates(100)[60..], &closes).unwrap();
        let data = dataset(vec![trend("SPY", 100, 0.0), trend("OLD", 100, 0.3), ipo]);

        let table = rank(&data, "SPY", 63).unwrap();

        assert_eq!(table.symbols(), vec!["OLD"]);
        assert_eq!(table.skipped.len(), 1);
        assert_eq!(table.skipped[0].symbol, "IPO");
    }

    #[test]
    fn test_optional_windows_left_absent() {
        let data = dataset(vec![trend("SPY", 100, 0.0), trend("AAPL", 100, 0.5)]);
        let table = rank(&data, "SPY", 63).unwrap();
        let row = &table.rows[0];

        assert!(row.rs(21).is_some());
        assert!(row.rs(63).is_some());
        assert!(row.rs(252).is_none());
        assert!(row.ma(50).is_some());
        assert!(row.ma(200).is_none());
    }

    #[test]
    fn test_trading_halt_inside_window_still_ranked() {
        let mut halt_dates = dates(100);
        halt_dates.remove(80);
        let closes: Vec<f64> = (0..99).map(|i| 100.0 + 0.5 * i as f64).collect();
        let halt = PriceSeries::from_closes("HALT", &halt_dates, &closes).unwrap();
        let data = dataset(vec![trend("SPY", 100, 0.0), halt]);

        let table = rank(&data, "SPY", 63).unwrap();
        assert_eq!(table.symbols(), vec!["HALT"]);
        assert!(table.skipped.is_empty());

        let row = &table.rows[0];
        assert!(row.rs(21).is_some());
        assert!(row.rs(63).unwrap() > 0.0);
    }

    #[test]
    fn test_misaligned_optional_window_left_absent() {
        // Missing session falls exactly on the 21-day window start.
        let mut gap_dates = dates(100);
        gap_dates.remove(78);
        let closes: Vec<f64> = (0..99).map(|i| 100.0 + 0.5 * i as f64).collect();
        let gappy = PriceSeries::from_closes("GAP", &gap_dates, &closes).unwrap();
        let data = dataset(vec![trend("SPY", 100, 0.0), gappy]);

        let table = rank(&data, "SPY", 63).unwrap();
        assert_eq!(table.symbols(), vec!["GAP"]);
        assert!(table.rows[0].rs(21).is_none());
        assert!(table.rows[0].rs(63).is_some());

        // Required when it is the sort window.
        let table = rank(&data, "SPY", 21).unwrap();
        assert!(table.is_empty());
        assert_eq!(table.skipped[0].symbol, "GAP");
    }

    #[test]
    fn test_require_all_windows_drops_symbol() {
        let data = dataset(vec![trend("SPY", 100, 0.0), trend("AAPL", 100, 0.5)]);
        let mut config = RankingConfig::new("SPY", 63);
        config.require_all_windows = true;

        let table = rank_with(&data, &config).unwrap();
        assert!(table.is_empty());
        assert_eq!(table.skipped[0].symbol, "AAPL");
    }

    #[test]
    fn test_missing_watchlist_symbol_is_skipped() {
        let data = dataset(vec![trend("SPY", 100, 0.0), trend("AAPL", 100, 0.5)]);
        let config = RankingConfig::new("SPY", 21)
            .with_watchlist(vec!["AAPL".into(), "GHOST".into(), "AAPL".into()]);

        let table = rank_with(&data, &config).unwrap();
        assert_eq!(table.symbols(), vec!["AAPL"]);
        assert_eq!(
            table.skipped,
            vec![SkippedSymbol {
                symbol: "GHOST".into(),
                reason: EngineError::MissingSymbol("GHOST".into()).to_string(),
            }]
        );
    }

    #[test]
    fn test_missing_benchmark_is_fatal() {
        let data = dataset(vec![trend("AAPL", 100, 0.5)]);
        assert_eq!(
            rank(&data, "SPY", 63).unwrap_err(),
            EngineError::BenchmarkUnavailable("SPY".into())
        );
    }

    #[test]
    fn test_sort_window_added_to_rs_windows() {
        let data = dataset(vec![trend("SPY", 100, 0.0), trend("AAPL", 100, 0.5)]);
        let table = rank(&data, "SPY", 10).unwrap();
        assert!(table.rows[0].rs(10).is_some());
    }

    #[test]
    fn test_invalid_config() {
        let data = dataset(vec![trend("SPY", 100, 0.0)]);
        let mut config = RankingConfig::new("SPY", 21);
        config.ma_windows = vec![0];
        assert!(matches!(rank_with(&data, &config), Err(EngineError::InvalidConfig(_))));
    }

    #[test]
    fn test_row_fields() {
        let data = dataset(vec![trend("SPY", 30, 0.0), trend("AAPL", 30, 1.0)]);
        let table = rank(&data, "SPY", 21).unwrap();
        let row = &table.rows[0];

        assert_eq!(row.latest_price, 129.0);
        assert!((row.daily_return - (129.0 / 128.0 - 1.0)).abs() < 1e-12);
        assert_eq!(row.as_of, dates(30)[29]);
        assert!((row.ma(10).unwrap() - 124.5).abs() < 1e-9);
    }
}
