//! Relative strength of a ticker against a benchmark.
//!
//! Windows are counted in the benchmark's trading days. The ticker's bar on
//! each referenced benchmark date is looked up by date, so sessions missing
//! from the ticker inside a window (halts, calendar gaps) do not matter. The
//! two series must end on the same date.

use crate::errors::EngineError;
use crate::models::{PriceBar, PriceSeries, RsLinePoint};

/// Percentage change of the price-to-benchmark ratio over `lookback_days`.
///
/// `ratio(d) = close(d) / benchmark.close(d)`, result is
/// `ratio(last) / ratio(d0) - 1` where `d0` is the benchmark date
/// `lookback_days` sessions before the last. Positive means the ticker
/// outperformed the benchmark regardless of the benchmark's own direction.
pub fn compute_rs(
    series: &PriceSeries,
    benchmark: &PriceSeries,
    lookback_days: usize,
) -> Result<f64, EngineError> {
    let symbol = series.symbol();
    let required = lookback_days + 1;
    let bars = series.bars();
    let bench = benchmark.bars();

    if bars.is_empty() || bench.len() < required {
        return Err(EngineError::insufficient(symbol, required, bars.len().min(bench.len())));
    }

    let (last, bench_last) = (bars[bars.len() - 1], bench[bench.len() - 1]);
    if last.date != bench_last.date {
        return Err(EngineError::MisalignedDates {
            symbol: symbol.to_string(),
            series_date: last.date,
            benchmark_date: bench_last.date,
        });
    }

    let bench_start = bench[bench.len() - required];
    if bars[0].date > bench_start.date {
        let covered = bench.iter().filter(|b| b.date >= bars[0].date).count();
        return Err(EngineError::insufficient(symbol, required, covered));
    }

    let start = bar_on(bars, bench_start.date).ok_or_else(|| EngineError::MisalignedDates {
        symbol: symbol.to_string(),
        series_date: nearest_before(bars, bench_start.date),
        benchmark_date: bench_start.date,
    })?;

    let ratio_now = ratio(symbol, &last, &bench_last)?;
    let ratio_then = ratio(symbol, start, &bench_start)?;

    Ok(ratio_now / ratio_then - 1.0)
}

/// Normalised RS line on the benchmark dates the ticker also traded,
/// starting at 100.
pub fn rs_line(series: &PriceSeries, benchmark: &PriceSeries) -> Result<Vec<RsLinePoint>, EngineError> {
    let symbol = series.symbol();
    let bars = series.bars();
    let bench = benchmark.bars();

    let (Some(last), Some(bench_last)) = (bars.last(), bench.last()) else {
        return Err(EngineError::insufficient(symbol, 1, 0));
    };
    if last.date != bench_last.date {
        return Err(EngineError::MisalignedDates {
            symbol: symbol.to_string(),
            series_date: last.date,
            benchmark_date: bench_last.date,
        });
    }

    let pairs: Vec<(&PriceBar, &PriceBar)> = bench
        .iter()
        .filter_map(|b| bar_on(bars, b.date).map(|bar| (bar, b)))
        .collect();

    let (first, first_bench) = pairs[0];
    let base = ratio(symbol, first, first_bench)?;
    pairs
        .into_iter()
        .map(|(bar, bench_bar)| {
            Ok(RsLinePoint {
                date: bar.date,
                value: ratio(symbol, bar, bench_bar)? / base * 100.0,
            })
        })
        .collect()
}

fn bar_on(bars: &[PriceBar], date: chrono::NaiveDate) -> Option<&PriceBar> {
    bars.binary_search_by_key(&date, |b| b.date).ok().map(|i| &bars[i])
}

/// Latest ticker date before `date`; callers guarantee one exists.
fn nearest_before(bars: &[PriceBar], date: chrono::NaiveDate) -> chrono::NaiveDate {
    let idx = bars.partition_point(|b| b.date < date);
    bars[idx.saturating_sub(1)].date
}

fn ratio(symbol: &str, bar: &PriceBar, bench: &PriceBar) -> Result<f64, EngineError> {
    if bench.close == 0.0 {
        return Err(EngineError::DivisionByZero {
            symbol: symbol.to_string(),
            date: bench.date,
        });
    }
    Ok(bar.close / bench.close)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn dates(n: usize, offset: i64) -> Vec<NaiveDate> {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        (0..n)
            .map(|i| start + chrono::Duration::days(i as i64 + offset))
            .collect()
    }

    fn series(symbol: &str, closes: &[f64]) -> PriceSeries {
        PriceSeries::from_closes(symbol, &dates(closes.len(), 0), closes).unwrap()
    }

    #[test]
    fn test_rs_linear_ticker_vs_flat_benchmark() {
        let bench = series("SPY", &[100.0; 64]);
        let closes: Vec<f64> = (0..64).map(|i| 100.0 + 10.0 * i as f64 / 63.0).collect();
        let ticker = series("AAPL", &closes);

        let rs = compute_rs(&ticker, &bench, 63).unwrap();
        assert!((rs - 0.10).abs() < 1e-9, "expected ~0.10, got {}", rs);
    }

    #[test]
    fn test_rs_zero_for_identical_returns() {
        let closes: Vec<f64> = (0..30).map(|i| 50.0 + (i as f64 * 0.7).sin() * 3.0).collect();
        let bench = series("SPY", &closes);
        let doubled: Vec<f64> = closes.iter().map(|c| c * 2.0).collect();
        let ticker = series("QQQ", &doubled);

        for window in [1, 5, 21, 29] {
            assert!(compute_rs(&ticker, &bench, window).unwrap().abs() < 1e-12);
        }
    }

    #[test]
    fn test_rs_negative_for_underperformer() {
        let bench: Vec<f64> = (0..22).map(|i| 100.0 + i as f64).collect();
        let ticker = series("LAG", &[50.0; 22]);
        let rs = compute_rs(&ticker, &series("SPY", &bench), 21).unwrap();
        assert!(rs < 0.0);
    }

    #[test]
    fn test_rs_insufficient_history() {
        let bench = series("SPY", &[100.0; 63]);
        let ticker = series("AAPL", &[100.0; 63]);
        let err = compute_rs(&ticker, &bench, 63).unwrap_err();
        assert_eq!(err, EngineError::insufficient("AAPL", 64, 63));
    }

    #[test]
    fn test_rs_requires_same_end_date() {
        let bench = series("SPY", &[100.0; 30]);
        let ticker =
            PriceSeries::from_closes("AAPL", &dates(30, 1), &[100.0; 30]).unwrap();

        assert_eq!(
            compute_rs(&ticker, &bench, 21).unwrap_err(),
            EngineError::MisalignedDates {
                symbol: "AAPL".into(),
                series_date: dates(30, 1)[29],
                benchmark_date: dates(30, 0)[29],
            }
        );
    }

    #[test]
    fn test_rs_tolerates_gap_inside_window() {
        // Ticker halted on day 10; every other session matches the benchmark.
        let bench = series("SPY", &[100.0; 30]);
        let mut ticker_dates = dates(30, 0);
        ticker_dates.remove(10);
        let mut closes = vec![100.0; 29];
        closes[28] = 110.0;
        let ticker = PriceSeries::from_closes("HALT", &ticker_dates, &closes).unwrap();

        let rs = compute_rs(&ticker, &bench, 25).unwrap();
        assert!((rs - 0.10).abs() < 1e-12, "got {}", rs);
        assert!(compute_rs(&ticker, &bench, 15).is_ok());
    }

    #[test]
    fn test_rs_window_starting_on_missing_session() {
        let bench = series("SPY", &[100.0; 30]);
        let mut ticker_dates = dates(30, 0);
        ticker_dates.remove(10);
        let ticker = PriceSeries::from_closes("HALT", &ticker_dates, &[100.0; 29]).unwrap();

        assert_eq!(
            compute_rs(&ticker, &bench, 19).unwrap_err(),
            EngineError::MisalignedDates {
                symbol: "HALT".into(),
                series_date: ticker_dates[9],
                benchmark_date: dates(30, 0)[10],
            }
        );
    }

    #[test]
    fn test_rs_ticker_listed_inside_window() {
        let bench = series("SPY", &[100.0; 30]);
        let ticker = PriceSeries::from_closes("IPO", &dates(10, 20), &[5.0; 10]).unwrap();
        assert_eq!(
            compute_rs(&ticker, &bench, 21).unwrap_err(),
            EngineError::insufficient("IPO", 22, 10)
        );
    }

    #[test]
    fn test_rs_division_by_zero_guard() {
        let d = dates(3, 0);
        let bench = PriceSeries::new_unchecked(
            "SPY",
            d.iter().map(|&day| PriceBar::flat(day, 0.0)).collect(),
        );
        let ticker = PriceSeries::from_closes("AAPL", &d, &[1.0, 2.0, 3.0]).unwrap();

        assert!(matches!(
            compute_rs(&ticker, &bench, 2),
            Err(EngineError::DivisionByZero { .. })
        ));
    }

    #[test]
    fn test_rs_line_starts_at_100() {
        let bench = series("SPY", &[100.0, 100.0, 100.0, 100.0]);
        let ticker = series("AAPL", &[10.0, 11.0, 12.0, 9.0]);
        let line = rs_line(&ticker, &bench).unwrap();

        assert_eq!(line.len(), 4);
        assert!((line[0].value - 100.0).abs() < 1e-12);
        assert!((line[2].value - 120.0).abs() < 1e-9);
        assert!((line[3].value - 90.0).abs() < 1e-9);
    }

    #[test]
    fn test_rs_line_uses_shared_span() {
        let bench = PriceSeries::from_closes("SPY", &dates(3, 2), &[100.0; 3]).unwrap();
        let ticker = series("AAPL", &[1.0, 2.0, 4.0, 8.0, 16.0]);
        let line = rs_line(&ticker, &bench).unwrap();

        assert_eq!(line.len(), 3);
        assert!((line[2].value - 400.0).abs() < 1e-9);
    }

    #[test]
    fn test_rs_line_skips_missing_sessions() {
        let bench = series("SPY", &[100.0; 5]);
        let mut ticker_dates = dates(5, 0);
        ticker_dates.remove(2);
        let ticker =
            PriceSeries::from_closes("HALT", &ticker_dates, &[10.0, 11.0, 12.0, 20.0]).unwrap();
        let line = rs_line(&ticker, &bench).unwrap();

        assert_eq!(line.len(), 4);
        assert_eq!(line[2].date, ticker_dates[2]);
        assert!((line[3].value - 200.0).abs() < 1e-9);
    }
}
