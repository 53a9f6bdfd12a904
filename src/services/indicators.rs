use crate::errors::EngineError;
use crate::models::PriceSeries;

/// Simple Moving Average (SMA)
/// Returns a vector aligned with `values`:
/// - `None` until enough values exist
/// - `Some(avg)` after `window` values
pub fn sma(values: &[f64], window: usize) -> Vec<Option<f64>> {
    if window == 0 {
        return vec![None; values.len()];
    }

    // Running sum; the value that falls out of the window is subtracted.
    values
        .iter()
        .enumerate()
        .scan(0.0_f64, move |sum, (i, &v)| {
            *sum += v;
            if i >= window {
                *sum -= values[i - window];
            }

            let out = if i + 1 >= window {
                Some(*sum / window as f64)
            } else {
                None
            };

            Some(out)
        })
        .collect()
}

/// Trailing simple moving average of `close` over `window` trading days.
///
/// Output has the same length as the series. The first `window - 1` entries
/// are `None` rather than a partial average.
pub fn moving_average(series: &PriceSeries, window: usize) -> Vec<Option<f64>> {
    sma(&series.closes(), window)
}

/// Current (latest) SMA value.
///
/// Fails with `InsufficientHistory` when the series is shorter than `window`.
pub fn latest_moving_average(series: &PriceSeries, window: usize) -> Result<f64, EngineError> {
    if window == 0 || series.len() < window {
        return Err(EngineError::insufficient(series.symbol(), window.max(1), series.len()));
    }

    let bars = series.bars();
    let sum: f64 = bars[bars.len() - window..].iter().map(|b| b.close).sum();
    Ok(sum / window as f64)
}

/// Close-to-close return of the latest session.
pub fn daily_return(series: &PriceSeries) -> Result<f64, EngineError> {
    let bars = series.bars();
    if bars.len() < 2 {
        return Err(EngineError::insufficient(series.symbol(), 2, bars.len()));
    }

    let last = bars[bars.len() - 1].close;
    let prev = bars[bars.len() - 2].close;
    Ok(last / prev - 1.0)
}
