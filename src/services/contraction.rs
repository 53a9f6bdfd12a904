use serde::{Deserialize, Serialize};

use crate::models::{PatternFlag, PriceSeries};
use crate::services::indicators::latest_moving_average;

/// Window scheme for the volatility-contraction screen.
///
/// The latest `segments * segment_len` bars are split into consecutive
/// sub-windows. Each window's volatility is its high-low range divided by
/// the close on its last bar. A ticker is flagged when those volatilities
/// strictly decrease from oldest to newest while
/// `close > SMA(fast_ma) > SMA(slow_ma)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContractionPolicy {
    pub min_history: usize,
    pub segment_len: usize,
    pub segments: usize,
    pub fast_ma: usize,
    pub slow_ma: usize,
}

impl Default for ContractionPolicy {
    fn default() -> Self {
        Self {
            min_history: 200,
            segment_len: 20,
            segments: 3,
            fast_ma: 50,
            slow_ma: 200,
        }
    }
}

impl ContractionPolicy {
    pub fn validate(&self) -> Result<(), String> {
        if self.segment_len == 0 || self.segments < 2 {
            return Err("contraction needs at least two non-empty segments".to_string());
        }
        if self.fast_ma == 0 || self.fast_ma >= self.slow_ma {
            return Err(format!(
                "contraction fast MA ({}) must be positive and shorter than slow MA ({})",
                self.fast_ma, self.slow_ma
            ));
        }
        Ok(())
    }

    fn lookback(&self) -> usize {
        (self.segments * self.segment_len)
            .max(self.slow_ma)
            .max(self.min_history)
    }
}

/// Volatility-contraction screen with the default policy.
pub fn detect_contraction(series: &PriceSeries) -> PatternFlag {
    detect_contraction_with(series, &ContractionPolicy::default())
}

/// Short histories are not an error here, they simply never qualify.
pub fn detect_contraction_with(series: &PriceSeries, policy: &ContractionPolicy) -> PatternFlag {
    if policy.validate().is_err() || series.len() < policy.lookback() {
        return PatternFlag::None;
    }

    let Some(vols) = segment_volatilities(series, policy) else {
        return PatternFlag::None;
    };
    let narrowing = vols.windows(2).all(|w| w[1] < w[0]);

    let (Ok(fast), Ok(slow)) = (
        latest_moving_average(series, policy.fast_ma),
        latest_moving_average(series, policy.slow_ma),
    ) else {
        return PatternFlag::None;
    };
    let close = series.last().map(|b| b.close).unwrap_or(0.0);
    let trending = close > fast && fast > slow;

    if narrowing && trending {
        PatternFlag::Contracting
    } else {
        PatternFlag::None
    }
}

/// Range/close for each sub-window, oldest first.
fn segment_volatilities(series: &PriceSeries, policy: &ContractionPolicy) -> Option<Vec<f64>> {
    let bars = series.bars();
    let span = policy.segments * policy.segment_len;
    let recent = &bars[bars.len() - span..];

    recent
        .chunks(policy.segment_len)
        .map(|chunk| {
            let high = chunk.iter().map(|b| b.high).fold(f64::MIN, f64::max);
            let low = chunk.iter().map(|b| b.low).fold(f64::MAX, f64::min);
            let close = chunk.last()?.close;
            (close > 0.0).then(|| (high - low) / close)
        })
        .collect()
}
