mod metrics;
mod price_series;

pub use metrics::{MetricRow, PatternFlag, RankedTable, RsLinePoint, SkippedSymbol};
pub use price_series::{PriceBar, PriceDataset, PriceSeries};
