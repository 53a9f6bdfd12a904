use tracing::{info, warn};

use crate::external::price_provider::PriceProvider;
use crate::models::{PriceBar, PriceDataset, PriceSeries};

/// Fetch the watchlist plus the benchmark into one dataset.
///
/// Symbols are fetched one after another. A symbol whose fetch fails or whose
/// history does not validate is logged and left out, so a later ranking pass
/// reports it as missing rather than failing the whole refresh.
pub async fn load_dataset(
    provider: &dyn PriceProvider,
    symbols: &[String],
    benchmark: &str,
    days: u32,
) -> PriceDataset {
    let mut dataset = PriceDataset::new();

    let wanted = requested_symbols(symbols, benchmark);
    let requested = wanted.len();

    for ticker in wanted {
        let bars = match provider.fetch_daily_history(ticker, days).await {
            Ok(bars) => bars,
            Err(e) => {
                warn!("Skipping ticker {} due to data error: {}", ticker, e);
                continue;
            }
        };

        let bars: Vec<PriceBar> = bars.into_iter().map(PriceBar::from).collect();
        match PriceSeries::new(ticker, bars) {
            Ok(series) if series.is_empty() => {
                warn!("Skipping ticker {}: provider returned no bars", ticker);
            }
            Ok(series) => dataset.insert(series),
            Err(e) => warn!("Skipping ticker {}: {}", ticker, e),
        }
    }

    info!("Loaded {} of {} requested series", dataset.len(), requested);
    dataset
}

/// Watchlist plus benchmark, sorted, each symbol once.
fn requested_symbols<'a>(symbols: &'a [String], benchmark: &'a str) -> Vec<&'a str> {
    let mut wanted: Vec<&str> = symbols.iter().map(String::as_str).collect();
    wanted.push(benchmark);
    wanted.sort_unstable();
    wanted.dedup();
    wanted
}
