//! Relative-strength ranking for a watchlist of tickers against a benchmark.
//!
//! The engine in [`services`] is pure and synchronous: it takes an in-memory
//! [`models::PriceDataset`] and returns a [`models::RankedTable`]. Loading
//! data goes through the async [`external::price_provider::PriceProvider`]
//! seam.

pub mod config;
pub mod errors;
pub mod external;
pub mod logging;
pub mod models;
pub mod report;
pub mod services;

pub use errors::EngineError;
pub use models::{MetricRow, PatternFlag, PriceBar, PriceDataset, PriceSeries, RankedTable};
pub use services::contraction::{detect_contraction, ContractionPolicy};
pub use services::indicators::{latest_moving_average, moving_average};
pub use services::ranking_service::{rank, rank_with, RankingConfig};
pub use services::relative_strength::{compute_rs, rs_line};
