use anyhow::{Context, Result};

use relstrength::config::{OutputFormat, ScreenConfig};
use relstrength::external::csv_provider::CsvProvider;
use relstrength::logging::{init_logging, LoggingConfig};
use relstrength::services::dataset_service::load_dataset;
use relstrength::services::ranking_service::rank_with;
use relstrength::services::relative_strength::rs_line;
use relstrength::report;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // Initialize logging FIRST
    init_logging(LoggingConfig::from_env())
        .map_err(|e| anyhow::anyhow!("failed to initialise logging: {}", e))?;

    let config = ScreenConfig::from_env().context("invalid configuration")?;
    tracing::info!(
        "📊 Ranking {} tickers against {} from {}",
        config.watchlist.len(),
        config.benchmark,
        config.data_dir.display()
    );

    let provider = CsvProvider::new(&config.data_dir);
    let dataset = load_dataset(
        &provider,
        &config.watchlist,
        &config.benchmark,
        config.history_days,
    )
    .await;

    let table = rank_with(&dataset, &config.ranking()).context("ranking failed")?;

    match config.output {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&table)?);
        }
        OutputFormat::Table => {
            print!("{}", report::render_table(&table, &config.rs_windows));
        }
    }

    if let Some(symbol) = &config.rs_line_symbol {
        let series = dataset
            .get(symbol)
            .with_context(|| format!("no data loaded for {}", symbol))?;
        let benchmark = dataset
            .get(&config.benchmark)
            .with_context(|| format!("no data loaded for {}", config.benchmark))?;
        let line = rs_line(series, benchmark)
            .with_context(|| format!("cannot build RS line for {}", symbol))?;

        match config.output {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&line)?),
            OutputFormat::Table => print!("{}", report::render_rs_line(symbol, &config.benchmark, &line)),
        }
    }

    Ok(())
}
