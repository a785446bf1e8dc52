use std::sync::Arc;

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

use fin_tap::analytics;
use fin_tap::config::Settings;
use fin_tap::forecast::ForecastEngine;
use fin_tap::market_data::YahooClient;
use fin_tap::ml::ModelCapabilities;

#[derive(Parser)]
#[command(name = "fin-tap")]
#[command(version)]
#[command(
    about = "Technical-analysis features and closing price forecasts for stocks",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path (defaults to ./fintap.toml when present)
    #[arg(short, long)]
    config: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    json_logs: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Train a model and project the closing price forward
    Forecast {
        /// Stock ticker (e.g. AAPL)
        ticker: String,
        /// Model family: LINEAR, RANDOM_FOREST, XGBOOST, LIGHTGBM, LSTM
        #[arg(short, long, default_value = "LINEAR")]
        model: String,
        /// Comma separated feature groups (e.g. RSI,MACD,Bollinger)
        #[arg(short, long, value_delimiter = ',')]
        features: Vec<String>,
    },
    /// Recent closing prices
    History {
        ticker: String,
        #[arg(short, long, default_value = "30")]
        days: usize,
    },
    /// Compare the outlook of two tickers
    Compare { first: String, second: String },
    /// Last close and daily change for the watchlist
    Summary {
        /// Override the configured watchlist
        #[arg(short, long, value_delimiter = ',')]
        tickers: Vec<String>,
    },
    /// Buy/sell suggestion for a ticker
    Suggest { ticker: String },
    /// Model families compiled into this build
    Capabilities,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // Initialize logging
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    if cli.json_logs {
        builder.json().init();
    } else {
        builder.init();
    }

    let settings = Settings::load(cli.config.as_deref())?;
    let capabilities = ModelCapabilities::detect();
    info!(
        "fin-tap v{} (boosting: {}, recurrent: {})",
        env!("CARGO_PKG_VERSION"),
        capabilities.boosting,
        capabilities.recurrent
    );

    let source = Arc::new(YahooClient::new(&settings.market_data)?);
    let engine = ForecastEngine::new(source, settings.forecast.clone());

    match cli.command {
        Commands::Forecast { ticker, model, features } => {
            let result = engine
                .forecast(&ticker, &model, features.as_slice())
                .await
                .ok_or_else(|| anyhow!("no forecast for {} with {}", ticker, model))?;
            print_json(&result)?;
        }
        Commands::History { ticker, days } => {
            print_json(&analytics::price_history(&engine, &ticker, days).await?)?;
        }
        Commands::Compare { first, second } => {
            print_json(&analytics::compare(&engine, &first, &second).await?)?;
        }
        Commands::Summary { tickers } => {
            let tickers = if tickers.is_empty() { settings.watchlist.clone() } else { tickers };
            print_json(&analytics::market_summary(&engine, tickers.as_slice()).await)?;
        }
        Commands::Suggest { ticker } => {
            print_json(&analytics::suggestion(&engine, &ticker).await?)?;
        }
        Commands::Capabilities => {
            #[derive(Serialize)]
            struct Report {
                #[serde(flatten)]
                capabilities: ModelCapabilities,
                models: Vec<String>,
            }
            print_json(&Report {
                capabilities,
                models: capabilities
                    .available_families()
                    .iter()
                    .map(|f| f.to_string())
                    .collect(),
            })?;
        }
    }

    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
