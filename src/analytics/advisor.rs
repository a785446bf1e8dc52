use serde::{Deserialize, Serialize};
use tracing::info;

use super::{percent_change, round_to};
use crate::error::ForecastError;
use crate::features::{FeatureColumn, FeatureTable};
use crate::forecast::ForecastEngine;
use crate::indicators::RSIZone;
use crate::ml::ModelFamily;

const COMPARE_GROUPS: [&str; 3] = ["RSI", "MACD", "Volatility"];
const SUGGESTION_GROUPS: [&str; 2] = ["RSI", "MACD"];

/// One side of a two-ticker comparison.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockComparison {
    pub ticker: String,
    pub price: f64,
    pub predicted: f64,
    pub gain: f64,
    pub rsi: f64,
    pub volatility: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recommendation {
    StrongBuy,
    Buy,
    Neutral,
    Sell,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Serialize)]
pub struct Suggestion {
    pub ticker: String,
    pub last_price: f64,
    pub predicted_price: f64,
    pub potential_gain_pct: f64,
    pub rsi: f64,
    pub rsi_zone: RSIZone,
    pub score: i32,
    pub recommendation: Recommendation,
    pub risk_level: RiskLevel,
}

/// Scores a projected gain (percent) against the current RSI.
pub fn score_signal(gain_pct: f64, rsi: f64) -> (i32, Recommendation, RiskLevel) {
    let mut score = 0;
    if gain_pct > 1.0 {
        score += 2;
    }
    if gain_pct > 3.0 {
        score += 1;
    }

    if rsi < 30.0 {
        score += 2;
    } else if rsi < 50.0 {
        score += 1;
    } else if rsi > 70.0 {
        score -= 3;
    }

    let (recommendation, risk) = if score >= 3 {
        let risk = if rsi < 40.0 { RiskLevel::Low } else { RiskLevel::Medium };
        (Recommendation::StrongBuy, risk)
    } else if score >= 1 {
        (Recommendation::Buy, RiskLevel::Medium)
    } else if score <= -1 {
        (Recommendation::Sell, RiskLevel::High)
    } else {
        (Recommendation::Neutral, RiskLevel::Medium)
    };

    (score, recommendation, risk)
}

fn latest(table: &FeatureTable, col: FeatureColumn) -> Result<f64, ForecastError> {
    table
        .last_value(col)
        .ok_or_else(|| ForecastError::DataUnavailable(table.ticker.clone()))
}

/// Linear forecast over `groups` and the day-14 prediction it ends on.
async fn linear_outlook(
    engine: &ForecastEngine,
    ticker: &str,
    groups: &[&str],
) -> Result<(FeatureTable, f64), ForecastError> {
    let table = engine.features(ticker).await?;
    let result = engine.forecast_table(&table, ModelFamily::Linear, groups)?;
    let predicted = result
        .final_prediction()
        .ok_or_else(|| ForecastError::Predict("empty projection".to_string()))?;
    Ok((table, predicted))
}

/// Side-by-side outlook for two tickers. Fails if either one fails.
pub async fn compare(
    engine: &ForecastEngine,
    first: &str,
    second: &str,
) -> Result<Vec<StockComparison>, ForecastError> {
    let mut out = Vec::with_capacity(2);
    for ticker in [first, second] {
        let (table, predicted) = linear_outlook(engine, ticker, &COMPARE_GROUPS).await?;
        let price = latest(&table, FeatureColumn::Close)?;
        out.push(StockComparison {
            ticker: ticker.to_string(),
            price: round_to(price, 2),
            predicted: round_to(predicted, 2),
            gain: round_to(percent_change(price, predicted), 2),
            rsi: round_to(latest(&table, FeatureColumn::Rsi14)?, 2),
            volatility: round_to(latest(&table, FeatureColumn::Volatility)?, 3),
        });
    }
    Ok(out)
}

/// Buy/sell suggestion from the projected gain and the current RSI.
pub async fn suggestion(
    engine: &ForecastEngine,
    ticker: &str,
) -> Result<Suggestion, ForecastError> {
    let (table, predicted) = linear_outlook(engine, ticker, &SUGGESTION_GROUPS).await?;
    let last_price = latest(&table, FeatureColumn::Close)?;
    let rsi = latest(&table, FeatureColumn::Rsi14)?;
    let gain = percent_change(last_price, predicted);
    let (score, recommendation, risk_level) = score_signal(gain, rsi);

    info!(
        "{} suggestion: {:?} (score {}, gain {:.2}%, RSI {:.1})",
        ticker, recommendation, score, gain, rsi
    );

    Ok(Suggestion {
        ticker: ticker.to_string(),
        last_price: round_to(last_price, 2),
        predicted_price: round_to(predicted, 2),
        potential_gain_pct: round_to(gain, 2),
        rsi: round_to(rsi, 2),
        rsi_zone: RSIZone::from_value(rsi),
        score,
        recommendation,
        risk_level,
    })
}
