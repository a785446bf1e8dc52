use std::num::NonZeroU32;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, NaiveTime};
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;
use tracing::{debug, info, warn};

use super::{MarketDataError, MarketDataSource};
use crate::config::MarketDataSettings;
use crate::types::{PriceBar, PriceHistory};

pub const YAHOO_CHART_API: &str = "https://query1.finance.yahoo.com";

/// Daily bars from the public Yahoo chart endpoint.
#[derive(Clone, Debug)]
pub struct YahooClient {
    client: Client,
    base_url: Url,
    adjusted: bool,
    limiter: Arc<DefaultDirectRateLimiter>,
}

impl YahooClient {
    pub fn new(settings: &MarketDataSettings) -> Result<Self, MarketDataError> {
        let client = Client::builder()
            .user_agent(settings.user_agent.as_str())
            .build()?;
        let rate = NonZeroU32::new(settings.requests_per_second).unwrap_or(NonZeroU32::MIN);
        let base_url =
            Url::parse(settings.base_url.trim()).map_err(|e| MarketDataError::InvalidUrl {
                url: settings.base_url.clone(),
                reason: e.to_string(),
            })?;
        if base_url.cannot_be_a_base() {
            return Err(MarketDataError::InvalidUrl {
                url: settings.base_url.clone(),
                reason: "cannot be a base".to_string(),
            });
        }

        Ok(Self {
            client,
            base_url,
            adjusted: settings.adjusted,
            limiter: Arc::new(RateLimiter::direct(Quota::per_second(rate))),
        })
    }

    /// The ticker is a single path segment; `/`, `?` and `#` are escaped.
    fn chart_url(&self, ticker: &str) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .extend(["v8", "finance", "chart", ticker]);
        }
        url
    }
}

#[async_trait]
impl MarketDataSource for YahooClient {
    async fn fetch_daily(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<PriceHistory, MarketDataError> {
        // period2 is exclusive upstream; push it past `end` so today is kept
        let period1 = start.and_time(NaiveTime::MIN).and_utc().timestamp();
        let period2 = (end + Duration::days(1))
            .and_time(NaiveTime::MIN)
            .and_utc()
            .timestamp();

        self.limiter.until_ready().await;
        info!("Fetching daily bars for {} from {} to {}", ticker, start, end);

        let resp = self
            .client
            .get(self.chart_url(ticker))
            .query(&[
                ("period1", period1.to_string()),
                ("period2", period2.to_string()),
                ("interval", "1d".to_string()),
                ("includeAdjustedClose", "true".to_string()),
                ("events", "div,split".to_string()),
            ])
            .send()
            .await?;

        if let Some(history) = check_status(ticker, resp.status())? {
            return Ok(history);
        }

        let body = resp.text().await?;
        let history = parse_chart(ticker, &body, self.adjusted)?;
        debug!("Received {} bars for {}", history.len(), ticker);
        Ok(history)
    }
}

/// 404 means the symbol has no data and ends the fetch with an empty
/// history. Any other non-success status is an error.
fn check_status(
    ticker: &str,
    status: StatusCode,
) -> Result<Option<PriceHistory>, MarketDataError> {
    if status == StatusCode::NOT_FOUND {
        warn!("No chart data for {} (404)", ticker);
        return Ok(Some(PriceHistory::empty(ticker)));
    }
    if !status.is_success() {
        return Err(MarketDataError::Status {
            ticker: ticker.to_string(),
            status: status.as_u16(),
        });
    }
    Ok(None)
}

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartBody,
}

#[derive(Debug, Deserialize)]
struct ChartBody {
    result: Option<Vec<ChartResult>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    #[serde(default)]
    meta: ChartMeta,
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: ChartIndicators,
}

#[derive(Debug, Default, Deserialize)]
struct ChartMeta {
    #[serde(default)]
    gmtoffset: i64,
}

#[derive(Debug, Deserialize)]
struct ChartIndicators {
    #[serde(default)]
    quote: Vec<QuoteBlock>,
    #[serde(default)]
    adjclose: Vec<AdjCloseBlock>,
}

#[derive(Debug, Default, Deserialize)]
struct QuoteBlock {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
struct AdjCloseBlock {
    #[serde(default)]
    adjclose: Vec<Option<f64>>,
}

/// Turns a chart payload into a normalized history. Only the first result
/// and its first quote block are read.
pub fn parse_chart(
    ticker: &str,
    body: &str,
    adjusted: bool,
) -> Result<PriceHistory, MarketDataError> {
    let response: ChartResponse = serde_json::from_str(body)?;

    if let Some(err) = response.chart.error {
        warn!(
            "Chart error for {}: {} {}",
            ticker,
            err.code,
            err.description.unwrap_or_default()
        );
    }

    let result = match response.chart.result.and_then(|r| r.into_iter().next()) {
        Some(r) => r,
        None => return Ok(PriceHistory::empty(ticker)),
    };

    let n = result.timestamp.len();
    let quote = result.indicators.quote.into_iter().next().unwrap_or_default();
    let adjclose = result
        .indicators
        .adjclose
        .into_iter()
        .next()
        .map(|b| b.adjclose);

    for (name, len) in [
        ("open", quote.open.len()),
        ("high", quote.high.len()),
        ("low", quote.low.len()),
        ("close", quote.close.len()),
        ("volume", quote.volume.len()),
    ] {
        if len != n {
            return Err(MarketDataError::Malformed(format!(
                "{} has {} values for {} timestamps",
                name, len, n
            )));
        }
    }

    let mut bars = Vec::with_capacity(n);
    for (i, ts) in result.timestamp.iter().enumerate() {
        let date = match DateTime::from_timestamp(ts + result.meta.gmtoffset, 0) {
            Some(dt) => dt.date_naive(),
            None => continue,
        };
        let (open, high, low, close, volume) = match (
            quote.open[i],
            quote.high[i],
            quote.low[i],
            quote.close[i],
            quote.volume[i],
        ) {
            (Some(o), Some(h), Some(l), Some(c), Some(v)) => (o, h, l, c, v),
            _ => continue,
        };

        let factor = match adjclose.as_ref().and_then(|a| a.get(i).copied().flatten()) {
            Some(adj) if adjusted && close != 0.0 => adj / close,
            _ => 1.0,
        };

        bars.push(PriceBar {
            date,
            open: open * factor,
            high: high * factor,
            low: low * factor,
            close: close * factor,
            volume,
        });
    }

    Ok(PriceHistory::new(ticker, bars).normalize())
}
