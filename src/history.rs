//! Per-asset price history from the Yahoo Finance chart endpoint.
//!
//! An [`AssetExtractor`] is bound to one ticker and queries the provider with
//! the `<TICKER>-USD` pair. Raw candles come back as a [`PriceHistory`];
//! [`AssetExtractor::get_last_month`] also attaches close-to-close statistics.

use crate::config;
use crate::error::{ExtractorError, Result};
use crate::models::{Candle, PriceChange, PriceHistory};
use crate::stats;
use chrono::DateTime;
use log::{debug, warn};
use reqwest::blocking::Client;
use serde::Deserialize;
use std::fmt;
use std::time::Duration;

// ---------------------------------------------------------------------------
// Period
// ---------------------------------------------------------------------------

/// Look-back range accepted by the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Period {
    OneDay,
    FiveDays,
    OneMonth,
    ThreeMonths,
    SixMonths,
    OneYear,
    TwoYears,
    FiveYears,
    TenYears,
    YearToDate,
    Max,
}

impl Period {
    pub fn as_str(&self) -> &'static str {
        match self {
            Period::OneDay => "1d",
            Period::FiveDays => "5d",
            Period::OneMonth => "1mo",
            Period::ThreeMonths => "3mo",
            Period::SixMonths => "6mo",
            Period::OneYear => "1y",
            Period::TwoYears => "2y",
            Period::FiveYears => "5y",
            Period::TenYears => "10y",
            Period::YearToDate => "ytd",
            Period::Max => "max",
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Wire format
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartBody,
}

#[derive(Debug, Deserialize)]
struct ChartBody {
    result: Option<Vec<ChartData>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<Quote>,
}

#[derive(Debug, Default, Deserialize)]
struct Quote {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<u64>>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

// ---------------------------------------------------------------------------
// YahooClient
// ---------------------------------------------------------------------------

/// Blocking client for daily OHLCV history.
pub struct YahooClient {
    base_url: String,
    timeout: Duration,
    client: Option<Client>,
}

impl Default for YahooClient {
    fn default() -> Self {
        Self::new()
    }
}

impl YahooClient {
    pub fn new() -> Self {
        Self {
            base_url: config::YAHOO_CHART_URL.to_string(),
            timeout: config::DEFAULT_TIMEOUT,
            client: None,
        }
    }

    /// Point the client at another chart endpoint.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self.client = None;
        self
    }

    /// Lazy HTTP client, created on first use.
    fn client(&mut self) -> Result<&Client> {
        let client = match self.client.take() {
            Some(client) => client,
            None => Client::builder()
                .timeout(self.timeout)
                .user_agent("Mozilla/5.0")
                .build()?,
        };
        Ok(self.client.insert(client))
    }

    /// Fetch daily candles for `symbol` over `period`.
    pub fn history(&mut self, symbol: &str, period: Period) -> Result<PriceHistory> {
        let url = format!("{}/{}", self.base_url, symbol);
        debug!("GET {}?range={}&interval=1d", url, period);

        let response = self
            .client()?
            .get(&url)
            .query(&[("range", period.as_str()), ("interval", "1d")])
            .send()?;
        let status_error = response.error_for_status_ref().err();
        let body = response.text()?;

        // Unknown symbols come back as an error status with a `chart.error` body.
        match (serde_json::from_str::<ChartResponse>(&body), status_error) {
            (Ok(chart), None) => parse_chart(symbol, chart),
            (Ok(chart), Some(_)) if chart.chart.error.is_some() => parse_chart(symbol, chart),
            (_, Some(err)) => Err(err.into()),
            (Err(err), None) => Err(err.into()),
        }
    }
}

fn parse_chart(symbol: &str, response: ChartResponse) -> Result<PriceHistory> {
    if let Some(error) = response.chart.error {
        return Err(ExtractorError::Provider(format!(
            "{} - {}",
            error.code, error.description
        )));
    }

    let data = response
        .chart
        .result
        .and_then(|r| r.into_iter().next())
        .ok_or_else(|| ExtractorError::Provider(format!("no chart data for {}", symbol)))?;
    let quote = data.indicators.quote.into_iter().next().unwrap_or_default();

    let mut candles = Vec::with_capacity(data.timestamp.len());
    let mut dropped = 0usize;
    for (i, &ts) in data.timestamp.iter().enumerate() {
        let at = |v: &Vec<Option<f64>>| v.get(i).copied().flatten();
        let date = DateTime::from_timestamp(ts, 0).map(|dt| dt.date_naive());

        match (date, at(&quote.open), at(&quote.high), at(&quote.low), at(&quote.close)) {
            (Some(date), Some(open), Some(high), Some(low), Some(close)) => {
                candles.push(Candle {
                    date,
                    open,
                    high,
                    low,
                    close,
                    volume: quote.volume.get(i).copied().flatten().unwrap_or(0),
                });
            }
            _ => dropped += 1,
        }
    }

    if dropped > 0 {
        warn!("Dropped {} incomplete rows from {} history", dropped, symbol);
    }

    Ok(PriceHistory {
        symbol: symbol.to_string(),
        candles,
    })
}

// ---------------------------------------------------------------------------
// AssetExtractor
// ---------------------------------------------------------------------------

/// Price history extractor bound to one crypto asset.
pub struct AssetExtractor {
    crypto_pair: String,
    client: YahooClient,
}

impl AssetExtractor {
    /// Bind to `ticker` (e.g. `"BTC"`), quoted in USD.
    pub fn new(ticker: &str) -> Result<Self> {
        Self::with_client(ticker, YahooClient::new())
    }

    /// Bind to `ticker` using a preconfigured provider client.
    pub fn with_client(ticker: &str, client: YahooClient) -> Result<Self> {
        let ticker = ticker.trim();
        if ticker.is_empty() {
            return Err(ExtractorError::InvalidArgument(
                "ticker must not be empty".into(),
            ));
        }
        Ok(Self {
            crypto_pair: format!("{}-{}", ticker, config::QUOTE_CURRENCY),
            client,
        })
    }

    /// Provider symbol, e.g. `"BTC-USD"`.
    pub fn crypto_pair(&self) -> &str {
        &self.crypto_pair
    }

    /// Raw daily candles over `period`.
    pub fn history(&mut self, period: Period) -> Result<PriceHistory> {
        self.client.history(&self.crypto_pair, period)
    }

    /// Raw daily candles for the last three months.
    pub fn get_last_3_months(&mut self) -> Result<PriceHistory> {
        self.history(Period::ThreeMonths)
    }

    /// Daily candles for the last month with close-to-close statistics.
    pub fn get_last_month(&mut self) -> Result<Vec<PriceChange>> {
        let history = self.history(Period::OneMonth)?;
        Ok(stats::get_diff_prices(&history.candles))
    }

    /// See [`stats::get_minmax_position`].
    pub fn get_minmax_position(candles: &[Candle]) -> Option<f64> {
        stats::get_minmax_position(candles)
    }

    /// See [`stats::get_diff_prices`].
    pub fn get_diff_prices(candles: &[Candle]) -> Vec<PriceChange> {
        stats::get_diff_prices(candles)
    }
}

impl fmt::Display for AssetExtractor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} extractor", self.crypto_pair)
    }
}
