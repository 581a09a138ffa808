use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Candle — One day of OHLCV data
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Candle {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

// ---------------------------------------------------------------------------
// PriceHistory — Daily candles for one provider symbol
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct PriceHistory {
    pub symbol: String,
    /// Ascending by date.
    pub candles: Vec<Candle>,
}

impl PriceHistory {
    pub fn closes(&self) -> Vec<f64> {
        self.candles.iter().map(|c| c.close).collect()
    }

    pub fn latest(&self) -> Option<&Candle> {
        self.candles.last()
    }
}

// ---------------------------------------------------------------------------
// PriceChange — Candle plus close-to-close statistics
// ---------------------------------------------------------------------------

/// `None` marks a value that is undefined for the row (first row of the
/// window, zero previous close, or a non-positive log argument).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct PriceChange {
    #[serde(flatten)]
    pub candle: Candle,
    pub abs_price_diff: Option<f64>,
    pub pct_price_diff: Option<f64>,
    pub pct_log_price_value: Option<f64>,
}
