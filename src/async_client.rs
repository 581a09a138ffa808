//! Async wrappers for use in async runtimes (Tokio, etc.).
//!
//! Runs every blocking operation on the blocking thread pool via
//! [`tokio::task::spawn_blocking`]. HTTP clients are created and dropped on
//! that pool too, since the blocking `reqwest` client must not live on an
//! async worker.
//!
//! # Example
//!
//! ```no_run
//! use crypto_extractor::{AsyncAssetExtractor, Period};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let btc = AsyncAssetExtractor::new("BTC").unwrap();
//!     let month = btc.get_last_month().await.unwrap();
//!     let year = btc.history(Period::OneYear).await.unwrap();
//! }
//! ```

use std::time::Duration;

use crate::config;
use crate::error::{ExtractorError, Result};
use crate::history::{AssetExtractor, Period, YahooClient};
use crate::models::{PriceChange, PriceHistory};
use crate::snapshot::{self, SnapshotConfig};
use crate::table::Table;

async fn run_blocking<F, T>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ExtractorError::InvalidArgument(format!("Task join error: {e}")))?
}

/// Async [`snapshot::request_all_crypto_info`].
pub async fn request_all_crypto_info(config: SnapshotConfig) -> Result<Table> {
    run_blocking(move || snapshot::request_all_crypto_info(&config)).await
}

// ---------------------------------------------------------------------------
// AsyncAssetExtractor
// ---------------------------------------------------------------------------

/// Async counterpart of [`AssetExtractor`].
///
/// Holds only the binding and provider settings; each call builds a fresh
/// extractor on the blocking pool.
#[derive(Debug, Clone)]
pub struct AsyncAssetExtractor {
    ticker: String,
    base_url: String,
    timeout: Duration,
}

impl AsyncAssetExtractor {
    /// Bind to `ticker` (e.g. `"ETH"`), quoted in USD.
    pub fn new(ticker: &str) -> Result<Self> {
        let ticker = ticker.trim();
        if ticker.is_empty() {
            return Err(ExtractorError::InvalidArgument(
                "ticker must not be empty".into(),
            ));
        }
        Ok(Self {
            ticker: ticker.to_string(),
            base_url: config::YAHOO_CHART_URL.to_string(),
            timeout: config::DEFAULT_TIMEOUT,
        })
    }

    /// Point at another chart endpoint.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Provider symbol, e.g. `"ETH-USD"`.
    pub fn crypto_pair(&self) -> String {
        format!("{}-{}", self.ticker, config::QUOTE_CURRENCY)
    }

    /// Run a sync extractor operation on the blocking thread pool.
    pub async fn run<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut AssetExtractor) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let this = self.clone();
        run_blocking(move || {
            let client = YahooClient::new()
                .base_url(this.base_url)
                .timeout(this.timeout);
            let mut extractor = AssetExtractor::with_client(&this.ticker, client)?;
            f(&mut extractor)
        })
        .await
    }

    pub async fn history(&self, period: Period) -> Result<PriceHistory> {
        self.run(move |e| e.history(period)).await
    }

    pub async fn get_last_3_months(&self) -> Result<PriceHistory> {
        self.run(|e| e.get_last_3_months()).await
    }

    pub async fn get_last_month(&self) -> Result<Vec<PriceChange>> {
        self.run(|e| e.get_last_month()).await
    }
}
