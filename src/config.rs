use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_CRYPTO_URL: &str =
    "https://api.coingecko.com/api/v3/coins/markets?vs_currency=USD";
pub const DEFAULT_INFO_FILE: &str = "crypto_100_info";
pub const CACHE_FILE_EXTENSION: &str = "csv";

pub const YAHOO_CHART_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";
pub const QUOTE_CURRENCY: &str = "USD";

/// Snapshots older than this are refetched.
pub const STALENESS_WINDOW_DAYS: i64 = 7;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

pub fn staleness_window() -> chrono::TimeDelta {
    chrono::TimeDelta::days(STALENESS_WINDOW_DAYS)
}

pub fn default_data_dir() -> PathBuf {
    if let Some(data) = dirs::data_dir() {
        data.join("crypto-extractor")
    } else {
        PathBuf::from(".crypto-extractor")
    }
}
