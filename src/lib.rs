//! Crypto market data extractor.
//!
//! Two independent pieces:
//!
//! - a market snapshot (top coins by market cap) fetched from a REST endpoint
//!   and cached as CSV, reused while the cache file is younger than seven days;
//! - per-asset daily OHLCV history with close-to-close statistics and the
//!   min-max position of the latest close.
//!
//! Tabular work (JSON ingestion, CSV read/write) runs in an in-memory DuckDB
//! database.
//!
//! # Quick start
//!
//! ```no_run
//! use crypto_extractor::{request_all_crypto_info, AssetExtractor, SnapshotConfig};
//!
//! let snapshot = request_all_crypto_info(&SnapshotConfig::default()).unwrap();
//! println!("{} coins, columns: {:?}", snapshot.len(), snapshot.columns());
//!
//! let mut btc = AssetExtractor::new("BTC").unwrap();
//! let quarter = btc.get_last_3_months().unwrap();
//! let position = AssetExtractor::get_minmax_position(&quarter.candles);
//! let month = btc.get_last_month().unwrap();
//! ```

#[cfg(feature = "async")]
pub mod async_client;
pub mod config;
pub mod connection;
pub mod error;
pub mod history;
pub mod models;
pub mod snapshot;
pub mod stats;
pub mod table;

#[cfg(feature = "async")]
pub use async_client::AsyncAssetExtractor;
pub use connection::Connection;
pub use error::{ExtractorError, Result};
pub use history::{AssetExtractor, Period, YahooClient};
pub use models::{Candle, PriceChange, PriceHistory};
pub use snapshot::{
    check_last_modified_date, point_to_specific_file, request_all_crypto_info,
    request_all_crypto_info_at, SnapshotConfig,
};
pub use stats::{get_diff_prices, get_minmax_position};
pub use table::Table;
