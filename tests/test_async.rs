//! Async wrapper tests; run with `--features async`.

#![cfg(feature = "async")]

mod common;

use common::FixtureServer;
use crypto_extractor::async_client::{self, AsyncAssetExtractor};
use crypto_extractor::SnapshotConfig;

#[tokio::test]
async fn snapshot_fetch_runs_on_blocking_pool() {
    let tmp = tempfile::tempdir().unwrap();
    let server = FixtureServer::json(common::MARKETS_JSON);
    let config = SnapshotConfig::default()
        .api_url(server.url())
        .folder(tmp.path());

    let table = async_client::request_all_crypto_info(config).await.unwrap();

    assert_eq!(table.len(), 3);
    assert_eq!(server.hits(), 1);
}

#[tokio::test]
async fn async_extractor_fetches_history() {
    let server = FixtureServer::json(
        r#"{"chart": {"result": [{"timestamp": [1709251200, 1709337600],
            "indicators": {"quote": [{"open": [1.0, 2.0], "high": [1.0, 2.0],
            "low": [1.0, 2.0], "close": [1.0, 2.0], "volume": [10, 20]}]}}], "error": null}}"#,
    );
    let sol = AsyncAssetExtractor::new("SOL").unwrap().base_url(server.url());

    assert_eq!(sol.crypto_pair(), "SOL-USD");
    let rows = sol.get_last_month().await.unwrap();

    assert_eq!(rows.len(), 2);
    assert_eq!(rows[1].abs_price_diff, Some(1.0));
    assert_eq!(server.requests(), ["/SOL-USD?range=1mo&interval=1d"]);
}
