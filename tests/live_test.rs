//! Hits the real exchange. Run with `--features integration-tests`.
#![cfg(feature = "integration-tests")]

use std::sync::Arc;
use std::time::Duration;

use dipwatch::feed::{DEFAULT_TICKER_URL, TickerClient};
use dipwatch::pipeline::Pipeline;
use dipwatch::snapshot::{MemoryStore, SnapshotStore};

#[tokio::test]
async fn live_all_tickers_cycle() {
    let client = TickerClient::new(DEFAULT_TICKER_URL, Duration::from_secs(20)).unwrap();
    let store = Arc::new(MemoryStore::new());
    let pipeline = Pipeline::new(client, store.clone());

    let records = pipeline.run_fetch_cycle(None).await.unwrap();
    assert!(!records.is_empty());
    assert!(records.iter().all(|r| r.symbol().ends_with("-USDT")));
    assert!(records.iter().any(|r| r.symbol() == "BTC-USDT"));
    assert_eq!(store.load().unwrap().len(), records.len());
}
