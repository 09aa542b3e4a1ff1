mod common;

use std::sync::Arc;

use rust_decimal_macros::dec;
use wiremock::MockServer;

use dipwatch::DipwatchError;
use dipwatch::alert::{AlertLevel, AlertMonitor};
use dipwatch::snapshot::{FileStore, MemoryStore, SnapshotStore};
use dipwatch::view::ViewState;

use common::{ALL_TICKERS, ALL_TICKERS_NEXT, ERROR_RESPONSE, by_symbol, pipeline, respond_with, tickers_body};

#[tokio::test]
async fn first_fetch_reports_zero_change_in_feed_order() {
    let server = MockServer::start().await;
    let store = Arc::new(MemoryStore::new());
    let pipeline = pipeline(&server, store.clone());

    respond_with(&server, 200, ALL_TICKERS).await;
    let records = pipeline.run_fetch_cycle(None).await.unwrap();

    let symbols: Vec<&str> = records.iter().map(|r| r.symbol()).collect();
    assert_eq!(
        symbols,
        ["BTC-USDT", "ETH-USDT", "AAA-USDT", "DUST-USDT", "ZERO-USDT", "NULLBUY-USDT"]
    );
    assert!(records.iter().all(|r| r.buy_change_percent == Some(dec!(0))));

    let snapshot = store.load().unwrap();
    assert_eq!(snapshot.len(), 6);
    assert!(!snapshot.contains("ETH-BTC"));
}

#[tokio::test]
async fn second_fetch_derives_against_previous_snapshot() {
    let server = MockServer::start().await;
    let pipeline = pipeline(&server, Arc::new(MemoryStore::new()));

    respond_with(&server, 200, ALL_TICKERS).await;
    pipeline.run_fetch_cycle(None).await.unwrap();

    respond_with(&server, 200, ALL_TICKERS_NEXT).await;
    let records = pipeline.run_fetch_cycle(None).await.unwrap();

    let change = |symbol| by_symbol(&records, symbol).buy_change_percent;
    assert_eq!(change("BTC-USDT"), Some(dec!(1.00)));
    assert_eq!(change("ETH-USDT"), Some(dec!(0)));
    assert_eq!(change("AAA-USDT"), Some(dec!(-15.00)));
    assert_eq!(change("DUST-USDT"), Some(dec!(-18.96)));
    // prior bid of zero
    assert_eq!(change("ZERO-USDT"), Some(dec!(0)));
    // prior bid missing
    assert_eq!(change("NULLBUY-USDT"), Some(dec!(0)));
    // first appearance
    assert_eq!(change("NEW-USDT"), Some(dec!(0)));
    assert_eq!(records.len(), 7);
}

#[tokio::test]
async fn identical_payloads_yield_zero_change() {
    let server = MockServer::start().await;
    let pipeline = pipeline(&server, Arc::new(MemoryStore::new()));

    respond_with(&server, 200, ALL_TICKERS_NEXT).await;
    pipeline.run_fetch_cycle(None).await.unwrap();
    let records = pipeline.run_fetch_cycle(None).await.unwrap();

    assert!(records.iter().all(|r| r.buy_change_percent == Some(dec!(0))));
}

#[tokio::test]
async fn drop_of_fifteen_percent_alerts_level_three_once() {
    let server = MockServer::start().await;
    let pipeline = pipeline(&server, Arc::new(MemoryStore::new()));
    let view = ViewState::default();
    let mut monitor = AlertMonitor::new();

    respond_with(&server, 200, &tickers_body(&[("AAA-USDT", "100", "50000")])).await;
    let records = pipeline.run_fetch_cycle(None).await.unwrap();
    assert_eq!(monitor.observe(view.top(&records), true), None);

    respond_with(&server, 200, &tickers_body(&[("AAA-USDT", "85", "50000")])).await;
    let records = pipeline.run_fetch_cycle(None).await.unwrap();
    assert_eq!(records[0].buy_change_percent, Some(dec!(-15.00)));
    assert_eq!(monitor.observe(view.top(&records), true), Some(AlertLevel::Level3));

    // Re-evaluating the same dataset does not replay the sound.
    assert_eq!(monitor.observe(view.top(&records), true), None);

    // The bid holds at 85, so the change returns to zero.
    let records = pipeline.run_fetch_cycle(None).await.unwrap();
    assert_eq!(records[0].buy_change_percent, Some(dec!(0)));
    assert_eq!(monitor.observe(view.top(&records), true), None);
}

#[tokio::test]
async fn http_error_leaves_snapshot_unchanged() {
    let server = MockServer::start().await;
    let store = Arc::new(MemoryStore::new());
    let pipeline = pipeline(&server, store.clone());

    respond_with(&server, 200, ALL_TICKERS).await;
    pipeline.run_fetch_cycle(None).await.unwrap();
    let before = store.load().unwrap();

    respond_with(&server, 500, "internal error").await;
    let err = pipeline.run_fetch_cycle(None).await.unwrap_err();
    assert!(matches!(err, DipwatchError::Status { status: 500, .. }));
    assert!(!err.is_parse());
    assert_eq!(store.load().unwrap(), before);

    // The next cycle still diffs against the last good snapshot.
    respond_with(&server, 200, ALL_TICKERS_NEXT).await;
    let records = pipeline.run_fetch_cycle(None).await.unwrap();
    assert_eq!(by_symbol(&records, "AAA-USDT").buy_change_percent, Some(dec!(-15.00)));
}

#[tokio::test]
async fn malformed_body_leaves_snapshot_unchanged() {
    let server = MockServer::start().await;
    let store = Arc::new(MemoryStore::new());
    let pipeline = pipeline(&server, store.clone());

    respond_with(&server, 200, ALL_TICKERS).await;
    pipeline.run_fetch_cycle(None).await.unwrap();
    let before = store.load().unwrap();

    respond_with(&server, 200, "{\"data\": {\"ticker\": [").await;
    let err = pipeline.run_fetch_cycle(None).await.unwrap_err();
    assert!(matches!(err, DipwatchError::Json(_)));
    assert!(err.is_parse());

    respond_with(&server, 200, "{\"code\": \"200000\"}").await;
    let err = pipeline.run_fetch_cycle(None).await.unwrap_err();
    assert!(matches!(err, DipwatchError::MalformedResponse(_)));

    respond_with(&server, 200, ERROR_RESPONSE).await;
    let err = pipeline.run_fetch_cycle(None).await.unwrap_err();
    assert!(matches!(err, DipwatchError::Api { ref code, .. } if code == "400100"));

    assert_eq!(store.load().unwrap(), before);
}

#[tokio::test]
async fn min_volume_filters_records_and_snapshot() {
    let server = MockServer::start().await;
    let store = Arc::new(MemoryStore::new());
    let pipeline = pipeline(&server, store.clone());

    respond_with(&server, 200, ALL_TICKERS).await;
    let records = pipeline.run_fetch_cycle(Some(dec!(100000))).await.unwrap();

    let symbols: Vec<&str> = records.iter().map(|r| r.symbol()).collect();
    assert_eq!(symbols, ["BTC-USDT", "ETH-USDT", "AAA-USDT"]);
    let snapshot = store.load().unwrap();
    assert_eq!(snapshot.len(), 3);
    assert!(!snapshot.contains("DUST-USDT"));

    // DUST was filtered out last cycle, so it has no prior to diff against.
    respond_with(&server, 200, ALL_TICKERS_NEXT).await;
    let records = pipeline.run_fetch_cycle(None).await.unwrap();
    assert_eq!(by_symbol(&records, "DUST-USDT").buy_change_percent, Some(dec!(0)));
    assert_eq!(by_symbol(&records, "AAA-USDT").buy_change_percent, Some(dec!(-15.00)));
}

#[tokio::test]
async fn file_store_carries_snapshot_across_pipelines() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();

    respond_with(&server, 200, ALL_TICKERS).await;
    let first = pipeline(&server, Arc::new(FileStore::new(dir.path()).unwrap()));
    first.run_fetch_cycle(None).await.unwrap();
    drop(first);

    respond_with(&server, 200, ALL_TICKERS_NEXT).await;
    let store = Arc::new(FileStore::new(dir.path()).unwrap());
    let second = pipeline(&server, store.clone());
    let records = second.run_fetch_cycle(None).await.unwrap();
    assert_eq!(by_symbol(&records, "DUST-USDT").buy_change_percent, Some(dec!(-18.96)));

    store.clear().unwrap();
    assert!(store.load().unwrap().is_empty());
}
