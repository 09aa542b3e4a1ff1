//! Shared test utilities and fixtures.
#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use dipwatch::feed::TickerClient;
use dipwatch::models::DerivedRecord;
use dipwatch::pipeline::Pipeline;
use dipwatch::snapshot::SnapshotStore;

/// Path the mock exchange serves tickers on.
pub const TICKERS_PATH: &str = "/api/v1/market/allTickers";

/// First cycle: six USDT pairs and one BTC-quoted pair.
pub const ALL_TICKERS: &str = include_str!("../fixtures/all_tickers.json");

/// Second cycle: AAA drops 15%, DUST drops 18.96%, NEW-USDT is listed.
pub const ALL_TICKERS_NEXT: &str = include_str!("../fixtures/all_tickers_next.json");

/// Exchange-level error envelope.
pub const ERROR_RESPONSE: &str = include_str!("../fixtures/error_response.json");

/// Replaces whatever the mock server answers with `status` and `body`.
pub async fn respond_with(server: &MockServer, status: u16, body: &str) {
    server.reset().await;
    Mock::given(method("GET"))
        .and(path(TICKERS_PATH))
        .respond_with(ResponseTemplate::new(status).set_body_string(body))
        .mount(server)
        .await;
}

/// A pipeline polling the mock server.
pub fn pipeline(server: &MockServer, store: Arc<dyn SnapshotStore>) -> Pipeline {
    let url = format!("{}{}", server.uri(), TICKERS_PATH);
    let client = TickerClient::new(url, Duration::from_secs(5)).expect("client builds");
    Pipeline::new(client, store)
}

/// Builds an all-tickers body from `(symbol, buy, volValue)` triples.
pub fn tickers_body(entries: &[(&str, &str, &str)]) -> String {
    let tickers: Vec<serde_json::Value> = entries
        .iter()
        .map(|(symbol, buy, vol_value)| {
            serde_json::json!({
                "symbol": symbol,
                "buy": buy,
                "sell": buy,
                "last": buy,
                "high": buy,
                "low": buy,
                "vol": "1",
                "volValue": vol_value,
                "changeRate": "0",
            })
        })
        .collect();
    serde_json::json!({
        "code": "200000",
        "data": { "time": 1718000000000_i64, "ticker": tickers }
    })
    .to_string()
}

/// Looks up a record by symbol, panicking if it is absent.
pub fn by_symbol<'a>(records: &'a [DerivedRecord], symbol: &str) -> &'a DerivedRecord {
    records
        .iter()
        .find(|r| r.symbol() == symbol)
        .unwrap_or_else(|| panic!("{symbol} missing from records"))
}

pub fn symbols(records: &[&DerivedRecord]) -> Vec<String> {
    records.iter().map(|r| r.symbol().to_string()).collect()
}
