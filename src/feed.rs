//! HTTP client for the exchange's all-tickers endpoint.

use std::time::Duration;

use reqwest::Client;
use tracing::debug;

use crate::Result;
use crate::error::DipwatchError;
use crate::models::ticker::{AllTickersResponse, SUCCESS_CODE};
use crate::models::TickerRecord;

/// Default public endpoint returning every spot ticker in one response.
pub const DEFAULT_TICKER_URL: &str = "https://api.kucoin.com/api/v1/market/allTickers";

/// Fetches full ticker sets from a market-data endpoint.
#[derive(Debug, Clone)]
pub struct TickerClient {
    client: Client,
    url: String,
}

impl TickerClient {
    /// Builds a client for `url` with the given request timeout.
    ///
    /// # Errors
    ///
    /// Returns [`DipwatchError::Http`] if the HTTP client cannot be built.
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("dipwatch/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }

    /// Retrieves every ticker the endpoint reports, in feed order.
    ///
    /// # Errors
    ///
    /// - [`DipwatchError::Http`] if the request fails in transport.
    /// - [`DipwatchError::Status`] for a non-success HTTP status.
    /// - [`DipwatchError::Json`] if the body is not the expected JSON.
    /// - [`DipwatchError::Api`] if the exchange reports an error code.
    /// - [`DipwatchError::MalformedResponse`] if `data` is missing.
    pub async fn fetch_all(&self) -> Result<Vec<TickerRecord>> {
        let response = self.client.get(&self.url).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DipwatchError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await?;
        let tickers = parse_all_tickers(&body)?;
        debug!(count = tickers.len(), "Fetched tickers");
        Ok(tickers)
    }
}

/// Parses an `allTickers` response body.
///
/// # Errors
///
/// See [`TickerClient::fetch_all`] for the parse-related variants.
pub fn parse_all_tickers(body: &str) -> Result<Vec<TickerRecord>> {
    let response: AllTickersResponse = serde_json::from_str(body)?;

    if let Some(code) = response.code
        && code != SUCCESS_CODE
    {
        return Err(DipwatchError::Api {
            code,
            message: response.msg.unwrap_or_default(),
        });
    }

    response
        .data
        .map(|data| data.ticker)
        .ok_or_else(|| DipwatchError::MalformedResponse("missing data.ticker".to_string()))
}
