//! All-tickers endpoint models.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Quote currency suffix of the pairs the dashboard tracks.
pub const QUOTE_SUFFIX: &str = "-USDT";

/// Success code the exchange puts in the `code` field.
pub const SUCCESS_CODE: &str = "200000";

/// Envelope of the `allTickers` REST response.
#[derive(Debug, Deserialize)]
pub struct AllTickersResponse {
    /// Exchange status code; `"200000"` on success.
    #[serde(default)]
    pub code: Option<String>,
    /// Error description accompanying a non-success code.
    #[serde(default)]
    pub msg: Option<String>,
    pub data: Option<AllTickersData>,
}

/// Payload of the `allTickers` response.
#[derive(Debug, Deserialize)]
pub struct AllTickersData {
    /// Exchange time of the snapshot in milliseconds.
    #[serde(default)]
    pub time: Option<i64>,
    pub ticker: Vec<TickerRecord>,
}

/// One trading pair as reported by the feed.
///
/// Numeric fields arrive as decimal strings and may be `null` for pairs
/// without recent activity.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TickerRecord {
    /// Pair identifier in `BASE-QUOTE` form.
    pub symbol: String,
    #[serde(default)]
    pub last: Option<Decimal>,
    /// 24h change as a fraction (`0.0123` is +1.23%).
    #[serde(default)]
    pub change_rate: Option<Decimal>,
    /// 24h volume in base units.
    #[serde(default)]
    pub vol: Option<Decimal>,
    /// 24h volume in quote units.
    #[serde(default)]
    pub vol_value: Option<Decimal>,
    /// Best bid.
    #[serde(default)]
    pub buy: Option<Decimal>,
    /// Best ask.
    #[serde(default)]
    pub sell: Option<Decimal>,
    #[serde(default)]
    pub high: Option<Decimal>,
    #[serde(default)]
    pub low: Option<Decimal>,
}

impl TickerRecord {
    /// Returns `true` if the pair is quoted in USDT.
    pub fn is_usdt_pair(&self) -> bool {
        self.symbol.ends_with(QUOTE_SUFFIX)
    }
}

/// A USDT pair together with the change of its best bid since the
/// previous fetch.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct DerivedRecord {
    pub ticker: TickerRecord,
    /// Percent change of `buy` versus the previous snapshot, two decimals.
    /// `None` when the current bid is missing.
    pub buy_change_percent: Option<Decimal>,
}

impl DerivedRecord {
    pub fn symbol(&self) -> &str {
        &self.ticker.symbol
    }

    /// Link to the pair's spot trading page.
    pub fn trade_url(&self) -> String {
        format!("https://www.kucoin.com/trade/{}", self.ticker.symbol)
    }
}
