//! Fetch-and-derive pipeline.
//!
//! One run fetches the ticker set, keeps the USDT pairs (optionally above a
//! quote-volume floor), computes each pair's bid change against the stored
//! snapshot, and replaces the snapshot with the new results. A failed fetch
//! leaves the stored snapshot untouched.

use std::sync::{Arc, Mutex};

use rust_decimal::prelude::*;
use tracing::{info, warn};

use crate::Result;
use crate::feed::TickerClient;
use crate::models::{DerivedRecord, TickerRecord};
use crate::snapshot::{Snapshot, SnapshotStore};

/// Percent change from `previous` to `current`, rounded to two decimals.
///
/// A missing or zero `previous` yields zero; a missing `current` with a
/// usable `previous` yields `None`.
pub fn change_percent(previous: Option<Decimal>, current: Option<Decimal>) -> Option<Decimal> {
    let previous = match previous {
        Some(p) if !p.is_zero() => p,
        _ => return Some(Decimal::ZERO),
    };
    let current = current?;
    let pct = (current - previous).checked_div(previous)?.checked_mul(Decimal::ONE_HUNDRED)?;
    Some(pct.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero))
}

/// Derives the records of one fetch from its raw tickers and the previous
/// snapshot.
///
/// Returns the derived records in feed order together with the snapshot
/// that should replace `previous`.
pub fn derive(
    tickers: Vec<TickerRecord>,
    previous: &Snapshot,
    min_volume: Option<Decimal>,
) -> (Vec<DerivedRecord>, Snapshot) {
    let records: Vec<DerivedRecord> = tickers
        .into_iter()
        .filter(TickerRecord::is_usdt_pair)
        .filter(|ticker| match min_volume {
            Some(floor) => ticker.vol_value.is_some_and(|v| v >= floor),
            None => true,
        })
        .map(|ticker| {
            let prior_buy = previous.get(&ticker.symbol).and_then(|r| r.ticker.buy);
            DerivedRecord {
                buy_change_percent: change_percent(prior_buy, ticker.buy),
                ticker,
            }
        })
        .collect();

    let snapshot = records.iter().cloned().collect();
    (records, snapshot)
}

/// Runs fetch cycles against a ticker client and a snapshot store.
pub struct Pipeline {
    client: TickerClient,
    store: Arc<dyn SnapshotStore>,
    commit: Mutex<()>,
}

impl Pipeline {
    pub fn new(client: TickerClient, store: Arc<dyn SnapshotStore>) -> Self {
        Self {
            client,
            store,
            commit: Mutex::new(()),
        }
    }

    /// Fetches, derives and commits one cycle.
    ///
    /// The snapshot read, the derivation and the snapshot write run without
    /// a suspension point in between and under the commit lock, so two
    /// overlapping cycles cannot interleave their diffs.
    ///
    /// # Errors
    ///
    /// Propagates fetch and parse errors from [`TickerClient::fetch_all`]
    /// and storage errors from the final write. On error the stored
    /// snapshot is unchanged.
    pub async fn run_fetch_cycle(&self, min_volume: Option<Decimal>) -> Result<Vec<DerivedRecord>> {
        let tickers = self.client.fetch_all().await?;
        let total = tickers.len();

        let _guard = self.commit.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let previous = self.store.load().unwrap_or_else(|e| {
            warn!(error = %e, "Discarding unreadable snapshot");
            Snapshot::new()
        });
        let (records, snapshot) = derive(tickers, &previous, min_volume);
        self.store.save(snapshot)?;

        info!(
            total,
            kept = records.len(),
            min_volume = ?min_volume,
            "Fetch cycle complete"
        );
        Ok(records)
    }
}
