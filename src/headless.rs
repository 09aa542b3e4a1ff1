//! Polling without a terminal UI.
//!
//! Each completed cycle is written to the log: the pair count and the
//! sharpest drops. Alerts go to the same [`AlertSink`] the dashboard uses.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{info, warn};

use crate::Result;
use crate::alert::{AlertBasis, AlertMonitor, AlertSink, true_minimum};
use crate::config::AppConfig;
use crate::models::DerivedRecord;
use crate::pipeline::Pipeline;
use crate::scheduler::{FetchGate, Scheduler, SchedulerEvent};
use crate::view::ViewState;

/// Number of drops logged per cycle.
const TOP_DROPS: usize = 5;

enum Event {
    Scheduler(SchedulerEvent),
    /// Single cycle when polling is off.
    InitialLoad,
    Fetched(Result<Vec<DerivedRecord>>),
}

impl From<SchedulerEvent> for Event {
    fn from(event: SchedulerEvent) -> Self {
        Event::Scheduler(event)
    }
}

/// The `n` most negative bid changes, most negative first. Records whose
/// change is not a number are skipped.
pub fn largest_drops(records: &[DerivedRecord], n: usize) -> Vec<&DerivedRecord> {
    let mut ranked: Vec<&DerivedRecord> = records
        .iter()
        .filter(|r| r.buy_change_percent.is_some())
        .collect();
    ranked.sort_by_key(|r| r.buy_change_percent);
    ranked.truncate(n);
    ranked
}

/// Polls until Ctrl-C, or runs a single cycle when auto refresh is off.
pub async fn run(config: &AppConfig, pipeline: Arc<Pipeline>, sink: Arc<dyn AlertSink>) -> Result<()> {
    let (tx, mut rx) = mpsc::unbounded_channel::<Event>();
    let mut scheduler = Scheduler::new(tx.clone(), config.polling.interval);
    let mut gate = FetchGate::new();
    let mut monitor = AlertMonitor::new();
    let mut view = ViewState::new(config.view.row_reset);
    view.min_volume = config.view.min_volume;
    let once = !config.polling.auto_refresh;

    if once {
        let _ = tx.send(Event::InitialLoad);
    } else {
        scheduler.start();
    }
    info!(
        interval = %config.polling.interval.label(),
        once,
        "Headless polling started"
    );

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        let event = tokio::select! {
            signal = &mut shutdown => {
                if let Err(e) = signal {
                    warn!(error = %e, "Failed to listen for Ctrl-C");
                }
                info!("Shutting down");
                break;
            }
            event = rx.recv() => match event {
                Some(event) => event,
                None => break,
            },
        };

        match event {
            Event::Scheduler(SchedulerEvent::FetchDue(generation)) if !scheduler.is_current(generation) => {}
            Event::Scheduler(SchedulerEvent::FetchDue(_)) | Event::InitialLoad => {
                if gate.request() {
                    start_fetch(&pipeline, &view, &tx);
                }
            }
            Event::Scheduler(SchedulerEvent::CountdownTick) => {}
            Event::Fetched(result) => {
                scheduler.mark_run(Instant::now());
                match result {
                    Ok(records) => {
                        report(&records);
                        let target = match config.alerts.basis {
                            AlertBasis::DisplayOrder => view.top(&records),
                            AlertBasis::TrueMinimum => true_minimum(&records),
                        };
                        if let Some(level) = monitor.observe(target, config.alerts.enabled) {
                            sink.play(level);
                        }
                    }
                    Err(e) => warn!(error = %e, parse = e.is_parse(), "Fetch cycle failed"),
                }

                if gate.complete() {
                    start_fetch(&pipeline, &view, &tx);
                } else if once {
                    break;
                }
            }
        }
    }

    scheduler.stop();
    Ok(())
}

fn start_fetch(pipeline: &Arc<Pipeline>, view: &ViewState, tx: &mpsc::UnboundedSender<Event>) {
    let pipeline = Arc::clone(pipeline);
    let tx = tx.clone();
    let min_volume = view.min_volume;
    tokio::spawn(async move {
        let result = pipeline.run_fetch_cycle(min_volume).await;
        let _ = tx.send(Event::Fetched(result));
    });
}

fn report(records: &[DerivedRecord]) {
    info!(pairs = records.len(), "Dataset updated");
    for (rank, record) in largest_drops(records, TOP_DROPS).into_iter().enumerate() {
        let change = record
            .buy_change_percent
            .map(|c| format!("{c:.2}%"))
            .unwrap_or_default();
        info!(
            rank = rank + 1,
            symbol = record.symbol(),
            change = %change,
            buy = ?record.ticker.buy,
            "Drop"
        );
    }
}
