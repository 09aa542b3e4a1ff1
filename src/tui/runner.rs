//! Interactive dashboard loop.

use std::sync::Arc;

use rust_decimal::Decimal;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{info, warn};

use crate::alert::AlertSink;
use crate::config::AppConfig;
use crate::pipeline::Pipeline;
use crate::scheduler::{FetchGate, Scheduler};
use crate::view::ViewState;
use crate::{DipwatchError, Result};

use super::app::App;
use super::event::{Action, Message, spawn_event_reader, spawn_tick_timer, update};
use super::terminal::{Tui, install_panic_hook, restore_terminal, setup_terminal};
use super::ui::render;

/// Redraw period for spinners and error expiry.
const UI_TICK_MS: u64 = 250;

/// Runs the dashboard until the user quits.
pub async fn run(config: &AppConfig, pipeline: Arc<Pipeline>, sink: Arc<dyn AlertSink>) -> Result<()> {
    install_panic_hook();
    let mut terminal = setup_terminal()?;
    let result = event_loop(&mut terminal, config, pipeline, sink).await;
    restore_terminal(&mut terminal)?;
    result
}

async fn event_loop(
    terminal: &mut Tui,
    config: &AppConfig,
    pipeline: Arc<Pipeline>,
    sink: Arc<dyn AlertSink>,
) -> Result<()> {
    let (tx, mut rx) = mpsc::unbounded_channel::<Message>();
    spawn_event_reader(tx.clone());
    spawn_tick_timer(tx.clone(), UI_TICK_MS);

    let mut app = App::new();
    app.interval = config.polling.interval;
    app.auto_refresh = config.polling.auto_refresh;
    app.alerts_enabled = config.alerts.enabled;
    app.alert_basis = config.alerts.basis;
    app.view = ViewState::new(config.view.row_reset);
    app.view.min_volume = config.view.min_volume;

    let mut scheduler = Scheduler::new(tx.clone(), app.interval);
    let mut gate = FetchGate::new();

    if app.auto_refresh {
        scheduler.start();
        app.poll_generation = scheduler.generation();
    } else {
        // One load so the table is not empty while polling is off.
        let _ = tx.send(Message::InitialLoad);
    }

    info!(interval = %app.interval.label(), auto_refresh = app.auto_refresh, "Dashboard started");

    loop {
        app.countdown = scheduler.countdown(Instant::now());
        terminal
            .draw(|frame| render(frame, &app))
            .map_err(|e| DipwatchError::Io(format!("failed to draw: {e}")))?;

        let Some(message) = rx.recv().await else {
            break;
        };

        let is_tick = message.is_tick();
        let ends_fetch = message.ends_fetch();

        let action = update(&mut app, message);

        if ends_fetch {
            scheduler.mark_run(Instant::now());
            if gate.complete() {
                start_fetch(&mut app, &pipeline, &tx);
            }
        }

        match action {
            Some(Action::Refetch) => {
                if gate.request() {
                    start_fetch(&mut app, &pipeline, &tx);
                }
            }
            Some(Action::Reconfigure { interval, enabled }) => {
                scheduler.reconfigure(interval, enabled);
                app.poll_generation = scheduler.generation();
            }
            None => {}
        }

        if !is_tick && let Some(level) = app.poll_alert() {
            sink.play(level);
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}

/// Runs one fetch cycle in the background and reports back on `tx`.
fn start_fetch(app: &mut App, pipeline: &Arc<Pipeline>, tx: &mpsc::UnboundedSender<Message>) {
    app.loading = true;
    let pipeline = Arc::clone(pipeline);
    let tx = tx.clone();
    let min_volume: Option<Decimal> = app.view.min_volume;

    tokio::spawn(async move {
        let message = match pipeline.run_fetch_cycle(min_volume).await {
            Ok(records) => Message::FetchCompleted(records),
            Err(e) => {
                warn!(error = %e, parse = e.is_parse(), "Fetch cycle failed");
                Message::FetchFailed(e.to_string())
            }
        };
        let _ = tx.send(message);
    });
}
