use std::fs::OpenOptions;
use std::io::IsTerminal;
use std::sync::{Arc, Mutex};

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use dipwatch::DipwatchError;
use dipwatch::alert::{AlertSink, SoundCommand, TerminalBell};
use dipwatch::config::{AppConfig, fetch_config};
use dipwatch::feed::TickerClient;
use dipwatch::pipeline::Pipeline;
use dipwatch::snapshot::{FileStore, MemoryStore, SnapshotStore};
use dipwatch::{headless, tui};

#[tokio::main]
async fn main() -> Result<(), DipwatchError> {
    let config = fetch_config()?;
    let run_headless = config.headless || !std::io::stdout().is_terminal();
    init_tracing(&config, run_headless)?;

    let store: Arc<dyn SnapshotStore> = match &config.session.dir {
        Some(dir) => Arc::new(FileStore::new(dir)?),
        None => Arc::new(MemoryStore::new()),
    };
    let client = TickerClient::new(&config.feed.ticker_url, config.feed.request_timeout)?;
    let pipeline = Arc::new(Pipeline::new(client, Arc::clone(&store)));

    let sink: Arc<dyn AlertSink> = match &config.alerts.player {
        Some(program) => Arc::new(SoundCommand::new(program, &config.alerts.sound_dir)),
        None => Arc::new(TerminalBell),
    };

    info!(url = %config.feed.ticker_url, headless = run_headless, "Starting dipwatch");

    let result = if run_headless {
        headless::run(&config, pipeline, sink).await
    } else {
        tui::run(&config, pipeline, sink).await
    };

    // The snapshot lives for one session unless asked to keep it.
    if !config.session.keep
        && let Err(e) = store.clear()
    {
        warn!(error = %e, "Failed to clear snapshot");
    }

    result
}

/// Logs to stdout in headless mode, otherwise to the log file so the
/// dashboard owns the terminal. `RUST_LOG` overrides the `info` default.
fn init_tracing(config: &AppConfig, headless: bool) -> Result<(), DipwatchError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    if headless {
        tracing_subscriber::fmt().with_env_filter(filter).init();
        return Ok(());
    }

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.log_file)
        .map_err(|e| {
            DipwatchError::Io(format!(
                "failed to open log file {}: {e}",
                config.log_file.display()
            ))
        })?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .init();
    Ok(())
}
