//! Application configuration loaded from environment variables.
//!
//! Every setting is optional:
//! - `DIPWATCH_TICKER_URL` overrides the all-tickers endpoint
//! - `DIPWATCH_INTERVAL_MINUTES` polling interval (1, 2, 3, 5, 10, 15 or 30)
//! - `DIPWATCH_AUTO_REFRESH` start polling at launch
//! - `DIPWATCH_MIN_VOLUME` initial minimum 24h quote volume
//! - `DIPWATCH_ALERTS` alerts enabled at launch
//! - `DIPWATCH_ALERT_BASIS` `display` or `minimum`
//! - `DIPWATCH_ALERT_PLAYER` program that plays alert sounds
//! - `DIPWATCH_SOUND_DIR` directory holding `sound1.mp3`..`sound4.mp3`
//! - `DIPWATCH_ROW_RESET` `fetch` or `keep`
//! - `DIPWATCH_SESSION_DIR` persist the snapshot in this directory
//! - `DIPWATCH_KEEP_SESSION` keep the persisted snapshot on exit
//! - `DIPWATCH_REQUEST_TIMEOUT_SECS` HTTP timeout
//! - `DIPWATCH_LOG_FILE` tracing output file for the TUI
//! - `DIPWATCH_HEADLESS` run without the TUI

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use rust_decimal::Decimal;

use crate::alert::AlertBasis;
use crate::error::DipwatchError;
use crate::feed::DEFAULT_TICKER_URL;
use crate::scheduler::PollInterval;
use crate::view::RowResetPolicy;

/// Default HTTP timeout for one ticker request.
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 15;

/// Default directory for alert sounds.
const DEFAULT_SOUND_DIR: &str = "sounds";

/// Default log file while the TUI owns the terminal.
const DEFAULT_LOG_FILE: &str = "dipwatch.log";

/// Top-level application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub feed: FeedConfig,
    pub polling: PollingConfig,
    pub alerts: AlertConfig,
    pub view: ViewConfig,
    pub session: SessionConfig,
    pub log_file: PathBuf,
    pub headless: bool,
}

/// Ticker endpoint settings.
#[derive(Debug, Clone)]
pub struct FeedConfig {
    pub ticker_url: String,
    pub request_timeout: Duration,
}

/// Scheduler settings.
#[derive(Debug, Clone)]
pub struct PollingConfig {
    pub interval: PollInterval,
    pub auto_refresh: bool,
}

/// Alert settings.
#[derive(Debug, Clone)]
pub struct AlertConfig {
    pub enabled: bool,
    pub basis: AlertBasis,
    /// External player; `None` rings the terminal bell instead.
    pub player: Option<String>,
    pub sound_dir: PathBuf,
}

/// Table settings.
#[derive(Debug, Clone)]
pub struct ViewConfig {
    pub min_volume: Option<Decimal>,
    pub row_reset: RowResetPolicy,
}

/// Snapshot persistence settings.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Directory for the file-backed store; `None` keeps it in memory.
    pub dir: Option<PathBuf>,
    pub keep: bool,
}

/// Loads the application configuration from environment variables.
///
/// # Errors
///
/// Returns [`DipwatchError::Config`] naming the variable whose value is
/// not valid.
pub fn fetch_config() -> crate::Result<AppConfig> {
    let ticker_url =
        non_empty_var("DIPWATCH_TICKER_URL").unwrap_or_else(|| DEFAULT_TICKER_URL.to_string());

    let request_timeout = Duration::from_secs(
        parse_var::<u64>("DIPWATCH_REQUEST_TIMEOUT_SECS")?.unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
    );

    let interval = match parse_var::<u64>("DIPWATCH_INTERVAL_MINUTES")? {
        Some(minutes) => PollInterval::from_minutes(minutes).ok_or_else(|| {
            DipwatchError::Config(format!(
                "DIPWATCH_INTERVAL_MINUTES must be one of 1, 2, 3, 5, 10, 15, 30 (got {minutes})"
            ))
        })?,
        None => PollInterval::default(),
    };

    let min_volume = parse_var::<Decimal>("DIPWATCH_MIN_VOLUME")?;
    if min_volume.is_some_and(|v| v.is_sign_negative()) {
        return Err(DipwatchError::Config(
            "DIPWATCH_MIN_VOLUME must not be negative".to_string(),
        ));
    }

    let basis = match non_empty_var("DIPWATCH_ALERT_BASIS").as_deref() {
        None | Some("display") => AlertBasis::DisplayOrder,
        Some("minimum") => AlertBasis::TrueMinimum,
        Some(other) => {
            return Err(DipwatchError::Config(format!(
                "DIPWATCH_ALERT_BASIS must be `display` or `minimum` (got {other})"
            )));
        }
    };

    let row_reset = match non_empty_var("DIPWATCH_ROW_RESET").as_deref() {
        None | Some("fetch") => RowResetPolicy::OnFetch,
        Some("keep") => RowResetPolicy::Keep,
        Some(other) => {
            return Err(DipwatchError::Config(format!(
                "DIPWATCH_ROW_RESET must be `fetch` or `keep` (got {other})"
            )));
        }
    };

    Ok(AppConfig {
        feed: FeedConfig {
            ticker_url,
            request_timeout,
        },
        polling: PollingConfig {
            interval,
            auto_refresh: bool_var("DIPWATCH_AUTO_REFRESH")?.unwrap_or(true),
        },
        alerts: AlertConfig {
            enabled: bool_var("DIPWATCH_ALERTS")?.unwrap_or(true),
            basis,
            player: non_empty_var("DIPWATCH_ALERT_PLAYER"),
            sound_dir: non_empty_var("DIPWATCH_SOUND_DIR")
                .map_or_else(|| PathBuf::from(DEFAULT_SOUND_DIR), PathBuf::from),
        },
        view: ViewConfig {
            min_volume,
            row_reset,
        },
        session: SessionConfig {
            dir: non_empty_var("DIPWATCH_SESSION_DIR").map(PathBuf::from),
            keep: bool_var("DIPWATCH_KEEP_SESSION")?.unwrap_or(false),
        },
        log_file: non_empty_var("DIPWATCH_LOG_FILE")
            .map_or_else(|| PathBuf::from(DEFAULT_LOG_FILE), PathBuf::from),
        headless: bool_var("DIPWATCH_HEADLESS")?.unwrap_or(false),
    })
}

/// Returns the value of an environment variable if it exists and is non-empty.
fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|s| !s.is_empty())
}

/// Parses a non-empty variable with [`FromStr`].
fn parse_var<T: FromStr>(name: &str) -> crate::Result<Option<T>>
where
    T::Err: std::fmt::Display,
{
    non_empty_var(name)
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .map_err(|e| DipwatchError::Config(format!("invalid {name} `{raw}`: {e}")))
        })
        .transpose()
}

/// Parses a boolean flag such as `true`, `0` or `off`.
fn bool_var(name: &str) -> crate::Result<Option<bool>> {
    let Some(raw) = non_empty_var(name) else {
        return Ok(None);
    };
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(Some(true)),
        "0" | "false" | "no" | "off" => Ok(Some(false)),
        _ => Err(DipwatchError::Config(format!(
            "{name} must be a boolean (got {raw})"
        ))),
    }
}
