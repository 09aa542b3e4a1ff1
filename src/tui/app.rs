//! Application state for the TUI.

use std::time::{Duration, Instant};

use chrono::{DateTime, Local};

use crate::alert::{AlertBasis, AlertLevel, AlertMonitor, true_minimum};
use crate::models::DerivedRecord;
use crate::scheduler::PollInterval;
use crate::view::ViewState;

use super::input::text_input::TextInput;

/// How long an error stays in the status bar.
const ERROR_DISPLAY_TIME: Duration = Duration::from_secs(5);

/// Central application state container.
pub struct App {
    // -- Data --
    /// Records of the latest successful fetch, in feed order.
    pub records: Vec<DerivedRecord>,
    /// Wall-clock time of the latest successful fetch.
    pub last_updated: Option<DateTime<Local>>,
    /// Whether a fetch is running.
    pub loading: bool,

    // -- Polling --
    pub interval: PollInterval,
    pub auto_refresh: bool,
    /// Scheduler generation whose triggers are still honoured.
    pub poll_generation: u64,
    /// Time left until the next scheduled fetch.
    pub countdown: Option<Duration>,

    // -- Alerts --
    pub alerts_enabled: bool,
    pub alert_basis: AlertBasis,
    alert_monitor: AlertMonitor,

    // -- UI State --
    /// Sort, volume floor and revealed rows.
    pub view: ViewState,
    /// Highlighted row within the revealed rows.
    pub selected: usize,
    /// Current input mode.
    pub mode: Mode,
    /// Minimum-volume input field.
    pub volume_input: TextInput,
    /// Error message to display (clears after timeout).
    pub error_message: Option<ErrorDisplay>,

    // -- Internal --
    /// Flag to signal application should quit.
    pub should_quit: bool,
}

impl App {
    /// Creates a new App instance with default state.
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
            last_updated: None,
            loading: false,

            interval: PollInterval::default(),
            auto_refresh: true,
            poll_generation: 0,
            countdown: None,

            alerts_enabled: true,
            alert_basis: AlertBasis::default(),
            alert_monitor: AlertMonitor::new(),

            view: ViewState::default(),
            selected: 0,
            mode: Mode::Normal,
            volume_input: TextInput::new(),
            error_message: None,

            should_quit: false,
        }
    }

    /// Replaces the dataset with the results of a successful fetch.
    pub fn apply_fetch(&mut self, records: Vec<DerivedRecord>) {
        self.records = records;
        self.last_updated = Some(Local::now());
        self.loading = false;
        self.view.on_dataset_replaced(self.records.len());
        self.clamp_selection();
    }

    /// Surfaces a failed fetch; the previous dataset stays on screen.
    pub fn fetch_failed(&mut self, message: impl Into<String>) {
        self.loading = false;
        self.show_error(message);
    }

    /// Rows currently revealed, in display order.
    pub fn visible_rows(&self) -> Vec<&DerivedRecord> {
        self.view.present(&self.records)
    }

    /// The highlighted record, if any.
    pub fn selected_record(&self) -> Option<&DerivedRecord> {
        self.visible_rows().get(self.selected).copied()
    }

    pub fn select_next(&mut self) {
        let shown = self.view.visible_rows().min(self.records.len());
        if self.selected + 1 < shown {
            self.selected += 1;
        }
    }

    pub fn select_previous(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    /// Reveals another page of rows.
    pub fn show_more(&mut self) {
        self.view.show_more(self.records.len());
    }

    fn clamp_selection(&mut self) {
        let shown = self.view.visible_rows().min(self.records.len());
        self.selected = self.selected.min(shown.saturating_sub(1));
    }

    /// The record alerts are evaluated against.
    pub fn alert_target(&self) -> Option<&DerivedRecord> {
        alert_target(self.alert_basis, &self.view, &self.records)
    }

    /// Checks the alert target and returns a level to play if its value
    /// changed since the last check and crosses a threshold.
    pub fn poll_alert(&mut self) -> Option<AlertLevel> {
        let target = alert_target(self.alert_basis, &self.view, &self.records);
        self.alert_monitor.observe(target, self.alerts_enabled)
    }

    /// Sets an error message to display.
    pub fn show_error(&mut self, message: impl Into<String>) {
        self.error_message = Some(ErrorDisplay {
            message: message.into(),
            timestamp: Instant::now(),
        });
    }

    /// Clears error messages older than five seconds.
    pub fn clear_stale_errors(&mut self) {
        if let Some(ref error) = self.error_message
            && error.timestamp.elapsed() > ERROR_DISPLAY_TIME
        {
            self.error_message = None;
        }
    }
}

fn alert_target<'a>(
    basis: AlertBasis,
    view: &ViewState,
    records: &'a [DerivedRecord],
) -> Option<&'a DerivedRecord> {
    match basis {
        AlertBasis::DisplayOrder => view.top(records),
        AlertBasis::TrueMinimum => true_minimum(records),
    }
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

/// Input mode.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Mode {
    #[default]
    Normal,
    /// Typing a minimum volume.
    Insert,
}

/// Error message with timestamp for auto-clear.
#[derive(Clone, Debug)]
pub struct ErrorDisplay {
    /// The error message.
    pub message: String,
    /// When the error was shown.
    pub timestamp: Instant,
}
