//! Event handling for the TUI.

use std::time::Duration;

use crossterm::event::{self, Event as CrosstermEvent, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use tokio::sync::mpsc;

use crate::models::DerivedRecord;
use crate::scheduler::{PollInterval, SchedulerEvent};
use crate::view::COLUMNS;

use super::app::{App, Mode};

/// Events that can occur in the terminal.
#[derive(Debug)]
pub enum Event {
    /// A key was pressed.
    Key(KeyEvent),
    /// Terminal was resized.
    Resize(u16, u16),
    /// Periodic tick for UI updates.
    Tick,
}

/// Messages that update application state.
#[derive(Debug)]
pub enum Message {
    /// Input event from terminal.
    Input(Event),

    /// The scheduler asks for a fetch under the given generation.
    FetchDue(u64),
    /// The one load at launch when polling is off.
    InitialLoad,
    /// One second of countdown elapsed.
    CountdownTick,

    /// A fetch cycle committed a new dataset.
    FetchCompleted(Vec<DerivedRecord>),
    /// A fetch cycle failed; the dataset is unchanged.
    FetchFailed(String),

    /// Request to quit the application.
    Quit,
}

impl From<SchedulerEvent> for Message {
    fn from(event: SchedulerEvent) -> Self {
        match event {
            SchedulerEvent::FetchDue(generation) => Message::FetchDue(generation),
            SchedulerEvent::CountdownTick => Message::CountdownTick,
        }
    }
}

impl Message {
    /// Whether this message only drives timers and cannot change what is
    /// shown in the table.
    pub fn is_tick(&self) -> bool {
        matches!(self, Message::Input(Event::Tick) | Message::CountdownTick)
    }

    /// Whether this message ends a fetch cycle.
    pub fn ends_fetch(&self) -> bool {
        matches!(self, Message::FetchCompleted(_) | Message::FetchFailed(_))
    }
}

/// Actions that require external handling.
#[derive(Debug, PartialEq, Eq)]
pub enum Action {
    /// Run a fetch cycle now (or queue one behind the running fetch).
    Refetch,
    /// Restart polling with a new interval or enabled state.
    Reconfigure { interval: PollInterval, enabled: bool },
}

/// Spawns a task that polls for terminal events and sends them to a channel.
pub fn spawn_event_reader(tx: mpsc::UnboundedSender<Message>) {
    tokio::spawn(async move {
        loop {
            match tokio::task::spawn_blocking(|| {
                if event::poll(Duration::from_millis(50)).unwrap_or(false) {
                    event::read().ok()
                } else {
                    None
                }
            })
            .await
            {
                Ok(Some(CrosstermEvent::Key(key))) if key.kind != KeyEventKind::Release => {
                    if tx.send(Message::Input(Event::Key(key))).is_err() {
                        break;
                    }
                }
                Ok(Some(CrosstermEvent::Resize(w, h))) => {
                    if tx.send(Message::Input(Event::Resize(w, h))).is_err() {
                        break;
                    }
                }
                Ok(_) => {}
                Err(_) => break,
            }
        }
    });
}

/// Spawns a task that sends periodic tick events.
pub fn spawn_tick_timer(tx: mpsc::UnboundedSender<Message>, interval_ms: u64) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_millis(interval_ms));
        loop {
            interval.tick().await;
            if tx.send(Message::Input(Event::Tick)).is_err() {
                break;
            }
        }
    });
}

/// Updates application state based on a message.
pub fn update(app: &mut App, message: Message) -> Option<Action> {
    match message {
        Message::Input(event) => handle_input(app, event),
        Message::FetchDue(generation) => {
            (app.auto_refresh && generation == app.poll_generation).then_some(Action::Refetch)
        }
        Message::InitialLoad => Some(Action::Refetch),
        Message::CountdownTick => None,
        Message::FetchCompleted(records) => {
            app.apply_fetch(records);
            None
        }
        Message::FetchFailed(error) => {
            app.fetch_failed(format!("Fetch failed: {error}"));
            None
        }
        Message::Quit => {
            app.should_quit = true;
            None
        }
    }
}

fn handle_input(app: &mut App, event: Event) -> Option<Action> {
    match event {
        Event::Key(key) => handle_key(app, key),
        Event::Resize(_, _) => None,
        Event::Tick => {
            app.clear_stale_errors();
            None
        }
    }
}

fn handle_key(app: &mut App, key: KeyEvent) -> Option<Action> {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return None;
    }

    match app.mode {
        Mode::Normal => handle_normal_mode(app, key),
        Mode::Insert => handle_insert_mode(app, key),
    }
}

fn handle_normal_mode(app: &mut App, key: KeyEvent) -> Option<Action> {
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => {
            app.should_quit = true;
            None
        }

        // Fetching and polling
        KeyCode::Char('r') => Some(Action::Refetch),
        KeyCode::Char('s') => {
            app.auto_refresh = !app.auto_refresh;
            Some(reconfigure(app))
        }
        KeyCode::Char(']') | KeyCode::Char('+') => {
            app.interval = app.interval.next();
            Some(reconfigure(app))
        }
        KeyCode::Char('[') | KeyCode::Char('-') => {
            app.interval = app.interval.previous();
            Some(reconfigure(app))
        }

        // Alerts
        KeyCode::Char('a') => {
            app.alerts_enabled = !app.alerts_enabled;
            None
        }
        KeyCode::Char('b') => {
            app.alert_basis.toggle();
            None
        }

        // Column sort shortcuts
        KeyCode::Char(c @ '1'..='8') => {
            let index = c as usize - '1' as usize;
            if let Some(key) = COLUMNS.get(index) {
                app.view.toggle_sort(*key);
            }
            None
        }

        // Rows
        KeyCode::Char('m') | KeyCode::Char(' ') => {
            app.show_more();
            None
        }
        KeyCode::Char('j') | KeyCode::Down => {
            app.select_next();
            None
        }
        KeyCode::Char('k') | KeyCode::Up => {
            app.select_previous();
            None
        }

        // Minimum volume filter
        KeyCode::Char('f') | KeyCode::Char('/') => {
            let current = app.view.min_volume.map(|v| v.to_string()).unwrap_or_default();
            app.volume_input.set(&current);
            app.mode = Mode::Insert;
            None
        }

        _ => None,
    }
}

fn handle_insert_mode(app: &mut App, key: KeyEvent) -> Option<Action> {
    match key.code {
        KeyCode::Enter => match app.volume_input.parse_volume() {
            Ok(min_volume) => {
                app.mode = Mode::Normal;
                app.view.min_volume = min_volume;
                Some(Action::Refetch)
            }
            Err(error) => {
                app.show_error(error);
                None
            }
        },
        KeyCode::Esc => {
            app.mode = Mode::Normal;
            None
        }
        KeyCode::Char(c) => {
            app.volume_input.insert(c);
            None
        }
        KeyCode::Backspace => {
            app.volume_input.backspace();
            None
        }
        KeyCode::Delete => {
            app.volume_input.delete();
            None
        }
        KeyCode::Left => {
            app.volume_input.move_left();
            None
        }
        KeyCode::Right => {
            app.volume_input.move_right();
            None
        }
        KeyCode::Home => {
            app.volume_input.move_home();
            None
        }
        KeyCode::End => {
            app.volume_input.move_end();
            None
        }
        _ => None,
    }
}

fn reconfigure(app: &App) -> Action {
    Action::Reconfigure {
        interval: app.interval,
        enabled: app.auto_refresh,
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;
    use crate::models::TickerRecord;
    use crate::view::SortKey;

    fn press(app: &mut App, code: KeyCode) -> Option<Action> {
        update(
            app,
            Message::Input(Event::Key(KeyEvent::new(code, KeyModifiers::NONE))),
        )
    }

    fn record(symbol: &str, change: rust_decimal::Decimal) -> DerivedRecord {
        DerivedRecord {
            ticker: TickerRecord {
                symbol: symbol.to_string(),
                last: None,
                change_rate: None,
                vol: None,
                vol_value: None,
                buy: None,
                sell: None,
                high: None,
                low: None,
            },
            buy_change_percent: Some(change),
        }
    }

    #[test]
    fn scheduler_events_map_to_messages() {
        let mut app = App::new();
        app.poll_generation = 3;
        assert_eq!(
            update(&mut app, SchedulerEvent::FetchDue(3).into()),
            Some(Action::Refetch)
        );
        assert_eq!(update(&mut app, SchedulerEvent::FetchDue(2).into()), None);
        assert_eq!(update(&mut app, SchedulerEvent::CountdownTick.into()), None);
    }

    #[test]
    fn queued_trigger_is_ignored_after_stop() {
        let mut app = App::new();
        app.poll_generation = 1;
        // Trigger queued behind the key press that stops polling
        assert!(press(&mut app, KeyCode::Char('s')).is_some());
        assert_eq!(update(&mut app, Message::FetchDue(1)), None);
    }

    #[test]
    fn initial_load_runs_with_polling_off() {
        let mut app = App::new();
        app.auto_refresh = false;
        assert_eq!(update(&mut app, Message::FetchDue(0)), None);
        assert_eq!(update(&mut app, Message::InitialLoad), Some(Action::Refetch));
    }

    #[test]
    fn toggling_auto_refresh_reconfigures() {
        let mut app = App::new();
        assert_eq!(
            press(&mut app, KeyCode::Char('s')),
            Some(Action::Reconfigure {
                interval: PollInterval::M5,
                enabled: false
            })
        );
        assert_eq!(
            press(&mut app, KeyCode::Char(']')),
            Some(Action::Reconfigure {
                interval: PollInterval::M10,
                enabled: false
            })
        );
    }

    #[test]
    fn number_keys_sort_columns() {
        let mut app = App::new();
        press(&mut app, KeyCode::Char('1'));
        assert_eq!(app.view.sort_key, SortKey::Symbol);
        press(&mut app, KeyCode::Char('2'));
        assert_eq!(app.view.sort_key, SortKey::BuyChangePercent);
        press(&mut app, KeyCode::Char('9'));
        assert_eq!(app.view.sort_key, SortKey::BuyChangePercent);
    }

    #[test]
    fn volume_input_sets_floor_and_refetches() {
        let mut app = App::new();
        press(&mut app, KeyCode::Char('f'));
        assert_eq!(app.mode, Mode::Insert);
        for c in "5000".chars() {
            press(&mut app, KeyCode::Char(c));
        }
        assert_eq!(press(&mut app, KeyCode::Enter), Some(Action::Refetch));
        assert_eq!(app.mode, Mode::Normal);
        assert_eq!(app.view.min_volume, Some(dec!(5000)));

        // Clearing the field removes the floor
        press(&mut app, KeyCode::Char('f'));
        for _ in 0..4 {
            press(&mut app, KeyCode::Backspace);
        }
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.view.min_volume, None);
    }

    #[test]
    fn q_in_insert_mode_is_ignored() {
        let mut app = App::new();
        press(&mut app, KeyCode::Char('f'));
        press(&mut app, KeyCode::Char('q'));
        assert!(!app.should_quit);
        press(&mut app, KeyCode::Esc);
        press(&mut app, KeyCode::Char('q'));
        assert!(app.should_quit);
    }

    #[test]
    fn failed_fetch_keeps_dataset() {
        let mut app = App::new();
        update(
            &mut app,
            Message::FetchCompleted(vec![record("AAA-USDT", dec!(-3))]),
        );
        assert!(app.last_updated.is_some());

        app.loading = true;
        update(&mut app, Message::FetchFailed("timeout".into()));
        assert!(!app.loading);
        assert_eq!(app.records.len(), 1);
        assert!(app.error_message.is_some());
    }

    #[test]
    fn alert_fires_once_for_top_row() {
        let mut app = App::new();
        update(
            &mut app,
            Message::FetchCompleted(vec![
                record("UP-USDT", dec!(2)),
                record("DROP-USDT", dec!(-15.00)),
            ]),
        );
        assert_eq!(app.poll_alert(), Some(crate::alert::AlertLevel::Level3));
        assert_eq!(app.poll_alert(), None);

        // Sorting descending moves a non-alerting record to the top
        press(&mut app, KeyCode::Char('2'));
        assert_eq!(app.alert_target().map(DerivedRecord::symbol), Some("UP-USDT"));
        assert_eq!(app.poll_alert(), None);

        // Alerting on the true minimum ignores the sort
        press(&mut app, KeyCode::Char('b'));
        assert_eq!(app.alert_target().map(DerivedRecord::symbol), Some("DROP-USDT"));
        assert_eq!(app.poll_alert(), Some(crate::alert::AlertLevel::Level3));
    }
}
