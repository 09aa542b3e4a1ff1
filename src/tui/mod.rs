//! Terminal dashboard.
//!
//! Ratatui table of derived records with polling controls, a countdown,
//! alert toggles and a minimum-volume filter.

pub mod app;
pub mod components;
pub mod event;
pub mod input;
pub mod runner;
pub mod terminal;
pub mod ui;

pub use app::App;
pub use event::{Action, Event, Message, update};
pub use runner::run;
pub use terminal::{Tui, restore_terminal, setup_terminal};
pub use ui::render;
