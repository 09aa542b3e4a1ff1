//! Reusable UI widgets.

pub mod status_bar;
pub mod ticker_table;
