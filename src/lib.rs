//! Polling dashboard for sharp bid drops on KuCoin USDT pairs.
//!
//! Every cycle fetches all tickers, derives each pair's bid change against
//! the previous cycle's snapshot and commits the new snapshot. The view
//! layer sorts, filters and paginates the result, and a four-level alert
//! ladder reacts to the sharpest drop.

pub mod alert;
pub mod config;
pub mod error;
pub mod feed;
pub mod headless;
pub mod models;
pub mod pipeline;
pub mod scheduler;
pub mod snapshot;
pub mod tui;
pub mod view;

pub use error::{DipwatchError, Result};
