//! Wire and domain models for the ticker feed.

pub mod ticker;

pub use ticker::{AllTickersData, AllTickersResponse, DerivedRecord, TickerRecord};
