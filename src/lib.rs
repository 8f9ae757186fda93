//! Reads monthly expense tabs from a Google Sheet, normalizes them into one table and computes the
//! figures an expense dashboard shows: totals by month, category and merchant, daily spend with a
//! rolling average and the recurring costs.

mod api;
pub mod args;
pub mod commands;
mod config;
pub mod dashboard;
mod error;
mod ingest;
pub mod metrics;
pub mod model;
pub mod normalize;
pub mod snapshot;
mod utils;


pub use api::Mode;
pub use config::Config;
pub use error::{DataError, Error, Result};
pub use model::Amount;
