//! Noise level aggregation and limit-violation analysis.
//!
//! This module filters the joined dataset by city, zone type and period,
//! computes per-zone and per-station summaries, differences them against
//! earlier periods and lists every exceeded limit.

pub mod aggregate;
pub mod engine;
pub mod types;
pub mod utility;

pub use engine::{Filter, query, summarize_window};
