//! Data types produced by the aggregation engine.
//!
//! Everything here is plain data deriving `Serialize`, so a rendering layer
//! can consume a [`Report`] as JSON without knowing about the engine.

use serde::Serialize;

use crate::model::{LimitKind, Period, ZoneType};

/// Mean levels and violation counts over a set of records.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LevelSummary {
    pub records: usize,
    pub stations: usize,
    pub mean_day: f64,
    pub mean_night: f64,
    pub max_day: f64,
    pub max_night: f64,

    // one violation per exceeded dimension
    pub day_violations: usize,
    pub night_violations: usize,
    pub violations: usize,
    /// Violations as a percentage of checked dimensions (two per record).
    pub violation_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ZoneSummary {
    pub zone: ZoneType,
    #[serde(flatten)]
    pub summary: LevelSummary,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StationSummary {
    pub station_id: String,
    pub name: String,
    pub zone: ZoneType,
    pub day_limit: f64,
    pub night_limit: f64,
    #[serde(flatten)]
    pub summary: LevelSummary,
}

/// Signed change (current minus comparison) in mean levels.
///
/// `Unavailable` when the comparison side has no records; never reported
/// as a zero change.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Delta {
    Available { day: f64, night: f64 },
    Unavailable,
}

impl Delta {
    pub fn between(current: &LevelSummary, comparison: Option<&LevelSummary>) -> Self {
        match comparison {
            Some(c) => Delta::Available {
                day: current.mean_day - c.mean_day,
                night: current.mean_night - c.mean_night,
            },
            None => Delta::Unavailable,
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, Delta::Available { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ZoneDelta {
    pub zone: ZoneType,
    pub delta: Delta,
}

/// The current period compared against one earlier period.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodComparison {
    pub period: Period,
    pub summary: Option<LevelSummary>,
    pub overall: Delta,
    pub zones: Vec<ZoneDelta>,
}

/// A single exceeded limit. `excess` is always strictly positive.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Violation {
    pub station_id: String,
    pub station_name: String,
    pub zone: ZoneType,
    pub period: Period,
    pub kind: LimitKind,
    pub measured: f64,
    pub limit: f64,
    pub excess: f64,
}

/// Mean levels for one month of a trend or window breakdown.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendPoint {
    pub period: Period,
    pub month_name: &'static str,
    pub records: usize,
    pub mean_day: f64,
    pub mean_night: f64,
}

/// Complete result of one engine query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub city: String,
    pub period: Period,
    pub zones: Vec<ZoneType>,
    pub overall: LevelSummary,
    pub by_zone: Vec<ZoneSummary>,
    pub by_station: Vec<StationSummary>,
    pub comparisons: Vec<PeriodComparison>,
    pub violations: Vec<Violation>,
    pub trend: Vec<TrendPoint>,
}

/// Aggregate over several months at once, with a per-month breakdown.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WindowSummary {
    pub city: String,
    pub zones: Vec<ZoneType>,
    pub periods: Vec<Period>,
    pub overall: Option<LevelSummary>,
    pub monthly: Vec<TrendPoint>,
}
