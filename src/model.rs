//! Typed reference and measurement data.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use chrono::Month;
use serde::{Serialize, Serializer};

use crate::error::{PeriodParseError, ZoneParseError};

/// Regulatory zone category. Determines which legal limit pair applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum ZoneType {
    Commercial,
    Industrial,
    Residential,
    Silence,
}

impl ZoneType {
    pub const ALL: [ZoneType; 4] = [
        ZoneType::Commercial,
        ZoneType::Industrial,
        ZoneType::Residential,
        ZoneType::Silence,
    ];

    /// Default `(day, night)` limits in dB for the zone.
    ///
    /// | Zone        | Day | Night |
    /// |-------------|-----|-------|
    /// | Industrial  | 75  | 70    |
    /// | Commercial  | 65  | 55    |
    /// | Residential | 55  | 45    |
    /// | Silence     | 50  | 40    |
    pub fn default_limits(self) -> (f64, f64) {
        match self {
            ZoneType::Industrial => (75.0, 70.0),
            ZoneType::Commercial => (65.0, 55.0),
            ZoneType::Residential => (55.0, 45.0),
            ZoneType::Silence => (50.0, 40.0),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ZoneType::Commercial => "Commercial",
            ZoneType::Industrial => "Industrial",
            ZoneType::Residential => "Residential",
            ZoneType::Silence => "Silence",
        }
    }
}

impl fmt::Display for ZoneType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for ZoneType {
    type Err = ZoneParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        ZoneType::ALL
            .into_iter()
            .find(|z| z.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| ZoneParseError(trimmed.to_string()))
    }
}

/// A calendar month of a given year. Orders chronologically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Period {
    year: i32,
    month: u32,
}

impl Period {
    pub const MIN_YEAR: i32 = 0;
    pub const MAX_YEAR: i32 = 9999;

    pub fn new(year: i32, month: u32) -> Result<Self, PeriodParseError> {
        if !(Self::MIN_YEAR..=Self::MAX_YEAR).contains(&year) {
            return Err(PeriodParseError::Year(year));
        }
        if !(1..=12).contains(&month) {
            return Err(PeriodParseError::Month(month));
        }
        Ok(Self { year, month })
    }

    pub fn year(self) -> i32 {
        self.year
    }

    pub fn month(self) -> u32 {
        self.month
    }

    /// The calendar month before this one; January rolls back a year.
    /// `None` before year 0.
    pub fn previous(self) -> Option<Self> {
        if self.month == 1 {
            Self::new(self.year - 1, 12).ok()
        } else {
            Some(Self {
                year: self.year,
                month: self.month - 1,
            })
        }
    }

    /// `None` after year 9999.
    pub fn next(self) -> Option<Self> {
        if self.month == 12 {
            Self::new(self.year + 1, 1).ok()
        } else {
            Some(Self {
                year: self.year,
                month: self.month + 1,
            })
        }
    }

    /// Every period from `start` to `end` inclusive. Empty when `start > end`.
    pub fn range(start: Period, end: Period) -> Vec<Period> {
        let mut periods = Vec::new();
        let mut current = Some(start);
        while let Some(period) = current.filter(|p| *p <= end) {
            periods.push(period);
            current = period.next();
        }
        periods
    }

    pub fn month_name(self) -> &'static str {
        u8::try_from(self.month)
            .ok()
            .and_then(|m| Month::try_from(m).ok())
            .map(|m| m.name())
            .unwrap_or("Unknown")
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for Period {
    type Err = PeriodParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let format_err = || PeriodParseError::Format(s.to_string());
        let (year, month) = s.trim().split_once('-').ok_or_else(format_err)?;
        let year: i32 = year.parse().map_err(|_| format_err())?;
        let month: u32 = month.parse().map_err(|_| format_err())?;
        Period::new(year, month)
    }
}

impl Serialize for Period {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Which legal limit a level is checked against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LimitKind {
    Day,
    Night,
}

impl fmt::Display for LimitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LimitKind::Day => f.pad("day"),
            LimitKind::Night => f.pad("night"),
        }
    }
}

/// Monitoring station reference data.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Station {
    pub id: String,
    pub name: String,
    pub city: String,
    pub zone: ZoneType,
    pub day_limit: f64,
    pub night_limit: f64,
}

impl Station {
    pub fn limit(&self, kind: LimitKind) -> f64 {
        match kind {
            LimitKind::Day => self.day_limit,
            LimitKind::Night => self.night_limit,
        }
    }
}

/// One station's monthly day and night levels.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Measurement {
    pub station_id: String,
    pub period: Period,
    pub day: f64,
    pub night: f64,
}

/// A measurement joined with the station it was taken at.
#[derive(Debug, Clone)]
pub struct NoiseRecord {
    pub station: Arc<Station>,
    pub period: Period,
    pub day: f64,
    pub night: f64,
}

impl NoiseRecord {
    pub fn level(&self, kind: LimitKind) -> f64 {
        match kind {
            LimitKind::Day => self.day,
            LimitKind::Night => self.night,
        }
    }

    /// Amount by which the level exceeds the station limit, if it does.
    pub fn excess(&self, kind: LimitKind) -> Option<f64> {
        let excess = self.level(kind) - self.station.limit(kind);
        (excess > 0.0).then_some(excess)
    }
}
