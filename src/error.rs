//! Error types for loading and querying the noise dataset.

use std::path::PathBuf;

use thiserror::Error;

use crate::model::Period;

/// Fatal errors raised while loading the station and measurement sources.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("data file not found: {}", path.display())]
    MissingFile { path: PathBuf },

    #[error("{} is missing required column(s): {}", path.display(), missing.join(", "))]
    Schema { path: PathBuf, missing: Vec<String> },

    #[error("failed to read {}: {source}", path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("failed to open {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Recoverable errors raised by a single engine query.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    #[error("no measurements for city '{city}' in {period} with the selected zone types")]
    NoData { city: String, period: Period },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PeriodParseError {
    #[error("expected a period like 2023-06, got '{0}'")]
    Format(String),

    #[error("year must be between 0 and 9999, got {0}")]
    Year(i32),

    #[error("month must be between 1 and 12, got {0}")]
    Month(u32),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown zone type '{0}' (expected Commercial, Residential, Silence or Industrial)")]
pub struct ZoneParseError(pub String);
