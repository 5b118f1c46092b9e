use std::collections::BTreeSet;

use tracing::debug;

use crate::analyzers::aggregate::{
    find_violations, monthly_trend, summarize, summarize_by_station, summarize_by_zone,
};
use crate::analyzers::types::{Delta, PeriodComparison, Report, WindowSummary, ZoneDelta};
use crate::dataset::Dataset;
use crate::error::QueryError;
use crate::model::{NoiseRecord, Period, ZoneType};

/// The selection a [`Report`] is computed for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    pub city: String,
    pub period: Period,
    pub zones: BTreeSet<ZoneType>,
    /// Earlier periods to difference against, reported in this order.
    pub comparison_periods: Vec<Period>,
}

impl Filter {
    /// All zone types, no comparison periods.
    pub fn new(city: impl Into<String>, period: Period) -> Self {
        Self {
            city: city.into(),
            period,
            zones: ZoneType::ALL.into_iter().collect(),
            comparison_periods: Vec::new(),
        }
    }

    pub fn with_zones(mut self, zones: impl IntoIterator<Item = ZoneType>) -> Self {
        self.zones = zones.into_iter().collect();
        self
    }

    pub fn with_comparisons(mut self, periods: impl IntoIterator<Item = Period>) -> Self {
        self.comparison_periods = periods.into_iter().collect();
        self
    }
}

/// Records of `city` (case-insensitive exact match) in one of `zones`.
fn scope<'a>(dataset: &'a Dataset, city: &str, zones: &BTreeSet<ZoneType>) -> Vec<&'a NoiseRecord> {
    let city = city.to_lowercase();
    dataset
        .records()
        .iter()
        .filter(|r| zones.contains(&r.station.zone) && r.station.city.to_lowercase() == city)
        .collect()
}

fn in_period<'a>(records: &[&'a NoiseRecord], period: Period) -> Vec<&'a NoiseRecord> {
    records
        .iter()
        .copied()
        .filter(|r| r.period == period)
        .collect()
}

/// Computes the report for `filter` against `dataset`.
///
/// The result depends only on its arguments, so repeated calls return
/// identical reports.
///
/// # Errors
///
/// [`QueryError::NoData`] when no record of the city and zones exists for
/// the selected period.
#[tracing::instrument(skip_all, fields(city = %filter.city, period = %filter.period))]
pub fn query(dataset: &Dataset, filter: &Filter) -> Result<Report, QueryError> {
    let scoped = scope(dataset, &filter.city, &filter.zones);
    let current = in_period(&scoped, filter.period);

    let Some(overall) = summarize(&current) else {
        return Err(QueryError::NoData {
            city: filter.city.clone(),
            period: filter.period,
        });
    };
    let by_zone = summarize_by_zone(&current);

    let comparisons: Vec<PeriodComparison> = filter
        .comparison_periods
        .iter()
        .map(|&period| {
            let rows = in_period(&scoped, period);
            let summary = summarize(&rows);
            let zones = by_zone
                .iter()
                .map(|z| {
                    let zone_rows: Vec<&NoiseRecord> = rows
                        .iter()
                        .copied()
                        .filter(|r| r.station.zone == z.zone)
                        .collect();
                    ZoneDelta {
                        zone: z.zone,
                        delta: Delta::between(&z.summary, summarize(&zone_rows).as_ref()),
                    }
                })
                .collect();

            PeriodComparison {
                period,
                overall: Delta::between(&overall, summary.as_ref()),
                summary,
                zones,
            }
        })
        .collect();

    let reported: BTreeSet<Period> = std::iter::once(filter.period)
        .chain(filter.comparison_periods.iter().copied())
        .collect();
    let violation_rows: Vec<&NoiseRecord> = scoped
        .iter()
        .copied()
        .filter(|r| reported.contains(&r.period))
        .collect();
    let violations = find_violations(&violation_rows);

    let year_rows: Vec<&NoiseRecord> = scoped
        .iter()
        .copied()
        .filter(|r| r.period.year() == filter.period.year())
        .collect();
    let trend = monthly_trend(&year_rows);

    debug!(
        records = overall.records,
        comparisons = comparisons.len(),
        violations = violations.len(),
        "Report computed"
    );

    Ok(Report {
        city: current[0].station.city.clone(),
        period: filter.period,
        zones: filter.zones.iter().copied().collect(),
        overall,
        by_zone,
        by_station: summarize_by_station(&current),
        comparisons,
        violations,
        trend,
    })
}

/// Aggregates `periods` as one window with a per-month breakdown.
///
/// An empty window yields `overall: None` and no monthly points rather than
/// an error.
#[tracing::instrument(skip_all, fields(city = %city, months = periods.len()))]
pub fn summarize_window(
    dataset: &Dataset,
    city: &str,
    zones: &BTreeSet<ZoneType>,
    periods: &[Period],
) -> WindowSummary {
    let wanted: BTreeSet<Period> = periods.iter().copied().collect();
    let rows: Vec<&NoiseRecord> = scope(dataset, city, zones)
        .into_iter()
        .filter(|r| wanted.contains(&r.period))
        .collect();

    WindowSummary {
        city: rows
            .first()
            .map(|r| r.station.city.clone())
            .unwrap_or_else(|| city.to_string()),
        zones: zones.iter().copied().collect(),
        periods: wanted.into_iter().collect(),
        overall: summarize(&rows),
        monthly: monthly_trend(&rows),
    }
}
