//! The joined, read-only station/measurement table.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::Arc;

use tracing::debug;

use crate::model::{Measurement, NoiseRecord, Period, Station, ZoneType};

/// Counts of rows read and rows excluded while building a [`Dataset`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadSummary {
    pub station_rows: usize,
    pub measurement_rows: usize,

    // exclusions
    pub malformed_stations: usize,
    pub malformed_measurements: usize,
    pub duplicate_stations: usize,
    pub duplicate_measurements: usize,
    pub orphan_measurements: usize,
}

impl LoadSummary {
    pub fn dropped(&self) -> usize {
        self.malformed_stations
            + self.malformed_measurements
            + self.duplicate_stations
            + self.duplicate_measurements
            + self.orphan_measurements
    }
}

/// Stations keyed by identifier plus every measurement joined to its station.
///
/// Records are kept in `(station id, period)` order. Nothing mutates a
/// dataset after it is built.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    stations: BTreeMap<String, Arc<Station>>,
    records: Vec<NoiseRecord>,
    summary: LoadSummary,
}

impl Dataset {
    /// Builds a dataset from typed rows.
    ///
    /// Stations with an empty id or city or a non-finite limit, and
    /// measurements with an empty station id or a non-finite level, are
    /// counted as malformed and dropped. So are duplicate stations,
    /// duplicate `(station, period)` measurements and measurements whose
    /// station is unknown.
    pub fn from_parts(stations: Vec<Station>, measurements: Vec<Measurement>) -> Self {
        let summary = LoadSummary {
            station_rows: stations.len(),
            measurement_rows: measurements.len(),
            ..Default::default()
        };
        Self::join(stations, measurements, summary)
    }

    pub(crate) fn join(
        stations: Vec<Station>,
        measurements: Vec<Measurement>,
        mut summary: LoadSummary,
    ) -> Self {
        let mut by_id: BTreeMap<String, Arc<Station>> = BTreeMap::new();
        for station in stations {
            if !is_valid_station(&station) {
                debug!(station_id = %station.id, "Malformed station dropped");
                summary.malformed_stations += 1;
                continue;
            }
            if by_id.contains_key(&station.id) {
                debug!(station_id = %station.id, "Duplicate station row dropped");
                summary.duplicate_stations += 1;
                continue;
            }
            by_id.insert(station.id.clone(), Arc::new(station));
        }

        let mut seen: HashSet<(String, Period)> = HashSet::new();
        let mut records = Vec::with_capacity(measurements.len());
        for m in measurements {
            if !is_valid_measurement(&m) {
                debug!(station_id = %m.station_id, period = %m.period, "Malformed measurement dropped");
                summary.malformed_measurements += 1;
                continue;
            }
            let Some(station) = by_id.get(&m.station_id) else {
                debug!(station_id = %m.station_id, period = %m.period, "Orphan measurement dropped");
                summary.orphan_measurements += 1;
                continue;
            };
            if !seen.insert((m.station_id.clone(), m.period)) {
                debug!(station_id = %m.station_id, period = %m.period, "Duplicate measurement dropped");
                summary.duplicate_measurements += 1;
                continue;
            }
            records.push(NoiseRecord {
                station: Arc::clone(station),
                period: m.period,
                day: m.day,
                night: m.night,
            });
        }

        records.sort_by(|a, b| {
            a.station
                .id
                .cmp(&b.station.id)
                .then_with(|| a.period.cmp(&b.period))
        });

        Self {
            stations: by_id,
            records,
            summary,
        }
    }

    pub fn records(&self) -> &[NoiseRecord] {
        &self.records
    }

    pub fn station(&self, id: &str) -> Option<&Station> {
        self.stations.get(id).map(Arc::as_ref)
    }

    pub fn stations(&self) -> impl Iterator<Item = &Station> {
        self.stations.values().map(Arc::as_ref)
    }

    pub fn summary(&self) -> &LoadSummary {
        &self.summary
    }

    /// Distinct city names, sorted.
    pub fn cities(&self) -> Vec<String> {
        self.stations
            .values()
            .map(|s| s.city.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Zone types that at least one station belongs to, sorted.
    pub fn zone_types(&self) -> Vec<ZoneType> {
        self.stations
            .values()
            .map(|s| s.zone)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Distinct measurement periods, sorted.
    pub fn periods(&self) -> Vec<Period> {
        self.records
            .iter()
            .map(|r| r.period)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

fn is_valid_station(station: &Station) -> bool {
    !station.id.is_empty()
        && !station.city.is_empty()
        && station.day_limit.is_finite()
        && station.night_limit.is_finite()
}

fn is_valid_measurement(m: &Measurement) -> bool {
    !m.station_id.is_empty() && m.day.is_finite() && m.night.is_finite()
}
