use crate::analyzers::types::{LevelSummary, StationSummary, TrendPoint, Violation, ZoneSummary};
use crate::analyzers::utility::{max, mean, pct};
use crate::model::{LimitKind, NoiseRecord, Period, ZoneType};
use std::collections::{BTreeMap, BTreeSet};

/// Summarizes a set of records. Returns `None` when `records` is empty so
/// callers cannot mistake "no data" for zero levels.
///
/// Means are unweighted over records; each exceeded dimension of a record
/// counts as one violation.
pub fn summarize(records: &[&NoiseRecord]) -> Option<LevelSummary> {
    if records.is_empty() {
        return None;
    }

    let days: Vec<f64> = records.iter().map(|r| r.day).collect();
    let nights: Vec<f64> = records.iter().map(|r| r.night).collect();

    let day_violations = records
        .iter()
        .filter(|r| r.excess(LimitKind::Day).is_some())
        .count();
    let night_violations = records
        .iter()
        .filter(|r| r.excess(LimitKind::Night).is_some())
        .count();
    let violations = day_violations + night_violations;

    let stations: BTreeSet<&str> = records.iter().map(|r| r.station.id.as_str()).collect();

    Some(LevelSummary {
        records: records.len(),
        stations: stations.len(),
        mean_day: mean(&days),
        mean_night: mean(&nights),
        max_day: max(&days),
        max_night: max(&nights),
        day_violations,
        night_violations,
        violations,
        violation_rate: pct(violations, records.len() * 2),
    })
}

/// One summary per zone type present in `records`, in zone order.
pub fn summarize_by_zone(records: &[&NoiseRecord]) -> Vec<ZoneSummary> {
    let mut groups: BTreeMap<ZoneType, Vec<&NoiseRecord>> = BTreeMap::new();
    for &r in records {
        groups.entry(r.station.zone).or_default().push(r);
    }

    groups
        .into_iter()
        .filter_map(|(zone, rows)| summarize(&rows).map(|summary| ZoneSummary { zone, summary }))
        .collect()
}

/// One summary per station, loudest mean day level first; ties by station id.
pub fn summarize_by_station(records: &[&NoiseRecord]) -> Vec<StationSummary> {
    let mut groups: BTreeMap<&str, Vec<&NoiseRecord>> = BTreeMap::new();
    for &r in records {
        groups.entry(r.station.id.as_str()).or_default().push(r);
    }

    let mut stations: Vec<StationSummary> = groups
        .into_values()
        .filter_map(|rows| {
            let station = &rows.first()?.station;
            let summary = summarize(&rows)?;
            Some(StationSummary {
                station_id: station.id.clone(),
                name: station.name.clone(),
                zone: station.zone,
                day_limit: station.day_limit,
                night_limit: station.night_limit,
                summary,
            })
        })
        .collect();

    stations.sort_by(|a, b| {
        b.summary
            .mean_day
            .total_cmp(&a.summary.mean_day)
            .then_with(|| a.station_id.cmp(&b.station_id))
    });
    stations
}

/// Every exceeded limit in `records`, sorted by [`sort_violations`].
pub fn find_violations(records: &[&NoiseRecord]) -> Vec<Violation> {
    let mut violations: Vec<Violation> = records
        .iter()
        .flat_map(|r| {
            [LimitKind::Day, LimitKind::Night]
                .into_iter()
                .filter_map(move |kind| {
                    r.excess(kind).map(|excess| Violation {
                        station_id: r.station.id.clone(),
                        station_name: r.station.name.clone(),
                        zone: r.station.zone,
                        period: r.period,
                        kind,
                        measured: r.level(kind),
                        limit: r.station.limit(kind),
                        excess,
                    })
                })
        })
        .collect();

    sort_violations(&mut violations);
    violations
}

/// Largest excess first, then station id, period and day before night.
pub fn sort_violations(violations: &mut [Violation]) {
    violations.sort_by(|a, b| {
        b.excess
            .total_cmp(&a.excess)
            .then_with(|| a.station_id.cmp(&b.station_id))
            .then_with(|| a.period.cmp(&b.period))
            .then_with(|| a.kind.cmp(&b.kind))
    });
}

/// Mean day and night levels per period, in chronological order.
pub fn monthly_trend(records: &[&NoiseRecord]) -> Vec<TrendPoint> {
    let mut groups: BTreeMap<Period, Vec<&NoiseRecord>> = BTreeMap::new();
    for &r in records {
        groups.entry(r.period).or_default().push(r);
    }

    groups
        .into_iter()
        .map(|(period, rows)| {
            let days: Vec<f64> = rows.iter().map(|r| r.day).collect();
            let nights: Vec<f64> = rows.iter().map(|r| r.night).collect();
            TrendPoint {
                period,
                month_name: period.month_name(),
                records: rows.len(),
                mean_day: mean(&days),
                mean_night: mean(&nights),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Station;
    use std::sync::Arc;

    fn station(id: &str, zone: ZoneType) -> Arc<Station> {
        let (day_limit, night_limit) = zone.default_limits();
        Arc::new(Station {
            id: id.into(),
            name: id.to_lowercase(),
            city: "Delhi".into(),
            zone,
            day_limit,
            night_limit,
        })
    }

    fn record(station: &Arc<Station>, month: u32, day: f64, night: f64) -> NoiseRecord {
        NoiseRecord {
            station: Arc::clone(station),
            period: Period::new(2023, month).unwrap(),
            day,
            night,
        }
    }

    #[test]
    fn test_summarize_empty_is_none() {
        assert!(summarize(&[]).is_none());
    }

    #[test]
    fn test_summarize_counts_each_dimension() {
        let a = station("A", ZoneType::Residential);
        let b = station("B", ZoneType::Residential);
        let rows = [record(&a, 6, 60.0, 50.0), record(&b, 6, 50.0, 40.0)];
        let refs: Vec<&NoiseRecord> = rows.iter().collect();

        let s = summarize(&refs).unwrap();
        assert_eq!(s.records, 2);
        assert_eq!(s.stations, 2);
        assert_eq!(s.mean_day, 55.0);
        assert_eq!(s.mean_night, 45.0);
        assert_eq!(s.max_day, 60.0);
        assert_eq!(s.day_violations, 1);
        assert_eq!(s.night_violations, 1);
        assert_eq!(s.violations, 2);
        assert_eq!(s.violation_rate, 50.0);
    }

    #[test]
    fn test_level_equal_to_limit_is_not_a_violation() {
        let a = station("A", ZoneType::Silence);
        let rows = [record(&a, 6, 50.0, 40.0)];
        let refs: Vec<&NoiseRecord> = rows.iter().collect();

        assert!(find_violations(&refs).is_empty());
        assert_eq!(summarize(&refs).unwrap().violations, 0);
    }

    #[test]
    fn test_by_zone_is_unweighted_mean_per_zone() {
        let a = station("A", ZoneType::Residential);
        let b = station("B", ZoneType::Residential);
        let c = station("C", ZoneType::Commercial);
        let rows = [
            record(&a, 6, 52.0, 42.0),
            record(&b, 6, 58.0, 44.0),
            record(&c, 6, 70.0, 60.0),
        ];
        let refs: Vec<&NoiseRecord> = rows.iter().collect();

        let zones = summarize_by_zone(&refs);
        assert_eq!(zones.len(), 2);
        assert_eq!(zones[0].zone, ZoneType::Commercial);
        assert_eq!(zones[1].zone, ZoneType::Residential);
        assert_eq!(zones[1].summary.mean_day, 55.0);
        assert_eq!(zones[1].summary.mean_night, 43.0);
    }

    #[test]
    fn test_by_station_orders_loudest_first_with_id_tiebreak() {
        let a = station("A", ZoneType::Residential);
        let b = station("B", ZoneType::Residential);
        let c = station("C", ZoneType::Commercial);
        let rows = [
            record(&c, 6, 60.0, 50.0),
            record(&b, 6, 70.0, 40.0),
            record(&a, 6, 60.0, 40.0),
        ];
        let refs: Vec<&NoiseRecord> = rows.iter().collect();

        let ids: Vec<String> = summarize_by_station(&refs)
            .into_iter()
            .map(|s| s.station_id)
            .collect();
        assert_eq!(ids, vec!["B", "A", "C"]);
    }

    #[test]
    fn test_violations_sorted_by_excess_then_station() {
        let a = station("A", ZoneType::Residential);
        let b = station("B", ZoneType::Residential);
        let rows = [
            record(&b, 6, 58.0, 48.0),
            record(&a, 6, 58.0, 52.0),
        ];
        let refs: Vec<&NoiseRecord> = rows.iter().collect();

        let v = find_violations(&refs);
        let keys: Vec<(&str, LimitKind, f64)> = v
            .iter()
            .map(|v| (v.station_id.as_str(), v.kind, v.excess))
            .collect();
        assert_eq!(
            keys,
            vec![
                ("A", LimitKind::Night, 7.0),
                ("A", LimitKind::Day, 3.0),
                ("B", LimitKind::Day, 3.0),
                ("B", LimitKind::Night, 3.0),
            ]
        );
        assert!(v.iter().all(|v| v.excess > 0.0));
    }

    #[test]
    fn test_monthly_trend_is_chronological() {
        let a = station("A", ZoneType::Residential);
        let b = station("B", ZoneType::Residential);
        let rows = [
            record(&a, 7, 50.0, 40.0),
            record(&a, 3, 54.0, 44.0),
            record(&b, 3, 56.0, 46.0),
        ];
        let refs: Vec<&NoiseRecord> = rows.iter().collect();

        let trend = monthly_trend(&refs);
        assert_eq!(trend.len(), 2);
        assert_eq!(trend[0].month_name, "March");
        assert_eq!(trend[0].records, 2);
        assert_eq!(trend[0].mean_day, 55.0);
        assert_eq!(trend[1].period, Period::new(2023, 7).unwrap());
    }
}
