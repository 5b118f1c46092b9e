//! Output formatting and persistence for engine results.
//!
//! Supports human-readable listings logged through `tracing`, JSON
//! serialization and CSV export of violation lists.

use anyhow::Result;
use serde::Serialize;
use tracing::{debug, info};

use crate::analyzers::types::{Delta, Report, Violation, WindowSummary};
use csv::WriterBuilder;
use std::fs::File;
use std::path::Path;

/// Serializes any engine result as pretty-printed JSON.
pub fn to_json(value: &impl Serialize) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

/// Logs a report as pretty JSON at info level.
pub fn print_json(report: &Report) -> Result<()> {
    info!("{}", to_json(report)?);
    Ok(())
}

fn fmt_delta(delta: &Delta) -> String {
    match delta {
        Delta::Available { day, night } => format!("day {day:+.1} dB, night {night:+.1} dB"),
        Delta::Unavailable => "unavailable".to_string(),
    }
}

/// Logs a report as a readable listing.
pub fn print_pretty(report: &Report) {
    let o = &report.overall;
    info!(
        "{} - {} {}: avg day {:.1} dB, avg night {:.1} dB, {} violation(s) ({:.1}%)",
        report.city,
        report.period.month_name(),
        report.period.year(),
        o.mean_day,
        o.mean_night,
        o.violations,
        o.violation_rate
    );

    for z in &report.by_zone {
        info!(
            "  {:<12} stations {:>2}  day {:>5.1}  night {:>5.1}  violations {}",
            z.zone.as_str(),
            z.summary.stations,
            z.summary.mean_day,
            z.summary.mean_night,
            z.summary.violations
        );
    }

    info!("Stations:");
    for s in &report.by_station {
        info!(
            "  {:<32} {:<12} day {:>5.1}/{:<4.0} night {:>5.1}/{:<4.0}",
            s.name,
            s.zone.as_str(),
            s.summary.mean_day,
            s.day_limit,
            s.summary.mean_night,
            s.night_limit
        );
    }

    for c in &report.comparisons {
        info!("Change vs {}: {}", c.period, fmt_delta(&c.overall));
        for z in &c.zones {
            info!("  {:<12} {}", z.zone.as_str(), fmt_delta(&z.delta));
        }
    }

    if report.violations.is_empty() {
        info!("No limit violations");
    } else {
        info!("Violations:");
        for v in &report.violations {
            info!(
                "  {:<32} {} {:<5} {:.1} dB over ({:.1} > {:.0})",
                v.station_name, v.period, v.kind, v.excess, v.measured, v.limit
            );
        }
    }

    debug!(points = report.trend.len(), "Trend");
    for t in &report.trend {
        debug!(
            "  {:<9} day {:>5.1}  night {:>5.1}",
            t.month_name, t.mean_day, t.mean_night
        );
    }
}

/// Logs a window summary as a readable listing.
pub fn print_window(window: &WindowSummary) {
    let (Some(first), Some(last)) = (window.periods.first(), window.periods.last()) else {
        info!("Empty window");
        return;
    };

    match &window.overall {
        Some(o) => info!(
            "{} {} to {}: avg day {:.1} dB, avg night {:.1} dB, {} violation(s)",
            window.city, first, last, o.mean_day, o.mean_night, o.violations
        ),
        None => info!("{} {} to {}: no measurements", window.city, first, last),
    }

    for t in &window.monthly {
        info!(
            "  {:<9} {}  day {:>5.1}  night {:>5.1}",
            t.month_name,
            t.period.year(),
            t.mean_day,
            t.mean_night
        );
    }
}

/// Writes violations to a CSV file with a header row, replacing any existing file.
pub fn write_violations_csv(path: &Path, violations: &[Violation]) -> Result<()> {
    debug!(path = %path.display(), rows = violations.len(), "Writing violations CSV");

    let file = File::create(path)?;
    let mut writer = WriterBuilder::new().has_headers(true).from_writer(file);

    for v in violations {
        writer.serialize(v)?;
    }
    writer.flush()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::types::LevelSummary;
    use crate::model::{LimitKind, Period, ZoneType};
    use std::fs;

    fn violation(id: &str, kind: LimitKind, excess: f64) -> Violation {
        Violation {
            station_id: id.into(),
            station_name: format!("{id} station"),
            zone: ZoneType::Residential,
            period: Period::new(2023, 6).unwrap(),
            kind,
            measured: 55.0 + excess,
            limit: 55.0,
            excess,
        }
    }

    fn report() -> Report {
        Report {
            city: "Delhi".into(),
            period: Period::new(2023, 6).unwrap(),
            zones: vec![ZoneType::Residential],
            overall: LevelSummary {
                records: 1,
                stations: 1,
                mean_day: 60.0,
                mean_night: 40.0,
                max_day: 60.0,
                max_night: 40.0,
                day_violations: 1,
                night_violations: 0,
                violations: 1,
                violation_rate: 50.0,
            },
            by_zone: vec![],
            by_station: vec![],
            comparisons: vec![],
            violations: vec![violation("A", LimitKind::Day, 5.0)],
            trend: vec![],
        }
    }

    #[test]
    fn test_print_pretty_does_not_panic() {
        print_pretty(&report());
    }

    #[test]
    fn test_print_json_does_not_panic() {
        assert!(print_json(&report()).is_ok());
    }

    #[test]
    fn test_to_json_uses_plain_field_values() {
        let json: serde_json::Value = serde_json::from_str(&to_json(&report()).unwrap()).unwrap();
        assert_eq!(json["period"], "2023-06");
        assert_eq!(json["zones"][0], "Residential");
        assert_eq!(json["violations"][0]["kind"], "day");
        assert_eq!(json["violations"][0]["excess"], 5.0);
    }

    #[test]
    fn test_write_violations_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("violations.csv");

        write_violations_csv(
            &path,
            &[
                violation("A", LimitKind::Night, 7.0),
                violation("B", LimitKind::Day, 2.5),
            ],
        )
        .unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(
            lines[0],
            "station_id,station_name,zone,period,kind,measured,limit,excess"
        );
        assert!(lines[1].starts_with("A,A station,Residential,2023-06,night,"));
    }

    #[test]
    fn test_write_violations_csv_empty_list() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("none.csv");

        write_violations_csv(&path, &[]).unwrap();
        assert!(path.exists());
    }
}
