//! CSV loader for the station metadata and monthly measurement files.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use csv::{ErrorKind, ReaderBuilder, Trim};
use flate2::read::GzDecoder;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use crate::dataset::{Dataset, LoadSummary};
use crate::error::LoadError;
use crate::model::{Measurement, Period, Station, ZoneType};

pub const STATION_COLUMNS: [&str; 5] = ["Station", "City", "Type", "DayLimit", "NightLimit"];
pub const MEASUREMENT_COLUMNS: [&str; 5] = ["Station", "Year", "Month", "Day", "Night"];

#[derive(Debug, Deserialize)]
struct StationRow {
    #[serde(rename = "Station")]
    id: String,
    #[serde(rename = "Name")]
    name: Option<String>,
    #[serde(rename = "City")]
    city: String,
    #[serde(rename = "Type")]
    zone: String,
    #[serde(rename = "DayLimit")]
    day_limit: Option<f64>,
    #[serde(rename = "NightLimit")]
    night_limit: Option<f64>,
}

impl StationRow {
    /// Fails only on an unknown zone type. Empty ids and non-finite limits
    /// are rejected when the dataset is joined.
    fn into_station(self) -> Option<Station> {
        let zone: ZoneType = self.zone.parse().ok()?;
        let (default_day, default_night) = zone.default_limits();
        let day_limit = self.day_limit.unwrap_or(default_day);
        let night_limit = self.night_limit.unwrap_or(default_night);
        let name = self
            .name
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| self.id.clone());

        Some(Station {
            id: self.id,
            name,
            city: self.city,
            zone,
            day_limit,
            night_limit,
        })
    }
}

#[derive(Debug, Deserialize)]
struct MeasurementRow {
    #[serde(rename = "Station")]
    station_id: String,
    #[serde(rename = "Year")]
    year: i32,
    #[serde(rename = "Month")]
    month: u32,
    #[serde(rename = "Day")]
    day: f64,
    #[serde(rename = "Night")]
    night: f64,
}

impl MeasurementRow {
    fn into_measurement(self) -> Option<Measurement> {
        let period = Period::new(self.year, self.month).ok()?;
        Some(Measurement {
            station_id: self.station_id,
            period,
            day: self.day,
            night: self.night,
        })
    }
}

/// Loads both sources and joins them into a [`Dataset`].
///
/// Malformed rows are dropped and counted in the dataset's [`LoadSummary`].
///
/// # Errors
///
/// [`LoadError::MissingFile`] when either path does not exist,
/// [`LoadError::Schema`] when a required column is absent, and
/// [`LoadError::Csv`]/[`LoadError::Io`] on read failures.
#[tracing::instrument(skip_all, fields(stations = %stations_path.display(), measurements = %measurements_path.display()))]
pub fn load_dataset(stations_path: &Path, measurements_path: &Path) -> Result<Dataset, LoadError> {
    let (station_rows, malformed_stations) =
        read_rows(stations_path, &STATION_COLUMNS, StationRow::into_station)?;
    let (measurement_rows, malformed_measurements) = read_rows(
        measurements_path,
        &MEASUREMENT_COLUMNS,
        MeasurementRow::into_measurement,
    )?;

    let summary = LoadSummary {
        station_rows: station_rows.len() + malformed_stations,
        measurement_rows: measurement_rows.len() + malformed_measurements,
        malformed_stations,
        malformed_measurements,
        ..Default::default()
    };
    let dataset = Dataset::join(station_rows, measurement_rows, summary);

    let summary = dataset.summary();
    info!(
        stations = dataset.stations().count(),
        records = dataset.records().len(),
        "Dataset loaded"
    );
    if summary.dropped() > 0 {
        warn!(
            dropped = summary.dropped(),
            malformed_stations = summary.malformed_stations,
            malformed_measurements = summary.malformed_measurements,
            duplicate_stations = summary.duplicate_stations,
            duplicate_measurements = summary.duplicate_measurements,
            orphan_measurements = summary.orphan_measurements,
            "Rows excluded while loading"
        );
    }

    Ok(dataset)
}

/// Reads and converts every row of `path`, returning kept items and the
/// number of rows that failed to parse or convert.
fn read_rows<R, T>(
    path: &Path,
    required: &[&str],
    convert: impl Fn(R) -> Option<T>,
) -> Result<(Vec<T>, usize), LoadError>
where
    R: DeserializeOwned,
{
    let source = open_source(path)?;
    let mut rdr = ReaderBuilder::new().trim(Trim::All).from_reader(source);

    let headers = rdr.headers().map_err(|source| LoadError::Csv {
        path: path.to_path_buf(),
        source,
    })?;
    let missing: Vec<String> = required
        .iter()
        .filter(|col| !headers.iter().any(|h| h == **col))
        .map(|col| col.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(LoadError::Schema {
            path: path.to_path_buf(),
            missing,
        });
    }

    let mut rows = Vec::new();
    let mut malformed = 0;
    for result in rdr.deserialize::<R>() {
        match result {
            Ok(raw) => match convert(raw) {
                Some(row) => rows.push(row),
                None => malformed += 1,
            },
            Err(e) if is_row_error(&e) => {
                debug!(path = %path.display(), error = %e, "Malformed row dropped");
                malformed += 1;
            }
            Err(source) => {
                return Err(LoadError::Csv {
                    path: path.to_path_buf(),
                    source,
                });
            }
        }
    }

    Ok((rows, malformed))
}

/// Errors confined to a single record; anything else aborts the load.
fn is_row_error(e: &csv::Error) -> bool {
    matches!(
        e.kind(),
        ErrorKind::Deserialize { .. } | ErrorKind::UnequalLengths { .. } | ErrorKind::Utf8 { .. }
    )
}

/// Opens `path`, gunzipping it when the name ends in `.gz`.
fn open_source(path: &Path) -> Result<Box<dyn Read>, LoadError> {
    if !path.exists() {
        return Err(LoadError::MissingFile {
            path: path.to_path_buf(),
        });
    }
    let file = File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let reader = BufReader::new(file);

    if path.extension().and_then(|e| e.to_str()) == Some("gz") {
        Ok(Box::new(GzDecoder::new(reader)))
    } else {
        Ok(Box::new(reader))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_missing_file() {
        let dir = TempDir::new().unwrap();
        let stations = write(&dir, "stations.csv", "Station,City,Type,DayLimit,NightLimit\n");
        let err = load_dataset(&stations, &dir.path().join("nope.csv")).unwrap_err();
        assert!(matches!(err, LoadError::MissingFile { .. }));
    }

    #[test]
    fn test_schema_error_lists_every_missing_column() {
        let dir = TempDir::new().unwrap();
        let stations = write(&dir, "stations.csv", "Station,City,Zone\nA,Delhi,Silence\n");
        let measurements = write(&dir, "m.csv", "Station,Year,Month,Day,Night\n");

        match load_dataset(&stations, &measurements).unwrap_err() {
            LoadError::Schema { missing, .. } => {
                assert_eq!(missing, vec!["Type", "DayLimit", "NightLimit"]);
            }
            other => panic!("expected schema error, got {other:?}"),
        }
    }

    #[test]
    fn test_malformed_rows_are_dropped_and_counted() {
        let dir = TempDir::new().unwrap();
        let stations = write(
            &dir,
            "stations.csv",
            "Station,Name,City,Type,DayLimit,NightLimit\n\
             A,Alpha,Delhi,Residential,55,45\n\
             B,,Delhi,Airport,55,45\n\
             ,Nameless,Delhi,Silence,50,40\n\
             C,Gamma,Delhi,Commercial,,\n",
        );
        let measurements = write(
            &dir,
            "m.csv",
            "Station,Year,Month,Day,Night\n\
             A,2023,6,60.0,40.0\n\
             A,2023,7,loud,40.0\n\
             A,2023,13,50.0,40.0\n\
             A,10000,1,50.0,40.0\n\
             C,2023,6,,50.0\n\
             C,2023,6,70.0\n\
             C,2023,5,NaN,50.0\n\
             C,2023,7,66.5,50.2\n",
        );

        let ds = load_dataset(&stations, &measurements).unwrap();
        let summary = ds.summary();
        assert_eq!(summary.malformed_stations, 2);
        assert_eq!(summary.malformed_measurements, 6);
        assert_eq!(ds.records().len(), 2);

        let gamma = ds.station("C").unwrap();
        assert_eq!(gamma.day_limit, 65.0);
        assert_eq!(gamma.night_limit, 55.0);
        assert_eq!(ds.station("A").unwrap().name, "Alpha");
    }

    #[test]
    fn test_name_column_is_optional() {
        let dir = TempDir::new().unwrap();
        let stations = write(
            &dir,
            "stations.csv",
            "Station,City,Type,DayLimit,NightLimit\nA,Delhi,Silence,50,40\n",
        );
        let measurements = write(&dir, "m.csv", "Station,Year,Month,Day,Night\nA,2023,1,45,35\n");

        let ds = load_dataset(&stations, &measurements).unwrap();
        assert_eq!(ds.station("A").unwrap().name, "A");
    }

    #[test]
    fn test_gzip_source() {
        use flate2::Compression;
        use flate2::write::GzEncoder;
        use std::io::Write;

        let dir = TempDir::new().unwrap();
        let stations = write(
            &dir,
            "stations.csv",
            "Station,City,Type,DayLimit,NightLimit\nA,Delhi,Silence,50,40\n",
        );
        let gz_path = dir.path().join("m.csv.gz");
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder
            .write_all(b"Station,Year,Month,Day,Night\nA,2023,1,45,35\nA,2023,2,46,36\n")
            .unwrap();
        fs::write(&gz_path, encoder.finish().unwrap()).unwrap();

        let ds = load_dataset(&stations, &gz_path).unwrap();
        assert_eq!(ds.records().len(), 2);
    }
}
