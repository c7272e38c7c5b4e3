//! CSV loader for metered load / PV uploads.

use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDateTime};
use thiserror::Error;
use tracing::{debug, info};

use crate::error::{ConfigurationError, Error, ValidationError};
use crate::sim::types::{DEFAULT_DT_HOURS, Sample, TimeSeries, Timestamp, naive_timestamp};

/// Layouts tried, in order, when no timestamp format is configured.
const TIMESTAMP_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%d-%m-%Y %H:%M:%S",
    "%d-%m-%Y %H:%M",
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
];

/// Failure to turn a CSV upload into a [`TimeSeries`].
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("cannot read \"{}\": {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
}

impl From<Error> for LoadError {
    fn from(e: Error) -> Self {
        match e {
            Error::Configuration(e) => Self::Configuration(e),
            Error::Validation(e) => Self::Validation(e),
        }
    }
}

/// How to interpret an upload.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadOptions {
    /// Sample duration in hours.
    pub dt_hours: f64,
    /// Explicit `strftime` layout of the timestamp column.
    pub timestamp_format: Option<String>,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            dt_hours: DEFAULT_DT_HOURS,
            timestamp_format: None,
        }
    }
}

/// Loads a CSV file into a validated series.
///
/// # Errors
///
/// Returns a `LoadError` if the file cannot be opened, is not valid CSV, or
/// its content fails validation.
pub fn load_csv(path: &Path, options: &LoadOptions) -> Result<TimeSeries, LoadError> {
    let file = File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let series = read_csv(file, options)?;
    info!(
        path = %path.display(),
        samples = series.len(),
        dt_hours = series.dt_hours(),
        "loaded input series"
    );
    Ok(series)
}

/// Column positions resolved from the header row.
struct Columns {
    timestamp: usize,
    load: usize,
    pv: usize,
    price: Option<usize>,
}

impl Columns {
    fn resolve(headers: &csv::StringRecord) -> Result<Self, ValidationError> {
        let find = |names: &[&str]| {
            headers
                .iter()
                .position(|h| names.iter().any(|n| h.trim().eq_ignore_ascii_case(n)))
        };
        let require = |field: &str, names: &[&str]| {
            find(names).ok_or_else(|| {
                ValidationError::new(
                    field,
                    format!("missing column (expected one of: {})", names.join(", ")),
                )
            })
        };
        Ok(Self {
            timestamp: require("timestamp", &["timestamp", "datetime"])?,
            load: require("load", &["load"])?,
            pv: require("pv_production", &["pv_production", "pv"])?,
            price: find(&["price"]),
        })
    }
}

/// Reads CSV from any reader into a validated series.
///
/// The header row is required; column names are matched case-insensitively.
/// Empty `price` cells mean no price for that sample.
///
/// # Errors
///
/// Returns a `LoadError` naming the column and 1-based data row of the first
/// problem found.
pub fn read_csv(reader: impl Read, options: &LoadOptions) -> Result<TimeSeries, LoadError> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let columns = Columns::resolve(rdr.headers()?)?;
    debug!(
        has_price = columns.price.is_some(),
        "resolved input columns"
    );

    let format = options.timestamp_format.as_deref();
    let mut samples = Vec::new();
    for (i, record) in rdr.records().enumerate() {
        let record = record?;
        let row = i + 1;
        let cell = |index: usize| record.get(index).unwrap_or("");

        let timestamp = parse_timestamp(cell(columns.timestamp), format).ok_or_else(|| {
            ValidationError::new(
                "timestamp",
                format!("row {row}: cannot parse \"{}\"", cell(columns.timestamp)),
            )
        })?;
        let load_kw = parse_number("load", row, cell(columns.load))?;
        let pv_kw = parse_number("pv_production", row, cell(columns.pv))?;
        let price = match columns.price.map(cell) {
            Some(raw) if !raw.is_empty() => Some(parse_number("price", row, raw)?),
            _ => None,
        };

        samples.push(Sample {
            timestamp,
            load_kw,
            pv_kw,
            price,
        });
    }

    Ok(TimeSeries::new(samples, options.dt_hours)?)
}

fn parse_number(field: &str, row: usize, raw: &str) -> Result<f64, ValidationError> {
    raw.parse::<f64>()
        .map_err(|_| ValidationError::new(field, format!("row {row}: not a number: \"{raw}\"")))
}

/// Parses a timestamp cell.
///
/// With `format` only that layout is tried. Otherwise RFC 3339 is tried
/// first, keeping its offset, and then the ISO and day-first layouts in
/// order. Naive layouts are read at UTC offset zero.
pub fn parse_timestamp(raw: &str, format: Option<&str>) -> Option<Timestamp> {
    let raw = raw.trim();
    if let Some(format) = format {
        return NaiveDateTime::parse_from_str(raw, format)
            .ok()
            .map(naive_timestamp);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt);
    }
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|f| NaiveDateTime::parse_from_str(raw, f).ok())
        .map(naive_timestamp)
}
