//! CSV export of the annotated sizing series.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use tracing::info;

use crate::sim::types::AnnotatedStep;

/// Column header of the exported series.
const HEADER: &str = "timestamp,load_kw,pv_kw,price,net_load_kw,\
                      battery_power_kw,energy_kwh,soc_kwh,grid_exchange_kw";

/// Timestamp layout of the exported series (local wall clock).
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Exports the annotated series to a CSV file at the given path.
///
/// # Arguments
///
/// * `steps` - Annotated series of a sizing run
/// * `path` - Output file path
///
/// # Errors
///
/// Returns an `io::Error` if file creation or writing fails.
pub fn export_csv(steps: &[AnnotatedStep], path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    let buf = io::BufWriter::new(file);
    write_csv(steps, buf)?;
    info!(path = %path.display(), rows = steps.len(), "exported annotated series");
    Ok(())
}

/// Writes the annotated series as CSV to any writer.
///
/// One header row, then one row per step with 4-decimal values and an empty
/// `price` cell where the input had none. Identical inputs give identical
/// bytes.
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_csv(steps: &[AnnotatedStep], writer: impl Write) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);

    wtr.write_record(HEADER.split(',').map(str::trim))?;

    for s in steps {
        wtr.write_record(&[
            s.timestamp.format(TIMESTAMP_FORMAT).to_string(),
            format!("{:.4}", s.load_kw),
            format!("{:.4}", s.pv_kw),
            s.price.map(|p| format!("{p:.4}")).unwrap_or_default(),
            format!("{:.4}", s.net_load_kw),
            format!("{:.4}", s.battery_power_kw),
            format!("{:.4}", s.energy_kwh),
            format!("{:.4}", s.soc_kwh),
            format!("{:.4}", s.grid_exchange_kw),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}
