// ============================================================
// Layer 4 — Driving Log Loader
// ============================================================
// Reads the simulator's driving_log.csv using the csv crate.
//
// Row layout:
//   center_path, left_path, right_path, steering, throttle, brake, speed
//
// Only columns 0–3 are used. Some logs start with a header row
// ("center,left,right,steering,...") and some don't, so the
// first row is treated as a header when its steering column is
// not a number. Any later row that fails to parse is an error.
//
// Reference: csv crate documentation
//            Rust Book §9 (Error Handling)

use anyhow::{bail, Context, Result};
use csv::{ReaderBuilder, StringRecord, Trim};
use std::{fs::File, path::PathBuf};

use crate::domain::record::DrivingRecord;
use crate::domain::traits::RecordSource;

/// Steering angle is the fourth column
const STEERING_COLUMN: usize = 3;

/// Loads every record from a driving-log CSV file.
pub struct DrivingLogLoader {
    path: PathBuf,
}

impl DrivingLogLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl RecordSource for DrivingLogLoader {
    fn load_all(&self) -> Result<Vec<DrivingRecord>> {
        tracing::info!("Loading driving log from '{}'", self.path.display());

        let file = File::open(&self.path)
            .with_context(|| format!("Cannot open driving log '{}'", self.path.display()))?;

        // Header detection is done by hand, so the reader must not
        // swallow the first row. Rows may carry extra columns.
        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .trim(Trim::All)
            .from_reader(file);

        let mut records = Vec::new();
        let mut rows    = 0usize;

        for (index, row) in reader.records().enumerate() {
            let line = index + 1;
            let row  = row.with_context(|| {
                format!("Malformed CSV at line {} of '{}'", line, self.path.display())
            })?;
            rows += 1;

            match parse_row(&row) {
                Ok(record) => records.push(record),
                Err(_) if index == 0 && row.len() > STEERING_COLUMN => {
                    tracing::debug!("Skipping header row: {:?}", row);
                }
                Err(e) => {
                    return Err(e).with_context(|| {
                        format!("Bad record at line {} of '{}'", line, self.path.display())
                    });
                }
            }
        }

        tracing::info!("Total lines in CSV: {} ({} records)", rows, records.len());
        Ok(records)
    }
}

/// Turn one CSV row into a DrivingRecord
fn parse_row(row: &StringRecord) -> Result<DrivingRecord> {
    if row.len() <= STEERING_COLUMN {
        bail!("expected at least {} columns, found {}", STEERING_COLUMN + 1, row.len());
    }

    let steering_raw = &row[STEERING_COLUMN];
    let steering: f32 = steering_raw
        .parse()
        .with_context(|| format!("steering value '{}' is not a number", steering_raw))?;

    Ok(DrivingRecord::new(&row[0], &row[1], &row[2], steering))
}
