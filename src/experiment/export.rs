//! JSON Lines export of experiment results

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::Serialize;

use crate::core::error::{Result, SimError};
use crate::experiment::ParameterRow;
use crate::simulation::{LandlordRecord, RunOutput};

pub const PARAMETERS_FILE: &str = "parameters.jsonl";
pub const UNITS_FILE: &str = "unit_raw.jsonl";

/// Landlord record tagged with the run it came from
#[derive(Debug, Serialize)]
pub struct UnitRow<'a> {
    pub sample_id: &'a str,
    #[serde(flatten)]
    pub record: &'a LandlordRecord,
}

/// Write one JSON document per line
pub fn write_jsonl<T: Serialize, W: Write>(writer: &mut W, rows: &[T]) -> Result<()> {
    for row in rows {
        serde_json::to_writer(&mut *writer, row)?;
        writer.write_all(b"\n")?;
    }
    Ok(())
}

/// Unit-table writer shared by the worker threads
///
/// Runs finish in any order; each run's rows are written as one block.
pub struct JsonlSink {
    dir: PathBuf,
    units: Mutex<BufWriter<File>>,
}

impl JsonlSink {
    pub fn create(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        let units = BufWriter::new(File::create(dir.join(UNITS_FILE))?);
        Ok(Self {
            dir,
            units: Mutex::new(units),
        })
    }

    pub fn write_run(&self, row: &ParameterRow, output: RunOutput) -> Result<()> {
        let rows: Vec<UnitRow<'_>> = output
            .records
            .iter()
            .map(|record| UnitRow {
                sample_id: &row.sample_id,
                record,
            })
            .collect();
        let mut units = self
            .units
            .lock()
            .map_err(|_| poisoned())?;
        write_jsonl(&mut *units, &rows)
    }

    /// Write the parameter table and flush the unit table
    pub fn finish(self, parameters: &[ParameterRow]) -> Result<PathBuf> {
        let mut writer = BufWriter::new(File::create(self.dir.join(PARAMETERS_FILE))?);
        write_jsonl(&mut writer, parameters)?;
        writer.flush()?;

        let mut units = self
            .units
            .into_inner()
            .map_err(|_| poisoned())?;
        units.flush()?;
        Ok(self.dir)
    }
}

fn poisoned() -> SimError {
    SimError::IoError(std::io::Error::new(
        std::io::ErrorKind::Other,
        "unit writer poisoned",
    ))
}
