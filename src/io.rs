//! CSV and JSON input/output
//!
//! Grain sheets use data-sheet units (Ma, 2SE); values are converted to the
//! model's units on load.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use csv::{ReaderBuilder, Writer, WriterBuilder};
use serde::{Deserialize, Serialize};

use crate::bootstrap::BootstrapConfig;
use crate::measurement::Measurement;
use crate::params::ModelParams;
use crate::reservoir::MotherSample;
use crate::summary::Posterior;
use crate::trajectory::TrajectoryRow;
use crate::{HfError, Result};

pub const OUTPUT_SCHEMA_VERSION: &str = "1.0.0";
pub const DEFAULT_MOTHER_SAMPLE_COLUMN: &str = "176Hf_177Hf";

/// One row of a grain sheet
#[derive(Debug, Clone, Deserialize)]
struct GrainRow {
    #[serde(default)]
    sample: Option<String>,
    u_pb_age: f64,
    age_2se: f64,
    hf_hf: f64,
    hf_hf_2se: f64,
    lu_hf: f64,
    lu_hf_2se: f64,
    #[serde(default)]
    o: Option<f64>,
    #[serde(default)]
    o_sed: Option<f64>,
}

impl GrainRow {
    fn into_measurement(self, record: usize) -> Result<(String, Measurement)> {
        // blank, NaN and zero δ¹⁸O all mean "not measured"
        let oxygen = self
            .o
            .filter(|o| !o.is_nan() && *o != 0.0)
            .map(|o| (o, self.o_sed.unwrap_or(0.0)));
        let measurement = Measurement::from_lab_units(
            self.u_pb_age,
            self.age_2se,
            self.hf_hf,
            self.hf_hf_2se,
            self.lu_hf,
            self.lu_hf_2se,
            oxygen,
        )?;
        let name = self
            .sample
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| format!("grain-{record}"));
        Ok((name, measurement))
    }
}

/// Reads a grain sheet into `(sample name, measurement)` pairs.
pub fn read_grains_csv(path: &Path) -> Result<Vec<(String, Measurement)>> {
    let mut reader = ReaderBuilder::new().trim(csv::Trim::All).from_path(path)?;
    reader
        .deserialize::<GrainRow>()
        .enumerate()
        .map(|(i, row)| {
            let record = i + 1;
            row.map_err(HfError::from)
                .and_then(|row| row.into_measurement(record))
                .map_err(|e| e.in_record(record))
        })
        .collect()
}

/// Reads the mantle ¹⁷⁶Hf/¹⁷⁷Hf pool from `column`; blank cells are skipped.
pub fn read_mother_sample_csv(path: &Path, column: &str) -> Result<MotherSample> {
    let mut reader = ReaderBuilder::new().trim(csv::Trim::All).from_path(path)?;
    let index = reader
        .headers()?
        .iter()
        .position(|h| h == column)
        .ok_or_else(|| HfError::MissingColumn {
            column: column.to_string(),
        })?;

    let mut values = Vec::new();
    for (i, record) in reader.records().enumerate() {
        let record = record?;
        let raw = record.get(index).unwrap_or("");
        if raw.is_empty() {
            continue;
        }
        let value: f64 = raw.parse().map_err(|_| {
            HfError::config("mother_sample", format!("cannot parse {raw:?} as a number"))
                .in_record(i + 1)
        })?;
        values.push(value);
    }
    MotherSample::new(values)
}

/// Per-grain posterior summary as written to `summary.csv`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryRow {
    pub sample: String,
    pub age_median: f64,
    pub age_low: f64,
    pub age_high: f64,
    pub epsilon_median: f64,
    pub epsilon_low: f64,
    pub epsilon_high: f64,
    pub age_excluded: usize,
    pub epsilon_excluded: usize,
}

impl SummaryRow {
    pub fn new(sample: impl Into<String>, posterior: &Posterior) -> Self {
        Self {
            sample: sample.into(),
            age_median: posterior.age.median,
            age_low: posterior.age.low,
            age_high: posterior.age.high,
            epsilon_median: posterior.epsilon.median,
            epsilon_low: posterior.epsilon.low,
            epsilon_high: posterior.epsilon.high,
            age_excluded: posterior.age.excluded,
            epsilon_excluded: posterior.epsilon.excluded,
        }
    }
}

pub fn write_summary_csv(path: &Path, rows: &[SummaryRow]) -> Result<()> {
    let mut writer = Writer::from_path(path)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

fn fmt_f64(v: f64) -> String {
    format!("{v:.10}")
}

/// Writes trajectory rows grouped by sample name.
pub fn write_trajectories_csv(path: &Path, groups: &[(String, Vec<TrajectoryRow>)]) -> Result<()> {
    let mut writer = WriterBuilder::new().has_headers(false).from_path(path)?;
    writer.write_record(["sample", "trial", "segment", "age", "epsilon"])?;
    for (sample, rows) in groups {
        for row in rows {
            writer.write_record([
                sample.as_str(),
                &row.trial.to_string(),
                row.segment.as_str(),
                &fmt_f64(row.age),
                &fmt_f64(row.epsilon),
            ])?;
        }
    }
    writer.flush()?;
    Ok(())
}

/// Run description written next to the CSV outputs
#[derive(Debug, Clone, Serialize)]
pub struct Manifest {
    pub schema_version: String,
    pub crate_version: String,
    pub grains: usize,
    pub mantle: String,
    pub mother_sample_len: Option<usize>,
    pub config: BootstrapConfig,
    pub params: ModelParams,
}

impl Manifest {
    pub fn new(
        grains: usize,
        mantle: &str,
        mother_sample_len: Option<usize>,
        config: &BootstrapConfig,
        params: &ModelParams,
    ) -> Self {
        Self {
            schema_version: OUTPUT_SCHEMA_VERSION.to_string(),
            crate_version: env!("CARGO_PKG_VERSION").to_string(),
            grains,
            mantle: mantle.to_string(),
            mother_sample_len,
            config: config.clone(),
            params: params.clone(),
        }
    }
}

pub fn write_manifest_json(path: &Path, manifest: &Manifest) -> Result<()> {
    fs::write(path, serde_json::to_string_pretty(manifest)?)?;
    Ok(())
}

/// Creates `<base>/<UTC timestamp>`, suffixed `-NN` when a run from the same
/// second already exists.
pub fn create_run_dir(base: &Path) -> Result<PathBuf> {
    fs::create_dir_all(base)?;

    let stamp = Utc::now().format("%Y-%m-%dT%H-%M-%SZ").to_string();
    let mut run_dir = base.join(&stamp);
    let mut counter = 1_u32;
    while run_dir.exists() {
        run_dir = base.join(format!("{stamp}-{counter:02}"));
        counter += 1;
    }

    fs::create_dir_all(&run_dir)?;
    Ok(run_dir)
}
