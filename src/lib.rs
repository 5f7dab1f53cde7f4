//! hfage - Hf-isotope crustal model ages for zircon
//!
//! Computes two-stage ¹⁷⁶Lu-¹⁷⁶Hf model ages and ε_Hf(t) for zircon grains
//! and propagates measurement, mantle-reservoir and crustal Lu/Hf
//! uncertainty through the closed-form evolution equations by Monte Carlo
//! resampling.

pub mod bootstrap;
pub mod crust;
pub mod evolution;
pub mod io;
pub mod measurement;
pub mod params;
pub mod reservoir;
pub mod solver;
pub mod summary;
pub mod trajectory;

use thiserror::Error;

// Re-export main types
pub use bootstrap::{
    bootstrap_ages, bootstrap_epsilon, bootstrap_summary, BootstrapConfig, BootstrapRun,
    TrialRecord, UncertaintyFlags, DEFAULT_TRIALS,
};
pub use crust::{estimate_crustal_lu_hf, estimate_crustal_lu_hf_many, OxygenRegime};
pub use evolution::{epsilon, extrapolate, reservoir_lu_from_hf};
pub use measurement::{Measurement, MeasurementColumns, Uncertain};
pub use params::{Calibration, CrustalCalibration, ModelParams, TurnPoints};
pub use reservoir::{MantleSource, MotherSample, Reservoir};
pub use solver::{solve_model_age, solve_model_age_with, solve_model_ages, SolveMethod};
pub use summary::{percentile, Percentiles, Posterior, PosteriorSummary};

#[derive(Debug, Error)]
pub enum HfError {
    #[error("invalid configuration: {field}: {reason}")]
    InvalidConfig { field: &'static str, reason: String },
    #[error("invalid measurement: {field}: {reason}")]
    InvalidMeasurement { field: &'static str, reason: String },
    #[error("record {record}: {source}")]
    InvalidRecord {
        record: usize,
        #[source]
        source: Box<HfError>,
    },
    #[error("{field} length mismatch: expected {expected}, got {got}")]
    ShapeMismatch {
        field: &'static str,
        expected: usize,
        got: usize,
    },
    #[error("mother sample is empty")]
    EmptyMotherSample,
    #[error("mother sample value {index} is not finite: {value}")]
    NonFiniteMotherSample { index: usize, value: f64 },
    #[error("missing column: {column}")]
    MissingColumn { column: String },
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, HfError>;

impl HfError {
    pub(crate) fn config(field: &'static str, reason: impl Into<String>) -> Self {
        HfError::InvalidConfig {
            field,
            reason: reason.into(),
        }
    }

    pub(crate) fn measurement(field: &'static str, reason: impl Into<String>) -> Self {
        HfError::InvalidMeasurement {
            field,
            reason: reason.into(),
        }
    }

    /// Attaches a 1-based record number to an error raised while reading a row.
    pub fn in_record(self, record: usize) -> Self {
        HfError::InvalidRecord {
            record,
            source: Box::new(self),
        }
    }
}
