//! Zircon measurements
//!
//! One `Measurement` per analysed grain: U-Pb age, ¹⁷⁶Hf/¹⁷⁷Hf,
//! ¹⁷⁶Lu/¹⁷⁷Hf and optional δ¹⁸O, each with a 1-sigma standard error.

use rand::Rng;
use rand_distr::StandardNormal;
use serde::{Deserialize, Serialize};

use crate::{HfError, Result};

/// Draws from `Normal(mean, std)`; collapses to `mean` when `apply_error` is
/// off or `std` is zero.
pub(crate) fn sample_normal<R: Rng + ?Sized>(
    rng: &mut R,
    mean: f64,
    std: f64,
    apply_error: bool,
) -> f64 {
    if !apply_error || std == 0.0 {
        return mean;
    }
    let z: f64 = rng.sample(StandardNormal);
    mean + std * z
}

/// Measured value with its 1-sigma standard error
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Uncertain {
    pub value: f64,
    pub sigma: f64,
}

impl Uncertain {
    pub fn new(value: f64, sigma: f64) -> Self {
        Self { value, sigma }
    }

    pub fn exact(value: f64) -> Self {
        Self { value, sigma: 0.0 }
    }

    pub fn draw<R: Rng + ?Sized>(&self, rng: &mut R, apply_error: bool) -> f64 {
        sample_normal(rng, self.value, self.sigma, apply_error)
    }

    fn validate(&self, field: &'static str) -> Result<()> {
        if !self.value.is_finite() {
            return Err(HfError::measurement(
                field,
                format!("value {} is not finite", self.value),
            ));
        }
        if !self.sigma.is_finite() || self.sigma < 0.0 {
            return Err(HfError::measurement(
                field,
                format!("sigma {} must be finite and >= 0", self.sigma),
            ));
        }
        Ok(())
    }
}

/// One zircon analysis
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    /// Crystallization age [Gyr]
    pub u_pb_age: Uncertain,
    /// ¹⁷⁶Hf/¹⁷⁷Hf
    pub hf_hf: Uncertain,
    /// ¹⁷⁶Lu/¹⁷⁷Hf
    pub lu_hf: Uncertain,
    /// δ¹⁸O [‰]; `None` when the grain has no oxygen data. A zero value
    /// also means no data.
    pub oxygen: Option<Uncertain>,
}

impl Measurement {
    pub fn new(
        u_pb_age: Uncertain,
        hf_hf: Uncertain,
        lu_hf: Uncertain,
        oxygen: Option<Uncertain>,
    ) -> Result<Self> {
        let measurement = Self {
            u_pb_age,
            hf_hf,
            lu_hf,
            oxygen: oxygen.filter(|o| o.value != 0.0),
        };
        measurement.validate()?;
        Ok(measurement)
    }

    /// Builds a measurement from data-sheet units: age and its 2SE in Ma,
    /// Hf and Lu ratios with 2SE, δ¹⁸O with 1SE.
    #[allow(clippy::too_many_arguments)]
    pub fn from_lab_units(
        age_ma: f64,
        age_2se_ma: f64,
        hf_hf: f64,
        hf_hf_2se: f64,
        lu_hf: f64,
        lu_hf_2se: f64,
        oxygen: Option<(f64, f64)>,
    ) -> Result<Self> {
        Self::new(
            Uncertain::new(age_ma / 1e3, age_2se_ma / 1e3 / 2.0),
            Uncertain::new(hf_hf, hf_hf_2se / 2.0),
            Uncertain::new(lu_hf, lu_hf_2se / 2.0),
            oxygen.map(|(o, o_se)| Uncertain::new(o, o_se)),
        )
    }

    /// Measured δ¹⁸O, skipping zero and NaN placeholders
    pub fn oxygen_data(&self) -> Option<Uncertain> {
        self.oxygen.filter(|o| o.value != 0.0 && !o.value.is_nan())
    }

    pub fn validate(&self) -> Result<()> {
        self.u_pb_age.validate("u_pb_age")?;
        self.hf_hf.validate("hf_hf")?;
        self.lu_hf.validate("lu_hf")?;
        if let Some(oxygen) = &self.oxygen {
            oxygen.validate("oxygen")?;
        }
        Ok(())
    }
}

/// Column-oriented measurements for a batch of grains
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeasurementColumns {
    pub u_pb_age: Vec<f64>,
    pub u_pb_age_err: Vec<f64>,
    pub hf_hf: Vec<f64>,
    pub hf_hf_err: Vec<f64>,
    pub lu_hf: Vec<f64>,
    pub lu_hf_err: Vec<f64>,
    /// Empty when no grain has oxygen data; NaN marks a missing value.
    pub oxygen: Vec<f64>,
    pub oxygen_err: Vec<f64>,
}

impl MeasurementColumns {
    pub fn len(&self) -> usize {
        self.u_pb_age.len()
    }

    pub fn is_empty(&self) -> bool {
        self.u_pb_age.is_empty()
    }

    pub fn check_shape(&self) -> Result<()> {
        let expected = self.len();
        let mut columns: Vec<(&'static str, usize)> = vec![
            ("u_pb_age_err", self.u_pb_age_err.len()),
            ("hf_hf", self.hf_hf.len()),
            ("hf_hf_err", self.hf_hf_err.len()),
            ("lu_hf", self.lu_hf.len()),
            ("lu_hf_err", self.lu_hf_err.len()),
        ];
        if !self.oxygen.is_empty() || !self.oxygen_err.is_empty() {
            columns.push(("oxygen", self.oxygen.len()));
            columns.push(("oxygen_err", self.oxygen_err.len()));
        }

        for (field, got) in columns {
            if got != expected {
                return Err(HfError::ShapeMismatch {
                    field,
                    expected,
                    got,
                });
            }
        }
        Ok(())
    }

    /// Splits the columns into per-grain measurements. Errors carry the
    /// 1-based record number of the first invalid grain.
    pub fn into_measurements(self) -> Result<Vec<Measurement>> {
        self.check_shape()?;
        let has_oxygen = !self.oxygen.is_empty();

        (0..self.len())
            .map(|i| {
                let oxygen = if has_oxygen && !self.oxygen[i].is_nan() {
                    Some(Uncertain::new(self.oxygen[i], self.oxygen_err[i]))
                } else {
                    None
                };
                Measurement::new(
                    Uncertain::new(self.u_pb_age[i], self.u_pb_age_err[i]),
                    Uncertain::new(self.hf_hf[i], self.hf_hf_err[i]),
                    Uncertain::new(self.lu_hf[i], self.lu_hf_err[i]),
                    oxygen,
                )
                .map_err(|e| e.in_record(i + 1))
            })
            .collect()
    }
}
