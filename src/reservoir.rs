//! Reference reservoirs
//!
//! A reservoir is a present-day (¹⁷⁶Hf/¹⁷⁷Hf, ¹⁷⁶Lu/¹⁷⁷Hf) pair. The mantle
//! reservoir a model age is measured against can be a fixed value, a
//! normal distribution or an empirical pool of measured ratios.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::evolution::{epsilon, extrapolate, reservoir_lu_from_hf};
use crate::measurement::sample_normal;
use crate::params::ModelParams;
use crate::summary::percentile;
use crate::{HfError, Result};

/// Present-day isotopic composition of a reservoir
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Reservoir {
    /// ¹⁷⁶Hf/¹⁷⁷Hf
    pub hf: f64,
    /// ¹⁷⁶Lu/¹⁷⁷Hf
    pub lu: f64,
}

impl Reservoir {
    pub fn new(hf: f64, lu: f64) -> Self {
        Self { hf, lu }
    }

    /// Mantle-like reservoir whose Lu/Hf is fixed by meeting CHUR at the
    /// solar-system age.
    pub fn from_hf(params: &ModelParams, hf: f64) -> Self {
        Self {
            hf,
            lu: reservoir_lu_from_hf(params, hf),
        }
    }

    /// ¹⁷⁶Hf/¹⁷⁷Hf at age `t` [Gyr]
    pub fn hf_at(&self, params: &ModelParams, t: f64) -> f64 {
        extrapolate(params, t, self.hf, self.lu)
    }

    /// ε_Hf of the reservoir at age `t` [Gyr]
    pub fn epsilon_at(&self, params: &ModelParams, t: f64) -> f64 {
        epsilon(params, t, self.hf, self.lu)
    }

    pub(crate) fn validate(&self, field: &'static str) -> Result<()> {
        if !self.hf.is_finite() || !self.lu.is_finite() {
            return Err(HfError::config(field, "hf and lu must be finite"));
        }
        Ok(())
    }
}

/// Empirical pool of mantle ¹⁷⁶Hf/¹⁷⁷Hf values for resampling
#[derive(Debug, Clone, PartialEq)]
pub struct MotherSample {
    values: Vec<f64>,
}

impl MotherSample {
    pub fn new(values: Vec<f64>) -> Result<Self> {
        if values.is_empty() {
            return Err(HfError::EmptyMotherSample);
        }
        if let Some((index, &value)) = values.iter().enumerate().find(|(_, v)| !v.is_finite()) {
            return Err(HfError::NonFiniteMotherSample { index, value });
        }
        Ok(Self { values })
    }

    /// Keeps the values strictly between the `low` and `high` percentiles.
    pub fn trimmed(&self, low: f64, high: f64) -> Result<Self> {
        let lo = percentile(&self.values, low);
        let hi = percentile(&self.values, high);
        let kept = self
            .values
            .iter()
            .copied()
            .filter(|&v| v > lo && v < hi)
            .collect();
        Self::new(kept)
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn mean(&self) -> f64 {
        self.values.iter().sum::<f64>() / self.values.len() as f64
    }

    pub fn choose<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        // non-empty by construction
        self.values.choose(rng).copied().unwrap_or(f64::NAN)
    }
}

/// Source of the present-day mantle ¹⁷⁶Hf/¹⁷⁷Hf used for one trial
#[derive(Debug, Clone, PartialEq)]
pub enum MantleSource {
    Fixed(f64),
    Normal { mean: f64, std: f64 },
    MotherSample(MotherSample),
}

impl MantleSource {
    pub fn arc_mantle(params: &ModelParams) -> Self {
        MantleSource::Fixed(params.arc_mantle.hf)
    }

    pub fn depleted_mantle(params: &ModelParams) -> Self {
        MantleSource::Fixed(params.depleted_mantle.hf)
    }

    pub fn validate(&self) -> Result<()> {
        match self {
            MantleSource::Fixed(hf) if !hf.is_finite() => {
                Err(HfError::config("mantle", "fixed Hf must be finite"))
            }
            MantleSource::Normal { mean, std }
                if !mean.is_finite() || !std.is_finite() || *std < 0.0 =>
            {
                Err(HfError::config(
                    "mantle",
                    "mean must be finite and std finite and >= 0",
                ))
            }
            _ => Ok(()),
        }
    }

    /// Draws one mantle ¹⁷⁶Hf/¹⁷⁷Hf. With `apply_error` off, normal sources
    /// return their mean and mother samples the pool mean.
    pub fn draw_hf<R: Rng + ?Sized>(&self, rng: &mut R, apply_error: bool) -> f64 {
        match self {
            MantleSource::Fixed(hf) => *hf,
            MantleSource::Normal { mean, std } => sample_normal(rng, *mean, *std, apply_error),
            MantleSource::MotherSample(pool) => {
                if apply_error {
                    pool.choose(rng)
                } else {
                    pool.mean()
                }
            }
        }
    }

    pub fn draw<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        params: &ModelParams,
        apply_error: bool,
    ) -> Reservoir {
        Reservoir::from_hf(params, self.draw_hf(rng, apply_error))
    }

    pub fn label(&self) -> &'static str {
        match self {
            MantleSource::Fixed(_) => "fixed",
            MantleSource::Normal { .. } => "normal",
            MantleSource::MotherSample(_) => "mother_sample",
        }
    }
}
