//! Model parameters
//!
//! Decay constant, reference reservoirs and the oxygen-based crustal Lu/Hf
//! calibration. Passed explicitly to every computation so that alternate
//! calibrations can be run side by side.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::reservoir::Reservoir;
use crate::{HfError, Result};

/// Mean and 1-sigma spread of a calibrated crustal ¹⁷⁶Lu/¹⁷⁷Hf value
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Calibration {
    pub mean: f64,
    pub std: f64,
}

impl Calibration {
    pub fn new(mean: f64, std: f64) -> Self {
        Self { mean, std }
    }

    fn validate(&self, field: &'static str) -> Result<()> {
        if !self.mean.is_finite() {
            return Err(HfError::config(field, "mean must be finite"));
        }
        if !self.std.is_finite() || self.std < 0.0 {
            return Err(HfError::config(field, "std must be finite and >= 0"));
        }
        Ok(())
    }
}

/// δ¹⁸O boundaries (‰) between the low, linear and high crustal regimes
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TurnPoints {
    pub low: f64,
    pub high: f64,
}

impl TurnPoints {
    pub fn new(low: f64, high: f64) -> Self {
        Self { low, high }
    }

    pub fn span(&self) -> f64 {
        self.high - self.low
    }

    pub fn midpoint(&self) -> f64 {
        0.5 * (self.low + self.high)
    }
}

/// Piecewise oxygen to crustal Lu/Hf calibration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrustalCalibration {
    pub turn_points: TurnPoints,
    /// Lu/Hf below `turn_points.low`
    pub low_branch: Calibration,
    /// Lu/Hf above `turn_points.high`
    pub high_branch: Calibration,
    /// Lu/Hf when δ¹⁸O is missing
    pub fallback: Calibration,
}

impl Default for CrustalCalibration {
    fn default() -> Self {
        Self {
            turn_points: TurnPoints::new(6.5, 10.0),
            low_branch: Calibration::new(0.0220, 0.0017),
            high_branch: Calibration::new(0.0083, 0.0017),
            fallback: Calibration::new(0.0115, 0.0),
        }
    }
}

impl CrustalCalibration {
    pub fn validate(&self) -> Result<()> {
        let tp = self.turn_points;
        if !tp.low.is_finite() || !tp.high.is_finite() {
            return Err(HfError::config("turn_points", "bounds must be finite"));
        }
        if tp.low >= tp.high {
            return Err(HfError::config(
                "turn_points",
                format!("low ({}) must be strictly below high ({})", tp.low, tp.high),
            ));
        }
        self.low_branch.validate("low_branch")?;
        self.high_branch.validate("high_branch")?;
        self.fallback.validate("fallback")?;
        Ok(())
    }
}

/// Full parameter set for evolution, solver and resampler
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelParams {
    /// ¹⁷⁶Lu decay constant [Gyr⁻¹]
    pub decay_constant: f64,
    /// Age at which mantle reservoirs are pinned to CHUR [Gyr]
    pub solar_system_age: f64,
    pub chur: Reservoir,
    pub arc_mantle: Reservoir,
    pub depleted_mantle: Reservoir,
    pub crust: CrustalCalibration,
    /// Without δ¹⁸O, grains up to this age [Gyr] use the fallback Lu/Hf and
    /// older grains the low-oxygen one.
    pub fallback_age_threshold: f64,
}

impl Default for ModelParams {
    fn default() -> Self {
        Self {
            decay_constant: 0.01867,
            solar_system_age: 4.56,
            chur: Reservoir::new(0.282785, 0.0336),
            arc_mantle: Reservoir::new(0.283160, 0.0378),
            depleted_mantle: Reservoir::new(0.283250, 0.0384),
            crust: CrustalCalibration::default(),
            fallback_age_threshold: 2.5,
        }
    }
}

impl ModelParams {
    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)?;
        Self::from_toml_str(&raw)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let params: ModelParams = toml::from_str(raw)?;
        params.validate()?;
        Ok(params)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.decay_constant.is_finite() || self.decay_constant <= 0.0 {
            return Err(HfError::config(
                "decay_constant",
                "must be finite and > 0",
            ));
        }
        if !self.solar_system_age.is_finite() || self.solar_system_age <= 0.0 {
            return Err(HfError::config(
                "solar_system_age",
                "must be finite and > 0",
            ));
        }
        if !self.fallback_age_threshold.is_finite() {
            return Err(HfError::config(
                "fallback_age_threshold",
                "must be finite",
            ));
        }
        self.chur.validate("chur")?;
        self.arc_mantle.validate("arc_mantle")?;
        self.depleted_mantle.validate("depleted_mantle")?;
        self.crust.validate()?;
        Ok(())
    }

    /// Growth factor e^(λ·t) - 1
    pub fn growth(&self, t: f64) -> f64 {
        (self.decay_constant * t).exp_m1()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_params_validate() {
        assert!(ModelParams::default().validate().is_ok());
    }

    #[test]
    fn unordered_turn_points_rejected() {
        let mut params = ModelParams::default();
        params.crust.turn_points = TurnPoints::new(10.0, 6.5);
        match params.validate() {
            Err(HfError::InvalidConfig { field, .. }) => assert_eq!(field, "turn_points"),
            other => panic!("expected turn point error, got {other:?}"),
        }

        params.crust.turn_points = TurnPoints::new(7.0, 7.0);
        assert!(params.validate().is_err());
    }

    #[test]
    fn non_positive_decay_constant_rejected() {
        let params = ModelParams {
            decay_constant: 0.0,
            ..ModelParams::default()
        };
        match params.validate() {
            Err(HfError::InvalidConfig { field, .. }) => assert_eq!(field, "decay_constant"),
            other => panic!("expected decay constant error, got {other:?}"),
        }
    }

    #[test]
    fn negative_std_rejected() {
        let mut params = ModelParams::default();
        params.crust.high_branch.std = -0.001;
        match params.validate() {
            Err(HfError::InvalidConfig { field, .. }) => assert_eq!(field, "high_branch"),
            other => panic!("expected calibration error, got {other:?}"),
        }
    }

    #[test]
    fn toml_overrides_merge_with_defaults() {
        let raw = r#"
            decay_constant = 0.01865

            [crust.turn_points]
            low = 6.0
            high = 9.5
        "#;
        let params = ModelParams::from_toml_str(raw).unwrap();
        assert_eq!(params.decay_constant, 0.01865);
        assert_eq!(params.crust.turn_points, TurnPoints::new(6.0, 9.5));
        assert_eq!(params.chur, ModelParams::default().chur);
        assert_eq!(params.crust.low_branch, Calibration::new(0.0220, 0.0017));
    }

    #[test]
    fn invalid_toml_config_fails_on_load() {
        let raw = r#"
            [crust.turn_points]
            low = 11.0
            high = 9.5
        "#;
        assert!(matches!(
            ModelParams::from_toml_str(raw),
            Err(HfError::InvalidConfig { field: "turn_points", .. })
        ));
    }
}
