//! Monte Carlo resampler
//!
//! Each trial perturbs the measurement, draws a mantle reservoir and a
//! crustal Lu/Hf, and solves for the model age and ε_Hf(t). Trial `i` draws
//! from its own ChaCha stream `i` under the run seed, so a run gives the same
//! trials whether it executes sequentially or in parallel.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::crust::estimate_crustal_lu_hf;
use crate::evolution::epsilon;
use crate::measurement::Measurement;
use crate::params::ModelParams;
use crate::reservoir::{MantleSource, Reservoir};
use crate::solver::{solve_model_age_with, SolveMethod};
use crate::summary::{Percentiles, Posterior, PosteriorSummary};
use crate::{HfError, Result};

pub const DEFAULT_TRIALS: usize = 5000;

/// Which uncertainty sources are sampled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UncertaintyFlags {
    /// U-Pb age, Hf, Lu and δ¹⁸O measurement errors
    pub measurement: bool,
    /// Mantle reservoir ¹⁷⁶Hf/¹⁷⁷Hf
    pub reservoir: bool,
    /// Oxygen-based crustal Lu/Hf calibration
    pub crustal: bool,
}

impl Default for UncertaintyFlags {
    fn default() -> Self {
        Self::all()
    }
}

impl UncertaintyFlags {
    pub fn all() -> Self {
        Self {
            measurement: true,
            reservoir: true,
            crustal: true,
        }
    }

    pub fn none() -> Self {
        Self {
            measurement: false,
            reservoir: false,
            crustal: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BootstrapConfig {
    pub trials: usize,
    pub percentiles: Percentiles,
    pub seed: u64,
    pub flags: UncertaintyFlags,
    pub method: SolveMethod,
    /// Use the age-dependent crustal Lu/Hf even for grains with δ¹⁸O
    pub fixed_crustal_lu: bool,
    /// Run trials on the rayon thread pool
    pub parallel: bool,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            trials: DEFAULT_TRIALS,
            percentiles: Percentiles::default(),
            seed: 2026,
            flags: UncertaintyFlags::default(),
            method: SolveMethod::Direct,
            fixed_crustal_lu: false,
            parallel: false,
        }
    }
}

impl BootstrapConfig {
    pub fn validate(&self) -> Result<()> {
        if self.trials == 0 {
            return Err(HfError::config("trials", "must be greater than zero"));
        }
        self.percentiles.validate()
    }
}

/// Inputs and outputs of one Monte Carlo trial
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrialRecord {
    pub trial: usize,
    /// Perturbed U-Pb age [Gyr]
    pub t: f64,
    pub hf: f64,
    pub lu: f64,
    pub oxygen: Option<f64>,
    pub mantle_hf: f64,
    pub mantle_lu: f64,
    pub lu_crustal: f64,
    pub model_age: f64,
    pub epsilon: f64,
}

impl TrialRecord {
    pub fn mantle(&self) -> Reservoir {
        Reservoir::new(self.mantle_hf, self.mantle_lu)
    }
}

/// All trials of one run, in trial order
#[derive(Debug, Clone, PartialEq)]
pub struct BootstrapRun {
    pub trials: Vec<TrialRecord>,
    pub percentiles: Percentiles,
}

impl BootstrapRun {
    pub fn len(&self) -> usize {
        self.trials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trials.is_empty()
    }

    pub fn model_ages(&self) -> Vec<f64> {
        self.trials.iter().map(|r| r.model_age).collect()
    }

    pub fn epsilons(&self) -> Vec<f64> {
        self.trials.iter().map(|r| r.epsilon).collect()
    }

    pub fn summarize(&self) -> Posterior {
        self.summarize_with(&self.percentiles)
    }

    pub fn summarize_with(&self, percentiles: &Percentiles) -> Posterior {
        Posterior {
            age: PosteriorSummary::from_values(&self.model_ages(), percentiles),
            epsilon: PosteriorSummary::from_values(&self.epsilons(), percentiles),
        }
    }
}

fn trial_rng(seed: u64, trial: usize) -> ChaCha8Rng {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    rng.set_stream(trial as u64);
    rng
}

/// Crustal Lu/Hf without oxygen data: the fallback value for younger
/// grains and the low-oxygen value for older ones
fn crustal_lu_without_oxygen(params: &ModelParams, t: f64) -> f64 {
    if t <= params.fallback_age_threshold {
        params.crust.fallback.mean
    } else {
        params.crust.low_branch.mean
    }
}

fn run_trial(
    trial: usize,
    measurement: &Measurement,
    mantle: &MantleSource,
    params: &ModelParams,
    config: &BootstrapConfig,
) -> TrialRecord {
    let flags = config.flags;
    let mut rng = trial_rng(config.seed, trial);

    let t = measurement.u_pb_age.draw(&mut rng, flags.measurement);
    let hf = measurement.hf_hf.draw(&mut rng, flags.measurement);
    let lu = measurement.lu_hf.draw(&mut rng, flags.measurement);
    let oxygen = measurement
        .oxygen_data()
        .map(|o| o.draw(&mut rng, flags.measurement));

    let reservoir = mantle.draw(&mut rng, params, flags.reservoir);

    let lu_crustal = match oxygen {
        Some(o) if !config.fixed_crustal_lu => {
            estimate_crustal_lu_hf(&mut rng, o, &params.crust, flags.crustal)
        }
        _ => crustal_lu_without_oxygen(params, t),
    };

    let model_age = solve_model_age_with(params, config.method, t, hf, lu, &reservoir, lu_crustal);

    TrialRecord {
        trial,
        t,
        hf,
        lu,
        oxygen,
        mantle_hf: reservoir.hf,
        mantle_lu: reservoir.lu,
        lu_crustal,
        model_age,
        epsilon: epsilon(params, t, hf, lu),
    }
}

/// Runs `config.trials` independent trials for one grain.
pub fn bootstrap_ages(
    measurement: &Measurement,
    mantle: &MantleSource,
    params: &ModelParams,
    config: &BootstrapConfig,
) -> Result<BootstrapRun> {
    params.validate()?;
    config.validate()?;
    measurement.validate()?;
    mantle.validate()?;

    debug!(
        trials = config.trials,
        seed = config.seed,
        mantle = mantle.label(),
        measurement_err = config.flags.measurement,
        reservoir_err = config.flags.reservoir,
        crustal_err = config.flags.crustal,
        fixed_crustal_lu = config.fixed_crustal_lu,
        parallel = config.parallel,
        "bootstrap start"
    );

    let trials: Vec<TrialRecord> = if config.parallel {
        (0..config.trials)
            .into_par_iter()
            .map(|i| run_trial(i, measurement, mantle, params, config))
            .collect()
    } else {
        (0..config.trials)
            .map(|i| run_trial(i, measurement, mantle, params, config))
            .collect()
    };

    let non_finite = trials.iter().filter(|r| !r.model_age.is_finite()).count();
    if non_finite > 0 {
        warn!(
            non_finite,
            trials = trials.len(),
            "trials produced non-finite model ages"
        );
    }
    debug!(trials = trials.len(), "bootstrap done");

    Ok(BootstrapRun {
        trials,
        percentiles: config.percentiles,
    })
}

/// Model-age and ε_Hf(t) summaries as `(age, epsilon)`.
pub fn bootstrap_summary(
    measurement: &Measurement,
    mantle: &MantleSource,
    params: &ModelParams,
    config: &BootstrapConfig,
) -> Result<(PosteriorSummary, PosteriorSummary)> {
    let posterior = bootstrap_ages(measurement, mantle, params, config)?.summarize();
    Ok((posterior.age, posterior.epsilon))
}

/// ε_Hf(t) interval from measurement error alone.
pub fn bootstrap_epsilon(
    measurement: &Measurement,
    params: &ModelParams,
    trials: usize,
    seed: u64,
    percentiles: &Percentiles,
) -> Result<PosteriorSummary> {
    let config = BootstrapConfig {
        trials,
        percentiles: *percentiles,
        seed,
        ..BootstrapConfig::default()
    };
    params.validate()?;
    config.validate()?;
    measurement.validate()?;

    let values: Vec<f64> = (0..trials)
        .map(|i| {
            let mut rng = trial_rng(seed, i);
            let t = measurement.u_pb_age.draw(&mut rng, true);
            let hf = measurement.hf_hf.draw(&mut rng, true);
            let lu = measurement.lu_hf.draw(&mut rng, true);
            epsilon(params, t, hf, lu)
        })
        .collect();

    Ok(PosteriorSummary::from_values(&values, percentiles))
}
