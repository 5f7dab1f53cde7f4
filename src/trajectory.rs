//! ε_Hf trajectories of a single trial
//!
//! Sampled curves for plotting: the zircon's own evolution back to its
//! crystallization age, its crustal source back to the model age, the mantle
//! reservoir it was measured against and the point where the two meet.

use serde::{Deserialize, Serialize};

use crate::bootstrap::TrialRecord;
use crate::evolution::{epsilon, extrapolate};
use crate::params::ModelParams;
use crate::{HfError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Segment {
    /// Zircon with its measured Lu/Hf, on `[0, t)`
    Zircon,
    /// Crustal source with the estimated Lu/Hf, on `[t, min(T, horizon))`
    Crustal,
    /// Mantle reservoir, on `[0, horizon)`
    Mantle,
    /// Model age on the mantle curve
    Intercept,
}

impl Segment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Segment::Zircon => "zircon",
            Segment::Crustal => "crustal",
            Segment::Mantle => "mantle",
            Segment::Intercept => "intercept",
        }
    }
}

/// One sampled point
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrajectoryRow {
    pub trial: usize,
    pub segment: Segment,
    /// Age [Gyr]
    pub age: f64,
    pub epsilon: f64,
}

/// ε_Hf of the trial's crustal source at age `x >= t`
pub fn crustal_epsilon(params: &ModelParams, trial: &TrialRecord, x: f64) -> f64 {
    let hf_t = extrapolate(params, trial.t, trial.hf, trial.lu);
    let hf_x = extrapolate(params, x - trial.t, hf_t, trial.lu_crustal);
    let chur_x = extrapolate(params, x, params.chur.hf, params.chur.lu);
    (hf_x / chur_x - 1.0) * 1e4
}

fn grid(start: f64, end: f64, step: f64) -> impl Iterator<Item = f64> {
    (0..)
        .map(move |k| start + k as f64 * step)
        .take_while(move |&x| x < end)
}

/// Samples all segments of `trial` every `step` Gyr. The mantle curve and
/// the crustal segment stop at `horizon`; crustal and intercept rows are
/// skipped when the model age is not finite.
pub fn trial_trajectories(
    params: &ModelParams,
    trial: &TrialRecord,
    step: f64,
    horizon: f64,
) -> Result<Vec<TrajectoryRow>> {
    if !step.is_finite() || step <= 0.0 {
        return Err(HfError::config("step", "must be finite and > 0"));
    }
    if !horizon.is_finite() || horizon <= 0.0 {
        return Err(HfError::config("horizon", "must be finite and > 0"));
    }

    let row = |segment, age, epsilon| TrajectoryRow {
        trial: trial.trial,
        segment,
        age,
        epsilon,
    };
    let mantle = trial.mantle();
    let mut rows: Vec<TrajectoryRow> = grid(0.0, trial.t, step)
        .map(|x| row(Segment::Zircon, x, epsilon(params, x, trial.hf, trial.lu)))
        .collect();

    if trial.model_age.is_finite() {
        rows.extend(
            grid(trial.t, trial.model_age.min(horizon), step)
                .map(|x| row(Segment::Crustal, x, crustal_epsilon(params, trial, x))),
        );
    }

    rows.extend(
        grid(0.0, horizon, step).map(|x| row(Segment::Mantle, x, mantle.epsilon_at(params, x))),
    );

    if trial.model_age.is_finite() {
        rows.push(row(
            Segment::Intercept,
            trial.model_age,
            mantle.epsilon_at(params, trial.model_age),
        ));
    }

    Ok(rows)
}
