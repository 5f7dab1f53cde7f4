//! Model-age solver
//!
//! Two-stage model: the zircon's host evolved with the measured Lu/Hf from
//! crystallization (age `t`) to today, and before that its crustal source
//! evolved with `lu_crustal` from the time `T` it separated from the mantle
//! reservoir. `T` is where the source trajectory meets the reservoir's.

use serde::{Deserialize, Serialize};

use crate::evolution::extrapolate;
use crate::params::ModelParams;
use crate::reservoir::Reservoir;
use crate::{HfError, Result};

/// Closed-form derivation used by [`solve_model_age_with`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SolveMethod {
    /// Reservoir composition at `T` taken directly from the present day
    #[default]
    Direct,
    /// Reservoir first carried back to `t`, then to `T`
    TwoStep,
}

/// Model age `T` [Gyr] of a grain crystallized at `t` with present-day
/// `hf`, `lu`, against `reservoir` via a crust with `lu_crustal`.
///
/// `T < t` is clamped to `t`. NaN passes through unchanged, and the result
/// diverges as `reservoir.lu * e^(λt)` approaches `lu_crustal`.
pub fn solve_model_age(
    params: &ModelParams,
    t: f64,
    hf: f64,
    lu: f64,
    reservoir: &Reservoir,
    lu_crustal: f64,
) -> f64 {
    solve_model_age_with(params, SolveMethod::Direct, t, hf, lu, reservoir, lu_crustal)
}

pub fn solve_model_age_with(
    params: &ModelParams,
    method: SolveMethod,
    t: f64,
    hf: f64,
    lu: f64,
    reservoir: &Reservoir,
    lu_crustal: f64,
) -> f64 {
    let lambda = params.decay_constant;
    let hf_sample_t = extrapolate(params, t, hf, lu);
    let decay_t = (lambda * t).exp();

    let model_age = match method {
        SolveMethod::Direct => {
            let numerator = decay_t * (reservoir.hf + reservoir.lu - hf_sample_t - lu_crustal);
            let denominator = decay_t * reservoir.lu - lu_crustal;
            (numerator / denominator).ln() / lambda
        }
        SolveMethod::TwoStep => {
            let delta_hf = hf_sample_t - reservoir.hf_at(params, t);
            let delta_lu = lu_crustal - reservoir.lu * decay_t;
            t + (delta_hf / delta_lu).ln_1p() / lambda
        }
    };

    clamp_to_crystallization(t, model_age)
}

/// Grains above the reservoir curve report their crystallization age.
fn clamp_to_crystallization(t: f64, model_age: f64) -> f64 {
    if model_age < t {
        t
    } else {
        model_age
    }
}

/// Element-wise [`solve_model_age`] against a single reservoir
pub fn solve_model_ages(
    params: &ModelParams,
    t: &[f64],
    hf: &[f64],
    lu: &[f64],
    reservoir: &Reservoir,
    lu_crustal: &[f64],
) -> Result<Vec<f64>> {
    let expected = t.len();
    for (field, got) in [
        ("hf", hf.len()),
        ("lu", lu.len()),
        ("lu_crustal", lu_crustal.len()),
    ] {
        if got != expected {
            return Err(HfError::ShapeMismatch {
                field,
                expected,
                got,
            });
        }
    }

    Ok((0..expected)
        .map(|i| solve_model_age(params, t[i], hf[i], lu[i], reservoir, lu_crustal[i]))
        .collect())
}
