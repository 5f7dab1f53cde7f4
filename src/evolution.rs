//! Isotope evolution model
//!
//! Single-stage ¹⁷⁶Lu → ¹⁷⁶Hf decay relations between present-day ratios and
//! their values at age `t`. Ages are in Gyr before present.

use crate::params::ModelParams;

/// ¹⁷⁶Hf/¹⁷⁷Hf at `delta_t` Gyr ago of a system with present-day `hf`, `lu`:
/// `hf - lu * (e^(λ·Δt) - 1)`
pub fn extrapolate(params: &ModelParams, delta_t: f64, hf: f64, lu: f64) -> f64 {
    hf - lu * params.growth(delta_t)
}

/// ε_Hf at age `t`: deviation from CHUR in parts per 10⁴
pub fn epsilon(params: &ModelParams, t: f64, hf: f64, lu: f64) -> f64 {
    let chur_t = extrapolate(params, t, params.chur.hf, params.chur.lu);
    (extrapolate(params, t, hf, lu) / chur_t - 1.0) * 1e4
}

/// ¹⁷⁶Lu/¹⁷⁷Hf of a reservoir with present-day `hf` whose trajectory passes
/// through CHUR at the solar-system age
pub fn reservoir_lu_from_hf(params: &ModelParams, hf: f64) -> f64 {
    let age = params.solar_system_age;
    let chur_initial = extrapolate(params, age, params.chur.hf, params.chur.lu);
    (hf - chur_initial) / params.growth(age)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn zero_time_is_identity() {
        let params = ModelParams::default();
        assert_eq!(extrapolate(&params, 0.0, 0.2821, 0.0012), 0.2821);
    }

    #[test]
    fn extrapolation_removes_radiogenic_growth() {
        let params = ModelParams::default();
        let hf = extrapolate(&params, 1.0, 0.2820, 0.010);
        let expected = 0.2820 - 0.010 * ((0.01867_f64).exp() - 1.0);
        assert_abs_diff_eq!(hf, expected, epsilon = 1e-15);
        // forward again
        assert_abs_diff_eq!(
            extrapolate(&params, -1.0, hf, 0.010 * (0.01867_f64).exp()),
            0.2820,
            epsilon = 1e-12
        );
    }

    #[test]
    fn chur_has_zero_epsilon() {
        let params = ModelParams::default();
        for t in [0.0, 0.5, 1.7, 3.2, 4.56] {
            assert_abs_diff_eq!(
                epsilon(&params, t, params.chur.hf, params.chur.lu),
                0.0,
                epsilon = 1e-9
            );
        }
    }

    #[test]
    fn epsilon_of_unradiogenic_grain() {
        let params = ModelParams::default();
        let eps = epsilon(&params, 1.0, 0.2820, 0.010);
        assert_abs_diff_eq!(eps, -12.059082213798922, epsilon = 1e-6);
    }

    #[test]
    fn back_solved_lu_meets_chur_at_solar_system_age() {
        let params = ModelParams::default();
        let lu = reservoir_lu_from_hf(&params, 0.283160);
        assert_abs_diff_eq!(lu, 0.03781991870242577, epsilon = 1e-10);
        assert_abs_diff_eq!(epsilon(&params, 4.56, 0.283160, lu), 0.0, epsilon = 1e-9);
    }

    #[test]
    fn chur_back_solves_to_its_own_lu() {
        let params = ModelParams::default();
        assert_abs_diff_eq!(
            reservoir_lu_from_hf(&params, params.chur.hf),
            params.chur.lu,
            epsilon = 1e-12
        );
    }
}
