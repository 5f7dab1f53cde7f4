use approx::assert_abs_diff_eq;
use hfage::{
    bootstrap_ages, estimate_crustal_lu_hf, extrapolate, percentile, solve_model_age,
    solve_model_age_with, BootstrapConfig, CrustalCalibration, MantleSource, Measurement,
    ModelParams, Percentiles, PosteriorSummary, Reservoir, SolveMethod, Uncertain,
};
use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;

#[test]
fn documented_regression_value() {
    let params = ModelParams::default();
    let am = Reservoir::from_hf(&params, params.arc_mantle.hf);
    assert_abs_diff_eq!(am.lu, 0.03781991870242577, epsilon = 1e-12);
    let age = solve_model_age(&params, 1.0, 0.2820, 0.010, &am, 0.0115);
    assert_abs_diff_eq!(age, 2.245024421278197, epsilon = 1e-9);
}

proptest! {
    #[test]
    fn zero_interval_is_identity(hf in 0.27_f64..0.29, lu in 0.0_f64..0.05) {
        let params = ModelParams::default();
        prop_assert_eq!(extrapolate(&params, 0.0, hf, lu), hf);
    }

    #[test]
    fn model_age_never_precedes_crystallization(
        t in 0.05_f64..4.0,
        hf in 0.2800_f64..0.2840,
        lu in 0.0_f64..0.003,
        lu_c in 0.005_f64..0.025,
    ) {
        let params = ModelParams::default();
        let am = Reservoir::from_hf(&params, params.arc_mantle.hf);
        let age = solve_model_age(&params, t, hf, lu, &am, lu_c);
        prop_assert!(age.is_nan() || age >= t);
    }

    #[test]
    fn direct_and_two_step_agree(
        t in 0.1_f64..3.5,
        hf in 0.2810_f64..0.2830,
        lu in 0.0001_f64..0.002,
        lu_c in 0.005_f64..0.025,
    ) {
        let params = ModelParams::default();
        let am = Reservoir::from_hf(&params, params.arc_mantle.hf);
        let direct = solve_model_age_with(&params, SolveMethod::Direct, t, hf, lu, &am, lu_c);
        let two = solve_model_age_with(&params, SolveMethod::TwoStep, t, hf, lu, &am, lu_c);
        if direct.is_finite() {
            prop_assert!((direct - two).abs() < 1e-6, "direct {} two-step {}", direct, two);
        }
    }

    #[test]
    fn collapsed_crustal_estimate_stays_between_branches(oxygen in 0.0_f64..20.0, seed in any::<u64>()) {
        let cal = CrustalCalibration::default();
        let mut rng = StdRng::seed_from_u64(seed);
        let lu = estimate_crustal_lu_hf(&mut rng, oxygen, &cal, false);
        prop_assert!(lu >= cal.high_branch.mean - 1e-15);
        prop_assert!(lu <= cal.low_branch.mean + 1e-15);
    }

    #[test]
    fn percentiles_are_monotone(
        values in prop::collection::vec(-100.0_f64..100.0, 1..64),
        a in 0.0_f64..100.0,
        b in 0.0_f64..100.0,
    ) {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let p_lo = percentile(&values, lo);
        let p_hi = percentile(&values, hi);
        prop_assert!(p_lo <= p_hi + 1e-12);
        prop_assert!(p_lo >= min - 1e-12 && p_hi <= max + 1e-12);
    }

    #[test]
    fn summary_ignores_trial_order(values in prop::collection::vec(-10.0_f64..10.0, 1..64)) {
        let p = Percentiles::default();
        let mut reversed = values.clone();
        reversed.reverse();
        prop_assert_eq!(
            PosteriorSummary::from_values(&values, &p),
            PosteriorSummary::from_values(&reversed, &p)
        );
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn bootstrap_interval_brackets_median(seed in any::<u64>(), oxygen in 4.0_f64..12.0) {
        let params = ModelParams::default();
        let grain = Measurement::new(
            Uncertain::new(1.0, 0.01),
            Uncertain::new(0.28200, 0.00002),
            Uncertain::new(0.0010, 0.00005),
            Some(Uncertain::new(oxygen, 0.2)),
        )
        .unwrap();
        let mantle = MantleSource::Normal { mean: params.arc_mantle.hf, std: 0.00005 };
        let config = BootstrapConfig { trials: 200, seed, ..BootstrapConfig::default() };
        let posterior = bootstrap_ages(&grain, &mantle, &params, &config).unwrap().summarize();
        prop_assert!(posterior.age.low <= posterior.age.median);
        prop_assert!(posterior.age.median <= posterior.age.high);
        prop_assert!(posterior.epsilon.low <= posterior.epsilon.median);
        prop_assert!(posterior.epsilon.median <= posterior.epsilon.high);
    }
}
