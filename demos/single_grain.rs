//! Single-Grain Uncertainty Example
//!
//! Bootstraps one zircon's model age with each uncertainty source switched
//! on alone, then with all of them together

use hfage::{
    bootstrap_ages, epsilon, BootstrapConfig, MantleSource, Measurement, ModelParams,
    UncertaintyFlags,
};

fn main() -> hfage::Result<()> {
    println!("Running hfage single-grain bootstrap...\n");

    let params = ModelParams::default();

    // 1.2 Ga grain with an intermediate δ¹⁸O
    let grain = Measurement::from_lab_units(
        1200.0,   // U-Pb age [Ma]
        20.0,     // 2SE [Ma]
        0.28201,  // 176Hf/177Hf
        0.00004,  // 2SE
        0.0012,   // 176Lu/177Hf
        0.0002,   // 2SE
        Some((7.8, 0.2)),
    )?;

    let mantle = MantleSource::Normal {
        mean: params.arc_mantle.hf,
        std: 0.00005,
    };

    println!("Grain:");
    println!("  t = {:.3} Gyr", grain.u_pb_age.value);
    println!(
        "  eps(t) = {:.2}",
        epsilon(&params, grain.u_pb_age.value, grain.hf_hf.value, grain.lu_hf.value)
    );
    println!();

    let steps = [
        (
            "measurement only",
            UncertaintyFlags {
                measurement: true,
                reservoir: false,
                crustal: false,
            },
        ),
        (
            "reservoir only",
            UncertaintyFlags {
                measurement: false,
                reservoir: true,
                crustal: false,
            },
        ),
        (
            "crustal only",
            UncertaintyFlags {
                measurement: false,
                reservoir: false,
                crustal: true,
            },
        ),
        ("all sources", UncertaintyFlags::all()),
    ];

    println!("Model age (median [2.5%, 97.5%]) in Gyr:");
    for (label, flags) in steps {
        let config = BootstrapConfig {
            trials: 5000,
            seed: 42,
            flags,
            ..BootstrapConfig::default()
        };
        let posterior = bootstrap_ages(&grain, &mantle, &params, &config)?.summarize();
        println!(
            "  {:<17} {:.3} [{:.3}, {:.3}]  width {:.3}",
            label,
            posterior.age.median,
            posterior.age.low,
            posterior.age.high,
            posterior.age.width()
        );
    }

    Ok(())
}
