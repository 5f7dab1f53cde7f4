use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

use hfage::io::{
    create_run_dir, read_grains_csv, read_mother_sample_csv, write_manifest_json, write_summary_csv,
    write_trajectories_csv, Manifest, SummaryRow, DEFAULT_MOTHER_SAMPLE_COLUMN,
};
use hfage::trajectory::{trial_trajectories, TrajectoryRow};
use hfage::{
    bootstrap_ages, BootstrapConfig, MantleSource, ModelParams, Percentiles, SolveMethod,
    UncertaintyFlags, DEFAULT_TRIALS,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum MantleReference {
    Arc,
    Depleted,
}

#[derive(Debug, Parser)]
#[command(name = "hfage")]
#[command(about = "Hf-isotope crustal model ages for zircon with bootstrapped uncertainty")]
struct Cli {
    /// Grain sheet (CSV)
    #[arg(long)]
    grains: PathBuf,

    /// Mantle ¹⁷⁶Hf/¹⁷⁷Hf pool to resample from (CSV)
    #[arg(long)]
    mother_sample: Option<PathBuf>,

    #[arg(long, default_value = DEFAULT_MOTHER_SAMPLE_COLUMN)]
    mother_column: String,

    /// Keep the mother sample's 2.5 and 97.5 percentile tails
    #[arg(long, default_value_t = false)]
    no_trim: bool,

    /// Reference mantle when no mother sample is given
    #[arg(long, value_enum, default_value_t = MantleReference::Arc)]
    mantle: MantleReference,

    /// Fixed mantle ¹⁷⁶Hf/¹⁷⁷Hf, overriding the reference mantle's value
    #[arg(long)]
    mantle_hf: Option<f64>,

    /// Sample the mantle from Normal(mantle_hf, mantle_std)
    #[arg(long)]
    mantle_std: Option<f64>,

    /// Model parameters (TOML)
    #[arg(long)]
    params: Option<PathBuf>,

    #[arg(long, default_value_t = DEFAULT_TRIALS)]
    trials: usize,

    #[arg(long, default_value_t = 2026)]
    seed: u64,

    #[arg(long, default_value_t = 2.5)]
    low: f64,

    #[arg(long, default_value_t = 97.5)]
    high: f64,

    #[arg(long, default_value_t = false)]
    no_measurement_err: bool,

    #[arg(long, default_value_t = false)]
    no_reservoir_err: bool,

    #[arg(long, default_value_t = false)]
    no_crustal_err: bool,

    /// Ignore δ¹⁸O and use the age-dependent crustal Lu/Hf for every grain
    #[arg(long, default_value_t = false)]
    fixed_crustal_lu: bool,

    /// Solve through the crystallization age instead of directly
    #[arg(long, default_value_t = false)]
    two_step: bool,

    #[arg(long, default_value_t = false)]
    parallel: bool,

    /// Write ε_Hf trajectories for the first N trials of each grain
    #[arg(long, default_value_t = 0)]
    trajectory_trials: usize,

    #[arg(long, default_value_t = 0.02)]
    trajectory_step: f64,

    #[arg(long, default_value_t = 4.0)]
    horizon: f64,

    #[arg(long, default_value = "output-hfage")]
    outdir: PathBuf,

    #[arg(long, default_value = "warn")]
    log_level: tracing::Level,
}

fn resolve_mantle(cli: &Cli, params: &ModelParams) -> Result<MantleSource> {
    if let Some(path) = &cli.mother_sample {
        if cli.mantle_hf.is_some() || cli.mantle_std.is_some() {
            bail!("--mother-sample cannot be combined with --mantle-hf or --mantle-std");
        }
        let pool = read_mother_sample_csv(path, &cli.mother_column)
            .with_context(|| format!("failed to read mother sample: {}", path.display()))?;
        let pool = if cli.no_trim {
            pool
        } else {
            pool.trimmed(2.5, 97.5)
                .context("mother sample is empty after trimming")?
        };
        return Ok(MantleSource::MotherSample(pool));
    }

    let reference = match cli.mantle {
        MantleReference::Arc => params.arc_mantle,
        MantleReference::Depleted => params.depleted_mantle,
    };
    Ok(match (cli.mantle_hf, cli.mantle_std) {
        (None, None) => match cli.mantle {
            MantleReference::Arc => MantleSource::arc_mantle(params),
            MantleReference::Depleted => MantleSource::depleted_mantle(params),
        },
        (hf, Some(std)) => MantleSource::Normal {
            mean: hf.unwrap_or(reference.hf),
            std,
        },
        (Some(hf), None) => MantleSource::Fixed(hf),
    })
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_max_level(cli.log_level)
        .with_target(false)
        .init();

    let params = match &cli.params {
        Some(path) => ModelParams::from_toml_file(path)
            .with_context(|| format!("failed to load params: {}", path.display()))?,
        None => ModelParams::default(),
    };
    let grains = read_grains_csv(&cli.grains)
        .with_context(|| format!("failed to read grains: {}", cli.grains.display()))?;
    if grains.is_empty() {
        bail!("no grains in {}", cli.grains.display());
    }
    let mantle = resolve_mantle(&cli, &params)?;

    let config = BootstrapConfig {
        trials: cli.trials,
        percentiles: Percentiles::new(cli.low, cli.high),
        seed: cli.seed,
        flags: UncertaintyFlags {
            measurement: !cli.no_measurement_err,
            reservoir: !cli.no_reservoir_err,
            crustal: !cli.no_crustal_err,
        },
        method: if cli.two_step {
            SolveMethod::TwoStep
        } else {
            SolveMethod::Direct
        },
        fixed_crustal_lu: cli.fixed_crustal_lu,
        parallel: cli.parallel,
    };
    config.validate()?;

    let run_outdir = create_run_dir(&cli.outdir)
        .with_context(|| format!("failed to create run directory under {}", cli.outdir.display()))?;
    tracing::info!(
        grains = grains.len(),
        trials = config.trials,
        mantle = mantle.label(),
        outdir = %run_outdir.display(),
        "starting run"
    );

    let mut summaries = Vec::with_capacity(grains.len());
    let mut trajectories: Vec<(String, Vec<TrajectoryRow>)> = Vec::new();
    for (name, measurement) in &grains {
        let run = bootstrap_ages(measurement, &mantle, &params, &config)
            .with_context(|| format!("bootstrap failed for {name}"))?;
        let posterior = run.summarize();
        println!(
            "{name}: T = {:.3} [{:.3}, {:.3}] Gyr, eps(t) = {:.2} [{:.2}, {:.2}]",
            posterior.age.median,
            posterior.age.low,
            posterior.age.high,
            posterior.epsilon.median,
            posterior.epsilon.low,
            posterior.epsilon.high,
        );
        summaries.push(SummaryRow::new(name.as_str(), &posterior));

        if cli.trajectory_trials > 0 {
            let mut rows = Vec::new();
            for trial in run.trials.iter().take(cli.trajectory_trials) {
                rows.extend(trial_trajectories(
                    &params,
                    trial,
                    cli.trajectory_step,
                    cli.horizon,
                )?);
            }
            trajectories.push((name.clone(), rows));
        }
    }

    write_summary_csv(&run_outdir.join("summary.csv"), &summaries)
        .context("failed to write summary.csv")?;
    if !trajectories.is_empty() {
        write_trajectories_csv(&run_outdir.join("trajectories.csv"), &trajectories)
            .context("failed to write trajectories.csv")?;
    }
    let mother_sample_len = match &mantle {
        MantleSource::MotherSample(pool) => Some(pool.len()),
        _ => None,
    };
    write_manifest_json(
        &run_outdir.join("manifest.json"),
        &Manifest::new(grains.len(), mantle.label(), mother_sample_len, &config, &params),
    )
    .context("failed to write manifest.json")?;

    println!("Output directory: {}", run_outdir.display());
    Ok(())
}
