//! Command-line front end.
//!
//! Usage: `episim <run|sweep|config> [--config FILE] [overrides...]`

use std::path::PathBuf;
use std::process;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{error, info, warn};

use episim::analysis::{basic_reproduction_number, beta_from_r0, peak};
use episim::io::artifacts::{write_sweep_artifacts, write_trajectory_csv};
use episim::io::run_log::write_run_log;
use episim::sim::observe::init_logging;
use episim::{Compartment, ExperimentConfig, ModelKind, Simulation, SweepSpec};

#[derive(Parser, Debug)]
#[command(name = "episim")]
#[command(about = "Integrate compartmental epidemic models and sweep the contact rate")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Args, Debug)]
struct Common {
    /// JSON experiment config; built-in defaults when omitted
    #[arg(long)]
    config: Option<PathBuf>,

    /// Model: sir, sis_linear, sis_mass_action, sirs_demography
    #[arg(long)]
    model: Option<ModelKind>,

    /// Contact rate
    #[arg(long)]
    beta: Option<f64>,

    /// Recovery rate
    #[arg(long)]
    gamma: Option<f64>,

    /// Target basic reproduction number; sets beta from the other rates
    #[arg(long, conflicts_with = "beta")]
    r0: Option<f64>,

    /// Time horizon in days
    #[arg(long)]
    t_end: Option<f64>,

    /// Number of grid samples
    #[arg(long)]
    samples: Option<usize>,

    /// Output directory for artifacts
    #[arg(long, default_value = "out")]
    out: PathBuf,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Single run with the configured parameters
    Run {
        #[command(flatten)]
        common: Common,
    },
    /// One run per evenly spaced beta in [beta_min, beta_max]
    Sweep {
        #[command(flatten)]
        common: Common,

        #[arg(long)]
        beta_min: Option<f64>,

        #[arg(long)]
        beta_max: Option<f64>,

        /// Number of beta values
        #[arg(long = "beta-samples")]
        beta_samples: Option<usize>,

        /// Run entries in parallel
        #[arg(long)]
        parallel: bool,
    },
    /// Print a preset config as JSON (sir, sis-sweep)
    Config {
        #[arg(default_value = "sir")]
        preset: String,
    },
}

fn load(common: &Common) -> anyhow::Result<ExperimentConfig> {
    let mut cfg = match &common.config {
        Some(path) => ExperimentConfig::load(path)?,
        None => ExperimentConfig::default(),
    };
    if let Some(model) = common.model {
        cfg.model = model;
    }
    if let Some(beta) = common.beta {
        cfg.params.beta = beta;
    }
    if let Some(gamma) = common.gamma {
        cfg.params.gamma = gamma;
    }
    if let Some(r0) = common.r0 {
        cfg.params.beta = beta_from_r0(cfg.model, &cfg.params, r0)
            .with_context(|| format!("model {} has no beta for a target R0", cfg.model))?;
    }
    if let Some(t_end) = common.t_end {
        cfg.grid.t_end = t_end;
    }
    if let Some(samples) = common.samples {
        cfg.grid.samples = samples;
    }
    Ok(cfg)
}

fn run(common: Common) -> anyhow::Result<()> {
    let cfg = load(&common)?;
    let sim = Simulation::new(cfg).context("invalid experiment config")?;
    let traj = sim.run().context("simulation failed")?;

    if let Some(r0) = basic_reproduction_number(traj.kind, &traj.params) {
        info!(model = %traj.kind, r0, "basic reproduction number");
    }
    if let Some((t, i)) = peak(&traj, Compartment::Infected) {
        info!(t, infected = i, "infection peak");
    }

    std::fs::create_dir_all(&common.out)
        .with_context(|| format!("create output dir failed: {}", common.out.display()))?;
    let csv_path = common.out.join(format!("{}.csv", traj.kind));
    write_trajectory_csv(&csv_path, &traj.fractions())?;
    let log_path = write_run_log(&common.out, traj.kind.name(), &traj)?;
    info!(csv = %csv_path.display(), log = %log_path.display(), "artifacts written");
    Ok(())
}

fn sweep(
    common: Common,
    beta_min: Option<f64>,
    beta_max: Option<f64>,
    beta_samples: Option<usize>,
    parallel: bool,
) -> anyhow::Result<()> {
    let cfg = load(&common)?;
    let mut spec: SweepSpec = cfg.sweep.unwrap_or_default();
    if let Some(v) = beta_min {
        spec.beta_min = v;
    }
    if let Some(v) = beta_max {
        spec.beta_max = v;
    }
    if let Some(v) = beta_samples {
        spec.samples = v;
    }
    spec.parallel |= parallel;

    let sim = Simulation::new(cfg).context("invalid experiment config")?;
    let results = sim.sweep(&spec).context("invalid sweep")?;
    let artifacts = write_sweep_artifacts(&common.out, &results)?;

    for (beta, e) in results.failures() {
        warn!(beta, error = %e, "sweep entry failed");
    }
    for (beta, e) in &artifacts.failed {
        error!(beta, error = %e, "artifact not written");
    }
    info!(
        written = artifacts.written.len(),
        skipped = artifacts.skipped.len(),
        failed = artifacts.failed.len(),
        out = %common.out.display(),
        "sweep done"
    );
    Ok(())
}

fn main() {
    init_logging();
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Run { common } => run(common),
        Command::Sweep { common, beta_min, beta_max, beta_samples, parallel } => {
            sweep(common, beta_min, beta_max, beta_samples, parallel)
        }
        Command::Config { preset } => match ExperimentConfig::preset(&preset) {
            Some(cfg) => cfg.to_json().map(|json| println!("{json}")),
            None => Err(anyhow::anyhow!("unknown preset '{preset}', expected sir or sis-sweep")),
        },
    };

    if let Err(e) = result {
        error!("{e:#}");
        process::exit(1);
    }
}
