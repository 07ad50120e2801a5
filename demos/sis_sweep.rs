use episim::io::artifacts::write_sweep_artifacts;
use episim::sim::observe::init_logging;
use episim::{ExperimentConfig, Simulation};

fn main() -> anyhow::Result<()> {
    init_logging();

    // Linear SIS, beta in {0, 0.06, ..., 0.3}; override the output dir with OUT_DIR.
    let out_dir = std::env::var("OUT_DIR").unwrap_or_else(|_| "out/sis_sweep".to_string());

    let cfg = ExperimentConfig::sis_sweep();
    let spec = cfg.sweep.unwrap_or_default();
    let sim = Simulation::new(cfg)?;
    let results = sim.sweep(&spec)?;

    println!("beta,I_end/N");
    for (beta, traj) in results.completed() {
        let f = traj.fractions();
        let i_end = f.series[1].values.last().copied().unwrap_or(f64::NAN);
        println!("{:?},{:.4}", beta, i_end);
    }

    let artifacts = write_sweep_artifacts(&out_dir, &results)?;
    println!("wrote {} files to {}", artifacts.written.len(), out_dir);
    Ok(())
}
