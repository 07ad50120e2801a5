use std::time::Instant;

use episim::math::ode::{Method, SolverOptions};
use episim::{ExperimentConfig, Simulation};

fn main() -> anyhow::Result<()> {
    let base = ExperimentConfig::default();

    let dopri = Simulation::new(base.clone())?;
    let rk4 = Simulation::new(ExperimentConfig {
        solver: SolverOptions { method: Method::Rk4, max_dt: 0.25, ..SolverOptions::default() },
        ..base
    })?;

    let t_start = Instant::now();
    let traj1 = dopri.run()?;
    let dur1 = t_start.elapsed();

    let t_start2 = Instant::now();
    let traj2 = rk4.run()?;
    let dur2 = t_start2.elapsed();

    let max_diff = traj1
        .states
        .iter()
        .zip(&traj2.states)
        .flat_map(|(a, b)| a.iter().zip(b).map(|(x, y)| (x - y).abs()))
        .fold(0.0, f64::max);

    println!("dopri5_ms,rk4_ms,dopri5_steps,rk4_steps,max_abs_diff");
    println!(
        "{:.3},{:.3},{},{},{:.3e}",
        dur1.as_secs_f64() * 1000.0,
        dur2.as_secs_f64() * 1000.0,
        traj1.stats.accepted,
        traj2.stats.accepted,
        max_diff
    );

    Ok(())
}
