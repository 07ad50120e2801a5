use episim::analysis::{basic_reproduction_number, peak, sir_final_susceptible};
use episim::{simulate, Compartment, ExperimentConfig};

fn main() -> anyhow::Result<()> {
    // N=100, I0=10, beta=0.2449, gamma=0.01 over 6000 days
    let cfg = ExperimentConfig::default();
    let traj = simulate(cfg.clone())?;

    let r0 = basic_reproduction_number(cfg.model, &cfg.params).unwrap_or(f64::NAN);
    let s0 = (cfg.population - cfg.initial_infected - cfg.initial_recovered) / cfg.population;
    let s_inf = sir_final_susceptible(r0, s0, cfg.initial_recovered / cfg.population);
    println!("R0={:.3} predicted S(inf)/N={:.3e}", r0, s_inf);
    if let Some((t, i)) = peak(&traj, Compartment::Infected) {
        println!("peak infected {:.2} at day {:.0}", i, t);
    }

    // Print every 250th day as fractions of N
    let frac = traj.fractions();
    println!("day,S,I,R");
    for (k, t) in frac.time.iter().enumerate() {
        if k % 250 != 0 {
            continue;
        }
        let row: Vec<String> = frac.series.iter().map(|s| format!("{:.4}", s.values[k])).collect();
        println!("{:.0},{}", t, row.join(","));
    }

    Ok(())
}
