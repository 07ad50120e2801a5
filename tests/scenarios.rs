use episim::analysis::{peak, sir_final_susceptible, sis_mass_action_equilibrium};
use episim::{simulate, Compartment, ExperimentConfig, GridSpec, ModelKind, Parameters, Trajectory};

const TOL: f64 = 1e-6;

fn series(traj: &Trajectory, c: Compartment) -> Vec<f64> {
    traj.series(c).expect("compartment present")
}

fn assert_within_population(traj: &Trajectory) {
    for y in &traj.states {
        for v in y {
            assert!(*v >= -TOL && *v <= traj.population + TOL, "value {v} outside [0, N]");
        }
    }
}

fn assert_non_increasing(values: &[f64]) {
    for w in values.windows(2) {
        assert!(w[1] <= w[0] + 1e-12, "{} -> {} increased", w[0], w[1]);
    }
}

#[test]
fn sir_outbreak_rises_then_burns_out() {
    // N=100, I0=10, beta=0.2449, gamma=0.01, 6000 samples over 6000 days
    let cfg = ExperimentConfig::default();
    let traj = simulate(cfg.clone()).expect("sir run");

    assert_eq!(traj.len(), 6000);
    assert!(traj.states.iter().all(|y| y.len() == 3));
    assert_within_population(&traj);
    assert!(traj.max_conservation_error() < TOL);

    let (t_peak, i_peak) = peak(&traj, Compartment::Infected).unwrap();
    assert!(i_peak > cfg.initial_infected);
    assert!(t_peak > 0.0 && t_peak < 6000.0);

    let infected = series(&traj, Compartment::Infected);
    assert!(infected.last().unwrap().abs() < 1e-3);

    let recovered = series(&traj, Compartment::Recovered);
    for w in recovered.windows(2) {
        assert!(w[1] >= w[0] - 1e-9);
    }

    let r0 = cfg.params.beta / cfg.params.gamma;
    let s_inf = sir_final_susceptible(r0, 0.9, 0.0);
    let r_end = *recovered.last().unwrap();
    assert!((r_end - cfg.population * (1.0 - s_inf)).abs() < 1e-3);
}

#[test]
fn sir_and_sirs_stay_within_population_across_rates() {
    for model in [ModelKind::Sir, ModelKind::SirsDemography] {
        for beta in [0.0, 0.05, 0.5, 5.0, 20.0] {
            for gamma in [0.0, 0.001, 0.1, 1.0, 5.0] {
                let cfg = ExperimentConfig {
                    model,
                    params: Parameters { beta, gamma, ..Parameters::default() },
                    grid: GridSpec { t_start: 0.0, t_end: 1000.0, samples: 1001 },
                    ..ExperimentConfig::default()
                };
                let traj = simulate(cfg).unwrap_or_else(|e| panic!("{model} beta={beta} gamma={gamma}: {e}"));
                assert_within_population(&traj);
                assert!(
                    traj.max_conservation_error() < TOL,
                    "{model} beta={beta} gamma={gamma}: drift {}",
                    traj.max_conservation_error()
                );
            }
        }
    }
}

#[test]
fn sis_without_transmission_decays() {
    let mut cfg = ExperimentConfig::sis_sweep();
    cfg.sweep = None;
    cfg.params.beta = 0.0;
    let traj = simulate(cfg).expect("sis run");

    let infected = series(&traj, Compartment::Infected);
    let susceptible = series(&traj, Compartment::Susceptible);
    assert_non_increasing(&infected);
    for w in susceptible.windows(2) {
        assert!(w[1] >= w[0] - 1e-12);
    }
    assert!(traj.max_conservation_error() < TOL);

    // dI/dt = -gamma * I / N, so I(t) = I0 * exp(-gamma * t / N)
    for (t, i) in traj.time.iter().zip(&infected) {
        let exact = 10.0 * (-0.1 * t / 100.0).exp();
        assert!((i - exact).abs() < 1e-6, "t={t}: {i} vs {exact}");
    }
    assert!(*susceptible.last().unwrap() > 99.0);
}

#[test]
fn sir_without_transmission_only_recovers() {
    let cfg = ExperimentConfig {
        params: Parameters { beta: 0.0, gamma: 0.1, ..Parameters::default() },
        grid: GridSpec { t_start: 0.0, t_end: 100.0, samples: 101 },
        ..ExperimentConfig::default()
    };
    let traj = simulate(cfg).unwrap();
    let infected = series(&traj, Compartment::Infected);
    assert_non_increasing(&infected);
    assert!((infected[100] - 10.0 * (-10.0f64).exp()).abs() < 1e-6);
    assert_eq!(series(&traj, Compartment::Susceptible)[100], 90.0);
}

#[test]
fn sirs_with_balanced_demography_conserves_population() {
    let cfg = ExperimentConfig { model: ModelKind::SirsDemography, ..ExperimentConfig::default() };
    let traj = simulate(cfg).unwrap();
    assert!(traj.max_conservation_error() < TOL);
    assert_within_population(&traj);
    // waning immunity keeps the infection endemic
    assert!(*series(&traj, Compartment::Infected).last().unwrap() > 1.0);
}

#[test]
fn sirs_with_unbalanced_demography_drifts_to_new_total() {
    let cfg = ExperimentConfig {
        model: ModelKind::SirsDemography,
        params: Parameters { birth_rate: 0.02, death_rate: 0.01, ..Parameters::default() },
        ..ExperimentConfig::default()
    };
    let traj = simulate(cfg).unwrap();
    // d(total)/dt = b*N - d*total, so total -> b*N/d
    let total_end = *traj.totals().last().unwrap();
    assert!((total_end - 200.0).abs() < 1e-3);
    assert!(traj.max_conservation_error() > 99.0);
}

#[test]
fn sis_mass_action_reaches_endemic_level() {
    let cfg = ExperimentConfig {
        model: ModelKind::SisMassAction,
        params: Parameters { beta: 0.3, gamma: 0.1, ..Parameters::default() },
        grid: GridSpec { t_start: 0.0, t_end: 500.0, samples: 501 },
        ..ExperimentConfig::default()
    };
    let traj = simulate(cfg.clone()).unwrap();
    let (_, i_star) = sis_mass_action_equilibrium(cfg.population, &cfg.params).unwrap();
    let i_end = *series(&traj, Compartment::Infected).last().unwrap();
    assert!((i_end - i_star).abs() < 1e-4);
    assert!(traj.max_conservation_error() < TOL);
}

#[test]
fn fractions_are_normalised() {
    let traj = simulate(ExperimentConfig {
        grid: GridSpec { t_start: 0.0, t_end: 50.0, samples: 51 },
        ..ExperimentConfig::default()
    })
    .unwrap();
    let f = traj.fractions();
    assert_eq!(f.series.len(), 3);
    assert_eq!(f.get(Compartment::Infected).unwrap()[0], 0.1);
    for k in 0..f.time.len() {
        let sum: f64 = f.series.iter().map(|s| s.values[k]).sum();
        assert!((sum - 1.0).abs() < 1e-8);
    }
}
