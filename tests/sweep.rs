use std::sync::{Arc, Mutex};

use episim::analysis::sis_linear_equilibrium;
use episim::io::artifacts::{sweep_artifact_name, write_sweep_artifacts};
use episim::math::ode::SolverOptions;
use episim::sim::RunRecord;
use episim::{
    Compartment, ExperimentConfig, GridSpec, IntegrationFailure, ModelKind, Parameters, Simulation, SweepSpec,
};

fn sis_sweep() -> (Simulation, SweepSpec) {
    let cfg = ExperimentConfig::sis_sweep();
    let spec = cfg.sweep.expect("preset has a sweep");
    (Simulation::new(cfg).expect("valid preset"), spec)
}

#[test]
fn sweep_produces_one_trajectory_per_beta() {
    let (sim, spec) = sis_sweep();
    let results = sim.sweep(&spec).unwrap();

    assert_eq!(results.len(), 6);
    assert_eq!(results.completed().count(), 6);
    let betas: Vec<f64> = results.entries.iter().map(|e| e.beta).collect();
    assert_eq!(betas[0], 0.0);
    assert_eq!(betas[5], 0.3);
    assert!((betas[1] - 0.06).abs() < 1e-15);

    for (i, (beta, traj)) in results.completed().enumerate() {
        assert_eq!(results.entries[i].index, i);
        assert_eq!(traj.params.beta, beta);
        assert_eq!(traj.len(), 3000);
        assert!(traj.max_conservation_error() < 1e-6, "beta={beta}");
    }
}

#[test]
fn linear_sis_settles_at_equilibrium() {
    let (sim, spec) = sis_sweep();
    let results = sim.sweep(&spec).unwrap();
    let (beta, traj) = results.completed().last().unwrap();
    assert_eq!(beta, 0.3);

    let (_, i_star) = sis_linear_equilibrium(100.0, &traj.params).unwrap();
    let i_end = *traj.series(Compartment::Infected).unwrap().last().unwrap();
    assert!((i_end - i_star).abs() < 1e-2, "{i_end} vs {i_star}");
}

#[test]
fn sweep_is_deterministic_across_runs_and_threads() {
    let (sim, spec) = sis_sweep();
    let first = sim.sweep(&spec).unwrap();
    let second = sim.sweep(&spec).unwrap();
    let parallel = sim.sweep(&SweepSpec { parallel: true, ..spec }).unwrap();

    for ((a, b), c) in first.entries.iter().zip(&second.entries).zip(&parallel.entries) {
        assert_eq!(a.beta, c.beta);
        assert_eq!(a.outcome, b.outcome);
        assert_eq!(a.outcome, c.outcome);
    }
}

#[test]
fn failing_entry_does_not_abort_sweep() {
    let cfg = ExperimentConfig {
        model: ModelKind::Sir,
        params: Parameters { gamma: 0.1, ..Parameters::default() },
        grid: GridSpec { t_start: 0.0, t_end: 10.0, samples: 11 },
        solver: SolverOptions { max_steps: 50, ..SolverOptions::default() },
        ..ExperimentConfig::default()
    };
    let records: Arc<Mutex<Vec<RunRecord>>> = Arc::default();
    let sink = Arc::clone(&records);
    let sim = Simulation::new(cfg)
        .unwrap()
        .with_observer(move |r: &RunRecord| sink.lock().unwrap().push(r.clone()));

    // beta = 1e6 is far too stiff for 50 explicit steps per day
    let spec = SweepSpec { beta_min: 0.0, beta_max: 1.0e6, samples: 2, parallel: false };
    let results = sim.sweep(&spec).unwrap();

    assert_eq!(results.len(), 2);
    assert!(results.entries[0].outcome.is_ok());
    let err = results.entries[1].outcome.as_ref().unwrap_err();
    assert_eq!(err.reason, IntegrationFailure::MaxStepsExceeded(50));
    assert!(err.t_reached < 1.0);

    let failures: Vec<f64> = results.failures().map(|(beta, _)| beta).collect();
    assert_eq!(failures, vec![1.0e6]);

    let records = records.lock().unwrap();
    assert_eq!(records.len(), 2);
    assert!(!records[0].failed());
    assert!(records[1].failed());
}

#[test]
fn invalid_sweep_is_rejected_before_running() {
    let (sim, _) = sis_sweep();
    let spec = SweepSpec { beta_min: 0.3, beta_max: 0.0, samples: 6, parallel: false };
    assert!(sim.sweep(&spec).is_err());
}

#[test]
fn sweep_artifacts_are_named_by_beta() {
    let (sim, spec) = sis_sweep();
    let results = sim.sweep(&spec).unwrap();

    let tmp = tempfile::tempdir().expect("tempdir");
    let artifacts = write_sweep_artifacts(tmp.path(), &results).expect("write artifacts");
    assert_eq!(artifacts.written.len(), 6);
    assert!(artifacts.skipped.is_empty() && artifacts.failed.is_empty());

    for beta in spec.betas() {
        assert!(tmp.path().join(sweep_artifact_name(beta)).exists());
    }
    let text = std::fs::read_to_string(tmp.path().join("graph0.0.csv")).unwrap();
    let mut lines = text.lines();
    assert_eq!(lines.next(), Some("t,susceptible,infected"));
    assert_eq!(lines.next(), Some("0.000000,0.900000000,0.100000000"));
    assert_eq!(text.lines().count(), 3001);
}

#[test]
fn unwritable_artifact_keeps_trajectories() {
    let (sim, _) = sis_sweep();
    let spec = SweepSpec { beta_min: 0.0, beta_max: 0.3, samples: 3, parallel: false };
    let results = sim.sweep(&spec).unwrap();

    let tmp = tempfile::tempdir().expect("tempdir");
    // a directory where the middle entry's file should go
    std::fs::create_dir(tmp.path().join(sweep_artifact_name(0.15))).unwrap();

    let artifacts = write_sweep_artifacts(tmp.path(), &results).expect("write artifacts");
    assert_eq!(artifacts.written.len(), 2);
    assert!(artifacts.skipped.is_empty());
    let failed: Vec<f64> = artifacts.failed.iter().map(|(beta, _)| *beta).collect();
    assert_eq!(failed, vec![0.15]);

    assert_eq!(results.completed().count(), 3);
    assert!(tmp.path().join("graph0.3.csv").is_file());
}
