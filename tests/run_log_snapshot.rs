use episim::io::run_log::write_run_log;
use episim::{simulate, ExperimentConfig, GridSpec, Parameters};

#[test]
fn run_log_constant_state() {
    // No transmission and no recovery: every sample equals the initial split.
    let cfg = ExperimentConfig {
        params: Parameters { beta: 0.0, gamma: 0.0, ..Parameters::default() },
        grid: GridSpec { t_start: 0.0, t_end: 4.0, samples: 5 },
        ..ExperimentConfig::default()
    };
    let traj = simulate(cfg).expect("constant run");

    let tmp = tempfile::tempdir().expect("tempdir");
    let path = write_run_log(tmp.path(), "TEST-CONSTANT", &traj).expect("write run log");
    assert!(path.ends_with("run_TEST-CONSTANT.txt"));

    let log = std::fs::read_to_string(path).expect("read run log");
    insta::assert_snapshot!(log);
}
