//! Simulation driver: single runs and `beta` sweeps.

pub mod grid;
pub mod observe;
pub mod trajectory;

use std::time::Instant;

use rayon::prelude::*;
use tracing::info;

use crate::config::{ExperimentConfig, SweepSpec};
use crate::error::{ConfigError, IntegrationError, SimError};
use crate::math::ode::integrate;
use crate::model::{CompartmentModel, CompartmentState, Derivative, Parameters};

pub use grid::TimeGrid;
pub use observe::{LogObserver, RunObserver, RunOutcome, RunRecord};
pub use trajectory::{CompartmentSeries, Excursion, FractionalTrajectory, Trajectory};

/// Values below `-NEGATIVE_TOLERANCE` are reported as negative excursions.
pub const NEGATIVE_TOLERANCE: f64 = 1e-6;

pub struct Simulation {
    config: ExperimentConfig,
    grid: TimeGrid,
    initial: CompartmentState,
    observer: Box<dyn RunObserver>,
}

impl Simulation {
    /// Validate `config` and fix the grid and initial state. Nothing is
    /// integrated yet.
    pub fn new(config: ExperimentConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let grid = config.grid.build()?;
        let initial = CompartmentState::from_split(
            config.model,
            config.population,
            config.initial_infected,
            config.initial_recovered,
        )?;
        Ok(Self { config, grid, initial, observer: Box::new(LogObserver) })
    }

    /// Replace the linspace grid from the config with explicit sample times.
    pub fn with_grid(mut self, grid: TimeGrid) -> Self {
        self.grid = grid;
        self
    }

    pub fn with_observer(mut self, observer: impl RunObserver + 'static) -> Self {
        self.observer = Box::new(observer);
        self
    }

    pub fn config(&self) -> &ExperimentConfig {
        &self.config
    }

    pub fn grid(&self) -> &TimeGrid {
        &self.grid
    }

    pub fn initial_state(&self) -> &CompartmentState {
        &self.initial
    }

    /// Single run with the configured parameters.
    pub fn run(&self) -> Result<Trajectory, SimError> {
        Ok(self.run_params(self.config.params, None)?)
    }

    /// Single run with the configured model and split but other parameters.
    pub fn run_with(&self, params: Parameters) -> Result<Trajectory, SimError> {
        params.check()?;
        Ok(self.run_params(params, None)?)
    }

    fn run_params(&self, params: Parameters, sweep_index: Option<usize>) -> Result<Trajectory, IntegrationError> {
        let model = CompartmentModel {
            kind: self.config.model,
            population: self.config.population,
            params,
        };

        let started = Instant::now();
        let solved = integrate(
            |t, y, dy| model.derivative(t, y, dy),
            &self.initial.y,
            self.grid.points(),
            &self.config.solver,
        );
        let duration = started.elapsed();

        let (result, outcome) = match solved {
            Ok(sol) => {
                let traj = Trajectory {
                    kind: model.kind,
                    population: model.population,
                    params,
                    time: self.grid.points().to_vec(),
                    states: sol.states,
                    stats: sol.stats,
                };
                let outcome = RunOutcome::Completed {
                    stats: traj.stats,
                    max_conservation_error: traj.max_conservation_error(),
                    negative_excursions: traj.negative_excursions(NEGATIVE_TOLERANCE).len(),
                };
                (Ok(traj), outcome)
            }
            Err(e) => {
                let outcome = RunRecord::failure(e.t_reached, &e.reason);
                (Err(e), outcome)
            }
        };

        self.observer.record(&RunRecord {
            model: model.kind,
            params,
            sweep_index,
            duration,
            outcome,
        });
        result
    }

    /// One independent run per `beta` in `spec`. A failing entry keeps its
    /// error and the remaining entries still run.
    pub fn sweep(&self, spec: &SweepSpec) -> Result<SweepResults, ConfigError> {
        spec.check()?;
        let base = self.config.params;
        let run = |(index, beta): (usize, f64)| SweepEntry {
            index,
            beta,
            outcome: self.run_params(base.with_beta(beta), Some(index)),
        };

        let betas = spec.betas();
        let entries: Vec<SweepEntry> = if spec.parallel {
            betas.into_par_iter().enumerate().map(run).collect()
        } else {
            betas.into_iter().enumerate().map(run).collect()
        };

        let results = SweepResults { spec: *spec, entries };
        info!(
            model = %self.config.model,
            samples = results.len(),
            failed = results.failures().count(),
            "sweep finished"
        );
        Ok(results)
    }
}

/// Validate `config` and run it once.
pub fn simulate(config: ExperimentConfig) -> Result<Trajectory, SimError> {
    Simulation::new(config)?.run()
}

#[derive(Debug, Clone)]
pub struct SweepEntry {
    pub index: usize,
    pub beta: f64,
    pub outcome: Result<Trajectory, IntegrationError>,
}

#[derive(Debug, Clone)]
pub struct SweepResults {
    pub spec: SweepSpec,
    pub entries: Vec<SweepEntry>,
}

impl SweepResults {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn completed(&self) -> impl Iterator<Item = (f64, &Trajectory)> {
        self.entries.iter().filter_map(|e| e.outcome.as_ref().ok().map(|t| (e.beta, t)))
    }

    pub fn failures(&self) -> impl Iterator<Item = (f64, &IntegrationError)> {
        self.entries.iter().filter_map(|e| e.outcome.as_ref().err().map(|err| (e.beta, err)))
    }
}
