use thiserror::Error;

/// Invalid experiment setup, detected before any integration starts.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("population must be positive and finite, got {0}")]
    InvalidPopulation(f64),

    #[error("{name} must be finite and >= 0, got {value}")]
    InvalidValue { name: &'static str, value: f64 },

    #[error("initial split exceeds population: I0={infected} + R0={recovered} > N={population}")]
    InitialSplitExceedsPopulation { infected: f64, recovered: f64, population: f64 },

    #[error("model {model} has no recovered compartment, but R0={recovered}")]
    RecoveredNotTracked { model: &'static str, recovered: f64 },

    #[error("time grid needs at least 2 points, got {0}")]
    GridTooShort(usize),

    #[error("time grid is not strictly increasing at index {index} ({prev} -> {next})")]
    GridNotIncreasing { index: usize, prev: f64, next: f64 },

    #[error("time grid contains a non-finite point at index {0}")]
    GridNonFinite(usize),

    #[error("sweep range is invalid: beta_min={min}, beta_max={max}")]
    SweepRange { min: f64, max: f64 },

    #[error("sweep needs at least 1 sample")]
    SweepEmpty,

    #[error("solver option {name} is invalid: {value}")]
    SolverOption { name: &'static str, value: f64 },
}

/// Why the solver gave up.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum IntegrationFailure {
    #[error("more than {0} steps needed within one grid interval")]
    MaxStepsExceeded(usize),

    #[error("step size {0:e} underflowed")]
    StepSizeUnderflow(f64),

    #[error("state became non-finite")]
    NonFinite,
}

/// The solver could not reach the end of the grid.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("integration stopped at t={t_reached}: {reason}")]
pub struct IntegrationError {
    /// Furthest time the solver reached with an accepted step.
    pub t_reached: f64,
    pub reason: IntegrationFailure,
}

/// Failures from a single simulation run.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Integration(#[from] IntegrationError),
}

/// Failures while persisting artifacts. Trajectories stay valid.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("i/o error on {path}: {source}")]
    Io {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("nothing to write: {0}")]
    Empty(&'static str),
}
