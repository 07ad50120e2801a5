pub mod analysis;
pub mod config;
pub mod error;
pub mod io;
pub mod math;
pub mod model;
pub mod sim;

pub use config::{ExperimentConfig, GridSpec, SweepSpec};
pub use error::{ConfigError, IntegrationError, IntegrationFailure, ReportError, SimError};
pub use model::{Compartment, CompartmentModel, CompartmentState, ModelKind, Parameters};
pub use sim::{simulate, Simulation, SweepEntry, SweepResults, TimeGrid, Trajectory};
