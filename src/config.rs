//! Experiment configuration, loaded from JSON or built from presets.

use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::math::ode::SolverOptions;
use crate::model::{check_non_negative, CompartmentState, ModelKind, Parameters};
use crate::sim::grid::{linspace, TimeGrid};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GridSpec {
    pub t_start: f64,
    pub t_end: f64,
    pub samples: usize,
}

impl Default for GridSpec {
    fn default() -> Self {
        Self { t_start: 0.0, t_end: 6000.0, samples: 6000 }
    }
}

impl GridSpec {
    pub fn build(&self) -> Result<TimeGrid, ConfigError> {
        TimeGrid::linspace(self.t_start, self.t_end, self.samples)
    }
}

/// Evenly spaced `beta` values over `[beta_min, beta_max]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SweepSpec {
    pub beta_min: f64,
    pub beta_max: f64,
    pub samples: usize,
    /// Run entries on the rayon pool. Output order is unchanged.
    pub parallel: bool,
}

impl Default for SweepSpec {
    fn default() -> Self {
        Self { beta_min: 0.0, beta_max: 0.3, samples: 6, parallel: false }
    }
}

impl SweepSpec {
    pub fn check(&self) -> Result<(), ConfigError> {
        check_non_negative("beta_min", self.beta_min)?;
        check_non_negative("beta_max", self.beta_max)?;
        if self.beta_min > self.beta_max {
            return Err(ConfigError::SweepRange { min: self.beta_min, max: self.beta_max });
        }
        if self.samples == 0 {
            return Err(ConfigError::SweepEmpty);
        }
        Ok(())
    }

    pub fn betas(&self) -> Vec<f64> {
        linspace(self.beta_min, self.beta_max, self.samples)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExperimentConfig {
    pub model: ModelKind,
    /// Total population `N`.
    pub population: f64,
    pub initial_infected: f64,
    pub initial_recovered: f64,
    pub params: Parameters,
    pub grid: GridSpec,
    pub solver: SolverOptions,
    pub sweep: Option<SweepSpec>,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            model: ModelKind::Sir,
            population: 100.0,
            initial_infected: 10.0,
            initial_recovered: 0.0,
            params: Parameters::default(),
            grid: GridSpec::default(),
            solver: SolverOptions::default(),
            sweep: None,
        }
    }
}

impl ExperimentConfig {
    /// Linear SIS swept over six contact rates in `[0, 0.3]`, 3000 days.
    pub fn sis_sweep() -> Self {
        Self {
            model: ModelKind::SisLinear,
            population: 100.0,
            initial_infected: 10.0,
            initial_recovered: 0.0,
            params: Parameters {
                beta: 0.0,
                gamma: 1.0 / 10.0,
                xi: 0.0,
                birth_rate: 0.0,
                death_rate: 0.0,
            },
            grid: GridSpec { t_start: 0.0, t_end: 3000.0, samples: 3000 },
            solver: SolverOptions::default(),
            sweep: Some(SweepSpec::default()),
        }
    }

    pub fn preset(name: &str) -> Option<Self> {
        match name {
            "sir" => Some(Self::default()),
            "sis-sweep" => Some(Self::sis_sweep()),
            _ => None,
        }
    }

    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_json(&text).with_context(|| format!("Invalid config file: {}", path.display()))
    }

    pub fn from_json(text: &str) -> anyhow::Result<Self> {
        let cfg: Self = serde_json::from_str(text).context("config is not valid JSON for this schema")?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn to_json(&self) -> anyhow::Result<String> {
        serde_json::to_string_pretty(self).context("serialize config failed")
    }

    /// Everything that can be checked without integrating.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.population.is_finite() && self.population > 0.0) {
            return Err(ConfigError::InvalidPopulation(self.population));
        }
        self.params.check()?;
        CompartmentState::from_split(self.model, self.population, self.initial_infected, self.initial_recovered)?;
        self.grid.build()?;
        self.solver.check()?;
        if let Some(sweep) = &self.sweep {
            sweep.check()?;
        }
        Ok(())
    }
}
