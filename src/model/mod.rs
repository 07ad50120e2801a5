pub mod equations;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Compartment {
    Susceptible,
    Infected,
    Recovered,
}

impl Compartment {
    pub fn label(self) -> &'static str {
        match self {
            Compartment::Susceptible => "Susceptible",
            Compartment::Infected => "Infected",
            Compartment::Recovered => "Recovered",
        }
    }

    /// Short column name used in tabular output.
    pub fn column(self) -> &'static str {
        match self {
            Compartment::Susceptible => "S",
            Compartment::Infected => "I",
            Compartment::Recovered => "R",
        }
    }
}

const SI: [Compartment; 2] = [Compartment::Susceptible, Compartment::Infected];
const SIR: [Compartment; 3] = [Compartment::Susceptible, Compartment::Infected, Compartment::Recovered];

/// Which set of equations to integrate.
///
/// `Sir` is the default. The two SIS forms are kept apart on purpose: they
/// produce different dynamics for the same parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    #[default]
    Sir,
    SisLinear,
    SisMassAction,
    SirsDemography,
}

impl ModelKind {
    pub const ALL: [ModelKind; 4] = [
        ModelKind::Sir,
        ModelKind::SisLinear,
        ModelKind::SisMassAction,
        ModelKind::SirsDemography,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ModelKind::Sir => "sir",
            ModelKind::SisLinear => "sis_linear",
            ModelKind::SisMassAction => "sis_mass_action",
            ModelKind::SirsDemography => "sirs_demography",
        }
    }

    pub fn compartments(self) -> &'static [Compartment] {
        match self {
            ModelKind::Sir | ModelKind::SirsDemography => &SIR,
            ModelKind::SisLinear | ModelKind::SisMassAction => &SI,
        }
    }

    pub fn dimension(self) -> usize {
        self.compartments().len()
    }

    pub fn tracks_recovered(self) -> bool {
        self.compartments().contains(&Compartment::Recovered)
    }

    /// Whether `S + I (+ R)` is a conserved quantity for these parameters.
    pub fn conserves_population(self, params: &Parameters) -> bool {
        match self {
            ModelKind::SirsDemography => params.birth_rate == params.death_rate,
            _ => true,
        }
    }

    pub fn derivative(self, y: &[f64], t: f64, n: f64, params: &Parameters, dy: &mut [f64]) {
        match self {
            ModelKind::Sir => equations::sir(y, t, n, params, dy),
            ModelKind::SisLinear => equations::sis_linear(y, t, n, params, dy),
            ModelKind::SisMassAction => equations::sis_mass_action(y, t, n, params, dy),
            ModelKind::SirsDemography => equations::sirs_demography(y, t, n, params, dy),
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for ModelKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ModelKind::ALL
            .into_iter()
            .find(|k| k.name() == s)
            .ok_or_else(|| format!("unknown model '{s}', expected one of: sir, sis_linear, sis_mass_action, sirs_demography"))
    }
}

/// Rates per day.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Parameters {
    /// Contact rate.
    pub beta: f64,
    /// Recovery rate.
    pub gamma: f64,
    /// Waning immunity, R -> S.
    pub xi: f64,
    pub birth_rate: f64,
    pub death_rate: f64,
}

impl Default for Parameters {
    fn default() -> Self {
        Self {
            beta: 0.2449,
            gamma: 1.0 / 100.0,
            xi: 0.2,
            birth_rate: 0.0185,
            death_rate: 0.0185,
        }
    }
}

impl Parameters {
    pub fn with_beta(self, beta: f64) -> Self {
        Self { beta, ..self }
    }

    pub fn check(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("beta", self.beta),
            ("gamma", self.gamma),
            ("xi", self.xi),
            ("birth_rate", self.birth_rate),
            ("death_rate", self.death_rate),
        ] {
            check_non_negative(name, value)?;
        }
        Ok(())
    }
}

pub(crate) fn check_non_negative(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidValue { name, value })
    }
}

/// Capability the integrator needs: `d(state)/dt` at `(t, y)`.
pub trait Derivative {
    fn dimension(&self) -> usize;
    fn derivative(&self, t: f64, y: &[f64], dy: &mut [f64]);
}

/// A model kind bound to a population and one parameter set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompartmentModel {
    pub kind: ModelKind,
    pub population: f64,
    pub params: Parameters,
}

impl CompartmentModel {
    pub fn new(kind: ModelKind, population: f64, params: Parameters) -> Result<Self, ConfigError> {
        if !(population.is_finite() && population > 0.0) {
            return Err(ConfigError::InvalidPopulation(population));
        }
        params.check()?;
        Ok(Self { kind, population, params })
    }
}

impl Derivative for CompartmentModel {
    fn dimension(&self) -> usize {
        self.kind.dimension()
    }

    fn derivative(&self, t: f64, y: &[f64], dy: &mut [f64]) {
        self.kind.derivative(y, t, self.population, &self.params, dy);
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompartmentState {
    pub y: Vec<f64>,
}

impl CompartmentState {
    /// Split `population` into `S0 = N - I0 - R0`, `I0` and (when tracked) `R0`.
    pub fn from_split(kind: ModelKind, population: f64, infected: f64, recovered: f64) -> Result<Self, ConfigError> {
        if !(population.is_finite() && population > 0.0) {
            return Err(ConfigError::InvalidPopulation(population));
        }
        check_non_negative("initial_infected", infected)?;
        check_non_negative("initial_recovered", recovered)?;
        if !kind.tracks_recovered() && recovered != 0.0 {
            return Err(ConfigError::RecoveredNotTracked { model: kind.name(), recovered });
        }
        let susceptible = population - infected - recovered;
        if susceptible < 0.0 {
            return Err(ConfigError::InitialSplitExceedsPopulation { infected, recovered, population });
        }

        let y = if kind.tracks_recovered() {
            vec![susceptible, infected, recovered]
        } else {
            vec![susceptible, infected]
        };
        Ok(Self { y })
    }

    pub fn total(&self) -> f64 {
        self.y.iter().sum()
    }
}
