use serde::Serialize;

use crate::math::ode::SolverStats;
use crate::model::{Compartment, ModelKind, Parameters};

/// A compartment value below zero at some sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Excursion {
    pub t: f64,
    pub compartment: Compartment,
    pub value: f64,
}

/// Compartment values at every grid point of one integration.
#[derive(Debug, Clone, PartialEq)]
pub struct Trajectory {
    pub kind: ModelKind,
    pub population: f64,
    pub params: Parameters,
    pub time: Vec<f64>,
    /// `states[k]` is the state at `time[k]`, ordered as `kind.compartments()`.
    pub states: Vec<Vec<f64>>,
    pub stats: SolverStats,
}

impl Trajectory {
    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    pub fn compartments(&self) -> &'static [Compartment] {
        self.kind.compartments()
    }

    fn index_of(&self, c: Compartment) -> Option<usize> {
        self.compartments().iter().position(|x| *x == c)
    }

    /// Absolute counts for one compartment, `None` if the model lacks it.
    pub fn series(&self, c: Compartment) -> Option<Vec<f64>> {
        let idx = self.index_of(c)?;
        Some(self.states.iter().map(|y| y[idx]).collect())
    }

    pub fn totals(&self) -> Vec<f64> {
        self.states.iter().map(|y| y.iter().sum()).collect()
    }

    pub fn final_state(&self) -> Option<&[f64]> {
        self.states.last().map(Vec::as_slice)
    }

    /// Largest `|sum(compartments) - N|` over the grid.
    pub fn max_conservation_error(&self) -> f64 {
        self.totals()
            .into_iter()
            .map(|total| (total - self.population).abs())
            .fold(0.0, f64::max)
    }

    /// Samples where a compartment dipped below `-tolerance`. Values are
    /// reported as computed, never clamped.
    pub fn negative_excursions(&self, tolerance: f64) -> Vec<Excursion> {
        let compartments = self.compartments();
        let mut out = Vec::new();
        for (t, y) in self.time.iter().zip(&self.states) {
            for (c, v) in compartments.iter().zip(y) {
                if *v < -tolerance {
                    out.push(Excursion { t: *t, compartment: *c, value: *v });
                }
            }
        }
        out
    }

    /// Occupancy as a fraction of `N`.
    pub fn fractions(&self) -> FractionalTrajectory {
        let series = self
            .compartments()
            .iter()
            .enumerate()
            .map(|(idx, c)| CompartmentSeries {
                compartment: *c,
                values: self.states.iter().map(|y| y[idx] / self.population).collect(),
            })
            .collect();
        FractionalTrajectory {
            kind: self.kind,
            params: self.params,
            time: self.time.clone(),
            series,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompartmentSeries {
    pub compartment: Compartment,
    pub values: Vec<f64>,
}

/// Per-compartment fractional series aligned to the time grid, plus the
/// parameters that produced them. This is what reporting consumes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FractionalTrajectory {
    pub kind: ModelKind,
    pub params: Parameters,
    pub time: Vec<f64>,
    pub series: Vec<CompartmentSeries>,
}

impl FractionalTrajectory {
    pub fn get(&self, c: Compartment) -> Option<&[f64]> {
        self.series.iter().find(|s| s.compartment == c).map(|s| s.values.as_slice())
    }
}
