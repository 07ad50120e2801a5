use crate::error::ConfigError;

/// `samples` evenly spaced points over `[start, end]`, endpoints included.
///
/// One sample yields `[start]`; the last point is exactly `end`.
pub fn linspace(start: f64, end: f64, samples: usize) -> Vec<f64> {
    match samples {
        0 => Vec::new(),
        1 => vec![start],
        n => {
            let step = (end - start) / (n - 1) as f64;
            let mut out: Vec<f64> = (0..n).map(|i| i as f64 * step + start).collect();
            out[n - 1] = end;
            out
        }
    }
}

/// Strictly increasing sample times shared by the integrator and reporting.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeGrid {
    points: Vec<f64>,
}

impl TimeGrid {
    pub fn linspace(start: f64, end: f64, samples: usize) -> Result<Self, ConfigError> {
        Self::from_points(linspace(start, end, samples))
    }

    pub fn from_points(points: Vec<f64>) -> Result<Self, ConfigError> {
        if points.len() < 2 {
            return Err(ConfigError::GridTooShort(points.len()));
        }
        if let Some(index) = points.iter().position(|t| !t.is_finite()) {
            return Err(ConfigError::GridNonFinite(index));
        }
        for (index, w) in points.windows(2).enumerate() {
            if w[1] <= w[0] {
                return Err(ConfigError::GridNotIncreasing { index: index + 1, prev: w[0], next: w[1] });
            }
        }
        Ok(Self { points })
    }

    pub fn points(&self) -> &[f64] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn start(&self) -> f64 {
        self.points[0]
    }

    pub fn end(&self) -> f64 {
        self.points[self.points.len() - 1]
    }
}
