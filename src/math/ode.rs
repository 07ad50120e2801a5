//! ODE integration onto a fixed output grid.
//!
//! Two methods are available: adaptive Dormand–Prince 5(4) with local error
//! control (the default), and classic fixed-step RK4. Both advance from one
//! grid point to the next and never step past a grid point, so every sample
//! is an actual solver state rather than an interpolant.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ConfigError, IntegrationError, IntegrationFailure};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Method {
    #[default]
    Dopri5,
    Rk4,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SolverOptions {
    pub method: Method,
    pub rtol: f64,
    pub atol: f64,
    /// Step budget per grid interval (accepted + rejected).
    pub max_steps: usize,
    /// Largest RK4 sub-step; ignored by dopri5.
    pub max_dt: f64,
    /// Initial dopri5 step; estimated from the problem when absent.
    pub first_step: Option<f64>,
}

impl Default for SolverOptions {
    fn default() -> Self {
        Self {
            method: Method::Dopri5,
            rtol: 1.49012e-8,
            atol: 1.49012e-8,
            max_steps: 500,
            max_dt: 0.25,
            first_step: None,
        }
    }
}

impl SolverOptions {
    pub fn check(&self) -> Result<(), ConfigError> {
        let positive = |name: &'static str, value: f64| {
            if value.is_finite() && value > 0.0 {
                Ok(())
            } else {
                Err(ConfigError::SolverOption { name, value })
            }
        };
        positive("rtol", self.rtol)?;
        positive("atol", self.atol)?;
        positive("max_dt", self.max_dt)?;
        if let Some(h) = self.first_step {
            positive("first_step", h)?;
        }
        if self.max_steps == 0 {
            return Err(ConfigError::SolverOption { name: "max_steps", value: 0.0 });
        }
        Ok(())
    }
}

/// Counters accumulated over a whole integration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SolverStats {
    pub accepted: usize,
    pub rejected: usize,
    pub evaluations: usize,
}

#[derive(Debug, Clone)]
pub struct Solution {
    /// One state per grid point; `states[0]` is the initial state.
    pub states: Vec<Vec<f64>>,
    pub stats: SolverStats,
}

/// Workspace for allocation-free RK4 steps
pub struct Rk4Workspace {
    pub k1: Vec<f64>,
    pub k2: Vec<f64>,
    pub k3: Vec<f64>,
    pub k4: Vec<f64>,
    pub ytmp: Vec<f64>,
}

impl Rk4Workspace {
    pub fn new(n: usize) -> Self {
        Self {
            k1: vec![0.0; n],
            k2: vec![0.0; n],
            k3: vec![0.0; n],
            k4: vec![0.0; n],
            ytmp: vec![0.0; n],
        }
    }

    pub fn resize(&mut self, n: usize) {
        if self.k1.len() != n {
            self.k1.resize(n, 0.0);
            self.k2.resize(n, 0.0);
            self.k3.resize(n, 0.0);
            self.k4.resize(n, 0.0);
            self.ytmp.resize(n, 0.0);
        }
    }
}

/// Fixed-step RK4 using preallocated workspace to avoid allocations per step.
pub fn rk4_step_ws<F>(y: &mut [f64], t: f64, dt: f64, ws: &mut Rk4Workspace, mut f: F)
where
    F: FnMut(f64, &[f64], &mut [f64]),
{
    let n = y.len();
    ws.resize(n);

    let (k1, k2, k3, k4, ytmp) = (&mut ws.k1, &mut ws.k2, &mut ws.k3, &mut ws.k4, &mut ws.ytmp);

    f(t, y, k1);

    for i in 0..n {
        ytmp[i] = y[i] + 0.5 * dt * k1[i];
    }
    f(t + 0.5 * dt, ytmp, k2);

    for i in 0..n {
        ytmp[i] = y[i] + 0.5 * dt * k2[i];
    }
    f(t + 0.5 * dt, ytmp, k3);

    for i in 0..n {
        ytmp[i] = y[i] + dt * k3[i];
    }
    f(t + dt, ytmp, k4);

    for i in 0..n {
        y[i] += (dt / 6.0) * (k1[i] + 2.0 * k2[i] + 2.0 * k3[i] + k4[i]);
    }
}

// Dormand–Prince 5(4) tableau.
const C2: f64 = 1.0 / 5.0;
const C3: f64 = 3.0 / 10.0;
const C4: f64 = 4.0 / 5.0;
const C5: f64 = 8.0 / 9.0;

const A21: f64 = 1.0 / 5.0;
const A31: f64 = 3.0 / 40.0;
const A32: f64 = 9.0 / 40.0;
const A41: f64 = 44.0 / 45.0;
const A42: f64 = -56.0 / 15.0;
const A43: f64 = 32.0 / 9.0;
const A51: f64 = 19372.0 / 6561.0;
const A52: f64 = -25360.0 / 2187.0;
const A53: f64 = 64448.0 / 6561.0;
const A54: f64 = -212.0 / 729.0;
const A61: f64 = 9017.0 / 3168.0;
const A62: f64 = -355.0 / 33.0;
const A63: f64 = 46732.0 / 5247.0;
const A64: f64 = 49.0 / 176.0;
const A65: f64 = -5103.0 / 18656.0;
const A71: f64 = 35.0 / 384.0;
const A73: f64 = 500.0 / 1113.0;
const A74: f64 = 125.0 / 192.0;
const A75: f64 = -2187.0 / 6784.0;
const A76: f64 = 11.0 / 84.0;

// 5th minus 4th order weights.
const E1: f64 = 71.0 / 57600.0;
const E3: f64 = -71.0 / 16695.0;
const E4: f64 = 71.0 / 1920.0;
const E5: f64 = -17253.0 / 339200.0;
const E6: f64 = 22.0 / 525.0;
const E7: f64 = -1.0 / 40.0;

const SAFETY: f64 = 0.9;
const FAC_MIN: f64 = 0.2;
const FAC_MAX: f64 = 10.0;

/// Stage buffers for dopri5, reused across steps.
pub struct Dopri5Workspace {
    k: [Vec<f64>; 7],
    ytmp: Vec<f64>,
    ynew: Vec<f64>,
}

impl Dopri5Workspace {
    pub fn new(n: usize) -> Self {
        Self {
            k: std::array::from_fn(|_| vec![0.0; n]),
            ytmp: vec![0.0; n],
            ynew: vec![0.0; n],
        }
    }
}

fn scale(atol: f64, rtol: f64, a: f64, b: f64) -> f64 {
    atol + rtol * a.abs().max(b.abs())
}

fn rms(values: impl Iterator<Item = f64>, n: usize) -> f64 {
    (values.map(|v| v * v).sum::<f64>() / n.max(1) as f64).sqrt()
}

/// Starting step heuristic (Hairer, Nørsett & Wanner, II.4).
fn initial_step<F>(f: &mut F, t: f64, y: &[f64], f0: &[f64], span: f64, opts: &SolverOptions, stats: &mut SolverStats) -> f64
where
    F: FnMut(f64, &[f64], &mut [f64]),
{
    let n = y.len();
    let sc: Vec<f64> = y.iter().map(|v| scale(opts.atol, opts.rtol, *v, *v)).collect();
    let d0 = rms(y.iter().zip(&sc).map(|(v, s)| v / s), n);
    let d1 = rms(f0.iter().zip(&sc).map(|(v, s)| v / s), n);
    let h0 = if d0 < 1e-5 || d1 < 1e-5 { 1e-6 } else { 0.01 * d0 / d1 };
    let h0 = h0.min(span);

    let y1: Vec<f64> = y.iter().zip(f0).map(|(v, d)| v + h0 * d).collect();
    let mut f1 = vec![0.0; n];
    f(t + h0, &y1, &mut f1);
    stats.evaluations += 1;
    let d2 = rms(f1.iter().zip(f0).zip(&sc).map(|((a, b), s)| (a - b) / s), n) / h0;

    let dmax = d1.max(d2);
    let h1 = if !dmax.is_finite() {
        h0
    } else if dmax <= 1e-15 {
        (h0 * 1e-3).max(1e-6)
    } else {
        (0.01 / dmax).powf(1.0 / 5.0)
    };
    (100.0 * h0).min(h1).min(span)
}

/// Integrate `f` from `grid[0]` over every point of `grid`.
///
/// `f(t, y, dy)` writes the derivative of `y` into `dy`. The grid must be
/// strictly increasing; callers validate it (see [`crate::sim::TimeGrid`]).
/// An empty grid yields no states.
pub fn integrate<F>(mut f: F, y0: &[f64], grid: &[f64], opts: &SolverOptions) -> Result<Solution, IntegrationError>
where
    F: FnMut(f64, &[f64], &mut [f64]),
{
    let mut stats = SolverStats::default();
    let mut states = Vec::with_capacity(grid.len());
    if grid.is_empty() {
        return Ok(Solution { states, stats });
    }
    states.push(y0.to_vec());
    if grid.len() < 2 {
        return Ok(Solution { states, stats });
    }

    let mut y = y0.to_vec();
    match opts.method {
        Method::Dopri5 => dopri5(&mut f, &mut y, grid, opts, &mut stats, &mut states)?,
        Method::Rk4 => rk4(&mut f, &mut y, grid, opts, &mut stats, &mut states)?,
    }

    debug!(
        method = ?opts.method,
        points = grid.len(),
        accepted = stats.accepted,
        rejected = stats.rejected,
        evaluations = stats.evaluations,
        "integration finished"
    );
    Ok(Solution { states, stats })
}

fn rk4<F>(
    f: &mut F,
    y: &mut [f64],
    grid: &[f64],
    opts: &SolverOptions,
    stats: &mut SolverStats,
    states: &mut Vec<Vec<f64>>,
) -> Result<(), IntegrationError>
where
    F: FnMut(f64, &[f64], &mut [f64]),
{
    let mut ws = Rk4Workspace::new(y.len());
    for w in grid.windows(2) {
        let (t0, t1) = (w[0], w[1]);
        let substeps = ((t1 - t0) / opts.max_dt).ceil().max(1.0) as usize;
        if substeps > opts.max_steps {
            return Err(IntegrationError { t_reached: t0, reason: IntegrationFailure::MaxStepsExceeded(opts.max_steps) });
        }
        let dt = (t1 - t0) / substeps as f64;
        let mut t = t0;
        for _ in 0..substeps {
            rk4_step_ws(y, t, dt, &mut ws, &mut *f);
            stats.evaluations += 4;
            stats.accepted += 1;
            if y.iter().any(|v| !v.is_finite()) {
                return Err(IntegrationError { t_reached: t, reason: IntegrationFailure::NonFinite });
            }
            t += dt;
        }
        states.push(y.to_vec());
    }
    Ok(())
}

fn dopri5<F>(
    f: &mut F,
    y: &mut [f64],
    grid: &[f64],
    opts: &SolverOptions,
    stats: &mut SolverStats,
    states: &mut Vec<Vec<f64>>,
) -> Result<(), IntegrationError>
where
    F: FnMut(f64, &[f64], &mut [f64]),
{
    let n = y.len();
    let mut ws = Dopri5Workspace::new(n);
    let mut t = grid[0];

    f(t, y, &mut ws.k[0]);
    stats.evaluations += 1;
    if ws.k[0].iter().any(|v| !v.is_finite()) {
        return Err(IntegrationError { t_reached: t, reason: IntegrationFailure::NonFinite });
    }

    let span = grid[1] - grid[0];
    let mut h = match opts.first_step {
        Some(h) => h.min(span),
        None => {
            let f0 = ws.k[0].clone();
            initial_step(f, t, y, &f0, span, opts, stats)
        }
    };

    for &t_end in &grid[1..] {
        let mut steps = 0usize;
        let mut last_rejected = false;

        while t < t_end {
            if steps >= opts.max_steps {
                return Err(IntegrationError { t_reached: t, reason: IntegrationFailure::MaxStepsExceeded(opts.max_steps) });
            }
            steps += 1;

            let min_h = 16.0 * f64::EPSILON * t.abs().max(t_end.abs());
            if h < min_h {
                return Err(IntegrationError { t_reached: t, reason: IntegrationFailure::StepSizeUnderflow(h) });
            }

            let remaining = t_end - t;
            let clamped = h >= remaining;
            let step = if clamped { remaining } else { h };

            let err = dopri5_attempt(f, t, y, step, &mut ws, opts);
            stats.evaluations += 6;

            if err.is_finite() && err <= 1.0 {
                stats.accepted += 1;
                t = if clamped { t_end } else { t + step };
                y.copy_from_slice(&ws.ynew);
                // FSAL: the last stage is the derivative at the new point.
                ws.k.swap(0, 6);

                let mut fac = if err == 0.0 { FAC_MAX } else { SAFETY * err.powf(-1.0 / 5.0) };
                fac = fac.clamp(FAC_MIN, FAC_MAX);
                if last_rejected {
                    fac = fac.min(1.0);
                }
                let proposed = step * fac;
                h = if clamped { h.max(proposed) } else { proposed };
                last_rejected = false;
            } else {
                stats.rejected += 1;
                let fac = if err.is_finite() {
                    (SAFETY * err.powf(-1.0 / 5.0)).clamp(FAC_MIN, 1.0)
                } else {
                    FAC_MIN
                };
                h = step * fac;
                last_rejected = true;
            }
        }

        if y.iter().any(|v| !v.is_finite()) {
            return Err(IntegrationError { t_reached: t, reason: IntegrationFailure::NonFinite });
        }
        states.push(y.to_vec());
    }
    Ok(())
}

/// One trial step of size `h`; leaves the candidate in `ws.ynew` and the
/// derivative there in `ws.k[6]`. Returns the scaled error norm.
fn dopri5_attempt<F>(f: &mut F, t: f64, y: &[f64], h: f64, ws: &mut Dopri5Workspace, opts: &SolverOptions) -> f64
where
    F: FnMut(f64, &[f64], &mut [f64]),
{
    let n = y.len();
    let Dopri5Workspace { k, ytmp, ynew } = ws;

    for i in 0..n {
        ytmp[i] = y[i] + h * A21 * k[0][i];
    }
    f(t + C2 * h, ytmp, &mut k[1]);

    for i in 0..n {
        ytmp[i] = y[i] + h * (A31 * k[0][i] + A32 * k[1][i]);
    }
    f(t + C3 * h, ytmp, &mut k[2]);

    for i in 0..n {
        ytmp[i] = y[i] + h * (A41 * k[0][i] + A42 * k[1][i] + A43 * k[2][i]);
    }
    f(t + C4 * h, ytmp, &mut k[3]);

    for i in 0..n {
        ytmp[i] = y[i] + h * (A51 * k[0][i] + A52 * k[1][i] + A53 * k[2][i] + A54 * k[3][i]);
    }
    f(t + C5 * h, ytmp, &mut k[4]);

    for i in 0..n {
        ytmp[i] = y[i] + h * (A61 * k[0][i] + A62 * k[1][i] + A63 * k[2][i] + A64 * k[3][i] + A65 * k[4][i]);
    }
    f(t + h, ytmp, &mut k[5]);

    for i in 0..n {
        ynew[i] = y[i] + h * (A71 * k[0][i] + A73 * k[2][i] + A74 * k[3][i] + A75 * k[4][i] + A76 * k[5][i]);
    }
    f(t + h, ynew, &mut k[6]);

    let err = (0..n).map(|i| {
        let e = h * (E1 * k[0][i] + E3 * k[2][i] + E4 * k[3][i] + E5 * k[4][i] + E6 * k[5][i] + E7 * k[6][i]);
        e / scale(opts.atol, opts.rtol, y[i], ynew[i])
    });
    rms(err, n)
}
