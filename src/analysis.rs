//! Closed-form epidemic quantities used to label and check runs.

use crate::model::{Compartment, ModelKind, Parameters};
use crate::sim::Trajectory;

/// Rate at which an infected individual leaves `I`, or `None` for the linear
/// SIS form. That form has `dI/dt = (beta*S - gamma*I)/N`, which is positive
/// at `I = 0`, so it has no disease-free threshold.
fn infected_exit_rate(kind: ModelKind, p: &Parameters) -> Option<f64> {
    match kind {
        ModelKind::SisLinear => None,
        ModelKind::SirsDemography => Some(p.gamma + p.death_rate),
        ModelKind::Sir | ModelKind::SisMassAction => Some(p.gamma),
    }
}

/// Basic reproduction number for a fully susceptible population.
///
/// For the demographic SIRS the infectious period is shortened by deaths.
/// Returns `None` when nobody ever leaves the infected compartment, and for
/// the linear SIS form, where infection grows from `I = 0`.
pub fn basic_reproduction_number(kind: ModelKind, p: &Parameters) -> Option<f64> {
    let exit = infected_exit_rate(kind, p)?;
    (exit > 0.0).then(|| p.beta / exit)
}

/// Fraction that must be immune to stop growth; zero when `R0 <= 1`.
pub fn herd_immunity_threshold(r0: f64) -> f64 {
    if r0 <= 1.0 {
        0.0
    } else {
        1.0 - 1.0 / r0
    }
}

/// Contact rate giving `r0` with the other rates in `p`; the inverse of
/// [`basic_reproduction_number`].
pub fn beta_from_r0(kind: ModelKind, p: &Parameters, r0: f64) -> Option<f64> {
    let exit = infected_exit_rate(kind, p)?;
    (exit > 0.0).then(|| r0 * exit)
}

/// Susceptible fraction left once an SIR epidemic has burnt out.
///
/// Solves `s = s0 * exp(-r0 * (1 - s - recovered0))` on `(0, s0]` by
/// bisection; `s0` and `recovered0` are initial fractions of `N`. The
/// residual is concave in `s`, so the root is unique.
pub fn sir_final_susceptible(r0: f64, s0: f64, recovered0: f64) -> f64 {
    let g = |s: f64| s - s0 * (-r0 * (1.0 - s - recovered0)).exp();
    if s0 <= 0.0 || g(s0) <= 0.0 {
        return s0.max(0.0);
    }
    let (mut lo, mut hi) = (0.0, s0);
    for _ in 0..200 {
        let mid = 0.5 * (lo + hi);
        if g(mid) > 0.0 {
            hi = mid;
        } else {
            lo = mid;
        }
    }
    0.5 * (lo + hi)
}

/// Fixed point `(S*, I*)` of the linear SIS form: `I* = N * beta / (beta + gamma)`.
pub fn sis_linear_equilibrium(n: f64, p: &Parameters) -> Option<(f64, f64)> {
    let rate = p.beta + p.gamma;
    if rate <= 0.0 {
        return None;
    }
    let infected = n * p.beta / rate;
    Some((n - infected, infected))
}

/// Endemic infected count of mass-action SIS: `N * (1 - 1/R0)`, or zero.
pub fn sis_mass_action_equilibrium(n: f64, p: &Parameters) -> Option<(f64, f64)> {
    let r0 = basic_reproduction_number(ModelKind::SisMassAction, p)?;
    let infected = n * herd_immunity_threshold(r0);
    Some((n - infected, infected))
}

/// Time and size of the largest value of a compartment.
pub fn peak(traj: &Trajectory, c: Compartment) -> Option<(f64, f64)> {
    let series = traj.series(c)?;
    traj.time
        .iter()
        .zip(series)
        .fold(None, |best: Option<(f64, f64)>, (t, v)| match best {
            Some((_, bv)) if bv >= v => best,
            _ => Some((*t, v)),
        })
}
