//! Right-hand sides of the compartmental models.
//!
//! Each function writes `d(state)/dt` into `dy`. Time is accepted for a
//! uniform signature but unused: every model here is autonomous.

use super::Parameters;

/// Classic SIR with mass-action transmission. State: `[S, I, R]`.
pub fn sir(y: &[f64], _t: f64, n: f64, p: &Parameters, dy: &mut [f64]) {
    let (s, i) = (y[0], y[1]);
    let infection = p.beta * s * i / n;
    let recovery = p.gamma * i;

    dy[0] = -infection;
    dy[1] = infection - recovery;
    dy[2] = recovery;
}

/// SIS with transmission and recovery both linear in a single compartment
/// and scaled by `1/N`. State: `[S, I]`.
///
/// This reduces to a linear system; it is not the mass-action SIS.
pub fn sis_linear(y: &[f64], _t: f64, n: f64, p: &Parameters, dy: &mut [f64]) {
    let (s, i) = (y[0], y[1]);
    let to_i = p.beta * s / n;
    let to_s = p.gamma * i / n;

    dy[0] = -to_i + to_s;
    dy[1] = to_i - to_s;
}

/// SIS with mass-action transmission. State: `[S, I]`.
pub fn sis_mass_action(y: &[f64], _t: f64, n: f64, p: &Parameters, dy: &mut [f64]) {
    let (s, i) = (y[0], y[1]);
    let infection = p.beta * s * i / n;
    let recovery = p.gamma * i;

    dy[0] = -infection + recovery;
    dy[1] = infection - recovery;
}

/// SIRS with births into S, per-compartment deaths and waning immunity
/// `R -> S` at rate `xi`. State: `[S, I, R]`.
pub fn sirs_demography(y: &[f64], _t: f64, n: f64, p: &Parameters, dy: &mut [f64]) {
    let (s, i, r) = (y[0], y[1], y[2]);
    let infection = p.beta * s * i / n;
    let recovery = p.gamma * i;
    let waning = p.xi * r;

    dy[0] = p.birth_rate * n - infection + waning - p.death_rate * s;
    dy[1] = infection - recovery - p.death_rate * i;
    dy[2] = recovery - waning - p.death_rate * r;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(beta: f64, gamma: f64) -> Parameters {
        Parameters { beta, gamma, ..Parameters::default() }
    }

    #[test]
    fn sir_rates() {
        let mut dy = [0.0; 3];
        sir(&[90.0, 10.0, 0.0], 0.0, 100.0, &params(0.2, 0.1), &mut dy);
        assert!((dy[0] + 1.8).abs() < 1e-12);
        assert!((dy[1] - 0.8).abs() < 1e-12);
        assert!((dy[2] - 1.0).abs() < 1e-12);
        assert!(dy.iter().sum::<f64>().abs() < 1e-12);
    }

    #[test]
    fn sis_linear_keeps_linear_form() {
        let mut dy = [0.0; 2];
        sis_linear(&[90.0, 10.0], 0.0, 100.0, &params(0.2, 0.1), &mut dy);
        // beta*S/N = 0.18, gamma*I/N = 0.01
        assert!((dy[0] + 0.17).abs() < 1e-12);
        assert!((dy[1] - 0.17).abs() < 1e-12);
    }

    #[test]
    fn sis_forms_differ() {
        let p = params(0.2, 0.1);
        let (mut a, mut b) = ([0.0; 2], [0.0; 2]);
        sis_linear(&[90.0, 10.0], 0.0, 100.0, &p, &mut a);
        sis_mass_action(&[90.0, 10.0], 0.0, 100.0, &p, &mut b);
        assert!((b[1] - 0.8).abs() < 1e-12);
        assert!((a[1] - b[1]).abs() > 0.5);
    }

    #[test]
    fn sirs_demography_balanced_rates_conserve_total() {
        let p = Parameters { beta: 0.3, gamma: 0.1, xi: 0.2, birth_rate: 0.0185, death_rate: 0.0185 };
        let mut dy = [0.0; 3];
        sirs_demography(&[60.0, 25.0, 15.0], 0.0, 100.0, &p, &mut dy);
        assert!(dy.iter().sum::<f64>().abs() < 1e-12);
    }

    #[test]
    fn time_is_ignored() {
        let p = params(0.3, 0.05);
        let (mut a, mut b) = ([0.0; 3], [0.0; 3]);
        sir(&[50.0, 30.0, 20.0], 0.0, 100.0, &p, &mut a);
        sir(&[50.0, 30.0, 20.0], 1234.5, 100.0, &p, &mut b);
        assert_eq!(a, b);
    }
}
