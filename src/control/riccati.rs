//! Discrete-time algebraic Riccati equation (DARE)
//!
//! P = Q + A'PA - A'PB (R + B'PB)^{-1} B'PA
//!
//! with Q the state cost and R the control cost.

use nalgebra::SMatrix;
use tracing::debug;

use crate::error::{Error, Result};
use crate::utils::{condition_number, inverse, symmetrize};

const GAMMA_CANDIDATES: [f64; 9] = [0.01, 0.1, 0.25, 0.5, 1.0, 2.0, 10.0, 100.0, 1e6];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RiccatiMethod {
    /// Structured doubling, quadratic convergence
    #[default]
    Doubling,
    /// Riccati value iteration, linear convergence
    FixedPoint,
}

#[derive(Debug, Clone, Copy)]
pub struct RiccatiConfig {
    pub method: RiccatiMethod,
    pub tolerance: f64,
    pub max_iter: usize,
}

impl Default for RiccatiConfig {
    fn default() -> Self {
        RiccatiConfig {
            method: RiccatiMethod::Doubling,
            tolerance: 1e-10,
            max_iter: 500,
        }
    }
}

pub fn solve_discrete_riccati<const S: usize, const U: usize>(
    a: &SMatrix<f64, S, S>,
    b: &SMatrix<f64, S, U>,
    q: &SMatrix<f64, S, S>,
    r: &SMatrix<f64, U, U>,
    config: &RiccatiConfig,
) -> Result<SMatrix<f64, S, S>> {
    match config.method {
        RiccatiMethod::Doubling => doubling(a, b, q, r, config),
        RiccatiMethod::FixedPoint => fixed_point(a, b, q, r, config),
    }
}

fn converged(change: f64, scale: f64, tolerance: f64) -> bool {
    change <= tolerance * (1.0 + scale)
}

/// Initial (A0, G0, H0) of the doubling iteration for the problem shifted by gamma,
/// i.e. solved for X = P - gamma I so that R + gamma B'B replaces R.
fn shifted_start<const S: usize, const U: usize>(
    a: &SMatrix<f64, S, S>,
    b: &SMatrix<f64, S, U>,
    q: &SMatrix<f64, S, S>,
    r_hat_inv: &SMatrix<f64, U, U>,
    gamma: f64,
) -> (SMatrix<f64, S, S>, SMatrix<f64, S, S>, SMatrix<f64, S, S>) {
    let identity = SMatrix::<f64, S, S>::identity();
    let g0 = b * r_hat_inv * b.transpose();
    let a0 = (identity - g0 * gamma) * a;
    let h0 = q + a.transpose() * a0 * gamma - identity * gamma;
    (a0, g0, h0)
}

fn choose_gamma<const S: usize, const U: usize>(
    a: &SMatrix<f64, S, S>,
    b: &SMatrix<f64, S, U>,
    q: &SMatrix<f64, S, S>,
    r: &SMatrix<f64, U, U>,
) -> Result<f64> {
    let identity = SMatrix::<f64, S, S>::identity();
    let bb = b.transpose() * b;

    let mut best: Option<(f64, f64)> = None;
    for gamma in GAMMA_CANDIDATES {
        let r_hat = r + bb * gamma;
        let Some(r_hat_inv) = r_hat.try_inverse() else {
            continue;
        };
        let cond_r = condition_number(&r_hat, &r_hat_inv);
        if !(cond_r * f64::EPSILON < 1.0) {
            continue;
        }
        let (_, g0, h0) = shifted_start(a, b, q, &r_hat_inv, gamma);
        let m = identity + g0 * h0;
        let Some(m_inv) = m.try_inverse() else {
            continue;
        };
        let score = cond_r.max(gamma * cond_r).max(condition_number(&m, &m_inv));
        if best.map_or(true, |(s, _)| score < s) {
            best = Some((score, gamma));
        }
    }

    let (score, gamma) = best.ok_or(Error::IllConditioned)?;
    debug!(gamma, score, "doubling shift selected");
    Ok(gamma)
}

fn doubling<const S: usize, const U: usize>(
    a: &SMatrix<f64, S, S>,
    b: &SMatrix<f64, S, U>,
    q: &SMatrix<f64, S, S>,
    r: &SMatrix<f64, U, U>,
    config: &RiccatiConfig,
) -> Result<SMatrix<f64, S, S>> {
    let identity = SMatrix::<f64, S, S>::identity();
    let gamma = choose_gamma(a, b, q, r)?;
    let r_hat_inv = inverse(r + b.transpose() * b * gamma, "R + gamma B'B")?;
    let (mut a_k, mut g_k, mut h_k) = shifted_start(a, b, q, &r_hat_inv, gamma);

    let mut last_change = f64::INFINITY;
    for iteration in 1..=config.max_iter {
        let w = inverse(identity + g_k * h_k, "I + GH")?;
        let a_next = a_k * w * a_k;
        let g_next = g_k + a_k * w * g_k * a_k.transpose();
        let h_next = h_k + a_k.transpose() * h_k * w * a_k;

        last_change = (h_next - h_k).amax();
        if !last_change.is_finite() || h_next.iter().any(|x| !x.is_finite()) {
            return Err(Error::NonConvergence {
                iterations: iteration,
                last_change,
            });
        }
        if converged(last_change, h_next.amax(), config.tolerance) {
            debug!(iteration, last_change, "doubling converged");
            return Ok(symmetrize(&(h_next + identity * gamma)));
        }

        a_k = a_next;
        g_k = g_next;
        h_k = h_next;
    }

    Err(Error::NonConvergence {
        iterations: config.max_iter,
        last_change,
    })
}

fn fixed_point<const S: usize, const U: usize>(
    a: &SMatrix<f64, S, S>,
    b: &SMatrix<f64, S, U>,
    q: &SMatrix<f64, S, S>,
    r: &SMatrix<f64, U, U>,
    config: &RiccatiConfig,
) -> Result<SMatrix<f64, S, S>> {
    let at = a.transpose();
    let bt = b.transpose();

    let mut p = *q;
    let mut last_change = f64::INFINITY;
    for iteration in 1..=config.max_iter {
        let s_inv = inverse(r + bt * p * b, "R + B'PB")?;
        let pn = q + at * p * a - at * p * b * s_inv * bt * p * a;

        last_change = (pn - p).amax();
        if !last_change.is_finite() || pn.iter().any(|x| !x.is_finite()) {
            return Err(Error::NonConvergence {
                iterations: iteration,
                last_change,
            });
        }
        p = pn;
        if converged(last_change, p.amax(), config.tolerance) {
            debug!(iteration, last_change, "fixed point converged");
            return Ok(symmetrize(&p));
        }
    }

    Err(Error::NonConvergence {
        iterations: config.max_iter,
        last_change,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::{Matrix1, Matrix2, Matrix2x1};

    fn dare_residual(
        a: &Matrix2<f64>,
        b: &Matrix2x1<f64>,
        q: &Matrix2<f64>,
        r: &Matrix1<f64>,
        p: &Matrix2<f64>,
    ) -> f64 {
        let s = (r + b.transpose() * p * b).try_inverse().unwrap();
        let rhs = q + a.transpose() * p * a
            - a.transpose() * p * b * s * b.transpose() * p * a;
        (rhs - p).amax()
    }

    fn double_integrator() -> (Matrix2<f64>, Matrix2x1<f64>, Matrix2<f64>, Matrix1<f64>) {
        let dt = 0.1;
        let a = Matrix2::new(1.0, dt, 0.0, 1.0);
        let b = Matrix2x1::new(0.5 * dt * dt, dt);
        (a, b, Matrix2::identity(), Matrix1::new(0.5))
    }

    #[test]
    fn doubling_solves_double_integrator() {
        let (a, b, q, r) = double_integrator();
        let p = solve_discrete_riccati(&a, &b, &q, &r, &RiccatiConfig::default()).unwrap();
        assert!(dare_residual(&a, &b, &q, &r, &p) < 1e-8 * (1.0 + p.amax()));
    }

    #[test]
    fn scalar_dare_matches_closed_form() {
        // p = 1 + p - p^2 / (1 + p)  =>  p^2 - p - 1 = 0
        let a = Matrix1::new(1.0);
        let b = Matrix1::new(1.0);
        let q = Matrix1::new(1.0);
        let r = Matrix1::new(1.0);
        let p = solve_discrete_riccati(&a, &b, &q, &r, &RiccatiConfig::default()).unwrap();
        let golden = (1.0 + 5f64.sqrt()) / 2.0;
        approx::assert_abs_diff_eq!(golden, p.x, epsilon = 1e-9);
    }

    #[test]
    fn doubling_and_fixed_point_agree() {
        let (a, b, q, r) = double_integrator();
        let doubling = solve_discrete_riccati(&a, &b, &q, &r, &RiccatiConfig::default()).unwrap();
        let config = RiccatiConfig {
            method: RiccatiMethod::FixedPoint,
            tolerance: 1e-12,
            max_iter: 100_000,
        };
        let fixed_point = solve_discrete_riccati(&a, &b, &q, &r, &config).unwrap();
        approx::assert_relative_eq!(doubling, fixed_point, max_relative = 1e-6);
    }

    #[test]
    fn unstabilizable_system_does_not_converge() {
        let a = Matrix1::new(2.0);
        let b = Matrix1::new(0.0);
        let q = Matrix1::new(1.0);
        let r = Matrix1::new(1.0);
        for method in [RiccatiMethod::Doubling, RiccatiMethod::FixedPoint] {
            let config = RiccatiConfig {
                method,
                ..Default::default()
            };
            let result = solve_discrete_riccati(&a, &b, &q, &r, &config);
            assert!(matches!(result, Err(Error::NonConvergence { .. })));
        }
    }

    #[test]
    fn singular_control_cost_is_ill_conditioned() {
        let a = Matrix1::new(0.5);
        let b = Matrix1::new(0.0);
        let q = Matrix1::new(1.0);
        let r = Matrix1::new(0.0);
        let result = solve_discrete_riccati(&a, &b, &q, &r, &RiccatiConfig::default());
        assert!(matches!(result, Err(Error::IllConditioned)));
    }
}
