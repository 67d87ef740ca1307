use nalgebra::{SMatrix, SVector};
use rand::Rng;
use rand_distr::StandardNormal;

use crate::control::riccati::{solve_discrete_riccati, RiccatiConfig};
use crate::error::{Error, Result};
use crate::utils::{ensure_finite, inverse};

/// Discounted linear-quadratic problem
///
/// min E sum_t beta^t (x_t' R x_t + u_t' Q u_t)
/// s.t. x_{t+1} = A x_t + B u_t + C w_{t+1},  w ~ N(0, 1)
///
/// S : State Size, U: Input Size
pub trait LinearModel<const S: usize, const U: usize> {
    fn a(&self) -> &SMatrix<f64, S, S>;
    fn b(&self) -> &SMatrix<f64, S, U>;
    /// control cost
    fn q(&self) -> &SMatrix<f64, U, U>;
    /// state cost
    fn r(&self) -> &SMatrix<f64, S, S>;
    /// noise loading
    fn c(&self) -> &SVector<f64, S>;
    fn beta(&self) -> f64;
}

#[derive(Debug, Clone, Copy)]
pub struct LinearQuadratic<const S: usize, const U: usize> {
    pub q: SMatrix<f64, U, U>,
    pub r: SMatrix<f64, S, S>,
    pub a: SMatrix<f64, S, S>,
    pub b: SMatrix<f64, S, U>,
    pub c: SVector<f64, S>,
    pub beta: f64,
}

impl<const S: usize, const U: usize> LinearQuadratic<S, U> {
    /// Problem without noise
    pub fn new(
        q: SMatrix<f64, U, U>,
        r: SMatrix<f64, S, S>,
        a: SMatrix<f64, S, S>,
        b: SMatrix<f64, S, U>,
        beta: f64,
    ) -> LinearQuadratic<S, U> {
        LinearQuadratic {
            q,
            r,
            a,
            b,
            c: SVector::zeros(),
            beta,
        }
    }

    pub fn with_noise(mut self, c: SVector<f64, S>) -> LinearQuadratic<S, U> {
        self.c = c;
        self
    }
}

impl<const S: usize, const U: usize> LinearModel<S, U> for LinearQuadratic<S, U> {
    fn a(&self) -> &SMatrix<f64, S, S> {
        &self.a
    }
    fn b(&self) -> &SMatrix<f64, S, U> {
        &self.b
    }
    fn q(&self) -> &SMatrix<f64, U, U> {
        &self.q
    }
    fn r(&self) -> &SMatrix<f64, S, S> {
        &self.r
    }
    fn c(&self) -> &SVector<f64, S> {
        &self.c
    }
    fn beta(&self) -> f64 {
        self.beta
    }
}

#[derive(Debug, Clone, Copy)]
pub struct StationaryValues<const S: usize, const U: usize> {
    /// value function x'Px + d
    pub p: SMatrix<f64, S, S>,
    /// optimal policy u = -Fx
    pub f: SMatrix<f64, U, S>,
    pub d: f64,
}

pub fn stationary_values<const S: usize, const U: usize>(
    model: &impl LinearModel<S, U>,
    config: &RiccatiConfig,
) -> Result<StationaryValues<S, U>> {
    let beta = model.beta();
    if !(beta > 0.0 && beta < 1.0) {
        // d = beta tr(PCC') / (1 - beta) is undefined for beta = 1
        return Err(Error::Configuration(format!(
            "discount factor {beta} outside (0, 1)"
        )));
    }
    let a = model.a();
    let b = model.b();
    let c = model.c();
    let sqrt_beta = beta.sqrt();

    // Discrete time Algebraic Riccati Equation (DARE) on the discounted system
    let p = solve_discrete_riccati(
        &(a * sqrt_beta),
        &(b * sqrt_beta),
        model.r(),
        model.q(),
        config,
    )?;

    let s1 = inverse(model.q() + b.transpose() * p * b * beta, "Q + beta B'PB")?;
    let f = s1 * b.transpose() * p * a * beta;
    let d = beta * (p * c * c.transpose()).trace() / (1.0 - beta);

    ensure_finite(&p, "P")?;
    ensure_finite(&f, "F")?;
    if !d.is_finite() {
        return Err(Error::NonFinite("d"));
    }
    Ok(StationaryValues { p, f, d })
}

/// Closed loop path x_{t+1} = (A - BF) x_t + C w_{t+1} of length `steps + 1`
pub fn simulate<const S: usize, const U: usize, R: Rng + ?Sized>(
    model: &impl LinearModel<S, U>,
    f: &SMatrix<f64, U, S>,
    x0: &SVector<f64, S>,
    steps: usize,
    rng: &mut R,
) -> Vec<SVector<f64, S>> {
    let closed_loop = model.a() - model.b() * f;
    let mut x = *x0;
    let mut states = vec![x];
    for _ in 0..steps {
        let w: f64 = rng.sample(StandardNormal);
        x = closed_loop * x + model.c() * w;
        states.push(x);
    }
    states
}
