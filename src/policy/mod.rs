//! Optimal decision rule of the dominant firm
//!
//! The firm's problem is solved as a discounted LQ regulator on the
//! augmented state y = [z, x], z = [1, eta, Q, q] observable and x = q_{t+1}
//! chosen by the fringe. The rule is then rewritten in terms of z and the
//! firm's multiplier mu on the fringe's Euler equation, mu = P21 z + P22 x,
//! which starts at zero.

pub mod cache;
pub mod experimental;

use nalgebra::{Matrix5, RowVector4, RowVector5, Vector4, Vector5};
use rand::Rng;
use rand_distr::StandardNormal;
use serde::Serialize;
use tracing::debug;

use crate::control::{stationary_values, LinearQuadratic, RiccatiConfig, StationaryValues};
use crate::error::{Error, Result};
use crate::models::oligopoly::{
    build_matrices, OligopolyMatrices, Parameters, DEMAND_SHOCK, FRINGE_NEXT_OUTPUT,
    FRINGE_OUTPUT, LEADER_OUTPUT,
};

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct InitialState {
    pub eta0: f64,
    /// Q_0
    pub leader_output: f64,
    /// q_0
    pub fringe_output: f64,
}

impl InitialState {
    pub fn z0(&self) -> Vector4<f64> {
        Vector4::new(1.0, self.eta0, self.leader_output, self.fringe_output)
    }
}

/// The decision rule in observable coordinates [z, mu]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObservablePolicy {
    pub p22_inv: f64,
    /// maps [z, mu] to [z, x]
    pub dotmat: Matrix5<f64>,
    /// u = coeffs [z, mu]
    pub coeffs: RowVector5<f64>,
    /// x_0 = D0 z_0
    pub d0: RowVector4<f64>,
    pub x0: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DominantFirmPolicy {
    pub matrices: OligopolyMatrices,
    pub p: Matrix5<f64>,
    pub f: RowVector5<f64>,
    pub d: f64,
    pub observable: ObservablePolicy,
    /// law of motion of [z, mu]
    pub transition: Matrix5<f64>,
    pub initial: InitialState,
}

/// Solves the firm's regulator. R from the builder is a profit, so the
/// minimised state cost is -R.
pub fn solve_policy(
    matrices: &OligopolyMatrices,
    beta: f64,
    config: &RiccatiConfig,
) -> Result<StationaryValues<5, 1>> {
    let lq = LinearQuadratic::new(matrices.q, -matrices.r, matrices.a, matrices.b, beta)
        .with_noise(matrices.c);
    stationary_values(&lq, config)
}

pub fn extract_policy(
    p: &Matrix5<f64>,
    f: &RowVector5<f64>,
    initial: &InitialState,
) -> Result<ObservablePolicy> {
    let p22 = p[(4, 4)];
    if p22.abs() <= f64::EPSILON * p.amax() {
        return Err(Error::DivisionByZero {
            name: "P22",
            value: p22,
        });
    }
    let p22_inv = 1.0 / p22;
    let p21: RowVector4<f64> = p.fixed_view::<1, 4>(4, 0).into_owned();

    let mut dotmat = Matrix5::<f64>::identity();
    dotmat
        .fixed_view_mut::<1, 4>(4, 0)
        .copy_from(&(-p21 * p22_inv));
    dotmat[(4, 4)] = p22_inv;

    let coeffs = -f * dotmat;

    let d0 = -p21 * p22_inv;
    let x0 = (d0 * initial.z0()).x;

    Ok(ObservablePolicy {
        p22_inv,
        dotmat,
        coeffs,
        d0,
        x0,
    })
}

/// [I 0; P_2.] (A - BF) dotmat
pub fn observable_transition(
    p: &Matrix5<f64>,
    f: &RowVector5<f64>,
    a: &Matrix5<f64>,
    b: &Vector5<f64>,
    dotmat: &Matrix5<f64>,
) -> Matrix5<f64> {
    let mut to_observable = Matrix5::<f64>::identity();
    to_observable.set_row(4, &p.row(4));
    to_observable * (a - b * f) * dotmat
}

pub fn solve_for_opt_policy(
    params: &Parameters,
    initial: &InitialState,
    config: &RiccatiConfig,
) -> Result<DominantFirmPolicy> {
    let matrices = build_matrices(params)?;
    let StationaryValues { p, f, d } = solve_policy(&matrices, params.beta, config)?;
    let observable = extract_policy(&p, &f, initial)?;
    let transition = observable_transition(&p, &f, &matrices.a, &matrices.b, &observable.dotmat);
    debug!(p22 = p[(4, 4)], d, "dominant firm policy solved");

    Ok(DominantFirmPolicy {
        matrices,
        p,
        f,
        d,
        observable,
        transition,
        initial: *initial,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MarketObservation {
    pub period: usize,
    pub demand_shock: f64,
    pub leader_output: f64,
    pub fringe_output: f64,
    pub fringe_next_output: f64,
    pub price: f64,
    /// Q_{t+1} - Q_t
    pub leader_adjustment: f64,
}

/// Simulates `steps` periods after the initial one under the firm's rule,
/// drawing the demand disturbance from N(0, c_eps^2).
pub fn simulate_market<R: Rng + ?Sized>(
    policy: &DominantFirmPolicy,
    params: &Parameters,
    steps: usize,
    rng: &mut R,
) -> Vec<MarketObservation> {
    let ObservablePolicy { dotmat, coeffs, .. } = policy.observable;
    let z0 = policy.initial.z0();
    let mut w = Vector5::new(z0[0], z0[1], z0[2], z0[3], 0.0);

    let mut path = Vec::with_capacity(steps + 1);
    for period in 0..=steps {
        let y = dotmat * w;
        let leader_output = w[LEADER_OUTPUT];
        let fringe_output = w[FRINGE_OUTPUT];
        let demand_shock = w[DEMAND_SHOCK];
        path.push(MarketObservation {
            period,
            demand_shock,
            leader_output,
            fringe_output,
            fringe_next_output: y[FRINGE_NEXT_OUTPUT],
            price: params.a0 - params.a1 * (leader_output + fringe_output) + demand_shock,
            leader_adjustment: (coeffs * w).x,
        });

        if period < steps {
            let eps: f64 = rng.sample(StandardNormal);
            w = policy.transition * w;
            w[DEMAND_SHOCK] += params.c_eps * eps;
        }
    }
    path
}
