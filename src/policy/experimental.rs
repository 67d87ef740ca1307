//! EXPERIMENTAL: recursive form of the dominant firm's rule
//!
//! ```text
//! u_t = rho_u u_{t-1} + gamma_1 z_t + gamma_2 z_{t-1}
//! ```
//!
//! Obtained by eliminating the multiplier mu from u_t = f1 z_t + f2 mu_t and
//! mu_{t+1} = m1 z_t + m2 mu_t (f = coeffs, m = last row of the observable
//! transition). Not used by the solver; the coefficients are only checked
//! against simulated paths.

use nalgebra::{RowVector4, Vector4};

use crate::error::{Error, Result};
use crate::policy::DominantFirmPolicy;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecursivePolicy {
    pub rho_u: f64,
    pub gamma1: RowVector4<f64>,
    pub gamma2: RowVector4<f64>,
}

impl RecursivePolicy {
    pub fn next(&self, u_prev: f64, z: &Vector4<f64>, z_prev: &Vector4<f64>) -> f64 {
        self.rho_u * u_prev + (self.gamma1 * z).x + (self.gamma2 * z_prev).x
    }
}

pub fn recursive_representation(policy: &DominantFirmPolicy) -> Result<RecursivePolicy> {
    let f = &policy.observable.coeffs;
    let m = &policy.transition;

    // mu_t = (u_t - f1 z_t) / f2
    let f2 = f[4];
    if f2.abs() <= f64::EPSILON * f.amax() {
        return Err(Error::DivisionByZero {
            name: "multiplier coefficient",
            value: f2,
        });
    }
    let f1: RowVector4<f64> = f.fixed_view::<1, 4>(0, 0).into_owned();
    let m1: RowVector4<f64> = m.fixed_view::<1, 4>(4, 0).into_owned();
    let m2 = m[(4, 4)];

    Ok(RecursivePolicy {
        rho_u: m2,
        gamma1: f1,
        gamma2: m1 * f2 - f1 * m2,
    })
}
