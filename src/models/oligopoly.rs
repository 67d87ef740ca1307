//! Dominant firm facing a competitive fringe
//!
//! Dominant firm costs: C_t = e Q_t + .5 g Q_t^2 + .5 c (Q_{t+1} - Q_t)^2
//! Fringe costs:        s_t = d q_t + .5 h q_t^2 + .5 c (q_{t+1} - q_t)^2
//! Inverse demand:      p_t = a0 - a1 (Q_t + q_t) + eta_t
//! Demand shock:        eta_{t+1} = rho eta_t + c_eps eps_{t+1}
//!
//! Augmented state y = [1, eta, Q, q, x] with x_t = q_{t+1} the fringe's
//! forward looking decision, control u_t = Q_{t+1} - Q_t.

use nalgebra::{Matrix1, Matrix5, RowVector5, Vector5};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::utils::well_conditioned_inverse;

pub const CONSTANT: usize = 0;
pub const DEMAND_SHOCK: usize = 1;
pub const LEADER_OUTPUT: usize = 2;
pub const FRINGE_OUTPUT: usize = 3;
pub const FRINGE_NEXT_OUTPUT: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Parameters {
    /// demand intercept
    pub a0: f64,
    /// demand slope
    pub a1: f64,
    /// persistence of the demand shock
    pub rho: f64,
    /// volatility of the demand shock
    pub c_eps: f64,
    /// adjustment cost
    pub c: f64,
    /// fringe linear cost
    pub d: f64,
    /// dominant firm linear cost
    pub e: f64,
    /// dominant firm quadratic cost
    pub g: f64,
    /// fringe quadratic cost
    pub h: f64,
    /// discount factor
    pub beta: f64,
}

impl Default for Parameters {
    fn default() -> Self {
        Parameters {
            a0: 100.0,
            a1: 1.0,
            rho: 0.8,
            c_eps: 0.2,
            c: 1.0,
            d: 20.0,
            e: 20.0,
            g: 0.2,
            h: 0.2,
            beta: 0.95,
        }
    }
}

impl Parameters {
    /// From [a0, a1, rho, c_eps, c, d, e, g, h, beta]
    pub fn from_array(v: [f64; 10]) -> Parameters {
        let [a0, a1, rho, c_eps, c, d, e, g, h, beta] = v;
        Parameters {
            a0,
            a1,
            rho,
            c_eps,
            c,
            d,
            e,
            g,
            h,
            beta,
        }
    }

    pub fn to_array(&self) -> [f64; 10] {
        [
            self.a0, self.a1, self.rho, self.c_eps, self.c, self.d, self.e, self.g, self.h,
            self.beta,
        ]
    }

    /// Domain checks. `build_matrices` does not call this: violations otherwise
    /// surface as numerical failures further down.
    pub fn validate(&self) -> Result<()> {
        let mut problems = Vec::new();
        if self.to_array().iter().any(|x| !x.is_finite()) {
            problems.push("all parameters must be finite".to_string());
        }
        if !(self.beta > 0.0 && self.beta < 1.0) {
            problems.push(format!("beta = {} must lie in (0, 1)", self.beta));
        }
        if !(self.c > 0.0) {
            problems.push(format!("c = {} must be positive", self.c));
        }
        if self.g < 0.0 {
            problems.push(format!("g = {} must be non-negative", self.g));
        }
        if self.h < 0.0 {
            problems.push(format!("h = {} must be non-negative", self.h));
        }
        if problems.is_empty() {
            Ok(())
        } else {
            Err(Error::Configuration(problems.join("; ")))
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OligopolyMatrices {
    pub a: Matrix5<f64>,
    pub b: Vector5<f64>,
    /// control weight c / 2
    pub q: Matrix1<f64>,
    /// one period profit of the dominant firm, y'Ry
    pub r: Matrix5<f64>,
    /// loading of the demand disturbance
    pub c: Vector5<f64>,
}

pub fn build_matrices(params: &Parameters) -> Result<OligopolyMatrices> {
    let Parameters {
        a0,
        a1,
        rho,
        c_eps,
        c,
        d,
        e,
        g,
        h,
        beta,
    } = *params;

    // fringe Euler equation
    let mut a_lhs = Matrix5::<f64>::identity();
    a_lhs.set_row(4, &RowVector5::new(a0 - d, 1.0, -a1, -a1 - h, c));
    let a_lhs_inv = well_conditioned_inverse(a_lhs, "Euler equation block")?;

    let mut a_rhs = Matrix5::<f64>::identity();
    a_rhs[(DEMAND_SHOCK, DEMAND_SHOCK)] = rho;
    a_rhs[(FRINGE_OUTPUT, FRINGE_NEXT_OUTPUT)] = 1.0;
    a_rhs[(FRINGE_NEXT_OUTPUT, FRINGE_NEXT_OUTPUT)] = c / beta;

    let b_rhs = Vector5::new(0.0, 0.0, 1.0, 0.0, 0.0);

    #[rustfmt::skip]
    let r = Matrix5::new(
        0.0,              0.0, (a0 - e) / 2.0,  0.0,       0.0,
        0.0,              0.0, 0.5,             0.0,       0.0,
        (a0 - e) / 2.0,   0.5, -a1 - 0.5 * g,   -a1 / 2.0, 0.0,
        0.0,              0.0, -a1 / 2.0,       0.0,       0.0,
        0.0,              0.0, 0.0,             0.0,       0.0,
    );

    let matrices = OligopolyMatrices {
        a: a_lhs_inv * a_rhs,
        b: a_lhs_inv * b_rhs,
        q: Matrix1::new(c / 2.0),
        r,
        c: Vector5::new(0.0, c_eps, 0.0, 0.0, 0.0),
    };
    debug!(?params, "oligopoly matrices built");
    Ok(matrices)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_matrices() {
        let m = build_matrices(&Parameters::default()).unwrap();

        approx::assert_abs_diff_eq!(m.q, Matrix1::new(0.5));
        approx::assert_abs_diff_eq!(m.r, m.r.transpose());
        approx::assert_abs_diff_eq!(40.0, m.r[(0, 2)]);
        approx::assert_abs_diff_eq!(40.0, m.r[(2, 0)]);
        approx::assert_abs_diff_eq!(0.5, m.r[(1, 2)]);
        approx::assert_abs_diff_eq!(0.5, m.r[(2, 1)]);
        approx::assert_abs_diff_eq!(-1.1, m.r[(2, 2)], epsilon = 1e-12);

        #[rustfmt::skip]
        let expected_a = Matrix5::new(
            1.0,   0.0,  0.0, 0.0, 0.0,
            0.0,   0.8,  0.0, 0.0, 0.0,
            0.0,   0.0,  1.0, 0.0, 0.0,
            0.0,   0.0,  0.0, 1.0, 1.0,
            -80.0, -0.8, 1.0, 1.2, 1.2 + 1.0 / 0.95,
        );
        approx::assert_abs_diff_eq!(m.a, expected_a, epsilon = 1e-12);
        approx::assert_abs_diff_eq!(m.b, Vector5::new(0.0, 0.0, 1.0, 0.0, 1.0), epsilon = 1e-12);
        approx::assert_abs_diff_eq!(m.c, Vector5::new(0.0, 0.2, 0.0, 0.0, 0.0));
    }

    #[test]
    fn control_input_moves_leader_output_and_fringe_decision() {
        // B = Alhs^{-1} e_2 = [0, 0, 1, 0, a1 / c]
        let params = Parameters {
            a1: 2.5,
            h: 0.7,
            c: 3.0,
            ..Default::default()
        };
        let m = build_matrices(&params).unwrap();
        for i in [CONSTANT, DEMAND_SHOCK, FRINGE_OUTPUT] {
            approx::assert_abs_diff_eq!(0.0, m.b[i], epsilon = 1e-12);
        }
        approx::assert_abs_diff_eq!(1.0, m.b[LEADER_OUTPUT], epsilon = 1e-12);
        approx::assert_abs_diff_eq!(2.5 / 3.0, m.b[FRINGE_NEXT_OUTPUT], epsilon = 1e-12);
    }

    #[test]
    fn zero_adjustment_cost_is_singular() {
        let params = Parameters {
            c: 0.0,
            ..Default::default()
        };
        assert!(matches!(
            build_matrices(&params),
            Err(Error::SingularMatrix(_))
        ));
    }

    #[test]
    fn vanishing_adjustment_cost_is_singular() {
        for c in [1e-15, 1e-17] {
            let params = Parameters {
                c,
                ..Default::default()
            };
            assert!(matches!(
                build_matrices(&params),
                Err(Error::SingularMatrix("Euler equation block"))
            ));
        }
    }

    #[test]
    fn build_is_idempotent() {
        let params = Parameters::default();
        assert_eq!(build_matrices(&params).unwrap(), build_matrices(&params).unwrap());
    }

    #[test]
    fn array_conversion_keeps_order() {
        let v = [100.0, 1.0, 0.8, 0.2, 1.0, 20.0, 20.0, 0.2, 0.2, 0.95];
        assert_eq!(Parameters::from_array(v), Parameters::default());
        assert_eq!(Parameters::default().to_array(), v);
    }

    #[test]
    fn validate_flags_domain_violations() {
        assert!(Parameters::default().validate().is_ok());
        let params = Parameters {
            beta: 1.2,
            c: 0.0,
            ..Default::default()
        };
        let Err(Error::Configuration(message)) = params.validate() else {
            panic!("expected a configuration error");
        };
        assert!(message.contains("beta"));
        assert!(message.contains("c = 0"));
    }
}
