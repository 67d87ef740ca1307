pub mod lqr;
pub mod riccati;

pub use lqr::{simulate, stationary_values, LinearModel, LinearQuadratic, StationaryValues};
pub use riccati::{solve_discrete_riccati, RiccatiConfig, RiccatiMethod};
