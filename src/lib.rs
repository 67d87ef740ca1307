//! Optimal linear decision rule of a dominant firm facing a competitive fringe,
//! computed as a discounted linear-quadratic regulator.

pub mod control;
pub mod data;
pub mod error;
pub mod models;
pub mod policy;
pub mod utils;

pub use error::{Error, Result};
pub use models::{build_matrices, OligopolyMatrices, Parameters};
pub use policy::{
    extract_policy, solve_for_opt_policy, solve_policy, DominantFirmPolicy, InitialState,
    ObservablePolicy,
};
