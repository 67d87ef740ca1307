pub mod oligopoly;

pub use oligopoly::{build_matrices, OligopolyMatrices, Parameters};
