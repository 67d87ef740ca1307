use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid parameters: {0}")]
    Configuration(String),

    #[error("{0} is singular")]
    SingularMatrix(&'static str),

    #[error("division by near-zero {name} = {value:e}")]
    DivisionByZero { name: &'static str, value: f64 },

    #[error("riccati iteration did not converge after {iterations} iterations (last change {last_change:e})")]
    NonConvergence { iterations: usize, last_change: f64 },

    #[error("unable to initialize the doubling algorithm: R + gamma B'B is ill conditioned for every gamma")]
    IllConditioned,

    #[error("non-finite entries in {0}")]
    NonFinite(&'static str),

    #[error("csv: {0}")]
    Csv(#[from] csv::Error),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("plot: {0}")]
    Plot(String),
}

pub type Result<T> = std::result::Result<T, Error>;
