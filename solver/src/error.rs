//! Error types for model setup and the Bellman search.

use thiserror::Error;

/// Rejected model configuration. Raised before the solver starts; the solver
/// itself never re-validates.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("parameter {name} = {value} must lie strictly between 0 and 1")]
    InvalidParameter { name: &'static str, value: f64 },
    #[error("productivity vector is empty")]
    EmptyProductivity,
    #[error("productivity level {index} = {value} must be positive and finite")]
    NonPositiveProductivity { index: usize, value: f64 },
    #[error("productivity levels must be strictly increasing (index {index})")]
    UnorderedProductivity { index: usize },
    #[error("transition matrix must be {expected}x{expected}, got {rows} rows with a row of length {cols}")]
    TransitionShape {
        expected: usize,
        rows: usize,
        cols: usize,
    },
    #[error("transition entry [{row}][{col}] = {value} is negative or not finite")]
    NegativeTransition { row: usize, col: usize, value: f64 },
    #[error("transition row {row} sums to {sum}, expected 1")]
    NonStochasticRow { row: usize, sum: f64 },
    #[error("capital grid is empty")]
    EmptyGrid,
    #[error("capital grid point {index} = {value} must be positive and finite")]
    NonPositiveGrid { index: usize, value: f64 },
    #[error("capital grid must be strictly increasing (index {index})")]
    UnorderedGrid { index: usize },
    #[error("invalid grid bounds or step: lower={lower}, upper={upper}, step={step}")]
    InvalidStep { lower: f64, upper: f64, step: f64 },
    #[error("no admissible capital choice at capital index {capital_index}, productivity index {productivity_index}")]
    InfeasibleState {
        capital_index: usize,
        productivity_index: usize,
    },
    #[error("invalid value for {var}: {value:?}")]
    InvalidEnv { var: &'static str, value: String },
}

/// Unrecoverable failure inside a Bellman iteration.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SolveError {
    #[error("no admissible capital choice at capital index {capital_index}, productivity index {productivity_index}")]
    NoAdmissibleChoice {
        capital_index: usize,
        productivity_index: usize,
    },
}
