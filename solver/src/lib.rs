//! # RBC — value function iteration for the stochastic growth model
//!
//! Solves the representative-agent growth model with full depreciation, log
//! utility and a finite-state Markov productivity shock:
//!
//! ```text
//! V(k, z) = max_{k' ∈ K} (1 - beta) ln(z k^alpha - k') + beta Σ_z' P(z, z') V(k', z')
//! ```
//!
//! by **value function iteration** over a discrete capital grid until the
//! sup-norm change between iterates falls below 1e-7.
//!
//! ## Algorithm overview
//!
//! | Step | Rust module | Description |
//! |------|-------------|-------------|
//! | Setup | [`calibration`], [`grid`], [`types::RbcContext`] | Validate calibration, build capital grid and payoff table y(k, z) = z k^alpha |
//! | Expectation | [`bellman::expected_value`] | E[k', z] = Σ_z' V[k', z'] P[z][z'] from the previous iterate |
//! | Search | [`bellman::solve_column`] | Monotone greedy ascent per productivity column |
//! | Driver | [`vfi::VfiSolver`] | Double-buffered `step()` / `run()` to the fixed point |
//! | Output | [`report`] | Steady state, iteration count, check value, JSON export |
//!
//! ## State representation
//!
//! A state is (k, z) with k a capital grid index and z a productivity index.
//! Tables are flat `Vec`s indexed by `grid_index(k, z, nK) = z * nK + k`, so
//! each productivity column is contiguous and is processed by its own rayon
//! task. The scan over k inside a column stays sequential: it seeds each
//! search at the previous optimum.
//!
//! ## Precision
//!
//! f64 throughout. The reference run (17,820 × 5 states) converges in 257
//! iterations with policy(999, 2) = 0.14654914...

#![allow(clippy::needless_range_loop)]

pub mod bellman;
pub mod calibration;
pub mod constants;
pub mod env_config;
pub mod error;
pub mod grid;
pub mod report;
pub mod types;
pub mod vfi;
