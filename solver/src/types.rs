//! Core data structures: model context, iteration reports and the solution.
//!
//! The central type is [`RbcContext`], which holds the validated calibration,
//! the capital grid and the precomputed payoff table. It is built once and then
//! shared immutably (`&RbcContext`) with the solver and its rayon workers.

use std::time::Duration;

use crate::calibration::{Calibration, SteadyState};
use crate::constants::*;
use crate::error::ConfigError;
use crate::grid::{build_payoff_table, CapitalGrid};

/// Validated model: calibration, capital grid and payoff table.
///
/// Fields map to model concepts:
/// - `calibration` → (alpha, beta, Z, P)
/// - `grid` → K, the feasible end-of-period capital stocks
/// - `payoff` → y(k, z) = z * k^alpha, resources before the capital choice
pub struct RbcContext {
    calibration: Calibration,
    grid: CapitalGrid,
    /// payoff[grid_index(k, z)] = productivity[z] * capital[k]^alpha.
    payoff: Vec<f64>,
}

impl RbcContext {
    /// Validate the calibration, build the payoff table and check that every
    /// state can afford at least the smallest grid capital.
    pub fn new(calibration: Calibration, grid: CapitalGrid) -> Result<Self, ConfigError> {
        calibration.validate()?;
        let payoff = build_payoff_table(&grid, &calibration.productivity, calibration.alpha);

        // Payoff increases in k, so the first capital point binds tightest.
        let n_capital = grid.len();
        let floor = grid.get(0);
        for z in 0..calibration.n_productivity() {
            if payoff[grid_index(0, z, n_capital)] - floor <= 0.0 {
                return Err(ConfigError::InfeasibleState {
                    capital_index: 0,
                    productivity_index: z,
                });
            }
        }

        Ok(Self {
            calibration,
            grid,
            payoff,
        })
    }

    /// Assemble a context without validation or the feasibility check, so
    /// tests can drive the solver into states `new` would reject.
    #[cfg(test)]
    pub(crate) fn from_parts_unchecked(
        calibration: Calibration,
        grid: CapitalGrid,
        payoff: Vec<f64>,
    ) -> Self {
        Self {
            calibration,
            grid,
            payoff,
        }
    }

    /// The reference model: benchmark calibration on a grid of spacing `step`
    /// around the deterministic steady state.
    pub fn reference(step: f64) -> Result<Self, ConfigError> {
        let calibration = Calibration::reference();
        let grid = CapitalGrid::around_steady_state(calibration.steady_state().capital, step)?;
        Self::new(calibration, grid)
    }

    #[inline(always)]
    pub fn calibration(&self) -> &Calibration {
        &self.calibration
    }

    #[inline(always)]
    pub fn grid(&self) -> &CapitalGrid {
        &self.grid
    }

    #[inline(always)]
    pub fn n_capital(&self) -> usize {
        self.grid.len()
    }

    #[inline(always)]
    pub fn n_productivity(&self) -> usize {
        self.calibration.n_productivity()
    }

    /// Total number of (k, z) states.
    #[inline(always)]
    pub fn n_states(&self) -> usize {
        self.n_capital() * self.n_productivity()
    }

    pub fn steady_state(&self) -> SteadyState {
        self.calibration.steady_state()
    }

    /// Full payoff table in productivity-major layout.
    #[inline(always)]
    pub fn payoff(&self) -> &[f64] {
        &self.payoff
    }

    /// Payoff column for productivity index `z`.
    #[inline(always)]
    pub fn payoff_column(&self, z: usize) -> &[f64] {
        let n = self.n_capital();
        &self.payoff[z * n..(z + 1) * n]
    }
}

/// Outcome of one Bellman iteration.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct IterationReport {
    /// 1-based count of completed iterations.
    pub iteration: usize,
    /// Sup-norm distance between this iterate and the previous one.
    pub sup_diff: f64,
    /// Bellman objective evaluations spent by the search across all columns.
    pub evaluations: usize,
}

/// Converged value and policy functions.
///
/// Tables use the productivity-major layout of [`grid_index`].
#[derive(Clone, Debug)]
pub struct Solution {
    pub n_capital: usize,
    pub n_productivity: usize,
    pub value: Vec<f64>,
    pub policy_index: Vec<usize>,
    /// Capital chosen at each state: `grid[policy_index]`.
    pub policy: Vec<f64>,
    pub iterations: usize,
    pub sup_diff: f64,
    pub elapsed: Duration,
}

impl Solution {
    #[inline(always)]
    pub fn value(&self, k: usize, z: usize) -> f64 {
        self.value[grid_index(k, z, self.n_capital)]
    }

    #[inline(always)]
    pub fn policy(&self, k: usize, z: usize) -> f64 {
        self.policy[grid_index(k, z, self.n_capital)]
    }

    #[inline(always)]
    pub fn policy_index(&self, k: usize, z: usize) -> usize {
        self.policy_index[grid_index(k, z, self.n_capital)]
    }

    /// Policy column (grid indices) for productivity index `z`.
    pub fn policy_index_column(&self, z: usize) -> &[usize] {
        &self.policy_index[z * self.n_capital..(z + 1) * self.n_capital]
    }
}
