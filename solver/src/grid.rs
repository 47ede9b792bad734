//! Capital grid construction and the payoff table.
//!
//! The grid follows half-open `arange` semantics: `n = ceil((upper - lower) / step)`
//! points `lower + i * step`, so the upper bound itself is never a grid point.
//! With the reference calibration and step 1e-5 this yields 17,820 points.

use serde::Serialize;

use crate::constants::*;
use crate::error::ConfigError;

/// Strictly increasing, positive capital grid. Immutable once built.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CapitalGrid {
    points: Vec<f64>,
}

impl CapitalGrid {
    /// Validate and wrap an explicit list of grid points.
    pub fn from_points(points: Vec<f64>) -> Result<Self, ConfigError> {
        if points.is_empty() {
            return Err(ConfigError::EmptyGrid);
        }
        for (index, &value) in points.iter().enumerate() {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::NonPositiveGrid { index, value });
            }
            if index > 0 && value <= points[index - 1] {
                return Err(ConfigError::UnorderedGrid { index });
            }
        }
        Ok(Self { points })
    }

    /// Half-open range `[lower, upper)` with spacing `step`.
    pub fn arange(lower: f64, upper: f64, step: f64) -> Result<Self, ConfigError> {
        if !(lower.is_finite() && upper.is_finite() && step.is_finite())
            || step <= 0.0
            || upper <= lower
        {
            return Err(ConfigError::InvalidStep { lower, upper, step });
        }
        let n = ((upper - lower) / step).ceil();
        if !n.is_finite() || n > MAX_GRID_POINTS as f64 {
            return Err(ConfigError::InvalidStep { lower, upper, step });
        }
        let n = n as usize;
        Self::from_points((0..n).map(|i| lower + i as f64 * step).collect())
    }

    /// `n` evenly spaced points from `lower` to `upper`, both included.
    pub fn linspace(lower: f64, upper: f64, n: usize) -> Result<Self, ConfigError> {
        if n < 2
            || n > MAX_GRID_POINTS
            || !(lower.is_finite() && upper.is_finite())
            || upper <= lower
        {
            return Err(ConfigError::InvalidStep {
                lower,
                upper,
                step: if n < 2 { 0.0 } else { (upper - lower) / (n - 1) as f64 },
            });
        }
        let step = (upper - lower) / (n - 1) as f64;
        Self::from_points((0..n).map(|i| lower + i as f64 * step).collect())
    }

    /// The grid the reference run uses: `[0.5 k_ss, 1.5 k_ss)` with spacing `step`.
    pub fn around_steady_state(steady_capital: f64, step: f64) -> Result<Self, ConfigError> {
        Self::arange(
            GRID_LOWER_FACTOR * steady_capital,
            GRID_UPPER_FACTOR * steady_capital,
            step,
        )
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    #[inline(always)]
    pub fn points(&self) -> &[f64] {
        &self.points
    }

    #[inline(always)]
    pub fn get(&self, index: usize) -> f64 {
        self.points[index]
    }
}

/// Build `payoff[k, z] = productivity[z] * capital[k]^alpha` in productivity-major
/// layout (see [`grid_index`]).
pub fn build_payoff_table(grid: &CapitalGrid, productivity: &[f64], alpha: f64) -> Vec<f64> {
    let n_capital = grid.len();
    let mut payoff = vec![0.0; n_capital * productivity.len()];
    let output: Vec<f64> = grid.points().iter().map(|k| k.powf(alpha)).collect();
    for (z, &level) in productivity.iter().enumerate() {
        let column = &mut payoff[grid_index(0, z, n_capital)..][..n_capital];
        for (slot, &y) in column.iter_mut().zip(&output) {
            *slot = level * y;
        }
    }
    payoff
}
