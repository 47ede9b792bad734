//! Model constants and state-indexing functions.
//!
//! Maps model notation to concrete values:
//! - alpha = [`REFERENCE_ALPHA`] = 1/3 (capital share)
//! - beta = [`REFERENCE_BETA`] = 0.95 (discount factor)
//! - |Z| = [`REFERENCE_PRODUCTIVITY`].len() = 5
//! - STATE_INDEX(k, z) = [`grid_index`]`(k, z, nK)` = z * nK + k
//!
//! The index layout groups all capital points of the same productivity level
//! into one contiguous column, so every column of the value, expected-value and
//! policy tables is a plain slice that can be handed to its own rayon worker.

/// Elasticity of output with respect to capital.
pub const REFERENCE_ALPHA: f64 = 1.0 / 3.0;

/// Discount factor.
pub const REFERENCE_BETA: f64 = 0.95;

/// Productivity levels of the 5-state Markov chain (Tauchen discretisation).
pub const REFERENCE_PRODUCTIVITY: [f64; 5] = [0.9792, 0.9896, 1.0000, 1.0106, 1.0212];

/// Transition matrix P[z][z'] of the productivity chain.
///
/// Rounded to four decimals: the middle row sums to 1.0001, which is why
/// [`ROW_SUM_TOLERANCE`] is looser than machine precision.
pub const REFERENCE_TRANSITION: [[f64; 5]; 5] = [
    [0.9727, 0.0273, 0.0000, 0.0000, 0.0000],
    [0.0041, 0.9806, 0.0153, 0.0000, 0.0000],
    [0.0000, 0.0082, 0.9837, 0.0082, 0.0000],
    [0.0000, 0.0000, 0.0153, 0.9806, 0.0041],
    [0.0000, 0.0000, 0.0000, 0.0273, 0.9727],
];

/// Maximum |Σ_z' P[z][z'] - 1| accepted when validating a transition matrix.
pub const ROW_SUM_TOLERANCE: f64 = 1e-3;

/// Sup-norm convergence tolerance. Iteration continues while the difference
/// between successive value functions exceeds this.
pub const TOLERANCE: f64 = 1e-7;

/// Default spacing of the capital grid.
pub const DEFAULT_GRID_STEP: f64 = 1e-5;

/// Largest capital grid a run may allocate. Each grid point costs five f64
/// tables per productivity state, so this caps memory at a few GB.
pub const MAX_GRID_POINTS: usize = 10_000_000;

/// Capital grid lower bound as a fraction of steady-state capital.
pub const GRID_LOWER_FACTOR: f64 = 0.5;

/// Capital grid upper bound (exclusive) as a fraction of steady-state capital.
pub const GRID_UPPER_FACTOR: f64 = 1.5;

/// Default progress interval (in iterations) for the solver log.
pub const DEFAULT_REPORT_EVERY: usize = 10;

/// Capital index of the reported check value (the 1000th grid point).
pub const CHECK_CAPITAL_INDEX: usize = 999;

/// Productivity index of the reported check value (the middle state, z = 1.0).
pub const CHECK_PRODUCTIVITY_INDEX: usize = 2;

/// Map state (capital index k, productivity index z) to a flat table index.
///
/// Layout: `z * n_capital + k`. Each productivity level owns the contiguous
/// range `z * n_capital .. (z + 1) * n_capital`.
#[inline(always)]
pub fn grid_index(capital: usize, productivity: usize, n_capital: usize) -> usize {
    debug_assert!(
        capital < n_capital,
        "capital index {} out of range",
        capital
    );
    productivity * n_capital + capital
}
