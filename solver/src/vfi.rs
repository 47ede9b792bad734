//! Value function iteration driver.
//!
//! [`VfiSolver`] owns the mutable state of the fixed-point iteration: the
//! current value function, a scratch buffer for the next iterate, the expected
//! value table and the policy. Each [`VfiSolver::step`]:
//!
//! 1. computes E from the current value function,
//! 2. runs the monotone search for every productivity column in parallel,
//!    writing into the scratch buffer,
//! 3. measures the sup-norm change and swaps the buffers.
//!
//! The policy is double-buffered the same way, so a step that fails leaves
//! the solver exactly as the last successful step left it.
//!
//! The expectation is always taken over the previous iterate; the search never
//! reads the buffer it writes. Columns are disjoint slices of the
//! productivity-major tables, so rayon workers need no synchronisation, and the
//! result does not depend on the thread count.

use std::time::Instant;

use rayon::prelude::*;
use tracing::{debug, info};

use crate::bellman::{expected_value, solve_column, sup_norm_diff, SearchColumn};
use crate::constants::*;
use crate::error::SolveError;
use crate::types::{IterationReport, RbcContext, Solution};

/// Progress tracker for the iteration loop.
struct ConvergenceProgress {
    start_time: Instant,
    report_every: usize,
}

impl ConvergenceProgress {
    fn new(report_every: usize) -> Self {
        Self {
            start_time: Instant::now(),
            report_every: report_every.max(1),
        }
    }

    fn record(&self, report: &IterationReport) {
        if report.iteration == 1 || report.iteration % self.report_every == 0 {
            info!(
                iteration = report.iteration,
                sup_diff = report.sup_diff,
                elapsed_s = self.start_time.elapsed().as_secs_f64(),
                "vfi progress"
            );
        }
    }
}

/// Double-buffered value function iteration over an [`RbcContext`].
pub struct VfiSolver<'a> {
    ctx: &'a RbcContext,
    /// Current iterate V_n.
    value: Vec<f64>,
    /// Scratch buffer receiving V_{n+1}; holds stale data between steps.
    value_next: Vec<f64>,
    /// E[k', z] computed from `value` at the start of each step.
    expected: Vec<f64>,
    /// Arg-max grid index per state from the latest step.
    policy_index: Vec<usize>,
    /// Scratch buffer receiving the next policy.
    policy_next: Vec<usize>,
    iteration: usize,
    sup_diff: f64,
    report_every: usize,
}

impl<'a> VfiSolver<'a> {
    /// Start from the zero value function.
    pub fn new(ctx: &'a RbcContext) -> Self {
        let n = ctx.n_states();
        Self {
            ctx,
            value: vec![0.0; n],
            value_next: vec![0.0; n],
            expected: vec![0.0; n],
            policy_index: vec![0; n],
            policy_next: vec![0; n],
            iteration: 0,
            sup_diff: f64::INFINITY,
            report_every: DEFAULT_REPORT_EVERY,
        }
    }

    /// Log progress every `every` iterations (and after the first).
    pub fn with_report_every(mut self, every: usize) -> Self {
        self.report_every = every.max(1);
        self
    }

    pub fn context(&self) -> &RbcContext {
        self.ctx
    }

    /// Completed iterations.
    pub fn iteration(&self) -> usize {
        self.iteration
    }

    /// Sup-norm change of the latest step (infinite before the first step).
    pub fn sup_diff(&self) -> f64 {
        self.sup_diff
    }

    pub fn is_converged(&self) -> bool {
        self.sup_diff <= TOLERANCE
    }

    /// Current value function (productivity-major).
    pub fn value(&self) -> &[f64] {
        &self.value
    }

    /// Expected value table used by the latest step.
    pub fn expected(&self) -> &[f64] {
        &self.expected
    }

    /// Policy grid indices from the latest step.
    pub fn policy_index(&self) -> &[usize] {
        &self.policy_index
    }

    /// Apply the Bellman operator once.
    pub fn step(&mut self) -> Result<IterationReport, SolveError> {
        let ctx = self.ctx;
        let n_capital = ctx.n_capital();
        let calibration = ctx.calibration();

        expected_value(
            &self.value,
            &calibration.transition,
            n_capital,
            &mut self.expected,
        );

        let capital = ctx.grid().points();
        let beta = calibration.beta;
        let expected = &self.expected;
        let evaluations = self
            .value_next
            .par_chunks_mut(n_capital)
            .zip(self.policy_next.par_chunks_mut(n_capital))
            .enumerate()
            .map(|(z, (value_column, policy_column))| {
                let column = SearchColumn::new(
                    capital,
                    ctx.payoff_column(z),
                    &expected[z * n_capital..(z + 1) * n_capital],
                    beta,
                );
                solve_column(&column, z, value_column, policy_column)
            })
            .try_reduce(|| 0, |a, b| Ok(a + b))?;

        let sup_diff = sup_norm_diff(&self.value_next, &self.value);
        std::mem::swap(&mut self.value, &mut self.value_next);
        std::mem::swap(&mut self.policy_index, &mut self.policy_next);
        self.iteration += 1;
        self.sup_diff = sup_diff;

        debug!(iteration = self.iteration, sup_diff, evaluations, "bellman step");
        Ok(IterationReport {
            iteration: self.iteration,
            sup_diff,
            evaluations,
        })
    }

    /// Iterate until the sup-norm change drops to [`TOLERANCE`].
    ///
    /// There is no iteration cap. Callers that need one should drive
    /// [`step`](Self::step) directly and inspect the reports.
    pub fn run(&mut self) -> Result<Solution, SolveError> {
        let progress = ConvergenceProgress::new(self.report_every);
        info!(
            n_capital = self.ctx.n_capital(),
            n_productivity = self.ctx.n_productivity(),
            tolerance = TOLERANCE,
            "starting value function iteration"
        );

        while self.sup_diff > TOLERANCE {
            let report = self.step()?;
            progress.record(&report);
        }

        let elapsed = progress.start_time.elapsed();
        info!(
            iterations = self.iteration,
            sup_diff = self.sup_diff,
            elapsed_s = elapsed.as_secs_f64(),
            "value function iteration converged"
        );

        let capital = self.ctx.grid().points();
        Ok(Solution {
            n_capital: self.ctx.n_capital(),
            n_productivity: self.ctx.n_productivity(),
            value: self.value.clone(),
            policy: self.policy_index.iter().map(|&i| capital[i]).collect(),
            policy_index: self.policy_index.clone(),
            iterations: self.iteration,
            sup_diff: self.sup_diff,
            elapsed,
        })
    }
}

/// Solve `ctx` from the zero value function.
pub fn solve(ctx: &RbcContext) -> Result<Solution, SolveError> {
    VfiSolver::new(ctx).run()
}
