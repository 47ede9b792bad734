//! Run summary: console lines and JSON export.

use std::fs;
use std::path::Path;
use std::time::Instant;

use serde::Serialize;
use thiserror::Error;

use crate::calibration::{Calibration, SteadyState};
use crate::constants::*;
use crate::types::{RbcContext, Solution};

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("failed to write report: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to serialize report: {0}")]
    Json(#[from] serde_json::Error),
}

/// Policy value at a fixed state, used to compare runs across implementations.
#[derive(Clone, Copy, Debug, Serialize)]
pub struct CheckValue {
    pub capital_index: usize,
    pub productivity_index: usize,
    pub capital: f64,
    pub policy: f64,
}

/// Serializable summary of a converged run.
#[derive(Clone, Debug, Serialize)]
pub struct SolutionReport {
    pub calibration: Calibration,
    pub steady_state: SteadyState,
    pub n_capital: usize,
    pub n_productivity: usize,
    pub grid_lower: f64,
    pub grid_upper: f64,
    pub tolerance: f64,
    pub iterations: usize,
    pub sup_diff: f64,
    /// Time spent in the iteration loop alone.
    pub solve_secs: f64,
    /// Wall time of the whole run. Equals `solve_secs` unless a start time is
    /// supplied with [`SolutionReport::with_start_time`].
    pub elapsed_secs: f64,
    /// `None` when the grid is too small to contain the check state.
    pub check: Option<CheckValue>,
}

impl SolutionReport {
    pub fn new(ctx: &RbcContext, solution: &Solution) -> Self {
        let grid = ctx.grid();
        let check = (CHECK_CAPITAL_INDEX < ctx.n_capital()
            && CHECK_PRODUCTIVITY_INDEX < ctx.n_productivity())
        .then(|| CheckValue {
            capital_index: CHECK_CAPITAL_INDEX,
            productivity_index: CHECK_PRODUCTIVITY_INDEX,
            capital: grid.get(CHECK_CAPITAL_INDEX),
            policy: solution.policy(CHECK_CAPITAL_INDEX, CHECK_PRODUCTIVITY_INDEX),
        });
        Self {
            calibration: ctx.calibration().clone(),
            steady_state: ctx.steady_state(),
            n_capital: ctx.n_capital(),
            n_productivity: ctx.n_productivity(),
            grid_lower: grid.get(0),
            grid_upper: grid.get(grid.len() - 1),
            tolerance: TOLERANCE,
            iterations: solution.iterations,
            sup_diff: solution.sup_diff,
            solve_secs: solution.elapsed.as_secs_f64(),
            elapsed_secs: solution.elapsed.as_secs_f64(),
            check,
        }
    }

    /// Measure `elapsed_secs` from `started`, covering setup as well as the solve.
    pub fn with_start_time(mut self, started: Instant) -> Self {
        self.elapsed_secs = started.elapsed().as_secs_f64().max(self.solve_secs);
        self
    }

    /// Console summary in the order the reference run prints it.
    pub fn summary_lines(&self) -> Vec<String> {
        let mut lines = vec![
            steady_state_line(&self.steady_state),
            format!(
                " Iteration = {}, Sup Diff = {:e}",
                self.iterations, self.sup_diff
            ),
        ];
        if let Some(check) = &self.check {
            lines.push(format!(" My Check = {}", check.policy));
        }
        lines.push(format!("Elapsed time is {:.2} seconds", self.elapsed_secs));
        lines
    }

    pub fn to_json(&self) -> Result<String, ReportError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write pretty JSON to `path`, creating parent directories.
    pub fn write_json(&self, path: &Path) -> Result<(), ReportError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(path, self.to_json()?)?;
        Ok(())
    }
}

pub fn steady_state_line(ss: &SteadyState) -> String {
    format!(
        "Output = {} Capital = {} Consumption = {}",
        ss.output, ss.capital, ss.consumption
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::CapitalGrid;
    use crate::vfi::solve;

    fn small_run() -> (RbcContext, Solution) {
        let cal = Calibration::reference();
        let k_ss = cal.steady_state().capital;
        let grid = CapitalGrid::linspace(0.5 * k_ss, 1.5 * k_ss, 30).unwrap();
        let ctx = RbcContext::new(cal, grid).unwrap();
        let solution = solve(&ctx).unwrap();
        (ctx, solution)
    }

    #[test]
    fn test_report_fields() {
        let (ctx, solution) = small_run();
        let report = SolutionReport::new(&ctx, &solution);
        assert_eq!(report.n_capital, 30);
        assert_eq!(report.iterations, solution.iterations);
        // 30 grid points do not reach the check index.
        assert!(report.check.is_none());
        let lines = report.summary_lines();
        assert_eq!(lines.len(), 3);
        assert!(lines[1].starts_with(" Iteration = "));
    }

    #[test]
    fn test_elapsed_covers_setup() {
        let started = Instant::now();
        let (ctx, solution) = small_run();
        std::thread::sleep(std::time::Duration::from_millis(20));

        let solve_only = SolutionReport::new(&ctx, &solution);
        assert_eq!(solve_only.elapsed_secs, solve_only.solve_secs);

        let report = SolutionReport::new(&ctx, &solution).with_start_time(started);
        assert_eq!(report.solve_secs, solution.elapsed.as_secs_f64());
        assert!(report.elapsed_secs >= report.solve_secs + 0.019);
        let last = report.summary_lines().pop().unwrap();
        assert_eq!(last, format!("Elapsed time is {:.2} seconds", report.elapsed_secs));
    }

    #[test]
    fn test_report_json_roundtrip() {
        let (ctx, solution) = small_run();
        let report = SolutionReport::new(&ctx, &solution);
        let json: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
        assert_eq!(json["n_productivity"], 5);
        assert_eq!(json["iterations"], solution.iterations);
        assert_eq!(json["calibration"]["transition"].as_array().unwrap().len(), 5);
        assert!(json["check"].is_null());
        assert!(json["solve_secs"].as_f64().unwrap() <= json["elapsed_secs"].as_f64().unwrap());
    }

    #[test]
    fn test_write_json_creates_parent() {
        let (ctx, solution) = small_run();
        let report = SolutionReport::new(&ctx, &solution);
        let dir = std::env::temp_dir().join(format!("rbc-report-{}", std::process::id()));
        let path = dir.join("nested").join("report.json");
        report.write_json(&path).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        assert!(text.contains("\"steady_state\""));
        let _ = fs::remove_dir_all(&dir);
    }
}
