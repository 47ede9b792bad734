//! Full reference run: benchmark calibration on the 17,820-point grid.
//!
//! Checks the published benchmark numbers (257 iterations, policy(999, 2) =
//! 0.1465491436962635) and compares the converged policy with the closed-form
//! full-depreciation policy k' = alpha * beta * z * k^alpha.

use std::sync::OnceLock;

use approx::assert_abs_diff_eq;

use rbc::constants::*;
use rbc::report::SolutionReport;
use rbc::types::{RbcContext, Solution};
use rbc::vfi::solve;

const REFERENCE_CHECK: f64 = 0.1465491436962635;
const REFERENCE_ITERATIONS: usize = 257;

// The run takes a few seconds; compute it once per test binary.
static RUN: OnceLock<(RbcContext, Solution)> = OnceLock::new();

fn reference_run() -> &'static (RbcContext, Solution) {
    RUN.get_or_init(|| {
        let ctx = RbcContext::reference(DEFAULT_GRID_STEP).unwrap();
        let solution = solve(&ctx).unwrap();
        (ctx, solution)
    })
}

#[test]
fn converges_below_tolerance() {
    let (ctx, solution) = reference_run();
    assert_eq!(ctx.n_capital(), 17_820);
    assert_eq!(ctx.n_productivity(), 5);
    assert!(solution.sup_diff < TOLERANCE, "sup_diff = {}", solution.sup_diff);
    assert_eq!(solution.iterations, REFERENCE_ITERATIONS);
}

#[test]
fn check_value_matches_reference() {
    let (_, solution) = reference_run();
    let check = solution.policy(CHECK_CAPITAL_INDEX, CHECK_PRODUCTIVITY_INDEX);
    println!("My Check = {}", check);
    assert_abs_diff_eq!(check, REFERENCE_CHECK, epsilon = DEFAULT_GRID_STEP / 2.0);
}

#[test]
fn policy_close_to_closed_form() {
    let (ctx, solution) = reference_run();
    let cal = ctx.calibration();
    let grid = ctx.grid();
    let lower = grid.get(0);
    let upper = grid.get(grid.len() - 1);

    let k = grid.get(CHECK_CAPITAL_INDEX);
    let z = cal.productivity[CHECK_PRODUCTIVITY_INDEX];
    let analytic = cal.alpha * cal.beta * z * k.powf(cal.alpha);
    assert_abs_diff_eq!(
        solution.policy(CHECK_CAPITAL_INDEX, CHECK_PRODUCTIVITY_INDEX),
        analytic,
        epsilon = 2.0 * DEFAULT_GRID_STEP
    );

    let mut compared = 0;
    for zi in 0..ctx.n_productivity() {
        let z = cal.productivity[zi];
        for ki in 0..ctx.n_capital() {
            let analytic = cal.alpha * cal.beta * z * grid.get(ki).powf(cal.alpha);
            if analytic < lower || analytic > upper {
                continue;
            }
            compared += 1;
            let got = solution.policy(ki, zi);
            assert!(
                (got - analytic).abs() <= 5.0 * DEFAULT_GRID_STEP,
                "state ({ki}, {zi}): policy {got} vs closed form {analytic}"
            );
        }
    }
    assert!(compared > ctx.n_states() / 2);
}

#[test]
fn policy_monotone_in_capital() {
    let (ctx, solution) = reference_run();
    for z in 0..ctx.n_productivity() {
        assert!(solution
            .policy_index_column(z)
            .windows(2)
            .all(|w| w[0] <= w[1]));
    }
}

#[test]
fn report_carries_check_value() {
    let (ctx, solution) = reference_run();
    let report = SolutionReport::new(ctx, solution);
    let check = report.check.expect("grid reaches the check index");
    assert_eq!(check.capital_index, 999);
    assert_eq!(check.productivity_index, 2);
    assert_eq!(check.policy, solution.policy(999, 2));
    assert_eq!(report.iterations, solution.iterations);
    assert!(report.summary_lines()[2].starts_with(" My Check = 0.14654"));
}
