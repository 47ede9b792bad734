//! rbc-solve: solve the reference RBC model by value function iteration.
//!
//! Configuration comes from the environment (see `rbc::env_config`):
//! `RBC_GRID_STEP`, `RBC_REPORT_EVERY`, `RBC_OUTPUT`, `RAYON_NUM_THREADS`, `RUST_LOG`.

use std::time::Instant;

use rbc::env_config::{init_rayon_threads, init_tracing, RunConfig};
use rbc::report::{steady_state_line, SolutionReport};
use rbc::types::RbcContext;
use rbc::vfi::VfiSolver;

fn main() {
    let started = Instant::now();
    init_tracing();

    let config = RunConfig::from_env().unwrap_or_else(|e| {
        eprintln!("Configuration error: {}", e);
        std::process::exit(1);
    });
    let num_threads = init_rayon_threads();

    println!("RBC value function iteration (Rust)");
    println!("Using {} threads", num_threads);

    let ctx = RbcContext::reference(config.grid_step).unwrap_or_else(|e| {
        eprintln!("Invalid model configuration: {}", e);
        std::process::exit(1);
    });
    println!("{}", steady_state_line(&ctx.steady_state()));
    println!(
        "Grid: {} capital points x {} productivity states",
        ctx.n_capital(),
        ctx.n_productivity()
    );

    let mut solver = VfiSolver::new(&ctx).with_report_every(config.report_every);
    let solution = solver.run().unwrap_or_else(|e| {
        eprintln!("Solver failed: {}", e);
        std::process::exit(1);
    });

    let report = SolutionReport::new(&ctx, &solution).with_start_time(started);
    for line in report.summary_lines().iter().skip(1) {
        println!("{}", line);
    }

    if let Some(path) = &config.output {
        if let Err(e) = report.write_json(path) {
            eprintln!("{}", e);
            std::process::exit(1);
        }
        println!("Report written to {}", path.display());
    }
}
