//! Environment configuration for the solver binary.
//!
//! Reads `RBC_GRID_STEP`, `RBC_REPORT_EVERY`, `RBC_OUTPUT`,
//! `RAYON_NUM_THREADS` and `RUST_LOG`. Unset variables fall back to defaults;
//! malformed values are rejected rather than silently ignored.

use std::path::PathBuf;

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::constants::*;
use crate::error::ConfigError;

const DEFAULT_THREADS: usize = 8;

/// Settings for one batch run, resolved from the environment.
#[derive(Clone, Debug, PartialEq)]
pub struct RunConfig {
    /// Capital grid spacing (`RBC_GRID_STEP`, default 1e-5).
    pub grid_step: f64,
    /// Progress log interval in iterations (`RBC_REPORT_EVERY`, default 10).
    pub report_every: usize,
    /// JSON report destination (`RBC_OUTPUT`, unset = no file).
    pub output: Option<PathBuf>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            grid_step: DEFAULT_GRID_STEP,
            report_every: DEFAULT_REPORT_EVERY,
            output: None,
        }
    }
}

impl RunConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Resolve from an arbitrary variable source (tests pass a closure).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(raw) = lookup("RBC_GRID_STEP") {
            config.grid_step = raw
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|s| s.is_finite() && *s > 0.0)
                .ok_or(ConfigError::InvalidEnv {
                    var: "RBC_GRID_STEP",
                    value: raw.clone(),
                })?;
        }

        if let Some(raw) = lookup("RBC_REPORT_EVERY") {
            config.report_every = raw
                .trim()
                .parse::<usize>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or(ConfigError::InvalidEnv {
                    var: "RBC_REPORT_EVERY",
                    value: raw.clone(),
                })?;
        }

        config.output = lookup("RBC_OUTPUT")
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from);

        Ok(config)
    }
}

/// Worker count from `RAYON_NUM_THREADS`, then `OMP_NUM_THREADS`, default 8.
/// Zero or unparsable values fall through to the next source.
pub fn thread_count_from<F>(lookup: F) -> usize
where
    F: Fn(&str) -> Option<String>,
{
    ["RAYON_NUM_THREADS", "OMP_NUM_THREADS"]
        .into_iter()
        .find_map(|var| {
            let raw = lookup(var)?;
            match raw.trim().parse::<usize>() {
                Ok(n) if n > 0 => Some(n),
                _ => {
                    warn!(var, value = %raw, "ignoring thread count");
                    None
                }
            }
        })
        .unwrap_or(DEFAULT_THREADS)
}

/// Size the rayon global pool from the environment and return the number of
/// workers actually available. A pool built earlier in the process is kept.
pub fn init_rayon_threads() -> usize {
    let requested = thread_count_from(|var| std::env::var(var).ok());
    match rayon::ThreadPoolBuilder::new()
        .num_threads(requested)
        .build_global()
    {
        Ok(()) => info!(threads = requested, "rayon pool ready"),
        Err(err) => warn!(
            requested,
            threads = rayon::current_num_threads(),
            %err,
            "rayon pool already initialised"
        ),
    }
    rayon::current_num_threads()
}

/// Install a `tracing` subscriber filtered by `RUST_LOG` (default `info`).
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .ok();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RbcContext;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |var| map.get(var).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = RunConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, RunConfig::default());
        assert_eq!(config.grid_step, 1e-5);
        assert_eq!(config.report_every, 10);
    }

    #[test]
    fn test_overrides() {
        let config = RunConfig::from_lookup(lookup(&[
            ("RBC_GRID_STEP", "0.001"),
            ("RBC_REPORT_EVERY", " 25 "),
            ("RBC_OUTPUT", "out/report.json"),
        ]))
        .unwrap();
        assert_eq!(config.grid_step, 0.001);
        assert_eq!(config.report_every, 25);
        assert_eq!(config.output, Some(PathBuf::from("out/report.json")));
    }

    #[test]
    fn test_rejects_malformed_values() {
        for (var, value) in [
            ("RBC_GRID_STEP", "abc"),
            ("RBC_GRID_STEP", "-1e-5"),
            ("RBC_GRID_STEP", "0"),
            ("RBC_REPORT_EVERY", "0"),
            ("RBC_REPORT_EVERY", "ten"),
        ] {
            let err = RunConfig::from_lookup(lookup(&[(var, value)])).unwrap_err();
            assert!(
                matches!(err, ConfigError::InvalidEnv { var: v, .. } if v == var),
                "{var}={value}: {err:?}"
            );
        }
    }

    #[test]
    fn test_tiny_step_is_refused_before_allocation() {
        // Parses as a positive float, but would need ~1e295 grid points.
        let config = RunConfig::from_lookup(lookup(&[("RBC_GRID_STEP", "1e-300")])).unwrap();
        assert_eq!(config.grid_step, 1e-300);
        assert!(matches!(
            RbcContext::reference(config.grid_step),
            Err(ConfigError::InvalidStep { step, .. }) if step == 1e-300
        ));
    }

    #[test]
    fn test_thread_count_sources() {
        assert_eq!(thread_count_from(lookup(&[])), 8);
        assert_eq!(
            thread_count_from(lookup(&[("RAYON_NUM_THREADS", "3"), ("OMP_NUM_THREADS", "5")])),
            3
        );
        assert_eq!(thread_count_from(lookup(&[("OMP_NUM_THREADS", " 5 ")])), 5);
        assert_eq!(
            thread_count_from(lookup(&[("RAYON_NUM_THREADS", "0"), ("OMP_NUM_THREADS", "2")])),
            2
        );
        assert_eq!(thread_count_from(lookup(&[("RAYON_NUM_THREADS", "many")])), 8);
    }

    #[test]
    fn test_empty_output_is_unset() {
        let config = RunConfig::from_lookup(lookup(&[("RBC_OUTPUT", "  ")])).unwrap();
        assert_eq!(config.output, None);
    }
}
