//! Model calibration and the deterministic steady state.
//!
//! A [`Calibration`] bundles the structural parameters (alpha, beta) with the
//! discretised productivity process. [`Calibration::validate`] enforces every
//! invariant the solver relies on, so it never has to re-check them inside the
//! iteration loop.

use serde::Serialize;

use crate::constants::*;
use crate::error::ConfigError;

/// Structural parameters and the Markov productivity chain.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Calibration {
    /// Capital share, 0 < alpha < 1.
    pub alpha: f64,
    /// Discount factor, 0 < beta < 1.
    pub beta: f64,
    /// Productivity levels, strictly increasing and positive.
    pub productivity: Vec<f64>,
    /// Row-stochastic transition matrix: `transition[z][z']` = P(z' | z).
    pub transition: Vec<Vec<f64>>,
}

impl Calibration {
    /// The benchmark calibration: alpha = 1/3, beta = 0.95 and the 5-state chain.
    pub fn reference() -> Self {
        Self {
            alpha: REFERENCE_ALPHA,
            beta: REFERENCE_BETA,
            productivity: REFERENCE_PRODUCTIVITY.to_vec(),
            transition: REFERENCE_TRANSITION.iter().map(|row| row.to_vec()).collect(),
        }
    }

    /// Number of productivity states.
    pub fn n_productivity(&self) -> usize {
        self.productivity.len()
    }

    /// Check parameter ranges, the productivity ordering and that the
    /// transition matrix is a square Markov kernel.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_unit_interval("alpha", self.alpha)?;
        check_unit_interval("beta", self.beta)?;

        let n = self.productivity.len();
        if n == 0 {
            return Err(ConfigError::EmptyProductivity);
        }
        for (index, &value) in self.productivity.iter().enumerate() {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::NonPositiveProductivity { index, value });
            }
            if index > 0 && value <= self.productivity[index - 1] {
                return Err(ConfigError::UnorderedProductivity { index });
            }
        }

        if self.transition.len() != n {
            return Err(ConfigError::TransitionShape {
                expected: n,
                rows: self.transition.len(),
                cols: self.transition.first().map_or(0, Vec::len),
            });
        }
        for (row, probs) in self.transition.iter().enumerate() {
            if probs.len() != n {
                return Err(ConfigError::TransitionShape {
                    expected: n,
                    rows: self.transition.len(),
                    cols: probs.len(),
                });
            }
            for (col, &value) in probs.iter().enumerate() {
                if !(value.is_finite() && value >= 0.0) {
                    return Err(ConfigError::NegativeTransition { row, col, value });
                }
            }
            let sum: f64 = probs.iter().sum();
            if (sum - 1.0).abs() > ROW_SUM_TOLERANCE {
                return Err(ConfigError::NonStochasticRow { row, sum });
            }
        }
        Ok(())
    }

    /// Closed-form deterministic steady state (z = 1) of this calibration.
    pub fn steady_state(&self) -> SteadyState {
        SteadyState::new(self.alpha, self.beta)
    }
}

fn check_unit_interval(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 && value < 1.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidParameter { name, value })
    }
}

/// Deterministic steady state under full depreciation and log utility.
///
/// - capital = (alpha * beta)^(1 / (1 - alpha))
/// - output = capital^alpha
/// - consumption = output - capital
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct SteadyState {
    pub capital: f64,
    pub output: f64,
    pub consumption: f64,
}

impl SteadyState {
    pub fn new(alpha: f64, beta: f64) -> Self {
        let capital = (alpha * beta).powf(1.0 / (1.0 - alpha));
        let output = capital.powf(alpha);
        Self {
            capital,
            output,
            consumption: output - capital,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_is_valid() {
        assert_eq!(Calibration::reference().validate(), Ok(()));
    }

    #[test]
    fn test_rejects_out_of_range_parameters() {
        let mut cal = Calibration::reference();
        cal.alpha = 1.0;
        assert!(matches!(
            cal.validate(),
            Err(ConfigError::InvalidParameter { name: "alpha", .. })
        ));

        let mut cal = Calibration::reference();
        cal.beta = 0.0;
        assert!(matches!(
            cal.validate(),
            Err(ConfigError::InvalidParameter { name: "beta", .. })
        ));

        let mut cal = Calibration::reference();
        cal.beta = f64::NAN;
        assert!(cal.validate().is_err());
    }

    #[test]
    fn test_rejects_bad_productivity() {
        let mut cal = Calibration::reference();
        cal.productivity.clear();
        cal.transition.clear();
        assert_eq!(cal.validate(), Err(ConfigError::EmptyProductivity));

        let mut cal = Calibration::reference();
        cal.productivity[0] = -0.5;
        assert!(matches!(
            cal.validate(),
            Err(ConfigError::NonPositiveProductivity { index: 0, .. })
        ));

        let mut cal = Calibration::reference();
        cal.productivity.swap(1, 2);
        assert_eq!(
            cal.validate(),
            Err(ConfigError::UnorderedProductivity { index: 2 })
        );
    }

    #[test]
    fn test_rejects_bad_transition() {
        let mut cal = Calibration::reference();
        cal.transition.pop();
        assert!(matches!(
            cal.validate(),
            Err(ConfigError::TransitionShape { expected: 5, rows: 4, .. })
        ));

        let mut cal = Calibration::reference();
        cal.transition[3].push(0.0);
        assert!(matches!(
            cal.validate(),
            Err(ConfigError::TransitionShape { cols: 6, .. })
        ));

        let mut cal = Calibration::reference();
        cal.transition[1] = vec![0.5, 0.6, -0.1, 0.0, 0.0];
        assert!(matches!(
            cal.validate(),
            Err(ConfigError::NegativeTransition { row: 1, col: 2, .. })
        ));

        let mut cal = Calibration::reference();
        cal.transition[4] = vec![0.0, 0.0, 0.0, 0.5, 0.4];
        assert!(matches!(
            cal.validate(),
            Err(ConfigError::NonStochasticRow { row: 4, .. })
        ));
    }

    #[test]
    fn test_steady_state_closed_form() {
        let ss = Calibration::reference().steady_state();
        let expected_k = (REFERENCE_ALPHA * REFERENCE_BETA).powf(1.5);
        assert!((ss.capital - expected_k).abs() < 1e-15);
        assert!((ss.output - ss.capital.powf(REFERENCE_ALPHA)).abs() < 1e-15);
        assert!((ss.consumption - (ss.output - ss.capital)).abs() < 1e-15);
        assert!(ss.capital > 0.178 && ss.capital < 0.1783, "k_ss = {}", ss.capital);
    }
}
