//! Least-squares fitting of the pricing curve to benchmark points.

use anyhow::bail;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::benchmark::BenchmarkPoint;
use crate::curve::{check_domain, CurveParameters, DomainError, DEFAULT_OFFSET};
use crate::linear::regression::RegressionModel;
use crate::opt::{
    levenberg_marquardt, univariate_descent, LevenbergMarquardtConfig, UnivariateDescentConfig,
};

/// Starting point of the `(a, b)` search.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InitialGuess {
    /// `a = b = 1`.
    #[default]
    Unit,
    /// An explicitly pinned starting point.
    Pinned { a: f64, b: f64 },
    /// Ordinary least squares on `ln(x + c)`, falling back to the secant through the extreme
    /// points when there are too few points to regress.
    Regression,
}

/// Whether the offset `c` is held fixed or fitted alongside `a` and `b`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OffsetMode {
    Fixed(f64),
    Free(UnivariateDescentConfig),
}
impl Default for OffsetMode {
    fn default() -> Self {
        Self::Fixed(DEFAULT_OFFSET)
    }
}
impl OffsetMode {
    /// Searches `c` from the default offset.
    pub fn free() -> Self {
        Self::Free(UnivariateDescentConfig {
            init_value: DEFAULT_OFFSET,
            init_step: 1.0,
            min_step: 1e-6,
            max_steps: 10_000,
            acceptable_residual: 0.0,
        })
    }

    /// The offset the search starts from (or stays at).
    pub fn init_offset(&self) -> f64 {
        match self {
            OffsetMode::Fixed(offset) => *offset,
            OffsetMode::Free(config) => config.init_value,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FitConfig {
    pub offset: OffsetMode,
    pub init: InitialGuess,
    pub solver: LevenbergMarquardtConfig,
}
impl FitConfig {
    pub fn validate(&self) -> Result<(), anyhow::Error> {
        self.solver.validate()?;
        match &self.offset {
            OffsetMode::Fixed(offset) if !offset.is_finite() => bail!("offset must be finite"),
            OffsetMode::Free(descent) => descent.validate()?,
            _ => {}
        }
        if let InitialGuess::Pinned { a, b } = self.init {
            if !a.is_finite() || !b.is_finite() {
                bail!("pinned initial guess must be finite");
            }
        }
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum FitError {
    #[error("at least 2 distinct benchmark inputs are required, got {distinct}")]
    InsufficientData { distinct: usize },

    #[error("{0}")]
    Domain(#[from] DomainError),

    #[error("curve fitting did not converge after {steps} steps (sum of squares {residual})")]
    NotConverged { steps: u64, residual: f64 },

    #[error("curve fitting produced non-finite parameters {0:?}")]
    NonFinite(CurveParameters),

    #[error("invalid fit config: {0}")]
    InvalidConfig(#[from] anyhow::Error),
}

#[derive(Debug, Clone, PartialEq)]
pub struct FitOutcome {
    pub params: CurveParameters,
    /// Sum of squared residuals at `params`.
    pub residual: f64,
    pub steps: u64,
}
impl FitOutcome {
    pub fn rmse(&self, observations: usize) -> f64 {
        match observations {
            0 => 0.0,
            _ => (self.residual / observations as f64).sqrt(),
        }
    }
}

/// Fits `f(x) = a + b·ln(x + c)` to `points` by minimising the sum of squared residuals.
///
/// `points` need not be sorted or unique, but must contain at least 2 distinct inputs, each
/// keeping `input + c` positive.
pub fn fit(points: &[BenchmarkPoint], config: &FitConfig) -> Result<FitOutcome, FitError> {
    config.validate()?;
    let distinct = count_distinct_inputs(points);
    if distinct < 2 {
        return Err(FitError::InsufficientData { distinct });
    }

    let outcome = match &config.offset {
        OffsetMode::Fixed(offset) => fit_fixed_offset(points, *offset, config)?,
        OffsetMode::Free(descent) => fit_free_offset(points, descent, config)?,
    };
    let params = &outcome.params;
    if !params.a.is_finite() || !params.b.is_finite() || !params.c.is_finite() {
        return Err(FitError::NonFinite(outcome.params));
    }
    debug!(
        "fitted {params:?} to {} points in {} steps, sum of squares: {}",
        points.len(),
        outcome.steps,
        outcome.residual
    );
    Ok(outcome)
}

fn count_distinct_inputs(points: &[BenchmarkPoint]) -> usize {
    let mut inputs: Vec<_> = points.iter().map(|point| point.input).collect();
    inputs.sort_by(f64::total_cmp);
    inputs.dedup();
    inputs.len()
}

fn fit_fixed_offset(
    points: &[BenchmarkPoint],
    offset: f64,
    config: &FitConfig,
) -> Result<FitOutcome, FitError> {
    for point in points {
        check_domain(point.input, offset)?;
    }
    // solves for a' = a + b·mean_log against centred logs, keeping the Jacobian's columns
    // orthogonal
    let logs: Vec<_> = points
        .iter()
        .map(|point| (point.input + offset).ln())
        .collect();
    let mean_log = logs.iter().sum::<f64>() / logs.len() as f64;
    let centred_logs: Vec<_> = logs.iter().map(|log| log - mean_log).collect();
    let (init_a, init_b) = initial_guess(points, offset, &config.init);

    let outcome = levenberg_marquardt(
        &config.solver,
        &[init_a + init_b * mean_log, init_b],
        points.len(),
        |values, residuals| {
            for (index, point) in points.iter().enumerate() {
                residuals[index] = values[0] + values[1] * centred_logs[index] - point.price;
            }
        },
        |_, jacobian| {
            for (index, log) in centred_logs.iter().enumerate() {
                jacobian[(index, 0)] = 1.0;
                jacobian[(index, 1)] = *log;
            }
        },
    );
    if !outcome.converged {
        return Err(FitError::NotConverged {
            steps: outcome.steps,
            residual: outcome.optimal_residual,
        });
    }
    Ok(FitOutcome {
        params: CurveParameters::with_offset(
            outcome.optimal_values[0] - outcome.optimal_values[1] * mean_log,
            outcome.optimal_values[1],
            offset,
        ),
        residual: outcome.optimal_residual,
        steps: outcome.steps,
    })
}

fn fit_free_offset(
    points: &[BenchmarkPoint],
    descent: &UnivariateDescentConfig,
    config: &FitConfig,
) -> Result<FitOutcome, FitError> {
    let min_input = points
        .iter()
        .map(|point| point.input)
        .fold(f64::INFINITY, f64::min);
    check_domain(min_input, config.offset.init_offset())?;

    let mut inner_steps = 0;
    let search = univariate_descent(descent, |offset| {
        if check_domain(min_input, offset).is_err() {
            return f64::INFINITY;
        }
        match fit_fixed_offset(points, offset, config) {
            Ok(outcome) => {
                inner_steps += outcome.steps;
                outcome.residual
            }
            Err(_) => f64::INFINITY,
        }
    });
    debug!(
        "offset search settled on c = {} after {} steps ({inner_steps} solver steps)",
        search.optimal_value, search.steps
    );
    if !search.optimal_residual.is_finite() {
        return Err(FitError::NotConverged {
            steps: search.steps,
            residual: search.optimal_residual,
        });
    }

    let outcome = fit_fixed_offset(points, search.optimal_value, config)?;
    Ok(FitOutcome {
        steps: search.steps + inner_steps + outcome.steps,
        ..outcome
    })
}

fn initial_guess(points: &[BenchmarkPoint], offset: f64, init: &InitialGuess) -> (f64, f64) {
    match init {
        InitialGuess::Unit => (1.0, 1.0),
        InitialGuess::Pinned { a, b } => (*a, *b),
        InitialGuess::Regression => {
            if count_distinct_inputs(points) > 2 {
                match RegressionModel::fit(points, offset) {
                    Ok(model) if model.coefficients.iter().all(|c| c.is_finite()) => {
                        return (model.coefficients[0], model.coefficients[1])
                    }
                    Ok(model) => debug!("discarding non-finite regression seed {model:?}"),
                    Err(err) => debug!("regression seed failed: {err}"),
                }
            }
            secant(points, offset)
        }
    }
}

/// The line through the lowest- and highest-input points, in `ln(x + c)` space.
fn secant(points: &[BenchmarkPoint], offset: f64) -> (f64, f64) {
    let lowest = points
        .iter()
        .min_by(|p, q| p.input.total_cmp(&q.input));
    let highest = points
        .iter()
        .max_by(|p, q| p.input.total_cmp(&q.input));
    match (lowest, highest) {
        (Some(lowest), Some(highest)) if lowest.input != highest.input => {
            let (log_low, log_high) = ((lowest.input + offset).ln(), (highest.input + offset).ln());
            let b = (highest.price - lowest.price) / (log_high - log_low);
            (lowest.price - b * log_low, b)
        }
        _ => (1.0, 1.0),
    }
}

#[cfg(test)]
mod tests;
