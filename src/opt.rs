//! Numerical optimisers: a univariate, derivative-free descent and a Levenberg–Marquardt
//! nonlinear least-squares solver.

use anyhow::bail;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::display::DisplaySlice;
use crate::linear::Matrix;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UnivariateDescentConfig {
    pub init_value: f64,
    pub init_step: f64,
    pub min_step: f64,
    pub max_steps: u64,
    pub acceptable_residual: f64,
}
impl UnivariateDescentConfig {
    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if !self.init_value.is_finite() {
            bail!("initial value must be finite")
        }
        if self.init_step == 0.0 || !self.init_step.is_finite() {
            bail!("initial step must be finite and non-zero")
        }
        if self.min_step <= 0.0 {
            bail!("min step must be positive")
        }
        if self.acceptable_residual < 0.0 {
            bail!("acceptable residual must be non-negative")
        }
        Ok(())
    }
}

#[derive(Debug)]
pub struct UnivariateDescentOutcome {
    pub steps: u64,
    pub optimal_value: f64,
    pub optimal_residual: f64,
}

/// Univariate, derivative-free search.
///
/// Walks from `init_value` in increments of the current step, reversing and halving the step
/// whenever the residual gets worse. Terminates once the step shrinks below `min_step`, the
/// residual drops to `acceptable_residual`, or `max_steps` is exhausted. The loss function may
/// return [f64::INFINITY] to mark a value as infeasible.
pub fn univariate_descent(
    config: &UnivariateDescentConfig,
    mut loss_f: impl FnMut(f64) -> f64,
) -> UnivariateDescentOutcome {
    debug_assert!(config.validate().is_ok(), "invalid config {config:?}");

    let mut steps = 0;
    let mut residual = loss_f(config.init_value);
    if residual <= config.acceptable_residual {
        return UnivariateDescentOutcome {
            steps: 0,
            optimal_value: config.init_value,
            optimal_residual: residual,
        };
    }

    let (mut value, mut step) = (config.init_value, config.init_step);
    let (mut optimal_value, mut optimal_residual) = (value, residual);
    while steps < config.max_steps {
        steps += 1;
        let new_value = value + step;
        let new_residual = loss_f(new_value);
        trace!("steps: {steps}, value: {value}, residual: {residual}, step: {step}, new_value: {new_value}, new_residual: {new_residual}");

        if new_residual > residual || new_residual.is_nan() {
            step = -step * 0.5;
            if step.abs() < config.min_step {
                break;
            }
            if !new_residual.is_finite() {
                // don't settle on an infeasible value; retry from the last good one
                continue;
            }
        } else if new_residual < optimal_residual {
            optimal_residual = new_residual;
            optimal_value = new_value;

            if optimal_residual <= config.acceptable_residual {
                break;
            }
        }
        residual = new_residual;
        value = new_value;
    }
    UnivariateDescentOutcome {
        steps,
        optimal_value,
        optimal_residual,
    }
}

/// Configuration of the Levenberg–Marquardt solver.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LevenbergMarquardtConfig {
    /// Maximum number of iterations before giving up.
    pub max_steps: u64,
    /// Converged once the residual norm drops below this value.
    pub residual_tolerance: f64,
    /// Converged once the relative reduction of the sum of squares on an accepted step drops
    /// below this value.
    pub reduction_tolerance: f64,
    /// Converged once the norm of the parameter update, relative to the parameter norm, drops
    /// below this value.
    pub param_tolerance: f64,
    pub init_lambda: f64,
    pub lambda_up: f64,
    pub lambda_down: f64,
    pub min_lambda: f64,
    pub max_lambda: f64,
}
impl Default for LevenbergMarquardtConfig {
    fn default() -> Self {
        Self {
            max_steps: 200,
            residual_tolerance: 1e-10,
            reduction_tolerance: 1e-14,
            param_tolerance: 1e-12,
            init_lambda: 1e-3,
            lambda_up: 10.0,
            lambda_down: 0.1,
            min_lambda: 1e-12,
            max_lambda: 1e12,
        }
    }
}
impl LevenbergMarquardtConfig {
    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.max_steps == 0 {
            bail!("max steps must be positive")
        }
        if self.residual_tolerance < 0.0
            || self.reduction_tolerance < 0.0
            || self.param_tolerance < 0.0
        {
            bail!("tolerances must be non-negative")
        }
        if self.min_lambda <= 0.0 || self.min_lambda > self.max_lambda {
            bail!("lambda bounds must satisfy 0 < min_lambda <= max_lambda")
        }
        if !(self.min_lambda..=self.max_lambda).contains(&self.init_lambda) {
            bail!("initial lambda must lie within the lambda bounds")
        }
        if self.lambda_up <= 1.0 || self.lambda_down <= 0.0 || self.lambda_down >= 1.0 {
            bail!("lambda factors must satisfy lambda_up > 1 and 0 < lambda_down < 1")
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LevenbergMarquardtOutcome {
    pub steps: u64,
    pub converged: bool,
    pub optimal_values: Vec<f64>,
    /// Sum of squared residuals at `optimal_values`.
    pub optimal_residual: f64,
}

/// Levenberg–Marquardt nonlinear least-squares.
///
/// Minimises `‖r(p)‖²`, where `residuals` writes `r(p)` into its output slice (one element per
/// observation) and `jacobian` writes `∂rᵢ/∂pⱼ` into an observations × parameters matrix.
/// Each iteration solves `(JᵀJ + λ·diag(JᵀJ)) δ = −Jᵀr`, accepting the step (and relaxing `λ`)
/// if it reduces the sum of squares, rejecting it (and stiffening `λ`) otherwise.
pub fn levenberg_marquardt(
    config: &LevenbergMarquardtConfig,
    init_values: &[f64],
    observations: usize,
    mut residuals: impl FnMut(&[f64], &mut [f64]),
    mut jacobian: impl FnMut(&[f64], &mut Matrix),
) -> LevenbergMarquardtOutcome {
    debug_assert!(config.validate().is_ok(), "invalid config {config:?}");
    let num_params = init_values.len();
    assert!(num_params > 0, "at least one parameter must be optimised");
    assert!(observations > 0, "at least one observation must be supplied");

    let mut values = init_values.to_vec();
    let mut r = vec![0.0; observations];
    residuals(&values, &mut r);
    let mut sum_sq = sum_of_squares(&r);

    let mut jac = Matrix::allocate(observations, num_params);
    let mut trial_values = vec![0.0; num_params];
    let mut trial_r = vec![0.0; observations];
    let mut lambda = config.init_lambda;
    let mut steps = 0;
    let mut refresh_jacobian = true;
    let mut normal = NormalEquations::new(num_params);

    while steps < config.max_steps {
        if !sum_sq.is_finite() {
            break;
        }
        if sum_sq.sqrt() < config.residual_tolerance {
            return converged(steps, values, sum_sq);
        }
        steps += 1;

        if refresh_jacobian {
            jacobian(&values, &mut jac);
            normal.assemble(&jac, &r);
            refresh_jacobian = false;
        }

        let Some(delta) = normal.solve(lambda) else {
            if lambda >= config.max_lambda {
                break;
            }
            lambda = f64::min(lambda * config.lambda_up, config.max_lambda);
            continue;
        };

        let delta_norm = delta.iter().map(|d| d * d).sum::<f64>().sqrt();
        let values_norm = f64::max(values.iter().map(|v| v * v).sum::<f64>().sqrt(), 1.0);
        if delta_norm / values_norm < config.param_tolerance {
            return converged(steps, values, sum_sq);
        }

        for (trial, (value, delta)) in trial_values.iter_mut().zip(values.iter().zip(&delta)) {
            *trial = value + delta;
        }
        residuals(&trial_values, &mut trial_r);
        let trial_sum_sq = sum_of_squares(&trial_r);
        trace!(
            "steps: {steps}, lambda: {lambda}, sum_sq: {sum_sq}, trial_values: {}, trial_sum_sq: {trial_sum_sq}",
            DisplaySlice::from(&*trial_values)
        );

        if trial_sum_sq < sum_sq {
            let reduction = (sum_sq - trial_sum_sq) / sum_sq;
            values.copy_from_slice(&trial_values);
            r.copy_from_slice(&trial_r);
            sum_sq = trial_sum_sq;
            lambda = f64::max(lambda * config.lambda_down, config.min_lambda);
            refresh_jacobian = true;
            if reduction < config.reduction_tolerance {
                return converged(steps, values, sum_sq);
            }
        } else {
            if lambda >= config.max_lambda {
                break;
            }
            lambda = f64::min(lambda * config.lambda_up, config.max_lambda);
        }
    }

    LevenbergMarquardtOutcome {
        steps,
        converged: false,
        optimal_values: values,
        optimal_residual: sum_sq,
    }
}

fn converged(steps: u64, optimal_values: Vec<f64>, optimal_residual: f64) -> LevenbergMarquardtOutcome {
    LevenbergMarquardtOutcome {
        steps,
        converged: true,
        optimal_values,
        optimal_residual,
    }
}

#[inline]
fn sum_of_squares(values: &[f64]) -> f64 {
    values.iter().map(|value| value * value).sum()
}

/// `JᵀJ` and `−Jᵀr`, cached between rejected steps since only `λ` changes.
struct NormalEquations {
    jtj: Matrix,
    neg_jtr: Vec<f64>,
    damped: Matrix,
    lower: Matrix,
}
impl NormalEquations {
    fn new(num_params: usize) -> Self {
        Self {
            jtj: Matrix::allocate(num_params, num_params),
            neg_jtr: vec![0.0; num_params],
            damped: Matrix::allocate(num_params, num_params),
            lower: Matrix::allocate(num_params, num_params),
        }
    }

    fn assemble(&mut self, jac: &Matrix, r: &[f64]) {
        let num_params = jac.cols();
        for i in 0..num_params {
            for j in 0..=i {
                let sum = (0..jac.rows())
                    .map(|k| jac[(k, i)] * jac[(k, j)])
                    .sum::<f64>();
                self.jtj[(i, j)] = sum;
                self.jtj[(j, i)] = sum;
            }
            self.neg_jtr[i] = -(0..jac.rows()).map(|k| jac[(k, i)] * r[k]).sum::<f64>();
        }
    }

    fn solve(&mut self, lambda: f64) -> Option<Vec<f64>> {
        let n = self.neg_jtr.len();
        for i in 0..n {
            for j in 0..n {
                self.damped[(i, j)] = self.jtj[(i, j)];
            }
            // Marquardt scaling; an all-zero column falls back to unit damping
            let scale = match self.jtj[(i, i)] {
                diagonal if diagonal > 0.0 => diagonal,
                _ => 1.0,
            };
            self.damped[(i, i)] += lambda * scale;
        }
        cholesky_solve(&self.damped, &mut self.lower, &self.neg_jtr)
    }
}

/// Solves `A x = b` for a symmetric positive-definite `A`, using `lower` as scratch space for
/// the Cholesky factor. Returns [None] if `A` is not positive-definite.
fn cholesky_solve(a: &Matrix, lower: &mut Matrix, b: &[f64]) -> Option<Vec<f64>> {
    let n = b.len();
    for i in 0..n {
        for j in 0..=i {
            let mut sum = a[(i, j)];
            for k in 0..j {
                sum -= lower[(i, k)] * lower[(j, k)];
            }
            if i == j {
                if sum <= 0.0 || !sum.is_finite() {
                    return None;
                }
                lower[(i, j)] = sum.sqrt();
            } else {
                lower[(i, j)] = sum / lower[(j, j)];
            }
        }
    }

    // forward substitution: L y = b
    let mut y = vec![0.0; n];
    for i in 0..n {
        let sum = (0..i).map(|k| lower[(i, k)] * y[k]).sum::<f64>();
        y[i] = (b[i] - sum) / lower[(i, i)];
    }

    // back substitution: Lᵀ x = y
    let mut x = vec![0.0; n];
    for i in (0..n).rev() {
        let sum = (i + 1..n).map(|k| lower[(k, i)] * x[k]).sum::<f64>();
        x[i] = (y[i] - sum) / lower[(i, i)];
    }
    Some(x)
}

#[cfg(test)]
mod tests;
