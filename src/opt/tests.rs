use super::*;
use assert_float_eq::*;

#[test]
fn univariate_descent_sqrt() {
    let config = UnivariateDescentConfig {
        init_value: 0.0,
        init_step: 0.1,
        min_step: 0.00001,
        max_steps: 100,
        acceptable_residual: 0.0,
    };
    let outcome = univariate_descent(&config, |value| (81.0 - value.powi(2)).powi(2));
    assert_float_absolute_eq!(9.0, outcome.optimal_value, config.min_step);
}

#[test]
fn univariate_descent_avoids_infeasible_region() {
    let config = UnivariateDescentConfig {
        init_value: 5.0,
        init_step: -4.0,
        min_step: 1e-6,
        max_steps: 1_000,
        acceptable_residual: 0.0,
    };
    // minimum at 0.5, with everything at or below 0.25 infeasible
    let outcome = univariate_descent(&config, |value| {
        if value <= 0.25 {
            f64::INFINITY
        } else {
            (value - 0.5).powi(2)
        }
    });
    assert_float_absolute_eq!(0.5, outcome.optimal_value, 1e-5);
    assert!(outcome.optimal_residual.is_finite());
}

#[test]
fn univariate_descent_stops_at_acceptable_residual() {
    let config = UnivariateDescentConfig {
        init_value: 0.0,
        init_step: 1.0,
        min_step: 1e-9,
        max_steps: 100,
        acceptable_residual: 0.5,
    };
    let outcome = univariate_descent(&config, |value| (value - 3.0).powi(2));
    assert_eq!(3, outcome.steps);
    assert_eq!(3.0, outcome.optimal_value);
}

#[test]
fn univariate_descent_config_validation() {
    let config = UnivariateDescentConfig {
        init_value: 0.0,
        init_step: 0.1,
        min_step: 0.0,
        max_steps: 100,
        acceptable_residual: 0.0,
    };
    assert_eq!("min step must be positive", config.validate().unwrap_err().to_string());

    let config = UnivariateDescentConfig {
        init_step: 0.0,
        min_step: 0.1,
        ..config
    };
    assert_eq!(
        "initial step must be finite and non-zero",
        config.validate().unwrap_err().to_string()
    );
}

#[test]
fn levenberg_marquardt_quadratic() {
    // minimise (p0 - 2)² + (p1 - 3)²
    let outcome = levenberg_marquardt(
        &LevenbergMarquardtConfig::default(),
        &[0.0, 0.0],
        2,
        |values, residuals| {
            residuals[0] = values[0] - 2.0;
            residuals[1] = values[1] - 3.0;
        },
        |_, jacobian| {
            jacobian[(0, 0)] = 1.0;
            jacobian[(0, 1)] = 0.0;
            jacobian[(1, 0)] = 0.0;
            jacobian[(1, 1)] = 1.0;
        },
    );
    assert!(outcome.converged, "{outcome:?}");
    assert_float_absolute_eq!(2.0, outcome.optimal_values[0], 1e-9);
    assert_float_absolute_eq!(3.0, outcome.optimal_values[1], 1e-9);
}

#[test]
fn levenberg_marquardt_exponential_decay() {
    // fit y = p0 * exp(-p1 * x) to exact data generated from p0 = 2, p1 = 0.5
    let xs = [0.0, 1.0, 2.0, 3.0, 4.0, 5.0];
    let ys: Vec<_> = xs.iter().map(|x: &f64| 2.0 * (-0.5 * x).exp()).collect();
    let outcome = levenberg_marquardt(
        &LevenbergMarquardtConfig::default(),
        &[1.0, 1.0],
        xs.len(),
        |values, residuals| {
            for (index, x) in xs.iter().enumerate() {
                residuals[index] = values[0] * (-values[1] * x).exp() - ys[index];
            }
        },
        |values, jacobian| {
            for (index, x) in xs.iter().enumerate() {
                let decay = (-values[1] * x).exp();
                jacobian[(index, 0)] = decay;
                jacobian[(index, 1)] = -values[0] * x * decay;
            }
        },
    );
    assert!(outcome.converged, "{outcome:?}");
    assert_float_relative_eq!(2.0, outcome.optimal_values[0], 1e-6);
    assert_float_relative_eq!(0.5, outcome.optimal_values[1], 1e-6);
    assert!(outcome.optimal_residual < 1e-12);
}

#[test]
fn levenberg_marquardt_gives_up_after_max_steps() {
    let config = LevenbergMarquardtConfig {
        max_steps: 1,
        ..LevenbergMarquardtConfig::default()
    };
    let outcome = levenberg_marquardt(
        &config,
        &[1.0, 1.0],
        3,
        |values, residuals| {
            for (index, residual) in residuals.iter_mut().enumerate() {
                *residual = values[0] * (-values[1] * index as f64).exp() - 10.0;
            }
        },
        |values, jacobian| {
            for index in 0..jacobian.rows() {
                let decay = (-values[1] * index as f64).exp();
                jacobian[(index, 0)] = decay;
                jacobian[(index, 1)] = -values[0] * index as f64 * decay;
            }
        },
    );
    assert!(!outcome.converged);
    assert_eq!(1, outcome.steps);
}

#[test]
fn levenberg_marquardt_config_validation() {
    assert!(LevenbergMarquardtConfig::default().validate().is_ok());

    let config = LevenbergMarquardtConfig {
        lambda_up: 0.5,
        ..LevenbergMarquardtConfig::default()
    };
    assert_eq!(
        "lambda factors must satisfy lambda_up > 1 and 0 < lambda_down < 1",
        config.validate().unwrap_err().to_string()
    );

    let config = LevenbergMarquardtConfig {
        init_lambda: 1e20,
        ..LevenbergMarquardtConfig::default()
    };
    assert_eq!(
        "initial lambda must lie within the lambda bounds",
        config.validate().unwrap_err().to_string()
    );
}
