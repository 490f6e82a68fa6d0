use assert_float_eq::*;
use tinyrand::{Rand, Seeded, Wyrand};

use crate::testing::assert_samples_relative;

use super::*;

fn app_benchmarks() -> Vec<BenchmarkPoint> {
    vec![
        BenchmarkPoint::new(1.0, 15_000.0),
        BenchmarkPoint::new(20.0, 75_000.0),
        BenchmarkPoint::new(50.0, 150_000.0),
        BenchmarkPoint::new(100.0, 250_000.0),
        BenchmarkPoint::new(1000.0, 1_000_000.0),
    ]
}

fn pinned() -> FitConfig {
    FitConfig {
        init: InitialGuess::Pinned { a: 1.0, b: 1.0 },
        ..FitConfig::default()
    }
}

#[test]
fn fit_app_benchmarks() {
    let outcome = fit(&app_benchmarks(), &pinned()).unwrap();
    assert_float_relative_eq!(-294_066.697_138, outcome.params.a, 1e-6);
    assert_float_relative_eq!(154_237.291_382, outcome.params.b, 1e-6);
    assert_eq!(DEFAULT_OFFSET, outcome.params.c);
    assert_float_relative_eq!(1.576_786_581_7e11, outcome.residual, 1e-6);
    assert_float_relative_eq!((outcome.residual / 5.0).sqrt(), outcome.rmse(5), 1e-12);
}

#[test]
fn fit_is_independent_of_initial_guess() {
    let unit = fit(&app_benchmarks(), &FitConfig::default()).unwrap();
    let regression = fit(
        &app_benchmarks(),
        &FitConfig {
            init: InitialGuess::Regression,
            ..FitConfig::default()
        },
    )
    .unwrap();
    let far = fit(
        &app_benchmarks(),
        &FitConfig {
            init: InitialGuess::Pinned { a: 1e7, b: -1e6 },
            ..FitConfig::default()
        },
    )
    .unwrap();
    for outcome in [regression, far] {
        assert_float_relative_eq!(unit.params.a, outcome.params.a, 1e-6);
        assert_float_relative_eq!(unit.params.b, outcome.params.b, 1e-6);
    }
}

#[test]
fn fit_is_idempotent() {
    let points = app_benchmarks();
    let first = fit(&points, &pinned()).unwrap();
    let second = fit(&points, &pinned()).unwrap();
    assert_samples_relative(
        &first.params.sample(1.0, 10_000.0, 100).unwrap(),
        &second.params.sample(1.0, 10_000.0, 100).unwrap(),
        1e-12,
    );
}

#[test]
fn fit_two_points_exactly() {
    let points = vec![BenchmarkPoint::new(1.0, 100.0), BenchmarkPoint::new(9.0, 200.0)];
    let outcome = fit(&points, &pinned()).unwrap();
    assert_float_relative_eq!(100.0, outcome.params.evaluate(1.0).unwrap(), 1e-9);
    assert_float_relative_eq!(200.0, outcome.params.evaluate(9.0).unwrap(), 1e-9);
    assert!(outcome.residual < 1e-12, "{outcome:?}");
}

#[test]
fn fit_large_closely_spaced_inputs() {
    let points = vec![
        BenchmarkPoint::new(1e6, 1.0),
        BenchmarkPoint::new(1e6 + 1.0, 2.0),
        BenchmarkPoint::new(1e6 + 2.0, 2.5),
    ];
    for config in [pinned(), FitConfig::default()] {
        let outcome = fit(&points, &config).unwrap();
        // the logs are near-linear in the inputs over this span, so the fit is the straight line
        // through the prices
        assert_float_relative_eq!(1.0 / 24.0, outcome.residual, 1e-3);
        assert_float_absolute_eq!(1.0833, outcome.params.evaluate(1e6).unwrap(), 1e-3);
        assert_float_absolute_eq!(1.8333, outcome.params.evaluate(1e6 + 1.0).unwrap(), 1e-3);
        assert_float_absolute_eq!(2.5833, outcome.params.evaluate(1e6 + 2.0).unwrap(), 1e-3);
    }
}

#[test]
fn fit_flat_prices() {
    let points = vec![
        BenchmarkPoint::new(1.0, 500.0),
        BenchmarkPoint::new(10.0, 500.0),
        BenchmarkPoint::new(100.0, 500.0),
    ];
    let outcome = fit(&points, &pinned()).unwrap();
    assert_float_absolute_eq!(0.0, outcome.params.b, 1e-6);
    assert_float_relative_eq!(500.0, outcome.params.evaluate(50.0).unwrap(), 1e-9);
}

#[test]
fn fit_identical_inputs() {
    let points = vec![BenchmarkPoint::new(10.0, 100.0), BenchmarkPoint::new(10.0, 200.0)];
    let result = fit(&points, &pinned());
    assert!(
        matches!(result, Err(FitError::InsufficientData { distinct: 1 })),
        "{result:?}"
    );
}

#[test]
fn fit_no_points() {
    let result = fit(&[], &pinned());
    assert!(
        matches!(result, Err(FitError::InsufficientData { distinct: 0 })),
        "{result:?}"
    );
}

#[test]
fn fit_outside_domain() {
    let points = vec![BenchmarkPoint::new(-2.0, 100.0), BenchmarkPoint::new(10.0, 200.0)];
    let result = fit(&points, &pinned());
    assert!(
        matches!(
            result,
            Err(FitError::Domain(DomainError {
                input,
                offset
            })) if input == -2.0 && offset == 1.0
        ),
        "{result:?}"
    );

    // a larger offset brings the same points into the domain
    let config = FitConfig {
        offset: OffsetMode::Fixed(3.0),
        ..pinned()
    };
    assert!(fit(&points, &config).is_ok());
}

#[test]
fn fit_gives_up_when_starved_of_steps() {
    let config = FitConfig {
        solver: LevenbergMarquardtConfig {
            max_steps: 1,
            ..LevenbergMarquardtConfig::default()
        },
        ..pinned()
    };
    let result = fit(&app_benchmarks(), &config);
    assert!(
        matches!(result, Err(FitError::NotConverged { steps: 1, .. })),
        "{result:?}"
    );
}

#[test]
fn fit_rejects_invalid_config() {
    let config = FitConfig {
        offset: OffsetMode::Fixed(f64::NAN),
        ..pinned()
    };
    let result = fit(&app_benchmarks(), &config);
    assert_eq!(
        "invalid fit config: offset must be finite",
        result.unwrap_err().to_string()
    );
}

#[test]
fn fit_free_offset() {
    let fixed = fit(&app_benchmarks(), &pinned()).unwrap();
    let free = fit(
        &app_benchmarks(),
        &FitConfig {
            offset: OffsetMode::free(),
            ..pinned()
        },
    )
    .unwrap();
    assert!(
        (160.0..175.0).contains(&free.params.c),
        "unexpected offset {}",
        free.params.c
    );
    assert!(free.residual < fixed.residual / 1_000.0);
}

#[test]
fn fit_succeeds_for_random_benchmarks() {
    let mut rand = Wyrand::seed(42);
    for _ in 0..100 {
        let num_points = 2 + rand.next_lim_usize(9);
        let mut input = 0.0;
        let points: Vec<_> = (0..num_points)
            .map(|_| {
                input += 1.0 + rand.next_lim_u64(500) as f64;
                let price = rand.next_lim_u64(1_000_000) as f64;
                BenchmarkPoint::new(input, price)
            })
            .collect();
        let outcome = fit(&points, &pinned()).unwrap();
        assert!(outcome.params.a.is_finite(), "{points:?} → {outcome:?}");
        assert!(outcome.params.b.is_finite(), "{points:?} → {outcome:?}");
    }
}

#[test]
fn fitted_curve_is_monotonic_for_positive_slope() {
    let mut rand = Wyrand::seed(7);
    let outcome = fit(&app_benchmarks(), &pinned()).unwrap();
    assert!(outcome.params.b > 0.0);
    for _ in 0..100 {
        let mut x = rand.next_lim_u64(100) as f64 / 10.0;
        let mut prev = outcome.params.evaluate(x).unwrap();
        for _ in 0..50 {
            x += 1e-3 + rand.next_lim_u64(10_000) as f64 / 100.0;
            let next = outcome.params.evaluate(x).unwrap();
            assert!(next > prev, "f({x}) = {next} does not exceed {prev}");
            prev = next;
        }
    }
}

#[test]
fn fit_config_serde_json() {
    let config: FitConfig = serde_json::from_str(
        r#"{"offset":{"fixed":2.5},"init":{"pinned":{"a":10.0,"b":20.0}}}"#,
    )
    .unwrap();
    assert_eq!(OffsetMode::Fixed(2.5), config.offset);
    assert_eq!(InitialGuess::Pinned { a: 10.0, b: 20.0 }, config.init);
    assert_eq!(LevenbergMarquardtConfig::default(), config.solver);

    let config: FitConfig = serde_json::from_str(r#"{"init":"regression"}"#).unwrap();
    assert_eq!(OffsetMode::Fixed(DEFAULT_OFFSET), config.offset);
    assert_eq!(InitialGuess::Regression, config.init);
}

#[test]
fn secant_through_extremes() {
    let points = vec![
        BenchmarkPoint::new(9.0, 200.0),
        BenchmarkPoint::new(4.0, 170.0),
        BenchmarkPoint::new(1.0, 100.0),
    ];
    let (a, b) = secant(&points, 1.0);
    assert_float_relative_eq!(100.0, a + b * 2f64.ln(), 1e-12);
    assert_float_relative_eq!(200.0, a + b * 10f64.ln(), 1e-12);
}
