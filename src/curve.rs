//! The logarithmic pricing curve `f(x) = a + b·ln(x + c)` and the pricing model built on it.

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString};
use thiserror::Error;

use crate::benchmark::{BenchmarkPoint, BenchmarkTable};
use crate::fit::{fit, FitConfig, FitError};

/// Offset used when none is configured.
pub const DEFAULT_OFFSET: f64 = 1.0;

/// Number of samples used to draw a continuous curve.
pub const DEFAULT_SAMPLES: usize = 400;

#[derive(Debug, Error, Clone, Copy, PartialEq)]
#[error("logarithm argument {input} + {offset} is not positive")]
pub struct DomainError {
    pub input: f64,
    pub offset: f64,
}

/// Checks that `ln(input + offset)` is defined.
pub fn check_domain(input: f64, offset: f64) -> Result<(), DomainError> {
    if input + offset > 0.0 && (input + offset).is_finite() {
        Ok(())
    } else {
        Err(DomainError { input, offset })
    }
}

/// Parameters of `f(x) = a + b·ln(x + c)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurveParameters {
    pub a: f64,
    pub b: f64,
    pub c: f64,
}
impl CurveParameters {
    pub fn new(a: f64, b: f64) -> Self {
        Self::with_offset(a, b, DEFAULT_OFFSET)
    }

    pub fn with_offset(a: f64, b: f64, c: f64) -> Self {
        Self { a, b, c }
    }

    /// Evaluates the curve at `x`, failing if `x + c` is not positive.
    #[inline]
    pub fn evaluate(&self, x: f64) -> Result<f64, DomainError> {
        check_domain(x, self.c)?;
        Ok(self.evaluate_unchecked(x))
    }

    #[inline]
    pub(crate) fn evaluate_unchecked(&self, x: f64) -> f64 {
        self.a + self.b * (x + self.c).ln()
    }

    /// Samples the curve over a uniform grid of `count` points spanning `from..=to`, for
    /// drawing. Both endpoints are included; a single sample is taken at `from`.
    pub fn sample(&self, from: f64, to: f64, count: usize) -> Result<Vec<(f64, f64)>, DomainError> {
        check_domain(f64::min(from, to), self.c)?;
        let interval = match count {
            0 | 1 => 0.0,
            _ => (to - from) / (count - 1) as f64,
        };
        Ok((0..count)
            .map(|index| {
                let x = if count > 1 && index + 1 == count {
                    to
                } else {
                    from + interval * index as f64
                };
                (x, self.evaluate_unchecked(x))
            })
            .collect())
    }
}

/// Which benchmark prices override the curve when queried at exactly their input.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
pub enum AnchorPolicy {
    /// Always price from the curve.
    Disabled,
    /// The cheapest (minimum-input) benchmark prices at its recorded price.
    #[default]
    MinimumInput,
    /// Every benchmark prices at its recorded price.
    AnyBenchmark,
}

/// Fitted curve parameters plus the benchmark prices that anchor it.
#[derive(Debug, Clone, PartialEq)]
pub struct PricingModel {
    params: CurveParameters,
    anchors: BenchmarkTable,
}
impl PricingModel {
    pub fn new(params: CurveParameters, benchmarks: &BenchmarkTable, anchor: AnchorPolicy) -> Self {
        let anchors = match anchor {
            AnchorPolicy::Disabled => vec![],
            AnchorPolicy::MinimumInput => benchmarks.first().into_iter().copied().collect(),
            AnchorPolicy::AnyBenchmark => benchmarks.to_vec(),
        };
        // a subset of a valid table is itself valid
        let anchors = BenchmarkTable::try_from(anchors).unwrap_or_default();
        Self { params, anchors }
    }

    /// Fits the curve to `benchmarks` and anchors it according to `anchor`.
    pub fn fit(
        benchmarks: &BenchmarkTable,
        config: &FitConfig,
        anchor: AnchorPolicy,
    ) -> Result<Self, FitError> {
        let outcome = fit(benchmarks, config)?;
        Ok(Self::new(outcome.params, benchmarks, anchor))
    }

    pub fn params(&self) -> &CurveParameters {
        &self.params
    }

    pub fn anchors(&self) -> &[BenchmarkPoint] {
        &self.anchors
    }

    /// The recorded price of the anchoring benchmark at exactly `x`, if there is one.
    pub fn anchor_price(&self, x: f64) -> Option<f64> {
        self.anchors.find(x).map(|point| point.price)
    }

    /// The price at `x`: the anchoring benchmark's recorded price where one applies, the curve
    /// value otherwise.
    pub fn price_at(&self, x: f64) -> Result<f64, DomainError> {
        match self.anchor_price(x) {
            Some(price) => Ok(price),
            None => self.params.evaluate(x),
        }
    }
}
