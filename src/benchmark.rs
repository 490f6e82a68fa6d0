//! Benchmark points and the step table used to round queries.

use std::cmp::Ordering;
use std::ops::Deref;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A known (input, price) pair used to calibrate the curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkPoint {
    pub input: f64,
    pub price: f64,
}
impl BenchmarkPoint {
    pub fn new(input: f64, price: f64) -> Self {
        Self { input, price }
    }
}

impl From<(f64, f64)> for BenchmarkPoint {
    fn from((input, price): (f64, f64)) -> Self {
        Self::new(input, price)
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum InvalidBenchmarks {
    #[error("benchmark input {0} is not finite")]
    NonFiniteInput(f64),

    #[error("price {price} for benchmark input {input} must be finite and non-negative")]
    InvalidPrice { input: f64, price: f64 },

    #[error("duplicate benchmark input {0}")]
    DuplicateInput(f64),
}

/// Benchmark points, sorted by input in ascending order and unique by input.
///
/// The table may be empty; an empty table cannot be fitted and is rejected by the
/// nearest-upper lookup.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<BenchmarkPoint>", into = "Vec<BenchmarkPoint>")]
pub struct BenchmarkTable {
    points: Vec<BenchmarkPoint>,
}
impl BenchmarkTable {
    pub fn points(&self) -> &[BenchmarkPoint] {
        &self.points
    }

    pub fn first(&self) -> Option<&BenchmarkPoint> {
        self.points.first()
    }

    pub fn last(&self) -> Option<&BenchmarkPoint> {
        self.points.last()
    }

    pub fn min_input(&self) -> Option<f64> {
        self.first().map(|point| point.input)
    }

    pub fn max_input(&self) -> Option<f64> {
        self.last().map(|point| point.input)
    }

    /// The benchmark recorded at exactly `input`, if any. Signed zeros compare equal.
    pub fn find(&self, input: f64) -> Option<&BenchmarkPoint> {
        self.points
            .binary_search_by(|point| point.input.partial_cmp(&input).unwrap_or(Ordering::Greater))
            .ok()
            .map(|index| &self.points[index])
    }

    /// The first benchmark whose input is at or above `input`, or [None] if every benchmark
    /// lies below it.
    pub fn ceiling(&self, input: f64) -> Option<&BenchmarkPoint> {
        let index = self.points.partition_point(|point| point.input < input);
        self.points.get(index)
    }
}

impl Deref for BenchmarkTable {
    type Target = [BenchmarkPoint];

    fn deref(&self) -> &Self::Target {
        &self.points
    }
}

impl TryFrom<Vec<BenchmarkPoint>> for BenchmarkTable {
    type Error = InvalidBenchmarks;

    fn try_from(mut points: Vec<BenchmarkPoint>) -> Result<Self, Self::Error> {
        for point in &points {
            if !point.input.is_finite() {
                return Err(InvalidBenchmarks::NonFiniteInput(point.input));
            }
            if !point.price.is_finite() || point.price < 0.0 {
                return Err(InvalidBenchmarks::InvalidPrice {
                    input: point.input,
                    price: point.price,
                });
            }
        }
        points.sort_by(|a, b| a.input.total_cmp(&b.input));
        if let Some(pair) = points.windows(2).find(|pair| pair[0].input == pair[1].input) {
            return Err(InvalidBenchmarks::DuplicateInput(pair[0].input));
        }
        Ok(Self { points })
    }
}

impl From<BenchmarkTable> for Vec<BenchmarkPoint> {
    fn from(table: BenchmarkTable) -> Self {
        table.points
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum InvalidStepTable {
    #[error("step threshold {0} is not finite")]
    NonFiniteThreshold(f64),

    #[error("step size for threshold {0} must be at least 1")]
    ZeroStep(f64),

    #[error("duplicate step threshold {0}")]
    DuplicateThreshold(f64),
}

/// Rounding granularity that applies from `threshold` upwards.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StepThreshold {
    pub threshold: f64,
    pub step: u64,
}

/// Step sizes keyed by input threshold, sorted by threshold in ascending order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<StepThreshold>", into = "Vec<StepThreshold>")]
pub struct StepTable {
    thresholds: Vec<StepThreshold>,
}
impl StepTable {
    /// Step size applied to queries below every threshold.
    pub const DEFAULT_STEP: u64 = 1;

    pub fn thresholds(&self) -> &[StepThreshold] {
        &self.thresholds
    }

    /// The step of the greatest threshold at or below `input`, or [Self::DEFAULT_STEP].
    pub fn step_for(&self, input: f64) -> u64 {
        let index = self
            .thresholds
            .partition_point(|threshold| threshold.threshold <= input);
        match index {
            0 => Self::DEFAULT_STEP,
            _ => self.thresholds[index - 1].step,
        }
    }

    /// Rounds `input` up to the next multiple of its applicable step; a no-op if `input` is
    /// already a multiple.
    pub fn round_up(&self, input: f64) -> f64 {
        let step = self.step_for(input) as f64;
        input + (step - input.rem_euclid(step)) % step
    }
}

impl TryFrom<Vec<StepThreshold>> for StepTable {
    type Error = InvalidStepTable;

    fn try_from(mut thresholds: Vec<StepThreshold>) -> Result<Self, Self::Error> {
        for threshold in &thresholds {
            if !threshold.threshold.is_finite() {
                return Err(InvalidStepTable::NonFiniteThreshold(threshold.threshold));
            }
            if threshold.step == 0 {
                return Err(InvalidStepTable::ZeroStep(threshold.threshold));
            }
        }
        thresholds.sort_by(|a, b| a.threshold.total_cmp(&b.threshold));
        if let Some(pair) = thresholds
            .windows(2)
            .find(|pair| pair[0].threshold == pair[1].threshold)
        {
            return Err(InvalidStepTable::DuplicateThreshold(pair[0].threshold));
        }
        Ok(Self { thresholds })
    }
}

impl TryFrom<Vec<(f64, u64)>> for StepTable {
    type Error = InvalidStepTable;

    fn try_from(pairs: Vec<(f64, u64)>) -> Result<Self, Self::Error> {
        pairs
            .into_iter()
            .map(|(threshold, step)| StepThreshold { threshold, step })
            .collect::<Vec<_>>()
            .try_into()
    }
}

impl From<StepTable> for Vec<StepThreshold> {
    fn from(table: StepTable) -> Self {
        table.thresholds
    }
}
