//! Policies for turning a requested input into a displayed (adjusted input, price) pair.

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString};
use thiserror::Error;

use crate::benchmark::{BenchmarkTable, StepTable};
use crate::curve::{DomainError, PricingModel};

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum LookupError {
    #[error("no benchmarks to look up")]
    EmptyBenchmarks,
}

#[derive(Debug, Error, Clone, Copy, PartialEq)]
pub enum ResolveError {
    #[error("{0}")]
    Domain(#[from] DomainError),

    #[error("{0}")]
    Lookup(#[from] LookupError),
}

/// The outcome of resolving a query.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Resolution {
    /// The input as requested.
    pub query: f64,
    /// The input the price applies to, after any rounding or lookup.
    pub adjusted: f64,
    pub price: f64,
    /// The curve price at the requested input, where the displayed price did not come from the
    /// curve.
    pub estimated: Option<f64>,
}

/// Names of the resolution policies, for selecting one from configuration or the command line.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
pub enum PolicyKind {
    Direct,
    #[default]
    #[strum(to_string = "step-rounding", serialize = "step")]
    StepRounding,
    #[strum(to_string = "nearest-upper", serialize = "nearest")]
    NearestUpper,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Policy {
    /// Price straight off the curve at the requested input.
    Direct,
    /// Round the requested input up to the applicable step, then price off the curve.
    StepRounding(StepTable),
    /// Take the first benchmark at or above the requested input (or the last benchmark, if
    /// the request lies beyond all of them), ignoring the curve.
    NearestUpper,
}
impl Policy {
    pub fn kind(&self) -> PolicyKind {
        match self {
            Policy::Direct => PolicyKind::Direct,
            Policy::StepRounding(_) => PolicyKind::StepRounding,
            Policy::NearestUpper => PolicyKind::NearestUpper,
        }
    }

    pub fn resolve(
        &self,
        query: f64,
        benchmarks: &BenchmarkTable,
        model: &PricingModel,
    ) -> Result<Resolution, ResolveError> {
        match self {
            Policy::Direct => Ok(Resolution {
                query,
                adjusted: query,
                price: model.price_at(query)?,
                estimated: None,
            }),
            Policy::StepRounding(steps) => {
                let adjusted = steps.round_up(query);
                // the anchor is matched against the query as requested, not as rounded
                let price = match model.anchor_price(query) {
                    Some(price) => price,
                    None => model.params().evaluate(adjusted)?,
                };
                Ok(Resolution {
                    query,
                    adjusted,
                    price,
                    estimated: None,
                })
            }
            Policy::NearestUpper => {
                let last = benchmarks.last().ok_or(LookupError::EmptyBenchmarks)?;
                let benchmark = match benchmarks.ceiling(query) {
                    Some(benchmark) if query < last.input => benchmark,
                    _ => last,
                };
                Ok(Resolution {
                    query,
                    adjusted: benchmark.input,
                    price: benchmark.price,
                    // no estimate outside the curve domain
                    estimated: model.price_at(query).ok(),
                })
            }
        }
    }
}
