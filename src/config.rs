//! Pricing configuration, as read from a JSON file.

use anyhow::bail;
use serde::{Deserialize, Serialize};

use crate::benchmark::{BenchmarkPoint, BenchmarkTable, StepTable};
use crate::curve::{AnchorPolicy, DEFAULT_SAMPLES};
use crate::fit::FitConfig;
use crate::query::QueryBounds;
use crate::resolve::{Policy, PolicyKind};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PricingConfig {
    pub benchmarks: BenchmarkTable,
    pub steps: StepTable,
    pub fit: FitConfig,
    pub anchor: AnchorPolicy,
    pub policy: PolicyKind,
    pub bounds: QueryBounds,
    /// Requested input used when none is supplied.
    pub query: f64,
    /// Number of curve samples to draw.
    pub samples: usize,
}
impl Default for PricingConfig {
    fn default() -> Self {
        let benchmarks = vec![
            BenchmarkPoint::new(1.0, 15_000.0),
            BenchmarkPoint::new(20.0, 75_000.0),
            BenchmarkPoint::new(50.0, 150_000.0),
            BenchmarkPoint::new(100.0, 250_000.0),
            BenchmarkPoint::new(1000.0, 1_000_000.0),
        ];
        let steps = vec![(1.0, 1), (20.0, 1), (50.0, 1), (100.0, 1)];
        Self {
            benchmarks: benchmarks.try_into().unwrap_or_default(),
            steps: steps.try_into().unwrap_or_default(),
            fit: FitConfig::default(),
            anchor: AnchorPolicy::default(),
            policy: PolicyKind::default(),
            bounds: QueryBounds::default(),
            query: 500.0,
            samples: DEFAULT_SAMPLES,
        }
    }
}
impl PricingConfig {
    pub fn validate(&self) -> Result<(), anyhow::Error> {
        self.fit.validate()?;
        self.bounds.validate()?;
        if !self.query.is_finite() {
            bail!("default query must be finite");
        }
        Ok(())
    }

    /// The resolution policy of the given kind, carrying this config's step table where needed.
    pub fn policy(&self, kind: PolicyKind) -> Policy {
        match kind {
            PolicyKind::Direct => Policy::Direct,
            PolicyKind::StepRounding => Policy::StepRounding(self.steps.clone()),
            PolicyKind::NearestUpper => Policy::NearestUpper,
        }
    }
}
