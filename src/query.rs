//! Bounds on the interactively requested input.

use anyhow::bail;
use serde::{Deserialize, Serialize};

/// Inclusive range the requested input is kept within.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QueryBounds {
    pub min: f64,
    pub max: f64,
}
impl Default for QueryBounds {
    fn default() -> Self {
        Self {
            min: 1.0,
            max: 10_000.0,
        }
    }
}
impl QueryBounds {
    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if !self.min.is_finite() || !self.max.is_finite() {
            bail!("query bounds must be finite");
        }
        if self.min > self.max {
            bail!("query lower bound {} exceeds upper bound {}", self.min, self.max);
        }
        Ok(())
    }

    pub fn clamp(&self, query: f64) -> f64 {
        query.clamp(self.min, self.max)
    }

    /// Shifts `query` by `delta`, staying within the bounds.
    pub fn nudge(&self, query: f64, delta: f64) -> f64 {
        self.clamp(query + delta)
    }
}
