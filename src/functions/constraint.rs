//! Boundary constraints on function parameters.

use crate::error::{FrameworkError, Result};

/// Default multiplier of the squared distance outside the bounds.
const DEFAULT_PENALTY_FACTOR: f64 = 1000.0;

/// Keeps one parameter within an optional lower and upper bound.
///
/// Minimizers read [`check`](Self::check) as a penalty added to the cost; the
/// penalty is zero inside the bounds and grows quadratically outside.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundaryConstraint {
    parameter_name: String,
    lower: Option<f64>,
    upper: Option<f64>,
    penalty_factor: f64,
}

impl BoundaryConstraint {
    pub fn new(parameter_name: &str, lower: Option<f64>, upper: Option<f64>) -> Result<Self> {
        if let (Some(lo), Some(hi)) = (lower, upper) {
            if lo > hi {
                return Err(FrameworkError::InvalidArgument(format!(
                    "lower bound {} exceeds upper bound {} for '{}'",
                    lo, hi, parameter_name
                )));
            }
        }
        Ok(Self {
            parameter_name: parameter_name.to_string(),
            lower,
            upper,
            penalty_factor: DEFAULT_PENALTY_FACTOR,
        })
    }

    pub fn with_penalty_factor(mut self, factor: f64) -> Self {
        self.penalty_factor = factor;
        self
    }

    pub fn parameter_name(&self) -> &str {
        &self.parameter_name
    }

    pub fn lower(&self) -> Option<f64> {
        self.lower
    }

    pub fn upper(&self) -> Option<f64> {
        self.upper
    }

    /// Penalty for `value`.
    pub fn check(&self, value: f64) -> f64 {
        let below = self.lower.map_or(0.0, |lo| (lo - value).max(0.0));
        let above = self.upper.map_or(0.0, |hi| (value - hi).max(0.0));
        self.penalty_factor * (below * below + above * above)
    }

    /// The closest value that satisfies the constraint.
    pub fn set_param_to_satisfy(&self, value: f64) -> f64 {
        let value = self.lower.map_or(value, |lo| value.max(lo));
        self.upper.map_or(value, |hi| value.min(hi))
    }
}
