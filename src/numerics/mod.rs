pub mod timing;
pub mod transient;

use log::warn;
use serde::{Deserialize, Serialize};

use crate::error::{CroError, Result};

/// What to do when a discretized relation is about to divide by (almost) zero.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstabilityPolicy {
    /// Stop with [`CroError::NumericalInstability`].
    #[default]
    Halt,
    /// Replace the denominator by the signed threshold and carry on.
    Clamp,
}

/// Guard for denominators built from cancelling terms.
///
/// A denominator is rejected when `|denominator| <= relative_tolerance * scale`, where
/// `scale` is the sum of the magnitudes of its terms.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StabilityGuard {
    pub policy: InstabilityPolicy,
    pub relative_tolerance: f64,
}

impl Default for StabilityGuard {
    fn default() -> Self {
        Self {
            policy: InstabilityPolicy::Halt,
            relative_tolerance: 1e-6,
        }
    }
}

impl StabilityGuard {
    pub fn check_denominator(&self, denominator: f64, scale: f64, context: &str) -> Result<f64> {
        let threshold = self.relative_tolerance * scale.abs();
        if !denominator.is_finite() || !threshold.is_finite() {
            return Err(instability(context, denominator, threshold));
        }
        if denominator.abs() > threshold {
            return Ok(denominator);
        }
        match self.policy {
            InstabilityPolicy::Halt => Err(instability(context, denominator, threshold)),
            InstabilityPolicy::Clamp => {
                let clamped = threshold.max(f64::MIN_POSITIVE).copysign(denominator);
                warn!(
                    "{context}: denominator {denominator:.3e} clamped to {clamped:.3e}"
                );
                Ok(clamped)
            }
        }
    }

    /// Reject NaN and infinities before they reach field state.
    pub fn check_finite(&self, value: f64, context: &str) -> Result<f64> {
        if value.is_finite() {
            Ok(value)
        } else {
            Err(instability(context, value, 0.0))
        }
    }
}

fn instability(context: &str, denominator: f64, threshold: f64) -> CroError {
    CroError::NumericalInstability {
        context: context.to_string(),
        denominator,
        threshold,
    }
}
