//! Error-rate policy: turns a validation detail into accept or rewrite.

use tracing::warn;

use crate::grounding::validator::ValidationDetail;

/// Tolerance used when neither an override nor an environment default is set.
pub const DEFAULT_TOLERANCE: f64 = 0.2;

/// Fact error-rate tolerance, always within `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tolerance(f64);

impl Tolerance {
    /// Clamps into `[0, 1]`. NaN falls back to the default.
    pub fn new(value: f64) -> Self {
        if value.is_nan() {
            return Self(DEFAULT_TOLERANCE);
        }
        Self(value.clamp(0.0, 1.0))
    }

    /// Explicit override first, then the environment-level default, then 0.2.
    pub fn resolve(explicit: Option<f64>, env_default: Option<f64>) -> Self {
        explicit
            .filter(|v| !v.is_nan())
            .or(env_default.filter(|v| !v.is_nan()))
            .map(Self::new)
            .unwrap_or_default()
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

impl Default for Tolerance {
    fn default() -> Self {
        Self(DEFAULT_TOLERANCE)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Decision {
    Accept { error_rate: f64 },
    RewriteRequired { error_rate: f64 },
}

impl Decision {
    pub fn error_rate(self) -> f64 {
        match self {
            Decision::Accept { error_rate } | Decision::RewriteRequired { error_rate } => {
                error_rate
            }
        }
    }

    pub fn is_accept(self) -> bool {
        matches!(self, Decision::Accept { .. })
    }
}

/// `violating / total`, or 0.0 for a candidate with no factual slots.
pub fn error_rate(detail: &ValidationDetail) -> f64 {
    if detail.total_entities == 0 {
        return 0.0;
    }
    detail.violating_entities as f64 / detail.total_entities as f64
}

/// Accepts when the error rate is at most the tolerance; warns on tolerated violations.
pub fn evaluate(detail: &ValidationDetail, tolerance: Tolerance) -> Decision {
    let error_rate = error_rate(detail);
    if error_rate <= tolerance.value() {
        if error_rate > 0.0 {
            warn!(
                "Fact error rate {:.3} within tolerance {:.3}; accepting with {} violation(s): {:?}",
                error_rate,
                tolerance.value(),
                detail.violating_entities,
                detail.violations
            );
        }
        Decision::Accept { error_rate }
    } else {
        Decision::RewriteRequired { error_rate }
    }
}
