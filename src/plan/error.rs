// ABOUTME: Error types for plan building.
// ABOUTME: Covers illegal directive ordering, content distribution, and invalid unit names.

use crate::content::DistributionError;
use crate::types::UnitNameError;

/// Errors returned synchronously by builder directives.
#[derive(Debug, thiserror::Error)]
pub enum PlanError {
    /// A directive was applied in a state where it is not allowed.
    #[error("invalid plan state for `{directive}`: {reason}")]
    InvalidPlanState {
        directive: &'static str,
        reason: String,
    },

    /// The content distributor failed to store deployment content.
    #[error("failed to distribute content for {unit}: {source}")]
    ContentDistribution {
        unit: String,
        #[source]
        source: DistributionError,
    },

    /// A unit name did not validate.
    #[error("invalid deployment unit name: {0}")]
    InvalidUnitName(#[from] UnitNameError),
}

impl PlanError {
    pub(crate) fn invalid_state(directive: &'static str, reason: impl Into<String>) -> Self {
        PlanError::InvalidPlanState {
            directive,
            reason: reason.into(),
        }
    }

    /// The directive named by an `InvalidPlanState` error.
    pub fn directive(&self) -> Option<&'static str> {
        match self {
            PlanError::InvalidPlanState { directive, .. } => Some(directive),
            _ => None,
        }
    }

    pub fn is_invalid_state(&self) -> bool {
        matches!(self, PlanError::InvalidPlanState { .. })
    }
}
