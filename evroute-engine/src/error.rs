use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalog::CatalogError;

/// Every way an optimization request can fail.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PlanError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("no feasible plan: {0}")]
    NoFeasiblePlan(String),
    #[error("search cancelled: {0}")]
    Cancelled(String),
    #[error("catalog unavailable: {0}")]
    CatalogUnavailable(String),
}

impl PlanError {
    /// Stable identifier used in failure responses.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::InvalidRequest(_) => "InvalidRequest",
            Self::NoFeasiblePlan(_) => "NoFeasiblePlan",
            Self::Cancelled(_) => "Cancelled",
            Self::CatalogUnavailable(_) => "CatalogUnavailable",
        }
    }

    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::InvalidRequest(msg)
            | Self::NoFeasiblePlan(msg)
            | Self::Cancelled(msg)
            | Self::CatalogUnavailable(msg) => msg,
        }
    }

    #[must_use]
    pub fn to_response(&self) -> ErrorResponse {
        ErrorResponse {
            error: ErrorBody {
                kind: self.kind().to_string(),
                message: self.message().to_string(),
            },
        }
    }
}

impl From<CatalogError> for PlanError {
    fn from(err: CatalogError) -> Self {
        Self::CatalogUnavailable(err.to_string())
    }
}

/// `{"error": {"kind": ..., "message": ...}}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub kind: String,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_are_stable() {
        assert_eq!(PlanError::InvalidRequest(String::new()).kind(), "InvalidRequest");
        assert_eq!(PlanError::NoFeasiblePlan(String::new()).kind(), "NoFeasiblePlan");
        assert_eq!(PlanError::Cancelled(String::new()).kind(), "Cancelled");
        assert_eq!(
            PlanError::CatalogUnavailable(String::new()).kind(),
            "CatalogUnavailable"
        );
    }

    #[test]
    fn failure_response_shape() {
        let err = PlanError::NoFeasiblePlan("Speed unreachable".into());
        let json = serde_json::to_value(err.to_response()).unwrap();
        assert_eq!(json["error"]["kind"], "NoFeasiblePlan");
        assert_eq!(json["error"]["message"], "Speed unreachable");
    }

    #[test]
    fn catalog_errors_become_unavailable() {
        let err: PlanError = CatalogError::DuplicateZone("A".into()).into();
        assert_eq!(err.kind(), "CatalogUnavailable");
        assert!(err.message().contains("duplicate zone"));
    }
}
