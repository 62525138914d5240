use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoanRiskError {
    #[error("Invalid input: {field} - {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Unknown segment: '{0}' (expected one of MEDIUM, SMALL, SMALL NCC, CC, KUR, OTHER)")]
    UnknownSegment(String),

    #[error("Unknown metric: '{0}' (expected one of os, npl, sml, lr, lar, nsb, dpk_pct, npl_pct, lr_pct, lar_pct)")]
    UnknownMetric(String),

    #[error("Invariant violated: {check} - {detail}")]
    InvariantViolation { check: String, detail: String },

    #[error("Date error: {0}")]
    DateError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<serde_json::Error> for LoanRiskError {
    fn from(e: serde_json::Error) -> Self {
        LoanRiskError::SerializationError(e.to_string())
    }
}
