pub mod amount;
pub mod anchors;
pub mod error;
pub mod hierarchy;
pub mod master;
pub mod metrics;
pub mod reference;
pub mod rollup;
pub mod segmentation;
pub mod snapshot;
pub mod types;

#[cfg(feature = "summary")]
pub mod summary;

pub use error::LoanRiskError;
pub use master::{MasterConfig, MasterData};
pub use rollup::{build_report, ReportQuery, ReportSet};
pub use types::*;

/// Standard result type for all loan-risk computations
pub type LoanRiskResult<T> = Result<T, LoanRiskError>;
