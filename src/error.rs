//! Error and warning taxonomy.
//!
//! [`AnalysisError`] aborts the whole run; [`AnalysisWarning`] marks a
//! tolerated degradation (a skipped test, a `NaN` rate) and travels inside
//! the report.

use serde::Serialize;
use thiserror::Error;

use crate::dataset::Group;

/// Fatal analysis failures. No partial result accompanies any of these.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// The upstream load failed. Not retried.
    #[error("dataset unavailable: {0}")]
    DataUnavailable(#[from] LoadError),

    /// A required comparison group is empty.
    #[error("{group} group is empty ({control} control, {treatment} treatment rows); cannot compare")]
    DegenerateInput {
        group: Group,
        control: usize,
        treatment: usize,
    },

    /// A record violates the data model.
    #[error("invalid record {patient_id}: {reason}")]
    InvalidRecord { patient_id: String, reason: String },

    /// A configuration value is out of range.
    #[error("invalid config: {0}")]
    InvalidConfig(String),
}

/// Failures of a [`DatasetLoader`](crate::dataset::DatasetLoader).
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read dataset: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse dataset: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("upstream store unreachable: {0}")]
    Unreachable(String),
}

/// Why a significance test was not computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// A group has fewer observed values than the configured minimum.
    InsufficientData,
    /// Both groups are constant, so the standard error is zero.
    ZeroVariance,
}

/// Non-fatal conditions raised during a run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AnalysisWarning {
    /// A metric's t-test was skipped; `reason` says why.
    TestSkipped {
        metric: String,
        control_n: usize,
        treatment_n: usize,
        reason: SkipReason,
    },
    /// Relative risk reduction is `NaN` because the control rate is zero.
    ZeroControlRate,
    /// Nobody, or everybody, was readmitted; χ² is reported as 0 with p = 1.
    ZeroMargin { table: [u64; 4] },
    /// A χ² expected count is below the configured threshold.
    LowExpectedCount { min_expected: f64, threshold: f64 },
    /// One side of a subgroup is empty, its rate is `NaN`.
    SparseSubgroup { condition: String, group: Group },
}

impl std::fmt::Display for AnalysisWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TestSkipped {
                metric,
                control_n,
                treatment_n,
                reason,
            } => write!(
                f,
                "t-test for {metric} not computed ({reason:?}; n = {control_n} control, {treatment_n} treatment)"
            ),
            Self::ZeroControlRate => {
                write!(f, "control readmission rate is zero; relative risk reduction is NaN")
            }
            Self::ZeroMargin { table } => write!(
                f,
                "contingency table {table:?} has a zero margin; chi-squared reported as 0 (p = 1)"
            ),
            Self::LowExpectedCount {
                min_expected,
                threshold,
            } => write!(
                f,
                "chi-squared expected count {min_expected:.2} below {threshold}; result is low-confidence"
            ),
            Self::SparseSubgroup { condition, group } => {
                write!(f, "subgroup {condition:?} has no {group} rows; rate is NaN")
            }
        }
    }
}
