//! # u-abtest
//!
//! Observational A/B analysis of a care-management program's effect on
//! hospital readmissions.
//!
//! The crate takes a patient-level table (one row per patient × enrollment
//! status) and compares enrolled (treatment) against non-enrolled (control)
//! patients: readmission rates, a χ² independence test, relative risk
//! reduction, per-metric t-tests, and per-condition subgroup rates.
//!
//! ## Modules
//!
//! - [`dataset`] — Patient records, loaders, raw-row aggregation
//! - [`analysis`] — Group, metric and subgroup analyzers; the aggregated report
//! - [`testing`] — Hypothesis tests (Welch/Student t, χ² independence)
//! - [`stats`] — Null-aware descriptive statistics
//! - [`charts`] — Chart-ready series built from a report
//! - [`config`] — Analysis tunables
//! - [`observe`] — Structured event hook (`tracing` by default)
//! - [`error`] — Fatal errors and tolerated warnings
//!
//! ## Design Philosophy
//!
//! - **Pure core**: analyzers are functions of the in-memory table; all
//!   output goes through the returned report or the observer hook
//! - **Fail fast on structure, degrade on power**: empty arms abort the run,
//!   under-powered tests are marked "not computed"
//! - **Null-aware**: missing values are dropped, never coerced to zero

pub mod analysis;
pub mod charts;
pub mod config;
pub mod dataset;
pub mod error;
pub mod observe;
pub mod stats;
pub mod testing;

pub use analysis::{analyze, run, AnalysisReport};
pub use config::AnalysisConfig;
pub use dataset::{Dataset, PatientRecord};
pub use error::{AnalysisError, AnalysisWarning};
