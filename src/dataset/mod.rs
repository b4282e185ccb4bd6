//! Patient dataset: records, loading, and raw-row aggregation.
//!
//! # Components
//!
//! - [`PatientRecord`], [`Dataset`] — the validated in-memory table
//! - [`DatasetLoader`] — the I/O seam ([`InMemoryLoader`], [`JsonLoader`])
//! - [`aggregate_patients`] — derives records from raw store rows

mod aggregate;
mod loader;
mod record;

pub use aggregate::{aggregate_patients, Enrollment, Patient, SurveyResponse, Visit};
pub use loader::{DatasetLoader, InMemoryLoader, JsonLoader, LoadOutcome};
pub use record::{Dataset, Group, PatientRecord, MAX_AGE};
