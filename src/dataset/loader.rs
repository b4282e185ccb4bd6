//! Dataset loading seam.
//!
//! A loader performs the one I/O step of a run. Failures are surfaced as
//! [`LoadError`] and never retried here; an empty but successful load is
//! reported as [`LoadOutcome::Empty`] rather than as an error.

use std::io::Read;

use crate::dataset::record::PatientRecord;
use crate::error::LoadError;

/// What a successful load produced.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome {
    Rows(Vec<PatientRecord>),
    /// The query succeeded and legitimately matched nothing.
    Empty,
}

impl LoadOutcome {
    /// Wraps `rows`, flagging an empty vector explicitly.
    pub fn from_rows(rows: Vec<PatientRecord>) -> Self {
        if rows.is_empty() {
            LoadOutcome::Empty
        } else {
            LoadOutcome::Rows(rows)
        }
    }

    pub fn into_rows(self) -> Vec<PatientRecord> {
        match self {
            LoadOutcome::Rows(rows) => rows,
            LoadOutcome::Empty => Vec::new(),
        }
    }
}

/// Produces the patient-visit-aggregated table.
pub trait DatasetLoader {
    fn load(&mut self) -> Result<LoadOutcome, LoadError>;
}

/// Serves records that are already in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryLoader {
    records: Vec<PatientRecord>,
}

impl InMemoryLoader {
    pub fn new(records: Vec<PatientRecord>) -> Self {
        Self { records }
    }
}

impl DatasetLoader for InMemoryLoader {
    fn load(&mut self) -> Result<LoadOutcome, LoadError> {
        Ok(LoadOutcome::from_rows(self.records.clone()))
    }
}

/// Reads a JSON array of [`PatientRecord`]s from any reader.
///
/// The reader is consumed by the first load; later loads see an empty
/// stream and fail to parse.
///
/// # Examples
///
/// ```
/// use u_abtest::dataset::{DatasetLoader, JsonLoader, LoadOutcome};
///
/// let mut loader = JsonLoader::new("[]".as_bytes());
/// assert_eq!(loader.load().unwrap(), LoadOutcome::Empty);
/// ```
#[derive(Debug)]
pub struct JsonLoader<R> {
    reader: R,
}

impl<R: Read> JsonLoader<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }
}

impl<R: Read> DatasetLoader for JsonLoader<R> {
    fn load(&mut self) -> Result<LoadOutcome, LoadError> {
        let rows: Vec<PatientRecord> =
            serde_json::from_reader(&mut self.reader).map_err(|e| {
                if e.is_io() {
                    LoadError::Io(e.into())
                } else {
                    LoadError::Parse(e)
                }
            })?;
        Ok(LoadOutcome::from_rows(rows))
    }
}
