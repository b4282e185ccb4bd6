//! Control vs treatment readmission analysis.
//!
//! [`analyze`] runs the full comparison over an in-memory [`Dataset`]:
//!
//! 1. overall readmission rates, χ² independence test and relative risk
//!    reduction (fatal if either arm is empty);
//! 2. per-metric group means and two-sample t-tests for readmission,
//!    satisfaction and days to readmission (tests degrade to "not computed");
//! 3. readmission rates within every chronic condition (sparse strata give
//!    `NaN`).
//!
//! Results are assembled into one [`AnalysisReport`]. Events and warnings
//! go to the caller's [`AnalysisObserver`].
//!
//! # Examples
//!
//! ```
//! use u_abtest::analysis::analyze;
//! use u_abtest::config::AnalysisConfig;
//! use u_abtest::dataset::{Dataset, PatientRecord};
//! use u_abtest::observe::NullObserver;
//!
//! let row = |id: &str, enrolled: bool, readmitted: bool| PatientRecord {
//!     patient_id: id.into(),
//!     age: 58,
//!     gender: "Female".into(),
//!     chronic_condition: "Diabetes".into(),
//!     enrolled_in_program: enrolled,
//!     is_readmission: readmitted,
//!     satisfaction: None,
//!     days_to_readmission: None,
//! };
//! let ds = Dataset::new(vec![
//!     row("C1", false, true),
//!     row("C2", false, false),
//!     row("T1", true, false),
//!     row("T2", true, false),
//! ])
//! .unwrap();
//!
//! let report = analyze(&ds, &AnalysisConfig::default(), &mut NullObserver).unwrap();
//! assert_eq!(report.control_readmission_rate, 0.5);
//! assert_eq!(report.relative_risk_reduction, 1.0);
//! ```

mod group;
mod metric;
mod report;
mod subgroup;

pub use group::{relative_risk_reduction, ChiSquareSummary, GroupComparison};
pub use metric::{Metric, MetricComparison, Significance};
pub use report::{AnalysisReport, GroupMeans};
pub use subgroup::SubgroupRates;

use crate::config::AnalysisConfig;
use crate::dataset::{Dataset, DatasetLoader};
use crate::error::{AnalysisError, AnalysisWarning};
use crate::observe::{AnalysisEvent, AnalysisObserver};

/// Routes events to the observer and keeps warnings for the report.
pub(crate) struct Emitter<'a> {
    observer: &'a mut dyn AnalysisObserver,
    warnings: Vec<AnalysisWarning>,
}

impl<'a> Emitter<'a> {
    pub(crate) fn new(observer: &'a mut dyn AnalysisObserver) -> Self {
        Self {
            observer,
            warnings: Vec::new(),
        }
    }

    pub(crate) fn event(&mut self, event: AnalysisEvent) {
        self.observer.on_event(&event);
    }

    pub(crate) fn warn(&mut self, warning: AnalysisWarning) {
        self.observer.on_event(&AnalysisEvent::Warning(warning.clone()));
        self.warnings.push(warning);
    }

    pub(crate) fn into_warnings(self) -> Vec<AnalysisWarning> {
        self.warnings
    }
}

/// Runs every analyzer over `dataset`.
///
/// # Errors
///
/// Fails without a partial result on an invalid `config` or an empty arm
/// ([`AnalysisError::DegenerateInput`]). A zero-margin χ² table, skipped
/// t-tests and sparse subgroups are not errors; they appear in
/// [`AnalysisReport::warnings`].
pub fn analyze(
    dataset: &Dataset,
    config: &AnalysisConfig,
    observer: &mut dyn AnalysisObserver,
) -> Result<AnalysisReport, AnalysisError> {
    config.validate()?;
    let mut emit = Emitter::new(observer);

    let overall = group::compare_groups(dataset, config, &mut emit)?;

    let [readmission_rates, satisfaction_scores, days_to_readmission] = Metric::ALL
        .map(|m| metric::compare_metric(dataset, m.name(), |r| m.extract(r), config, &mut emit));

    let subgroup_results = subgroup::compare_subgroups(dataset, &mut emit);

    emit.event(AnalysisEvent::Completed);
    Ok(AnalysisReport {
        control_readmission_rate: overall.control_rate,
        treatment_readmission_rate: overall.treatment_rate,
        control_n: overall.control_n,
        treatment_n: overall.treatment_n,
        chi2: overall.chi_square.statistic,
        p_value: overall.chi_square.p_value,
        chi_square: overall.chi_square,
        relative_risk_reduction: overall.relative_risk_reduction,
        readmission_rates,
        satisfaction_scores,
        days_to_readmission,
        subgroup_results,
        warnings: emit.into_warnings(),
    })
}

/// Loads a dataset and analyzes it.
///
/// A load failure surfaces as [`AnalysisError::DataUnavailable`] and is not
/// retried. An explicitly empty load becomes an empty dataset, which then
/// fails the empty-arm check.
pub fn run(
    loader: &mut dyn DatasetLoader,
    config: &AnalysisConfig,
    observer: &mut dyn AnalysisObserver,
) -> Result<AnalysisReport, AnalysisError> {
    let rows = loader.load()?.into_rows();
    observer.on_event(&AnalysisEvent::Loaded { rows: rows.len() });
    let dataset = Dataset::new(rows)?;
    analyze(&dataset, config, observer)
}
