//! Readmission comparison within each chronic-condition stratum.

use std::collections::BTreeMap;

use serde::Serialize;

use super::Emitter;
use crate::dataset::{Dataset, Group, PatientRecord};
use crate::error::AnalysisWarning;
use crate::observe::AnalysisEvent;
use crate::stats;

/// Readmission rates of one stratum.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubgroupRates {
    /// `NaN` when the stratum has no control rows.
    pub control_rate: f64,
    /// `NaN` when the stratum has no treatment rows.
    pub treatment_rate: f64,
    pub control_n: usize,
    pub treatment_n: usize,
}

impl SubgroupRates {
    /// Treatment minus control; `NaN` if either side is empty.
    pub fn difference(&self) -> f64 {
        self.treatment_rate - self.control_rate
    }
}

fn stratum<'a>(
    dataset: &'a Dataset,
    group: Group,
    condition: &'a str,
) -> impl Iterator<Item = &'a PatientRecord> + 'a {
    dataset
        .group(group)
        .filter(move |r| r.chronic_condition == condition)
}

/// Compares readmission rates within every distinct `chronic_condition`.
///
/// A stratum with an empty side never aborts the run: that side's rate is
/// `NaN` and an [`AnalysisWarning::SparseSubgroup`] is raised.
pub(crate) fn compare_subgroups(
    dataset: &Dataset,
    emit: &mut Emitter<'_>,
) -> BTreeMap<String, SubgroupRates> {
    let mut results = BTreeMap::new();
    for condition in dataset.conditions() {
        let control_n = stratum(dataset, Group::Control, condition).count();
        let treatment_n = stratum(dataset, Group::Treatment, condition).count();
        let rates = SubgroupRates {
            control_rate: stats::proportion(
                stratum(dataset, Group::Control, condition).map(|r| r.is_readmission),
            ),
            treatment_rate: stats::proportion(
                stratum(dataset, Group::Treatment, condition).map(|r| r.is_readmission),
            ),
            control_n,
            treatment_n,
        };

        for (group, n) in [(Group::Control, control_n), (Group::Treatment, treatment_n)] {
            if n == 0 {
                emit.warn(AnalysisWarning::SparseSubgroup {
                    condition: condition.to_string(),
                    group,
                });
            }
        }
        emit.event(AnalysisEvent::SubgroupCompared {
            condition: condition.to_string(),
            control_rate: rates.control_rate,
            treatment_rate: rates.treatment_rate,
        });
        results.insert(condition.to_string(), rates);
    }
    results
}
