//! The aggregated analysis result.

use std::collections::BTreeMap;

use serde::Serialize;

use super::group::ChiSquareSummary;
use super::metric::MetricComparison;
use super::subgroup::SubgroupRates;
use crate::dataset::Group;
use crate::error::AnalysisWarning;

/// A value per arm, serialized under the enrollment flag (`"false"`, `"true"`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GroupMeans {
    #[serde(rename = "false")]
    pub control: f64,
    #[serde(rename = "true")]
    pub treatment: f64,
}

impl GroupMeans {
    pub fn get(&self, group: Group) -> f64 {
        match group {
            Group::Control => self.control,
            Group::Treatment => self.treatment,
        }
    }
}

/// Everything one run produces, the sole input to reporting.
///
/// Consumers address fields by name; `subgroup_results` iterates in key
/// order but carries no meaning in that order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisReport {
    pub control_readmission_rate: f64,
    pub treatment_readmission_rate: f64,
    pub control_n: usize,
    pub treatment_n: usize,
    /// χ² statistic of group × readmission.
    pub chi2: f64,
    /// p-value of the χ² test.
    pub p_value: f64,
    pub chi_square: ChiSquareSummary,
    /// `NaN` when the control rate is zero, see `warnings`.
    pub relative_risk_reduction: f64,
    pub readmission_rates: MetricComparison,
    pub satisfaction_scores: MetricComparison,
    pub days_to_readmission: MetricComparison,
    pub subgroup_results: BTreeMap<String, SubgroupRates>,
    /// Tolerated degradations, in the order they were raised.
    pub warnings: Vec<AnalysisWarning>,
}

impl AnalysisReport {
    pub fn readmission_rate(&self, group: Group) -> f64 {
        match group {
            Group::Control => self.control_readmission_rate,
            Group::Treatment => self.treatment_readmission_rate,
        }
    }

    /// Serializes to JSON; non-finite numbers become `null`.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
