//! Per-metric group comparison.
//!
//! One operation, [`compare_metric`], serves every outcome: it takes an
//! extraction function, drops missing values, computes null-aware group
//! means and runs a two-sample t-test when both groups have enough data.

use serde::Serialize;

use super::report::GroupMeans;
use super::Emitter;
use crate::config::AnalysisConfig;
use crate::dataset::{Dataset, Group, PatientRecord};
use crate::error::{AnalysisWarning, SkipReason};
use crate::observe::AnalysisEvent;
use crate::stats;
use crate::testing::{pooled_t_test, two_sample_t_test, TestResult};

/// Outcomes compared across arms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    /// Readmission indicator coerced to 0/1.
    Readmission,
    Satisfaction,
    DaysToReadmission,
}

impl Metric {
    pub const ALL: [Metric; 3] = [
        Metric::Readmission,
        Metric::Satisfaction,
        Metric::DaysToReadmission,
    ];

    /// Column name of the metric.
    pub fn name(self) -> &'static str {
        match self {
            Metric::Readmission => "is_readmission",
            Metric::Satisfaction => "satisfaction",
            Metric::DaysToReadmission => "days_to_readmission",
        }
    }

    /// Value of the metric for one record; `None` when missing.
    pub fn extract(self, record: &PatientRecord) -> Option<f64> {
        match self {
            Metric::Readmission => Some(if record.is_readmission { 1.0 } else { 0.0 }),
            Metric::Satisfaction => record.satisfaction,
            Metric::DaysToReadmission => record.days_to_readmission,
        }
    }
}

/// Result of a t-test that may have been skipped.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Significance {
    Computed(TestResult),
    NotComputed { reason: SkipReason },
}

impl Significance {
    pub fn result(&self) -> Option<&TestResult> {
        match self {
            Significance::Computed(r) => Some(r),
            Significance::NotComputed { .. } => None,
        }
    }
}

/// One metric compared across arms.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricComparison {
    pub metric: String,
    /// Mean of the present values; `NaN` for a group with none.
    pub means: GroupMeans,
    /// Present (non-missing) observations in control.
    pub control_n: usize,
    /// Present (non-missing) observations in treatment.
    pub treatment_n: usize,
    /// Treatment versus control t-test.
    pub test: Significance,
}

impl MetricComparison {
    pub fn mean(&self, group: Group) -> f64 {
        self.means.get(group)
    }
}

/// Compares one metric across control and treatment.
///
/// Records for which `extract` returns `None` are left out of both the mean
/// and the test. The test is Welch's unless `config.equal_variance` is set,
/// and is skipped with an [`AnalysisWarning::TestSkipped`] when either
/// group has fewer than `config.min_observations_per_group` values, or when
/// both groups are constant.
pub(crate) fn compare_metric<F>(
    dataset: &Dataset,
    metric: &str,
    extract: F,
    config: &AnalysisConfig,
    emit: &mut Emitter<'_>,
) -> MetricComparison
where
    F: Fn(&PatientRecord) -> Option<f64>,
{
    let values = |group: Group| stats::present(dataset.group(group).map(&extract));
    let control = values(Group::Control);
    let treatment = values(Group::Treatment);

    let means = GroupMeans {
        control: stats::nan_mean(dataset.group(Group::Control).map(&extract)),
        treatment: stats::nan_mean(dataset.group(Group::Treatment).map(&extract)),
    };

    let min_n = config.min_observations_per_group;
    let test = if control.len() < min_n || treatment.len() < min_n {
        Significance::NotComputed {
            reason: SkipReason::InsufficientData,
        }
    } else {
        let result = if config.equal_variance {
            pooled_t_test(&treatment, &control)
        } else {
            two_sample_t_test(&treatment, &control)
        };
        match result {
            Some(r) => Significance::Computed(r),
            None => Significance::NotComputed {
                reason: SkipReason::ZeroVariance,
            },
        }
    };

    if let Significance::NotComputed { reason } = test {
        emit.warn(AnalysisWarning::TestSkipped {
            metric: metric.to_string(),
            control_n: control.len(),
            treatment_n: treatment.len(),
            reason,
        });
    }
    emit.event(AnalysisEvent::MetricCompared {
        metric: metric.to_string(),
        control_mean: means.control,
        treatment_mean: means.treatment,
        test: test.result().copied(),
    });

    MetricComparison {
        metric: metric.to_string(),
        means,
        control_n: control.len(),
        treatment_n: treatment.len(),
        test,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::test_support::{dataset, row};
    use crate::observe::CollectingObserver;

    fn compare(
        ds: &Dataset,
        metric: Metric,
        config: &AnalysisConfig,
    ) -> (MetricComparison, Vec<AnalysisWarning>) {
        let mut obs = CollectingObserver::new();
        let mut emit = Emitter::new(&mut obs);
        let m = compare_metric(ds, metric.name(), |r| metric.extract(r), config, &mut emit);
        (m, emit.into_warnings())
    }

    fn with_satisfaction(id: &str, enrolled: bool, s: Option<f64>) -> PatientRecord {
        let mut r = row(id, enrolled, false);
        r.satisfaction = s;
        r
    }

    #[test]
    fn missing_values_excluded_from_mean() {
        let ds = dataset(vec![
            with_satisfaction("C1", false, Some(4.0)),
            with_satisfaction("C2", false, None),
            with_satisfaction("C3", false, Some(8.0)),
            with_satisfaction("C4", false, None),
            with_satisfaction("T1", true, Some(9.0)),
            with_satisfaction("T2", true, Some(7.0)),
        ]);
        let (m, warnings) = compare(&ds, Metric::Satisfaction, &AnalysisConfig::default());
        assert_eq!(m.mean(Group::Control), 6.0);
        assert_eq!(m.mean(Group::Treatment), 8.0);
        assert_eq!(m.control_n, 2);
        assert!(m.test.result().is_some());
        assert!(warnings.is_empty());
    }

    #[test]
    fn insufficient_data_skips_test() {
        let ds = dataset(vec![
            with_satisfaction("C1", false, Some(4.0)),
            with_satisfaction("C2", false, None),
            with_satisfaction("T1", true, Some(9.0)),
            with_satisfaction("T2", true, Some(7.0)),
        ]);
        let (m, warnings) = compare(&ds, Metric::Satisfaction, &AnalysisConfig::default());
        assert_eq!(
            m.test,
            Significance::NotComputed {
                reason: SkipReason::InsufficientData
            }
        );
        assert_eq!(m.mean(Group::Control), 4.0);
        assert_eq!(
            warnings,
            vec![AnalysisWarning::TestSkipped {
                metric: "satisfaction".into(),
                control_n: 1,
                treatment_n: 2,
                reason: SkipReason::InsufficientData,
            }]
        );
    }

    #[test]
    fn group_without_values_has_nan_mean() {
        let ds = dataset(vec![
            row("C1", false, false),
            with_satisfaction("T1", true, Some(9.0)),
        ]);
        let (m, _) = compare(&ds, Metric::Satisfaction, &AnalysisConfig::default());
        assert!(m.mean(Group::Control).is_nan());
        assert_eq!(m.mean(Group::Treatment), 9.0);
    }

    #[test]
    fn constant_readmission_skips_with_zero_variance() {
        let ds = dataset(vec![
            row("C1", false, false),
            row("C2", false, false),
            row("T1", true, false),
            row("T2", true, false),
        ]);
        let (m, _) = compare(&ds, Metric::Readmission, &AnalysisConfig::default());
        assert_eq!(
            m.test,
            Significance::NotComputed {
                reason: SkipReason::ZeroVariance
            }
        );
        assert_eq!(m.mean(Group::Control), 0.0);
    }

    #[test]
    fn readmission_metric_matches_rates() {
        let ds = dataset(vec![
            row("C1", false, true),
            row("C2", false, true),
            row("C3", false, false),
            row("T1", true, false),
            row("T2", true, true),
            row("T3", true, false),
        ]);
        let (m, _) = compare(&ds, Metric::Readmission, &AnalysisConfig::default());
        assert!((m.mean(Group::Control) - 2.0 / 3.0).abs() < 1e-15);
        assert!((m.mean(Group::Treatment) - 1.0 / 3.0).abs() < 1e-15);
        let t = m.test.result().expect("computed");
        // Treatment minus control is negative
        assert!(t.statistic < 0.0);
    }

    #[test]
    fn equal_variance_switches_to_pooled_df() {
        let ds = dataset(vec![
            with_satisfaction("C1", false, Some(1.0)),
            with_satisfaction("C2", false, Some(2.0)),
            with_satisfaction("C3", false, Some(4.0)),
            with_satisfaction("T1", true, Some(5.0)),
            with_satisfaction("T2", true, Some(9.0)),
        ]);
        let config = AnalysisConfig::default().with_equal_variance(true);
        let (m, _) = compare(&ds, Metric::Satisfaction, &config);
        assert_eq!(m.test.result().expect("computed").df, 3.0);
    }

    #[test]
    fn metric_names() {
        let names: Vec<_> = Metric::ALL.iter().map(|m| m.name()).collect();
        assert_eq!(names, ["is_readmission", "satisfaction", "days_to_readmission"]);
    }
}
