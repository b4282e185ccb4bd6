//! Overall control vs treatment comparison.

use serde::Serialize;

use super::Emitter;
use crate::config::AnalysisConfig;
use crate::dataset::{Dataset, Group};
use crate::error::{AnalysisError, AnalysisWarning};
use crate::observe::AnalysisEvent;
use crate::stats;
use crate::testing::{chi_squared_independence, ContingencyTest};

/// χ² test of group × readmission on the 2×2 table.
///
/// Rows are control, treatment; columns are not readmitted, readmitted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChiSquareSummary {
    pub statistic: f64,
    pub p_value: f64,
    /// 1 for a 2×2 table, 0 when a margin is zero.
    pub df: f64,
    /// Observed counts, row-major.
    pub observed: [u64; 4],
    /// Expected counts under independence, row-major.
    pub expected: [f64; 4],
    pub yates_corrected: bool,
    /// Some expected count fell below the configured minimum.
    pub low_confidence: bool,
}

/// Readmission rates of both arms and the tests derived from them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupComparison {
    pub control_rate: f64,
    pub treatment_rate: f64,
    pub control_n: usize,
    pub treatment_n: usize,
    pub chi_square: ChiSquareSummary,
    /// `NaN` when the control rate is zero.
    pub relative_risk_reduction: f64,
}

/// (control − treatment) / control.
///
/// # Returns
///
/// `None` when `control_rate` is zero (or not finite), where the ratio
/// would be infinite or undefined.
///
/// # Examples
///
/// ```
/// use u_abtest::analysis::relative_risk_reduction;
///
/// assert_eq!(relative_risk_reduction(0.25, 0.0), Some(1.0));
/// assert_eq!(relative_risk_reduction(0.3, 0.3), Some(0.0));
/// assert_eq!(relative_risk_reduction(0.0, 0.1), None);
/// ```
pub fn relative_risk_reduction(control_rate: f64, treatment_rate: f64) -> Option<f64> {
    if control_rate == 0.0 || !control_rate.is_finite() {
        return None;
    }
    Some((control_rate - treatment_rate) / control_rate)
}

/// Observed 2×2 counts: [control no, control yes, treatment no, treatment yes].
fn contingency_counts(dataset: &Dataset) -> [u64; 4] {
    let mut table = [0u64; 4];
    for r in dataset.records() {
        let row = usize::from(r.group().enrolled());
        let col = usize::from(r.is_readmission);
        table[row * 2 + col] += 1;
    }
    table
}

/// Expected counts under independence, computed from the margins alone.
fn expected_counts(observed: &[u64; 4]) -> [f64; 4] {
    let total = observed.iter().sum::<u64>() as f64;
    let rows = [observed[0] + observed[1], observed[2] + observed[3]];
    let cols = [observed[0] + observed[2], observed[1] + observed[3]];
    std::array::from_fn(|i| (rows[i / 2] * cols[i % 2]) as f64 / total)
}

fn summarize(
    test: &ContingencyTest,
    observed: [u64; 4],
    config: &AnalysisConfig,
    emit: &mut Emitter<'_>,
) -> ChiSquareSummary {
    let min_expected = test.min_expected();
    let low_confidence = min_expected < config.min_expected_count;
    if low_confidence {
        emit.warn(AnalysisWarning::LowExpectedCount {
            min_expected,
            threshold: config.min_expected_count,
        });
    }
    ChiSquareSummary {
        statistic: test.result.statistic,
        p_value: test.result.p_value,
        df: test.result.df,
        observed,
        expected: std::array::from_fn(|i| test.expected[i]),
        yates_corrected: test.corrected,
        low_confidence,
    }
}

/// Summary for a table whose readmission column is empty (nobody, or
/// everybody, readmitted). The outcome does not vary, so there is no
/// evidence against independence: χ² = 0, p = 1, df = 0.
fn zero_margin_summary(observed: [u64; 4], emit: &mut Emitter<'_>) -> ChiSquareSummary {
    emit.warn(AnalysisWarning::ZeroMargin { table: observed });
    ChiSquareSummary {
        statistic: 0.0,
        p_value: 1.0,
        df: 0.0,
        observed,
        expected: expected_counts(&observed),
        yates_corrected: false,
        low_confidence: true,
    }
}

/// Splits the dataset by enrollment and compares readmission.
///
/// When nobody, or everybody, was readmitted the χ² summary degrades to
/// a flagged no-evidence result and an [`AnalysisWarning::ZeroMargin`].
///
/// # Errors
///
/// [`AnalysisError::DegenerateInput`] if either arm is empty.
pub(crate) fn compare_groups(
    dataset: &Dataset,
    config: &AnalysisConfig,
    emit: &mut Emitter<'_>,
) -> Result<GroupComparison, AnalysisError> {
    let control_n = dataset.group_size(Group::Control);
    let treatment_n = dataset.group_size(Group::Treatment);
    if control_n == 0 || treatment_n == 0 {
        let group = if control_n == 0 {
            Group::Control
        } else {
            Group::Treatment
        };
        return Err(AnalysisError::DegenerateInput {
            group,
            control: control_n,
            treatment: treatment_n,
        });
    }

    let control_rate = stats::proportion(dataset.group(Group::Control).map(|r| r.is_readmission));
    let treatment_rate =
        stats::proportion(dataset.group(Group::Treatment).map(|r| r.is_readmission));
    emit.event(AnalysisEvent::GroupRates {
        control_rate,
        treatment_rate,
        control_n,
        treatment_n,
    });

    let observed = contingency_counts(dataset);
    let table = observed.map(|c| c as f64);
    // Both arms are non-empty, so `None` can only mean a zero column margin
    let chi_square = match chi_squared_independence(&table, 2, 2, config.yates_correction) {
        Some(test) => summarize(&test, observed, config, emit),
        None => zero_margin_summary(observed, emit),
    };
    emit.event(AnalysisEvent::ChiSquare {
        statistic: chi_square.statistic,
        p_value: chi_square.p_value,
        low_confidence: chi_square.low_confidence,
    });

    let rrr = match relative_risk_reduction(control_rate, treatment_rate) {
        Some(v) => v,
        None => {
            emit.warn(AnalysisWarning::ZeroControlRate);
            f64::NAN
        }
    };
    emit.event(AnalysisEvent::RelativeRiskReduction { value: rrr });

    Ok(GroupComparison {
        control_rate,
        treatment_rate,
        control_n,
        treatment_n,
        chi_square,
        relative_risk_reduction: rrr,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::test_support::{dataset, row};
    use crate::observe::CollectingObserver;

    fn run(ds: &Dataset) -> (Result<GroupComparison, AnalysisError>, Vec<AnalysisWarning>) {
        let mut obs = CollectingObserver::new();
        let mut emit = Emitter::new(&mut obs);
        let r = compare_groups(ds, &AnalysisConfig::default(), &mut emit);
        (r, emit.into_warnings())
    }

    #[test]
    fn rates_and_rrr() {
        let ds = dataset(vec![
            row("C1", false, true),
            row("C2", false, false),
            row("C3", false, false),
            row("C4", false, false),
            row("T1", true, false),
            row("T2", true, false),
            row("T3", true, false),
            row("T4", true, false),
        ]);
        let (r, warnings) = run(&ds);
        let g = r.expect("should compute");
        assert_eq!(g.control_rate, 0.25);
        assert_eq!(g.treatment_rate, 0.0);
        assert_eq!(g.relative_risk_reduction, 1.0);
        assert_eq!(g.chi_square.observed, [3, 1, 4, 0]);
        assert_eq!(g.chi_square.df, 1.0);
        // Expected readmitted cells are 0.5
        assert!(g.chi_square.low_confidence);
        assert!(matches!(
            warnings.as_slice(),
            [AnalysisWarning::LowExpectedCount { .. }]
        ));
    }

    #[test]
    fn empty_treatment_is_fatal() {
        let ds = dataset(vec![row("C1", false, true), row("C2", false, false)]);
        let (r, _) = run(&ds);
        assert!(matches!(
            r,
            Err(AnalysisError::DegenerateInput {
                group: Group::Treatment,
                control: 2,
                treatment: 0
            })
        ));
    }

    #[test]
    fn empty_control_is_fatal() {
        let ds = dataset(vec![row("T1", true, true)]);
        let (r, _) = run(&ds);
        assert!(matches!(
            r,
            Err(AnalysisError::DegenerateInput {
                group: Group::Control,
                ..
            })
        ));
    }

    #[test]
    fn zero_control_rate_is_flagged() {
        let ds = dataset(vec![
            row("C1", false, false),
            row("C2", false, false),
            row("T1", true, true),
            row("T2", true, false),
        ]);
        let (r, warnings) = run(&ds);
        let g = r.expect("should compute");
        assert!(g.relative_risk_reduction.is_nan());
        assert!(warnings.contains(&AnalysisWarning::ZeroControlRate));
    }

    #[test]
    fn no_readmissions_degrades_to_flagged_summary() {
        let ds = dataset(vec![
            row("C1", false, false),
            row("C2", false, false),
            row("C3", false, false),
            row("T1", true, false),
            row("T2", true, false),
            row("T3", true, false),
        ]);
        let (r, warnings) = run(&ds);
        let g = r.expect("should compute");
        assert_eq!(g.chi_square.statistic, 0.0);
        assert_eq!(g.chi_square.p_value, 1.0);
        assert_eq!(g.chi_square.df, 0.0);
        assert!(g.chi_square.low_confidence);
        assert_eq!(g.chi_square.expected, [3.0, 0.0, 3.0, 0.0]);
        assert!(g.relative_risk_reduction.is_nan());
        assert_eq!(
            warnings,
            vec![
                AnalysisWarning::ZeroMargin {
                    table: [3, 0, 3, 0]
                },
                AnalysisWarning::ZeroControlRate,
            ]
        );
    }

    #[test]
    fn everyone_readmitted_gives_zero_rrr() {
        let ds = dataset(vec![
            row("C1", false, true),
            row("C2", false, true),
            row("T1", true, true),
            row("T2", true, true),
        ]);
        let (r, warnings) = run(&ds);
        let g = r.expect("should compute");
        assert_eq!(g.chi_square.observed, [0, 2, 0, 2]);
        assert_eq!(g.chi_square.p_value, 1.0);
        assert_eq!(g.relative_risk_reduction, 0.0);
        assert_eq!(
            warnings,
            vec![AnalysisWarning::ZeroMargin {
                table: [0, 2, 0, 2]
            }]
        );
    }

    #[test]
    fn equal_rates_give_zero_rrr() {
        assert_eq!(relative_risk_reduction(0.4, 0.4), Some(0.0));
    }
}
