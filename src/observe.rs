//! Observability hook.
//!
//! The analyzers never log directly. They emit [`AnalysisEvent`]s into an
//! [`AnalysisObserver`] supplied by the caller, so the computation stays a
//! function of its input table and the output sink is pluggable.

use crate::error::AnalysisWarning;
use crate::testing::TestResult;

/// Structured progress and result events.
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisEvent {
    /// The loader returned this many rows; `0` means an explicitly empty load.
    Loaded { rows: usize },
    /// Overall readmission rates.
    GroupRates {
        control_rate: f64,
        treatment_rate: f64,
        control_n: usize,
        treatment_n: usize,
    },
    /// Overall χ² test of group × readmission.
    ChiSquare {
        statistic: f64,
        p_value: f64,
        low_confidence: bool,
    },
    RelativeRiskReduction { value: f64 },
    /// One metric compared across groups; `test` is `None` when skipped.
    MetricCompared {
        metric: String,
        control_mean: f64,
        treatment_mean: f64,
        test: Option<TestResult>,
    },
    SubgroupCompared {
        condition: String,
        control_rate: f64,
        treatment_rate: f64,
    },
    Warning(AnalysisWarning),
    Completed,
}

/// Receives events as the analysis runs.
pub trait AnalysisObserver {
    fn on_event(&mut self, event: &AnalysisEvent);
}

/// Forwards events to `tracing`: results at `INFO`, warnings at `WARN`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl AnalysisObserver for TracingObserver {
    fn on_event(&mut self, event: &AnalysisEvent) {
        match event {
            AnalysisEvent::Loaded { rows: 0 } => {
                tracing::warn!("dataset load returned no rows");
            }
            AnalysisEvent::Loaded { rows } => {
                tracing::info!(rows, "dataset loaded");
            }
            AnalysisEvent::GroupRates {
                control_rate,
                treatment_rate,
                control_n,
                treatment_n,
            } => {
                tracing::info!(
                    control_rate,
                    treatment_rate,
                    control_n,
                    treatment_n,
                    "readmission rates"
                );
            }
            AnalysisEvent::ChiSquare {
                statistic,
                p_value,
                low_confidence,
            } => {
                tracing::info!(chi2 = statistic, p_value, low_confidence, "chi-squared test");
            }
            AnalysisEvent::RelativeRiskReduction { value } => {
                tracing::info!(relative_risk_reduction = value, "relative risk reduction");
            }
            AnalysisEvent::MetricCompared {
                metric,
                control_mean,
                treatment_mean,
                test,
            } => match test {
                Some(t) => tracing::info!(
                    metric = metric.as_str(),
                    control_mean,
                    treatment_mean,
                    t_statistic = t.statistic,
                    df = t.df,
                    p_value = t.p_value,
                    "metric compared"
                ),
                None => tracing::info!(
                    metric = metric.as_str(),
                    control_mean,
                    treatment_mean,
                    "metric compared without t-test"
                ),
            },
            AnalysisEvent::SubgroupCompared {
                condition,
                control_rate,
                treatment_rate,
            } => {
                tracing::info!(
                    condition = condition.as_str(),
                    control_rate,
                    treatment_rate,
                    "subgroup"
                );
            }
            AnalysisEvent::Warning(w) => {
                tracing::warn!(warning = %w, "analysis warning");
            }
            AnalysisEvent::Completed => {
                tracing::info!("analysis completed");
            }
        }
    }
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullObserver;

impl AnalysisObserver for NullObserver {
    fn on_event(&mut self, _event: &AnalysisEvent) {}
}

/// Buffers events in arrival order.
#[derive(Debug, Default, Clone)]
pub struct CollectingObserver {
    pub events: Vec<AnalysisEvent>,
}

impl CollectingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Warnings seen so far.
    pub fn warnings(&self) -> impl Iterator<Item = &AnalysisWarning> {
        self.events.iter().filter_map(|e| match e {
            AnalysisEvent::Warning(w) => Some(w),
            _ => None,
        })
    }
}

impl AnalysisObserver for CollectingObserver {
    fn on_event(&mut self, event: &AnalysisEvent) {
        self.events.push(event.clone());
    }
}
