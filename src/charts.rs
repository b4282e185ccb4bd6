//! Chart-ready series for reporting.
//!
//! Turns an [`AnalysisReport`] (and, for the demographic panels, the
//! dataset) into plain labelled series. Rendering is left to the consumer.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::analysis::{AnalysisReport, GroupMeans};
use crate::dataset::{Dataset, Group, PatientRecord};

/// Width of an age-histogram bin in years.
pub const AGE_BIN_WIDTH: u32 = 10;

const ARMS: [&str; 2] = ["Control", "Treatment"];

/// Single-series bar chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BarChart {
    pub title: String,
    pub y_label: String,
    pub labels: Vec<String>,
    pub values: Vec<f64>,
}

/// One named series of a grouped bar chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Series {
    pub name: String,
    pub values: Vec<f64>,
}

/// Bars grouped by category, one series per arm.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupedBarChart {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub categories: Vec<String>,
    pub series: Vec<Series>,
}

/// The full set of report panels.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSet {
    pub overall_readmission: BarChart,
    pub subgroup_readmission: GroupedBarChart,
    pub age_distribution: GroupedBarChart,
    pub gender_distribution: GroupedBarChart,
    pub satisfaction: BarChart,
    pub days_to_readmission: BarChart,
}

fn arm_bars(title: &str, y_label: &str, values: GroupMeans) -> BarChart {
    BarChart {
        title: title.to_string(),
        y_label: y_label.to_string(),
        labels: ARMS.iter().map(|s| s.to_string()).collect(),
        values: vec![values.control, values.treatment],
    }
}

/// Counts per category and arm, categories in sorted order.
fn counts_by<K: Ord + Clone>(
    dataset: &Dataset,
    key: impl Fn(&PatientRecord) -> K,
) -> (Vec<K>, [Vec<f64>; 2]) {
    let mut counts: BTreeMap<K, [f64; 2]> = BTreeMap::new();
    for r in dataset.records() {
        let slot = counts.entry(key(r)).or_insert([0.0; 2]);
        slot[usize::from(r.group().enrolled())] += 1.0;
    }
    let categories: Vec<K> = counts.keys().cloned().collect();
    let control = counts.values().map(|c| c[0]).collect();
    let treatment = counts.values().map(|c| c[1]).collect();
    (categories, [control, treatment])
}

fn arm_series([control, treatment]: [Vec<f64>; 2]) -> Vec<Series> {
    vec![
        Series {
            name: ARMS[0].to_string(),
            values: control,
        },
        Series {
            name: ARMS[1].to_string(),
            values: treatment,
        },
    ]
}

impl ChartSet {
    /// Builds every panel.
    ///
    /// # Examples
    ///
    /// ```
    /// use u_abtest::analysis::analyze;
    /// use u_abtest::charts::ChartSet;
    /// use u_abtest::config::AnalysisConfig;
    /// use u_abtest::dataset::{Dataset, PatientRecord};
    /// use u_abtest::observe::NullObserver;
    ///
    /// let row = |id: &str, enrolled: bool, readmitted: bool, age: u32| PatientRecord {
    ///     patient_id: id.into(),
    ///     age,
    ///     gender: "Male".into(),
    ///     chronic_condition: "COPD".into(),
    ///     enrolled_in_program: enrolled,
    ///     is_readmission: readmitted,
    ///     satisfaction: None,
    ///     days_to_readmission: None,
    /// };
    /// let ds = Dataset::new(vec![
    ///     row("C1", false, true, 34),
    ///     row("C2", false, false, 71),
    ///     row("T1", true, false, 45),
    ///     row("T2", true, true, 48),
    /// ])
    /// .unwrap();
    /// let report = analyze(&ds, &AnalysisConfig::default(), &mut NullObserver).unwrap();
    ///
    /// let charts = ChartSet::build(&ds, &report);
    /// assert_eq!(charts.overall_readmission.values, vec![0.5, 0.5]);
    /// assert_eq!(charts.age_distribution.categories, vec!["30-39", "40-49", "50-59", "60-69", "70-79"]);
    /// ```
    pub fn build(dataset: &Dataset, report: &AnalysisReport) -> Self {
        let overall_readmission = arm_bars(
            "Readmission Rates: Control vs Treatment",
            "Readmission Rate",
            GroupMeans {
                control: report.readmission_rate(Group::Control),
                treatment: report.readmission_rate(Group::Treatment),
            },
        );

        let categories: Vec<String> = report.subgroup_results.keys().cloned().collect();
        let control = report
            .subgroup_results
            .values()
            .map(|s| s.control_rate)
            .collect();
        let treatment = report
            .subgroup_results
            .values()
            .map(|s| s.treatment_rate)
            .collect();
        let subgroup_readmission = GroupedBarChart {
            title: "Readmission Rates by Chronic Condition".to_string(),
            x_label: "Chronic Condition".to_string(),
            y_label: "Readmission Rate".to_string(),
            categories,
            series: arm_series([control, treatment]),
        };

        Self {
            overall_readmission,
            subgroup_readmission,
            age_distribution: age_histogram(dataset),
            gender_distribution: gender_counts(dataset),
            satisfaction: arm_bars(
                "Average Satisfaction Scores: Control vs Treatment",
                "Satisfaction Score",
                report.satisfaction_scores.means,
            ),
            days_to_readmission: arm_bars(
                "Average Days to Readmission: Control vs Treatment",
                "Days to Readmission",
                report.days_to_readmission.means,
            ),
        }
    }
}

/// Patients per age decade and arm, covering every decade between the
/// youngest and oldest patient (empty decades included).
pub fn age_histogram(dataset: &Dataset) -> GroupedBarChart {
    let (bins, [control, treatment]) = counts_by(dataset, |r| r.age / AGE_BIN_WIDTH);
    let mut categories = Vec::new();
    let mut filled = [Vec::new(), Vec::new()];
    if let (Some(&first), Some(&last)) = (bins.first(), bins.last()) {
        for bin in first..=last {
            let lo = bin * AGE_BIN_WIDTH;
            categories.push(format!("{lo}-{}", lo + AGE_BIN_WIDTH - 1));
            let idx = bins.binary_search(&bin).ok();
            filled[0].push(idx.map_or(0.0, |i| control[i]));
            filled[1].push(idx.map_or(0.0, |i| treatment[i]));
        }
    }
    GroupedBarChart {
        title: "Age Distribution: Control vs Treatment".to_string(),
        x_label: "Age".to_string(),
        y_label: "Patients".to_string(),
        categories,
        series: arm_series(filled),
    }
}

/// Patients per gender and arm.
pub fn gender_counts(dataset: &Dataset) -> GroupedBarChart {
    let (categories, counts) = counts_by(dataset, |r| r.gender.clone());
    GroupedBarChart {
        title: "Gender Distribution: Control vs Treatment".to_string(),
        x_label: "Gender".to_string(),
        y_label: "Patients".to_string(),
        categories,
        series: arm_series(counts),
    }
}
