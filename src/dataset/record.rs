//! Patient records and the in-memory table.

use std::collections::{BTreeSet, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::AnalysisError;

/// Oldest plausible patient age.
pub const MAX_AGE: u32 = 120;

/// Arm of the comparison, keyed by program enrollment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Group {
    /// Not enrolled (`enrolled_in_program = false`).
    Control,
    /// Enrolled (`enrolled_in_program = true`).
    Treatment,
}

impl Group {
    pub const ALL: [Group; 2] = [Group::Control, Group::Treatment];

    pub fn from_enrolled(enrolled: bool) -> Self {
        if enrolled {
            Group::Treatment
        } else {
            Group::Control
        }
    }

    /// The value of `enrolled_in_program` this group stands for.
    pub fn enrolled(self) -> bool {
        self == Group::Treatment
    }
}

impl fmt::Display for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Group::Control => f.write_str("control"),
            Group::Treatment => f.write_str("treatment"),
        }
    }
}

/// One patient × enrollment status, aggregated over visits and surveys.
///
/// Field aliases accept the upstream store's column names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientRecord {
    #[serde(alias = "PatientID")]
    pub patient_id: String,
    #[serde(alias = "Age")]
    pub age: u32,
    #[serde(alias = "Gender")]
    pub gender: String,
    #[serde(alias = "ChronicCondition")]
    pub chronic_condition: String,
    #[serde(alias = "EnrolledInProgram")]
    pub enrolled_in_program: bool,
    /// More than one hospital visit on record.
    #[serde(alias = "IsReadmission")]
    pub is_readmission: bool,
    /// Mean survey score; `None` without survey responses.
    #[serde(default, alias = "Satisfaction")]
    pub satisfaction: Option<f64>,
    /// Days between a readmission and the preceding discharge.
    #[serde(default, alias = "DaysToReadmission")]
    pub days_to_readmission: Option<f64>,
}

impl PatientRecord {
    pub fn group(&self) -> Group {
        Group::from_enrolled(self.enrolled_in_program)
    }

    /// Checks the age range and that present numerics are finite.
    pub fn validate(&self) -> Result<(), AnalysisError> {
        let invalid = |reason: String| AnalysisError::InvalidRecord {
            patient_id: self.patient_id.clone(),
            reason,
        };
        if self.age > MAX_AGE {
            return Err(invalid(format!("age {} outside 0..={MAX_AGE}", self.age)));
        }
        if let Some(s) = self.satisfaction {
            if !s.is_finite() {
                return Err(invalid(format!("satisfaction {s} is not finite")));
            }
        }
        if let Some(d) = self.days_to_readmission {
            if !d.is_finite() {
                return Err(invalid(format!("days_to_readmission {d} is not finite")));
            }
        }
        Ok(())
    }
}

/// Validated, immutable patient table.
///
/// # Examples
///
/// ```
/// use u_abtest::dataset::{Dataset, Group, PatientRecord};
///
/// let row = |id: &str, enrolled: bool| PatientRecord {
///     patient_id: id.into(),
///     age: 60,
///     gender: "Female".into(),
///     chronic_condition: "Diabetes".into(),
///     enrolled_in_program: enrolled,
///     is_readmission: false,
///     satisfaction: None,
///     days_to_readmission: None,
/// };
/// let ds = Dataset::new(vec![row("P1", false), row("P2", true), row("P3", true)]).unwrap();
/// assert_eq!(ds.group_size(Group::Treatment), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    records: Vec<PatientRecord>,
}

impl Dataset {
    /// Validates every record and rejects duplicate patient × enrollment rows.
    pub fn new(records: Vec<PatientRecord>) -> Result<Self, AnalysisError> {
        let mut seen = HashSet::with_capacity(records.len());
        for r in &records {
            r.validate()?;
            if !seen.insert((r.patient_id.as_str(), r.enrolled_in_program)) {
                return Err(AnalysisError::InvalidRecord {
                    patient_id: r.patient_id.clone(),
                    reason: format!(
                        "duplicate row for enrolled_in_program = {}",
                        r.enrolled_in_program
                    ),
                });
            }
        }
        Ok(Self { records })
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn records(&self) -> &[PatientRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Rows belonging to one arm.
    pub fn group(&self, group: Group) -> impl Iterator<Item = &PatientRecord> {
        self.records.iter().filter(move |r| r.group() == group)
    }

    pub fn group_size(&self, group: Group) -> usize {
        self.group(group).count()
    }

    /// Distinct chronic conditions, each once.
    pub fn conditions(&self) -> BTreeSet<&str> {
        self.records
            .iter()
            .map(|r| r.chronic_condition.as_str())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, enrolled: bool, condition: &str) -> PatientRecord {
        PatientRecord {
            patient_id: id.into(),
            age: 50,
            gender: "Male".into(),
            chronic_condition: condition.into(),
            enrolled_in_program: enrolled,
            is_readmission: false,
            satisfaction: None,
            days_to_readmission: None,
        }
    }

    #[test]
    fn group_mapping() {
        assert_eq!(Group::from_enrolled(true), Group::Treatment);
        assert_eq!(Group::from_enrolled(false), Group::Control);
        assert!(Group::Treatment.enrolled());
        assert_eq!(Group::Control.to_string(), "control");
    }

    #[test]
    fn rejects_age_out_of_range() {
        let mut r = record("P1", false, "None");
        r.age = 121;
        let err = Dataset::new(vec![r]).unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidRecord { .. }));
    }

    #[test]
    fn rejects_non_finite_satisfaction() {
        let mut r = record("P1", false, "None");
        r.satisfaction = Some(f64::INFINITY);
        assert!(Dataset::new(vec![r]).is_err());
    }

    #[test]
    fn same_patient_may_appear_in_both_arms_once() {
        let rows = vec![record("P1", false, "COPD"), record("P1", true, "COPD")];
        assert!(Dataset::new(rows).is_ok());
        let rows = vec![record("P1", true, "COPD"), record("P1", true, "COPD")];
        assert!(Dataset::new(rows).is_err());
    }

    #[test]
    fn distinct_conditions() {
        let ds = Dataset::new(vec![
            record("P1", false, "COPD"),
            record("P2", true, "Diabetes"),
            record("P3", true, "COPD"),
        ])
        .expect("valid");
        let conditions: Vec<_> = ds.conditions().into_iter().collect();
        assert_eq!(conditions, vec!["COPD", "Diabetes"]);
    }

    #[test]
    fn deserializes_upstream_column_names() {
        let json = r#"{
            "PatientID": "P07", "Age": 71, "Gender": "Female",
            "ChronicCondition": "Hypertension", "EnrolledInProgram": true,
            "IsReadmission": true, "Satisfaction": 7.5, "DaysToReadmission": null
        }"#;
        let r: PatientRecord = serde_json::from_str(json).expect("parse");
        assert_eq!(r.patient_id, "P07");
        assert_eq!(r.group(), Group::Treatment);
        assert_eq!(r.satisfaction, Some(7.5));
        assert_eq!(r.days_to_readmission, None);
    }
}
