//! Per-patient aggregation of raw store rows.
//!
//! Collapses patients, program enrollments, hospital visits and survey
//! responses into one [`PatientRecord`] per patient × enrollment status,
//! so any store-backed loader can share the same derivation rules.

use std::collections::{BTreeSet, HashMap};

use chrono::NaiveDate;
use serde::Deserialize;
use u_numflow::stats;

use crate::dataset::record::PatientRecord;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Patient {
    pub patient_id: String,
    pub age: u32,
    pub gender: String,
    pub chronic_condition: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Enrollment {
    pub patient_id: String,
    pub enrolled_in_program: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Visit {
    pub visit_id: String,
    pub patient_id: String,
    pub admission_date: NaiveDate,
    pub discharge_date: NaiveDate,
    /// Store-side flag marking this admission as a readmission.
    pub is_readmission: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SurveyResponse {
    pub patient_id: String,
    pub satisfaction: f64,
}

fn group_by_patient<'a, T>(
    rows: &'a [T],
    key: impl Fn(&T) -> &str,
) -> HashMap<&'a str, Vec<&'a T>> {
    let mut map: HashMap<&str, Vec<&T>> = HashMap::new();
    for row in rows {
        map.entry(key(row)).or_default().push(row);
    }
    map
}

/// Smallest gap in days between a flagged readmission and the discharge of
/// the visit admitted just before it.
fn days_to_readmission(visits: &[&Visit]) -> Option<f64> {
    let mut ordered: Vec<&Visit> = visits.to_vec();
    ordered.sort_by(|a, b| {
        (a.admission_date, &a.visit_id).cmp(&(b.admission_date, &b.visit_id))
    });
    ordered
        .windows(2)
        .filter(|w| w[1].is_readmission)
        .map(|w| (w[1].admission_date - w[0].discharge_date).num_days())
        .min()
        .map(|d| d as f64)
}

/// Builds the analysis table from raw rows.
///
/// # Rules
///
/// - Patients without an enrollment row belong to neither arm and are skipped.
/// - A patient enrolled under both statuses yields one record per status.
/// - `is_readmission` is true when the patient has more than one visit.
/// - `satisfaction` is the mean survey score, `None` without responses.
/// - `days_to_readmission` is defined only when a flagged readmission has a
///   preceding visit.
///
/// Output follows the order of `patients`, control before treatment.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use u_abtest::dataset::{aggregate_patients, Enrollment, Patient, Visit};
///
/// let d = |m, day| NaiveDate::from_ymd_opt(2023, m, day).unwrap();
/// let patients = vec![Patient {
///     patient_id: "P1".into(),
///     age: 67,
///     gender: "Male".into(),
///     chronic_condition: "COPD".into(),
/// }];
/// let enrollments = vec![Enrollment { patient_id: "P1".into(), enrolled_in_program: true }];
/// let visits = vec![
///     Visit { visit_id: "V1".into(), patient_id: "P1".into(),
///             admission_date: d(1, 2), discharge_date: d(1, 6), is_readmission: false },
///     Visit { visit_id: "V2".into(), patient_id: "P1".into(),
///             admission_date: d(1, 20), discharge_date: d(1, 22), is_readmission: true },
/// ];
/// let rows = aggregate_patients(&patients, &enrollments, &visits, &[]);
/// assert!(rows[0].is_readmission);
/// assert_eq!(rows[0].days_to_readmission, Some(14.0));
/// ```
pub fn aggregate_patients(
    patients: &[Patient],
    enrollments: &[Enrollment],
    visits: &[Visit],
    surveys: &[SurveyResponse],
) -> Vec<PatientRecord> {
    let mut statuses: HashMap<&str, BTreeSet<bool>> = HashMap::new();
    for e in enrollments {
        statuses
            .entry(e.patient_id.as_str())
            .or_default()
            .insert(e.enrolled_in_program);
    }
    let visits_by_patient = group_by_patient(visits, |v| v.patient_id.as_str());
    let surveys_by_patient = group_by_patient(surveys, |s| s.patient_id.as_str());

    let mut records = Vec::with_capacity(patients.len());
    for p in patients {
        let Some(enrolled) = statuses.get(p.patient_id.as_str()) else {
            continue;
        };
        let patient_visits = visits_by_patient
            .get(p.patient_id.as_str())
            .map(Vec::as_slice)
            .unwrap_or_default();
        let satisfaction = surveys_by_patient.get(p.patient_id.as_str()).and_then(|rs| {
            let scores: Vec<f64> = rs.iter().map(|r| r.satisfaction).collect();
            stats::mean(&scores)
        });
        let days = days_to_readmission(patient_visits);

        for &status in enrolled {
            records.push(PatientRecord {
                patient_id: p.patient_id.clone(),
                age: p.age,
                gender: p.gender.clone(),
                chronic_condition: p.chronic_condition.clone(),
                enrolled_in_program: status,
                is_readmission: patient_visits.len() > 1,
                satisfaction,
                days_to_readmission: days,
            });
        }
    }
    records
}
