// libs/doctor-cell/src/services/filter.rs
use crate::models::{DoctorPatient, DoctorPatientQuery};

/// Search and dropdown filters over the doctor's patient list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DoctorPatientFilter {
    pub search: Option<String>,
    pub gender: Option<String>,
    pub status: Option<String>,
}

fn present(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

impl DoctorPatientFilter {
    pub fn from_query(query: &DoctorPatientQuery) -> Self {
        Self {
            search: present(query.search.as_deref()).map(|s| s.to_lowercase()),
            gender: present(query.gender.as_deref()),
            status: present(query.status.as_deref()),
        }
    }

    pub fn matches(&self, patient: &DoctorPatient) -> bool {
        let search_matches = match &self.search {
            Some(term) => {
                patient.full_name.to_lowercase().contains(term)
                    || patient.phone.as_deref().is_some_and(|p| p.contains(term.as_str()))
                    || patient
                        .email
                        .as_deref()
                        .is_some_and(|e| e.to_lowercase().contains(term))
            }
            None => true,
        };

        search_matches
            && self.gender.as_deref().map_or(true, |g| patient.gender.as_deref() == Some(g))
            && self.status.as_deref().map_or(true, |s| patient.patient_status.as_deref() == Some(s))
    }

    pub fn apply(&self, patients: Vec<DoctorPatient>) -> Vec<DoctorPatient> {
        patients.into_iter().filter(|p| self.matches(p)).collect()
    }
}
