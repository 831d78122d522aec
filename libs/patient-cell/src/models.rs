use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Male,
    Female,
    Other,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum VaccinationStatus {
    NotVaccinated,
    PartiallyVaccinated,
    FullyVaccinated,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PatientStatus {
    #[default]
    Active,
    Inactive,
    Deleted,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Patient {
    pub id: String,
    pub full_name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub email: String,
    pub date_of_birth: Option<String>,
    pub gender: Option<Gender>,
    pub allergies: Option<Value>,
    pub chronic_conditions: Option<Value>,
    pub past_surgeries: Option<Value>,
    pub vaccination_status: Option<VaccinationStatus>,
    #[serde(default)]
    pub patient_status: PatientStatus,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
    pub image_link: Option<String>,
    pub bio: Option<String>,
    pub address: Option<String>,
    pub emergency_contact: Option<String>,
}

/// `id, full_name` projection used to fill patient pickers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PatientSummary {
    pub id: String,
    pub full_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePatientRequest {
    /// Auth user id the profile belongs to.
    pub id: String,
    pub full_name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub date_of_birth: Option<String>,
    pub gender: Option<Gender>,
    pub allergies: Option<Value>,
    pub chronic_conditions: Option<Value>,
    pub past_surgeries: Option<Value>,
    pub vaccination_status: Option<VaccinationStatus>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdatePatientRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<Gender>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allergies: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chronic_conditions: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub past_surgeries: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vaccination_status: Option<VaccinationStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patient_status: Option<PatientStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_link: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emergency_contact: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PatientListQuery {
    pub page: Option<usize>,
    pub page_size: Option<usize>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PatientSearchQuery {
    pub q: Option<String>,
    pub page: Option<usize>,
    pub page_size: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PatientError {
    #[error("Patient not found")]
    NotFound,

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}
