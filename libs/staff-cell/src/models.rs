use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

// ==============================================================================
// ENUMS
// ==============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum StaffRole {
    Doctor,
    Receptionist,
    Admin,
}

impl StaffRole {
    pub const ALL: [StaffRole; 3] = [StaffRole::Doctor, StaffRole::Receptionist, StaffRole::Admin];

    pub fn as_str(&self) -> &'static str {
        match self {
            StaffRole::Doctor => "doctor",
            StaffRole::Receptionist => "receptionist",
            StaffRole::Admin => "admin",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            StaffRole::Doctor => "Doctor",
            StaffRole::Receptionist => "Receptionist",
            StaffRole::Admin => "Admin",
        }
    }
}

impl fmt::Display for StaffRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StaffRole {
    type Err = StaffError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "doctor" => Ok(StaffRole::Doctor),
            "receptionist" => Ok(StaffRole::Receptionist),
            "admin" => Ok(StaffRole::Admin),
            other => Err(StaffError::ValidationError(format!("Unknown staff role: {}", other))),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum StaffStatus {
    #[default]
    Active,
    Inactive,
    OnLeave,
}

impl StaffStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            StaffStatus::Active => "active",
            StaffStatus::Inactive => "inactive",
            StaffStatus::OnLeave => "on_leave",
        }
    }
}

impl fmt::Display for StaffStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StaffStatus {
    type Err = StaffError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(StaffStatus::Active),
            "inactive" => Ok(StaffStatus::Inactive),
            "on_leave" => Ok(StaffStatus::OnLeave),
            other => Err(StaffError::ValidationError(format!("Unknown staff status: {}", other))),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Male,
    Female,
    Other,
}

// ==============================================================================
// RECORDS
// ==============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Staff {
    pub staff_id: String,
    pub full_name: String,
    pub working_email: String,
    pub role: StaffRole,
    pub years_experience: Option<u32>,
    pub hired_at: Option<String>,
    #[serde(default)]
    pub is_available: bool,
    #[serde(default)]
    pub staff_status: StaffStatus,
    pub gender: Option<Gender>,
    #[serde(default)]
    pub languages: Vec<String>,
    pub image_link: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DoctorDetails {
    pub doctor_id: String,
    pub department: Option<String>,
    pub speciality: Option<String>,
    pub license_no: Option<String>,
    pub bio: Option<String>,
    pub slogan: Option<String>,
    pub about_me: Option<Value>,
    pub educations: Option<Value>,
    pub certifications: Option<Value>,
}

/// A doctor's staff row with its embedded `doctor_details`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DoctorProfile {
    #[serde(flatten)]
    pub staff: Staff,
    #[serde(default, deserialize_with = "embedded_one")]
    pub doctor_details: Option<DoctorDetails>,
}

/// PostgREST embeds a related row as an object or a one-element array
/// depending on how the foreign key is declared.
fn embedded_one<'de, D>(deserializer: D) -> Result<Option<DoctorDetails>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Embedded {
        One(DoctorDetails),
        Many(Vec<DoctorDetails>),
    }

    Ok(match Option::<Embedded>::deserialize(deserializer)? {
        Some(Embedded::One(details)) => Some(details),
        Some(Embedded::Many(list)) => list.into_iter().next(),
        None => None,
    })
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleOption {
    pub value: StaffRole,
    pub label: String,
}

// ==============================================================================
// REQUESTS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateStaffRequest {
    pub full_name: String,
    pub working_email: String,
    pub role: Option<StaffRole>,
    pub years_experience: Option<u32>,
    pub hired_at: Option<String>,
    #[serde(default = "default_true")]
    pub is_available: bool,
    #[serde(default)]
    pub staff_status: StaffStatus,
    pub gender: Option<Gender>,
    #[serde(default)]
    pub languages: Vec<String>,
    pub image_link: Option<String>,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateStaffRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub working_email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<StaffRole>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub years_experience: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hired_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_available: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub staff_status: Option<StaffStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<Gender>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub languages: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_link: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DoctorDetailsUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speciality: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub license_no: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slogan: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub about_me: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub educations: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub certifications: Option<Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateDoctorProfileRequest {
    #[serde(default)]
    pub staff: UpdateStaffRequest,
    #[serde(default)]
    pub doctor_details: DoctorDetailsUpdate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkStatusRequest {
    pub staff_ids: Vec<String>,
    pub staff_status: StaffStatus,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StaffListQuery {
    pub search: Option<String>,
    pub role: Option<String>,
    pub status: Option<String>,
    pub available: Option<bool>,
    pub page: Option<usize>,
    pub page_size: Option<usize>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StaffLookupQuery {
    pub email: Option<String>,
}

// ==============================================================================
// ERRORS
// ==============================================================================

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StaffError {
    #[error("Staff member not found")]
    NotFound,

    #[error("A staff member with email {0} already exists")]
    EmailTaken(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}
