// libs/appointment-cell/src/models.rs
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ==============================================================================
// ENUMS
// ==============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum VisitType {
    Consultation,
    FollowUp,
    Emergency,
    RoutineCheckup,
}

impl VisitType {
    pub fn as_str(&self) -> &'static str {
        match self {
            VisitType::Consultation => "consultation",
            VisitType::FollowUp => "follow_up",
            VisitType::Emergency => "emergency",
            VisitType::RoutineCheckup => "routine_checkup",
        }
    }
}

impl fmt::Display for VisitType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VisitType {
    type Err = AppointmentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "consultation" => Ok(VisitType::Consultation),
            "follow_up" => Ok(VisitType::FollowUp),
            "emergency" => Ok(VisitType::Emergency),
            "routine_checkup" => Ok(VisitType::RoutineCheckup),
            other => Err(AppointmentError::ValidationError(format!("Unknown visit type: {}", other))),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ProcessStatus {
    Pending,
    Confirmed,
    Completed,
    Cancelled,
    NoShow,
}

impl ProcessStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProcessStatus::Pending => "pending",
            ProcessStatus::Confirmed => "confirmed",
            ProcessStatus::Completed => "completed",
            ProcessStatus::Cancelled => "cancelled",
            ProcessStatus::NoShow => "no_show",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ProcessStatus::Completed | ProcessStatus::Cancelled | ProcessStatus::NoShow)
    }
}

impl fmt::Display for ProcessStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProcessStatus {
    type Err = AppointmentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ProcessStatus::Pending),
            "confirmed" => Ok(ProcessStatus::Confirmed),
            "completed" => Ok(ProcessStatus::Completed),
            "cancelled" => Ok(ProcessStatus::Cancelled),
            "no_show" => Ok(ProcessStatus::NoShow),
            other => Err(AppointmentError::ValidationError(format!("Unknown appointment status: {}", other))),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Schedule {
    Morning,
    Afternoon,
    Evening,
}

/// Which source collection a display record came from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentOrigin {
    Patient,
    Guest,
}

impl AppointmentOrigin {
    pub fn table(&self) -> &'static str {
        match self {
            AppointmentOrigin::Patient => "appointments",
            AppointmentOrigin::Guest => "guest_appointments",
        }
    }

    pub fn id_column(&self) -> &'static str {
        match self {
            AppointmentOrigin::Patient => "appointment_id",
            AppointmentOrigin::Guest => "guest_appointment_id",
        }
    }

    pub fn fallback_name(&self) -> &'static str {
        match self {
            AppointmentOrigin::Patient => "Unknown",
            AppointmentOrigin::Guest => "guest",
        }
    }
}

impl fmt::Display for AppointmentOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppointmentOrigin::Patient => write!(f, "patient"),
            AppointmentOrigin::Guest => write!(f, "guest"),
        }
    }
}

impl FromStr for AppointmentOrigin {
    type Err = AppointmentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "patient" => Ok(AppointmentOrigin::Patient),
            "guest" => Ok(AppointmentOrigin::Guest),
            other => Err(AppointmentError::ValidationError(format!("Unknown appointment origin: {}", other))),
        }
    }
}

// ==============================================================================
// SOURCE RECORDS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatientAppointment {
    pub appointment_id: String,
    pub patient_id: Option<String>,
    pub doctor_id: Option<String>,
    pub slot_id: Option<String>,
    pub category_id: Option<String>,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub email: String,
    pub visit_type: VisitType,
    pub appointment_status: ProcessStatus,
    pub schedule: Schedule,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
    pub message: Option<String>,
    pub appointment_date: Option<String>,
    pub appointment_time: Option<String>,
    pub preferred_date: Option<String>,
    pub preferred_time: Option<String>,
    pub patient_name: Option<String>,
    pub doctor_name: Option<String>,
    pub category_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuestAppointment {
    pub guest_appointment_id: String,
    pub guest_id: Option<String>,
    pub slot_id: Option<String>,
    pub doctor_id: Option<String>,
    pub category_id: Option<String>,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub email: String,
    pub visit_type: VisitType,
    pub appointment_status: ProcessStatus,
    pub schedule: Schedule,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
    pub message: Option<String>,
    pub appointment_date: Option<String>,
    pub appointment_time: Option<String>,
    pub preferred_date: Option<String>,
    pub preferred_time: Option<String>,
    pub guest_name: Option<String>,
    pub doctor_name: Option<String>,
    pub category_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Guest {
    pub guest_id: String,
    pub full_name: Option<String>,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub email: String,
    pub date_of_birth: Option<String>,
    pub gender: Option<String>,
    pub created_at: Option<String>,
}

/// `id, full_name` projection of the patients table used for name resolution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatientName {
    pub id: String,
    pub full_name: Option<String>,
}

// ==============================================================================
// DISPLAY MODEL
// ==============================================================================

/// Derived row merging both appointment collections. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayAppointment {
    pub id: String,
    #[serde(rename = "type")]
    pub origin: AppointmentOrigin,
    pub name: String,
    pub phone: String,
    pub email: String,
    pub visit_type: VisitType,
    pub appointment_status: ProcessStatus,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
    pub schedule: Schedule,
    pub appointment_date: Option<String>,
    pub appointment_time: Option<String>,
    pub doctor_name: Option<String>,
    pub category_name: Option<String>,
}

// ==============================================================================
// REQUESTS AND RESPONSES
// ==============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppointmentListQuery {
    pub search: Option<String>,
    pub visit_type: Option<String>,
    pub status: Option<String>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub page: Option<usize>,
    pub page_size: Option<usize>,
}

/// Creation-date window applied to both remote collections.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CreatedRange {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAppointmentRequest {
    pub patient_id: Option<String>,
    pub doctor_id: String,
    pub category_id: Option<String>,
    pub phone: String,
    pub email: String,
    pub visit_type: VisitType,
    pub schedule: Schedule,
    pub message: Option<String>,
    pub appointment_date: Option<String>,
    pub appointment_time: Option<String>,
    pub preferred_date: Option<String>,
    pub preferred_time: Option<String>,
    /// Staff-entered bookings skip the approval queue.
    #[serde(default)]
    pub confirmed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateStatusRequest {
    pub appointment_status: ProcessStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusChange {
    pub id: String,
    pub origin: AppointmentOrigin,
    pub previous_status: ProcessStatus,
    pub appointment_status: ProcessStatus,
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppointmentStats {
    pub total_appointments: usize,
    pub pending_approvals: usize,
    pub today_appointments: usize,
    pub confirmed_today: usize,
}

// ==============================================================================
// ERRORS
// ==============================================================================

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AppointmentError {
    #[error("Appointment not found")]
    NotFound,

    #[error("Appointment cannot move from {from} to {to}")]
    InvalidStatusTransition { from: ProcessStatus, to: ProcessStatus },

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}
