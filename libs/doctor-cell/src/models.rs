// libs/doctor-cell/src/models.rs
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub const UNKNOWN_PATIENT: &str = "Unknown Patient";
pub const RECENT_APPOINTMENT_LIMIT: usize = 5;

// ==============================================================================
// ENUMS
// ==============================================================================

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    #[default]
    Pending,
    Reviewed,
    Completed,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ReceiptStatus {
    Pending,
    Paid,
    Cancelled,
}

impl ReceiptStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReceiptStatus::Pending => "pending",
            ReceiptStatus::Paid => "paid",
            ReceiptStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for ReceiptStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ==============================================================================
// EMBEDDED REFERENCES
// ==============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PatientNameRef {
    pub full_name: Option<String>,
}

/// `patient:patients(full_name)` embed, falling back to a placeholder name.
pub fn patient_name(patient: Option<&PatientNameRef>) -> String {
    patient
        .and_then(|p| p.full_name.as_deref())
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .unwrap_or(UNKNOWN_PATIENT)
        .to_string()
}

// ==============================================================================
// DASHBOARD
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecentAppointment {
    pub appointment_id: String,
    pub appointment_date: Option<String>,
    pub appointment_time: Option<String>,
    pub appointment_status: Option<String>,
    pub visit_type: Option<String>,
    #[serde(default, skip_serializing)]
    pub patient: Option<PatientNameRef>,
    #[serde(default)]
    pub patient_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DoctorDashboard {
    pub today_appointments: u64,
    pub pending_appointments: u64,
    pub total_patients: usize,
    pub recent_appointments: Vec<RecentAppointment>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PatientIdRow {
    pub patient_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DashboardQuery {
    pub date: Option<NaiveDate>,
}

// ==============================================================================
// PATIENTS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DoctorPatient {
    pub id: String,
    pub full_name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub gender: Option<String>,
    pub date_of_birth: Option<String>,
    pub patient_status: Option<String>,
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DoctorPatientQuery {
    pub search: Option<String>,
    pub gender: Option<String>,
    pub status: Option<String>,
}

// ==============================================================================
// PATIENT REPORTS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PatientReport {
    pub report_id: String,
    pub patient_id: String,
    pub staff_id: Option<String>,
    pub report_content: String,
    pub report_description: Option<String>,
    #[serde(default)]
    pub report_status: ReportStatus,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
    #[serde(default, skip_serializing)]
    pub patient: Option<PatientNameRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patient_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePatientReportRequest {
    pub patient_id: String,
    pub report_content: String,
    pub report_description: Option<String>,
    #[serde(default)]
    pub report_status: ReportStatus,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdatePatientReportRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report_content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report_status: Option<ReportStatus>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReportListQuery {
    pub patient_id: Option<String>,
}

// ==============================================================================
// RECEIPTS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Receipt {
    pub receipt_id: String,
    pub patient_id: Option<String>,
    pub amount: Option<f64>,
    pub status: Option<String>,
    pub created_at: Option<String>,
    #[serde(default, skip_serializing)]
    pub patient: Option<PatientNameRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patient_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateReceiptStatusRequest {
    pub status: ReceiptStatus,
}

// ==============================================================================
// NOTIFICATIONS
// ==============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NotificationAppointment {
    pub appointment_date: Option<String>,
    pub patient: Option<PatientNameRef>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NotificationRow {
    pub notification_id: String,
    pub staff_id: Option<String>,
    #[serde(default)]
    pub notification_type: String,
    pub sent_at: Option<String>,
    #[serde(default)]
    pub is_read: bool,
    pub appointment: Option<NotificationAppointment>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Notification {
    pub notification_id: String,
    pub notification_type: String,
    pub sent_at: Option<String>,
    pub is_read: bool,
    pub title: String,
    pub message: String,
}

// ==============================================================================
// SERVICES OFFERED
// ==============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct CategoryRef {
    pub category_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MedicalServiceRow {
    pub service_id: String,
    pub service_name: String,
    pub service_description: Option<String>,
    pub service_cost: Option<f64>,
    pub duration_minutes: Option<i32>,
    pub category: Option<CategoryRef>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DoctorServiceRow {
    pub service: Option<MedicalServiceRow>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MedicalService {
    pub service_id: String,
    pub service_name: String,
    pub service_description: Option<String>,
    pub service_cost: Option<f64>,
    pub duration_minutes: Option<i32>,
    pub category_name: String,
}

impl From<MedicalServiceRow> for MedicalService {
    fn from(row: MedicalServiceRow) -> Self {
        let category_name = row
            .category
            .and_then(|c| c.category_name)
            .unwrap_or_else(|| "General".to_string());

        Self {
            service_id: row.service_id,
            service_name: row.service_name,
            service_description: row.service_description,
            service_cost: row.service_cost,
            duration_minutes: row.duration_minutes,
            category_name,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignServiceRequest {
    pub service_id: String,
}

// ==============================================================================
// ERRORS
// ==============================================================================

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DoctorError {
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}
