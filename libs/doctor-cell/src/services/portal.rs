// libs/doctor-cell/src/services/portal.rs
use std::collections::HashSet;

use chrono::{NaiveDate, Utc};
use reqwest::{header::{HeaderMap, HeaderValue}, Method};
use serde::de::DeserializeOwned;
use serde_json::{json, Map, Value};
use tracing::{debug, error, info};

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use crate::models::{
    patient_name, CreatePatientReportRequest, DoctorDashboard, DoctorError, DoctorPatient,
    DoctorServiceRow, MedicalService, Notification, NotificationRow, PatientIdRow, PatientReport,
    Receipt, ReceiptStatus, RecentAppointment, UpdatePatientReportRequest, RECENT_APPOINTMENT_LIMIT,
};
use crate::services::filter::DoctorPatientFilter;

fn return_representation() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert("Prefer", HeaderValue::from_static("return=representation"));
    headers
}

fn db_error(e: anyhow::Error) -> DoctorError {
    error!("Doctor portal query failed: {}", e);
    DoctorError::DatabaseError(e.to_string())
}

fn enc(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}

/// Distinct non-null patient ids, in first-seen order.
pub fn distinct_patient_ids(rows: Vec<PatientIdRow>) -> Vec<String> {
    let mut seen = HashSet::new();
    rows.into_iter()
        .filter_map(|row| row.patient_id)
        .filter(|id| seen.insert(id.clone()))
        .collect()
}

fn in_list(ids: &[String]) -> String {
    let encoded: Vec<String> = ids.iter().map(|id| enc(id)).collect();
    format!("in.({})", encoded.join(","))
}

pub fn validate_new_report(request: &CreatePatientReportRequest) -> Result<(), DoctorError> {
    if request.patient_id.trim().is_empty() {
        return Err(DoctorError::ValidationError("A patient must be selected".to_string()));
    }
    if request.report_content.trim().is_empty() {
        return Err(DoctorError::ValidationError("Report content is required".to_string()));
    }
    Ok(())
}

pub struct DoctorPortalService {
    supabase: SupabaseClient,
}

impl DoctorPortalService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    async fn rows<T>(&self, path: &str, auth_token: &str) -> Result<Vec<T>, DoctorError>
    where
        T: DeserializeOwned,
    {
        self.supabase
            .request::<Vec<T>>(Method::GET, path, Some(auth_token), None)
            .await
            .map_err(db_error)
    }

    async fn write<T>(&self, method: Method, path: &str, body: Option<Value>, auth_token: &str) -> Result<Vec<T>, DoctorError>
    where
        T: DeserializeOwned,
    {
        self.supabase
            .request_with_headers::<Vec<T>>(method, path, Some(auth_token), body, Some(return_representation()))
            .await
            .map_err(db_error)
    }

    async fn count(&self, path: &str, auth_token: &str) -> Result<u64, DoctorError> {
        self.supabase.count(path, Some(auth_token)).await.map_err(db_error)
    }

    /// Patients that have at least one appointment with this doctor.
    pub async fn patient_ids(&self, doctor_id: &str, auth_token: &str) -> Result<Vec<String>, DoctorError> {
        let path = format!(
            "/rest/v1/appointments?select=patient_id&doctor_id=eq.{}&patient_id=not.is.null",
            enc(doctor_id)
        );
        let rows: Vec<PatientIdRow> = self.rows(&path, auth_token).await?;
        Ok(distinct_patient_ids(rows))
    }

    pub async fn dashboard(&self, doctor_id: &str, today: NaiveDate, auth_token: &str) -> Result<DoctorDashboard, DoctorError> {
        let doctor = enc(doctor_id);
        let today_path = format!(
            "/rest/v1/appointments?doctor_id=eq.{}&appointment_date=eq.{}",
            doctor,
            today.format("%Y-%m-%d")
        );
        let pending_path = format!(
            "/rest/v1/appointments?doctor_id=eq.{}&appointment_status=eq.pending",
            doctor
        );
        let recent_path = format!(
            "/rest/v1/appointments?select=appointment_id,appointment_date,appointment_time,appointment_status,visit_type,patient:patients(full_name)&doctor_id=eq.{}&order=created_at.desc&limit={}",
            doctor, RECENT_APPOINTMENT_LIMIT
        );

        let (today_appointments, pending_appointments, patients, recent) = futures::try_join!(
            self.count(&today_path, auth_token),
            self.count(&pending_path, auth_token),
            self.patient_ids(doctor_id, auth_token),
            self.rows::<RecentAppointment>(&recent_path, auth_token),
        )?;

        let recent_appointments = recent
            .into_iter()
            .map(|mut appt| {
                appt.patient_name = patient_name(appt.patient.as_ref());
                appt
            })
            .collect();

        Ok(DoctorDashboard {
            today_appointments,
            pending_appointments,
            total_patients: patients.len(),
            recent_appointments,
        })
    }

    pub async fn patients(
        &self,
        doctor_id: &str,
        filter: &DoctorPatientFilter,
        auth_token: &str,
    ) -> Result<Vec<DoctorPatient>, DoctorError> {
        let path = format!(
            "/rest/v1/patients?select=*,appointments!inner(doctor_id)&appointments.doctor_id=eq.{}&order=full_name.asc",
            enc(doctor_id)
        );
        let rows: Vec<DoctorPatient> = self.rows(&path, auth_token).await?;

        let mut seen = HashSet::new();
        let unique: Vec<DoctorPatient> = rows.into_iter().filter(|p| seen.insert(p.id.clone())).collect();
        debug!("Doctor {} has {} patients before filtering", doctor_id, unique.len());

        Ok(filter.apply(unique))
    }

    pub async fn reports(
        &self,
        doctor_id: &str,
        patient_id: Option<&str>,
        auth_token: &str,
    ) -> Result<Vec<PatientReport>, DoctorError> {
        let mut path = format!(
            "/rest/v1/patient_reports?select=*,patient:patients(full_name)&staff_id=eq.{}&order=created_at.desc",
            enc(doctor_id)
        );
        if let Some(patient_id) = patient_id.map(str::trim).filter(|p| !p.is_empty()) {
            path.push_str(&format!("&patient_id=eq.{}", enc(patient_id)));
        }

        let reports: Vec<PatientReport> = self.rows(&path, auth_token).await?;
        Ok(reports
            .into_iter()
            .map(|mut report| {
                report.patient_name = Some(patient_name(report.patient.as_ref()));
                report
            })
            .collect())
    }

    pub async fn create_report(
        &self,
        doctor_id: &str,
        request: CreatePatientReportRequest,
        auth_token: &str,
    ) -> Result<PatientReport, DoctorError> {
        validate_new_report(&request)?;

        let body = json!({
            "staff_id": doctor_id,
            "patient_id": request.patient_id.trim(),
            "report_content": request.report_content.trim(),
            "report_description": request.report_description,
            "report_status": request.report_status,
        });

        let created: Vec<PatientReport> = self
            .write(Method::POST, "/rest/v1/patient_reports", Some(body), auth_token)
            .await?;

        let report = created
            .into_iter()
            .next()
            .ok_or_else(|| DoctorError::DatabaseError("Report insert returned no rows".to_string()))?;
        info!("Doctor {} filed report {} for patient {}", doctor_id, report.report_id, report.patient_id);
        Ok(report)
    }

    pub async fn update_report(
        &self,
        doctor_id: &str,
        report_id: &str,
        request: UpdatePatientReportRequest,
        auth_token: &str,
    ) -> Result<PatientReport, DoctorError> {
        if request.report_content.as_deref().is_some_and(|c| c.trim().is_empty()) {
            return Err(DoctorError::ValidationError("Report content cannot be empty".to_string()));
        }

        let mut fields = match serde_json::to_value(&request) {
            Ok(Value::Object(map)) => map,
            Ok(_) => Map::new(),
            Err(e) => return Err(DoctorError::ValidationError(e.to_string())),
        };
        if fields.is_empty() {
            return Err(DoctorError::ValidationError("No fields to update".to_string()));
        }
        fields.insert("updated_at".to_string(), json!(Utc::now().to_rfc3339()));

        // Scoped to the author so one doctor cannot edit another's reports
        let path = format!(
            "/rest/v1/patient_reports?report_id=eq.{}&staff_id=eq.{}",
            enc(report_id),
            enc(doctor_id)
        );
        let updated: Vec<PatientReport> = self
            .write(Method::PATCH, &path, Some(Value::Object(fields)), auth_token)
            .await?;

        updated.into_iter().next().ok_or(DoctorError::NotFound("Report"))
    }

    /// Receipts of every patient this doctor has seen, newest first.
    pub async fn receipts(&self, doctor_id: &str, auth_token: &str) -> Result<Vec<Receipt>, DoctorError> {
        let ids = self.patient_ids(doctor_id, auth_token).await?;
        if ids.is_empty() {
            debug!("Doctor {} has no patients, skipping receipt lookup", doctor_id);
            return Ok(Vec::new());
        }

        let path = format!(
            "/rest/v1/receipts?select=*,patient:patients(full_name)&patient_id={}&order=created_at.desc",
            in_list(&ids)
        );
        let receipts: Vec<Receipt> = self.rows(&path, auth_token).await?;

        Ok(receipts
            .into_iter()
            .map(|mut receipt| {
                receipt.patient_name = Some(patient_name(receipt.patient.as_ref()));
                receipt
            })
            .collect())
    }

    pub async fn update_receipt_status(
        &self,
        doctor_id: &str,
        receipt_id: &str,
        status: ReceiptStatus,
        auth_token: &str,
    ) -> Result<Receipt, DoctorError> {
        let ids = self.patient_ids(doctor_id, auth_token).await?;
        if ids.is_empty() {
            return Err(DoctorError::NotFound("Receipt"));
        }

        let path = format!(
            "/rest/v1/receipts?receipt_id=eq.{}&patient_id={}",
            enc(receipt_id),
            in_list(&ids)
        );
        let updated: Vec<Receipt> = self
            .write(Method::PATCH, &path, Some(json!({ "status": status })), auth_token)
            .await?;

        let receipt = updated.into_iter().next().ok_or(DoctorError::NotFound("Receipt"))?;
        info!("Receipt {} marked {} by doctor {}", receipt_id, status, doctor_id);
        Ok(receipt)
    }

    pub async fn notifications(&self, doctor_id: &str, auth_token: &str) -> Result<Vec<Notification>, DoctorError> {
        let path = format!(
            "/rest/v1/notifications?select=*,appointment:appointments(appointment_date,patient:patients(full_name))&staff_id=eq.{}&order=sent_at.desc",
            enc(doctor_id)
        );
        let rows: Vec<NotificationRow> = self.rows(&path, auth_token).await?;
        Ok(rows.into_iter().map(Notification::from).collect())
    }

    pub async fn services(&self, doctor_id: &str, auth_token: &str) -> Result<Vec<MedicalService>, DoctorError> {
        let path = format!(
            "/rest/v1/doctor_services?select=*,service:medical_services(service_id,service_name,service_description,service_cost,duration_minutes,category:service_categories(category_name))&doctor_id=eq.{}",
            enc(doctor_id)
        );
        let rows: Vec<DoctorServiceRow> = self.rows(&path, auth_token).await?;
        Ok(rows
            .into_iter()
            .filter_map(|row| row.service)
            .map(MedicalService::from)
            .collect())
    }

    pub async fn add_service(&self, doctor_id: &str, service_id: &str, auth_token: &str) -> Result<(), DoctorError> {
        if service_id.trim().is_empty() {
            return Err(DoctorError::ValidationError("A service must be selected".to_string()));
        }

        let body = json!({ "doctor_id": doctor_id, "service_id": service_id.trim() });
        let _: Vec<Value> = self
            .write(Method::POST, "/rest/v1/doctor_services", Some(body), auth_token)
            .await?;

        info!("Service {} assigned to doctor {}", service_id, doctor_id);
        Ok(())
    }

    pub async fn remove_service(&self, doctor_id: &str, service_id: &str, auth_token: &str) -> Result<(), DoctorError> {
        let path = format!(
            "/rest/v1/doctor_services?doctor_id=eq.{}&service_id=eq.{}",
            enc(doctor_id),
            enc(service_id)
        );
        let removed: Vec<Value> = self.write(Method::DELETE, &path, None, auth_token).await?;
        if removed.is_empty() {
            return Err(DoctorError::NotFound("Service assignment"));
        }

        info!("Service {} removed from doctor {}", service_id, doctor_id);
        Ok(())
    }
}
