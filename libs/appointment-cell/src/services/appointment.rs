// libs/appointment-cell/src/services/appointment.rs
use chrono::{NaiveDate, Utc};
use reqwest::{header::{HeaderMap, HeaderValue}, Method};
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::{json, Value};
use tracing::{debug, error, info};

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;
use shared_models::pagination::Page;

use crate::models::{
    AppointmentError, AppointmentOrigin, AppointmentStats, CreateAppointmentRequest, CreatedRange,
    DisplayAppointment, Guest, GuestAppointment, PatientAppointment, PatientName, ProcessStatus,
    StatusChange,
};
use crate::services::filter::{AppointmentFilter, AppointmentView};
use crate::services::lifecycle::AppointmentLifecycleService;
use crate::services::stats::compute_stats;
use crate::services::unifier::{unify, AppointmentSources};

#[derive(Debug, Deserialize)]
struct CurrentStatus {
    appointment_status: ProcessStatus,
}

fn day_start(date: NaiveDate) -> String {
    urlencoding::encode(&format!("{}T00:00:00+00:00", date.format("%Y-%m-%d"))).into_owned()
}

fn day_end(date: NaiveDate) -> String {
    urlencoding::encode(&format!("{}T23:59:59+00:00", date.format("%Y-%m-%d"))).into_owned()
}

fn range_filters(range: &CreatedRange) -> String {
    let mut parts = String::new();
    if let Some(from) = range.from {
        parts.push_str(&format!("&created_at=gte.{}", day_start(from)));
    }
    if let Some(to) = range.to {
        parts.push_str(&format!("&created_at=lte.{}", day_end(to)));
    }
    parts
}

fn return_representation() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert("Prefer", HeaderValue::from_static("return=representation"));
    headers
}

pub struct AppointmentService {
    supabase: SupabaseClient,
    lifecycle: AppointmentLifecycleService,
    default_page_size: usize,
}

impl AppointmentService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
            lifecycle: AppointmentLifecycleService::new(),
            default_page_size: config.default_page_size,
        }
    }

    async fn fetch_rows<T>(&self, path: &str, auth_token: &str) -> Result<Vec<T>, AppointmentError>
    where
        T: DeserializeOwned,
    {
        self.supabase
            .request::<Vec<T>>(Method::GET, path, Some(auth_token), None)
            .await
            .map_err(|e| {
                error!("Failed to fetch {}: {}", path, e);
                AppointmentError::DatabaseError(e.to_string())
            })
    }

    /// Loads both appointment collections and the name directories concurrently.
    pub async fn fetch_sources(
        &self,
        range: &CreatedRange,
        auth_token: &str,
    ) -> Result<AppointmentSources, AppointmentError> {
        let filters = range_filters(range);
        debug!("Fetching appointment sources with range {:?}", range);

        let patient_path = format!("/rest/v1/appointments?select=*&order=created_at.desc{}", filters);
        let guest_path = format!("/rest/v1/guest_appointments?select=*&order=created_at.desc{}", filters);

        let (patient_appointments, guest_appointments, patients, guests) = futures::try_join!(
            self.fetch_rows::<PatientAppointment>(&patient_path, auth_token),
            self.fetch_rows::<GuestAppointment>(&guest_path, auth_token),
            self.fetch_rows::<PatientName>("/rest/v1/patients?select=id,full_name", auth_token),
            self.fetch_rows::<Guest>(
                "/rest/v1/guests?select=guest_id,full_name,phone,email,date_of_birth,gender,created_at",
                auth_token,
            ),
        )?;

        Ok(AppointmentSources::new(patient_appointments, guest_appointments, patients, guests))
    }

    pub async fn unified_appointments(
        &self,
        range: &CreatedRange,
        auth_token: &str,
    ) -> Result<Vec<DisplayAppointment>, AppointmentError> {
        let sources = self.fetch_sources(range, auth_token).await?;
        Ok(unify(sources))
    }

    /// Unified listing: fetch, merge, filter, then cut the requested page.
    pub async fn list_unified(
        &self,
        filter: AppointmentFilter,
        range: &CreatedRange,
        page: Option<usize>,
        page_size: Option<usize>,
        auth_token: &str,
    ) -> Result<Page<DisplayAppointment>, AppointmentError> {
        let records = self.unified_appointments(range, auth_token).await?;

        let mut view = AppointmentView::new(records, page_size.unwrap_or(self.default_page_size));
        view.apply_filter(filter);
        if let Some(page) = page {
            view.go_to_page(page);
        }

        debug!(
            "Unified listing matched {} records, serving page {} of {}",
            view.filtered_len(),
            view.current_page(),
            view.total_pages()
        );

        Ok(view.into_page())
    }

    /// Patient appointments created on the given UTC day, oldest first.
    pub async fn list_created_on(
        &self,
        date: NaiveDate,
        auth_token: &str,
    ) -> Result<Vec<PatientAppointment>, AppointmentError> {
        let path = format!(
            "/rest/v1/appointments?select=*&created_at=gte.{}&created_at=lte.{}&order=created_at.asc",
            day_start(date),
            day_end(date)
        );
        self.fetch_rows(&path, auth_token).await
    }

    pub async fn doctor_appointments(
        &self,
        doctor_id: &str,
        auth_token: &str,
    ) -> Result<Vec<PatientAppointment>, AppointmentError> {
        let path = format!(
            "/rest/v1/appointments?select=*&doctor_id=eq.{}&order=created_at.desc",
            urlencoding::encode(doctor_id)
        );
        self.fetch_rows(&path, auth_token).await
    }

    pub async fn stats(
        &self,
        today: NaiveDate,
        auth_token: &str,
    ) -> Result<AppointmentStats, AppointmentError> {
        let records = self.unified_appointments(&CreatedRange::default(), auth_token).await?;
        Ok(compute_stats(&records, today))
    }

    pub async fn create_appointment(
        &self,
        request: CreateAppointmentRequest,
        auth_token: &str,
    ) -> Result<PatientAppointment, AppointmentError> {
        validate_create_request(&request)?;
        debug!("Creating appointment with doctor {}", request.doctor_id);

        let status = if request.confirmed {
            ProcessStatus::Confirmed
        } else {
            ProcessStatus::Pending
        };
        let now = Utc::now().to_rfc3339();

        let body = json!({
            "patient_id": request.patient_id,
            "doctor_id": request.doctor_id,
            "category_id": request.category_id,
            "phone": request.phone.trim(),
            "email": request.email.trim(),
            "visit_type": request.visit_type,
            "schedule": request.schedule,
            "appointment_status": status,
            "message": request.message,
            "appointment_date": request.appointment_date,
            "appointment_time": request.appointment_time,
            "preferred_date": request.preferred_date,
            "preferred_time": request.preferred_time,
            "created_at": now,
            "updated_at": now
        });

        let created: Vec<PatientAppointment> = self
            .supabase
            .request_with_headers(
                Method::POST,
                "/rest/v1/appointments",
                Some(auth_token),
                Some(body),
                Some(return_representation()),
            )
            .await
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        let appointment = created
            .into_iter()
            .next()
            .ok_or_else(|| AppointmentError::DatabaseError("Failed to create appointment".to_string()))?;

        info!("Appointment {} created with status {}", appointment.appointment_id, status);
        Ok(appointment)
    }

    pub async fn update_status(
        &self,
        origin: AppointmentOrigin,
        appointment_id: &str,
        new_status: ProcessStatus,
        auth_token: &str,
    ) -> Result<StatusChange, AppointmentError> {
        let filter = format!("{}=eq.{}", origin.id_column(), urlencoding::encode(appointment_id));
        let lookup_path = format!("/rest/v1/{}?{}&select=appointment_status", origin.table(), filter);

        let current: Vec<CurrentStatus> = self.fetch_rows(&lookup_path, auth_token).await?;
        let previous_status = current
            .first()
            .map(|row| row.appointment_status)
            .ok_or(AppointmentError::NotFound)?;

        self.lifecycle.validate_status_transition(previous_status, new_status)?;

        if previous_status == new_status {
            debug!("Appointment {} already {}, skipping update", appointment_id, new_status);
            return Ok(StatusChange {
                id: appointment_id.to_string(),
                origin,
                previous_status,
                appointment_status: new_status,
                updated_at: None,
            });
        }

        let body = json!({
            "appointment_status": new_status,
            "updated_at": Utc::now().to_rfc3339()
        });
        let update_path = format!("/rest/v1/{}?{}", origin.table(), filter);

        let updated: Vec<Value> = self
            .supabase
            .request_with_headers(
                Method::PATCH,
                &update_path,
                Some(auth_token),
                Some(body),
                Some(return_representation()),
            )
            .await
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        let row = updated.first().ok_or(AppointmentError::NotFound)?;
        let updated_at = row
            .get("updated_at")
            .and_then(Value::as_str)
            .map(str::to_string);

        info!(
            "{} appointment {} moved from {} to {}",
            origin, appointment_id, previous_status, new_status
        );

        Ok(StatusChange {
            id: appointment_id.to_string(),
            origin,
            previous_status,
            appointment_status: new_status,
            updated_at,
        })
    }

    pub async fn approve(
        &self,
        origin: AppointmentOrigin,
        appointment_id: &str,
        auth_token: &str,
    ) -> Result<StatusChange, AppointmentError> {
        self.update_status(origin, appointment_id, ProcessStatus::Confirmed, auth_token).await
    }
}

pub fn validate_create_request(request: &CreateAppointmentRequest) -> Result<(), AppointmentError> {
    if request.doctor_id.trim().is_empty() {
        return Err(AppointmentError::ValidationError("Please select a doctor".to_string()));
    }
    if request.phone.trim().is_empty() {
        return Err(AppointmentError::ValidationError("Phone number is required".to_string()));
    }
    if !request.email.contains('@') {
        return Err(AppointmentError::ValidationError("A valid email is required".to_string()));
    }
    if request.appointment_date.is_some() != request.appointment_time.is_some() {
        return Err(AppointmentError::ValidationError(
            "Appointment date and time must be given together".to_string(),
        ));
    }
    Ok(())
}
