use chrono::Utc;
use reqwest::{header::{HeaderMap, HeaderValue}, Method};
use serde_json::{json, Value};
use tracing::{debug, error, info};

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;
use shared_models::pagination::{Page, PageRequest};

use crate::models::{
    CreatePatientRequest, Patient, PatientError, PatientStatus, PatientSummary,
    UpdatePatientRequest, VaccinationStatus,
};

fn return_representation() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert("Prefer", HeaderValue::from_static("return=representation"));
    headers
}

fn db_error(e: anyhow::Error) -> PatientError {
    error!("Patient query failed: {}", e);
    PatientError::DatabaseError(e.to_string())
}

/// PostgREST `or=(...)` filter matching the term against name, phone and email.
pub fn search_filter(term: &str) -> String {
    // Commas and parentheses would split the or-group
    let cleaned: String = term
        .trim()
        .chars()
        .filter(|c| !matches!(c, ',' | '(' | ')'))
        .collect();
    let pattern = format!("*{}*", urlencoding::encode(&cleaned));

    format!(
        "or=(full_name.ilike.{p},phone.ilike.{p},email.ilike.{p})",
        p = pattern
    )
}

fn page_window(page: PageRequest) -> String {
    format!("limit={}&offset={}", page.page_size, page.offset())
}

pub struct PatientService {
    supabase: SupabaseClient,
}

impl PatientService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    async fn fetch_page(
        &self,
        path: &str,
        page: PageRequest,
        auth_token: &str,
    ) -> Result<Page<Patient>, PatientError> {
        let (patients, total) = self
            .supabase
            .request_with_count::<Patient>(path, Some(auth_token))
            .await
            .map_err(db_error)?;

        debug!("Fetched {} patients of {} total", patients.len(), total);
        Ok(Page::from_remote(patients, page, total as usize))
    }

    pub async fn list_patients(
        &self,
        page: PageRequest,
        auth_token: &str,
    ) -> Result<Page<Patient>, PatientError> {
        let path = format!(
            "/rest/v1/patients?select=*&order=created_at.desc&{}",
            page_window(page)
        );
        self.fetch_page(&path, page, auth_token).await
    }

    /// Blank terms fall back to the plain listing.
    pub async fn search_patients(
        &self,
        term: &str,
        page: PageRequest,
        auth_token: &str,
    ) -> Result<Page<Patient>, PatientError> {
        if term.trim().is_empty() {
            return self.list_patients(page, auth_token).await;
        }

        debug!("Searching patients for '{}'", term.trim());
        let path = format!(
            "/rest/v1/patients?select=*&{}&order=full_name.asc&{}",
            search_filter(term),
            page_window(page)
        );
        self.fetch_page(&path, page, auth_token).await
    }

    pub async fn patient_directory(&self, auth_token: &str) -> Result<Vec<PatientSummary>, PatientError> {
        self.supabase
            .request(
                Method::GET,
                "/rest/v1/patients?select=id,full_name&order=full_name.asc",
                Some(auth_token),
                None,
            )
            .await
            .map_err(db_error)
    }

    pub async fn get_patient(&self, patient_id: &str, auth_token: &str) -> Result<Patient, PatientError> {
        debug!("Fetching patient profile: {}", patient_id);

        let path = format!("/rest/v1/patients?id=eq.{}", urlencoding::encode(patient_id));
        let result: Vec<Patient> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(db_error)?;

        result.into_iter().next().ok_or(PatientError::NotFound)
    }

    pub async fn create_patient(
        &self,
        request: CreatePatientRequest,
        auth_token: &str,
    ) -> Result<Patient, PatientError> {
        validate_create_request(&request)?;
        debug!("Creating patient profile for {}", request.id);

        let now = Utc::now().to_rfc3339();
        let patient_data = json!({
            "id": request.id,
            "full_name": request.full_name.trim(),
            "phone": request.phone,
            "email": request.email,
            "date_of_birth": request.date_of_birth,
            "gender": request.gender,
            "allergies": request.allergies,
            "chronic_conditions": request.chronic_conditions,
            "past_surgeries": request.past_surgeries,
            "vaccination_status": request.vaccination_status.unwrap_or(VaccinationStatus::NotVaccinated),
            "patient_status": PatientStatus::Active,
            "created_at": now,
            "updated_at": now
        });

        let result: Vec<Patient> = self
            .supabase
            .request_with_headers(
                Method::POST,
                "/rest/v1/patients",
                Some(auth_token),
                Some(patient_data),
                Some(return_representation()),
            )
            .await
            .map_err(db_error)?;

        let patient = result
            .into_iter()
            .next()
            .ok_or_else(|| PatientError::DatabaseError("Failed to create patient profile".to_string()))?;

        info!("Patient profile {} created", patient.id);
        Ok(patient)
    }

    /// Partial update: only fields present in the request are written.
    pub async fn update_patient(
        &self,
        patient_id: &str,
        request: UpdatePatientRequest,
        auth_token: &str,
    ) -> Result<Patient, PatientError> {
        let mut update_data = match serde_json::to_value(&request) {
            Ok(Value::Object(map)) => map,
            Ok(_) => serde_json::Map::new(),
            Err(e) => return Err(PatientError::ValidationError(e.to_string())),
        };

        if update_data.is_empty() {
            return Err(PatientError::ValidationError("No fields to update".to_string()));
        }
        if let Some(name) = update_data.get("full_name").and_then(Value::as_str) {
            if name.trim().is_empty() {
                return Err(PatientError::ValidationError("Full name cannot be empty".to_string()));
            }
        }

        debug!("Updating patient {} fields {:?}", patient_id, update_data.keys().collect::<Vec<_>>());
        update_data.insert("updated_at".to_string(), json!(Utc::now().to_rfc3339()));

        let path = format!("/rest/v1/patients?id=eq.{}", urlencoding::encode(patient_id));
        let result: Vec<Patient> = self
            .supabase
            .request_with_headers(
                Method::PATCH,
                &path,
                Some(auth_token),
                Some(Value::Object(update_data)),
                Some(return_representation()),
            )
            .await
            .map_err(db_error)?;

        result.into_iter().next().ok_or(PatientError::NotFound)
    }
}

pub fn validate_create_request(request: &CreatePatientRequest) -> Result<(), PatientError> {
    if request.id.trim().is_empty() {
        return Err(PatientError::ValidationError("Patient id is required".to_string()));
    }
    if request.full_name.trim().is_empty() {
        return Err(PatientError::ValidationError("Full name is required".to_string()));
    }
    if let Some(email) = &request.email {
        if !email.trim().is_empty() && !email.contains('@') {
            return Err(PatientError::ValidationError("A valid email is required".to_string()));
        }
    }
    Ok(())
}
