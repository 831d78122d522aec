use chrono::Utc;
use reqwest::{header::{HeaderMap, HeaderValue}, Method};
use serde_json::{json, Map, Value};
use tracing::{debug, error, info, warn};

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;
use shared_models::pagination::{Page, PageRequest};

use crate::models::{
    BulkStatusRequest, CreateStaffRequest, DoctorDetails, DoctorProfile, RoleOption, Staff,
    StaffError, StaffRole, StaffStatus, UpdateDoctorProfileRequest, UpdateStaffRequest,
};
use crate::services::filter::StaffFilter;

fn prefer(value: &'static str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert("Prefer", HeaderValue::from_static(value));
    headers
}

fn db_error(e: anyhow::Error) -> StaffError {
    error!("Staff query failed: {}", e);
    StaffError::DatabaseError(e.to_string())
}

fn staff_filter_path(staff_id: &str) -> String {
    format!("/rest/v1/staff_members?staff_id=eq.{}", urlencoding::encode(staff_id))
}

/// Serialized partial-update body; errors if nothing would change.
fn changed_fields<T: serde::Serialize>(update: &T) -> Result<Map<String, Value>, StaffError> {
    match serde_json::to_value(update) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Ok(Map::new()),
        Err(e) => Err(StaffError::ValidationError(e.to_string())),
    }
}

pub fn role_catalogue() -> Vec<RoleOption> {
    StaffRole::ALL
        .iter()
        .map(|role| RoleOption { value: *role, label: role.label().to_string() })
        .collect()
}

pub fn validate_new_staff(request: &CreateStaffRequest) -> Result<StaffRole, StaffError> {
    if request.full_name.trim().is_empty() {
        return Err(StaffError::ValidationError("Full name is required".to_string()));
    }
    if !request.working_email.contains('@') {
        return Err(StaffError::ValidationError("A valid working email is required".to_string()));
    }
    request
        .role
        .ok_or_else(|| StaffError::ValidationError("Role is required".to_string()))
}

pub fn validate_bulk_status(request: &BulkStatusRequest) -> Result<(), StaffError> {
    if request.staff_ids.is_empty() {
        return Err(StaffError::ValidationError("No staff members selected".to_string()));
    }
    if !matches!(request.staff_status, StaffStatus::Active | StaffStatus::Inactive) {
        return Err(StaffError::ValidationError(
            "Bulk status changes only accept active or inactive".to_string(),
        ));
    }
    Ok(())
}

pub struct StaffService {
    supabase: SupabaseClient,
}

impl StaffService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    pub async fn list_staff(&self, auth_token: &str) -> Result<Vec<Staff>, StaffError> {
        self.supabase
            .request(
                Method::GET,
                "/rest/v1/staff_members?select=*&order=full_name.asc",
                Some(auth_token),
                None,
            )
            .await
            .map_err(db_error)
    }

    pub async fn list_filtered(
        &self,
        filter: &StaffFilter,
        page: PageRequest,
        auth_token: &str,
    ) -> Result<Page<Staff>, StaffError> {
        let staff = self.list_staff(auth_token).await?;
        debug!("Filtering {} staff members with {:?}", staff.len(), filter);
        Ok(filter.paginate(staff, page))
    }

    pub async fn get_staff(&self, staff_id: &str, auth_token: &str) -> Result<Staff, StaffError> {
        let result: Vec<Staff> = self
            .supabase
            .request(Method::GET, &staff_filter_path(staff_id), Some(auth_token), None)
            .await
            .map_err(db_error)?;

        result.into_iter().next().ok_or(StaffError::NotFound)
    }

    pub async fn find_by_email(&self, email: &str, auth_token: &str) -> Result<Option<Staff>, StaffError> {
        let path = format!(
            "/rest/v1/staff_members?working_email=eq.{}",
            urlencoding::encode(email.trim())
        );
        let result: Vec<Staff> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(db_error)?;

        Ok(result.into_iter().next())
    }

    pub async fn add_staff(&self, request: CreateStaffRequest, auth_token: &str) -> Result<Staff, StaffError> {
        let role = validate_new_staff(&request)?;

        if self.find_by_email(&request.working_email, auth_token).await?.is_some() {
            return Err(StaffError::EmailTaken(request.working_email));
        }

        let now = Utc::now().to_rfc3339();
        let body = json!({
            "full_name": request.full_name.trim(),
            "working_email": request.working_email.trim(),
            "role": role,
            "years_experience": request.years_experience,
            "hired_at": request.hired_at,
            "is_available": request.is_available,
            "staff_status": request.staff_status,
            "gender": request.gender,
            "languages": request.languages,
            "image_link": request.image_link,
            "created_at": now,
            "updated_at": now
        });

        let created: Vec<Staff> = self
            .supabase
            .request_with_headers(
                Method::POST,
                "/rest/v1/staff_members",
                Some(auth_token),
                Some(body),
                Some(prefer("return=representation")),
            )
            .await
            .map_err(db_error)?;

        let staff = created
            .into_iter()
            .next()
            .ok_or_else(|| StaffError::DatabaseError("Failed to create staff member".to_string()))?;

        info!("Staff member {} added as {}", staff.staff_id, staff.role);
        Ok(staff)
    }

    pub async fn update_staff(
        &self,
        staff_id: &str,
        request: &UpdateStaffRequest,
        auth_token: &str,
    ) -> Result<Staff, StaffError> {
        let mut fields = changed_fields(request)?;
        if fields.is_empty() {
            return Err(StaffError::ValidationError("No fields to update".to_string()));
        }
        if let Some(name) = fields.get("full_name").and_then(Value::as_str) {
            if name.trim().is_empty() {
                return Err(StaffError::ValidationError("Full name cannot be empty".to_string()));
            }
        }
        if let Some(email) = fields.get("working_email").and_then(Value::as_str) {
            if !email.contains('@') {
                return Err(StaffError::ValidationError("A valid working email is required".to_string()));
            }
        }
        fields.insert("updated_at".to_string(), json!(Utc::now().to_rfc3339()));

        let updated: Vec<Staff> = self
            .supabase
            .request_with_headers(
                Method::PATCH,
                &staff_filter_path(staff_id),
                Some(auth_token),
                Some(Value::Object(fields)),
                Some(prefer("return=representation")),
            )
            .await
            .map_err(db_error)?;

        updated.into_iter().next().ok_or(StaffError::NotFound)
    }

    pub async fn delete_staff(&self, staff_id: &str, auth_token: &str) -> Result<(), StaffError> {
        let deleted: Vec<Staff> = self
            .supabase
            .request_with_headers(
                Method::DELETE,
                &staff_filter_path(staff_id),
                Some(auth_token),
                None,
                Some(prefer("return=representation")),
            )
            .await
            .map_err(db_error)?;

        if deleted.is_empty() {
            return Err(StaffError::NotFound);
        }

        info!("Staff member {} deleted", staff_id);
        Ok(())
    }

    /// Sets one status on every listed member; returns how many rows changed.
    pub async fn bulk_update_status(
        &self,
        request: &BulkStatusRequest,
        auth_token: &str,
    ) -> Result<usize, StaffError> {
        validate_bulk_status(request)?;

        let ids: Vec<String> = request
            .staff_ids
            .iter()
            .map(|id| urlencoding::encode(id).into_owned())
            .collect();
        let path = format!("/rest/v1/staff_members?staff_id=in.({})", ids.join(","));

        let body = json!({
            "staff_status": request.staff_status,
            "updated_at": Utc::now().to_rfc3339()
        });

        let updated: Vec<Staff> = self
            .supabase
            .request_with_headers(
                Method::PATCH,
                &path,
                Some(auth_token),
                Some(body),
                Some(prefer("return=representation")),
            )
            .await
            .map_err(db_error)?;

        if updated.len() != request.staff_ids.len() {
            warn!(
                "Bulk status change matched {} of {} staff members",
                updated.len(),
                request.staff_ids.len()
            );
        }
        Ok(updated.len())
    }

    pub async fn doctor_profile(&self, doctor_id: &str, auth_token: &str) -> Result<DoctorProfile, StaffError> {
        let path = format!(
            "/rest/v1/staff_members?select=*,doctor_details(*)&staff_id=eq.{}&role=eq.doctor",
            urlencoding::encode(doctor_id)
        );
        let result: Vec<DoctorProfile> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(db_error)?;

        result.into_iter().next().ok_or(StaffError::NotFound)
    }

    /// Writes the staff half in place and upserts the `doctor_details` half.
    pub async fn update_doctor_profile(
        &self,
        doctor_id: &str,
        request: UpdateDoctorProfileRequest,
        auth_token: &str,
    ) -> Result<DoctorProfile, StaffError> {
        let staff_fields = changed_fields(&request.staff)?;
        let mut detail_fields = changed_fields(&request.doctor_details)?;

        if staff_fields.is_empty() && detail_fields.is_empty() {
            return Err(StaffError::ValidationError("No fields to update".to_string()));
        }

        if !staff_fields.is_empty() {
            self.update_staff(doctor_id, &request.staff, auth_token).await?;
        }

        if !detail_fields.is_empty() {
            detail_fields.insert("doctor_id".to_string(), json!(doctor_id));

            let upserted: Vec<DoctorDetails> = self
                .supabase
                .request_with_headers(
                    Method::POST,
                    "/rest/v1/doctor_details?on_conflict=doctor_id",
                    Some(auth_token),
                    Some(Value::Object(detail_fields)),
                    Some(prefer("resolution=merge-duplicates,return=representation")),
                )
                .await
                .map_err(db_error)?;
            debug!("Upserted {} doctor_details rows for {}", upserted.len(), doctor_id);
        }

        self.doctor_profile(doctor_id, auth_token).await
    }
}
