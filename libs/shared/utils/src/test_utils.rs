use std::sync::Arc;
use chrono::{Duration, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use base64::{Engine as _, engine::general_purpose};
use serde_json::json;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::auth::User;

pub struct TestConfig {
    pub jwt_secret: String,
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub page_size: usize,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "test-secret-key-for-jwt-validation-must-be-long-enough".to_string(),
            supabase_url: "http://localhost:54321".to_string(),
            supabase_anon_key: "test-anon-key".to_string(),
            page_size: 10,
        }
    }
}

impl TestConfig {
    pub fn with_supabase_url(url: &str) -> Self {
        Self {
            supabase_url: url.to_string(),
            ..Self::default()
        }
    }

    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            supabase_url: self.supabase_url.clone(),
            supabase_anon_key: self.supabase_anon_key.clone(),
            supabase_jwt_secret: self.jwt_secret.clone(),
            default_page_size: self.page_size,
            port: 3000,
        }
    }

    pub fn to_arc(&self) -> Arc<AppConfig> {
        Arc::new(self.to_app_config())
    }
}

pub struct TestUser {
    pub id: String,
    pub email: String,
    pub role: String,
}

impl Default for TestUser {
    fn default() -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            email: "test@example.com".to_string(),
            role: "receptionist".to_string(),
        }
    }
}

impl TestUser {
    pub fn new(email: &str, role: &str) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            email: email.to_string(),
            role: role.to_string(),
        }
    }

    pub fn doctor(email: &str) -> Self {
        Self::new(email, "doctor")
    }

    pub fn receptionist(email: &str) -> Self {
        Self::new(email, "receptionist")
    }

    pub fn admin(email: &str) -> Self {
        Self::new(email, "admin")
    }

    pub fn to_user(&self) -> User {
        User {
            id: self.id.clone(),
            email: Some(self.email.clone()),
            role: Some("authenticated".to_string()),
            metadata: Some(json!({ "role": self.role })),
            created_at: Some(Utc::now()),
        }
    }
}

pub struct JwtTestUtils;

impl JwtTestUtils {
    pub fn create_test_token(user: &TestUser, secret: &str, exp_hours: Option<i64>) -> String {
        let now = Utc::now();
        let exp = now + Duration::hours(exp_hours.unwrap_or(24));

        let header = json!({
            "alg": "HS256",
            "typ": "JWT"
        });

        let payload = json!({
            "sub": user.id,
            "email": user.email,
            "role": "authenticated",
            "user_metadata": { "role": user.role },
            "iat": now.timestamp(),
            "exp": exp.timestamp()
        });

        let header_encoded = general_purpose::URL_SAFE_NO_PAD.encode(header.to_string());
        let payload_encoded = general_purpose::URL_SAFE_NO_PAD.encode(payload.to_string());

        let signing_input = format!("{}.{}", header_encoded, payload_encoded);

        let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
            .expect("HMAC can take key of any size");
        mac.update(signing_input.as_bytes());
        let signature = mac.finalize().into_bytes();
        let signature_encoded = general_purpose::URL_SAFE_NO_PAD.encode(signature);

        format!("{}.{}", signing_input, signature_encoded)
    }

    pub fn create_expired_token(user: &TestUser, secret: &str) -> String {
        Self::create_test_token(user, secret, Some(-1))
    }

    pub fn create_invalid_signature_token(user: &TestUser) -> String {
        Self::create_test_token(user, "wrong-secret", Some(24))
    }

    pub fn create_malformed_token() -> String {
        "invalid.token.format".to_string()
    }
}

/// Row shapes as the clinic's Supabase tables return them.
pub struct MockSupabaseResponses;

impl MockSupabaseResponses {
    pub fn patient_appointment_row(
        appointment_id: &str,
        patient_id: Option<&str>,
        status: &str,
        visit_type: &str,
        created_at: &str,
    ) -> serde_json::Value {
        json!({
            "appointment_id": appointment_id,
            "patient_id": patient_id,
            "doctor_id": null,
            "slot_id": null,
            "category_id": null,
            "phone": "0901234567",
            "email": "patient@example.com",
            "visit_type": visit_type,
            "appointment_status": status,
            "schedule": "morning",
            "appointment_date": "2024-06-01",
            "appointment_time": "09:00",
            "created_at": created_at,
            "updated_at": created_at
        })
    }

    pub fn guest_appointment_row(
        guest_appointment_id: &str,
        guest_id: Option<&str>,
        status: &str,
        visit_type: &str,
        created_at: &str,
    ) -> serde_json::Value {
        json!({
            "guest_appointment_id": guest_appointment_id,
            "guest_id": guest_id,
            "doctor_id": null,
            "slot_id": null,
            "category_id": null,
            "phone": "0907654321",
            "email": "guest@example.com",
            "visit_type": visit_type,
            "appointment_status": status,
            "schedule": "afternoon",
            "created_at": created_at,
            "updated_at": created_at
        })
    }

    pub fn patient_row(id: &str, full_name: &str) -> serde_json::Value {
        json!({
            "id": id,
            "full_name": full_name,
            "phone": "0901234567",
            "email": "patient@example.com",
            "date_of_birth": "1990-05-20",
            "gender": "female",
            "allergies": null,
            "chronic_conditions": null,
            "past_surgeries": null,
            "vaccination_status": "fully_vaccinated",
            "patient_status": "active",
            "created_at": "2024-01-01T00:00:00Z",
            "updated_at": "2024-01-01T00:00:00Z",
            "image_link": null,
            "bio": null
        })
    }

    pub fn guest_row(guest_id: &str, full_name: Option<&str>) -> serde_json::Value {
        json!({
            "guest_id": guest_id,
            "full_name": full_name,
            "phone": "0907654321",
            "email": "guest@example.com",
            "date_of_birth": "1985-03-12",
            "gender": "male",
            "created_at": "2024-01-01T00:00:00Z"
        })
    }

    pub fn staff_row(staff_id: &str, full_name: &str, role: &str, status: &str) -> serde_json::Value {
        json!({
            "staff_id": staff_id,
            "full_name": full_name,
            "working_email": format!("{}@clinic.test", role),
            "role": role,
            "years_experience": 5,
            "hired_at": "2020-02-01",
            "is_available": true,
            "staff_status": status,
            "gender": "other",
            "languages": ["English", "Vietnamese"],
            "image_link": null,
            "created_at": "2024-01-01T00:00:00Z",
            "updated_at": "2024-01-01T00:00:00Z"
        })
    }

    pub fn doctor_details_row(doctor_id: &str) -> serde_json::Value {
        json!({
            "doctor_id": doctor_id,
            "department": "cardiology",
            "speciality": "internal_medicine",
            "license_no": "LIC-0001",
            "bio": "Cardiologist",
            "slogan": null,
            "about_me": null,
            "educations": null,
            "certifications": null
        })
    }

    pub fn error_response(message: &str, code: &str) -> serde_json::Value {
        json!({
            "message": message,
            "code": code
        })
    }
}
