use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use doctor_cell::router::doctor_routes;
use shared_config::AppConfig;
use shared_utils::test_utils::{JwtTestUtils, TestConfig, TestUser};

fn test_app(config: &AppConfig) -> Router {
    doctor_routes(Arc::new(config.clone()))
}

fn request(method: &str, uri: &str, config: &AppConfig, user: &TestUser, body: Option<Value>) -> Request<Body> {
    let token = JwtTestUtils::create_test_token(user, &config.supabase_jwt_secret, Some(1));
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("authorization", format!("Bearer {}", token));

    match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn counted(total: u64) -> ResponseTemplate {
    ResponseTemplate::new(200).insert_header("Content-Range", format!("*/{}", total).as_str())
}

async fn mount_patient_ids(server: &MockServer, ids: Value) {
    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("select", "patient_id"))
        .respond_with(ResponseTemplate::new(200).set_body_json(ids))
        .mount(server)
        .await;
}

#[tokio::test]
async fn dashboard_summarises_the_doctors_day() {
    let server = MockServer::start().await;
    let doctor = TestUser::doctor("dr.lan@clinic.test");

    Mock::given(method("HEAD"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("appointment_date", "eq.2024-06-10"))
        .respond_with(counted(3))
        .mount(&server)
        .await;
    Mock::given(method("HEAD"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("appointment_status", "eq.pending"))
        .respond_with(counted(2))
        .mount(&server)
        .await;
    mount_patient_ids(
        &server,
        json!([{ "patient_id": "p1" }, { "patient_id": "p2" }, { "patient_id": "p1" }]),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("limit", "5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {
                "appointment_id": "apt-9",
                "appointment_date": "2024-06-10",
                "appointment_time": "09:30",
                "appointment_status": "pending",
                "visit_type": "consultation",
                "patient": { "full_name": "Vo Thi Lan" }
            },
            {
                "appointment_id": "apt-8",
                "appointment_date": "2024-06-09",
                "appointment_time": null,
                "appointment_status": "confirmed",
                "visit_type": "follow_up",
                "patient": null
            }
        ])))
        .mount(&server)
        .await;

    let config = TestConfig::with_supabase_url(&server.uri()).to_app_config();
    let uri = format!("/{}/dashboard?date=2024-06-10", doctor.id);

    let response = test_app(&config)
        .oneshot(request("GET", &uri, &config, &doctor, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let dashboard = body_json(response).await;
    assert_eq!(dashboard["today_appointments"], 3);
    assert_eq!(dashboard["pending_appointments"], 2);
    assert_eq!(dashboard["total_patients"], 2);

    let recent = dashboard["recent_appointments"].as_array().unwrap();
    assert_eq!(recent.len(), 2);
    assert_eq!(recent[0]["patient_name"], "Vo Thi Lan");
    assert_eq!(recent[1]["patient_name"], "Unknown Patient");
    assert!(recent[0].get("patient").is_none());
}

#[tokio::test]
async fn other_staff_cannot_open_a_doctors_portal() {
    let config = TestConfig::default().to_app_config();
    let receptionist = TestUser::receptionist("desk@clinic.test");
    let other_doctor = TestUser::doctor("dr.other@clinic.test");

    for user in [&receptionist, &other_doctor] {
        let response = test_app(&config)
            .oneshot(request("GET", "/doc-1/dashboard", &config, user, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }
}

#[tokio::test]
async fn patient_list_is_deduplicated_and_filtered() {
    let server = MockServer::start().await;
    let doctor = TestUser::doctor("dr.lan@clinic.test");

    Mock::given(method("GET"))
        .and(path("/rest/v1/patients"))
        .and(query_param("appointments.doctor_id", format!("eq.{}", doctor.id).as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": "p1", "full_name": "Vo Thi Lan", "phone": "0901", "email": "lan@mail.test", "gender": "female", "patient_status": "active" },
            { "id": "p2", "full_name": "Dang Van Hung", "phone": "0902", "email": "hung@mail.test", "gender": "male", "patient_status": "active" },
            { "id": "p1", "full_name": "Vo Thi Lan", "phone": "0901", "email": "lan@mail.test", "gender": "female", "patient_status": "active" }
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let config = TestConfig::with_supabase_url(&server.uri()).to_app_config();
    let uri = format!("/{}/patients?gender=female", doctor.id);

    let response = test_app(&config)
        .oneshot(request("GET", &uri, &config, &doctor, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["total"], 1);
    assert_eq!(body["patients"][0]["id"], "p1");
}

#[tokio::test]
async fn receipts_are_skipped_for_a_doctor_without_patients() {
    let server = MockServer::start().await;
    let doctor = TestUser::doctor("dr.new@clinic.test");

    mount_patient_ids(&server, json!([])).await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/receipts"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&server)
        .await;

    let config = TestConfig::with_supabase_url(&server.uri()).to_app_config();
    let uri = format!("/{}/receipts", doctor.id);

    let response = test_app(&config)
        .oneshot(request("GET", &uri, &config, &doctor, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!({ "receipts": [] }));
}

#[tokio::test]
async fn receipts_cover_every_patient_of_the_doctor() {
    let server = MockServer::start().await;
    let doctor = TestUser::doctor("dr.lan@clinic.test");

    mount_patient_ids(&server, json!([{ "patient_id": "p1" }, { "patient_id": "p2" }])).await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/receipts"))
        .and(query_param("patient_id", "in.(p1,p2)"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "receipt_id": "r2", "patient_id": "p2", "amount": 250000.0, "status": "pending", "patient": null },
            { "receipt_id": "r1", "patient_id": "p1", "amount": 400000.0, "status": "paid", "patient": { "full_name": "Vo Thi Lan" } }
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let config = TestConfig::with_supabase_url(&server.uri()).to_app_config();
    let uri = format!("/{}/receipts", doctor.id);

    let response = test_app(&config)
        .oneshot(request("GET", &uri, &config, &doctor, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let receipts = body_json(response).await["receipts"].clone();
    assert_eq!(receipts[0]["patient_name"], "Unknown Patient");
    assert_eq!(receipts[1]["patient_name"], "Vo Thi Lan");
}

#[tokio::test]
async fn marking_a_receipt_paid() {
    let server = MockServer::start().await;
    let doctor = TestUser::doctor("dr.lan@clinic.test");

    mount_patient_ids(&server, json!([{ "patient_id": "p1" }])).await;
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/receipts"))
        .and(query_param("receipt_id", "eq.r1"))
        .and(query_param("patient_id", "in.(p1)"))
        .and(body_partial_json(json!({ "status": "paid" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "receipt_id": "r1", "patient_id": "p1", "amount": 400000.0, "status": "paid" }
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let config = TestConfig::with_supabase_url(&server.uri()).to_app_config();
    let uri = format!("/{}/receipts/r1/status", doctor.id);

    let response = test_app(&config)
        .oneshot(request("PUT", &uri, &config, &doctor, Some(json!({ "status": "paid" }))))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["status"], "paid");
}

#[tokio::test]
async fn blank_report_is_rejected_before_insert() {
    let server = MockServer::start().await;
    let doctor = TestUser::doctor("dr.lan@clinic.test");

    Mock::given(method("POST"))
        .and(path("/rest/v1/patient_reports"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([])))
        .expect(0)
        .mount(&server)
        .await;

    let config = TestConfig::with_supabase_url(&server.uri()).to_app_config();
    let uri = format!("/{}/reports", doctor.id);
    let body = json!({ "patient_id": "p1", "report_content": "   " });

    let response = test_app(&config)
        .oneshot(request("POST", &uri, &config, &doctor, Some(body)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn filing_a_report_records_its_author() {
    let server = MockServer::start().await;
    let doctor = TestUser::doctor("dr.lan@clinic.test");

    Mock::given(method("POST"))
        .and(path("/rest/v1/patient_reports"))
        .and(body_partial_json(json!({
            "staff_id": doctor.id,
            "patient_id": "p1",
            "report_status": "pending"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([{
            "report_id": "rep-1",
            "patient_id": "p1",
            "staff_id": doctor.id,
            "report_content": "Blood pressure stable",
            "report_description": null,
            "report_status": "pending",
            "created_at": "2024-06-10T10:00:00Z"
        }])))
        .expect(1)
        .mount(&server)
        .await;

    let config = TestConfig::with_supabase_url(&server.uri()).to_app_config();
    let uri = format!("/{}/reports", doctor.id);
    let body = json!({ "patient_id": "p1", "report_content": "Blood pressure stable" });

    let response = test_app(&config)
        .oneshot(request("POST", &uri, &config, &doctor, Some(body)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["report"]["report_id"], "rep-1");
}

#[tokio::test]
async fn editing_someone_elses_report_is_not_found() {
    let server = MockServer::start().await;
    let doctor = TestUser::doctor("dr.lan@clinic.test");

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/patient_reports"))
        .and(query_param("report_id", "eq.rep-7"))
        .and(query_param("staff_id", format!("eq.{}", doctor.id).as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let config = TestConfig::with_supabase_url(&server.uri()).to_app_config();
    let uri = format!("/{}/reports/rep-7", doctor.id);

    let response = test_app(&config)
        .oneshot(request("PUT", &uri, &config, &doctor, Some(json!({ "report_status": "reviewed" }))))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn reports_carry_patient_names() {
    let server = MockServer::start().await;
    let admin = TestUser::admin("admin@clinic.test");

    Mock::given(method("GET"))
        .and(path("/rest/v1/patient_reports"))
        .and(query_param("staff_id", "eq.doc-1"))
        .and(query_param("patient_id", "eq.p1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "report_id": "rep-1",
            "patient_id": "p1",
            "staff_id": "doc-1",
            "report_content": "Follow-up in two weeks",
            "report_status": "completed",
            "patient": { "full_name": "Vo Thi Lan" }
        }])))
        .expect(1)
        .mount(&server)
        .await;

    let config = TestConfig::with_supabase_url(&server.uri()).to_app_config();

    let response = test_app(&config)
        .oneshot(request("GET", "/doc-1/reports?patient_id=p1", &config, &admin, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let reports = body_json(response).await["reports"].clone();
    assert_eq!(reports[0]["patient_name"], "Vo Thi Lan");
    assert_eq!(reports[0]["report_status"], "completed");
}

#[tokio::test]
async fn notifications_are_worded_by_type() {
    let server = MockServer::start().await;
    let doctor = TestUser::doctor("dr.lan@clinic.test");

    Mock::given(method("GET"))
        .and(path("/rest/v1/notifications"))
        .and(query_param("staff_id", format!("eq.{}", doctor.id).as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {
                "notification_id": "n2",
                "notification_type": "appointment_cancelled",
                "sent_at": "2024-06-10T08:00:00Z",
                "appointment": { "appointment_date": "2024-06-12", "patient": { "full_name": "Dang Van Hung" } }
            },
            {
                "notification_id": "n1",
                "notification_type": "system_notice",
                "sent_at": "2024-06-09T08:00:00Z",
                "is_read": true,
                "appointment": null
            }
        ])))
        .mount(&server)
        .await;

    let config = TestConfig::with_supabase_url(&server.uri()).to_app_config();
    let uri = format!("/{}/notifications", doctor.id);

    let response = test_app(&config)
        .oneshot(request("GET", &uri, &config, &doctor, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let notifications = body_json(response).await["notifications"].clone();
    assert_eq!(notifications[0]["title"], "Appointment Cancelled");
    assert_eq!(notifications[0]["message"], "Appointment with Dang Van Hung has been cancelled");
    assert_eq!(notifications[1]["title"], "Notification");
    assert_eq!(notifications[1]["is_read"], true);
}

#[tokio::test]
async fn services_fall_back_to_general_category() {
    let server = MockServer::start().await;
    let doctor = TestUser::doctor("dr.lan@clinic.test");

    Mock::given(method("GET"))
        .and(path("/rest/v1/doctor_services"))
        .and(query_param("doctor_id", format!("eq.{}", doctor.id).as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {
                "doctor_id": doctor.id,
                "service": {
                    "service_id": "svc-1",
                    "service_name": "Prenatal checkup",
                    "service_description": "Routine prenatal visit",
                    "service_cost": 300000.0,
                    "duration_minutes": 30,
                    "category": { "category_name": "Obstetrics" }
                }
            },
            {
                "doctor_id": doctor.id,
                "service": {
                    "service_id": "svc-2",
                    "service_name": "Ultrasound",
                    "service_description": null,
                    "service_cost": 350000.0,
                    "duration_minutes": 20,
                    "category": null
                }
            },
            { "doctor_id": doctor.id, "service": null }
        ])))
        .mount(&server)
        .await;

    let config = TestConfig::with_supabase_url(&server.uri()).to_app_config();
    let uri = format!("/{}/services", doctor.id);

    let response = test_app(&config)
        .oneshot(request("GET", &uri, &config, &doctor, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let services = body_json(response).await["services"].as_array().unwrap().clone();
    assert_eq!(services.len(), 2);
    assert_eq!(services[0]["category_name"], "Obstetrics");
    assert_eq!(services[1]["category_name"], "General");
}

#[tokio::test]
async fn removing_an_unassigned_service_is_not_found() {
    let server = MockServer::start().await;
    let doctor = TestUser::doctor("dr.lan@clinic.test");

    Mock::given(method("DELETE"))
        .and(path("/rest/v1/doctor_services"))
        .and(query_param("service_id", "eq.svc-404"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let config = TestConfig::with_supabase_url(&server.uri()).to_app_config();
    let uri = format!("/{}/services/svc-404", doctor.id);

    let response = test_app(&config)
        .oneshot(request("DELETE", &uri, &config, &doctor, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
