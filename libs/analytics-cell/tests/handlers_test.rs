use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;
use wiremock::matchers::{body_json as body_matches, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use analytics_cell::router::analytics_routes;
use shared_config::AppConfig;
use shared_utils::test_utils::{JwtTestUtils, TestConfig, TestUser};

fn app(config: &AppConfig) -> Router {
    analytics_routes(Arc::new(config.clone()))
}

fn get(uri: &str, config: &AppConfig, user: &TestUser) -> Request<Body> {
    let token = JwtTestUtils::create_test_token(user, &config.supabase_jwt_secret, Some(1));
    Request::builder()
        .uri(uri)
        .header("authorization", format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn counted(total: u64) -> ResponseTemplate {
    ResponseTemplate::new(200).insert_header("Content-Range", format!("*/{}", total).as_str())
}

#[tokio::test]
async fn dashboard_survives_missing_revenue_function() {
    let server = MockServer::start().await;

    Mock::given(method("HEAD"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("appointment_date", "eq.2024-06-01"))
        .respond_with(counted(4))
        .mount(&server)
        .await;
    Mock::given(method("HEAD"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("appointment_status", "eq.pending"))
        .respond_with(counted(3))
        .mount(&server)
        .await;
    Mock::given(method("HEAD"))
        .and(path("/rest/v1/patients"))
        .respond_with(counted(120))
        .mount(&server)
        .await;
    Mock::given(method("HEAD"))
        .and(path("/rest/v1/staff_members"))
        .respond_with(counted(9))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/rpc/calculate_daily_revenue"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({ "message": "function not found" })))
        .expect(1)
        .mount(&server)
        .await;

    let config = TestConfig::with_supabase_url(&server.uri()).to_app_config();
    let admin = TestUser::admin("admin@clinic.test");

    let response = app(&config)
        .oneshot(get("/dashboard?date=2024-06-01", &config, &admin))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let stats = body_json(response).await;
    assert_eq!(stats["today_appointments"], 4);
    assert_eq!(stats["pending_appointments"], 3);
    assert_eq!(stats["total_patients"], 120);
    assert_eq!(stats["total_staff"], 9);
    assert_eq!(stats["today_revenue"], 0.0);
}

#[tokio::test]
async fn pending_counts_split_today_and_upcoming() {
    let server = MockServer::start().await;

    Mock::given(method("HEAD"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("appointment_date", "eq.2024-06-01"))
        .respond_with(counted(2))
        .mount(&server)
        .await;
    Mock::given(method("HEAD"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("appointment_date", "gte.2024-06-02"))
        .respond_with(counted(5))
        .mount(&server)
        .await;
    Mock::given(method("HEAD"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("appointment_status", "eq.pending"))
        .respond_with(counted(11))
        .mount(&server)
        .await;

    let config = TestConfig::with_supabase_url(&server.uri()).to_app_config();
    let admin = TestUser::admin("admin@clinic.test");

    let response = app(&config)
        .oneshot(get("/pending?date=2024-06-01", &config, &admin))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!({ "total": 11, "today": 2, "upcoming": 5 }));
}

#[tokio::test]
async fn workload_divides_appointments_across_doctors() {
    let server = MockServer::start().await;

    Mock::given(method("HEAD"))
        .and(path("/rest/v1/staff_members"))
        .and(query_param("role", "eq.doctor"))
        .respond_with(counted(3))
        .mount(&server)
        .await;
    Mock::given(method("HEAD"))
        .and(path("/rest/v1/appointments"))
        .respond_with(counted(10))
        .mount(&server)
        .await;

    let config = TestConfig::with_supabase_url(&server.uri()).to_app_config();
    let admin = TestUser::admin("admin@clinic.test");

    let response = app(&config).oneshot(get("/workload", &config, &admin)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await,
        json!({ "doctor_count": 3, "total_appointments": 10, "per_doctor": 3 })
    );
}

#[tokio::test]
async fn gender_distribution_counts_rows() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/patients"))
        .and(query_param("select", "gender"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "gender": "female" },
            { "gender": "male" },
            { "gender": "female" }
        ])))
        .mount(&server)
        .await;

    let config = TestConfig::with_supabase_url(&server.uri()).to_app_config();
    let admin = TestUser::admin("admin@clinic.test");

    let response = app(&config)
        .oneshot(get("/gender-distribution", &config, &admin))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!({ "female": 2, "male": 1 }));
}

#[tokio::test]
async fn patients_by_month_forwards_rpc_parameters() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/rpc/count_patients_by_month"))
        .and(body_matches(json!({ "target_year": 2024, "target_month": 5 })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(17)))
        .expect(1)
        .mount(&server)
        .await;

    let config = TestConfig::with_supabase_url(&server.uri()).to_app_config();
    let admin = TestUser::admin("admin@clinic.test");

    let response = app(&config)
        .oneshot(get("/patients-by-month?year=2024&month=5", &config, &admin))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["count"], 17);
}

#[tokio::test]
async fn invalid_month_is_rejected() {
    let config = TestConfig::default().to_app_config();
    let admin = TestUser::admin("admin@clinic.test");

    let response = app(&config)
        .oneshot(get("/patients-by-month?year=2024&month=13", &config, &admin))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn inverted_kpi_range_is_rejected() {
    let config = TestConfig::default().to_app_config();
    let admin = TestUser::admin("admin@clinic.test");

    let response = app(&config)
        .oneshot(get("/kpis?start=2024-06-10&end=2024-06-01", &config, &admin))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn kpi_range_at_the_calendar_edge_is_rejected() {
    let config = TestConfig::default().to_app_config();
    let admin = TestUser::admin("admin@clinic.test");

    let response = app(&config)
        .oneshot(get("/kpis?start=-262143-01-01&end=-262143-01-10", &config, &admin))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn analytics_are_admin_only() {
    let config = TestConfig::default().to_app_config();
    let receptionist = TestUser::receptionist("desk@clinic.test");

    let response = app(&config)
        .oneshot(get("/dashboard", &config, &receptionist))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}
