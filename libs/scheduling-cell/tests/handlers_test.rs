use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use scheduling_cell::router::scheduling_routes;
use shared_utils::test_utils::{MockSupabaseResponses, TestConfig};

fn create_test_app(supabase_url: &str) -> Router {
    scheduling_routes(TestConfig::with_supabase_url(supabase_url).to_arc())
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, json)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

const SESSION_NOW: &str = "2024-01-01T09:00:00";

fn window_uri(operation: &str) -> String {
    format!("/window/{}?now={}", operation, SESSION_NOW)
}

fn initial_state() -> Value {
    json!({
        "anchor": "2024-01-01",
        "start_index": 0,
        "selected_day": "2024-01-01"
    })
}

// ==============================================================================
// HORIZON
// ==============================================================================

#[tokio::test]
async fn test_get_horizon() {
    let app = create_test_app("http://localhost:54321");

    let (status, body) = send(app, get("/horizon?today=2024-01-01")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["min_date"], "2024-01-01");
    assert_eq!(body["max_date"], "2024-03-30");
    assert_eq!(body["days"].as_array().unwrap().len(), 90);
}

// ==============================================================================
// SLOTS
// ==============================================================================

#[tokio::test]
async fn test_get_slots_marks_past_and_booked() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("doctorId", "eq.doctor-1"))
        .and(query_param("date", "eq.2024-01-01"))
        .and(query_param("select", "time"))
        .respond_with(ResponseTemplate::new(200).set_body_json(vec![
            MockSupabaseResponses::booked_time_row("10:00:00"),
        ]))
        .mount(&mock_server)
        .await;

    let app = create_test_app(&mock_server.uri());
    let (status, body) = send(
        app,
        get("/doctors/doctor-1/slots?date=2024-01-01&now=2024-01-01T09:45:00"),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let slots = body["slots"].as_array().unwrap();
    assert_eq!(slots.len(), 17);
    assert_eq!(slots[0], json!({ "time": "09:00", "is_available": false }));
    assert_eq!(slots[1], json!({ "time": "09:30", "is_available": false }));
    assert_eq!(slots[2], json!({ "time": "10:00", "is_available": false }));
    assert_eq!(slots[3], json!({ "time": "10:30", "is_available": true }));
    assert_eq!(slots[16], json!({ "time": "17:00", "is_available": true }));
    assert_eq!(body["available_count"], 14);
}

#[tokio::test]
async fn test_get_slots_outside_horizon_is_rejected() {
    let app = create_test_app("http://localhost:54321");

    let (status, body) = send(
        app,
        get("/doctors/doctor-1/slots?date=2024-04-15&now=2024-01-01T09:45:00"),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("outside the booking horizon"));
}

#[tokio::test]
async fn test_get_slots_upstream_failure() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&mock_server)
        .await;

    let app = create_test_app(&mock_server.uri());
    let (status, _) = send(
        app,
        get("/doctors/doctor-1/slots?date=2024-01-02&now=2024-01-01T09:45:00"),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
}

// ==============================================================================
// WEEK WINDOW
// ==============================================================================

#[tokio::test]
async fn test_select_day_moves_window() {
    let app = create_test_app("http://localhost:54321");

    let (status, body) = send(
        app,
        post_json(&window_uri("select"), json!({ "state": initial_state(), "day": "2024-01-21" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["state"]["start_index"], 18);
    assert_eq!(body["state"]["selected_day"], "2024-01-21");
    assert_eq!(body["visible_days"][2], "2024-01-21");
    assert_eq!(body["can_page_backward"], true);
}

#[tokio::test]
async fn test_select_day_out_of_range_is_rejected() {
    let app = create_test_app("http://localhost:54321");

    let (status, _) = send(
        app,
        post_json(&window_uri("select"), json!({ "state": initial_state(), "day": "2024-03-31" })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_select_day_at_index() {
    let app = create_test_app("http://localhost:54321");

    let (status, body) = send(
        app,
        post_json(&window_uri("select-index"), json!({ "state": initial_state(), "index": 4 })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["state"]["selected_day"], "2024-01-05");
    assert_eq!(body["state"]["start_index"], 0);
}

#[tokio::test]
async fn test_paging_reports_boundaries() {
    let app = create_test_app("http://localhost:54321");

    let (status, body) = send(
        app.clone(),
        post_json(&window_uri("backward"), json!({ "state": initial_state() })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["outcome"], "at_boundary");
    assert_eq!(body["can_page_backward"], false);

    let last_page = json!({
        "anchor": "2024-01-01",
        "start_index": 80,
        "selected_day": "2024-01-01"
    });
    let (status, body) = send(
        app.clone(),
        post_json(&window_uri("forward"), json!({ "state": last_page })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["outcome"], "moved");
    assert_eq!(body["state"]["start_index"], 85);
    assert_eq!(body["can_page_forward"], false);

    let (status, body) = send(
        app,
        post_json(&window_uri("forward"), json!({ "state": body["state"].clone() })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["outcome"], "at_boundary");
    assert_eq!(body["state"]["start_index"], 85);
}

#[tokio::test]
async fn test_invalid_window_state_is_rejected() {
    let app = create_test_app("http://localhost:54321");
    let state = json!({
        "anchor": "2024-01-01",
        "start_index": 99,
        "selected_day": "2024-01-01"
    });

    let (status, _) = send(app, post_json(&window_uri("forward"), json!({ "state": state }))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_stale_window_is_moved_onto_todays_horizon() {
    let app = create_test_app("http://localhost:54321");
    let stale = json!({
        "anchor": "2023-12-30",
        "start_index": 0,
        "selected_day": "2024-01-05"
    });

    let (status, body) = send(
        app,
        post_json(&window_uri("forward"), json!({ "state": stale })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["state"]["anchor"], "2024-01-01");
    assert_eq!(body["state"]["selected_day"], "2024-01-05");
    assert_eq!(body["state"]["start_index"], 7);
    assert_eq!(body["outcome"], "moved");
}

#[tokio::test]
async fn test_expired_session_cannot_select_past_days() {
    let app = create_test_app("http://localhost:54321");
    let expired = json!({
        "anchor": "2020-01-01",
        "start_index": 0,
        "selected_day": "2020-01-01"
    });

    let (status, body) = send(
        app.clone(),
        post_json(&window_uri("select"), json!({ "state": expired, "day": "2020-02-01" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("outside the booking horizon"));

    let (status, body) = send(
        app,
        post_json(&window_uri("backward"), json!({ "state": expired })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["state"]["anchor"], "2024-01-01");
    assert_eq!(body["state"]["selected_day"], "2024-01-01");
    assert_eq!(body["visible_days"][0], "2024-01-01");
    assert_eq!(body["outcome"], "at_boundary");
}

// ==============================================================================
// LIVE QUEUE
// ==============================================================================

#[tokio::test]
async fn test_get_queue_classifies_todays_appointments() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("doctorId", "eq.doctor-1"))
        .and(query_param("date", "eq.2024-01-01"))
        .and(query_param("status", "eq.APPROVED"))
        .respond_with(ResponseTemplate::new(200).set_body_json(vec![
            MockSupabaseResponses::appointment_row("a1", "09:00:00", "APPROVED"),
            MockSupabaseResponses::appointment_row("a2", "09:30:00", "APPROVED"),
            MockSupabaseResponses::appointment_row("a3", "10:00:00", "APPROVED"),
        ]))
        .mount(&mock_server)
        .await;

    let app = create_test_app(&mock_server.uri());
    let (status, body) = send(app, get("/doctors/doctor-1/queue?now=2024-01-01T09:15:00")).await;

    assert_eq!(status, StatusCode::OK);
    let classification = &body["classification"];
    assert_eq!(
        classification["per_appointment"],
        json!([
            { "id": "a1", "state": "current" },
            { "id": "a2", "state": "upcoming" },
            { "id": "a3", "state": "upcoming" }
        ])
    );
    assert_eq!(classification["active_index"], 0);
    assert_eq!(classification["all_past"], false);
    assert_eq!(classification["display_window"][0]["time"], "09:00");
    assert_eq!(classification["display_window"][0]["patientFirstName"], "Test");
}

#[tokio::test]
async fn test_doctor_id_cannot_inject_upstream_filters() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("doctorId", "eq.d1&patientLastName=eq.Smith"))
        .respond_with(ResponseTemplate::new(200).set_body_json(Vec::<Value>::new()))
        .expect(2)
        .mount(&mock_server)
        .await;

    let app = create_test_app(&mock_server.uri());
    let (status, _) = send(
        app.clone(),
        get("/doctors/d1%26patientLastName=eq.Smith/queue?now=2024-01-01T09:15:00"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(
        app,
        get("/doctors/d1%26patientLastName=eq.Smith/slots?date=2024-01-01&now=2024-01-01T09:15:00"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let requests = mock_server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 2);
    for request in requests {
        assert!(request.url.query_pairs().all(|(key, _)| key != "patientLastName"));
    }
}

#[tokio::test]
async fn test_get_queue_for_empty_day() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(Vec::<Value>::new()))
        .mount(&mock_server)
        .await;

    let app = create_test_app(&mock_server.uri());
    let (status, body) = send(app, get("/doctors/doctor-1/queue?now=2024-01-01T09:15:00")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["classification"]["per_appointment"], json!([]));
    assert_eq!(body["classification"]["active_index"], Value::Null);
    assert_eq!(body["classification"]["display_window"], json!([]));
}
