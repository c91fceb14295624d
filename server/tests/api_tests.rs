//! End-to-end gateway tests: the real supervisor behind the HTTP surface,
//! exercised through the authentication and ownership filters.

use std::sync::Arc;
use std::time::{Duration, Instant};

use actix_web::http::{header, StatusCode};
use actix_web::{test, web, App};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde_json::{json, Value};

use jobrunner::types::Job;
use jobrunner::{JobStatus, JobWorker, Supervisor};
use jobs_server::auth::Credentials;
use jobs_server::error::json_error_handler;
use jobs_server::handlers::{self, AppState};
use jobs_server::routes;

macro_rules! spawn_gateway {
    ($state:ident, $app:ident) => {
        let $state = web::Data::new(AppState::new(Arc::new(Supervisor::new())));
        let $app = test::init_service(
            App::new()
                .app_data($state.clone())
                .app_data(web::JsonConfig::default().error_handler(json_error_handler))
                .service(handlers::health)
                .service(routes::jobs(Arc::new(Credentials::stored()))),
        )
        .await;
    };
}

fn auth_header(username: &str, password: &str) -> (header::HeaderName, String) {
    let encoded = BASE64.encode(format!("{username}:{password}"));
    (header::AUTHORIZATION, format!("Basic {encoded}"))
}

fn valid_auth() -> (header::HeaderName, String) {
    auth_header("default_user", "123456")
}

/// Poll the supervisor directly (no HTTP round-trips) until the job leaves
/// the Active state.
async fn wait_for_terminal(state: &AppState, id: &str) -> JobStatus {
    let deadline = Instant::now() + Duration::from_secs(5);
    loop {
        let status = state.worker.status(id).await.expect("job disappeared");
        if status.is_terminal() {
            return status;
        }
        assert!(Instant::now() < deadline, "job {id} never terminated");
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

#[actix_web::test]
async fn submitted_echo_completes_with_output() {
    spawn_gateway!(state, app);

    let req = test::TestRequest::post()
        .uri("/jobs/run")
        .insert_header(valid_auth())
        .set_json(json!({ "command": "echo", "args": ["hi"] }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    let id = body["id"].as_str().expect("id in response").to_string();

    assert_eq!(wait_for_terminal(&state, &id).await, JobStatus::Complete);

    let req = test::TestRequest::get()
        .uri(&format!("/jobs/{id}/status"))
        .insert_header(valid_auth())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], "complete");
    assert_eq!(body["id"], id.as_str());

    let req = test::TestRequest::get()
        .uri(&format!("/jobs/{id}/out"))
        .insert_header(valid_auth())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["output"], "hi\n");
}

#[actix_web::test]
async fn kill_stops_a_sleeping_job() {
    spawn_gateway!(state, app);

    let req = test::TestRequest::post()
        .uri("/jobs/run")
        .insert_header(valid_auth())
        .set_json(json!({ "command": "sleep", "args": ["30"] }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    let id = body["id"].as_str().expect("id in response").to_string();

    let req = test::TestRequest::put()
        .uri(&format!("/jobs/{id}/kill"))
        .insert_header(valid_auth())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], "job successfully killed");
    assert_eq!(body["id"], id.as_str());

    assert_eq!(wait_for_terminal(&state, &id).await, JobStatus::Killed);

    let req = test::TestRequest::get()
        .uri(&format!("/jobs/{id}/status"))
        .insert_header(valid_auth())
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["status"], "killed");
}

#[actix_web::test]
async fn killing_an_unknown_job_is_not_found() {
    spawn_gateway!(state, app);
    let _ = &state;

    let req = test::TestRequest::put()
        .uri("/jobs/NOPE/kill")
        .insert_header(valid_auth())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn killing_a_terminated_job_conflicts() {
    spawn_gateway!(state, app);

    let req = test::TestRequest::post()
        .uri("/jobs/run")
        .insert_header(valid_auth())
        .set_json(json!({ "command": "echo", "args": ["hi"] }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    let id = body["id"].as_str().expect("id in response").to_string();
    assert_eq!(wait_for_terminal(&state, &id).await, JobStatus::Complete);

    let req = test::TestRequest::put()
        .uri(&format!("/jobs/{id}/kill"))
        .insert_header(valid_auth())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
}

#[actix_web::test]
async fn foreign_jobs_are_indistinguishable_from_unknown_ones() {
    spawn_gateway!(state, app);

    // A job that exists in the supervisor but is owned by nobody the
    // gateway knows about stands in for another user's submission.
    let foreign_id = state
        .worker
        .submit(Job::new("echo", vec!["secret".to_string()]))
        .await;
    wait_for_terminal(&state, &foreign_id).await;

    let req = test::TestRequest::get()
        .uri(&format!("/jobs/{foreign_id}/status"))
        .insert_header(valid_auth())
        .to_request();
    let foreign = test::call_service(&app, req).await;
    assert_eq!(foreign.status(), StatusCode::NOT_FOUND);
    let foreign_body = test::read_body(foreign).await;

    let req = test::TestRequest::get()
        .uri("/jobs/f00dfeed/status")
        .insert_header(valid_auth())
        .to_request();
    let unknown = test::call_service(&app, req).await;
    assert_eq!(unknown.status(), StatusCode::NOT_FOUND);
    let unknown_body = test::read_body(unknown).await;

    assert_eq!(foreign_body, unknown_body);
}

#[actix_web::test]
async fn invalid_bodies_are_rejected() {
    spawn_gateway!(state, app);
    let _ = &state;

    // Empty body.
    let req = test::TestRequest::post()
        .uri("/jobs/run")
        .insert_header(valid_auth())
        .insert_header((header::CONTENT_TYPE, "application/json"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    // No command field.
    let req = test::TestRequest::post()
        .uri("/jobs/run")
        .insert_header(valid_auth())
        .set_json(json!({ "args": ["hi"] }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    // Empty command.
    let req = test::TestRequest::post()
        .uri("/jobs/run")
        .insert_header(valid_auth())
        .set_json(json!({ "command": "" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn requests_without_valid_credentials_are_unauthorized() {
    spawn_gateway!(state, app);
    let _ = &state;

    let req = test::TestRequest::post()
        .uri("/jobs/run")
        .set_json(json!({ "command": "echo" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let req = test::TestRequest::post()
        .uri("/jobs/run")
        .insert_header(auth_header("default_user", "wrong"))
        .set_json(json!({ "command": "echo" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    // The liveness probe stays open.
    let req = test::TestRequest::get().uri("/health").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
}
