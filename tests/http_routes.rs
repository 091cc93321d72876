//! Router tests against an in-process duel loop

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::Value;
use tower::ServiceExt;

use sign_duel_server::app::AppState;
use sign_duel_server::config::{Config, DuelSettings};
use sign_duel_server::game::{DuelRunner, GameState};
use sign_duel_server::http::build_router;

fn app() -> (Router, DuelRunner) {
    let config = Config {
        server_addr: "127.0.0.1:0".parse().unwrap(),
        log_level: "debug".to_string(),
        client_origin: "http://localhost:3000".to_string(),
        duel: DuelSettings::default(),
    };
    let (runner, handle) = DuelRunner::new(&config.duel);
    (build_router(AppState::new(config, handle)), runner)
}

fn post_command(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/commands")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn health_reports_duel_state() {
    let (router, _runner) = app();
    let response = router
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["state"], "start");
}

#[tokio::test]
async fn snapshot_lists_both_players() {
    let (router, _runner) = app();
    let response = router
        .oneshot(Request::get("/snapshot").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["players"].as_array().map(Vec::len), Some(2));
    assert_eq!(body["players"][0]["hp"], 100);
}

#[tokio::test]
async fn accepted_command_is_applied_on_next_drain() {
    let (router, mut runner) = app();
    let response = router
        .oneshot(post_command(r#"{"type":"start"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::ACCEPTED);
    assert!(runner.process_inputs());
    assert_eq!(runner.duel().state(), GameState::Playing);
}

#[tokio::test]
async fn unknown_ability_is_a_bad_request() {
    let (router, _runner) = app();
    let response = router
        .oneshot(post_command(
            r#"{"type":"cast","player":1,"ability":"meteor"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert!(body["error"].as_str().unwrap().contains("meteor"));
}

#[tokio::test]
async fn commands_fail_once_the_loop_is_gone() {
    let (router, runner) = app();
    drop(runner);
    let response = router
        .oneshot(post_command(r#"{"type":"abort"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}
