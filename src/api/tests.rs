use crate::server::{build_router, build_runner, AppConfig};
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    response::Response,
    Router,
};
use ravensh_core::SessionManager;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

fn sh_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.interpreter.program = "sh".to_string();
    config.interpreter.args = Vec::new();
    config.execution.timeout_ms = 1_000;
    config
}

fn test_app(config: &AppConfig) -> (Router, Arc<SessionManager>) {
    let sessions = Arc::new(SessionManager::new(
        config.interpreter.command(),
        config.session.clone(),
    ));
    let runner = Arc::new(build_runner(config));
    (build_router(config, sessions.clone(), runner), sessions)
}

fn post(uri: &str, cookie: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(Method::POST).uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn json_body(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// Cookie pair (`name=value`) from a `Set-Cookie` response header
fn session_cookie(response: &Response) -> String {
    response
        .headers()
        .get(header::SET_COOKIE)
        .unwrap()
        .to_str()
        .unwrap()
        .split(';')
        .next()
        .unwrap()
        .to_string()
}

#[tokio::test]
async fn test_exec_then_update_round_trip() {
    let config = sh_config();
    let (app, sessions) = test_app(&config);

    let response = app
        .clone()
        .oneshot(post("/exec", None, Some(json!({ "line": "echo 1" }))))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let cookie = session_cookie(&response);

    let mut stdout = String::new();
    for _ in 0..40 {
        let response = app
            .clone()
            .oneshot(post("/update", Some(&cookie), None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().get(header::SET_COOKIE).is_none());

        let body = json_body(response).await;
        stdout.push_str(body["stdout"].as_str().unwrap());
        if !stdout.is_empty() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    assert_eq!(stdout, "1\n");
    assert_eq!(sessions.stats().await.spawned_total, 1);

    sessions.shutdown_all().await;
}

#[tokio::test]
async fn test_malformed_line_is_rejected_without_spawning() {
    let config = sh_config();
    let (app, sessions) = test_app(&config);

    let response = app
        .oneshot(post("/exec", None, Some(json!({ "text": "missing line" }))))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "MALFORMED_REQUEST");
    assert!(sessions.is_empty().await);
}

#[tokio::test]
async fn test_reset_unknown_session_is_ok() {
    let config = sh_config();
    let (app, sessions) = test_app(&config);

    let response = tokio_test::assert_ok!(app.oneshot(post("/reset", None, None)).await);
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(sessions.stats().await.spawned_total, 0);
}

#[tokio::test]
async fn test_reset_kills_session() {
    let config = sh_config();
    let (app, sessions) = test_app(&config);

    let response = app
        .clone()
        .oneshot(post("/update", None, None))
        .await
        .unwrap();
    let cookie = session_cookie(&response);
    assert_eq!(sessions.len().await, 1);

    let response = app
        .oneshot(post("/reset", Some(&cookie), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(sessions.is_empty().await);
}

#[tokio::test]
async fn test_program_ok_and_timeout() {
    let config = sh_config();
    let (app, _) = test_app(&config);

    let response = app
        .clone()
        .oneshot(post(
            "/program",
            None,
            Some(json!({ "src": "echo \"$1-$2\"", "args": "a 'b c'" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], 0);
    assert_eq!(body["stdout"], "a-b c\n");
    assert_eq!(body["exit_code"], 0);

    let response = app
        .oneshot(post("/program", None, Some(json!({ "src": "exec sleep 10" }))))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], 1);
}

#[tokio::test]
async fn test_program_spawn_failure_is_server_error() {
    let mut config = sh_config();
    config.interpreter.program = "/nonexistent/ravensh-interpreter".to_string();
    let (app, _) = test_app(&config);

    let response = app
        .oneshot(post("/program", None, Some(json!({ "src": "" }))))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json_body(response).await["code"], "EXECUTION_FAILED");
}

#[tokio::test]
async fn test_session_create_failure_is_server_error() {
    let mut config = sh_config();
    config.interpreter.program = "/nonexistent/ravensh-interpreter".to_string();
    let (app, sessions) = test_app(&config);

    let response = app
        .oneshot(post("/exec", None, Some(json!({ "line": "1" }))))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json_body(response).await["code"], "SESSION_CREATE_FAILED");
    assert!(sessions.is_empty().await);
}

#[tokio::test]
async fn test_health_reports_counters_without_cookie() {
    let config = sh_config();
    let (app, _) = test_app(&config);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().get(header::SET_COOKIE).is_none());
    let body = json_body(response).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["sessions"], 0);
}

#[tokio::test]
async fn test_cors_preflight() {
    let config = sh_config();
    let (app, sessions) = test_app(&config);

    let response = app
        .oneshot(
            Request::builder()
                .method(Method::OPTIONS)
                .uri("/exec")
                .header(header::ORIGIN, "http://localhost:8080")
                .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let headers = response.headers();
    assert_eq!(
        headers.get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
        "http://localhost:8080"
    );
    assert_eq!(
        headers.get(header::ACCESS_CONTROL_ALLOW_CREDENTIALS).unwrap(),
        "true"
    );
    assert!(sessions.is_empty().await);
}
