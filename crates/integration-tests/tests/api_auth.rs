mod common;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use serde_json::json;

use common::{error_code, TestApp, PASSWORD};
use services::Credentials;

#[tokio::test]
async fn admin_routes_need_an_admin_token() {
    let app = TestApp::new();
    let reader = app.reader_token("reader").await;
    let new_story = json!({ "title": "Nope", "author": "Nobody" });

    let (status, body) = app
        .send(Method::POST, "/api/stories", None, Some(new_story.clone()))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(error_code(&body), "unauthorized");

    let (status, body) = app
        .send(Method::POST, "/api/stories", Some(&reader), Some(new_story.clone()))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(error_code(&body), "forbidden");

    let (status, _) = app
        .send(Method::POST, "/api/stories", Some("not-a-jwt"), Some(new_story))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn bad_tokens_are_rejected_even_on_public_routes() {
    let app = TestApp::new();

    let (status, _) = app
        .send(Method::GET, "/api/stories/anything", Some("garbage"), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let request = Request::builder()
        .uri("/api/auth/me")
        .header(header::AUTHORIZATION, "Basic YWRtaW46YWRtaW4=")
        .body(Body::empty())
        .unwrap();
    let (status, body) = app.send_request(request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(error_code(&body), "unauthorized");
}

#[tokio::test]
async fn configured_admin_can_log_in_on_a_fresh_store() {
    let app = TestApp::new();
    let credentials = || Credentials {
        username: "owner".into(),
        password: PASSWORD.into(),
    };
    let created = app.state.accounts.ensure_admin(credentials()).await.unwrap();
    assert!(created.is_some());
    assert!(app.state.accounts.ensure_admin(credentials()).await.unwrap().is_none());

    let (status, session) = app
        .send(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "username": "owner", "password": PASSWORD })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{session}");
    assert_eq!(session["user"]["role"], "admin");

    let token = session["token"].as_str().unwrap();
    let (status, _) = app
        .send(
            Method::POST,
            "/api/stories",
            Some(token),
            Some(json!({ "title": "First", "author": "Owner" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn register_login_and_me() {
    let app = TestApp::new();
    let token = app.reader_token("alice").await;

    let (status, me) = app.send(Method::GET, "/api/auth/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["username"], "alice");
    assert_eq!(me["role"], "user");

    let (status, body) = app
        .send(
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({ "username": "alice", "password": PASSWORD })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(error_code(&body), "conflict");

    let (status, body) = app
        .send(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "username": "alice", "password": "wrong-password" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(error_code(&body), "unauthorized");

    let (status, session) = app
        .send(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "username": "alice", "password": PASSWORD })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(session["user"]["username"], "alice");
    assert!(session["token"].as_str().is_some_and(|t| !t.is_empty()));
}

#[tokio::test]
async fn registration_input_is_validated() {
    let app = TestApp::new();
    for body in [
        json!({ "username": "ab", "password": PASSWORD }),
        json!({ "username": "bad name", "password": PASSWORD }),
        json!({ "username": "bob", "password": "short" }),
        json!({ "username": "bob" }),
    ] {
        let (status, response) = app
            .send(Method::POST, "/api/auth/register", None, Some(body.clone()))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
        assert_eq!(error_code(&response), "validation_error");
    }

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/auth/register")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, body) = app.send_request(request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_code(&body), "validation_error");
}

#[tokio::test]
async fn health_and_metrics_endpoints() {
    let app = TestApp::new();

    let (status, body) = app.send(Method::GET, "/healthz", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "ok");

    app.send(Method::GET, "/api/stories", None, None).await;
    let (status, body) = app.send(Method::GET, "/metrics", None, None).await;
    assert_eq!(status, StatusCode::OK);
    let text = body.as_str().unwrap();
    assert!(text.contains(r#"http_requests_total{method="GET",status="200"}"#), "{text}");
    assert!(text.contains("chapter_views_total"));
}

#[tokio::test]
async fn responses_carry_a_request_id() {
    let app = TestApp::new();
    let request = Request::builder()
        .uri("/healthz")
        .header("x-request-id", "abc-123")
        .body(Body::empty())
        .unwrap();
    let response = tower::ServiceExt::oneshot(app.router.clone(), request).await.unwrap();
    assert_eq!(response.headers()["x-request-id"], "abc-123");

    let request = Request::builder().uri("/healthz").body(Body::empty()).unwrap();
    let response = tower::ServiceExt::oneshot(app.router.clone(), request).await.unwrap();
    assert!(response.headers().contains_key("x-request-id"));
}
