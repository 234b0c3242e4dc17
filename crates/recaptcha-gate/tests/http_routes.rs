use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use mockito::{Matcher, Server};
use recaptcha_common::QueriedUser;
use recaptcha_gate::config::{AppConfig, GateConfig};
use recaptcha_gate::routes::create_router;
use recaptcha_gate::state::AppState;
use serde_json::{Value, json};
use tower::ServiceExt;

// Router wired to a stub verification service
fn test_router(server: &Server) -> Router {
    let config = AppConfig {
        gate: GateConfig {
            verification_url: Some(format!("{}/siteverify", server.url())),
            ..GateConfig::with_secret("S")
        },
        directory: vec![
            QueriedUser { id: "alice".into(), captcha_required: true },
            QueriedUser { id: "bob".into(), captcha_required: false },
        ],
        ..Default::default()
    };
    create_router(AppState::new(&config).unwrap())
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn siteverify(server: &mut Server, token: &str, success: bool) -> mockito::Mock {
    server
        .mock("GET", "/siteverify")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("secret".into(), "S".into()),
            Matcher::UrlEncoded("response".into(), token.into()),
        ]))
        .with_header("content-type", "application/json")
        .with_body(json!({ "success": success }).to_string())
        .create_async()
        .await
}

#[tokio::test]
async fn test_health_endpoint() {
    let server = Server::new_async().await;
    let response = test_router(&server)
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_verified_submission_reaches_handler_without_token() {
    let mut server = Server::new_async().await;
    let mock = siteverify(&mut server, "abc", true).await;

    let response = test_router(&server)
        .oneshot(post_json(
            "/contact",
            json!({ "g-recaptcha-response": "abc", "message": "hi" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["x-captcha-verified"], "true");
    let body = json_body(response).await;
    assert_eq!(body["captcha"], json!(true));
    assert_eq!(body["fields"], json!({ "message": "hi" }));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_missing_token_is_bad_request() {
    let mut server = Server::new_async().await;
    let mock = server.mock("GET", Matcher::Any).expect(0).create_async().await;

    let response = test_router(&server)
        .oneshot(post_json("/contact", json!({ "message": "hi" })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["error"], "server.error.badRecaptchaToken");
    mock.assert_async().await;
}

#[tokio::test]
async fn test_rejected_token_is_bad_request() {
    let mut server = Server::new_async().await;
    let _mock = siteverify(&mut server, "forged", false).await;

    let response = test_router(&server)
        .oneshot(post_json("/contact", json!({ "g-recaptcha-response": "forged" })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(response.headers().get("x-captcha-verified").is_none());
    let body = json_body(response).await;
    assert_eq!(body["error"], "server.error.invalidRecaptcha");
}

#[tokio::test]
async fn test_unreachable_service_is_server_error() {
    let config = AppConfig {
        gate: GateConfig {
            verification_url: Some("http://127.0.0.1:1/siteverify".into()),
            ..GateConfig::with_secret("S")
        },
        ..Default::default()
    };
    let app = create_router(AppState::new(&config).unwrap());

    let response = app
        .oneshot(post_json("/contact", json!({ "g-recaptcha-response": "abc" })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let body = json_body(response).await;
    assert_eq!(body["error"], "server.error.verificationUnavailable");
}

#[tokio::test]
async fn test_authenticated_comment_skips_verification() {
    let mut server = Server::new_async().await;
    let mock = server.mock("GET", Matcher::Any).expect(0).create_async().await;

    let request = Request::builder()
        .method("POST")
        .uri("/comments")
        .header(header::CONTENT_TYPE, "application/json")
        .header("x-user-id", "carol")
        .body(Body::from(json!({ "text": "first" }).to_string()))
        .unwrap();
    let response = test_router(&server).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["captcha"], json!(false));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_admin_announce_bypass_and_member_check() {
    let mut server = Server::new_async().await;
    let mock = server.mock("GET", Matcher::Any).expect(0).create_async().await;
    let app = test_router(&server);

    let as_role = |role: &str| {
        Request::builder()
            .method("POST")
            .uri("/admin/announce")
            .header(header::CONTENT_TYPE, "application/json")
            .header("x-user-id", "dave")
            .header("x-user-role", role)
            .body(Body::from(json!({ "text": "maintenance" }).to_string()))
            .unwrap()
    };

    let response = app.clone().oneshot(as_role("1")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.oneshot(as_role("4")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_flagged_user_requires_captcha() {
    let server = Server::new_async().await;

    let response = test_router(&server)
        .oneshot(post_json("/users/alice/messages", json!({ "text": "hey" })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(response.headers()["x-captcha-required"], "true");
    let body = json_body(response).await;
    assert_eq!(body["error"], "server.error.badRecaptchaToken");
}

#[tokio::test]
async fn test_unflagged_user_accepts_without_captcha() {
    let server = Server::new_async().await;

    let response = test_router(&server)
        .oneshot(post_json("/users/bob/messages", json!({ "text": "hey" })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().get("x-captcha-required").is_none());
}

#[tokio::test]
async fn test_unknown_user_is_not_found() {
    let server = Server::new_async().await;

    let response = test_router(&server)
        .oneshot(post_json("/users/nobody/messages", json!({ "text": "hey" })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_validate_endpoint() {
    let mut server = Server::new_async().await;
    let _ok = siteverify(&mut server, "good", true).await;
    let _bad = siteverify(&mut server, "bad", false).await;
    let app = test_router(&server);

    let response = app
        .clone()
        .oneshot(post_json("/validate", json!({ "token": "good" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await, json!({ "success": true }));

    let response = app
        .oneshot(post_json("/validate", json!({ "token": "bad" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["error"], "server.error.invalidRecaptcha");
}

#[tokio::test]
async fn test_missing_secret_is_configuration_error() {
    let config = AppConfig::default();
    let app = create_router(AppState::new(&config).unwrap());

    let response = app
        .oneshot(post_json("/contact", json!({ "g-recaptcha-response": "abc" })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json_body(response).await["error"], "server.error.configuration");
}

#[tokio::test]
async fn test_form_submission_is_verified_and_stripped() {
    let mut server = Server::new_async().await;
    let mock = siteverify(&mut server, "abc", true).await;

    let request = Request::builder()
        .method("POST")
        .uri("/contact")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from("g-recaptcha-response=abc&message=hi"))
        .unwrap();
    let response = test_router(&server).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["x-captcha-verified"], "true");
    let body = json_body(response).await;
    assert_eq!(body["fields"], json!({ "message": "hi" }));
    mock.assert_async().await;
}

// Router whose gates refuse to buffer bodies over 32 bytes
fn small_limit_router(server: &Server) -> Router {
    let config = AppConfig {
        gate: GateConfig {
            verification_url: Some(format!("{}/siteverify", server.url())),
            body_limit_bytes: 32,
            ..GateConfig::with_secret("S")
        },
        ..Default::default()
    };
    create_router(AppState::new(&config).unwrap())
}

#[tokio::test]
async fn test_oversized_body_from_authenticated_user_is_forwarded() {
    let server = Server::new_async().await;
    let text = "x".repeat(256);

    let request = Request::builder()
        .method("POST")
        .uri("/comments")
        .header(header::CONTENT_TYPE, "application/json")
        .header("x-user-id", "carol")
        .body(Body::from(json!({ "text": text }).to_string()))
        .unwrap();
    let response = small_limit_router(&server).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["fields"]["text"], json!(text));
}

#[tokio::test]
async fn test_oversized_body_from_anonymous_user_is_too_large() {
    let server = Server::new_async().await;

    let response = small_limit_router(&server)
        .oneshot(post_json("/comments", json!({ "text": "x".repeat(256) })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn test_transport_error_response_hides_secret() {
    let config = AppConfig {
        gate: GateConfig {
            verification_url: Some("http://127.0.0.1:1/siteverify".into()),
            ..GateConfig::with_secret("TOPSECRET123")
        },
        ..Default::default()
    };
    let app = create_router(AppState::new(&config).unwrap());

    let response = app
        .oneshot(post_json("/contact", json!({ "g-recaptcha-response": "abc" })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert!(!String::from_utf8_lossy(&bytes).contains("TOPSECRET123"));
}
