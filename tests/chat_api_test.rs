//! End-to-end tests: axum router in front of a wiremock stand-in for the mirror.

use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;
use wiremock::matchers::{body_partial_json, header, header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use grok_relay::config::UpstreamConfig;
use grok_relay::routes;
use grok_relay::service::chat_service::ChatService;
use grok_relay::upstream::UpstreamClient;

const UPSTREAM_PATH: &str = "/rest/app-chat/conversations/new";

fn app_for(server: &MockServer, timeout: Duration) -> Router {
    let mut config = UpstreamConfig::new(server.uri()).with_timeout(timeout);
    config.cookie = "share_token=test".to_string();
    config.statsig_id = "stat-id".to_string();
    let client = UpstreamClient::new(&config).expect("client should build");
    routes::router(ChatService::new(client))
}

fn app(server: &MockServer) -> Router {
    app_for(server, Duration::from_secs(5))
}

fn stream_body(lines: &[&str]) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_string(lines.join("\n"))
}

async fn post_chat(app: Router, body: Value) -> Value {
    let request = Request::builder()
        .method("POST")
        .uri("/api/chat")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn get_json(app: Router, uri: &str) -> Value {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_streamed_tokens_are_joined() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(UPSTREAM_PATH))
        .and(header("cookie", "share_token=test"))
        .and(header("x-statsig-id", "stat-id"))
        .and(header_exists("x-xai-request-id"))
        .and(header("origin", server.uri().as_str()))
        .and(body_partial_json(json!({
            "message": "hi",
            "modelName": "grok-3",
            "requestModelDetails": { "modelId": "grok-3" }
        })))
        .respond_with(stream_body(&[
            r#"{"result":{"conversation":{"conversationId":"c1"}}}"#,
            r#"{"result":{"response":{"token":"He"}}}"#,
            r#"{"result":{"response":{"token":"llo"}}}"#,
            r#"{"result":{"response":{"isSoftStop":true}}}"#,
            r#"{"result":{"response":{"token":" ignored"}}}"#,
        ]))
        .expect(1)
        .mount(&server)
        .await;

    let body = post_chat(app(&server), json!({ "message": "hi" })).await;
    assert_eq!(
        body,
        json!({
            "success": true,
            "data": { "response": "Hello", "conversation_id": "c1", "response_id": null },
            "error": null
        })
    );
}

#[tokio::test]
async fn test_explicit_model_is_forwarded() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(UPSTREAM_PATH))
        .and(body_partial_json(json!({
            "modelName": "grok-4",
            "requestModelDetails": { "modelId": "grok-4" }
        })))
        .respond_with(stream_body(&[r#"{"result":{"token":"ok","responseId":"r1"}}"#]))
        .expect(1)
        .mount(&server)
        .await;

    let body = post_chat(app(&server), json!({ "message": "hi", "model": "grok-4" })).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["response"], "ok");
    assert_eq!(body["data"]["response_id"], "r1");
}

#[tokio::test]
async fn test_empty_message_makes_no_upstream_call() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let body = post_chat(app(&server), json!({ "message": "" })).await;
    assert_eq!(body, json!({ "success": false, "data": null, "error": "Message is required" }));

    let body = post_chat(app(&server), json!({})).await;
    assert_eq!(body["error"], "Message is required");
}

#[tokio::test]
async fn test_upstream_error_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(UPSTREAM_PATH))
        .respond_with(ResponseTemplate::new(500).set_body_string("internal explosion"))
        .mount(&server)
        .await;

    let body = post_chat(app(&server), json!({ "message": "hi" })).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Request failed with status 500");
    assert_eq!(body["data"]["details"], "internal explosion");
}

#[tokio::test]
async fn test_no_text_extracted_reports_debug_info() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(UPSTREAM_PATH))
        .respond_with(stream_body(&[
            r#"{"result":{"conversation":{"conversationId":"c1"}}}"#,
            "not json at all",
            r#"{"result":{"response":{"responseId":"r1"}}}"#,
            r#"{"result":{"response":{"isSoftStop":true}}}"#,
        ]))
        .mount(&server)
        .await;

    let body = post_chat(app(&server), json!({ "message": "hi" })).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "No response text extracted");
    let debug = &body["data"]["debug_info"];
    assert_eq!(debug["lines_processed"], 4);
    assert_eq!(debug["malformed_lines"], 1);
    assert_eq!(debug["response_id"], "r1");
    assert_eq!(debug["conversation_id"], "c1");
}

#[tokio::test]
async fn test_full_message_replaces_tokens() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(UPSTREAM_PATH))
        .respond_with(stream_body(&[
            r#"{"result":{"response":{"token":"Fu"}}}"#,
            r#"{"result":{"response":{"token":"ll"}}}"#,
            r#"{"result":{"response":{"modelResponse":{"message":"Full answer","responseId":"r9"}}}}"#,
        ]))
        .mount(&server)
        .await;

    let body = post_chat(app(&server), json!({ "message": "hi" })).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["response"], "Full answer");
    assert_eq!(body["data"]["response_id"], "r9");
}

#[tokio::test]
async fn test_upstream_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(UPSTREAM_PATH))
        .respond_with(stream_body(&[r#"{"result":{"token":"late"}}"#]).set_delay(Duration::from_secs(2)))
        .mount(&server)
        .await;

    let body = post_chat(app_for(&server, Duration::from_millis(200)), json!({ "message": "hi" })).await;
    assert_eq!(body, json!({ "success": false, "data": null, "error": "Request timeout" }));
}

#[tokio::test]
async fn test_each_call_gets_a_fresh_request_id() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(UPSTREAM_PATH))
        .respond_with(stream_body(&[r#"{"result":{"token":"x"}}"#]))
        .expect(2)
        .mount(&server)
        .await;

    let app = app(&server);
    post_chat(app.clone(), json!({ "message": "one" })).await;
    post_chat(app, json!({ "message": "two" })).await;

    let requests = server.received_requests().await.unwrap();
    let ids: Vec<_> = requests
        .iter()
        .map(|r| r.headers.get("x-xai-request-id").unwrap().to_str().unwrap().to_string())
        .collect();
    assert_eq!(ids.len(), 2);
    assert_ne!(ids[0], ids[1]);
}

#[tokio::test]
async fn test_status_endpoints() {
    let server = MockServer::start().await;

    let root = get_json(app(&server), "/").await;
    assert_eq!(root["name"], "Grok Mirror API");
    assert_eq!(root["status"], "running");
    assert_eq!(root["version"], env!("CARGO_PKG_VERSION"));

    let health = get_json(app(&server), "/health").await;
    assert_eq!(health, json!({ "status": "healthy" }));
}

#[tokio::test]
async fn test_cors_mirrors_origin_with_credentials() {
    let server = MockServer::start().await;

    let request = Request::builder()
        .method("OPTIONS")
        .uri("/api/chat")
        .header("origin", "http://dify.local")
        .header("access-control-request-method", "POST")
        .header("access-control-request-headers", "content-type")
        .body(Body::empty())
        .unwrap();
    let response = app(&server).oneshot(request).await.unwrap();
    let headers = response.headers();
    assert_eq!(headers["access-control-allow-origin"], "http://dify.local");
    assert_eq!(headers["access-control-allow-credentials"], "true");

    let request = Request::builder()
        .uri("/health")
        .header("origin", "http://dify.local")
        .body(Body::empty())
        .unwrap();
    let response = app(&server).oneshot(request).await.unwrap();
    assert_eq!(response.headers()["access-control-allow-origin"], "http://dify.local");
    assert_eq!(response.headers()["access-control-allow-credentials"], "true");
}
