//! Integration tests over the full router.
//!
//! A scripted [`ModelBackend`] stands in for the live model, so every route
//! is exercised end to end — auth, rate limiting, body validation, upload
//! extraction, normalization, schema binding — without a socket or network.

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use freightparse::{router, ApiError, AppConfig, AppState, ModelBackend};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

// ── Helpers ──────────────────────────────────────────────────────────────

/// Backend scripted per test. A `None` reply means the call must not happen.
struct MockBackend {
    complete_reply: Option<String>,
    transcribe_reply: Option<String>,
}

impl MockBackend {
    fn completing(reply: impl Into<String>) -> Arc<dyn ModelBackend> {
        Arc::new(Self {
            complete_reply: Some(reply.into()),
            transcribe_reply: None,
        })
    }

    fn unreachable() -> Arc<dyn ModelBackend> {
        Arc::new(Self {
            complete_reply: None,
            transcribe_reply: None,
        })
    }
}

#[async_trait]
impl ModelBackend for MockBackend {
    async fn complete(&self, _: &str, _: &str, _: u32) -> Result<String, ApiError> {
        match &self.complete_reply {
            Some(reply) => Ok(reply.clone()),
            None => panic!("model call issued where none was expected"),
        }
    }

    async fn transcribe_image(&self, _: &str, _: &str, _: &str) -> Result<String, ApiError> {
        match &self.transcribe_reply {
            Some(reply) => Ok(reply.clone()),
            None => panic!("vision call issued where none was expected"),
        }
    }
}

fn test_config() -> AppConfig {
    AppConfig {
        port: 0,
        rate_limit_requests: 100,
        rate_limit_window: 60,
        api_keys: vec!["test-key".into()],
        proxy_secret: String::new(),
        anthropic_api_key: None,
        model: "test-model".into(),
    }
}

fn app(config: AppConfig, backend: Option<Arc<dyn ModelBackend>>) -> Router {
    router(AppState::new(config, backend))
}

const BOL_TEXT: &str = "BILL OF LADING\nB/L No: MEDU4712839\nShipper: ACME Exports Ltd";

fn bol_reply() -> String {
    json!({
        "bol_number": "MEDU4712839",
        "carrier": "MSC",
        "containers": [
            {"number": "MSCU1234567", "size": "40", "type": "HC", "weight_kg": 21000.0},
            {"number": "MSCU7654321", "size": "20", "type": "GP", "weight_kg": 9800.0}
        ],
        "confidence": 0.92,
        "warnings": []
    })
    .to_string()
}

async fn post_json(app: &Router, uri: &str, body: Value, key: Option<&str>) -> (StatusCode, Value) {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(key) = key {
        builder = builder.header("X-API-Key", key);
    }
    let request = builder.body(Body::from(body.to_string())).unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

const BOUNDARY: &str = "freightparse-test-boundary";

fn multipart_body(
    filename: &str,
    content_type: &str,
    bytes: &[u8],
    carrier_hint: Option<&str>,
) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; \
             filename=\"{filename}\"\r\nContent-Type: {content_type}\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(bytes);
    body.extend_from_slice(b"\r\n");
    if let Some(hint) = carrier_hint {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; \
                 name=\"carrier_hint\"\r\n\r\n{hint}\r\n"
            )
            .as_bytes(),
        );
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

async fn post_upload(
    app: &Router,
    uri: &str,
    body: Vec<u8>,
    key: Option<&str>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method("POST").uri(uri).header(
        header::CONTENT_TYPE,
        format!("multipart/form-data; boundary={BOUNDARY}"),
    );
    if let Some(key) = key {
        builder = builder.header("X-API-Key", key);
    }
    let request = builder.body(Body::from(body)).unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

// ── Utility routes ───────────────────────────────────────────────────────

#[tokio::test]
async fn health_reports_status_and_utc_timestamp() {
    let app = app(test_config(), None);
    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(value["status"], "healthy");
    assert!(value["timestamp"].as_str().unwrap().contains('T'));
}

#[tokio::test]
async fn root_lists_the_six_parse_routes() {
    let app = app(test_config(), None);
    let response = app
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(value["service"], "FreightParse API");
    assert_eq!(value["endpoints"].as_array().unwrap().len(), 6);
}

// ── Authentication ───────────────────────────────────────────────────────

#[tokio::test]
async fn missing_key_is_401_and_never_reaches_limiter_or_model() {
    let mut config = test_config();
    config.rate_limit_requests = 1;
    // The unreachable backend panics on any model call.
    let app = app(config, Some(MockBackend::unreachable()));

    let (status, body) = post_json(&app, "/parse-bol", json!({"text": BOL_TEXT}), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["detail"], "Invalid API key");

    // The rejected request must not have consumed the single-slot budget.
    let app = app2_with_reply();
    let (status, _) = post_json(&app, "/parse-bol", json!({"text": BOL_TEXT}), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) =
        post_json(&app, "/parse-bol", json!({"text": BOL_TEXT}), Some("test-key")).await;
    assert_eq!(status, StatusCode::OK);
}

fn app2_with_reply() -> Router {
    let mut config = test_config();
    config.rate_limit_requests = 1;
    app(config, Some(MockBackend::completing(bol_reply())))
}

#[tokio::test]
async fn wrong_key_is_401() {
    let app = app(test_config(), Some(MockBackend::unreachable()));
    let (status, _) =
        post_json(&app, "/parse-bol", json!({"text": BOL_TEXT}), Some("wrong")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn proxy_secret_header_authenticates() {
    let mut config = test_config();
    config.proxy_secret = "hush".into();
    config.api_keys = vec![];
    let app = app(config, Some(MockBackend::completing(bol_reply())));

    let request = Request::builder()
        .method("POST")
        .uri("/parse-bol")
        .header(header::CONTENT_TYPE, "application/json")
        .header("X-RapidAPI-Proxy-Secret", "hush")
        .body(Body::from(json!({"text": BOL_TEXT}).to_string()))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn empty_configured_secret_never_matches_empty_header() {
    // proxy_secret unset and no api key given: always 401, even when the
    // caller sends an empty proxy-secret header.
    let app = app(test_config(), Some(MockBackend::unreachable()));
    let request = Request::builder()
        .method("POST")
        .uri("/parse-bol")
        .header(header::CONTENT_TYPE, "application/json")
        .header("X-RapidAPI-Proxy-Secret", "")
        .body(Body::from(json!({"text": BOL_TEXT}).to_string()))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

// ── Text-body parsing ────────────────────────────────────────────────────

#[tokio::test]
async fn bol_text_parses_end_to_end() {
    let app = app(test_config(), Some(MockBackend::completing(bol_reply())));
    let (status, body) = post_json(
        &app,
        "/parse-bol",
        json!({"text": BOL_TEXT, "carrier_hint": "MSC"}),
        Some("test-key"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["bol_number"], "MEDU4712839");
    assert_eq!(body["containers"].as_array().unwrap().len(), 2);
    assert_eq!(body["confidence"], 0.92);
    // Absent optional fields serialise as explicit nulls.
    assert!(body["vessel_name"].is_null());
}

#[tokio::test]
async fn fenced_reply_parses_identically() {
    let fenced = format!("```json\n{}\n```", bol_reply());
    let app = app(test_config(), Some(MockBackend::completing(fenced)));
    let (status, body) =
        post_json(&app, "/parse-bol", json!({"text": BOL_TEXT}), Some("test-key")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["bol_number"], "MEDU4712839");
}

#[tokio::test]
async fn prose_wrapped_reply_parses_identically() {
    let prose = format!("Here is the result:\n{}\nHope this helps!", bol_reply());
    let app = app(test_config(), Some(MockBackend::completing(prose)));
    let (status, body) =
        post_json(&app, "/parse-bol", json!({"text": BOL_TEXT}), Some("test-key")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["bol_number"], "MEDU4712839");
}

#[tokio::test]
async fn unrecoverable_reply_is_502() {
    let app = app(
        test_config(),
        Some(MockBackend::completing("no JSON to be found here")),
    );
    let (status, body) =
        post_json(&app, "/parse-bol", json!({"text": BOL_TEXT}), Some("test-key")).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(body["detail"]
        .as_str()
        .unwrap()
        .contains("structured response"));
}

#[tokio::test]
async fn reply_with_wrong_shape_is_422() {
    let app = app(
        test_config(),
        Some(MockBackend::completing(r#"{"containers": "two"}"#)),
    );
    let (status, body) =
        post_json(&app, "/parse-bol", json!({"text": BOL_TEXT}), Some("test-key")).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["detail"].as_str().unwrap().contains("schema"));
}

#[tokio::test]
async fn short_text_is_422() {
    let app = app(test_config(), Some(MockBackend::unreachable()));
    let (status, body) =
        post_json(&app, "/parse-bol", json!({"text": "too short"}), Some("test-key")).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["detail"].as_str().unwrap().contains("between 20 and 50000"));
}

#[tokio::test]
async fn invoice_and_packing_routes_decode_their_own_schemas() {
    let invoice_reply = json!({
        "invoice_number": "INV-7701",
        "line_items": [
            {"description": "Ocean freight", "charge_type": "OCEAN_FREIGHT", "amount": 1800.0, "currency": "USD"}
        ],
        "total": 1800.0,
        "confidence": 0.8
    })
    .to_string();
    let app_inv = app(test_config(), Some(MockBackend::completing(invoice_reply)));
    let (status, body) = post_json(
        &app_inv,
        "/parse-freight-invoice",
        json!({"text": "FREIGHT INVOICE INV-7701 Ocean freight USD 1,800.00"}),
        Some("test-key"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["invoice_number"], "INV-7701");
    assert_eq!(body["line_items"][0]["charge_type"], "OCEAN_FREIGHT");

    let packing_reply = json!({
        "packing_list_number": "PL-55",
        "items": [{"description": "Widgets", "quantity": 1200.0, "unit": "PCS"}],
        "total_packages": 24
    })
    .to_string();
    let app_pl = app(test_config(), Some(MockBackend::completing(packing_reply)));
    let (status, body) = post_json(
        &app_pl,
        "/parse-packing-list",
        json!({"text": "PACKING LIST PL-55 Widgets 1200 PCS 24 cartons"}),
        Some("test-key"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["packing_list_number"], "PL-55");
    assert_eq!(body["total_packages"], 24);
}

#[tokio::test]
async fn missing_backend_credential_is_503() {
    let app = app(test_config(), None);
    let (status, body) =
        post_json(&app, "/parse-bol", json!({"text": BOL_TEXT}), Some("test-key")).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(body["detail"].as_str().unwrap().contains("ANTHROPIC_API_KEY"));
}

// ── Rate limiting ────────────────────────────────────────────────────────

#[tokio::test]
async fn ceiling_admits_exactly_n_then_429() {
    let mut config = test_config();
    config.rate_limit_requests = 2;
    let app = app(config, Some(MockBackend::completing(bol_reply())));

    for _ in 0..2 {
        let (status, _) =
            post_json(&app, "/parse-bol", json!({"text": BOL_TEXT}), Some("test-key")).await;
        assert_eq!(status, StatusCode::OK);
    }
    let (status, body) =
        post_json(&app, "/parse-bol", json!({"text": BOL_TEXT}), Some("test-key")).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert!(body["detail"].as_str().unwrap().contains("Max 2 requests per 60s"));
}

// ── Uploads ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn text_upload_parses_end_to_end_with_hint() {
    let app = app(test_config(), Some(MockBackend::completing(bol_reply())));
    let body = multipart_body("bol.txt", "text/plain", BOL_TEXT.as_bytes(), Some("MSC"));
    let (status, value) = post_upload(&app, "/parse-bol/upload", body, Some("test-key")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(value["bol_number"], "MEDU4712839");
}

#[tokio::test]
async fn oversized_upload_is_413_before_any_extraction() {
    let app = app(test_config(), Some(MockBackend::unreachable()));
    let blob = vec![b'a'; 15 * 1024 * 1024];
    let body = multipart_body("huge.pdf", "application/pdf", &blob, None);
    let (status, value) = post_upload(&app, "/parse-bol/upload", body, Some("test-key")).await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(value["detail"], "File too large. Max 10 MB.");
}

#[tokio::test]
async fn unsupported_upload_type_is_415() {
    let app = app(test_config(), Some(MockBackend::unreachable()));
    let body = multipart_body("doc.zip", "application/zip", b"PK\x03\x04", None);
    let (status, value) = post_upload(&app, "/parse-bol/upload", body, Some("test-key")).await;
    assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
    assert!(value["detail"].as_str().unwrap().contains("application/zip"));
}

#[tokio::test]
async fn upload_without_file_field_is_422() {
    let app = app(test_config(), Some(MockBackend::unreachable()));
    let body = format!("--{BOUNDARY}--\r\n").into_bytes();
    let (status, value) = post_upload(&app, "/parse-bol/upload", body, Some("test-key")).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(value["detail"].as_str().unwrap().contains("file"));
}

#[tokio::test]
async fn image_upload_transcribes_then_parses() {
    let backend = Arc::new(MockBackend {
        complete_reply: Some(bol_reply()),
        transcribe_reply: Some(BOL_TEXT.to_string()),
    });
    let app = app(test_config(), Some(backend));
    let body = multipart_body("scan.png", "image/png", b"\x89PNG\r\n\x1a\n....", None);
    let (status, value) = post_upload(&app, "/parse-bol/upload", body, Some("test-key")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(value["bol_number"], "MEDU4712839");
}

#[tokio::test]
async fn image_upload_without_backend_is_503() {
    let app = app(test_config(), None);
    let body = multipart_body("scan.png", "image/png", b"\x89PNG", None);
    let (status, _) = post_upload(&app, "/parse-bol/upload", body, Some("test-key")).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}
