//! HTTP surface: router, authentication, and request handlers.
//!
//! Every parse handler follows the same order: identity (401) → rate limit
//! (429) → body validation (422) → extraction (413/415/422) → pipeline
//! (502/503/422). Auth runs as an extractor, so an unauthenticated request
//! never touches the rate limiter or the model.

use crate::backend::ModelBackend;
use crate::config::AppConfig;
use crate::error::ApiError;
use crate::extract;
use crate::limiter::RateLimiter;
use crate::pipeline;
use crate::schema::{
    self, BolRecord, BolRequest, DocumentKind, InvoiceRecord, InvoiceRequest, PackingRecord,
    PackingRequest,
};
use axum::extract::{DefaultBodyLimit, FromRequestParts, Multipart, State};
use axum::http::request::Parts;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::warn;

/// Transport-level body cap. Sits above [`extract::MAX_FILE_SIZE`] plus
/// multipart framing so the extractor's own size check produces the
/// documented 413 instead of an opaque transport rejection.
const BODY_LIMIT: usize = 32 * 1024 * 1024;

// ── Application state ────────────────────────────────────────────────────

/// Shared per-process state, cloned into every handler.
#[derive(Clone)]
pub struct AppState {
    config: Arc<AppConfig>,
    limiter: Arc<RateLimiter>,
    backend: Option<Arc<dyn ModelBackend>>,
}

impl AppState {
    pub fn new(config: AppConfig, backend: Option<Arc<dyn ModelBackend>>) -> Self {
        let limiter = RateLimiter::new(
            config.rate_limit_requests,
            Duration::from_secs(config.rate_limit_window),
        );
        Self {
            config: Arc::new(config),
            limiter: Arc::new(limiter),
            backend,
        }
    }

    /// The model backend, or 503 when no credential was configured.
    fn backend(&self) -> Result<&dyn ModelBackend, ApiError> {
        self.backend
            .as_deref()
            .ok_or_else(|| ApiError::BackendUnavailable("ANTHROPIC_API_KEY not set".to_string()))
    }

    /// One rate-limiter admission for this identity.
    fn admit(&self, identity: &ApiIdentity) -> Result<(), ApiError> {
        if self.limiter.admit(identity.as_str()) {
            return Ok(());
        }
        warn!(identity = identity.as_str(), "rate limit exceeded");
        Err(ApiError::RateLimited {
            limit: self.limiter.limit(),
            window_secs: self.limiter.window().as_secs(),
        })
    }
}

// ── Authentication ───────────────────────────────────────────────────────

/// Which auth path admitted the request. Doubles as the rate-limit key,
/// so all direct-key callers share one bucket and proxied callers another.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiIdentity {
    /// `X-RapidAPI-Proxy-Secret` matched the configured secret.
    RapidApi,
    /// `X-API-Key` was present in the configured key set.
    Direct,
}

impl ApiIdentity {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApiIdentity::RapidApi => "rapidapi",
            ApiIdentity::Direct => "direct",
        }
    }
}

impl FromRequestParts<AppState> for ApiIdentity {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, ApiError> {
        let config = &state.config;

        if !config.proxy_secret.is_empty() {
            if let Some(secret) = header_str(parts, "x-rapidapi-proxy-secret") {
                if secret == config.proxy_secret {
                    return Ok(ApiIdentity::RapidApi);
                }
            }
        }

        if let Some(key) = header_str(parts, "x-api-key") {
            if config.api_key_set().contains(key) {
                return Ok(ApiIdentity::Direct);
            }
        }

        warn!("request rejected: no valid API key or proxy secret");
        Err(ApiError::Unauthorized)
    }
}

fn header_str<'a>(parts: &'a Parts, name: &str) -> Option<&'a str> {
    parts.headers.get(name).and_then(|v| v.to_str().ok())
}

// ── Router ───────────────────────────────────────────────────────────────

/// Build the service router over the given state.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/parse-bol", post(parse_bol))
        .route("/parse-freight-invoice", post(parse_invoice))
        .route("/parse-packing-list", post(parse_packing_list))
        .route("/parse-bol/upload", post(parse_bol_upload))
        .route("/parse-freight-invoice/upload", post(parse_invoice_upload))
        .route("/parse-packing-list/upload", post(parse_packing_list_upload))
        .layer(DefaultBodyLimit::max(BODY_LIMIT))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ── Utility routes ───────────────────────────────────────────────────────

async fn root() -> Json<Value> {
    Json(json!({
        "service": "FreightParse API",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": [
            {"path": "/parse-bol", "method": "POST", "description": "Parse Bill of Lading (text)"},
            {"path": "/parse-freight-invoice", "method": "POST", "description": "Parse freight invoice (text)"},
            {"path": "/parse-packing-list", "method": "POST", "description": "Parse packing list (text)"},
            {"path": "/parse-bol/upload", "method": "POST", "description": "Parse Bill of Lading (file upload: PDF/image/text)"},
            {"path": "/parse-freight-invoice/upload", "method": "POST", "description": "Parse freight invoice (file upload: PDF/image/text)"},
            {"path": "/parse-packing-list/upload", "method": "POST", "description": "Parse packing list (file upload: PDF/image/text)"},
        ],
    }))
}

async fn health() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": Utc::now().to_rfc3339(),
    }))
}

// ── Text-body routes ─────────────────────────────────────────────────────

async fn parse_bol(
    State(state): State<AppState>,
    identity: ApiIdentity,
    Json(req): Json<BolRequest>,
) -> Result<Json<BolRecord>, ApiError> {
    state.admit(&identity)?;
    schema::validate_text(&req.text)?;
    let record = pipeline::parse_document(
        state.backend()?,
        DocumentKind::BillOfLading,
        &req.text,
        req.carrier_hint.as_deref(),
    )
    .await?;
    Ok(Json(record))
}

async fn parse_invoice(
    State(state): State<AppState>,
    identity: ApiIdentity,
    Json(req): Json<InvoiceRequest>,
) -> Result<Json<InvoiceRecord>, ApiError> {
    state.admit(&identity)?;
    schema::validate_text(&req.text)?;
    let record = pipeline::parse_document(
        state.backend()?,
        DocumentKind::FreightInvoice,
        &req.text,
        None,
    )
    .await?;
    Ok(Json(record))
}

async fn parse_packing_list(
    State(state): State<AppState>,
    identity: ApiIdentity,
    Json(req): Json<PackingRequest>,
) -> Result<Json<PackingRecord>, ApiError> {
    state.admit(&identity)?;
    schema::validate_text(&req.text)?;
    let record = pipeline::parse_document(
        state.backend()?,
        DocumentKind::PackingList,
        &req.text,
        None,
    )
    .await?;
    Ok(Json(record))
}

// ── Upload routes ────────────────────────────────────────────────────────

/// One uploaded file plus the optional hint form field.
struct Upload {
    bytes: axum::body::Bytes,
    content_type: String,
    filename: String,
    carrier_hint: Option<String>,
}

async fn read_upload(multipart: &mut Multipart) -> Result<Upload, ApiError> {
    let mut file: Option<(axum::body::Bytes, String, String)> = None;
    let mut carrier_hint = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::Validation(format!("Malformed multipart body: {e}")))?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("file") => {
                let content_type = field.content_type().unwrap_or_default().to_string();
                let filename = field.file_name().unwrap_or_default().to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::Validation(format!("Failed to read upload: {e}")))?;
                file = Some((bytes, content_type, filename));
            }
            Some("carrier_hint") => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| ApiError::Validation(format!("Failed to read upload: {e}")))?;
                if !value.is_empty() {
                    carrier_hint = Some(value);
                }
            }
            _ => {}
        }
    }

    let (bytes, content_type, filename) =
        file.ok_or_else(|| ApiError::Validation("multipart field 'file' is required".to_string()))?;
    Ok(Upload {
        bytes,
        content_type,
        filename,
        carrier_hint,
    })
}

async fn upload_to_text(state: &AppState, upload: &Upload) -> Result<String, ApiError> {
    extract::extract_text(
        state.backend.as_deref(),
        &upload.bytes,
        &upload.content_type,
        &upload.filename,
    )
    .await
}

async fn parse_bol_upload(
    State(state): State<AppState>,
    identity: ApiIdentity,
    mut multipart: Multipart,
) -> Result<Json<BolRecord>, ApiError> {
    state.admit(&identity)?;
    let upload = read_upload(&mut multipart).await?;
    let text = upload_to_text(&state, &upload).await?;
    let record = pipeline::parse_document(
        state.backend()?,
        DocumentKind::BillOfLading,
        &text,
        upload.carrier_hint.as_deref(),
    )
    .await?;
    Ok(Json(record))
}

async fn parse_invoice_upload(
    State(state): State<AppState>,
    identity: ApiIdentity,
    mut multipart: Multipart,
) -> Result<Json<InvoiceRecord>, ApiError> {
    state.admit(&identity)?;
    let upload = read_upload(&mut multipart).await?;
    let text = upload_to_text(&state, &upload).await?;
    let record = pipeline::parse_document(
        state.backend()?,
        DocumentKind::FreightInvoice,
        &text,
        None,
    )
    .await?;
    Ok(Json(record))
}

async fn parse_packing_list_upload(
    State(state): State<AppState>,
    identity: ApiIdentity,
    mut multipart: Multipart,
) -> Result<Json<PackingRecord>, ApiError> {
    state.admit(&identity)?;
    let upload = read_upload(&mut multipart).await?;
    let text = upload_to_text(&state, &upload).await?;
    let record = pipeline::parse_document(
        state.backend()?,
        DocumentKind::PackingList,
        &text,
        None,
    )
    .await?;
    Ok(Json(record))
}
