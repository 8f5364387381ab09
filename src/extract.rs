//! Text extraction from uploaded files.
//!
//! Given a byte payload plus its declared content type, produce a single
//! text blob or fail. Dispatch is by content type with a filename-suffix
//! fallback:
//!
//! * `text/*` — lossy UTF-8 decode, never a failure
//! * `application/pdf` — document text plus flattened tabular rows
//! * `image/*` — vision transcription through the model backend
//! * anything else — 415 naming the supported set
//!
//! The 10 MiB size ceiling is enforced before any parsing attempt.

use crate::backend::ModelBackend;
use crate::error::ApiError;
use crate::prompts::VISION_TRANSCRIBE_PROMPT;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

/// Upload size ceiling. Oversized payloads fail fast without touching a parser.
pub const MAX_FILE_SIZE: usize = 10 * 1024 * 1024;

/// Image subtypes the Messages API accepts; anything else is coerced to PNG.
const IMAGE_MEDIA_TYPES: [&str; 4] = ["image/png", "image/jpeg", "image/webp", "image/gif"];

/// Extract a text blob from an uploaded file.
///
/// `backend` is only consulted for image uploads; a missing backend
/// credential fails those with 503 rather than aborting the process.
pub async fn extract_text(
    backend: Option<&dyn ModelBackend>,
    bytes: &[u8],
    content_type: &str,
    filename: &str,
) -> Result<String, ApiError> {
    if bytes.len() > MAX_FILE_SIZE {
        return Err(ApiError::PayloadTooLarge);
    }

    let filename = filename.to_ascii_lowercase();

    if content_type.starts_with("text/") || filename.ends_with(".txt") {
        return Ok(String::from_utf8_lossy(bytes).into_owned());
    }

    if content_type == "application/pdf" || filename.ends_with(".pdf") {
        return pdf_to_text(bytes);
    }

    if content_type.starts_with("image/") {
        let backend = backend.ok_or_else(|| {
            ApiError::BackendUnavailable("ANTHROPIC_API_KEY not set".to_string())
        })?;
        return transcribe_image(backend, bytes, content_type).await;
    }

    Err(ApiError::UnsupportedMediaType {
        content_type: content_type.to_string(),
    })
}

// ── PDF ──────────────────────────────────────────────────────────────────

/// Extract text from a PDF, appending a pipe-delimited twin after each
/// columnar line so table contents survive as row-shaped text.
fn pdf_to_text(bytes: &[u8]) -> Result<String, ApiError> {
    let text = pdf_extract::extract_text_from_mem(bytes)
        .map_err(|e| ApiError::Validation(format!("Failed to read PDF: {e}")))?;

    let extracted = flatten_tabular_lines(&text);
    if extracted.trim().is_empty() {
        return Err(ApiError::Validation(
            "Could not extract text from PDF. The file may be image-only. \
             Try using an OCR tool first, then submit the text."
                .to_string(),
        ));
    }
    debug!(bytes = bytes.len(), chars = extracted.len(), "extracted pdf text");
    Ok(extracted)
}

static RE_COLUMN_GAP: Lazy<Regex> = Lazy::new(|| Regex::new(r" {3,}|\t+").unwrap());

/// Append a ` | `-joined rendition after every line that splits into three
/// or more whitespace-gapped cells. Two-cell lines are left alone; ordinary
/// prose with an incidental double space should not be duplicated.
fn flatten_tabular_lines(text: &str) -> String {
    let mut out = Vec::new();
    for line in text.lines() {
        out.push(line.to_string());
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let cells: Vec<&str> = RE_COLUMN_GAP.split(trimmed).collect();
        if cells.len() >= 3 {
            out.push(cells.join(" | "));
        }
    }
    out.join("\n")
}

// ── Images ───────────────────────────────────────────────────────────────

async fn transcribe_image(
    backend: &dyn ModelBackend,
    bytes: &[u8],
    content_type: &str,
) -> Result<String, ApiError> {
    let media_type = if IMAGE_MEDIA_TYPES.contains(&content_type) {
        content_type
    } else {
        "image/png"
    };
    let encoded = BASE64.encode(bytes);
    debug!(media_type, bytes = bytes.len(), "transcribing image upload");
    backend
        .transcribe_image(media_type, &encoded, VISION_TRANSCRIBE_PROMPT)
        .await
}
