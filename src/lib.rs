//! # freightparse
//!
//! Turn messy shipping documents into clean, structured JSON. Parses Bills
//! of Lading, freight invoices, and packing lists by sending extracted text
//! to an external large-language-model backend and validating its reply
//! against a fixed per-kind schema.
//!
//! ## Pipeline Overview
//!
//! ```text
//! request
//!  │
//!  ├─ 1. Auth       proxy secret or direct API key (401 otherwise)
//!  ├─ 2. Limit      per-identity sliding-window counter (429)
//!  ├─ 3. Extract    UTF-8 / PDF text + tables / image transcription
//!  ├─ 4. Compose    per-kind system prompt + optional carrier hint
//!  ├─ 5. Call       single-shot Messages API exchange
//!  ├─ 6. Normalize  strip fences, locate the JSON object
//!  └─ 7. Decode     strict schema binding, defaults on absence
//! ```
//!
//! Control flow is strictly linear per request. Nothing survives a request
//! except the rate-limit table and the shared backend handle; no record is
//! ever persisted.
//!
//! ## Running
//!
//! ```bash
//! ANTHROPIC_API_KEY=sk-... API_KEYS=my-key cargo run --bin freightparse
//! curl -s localhost:8000/parse-bol \
//!     -H 'X-API-Key: my-key' -H 'Content-Type: application/json' \
//!     -d '{"text": "BILL OF LADING\nB/L No: MEDU4712839\n..."}'
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod backend;
pub mod config;
pub mod error;
pub mod extract;
pub mod limiter;
pub mod normalize;
pub mod pipeline;
pub mod prompts;
pub mod schema;
pub mod server;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use backend::{AnthropicBackend, ModelBackend};
pub use config::AppConfig;
pub use error::ApiError;
pub use limiter::RateLimiter;
pub use schema::{BolRecord, DocumentKind, InvoiceRecord, PackingRecord};
pub use server::{router, AppState};
