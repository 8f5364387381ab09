//! The parse pipeline: compose → call → normalize → decode.
//!
//! Strictly linear per request, no state carried across calls. Everything
//! interesting happens in the neighbouring modules; this one only wires the
//! stages together in order.

use crate::backend::{ModelBackend, PARSE_MAX_TOKENS};
use crate::error::ApiError;
use crate::normalize;
use crate::prompts::compose_user_message;
use crate::schema::{self, DocumentKind};
use serde::de::DeserializeOwned;
use tracing::info;

/// Run one document through the model and decode the reply.
pub async fn parse_document<T: DeserializeOwned>(
    backend: &dyn ModelBackend,
    kind: DocumentKind,
    text: &str,
    carrier_hint: Option<&str>,
) -> Result<T, ApiError> {
    info!(%kind, chars = text.chars().count(), hinted = carrier_hint.is_some(), "parsing document");
    let user_message = compose_user_message(text, carrier_hint);
    let raw = backend
        .complete(kind.system_prompt(), &user_message, PARSE_MAX_TOKENS)
        .await?;
    let value = normalize::recover_json(&raw)?;
    schema::decode(kind, value)
}
