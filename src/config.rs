//! Service configuration.
//!
//! Every knob is a CLI flag with an environment-variable fallback, so the
//! same binary runs unchanged under systemd, Docker, or a local shell.
//! Parsing happens exactly once at startup; the resulting [`AppConfig`] is
//! shared immutably through the application state.

use clap::Parser;
use std::collections::HashSet;

/// Runtime configuration for the freightparse service.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "freightparse",
    about = "Turn messy shipping documents into clean structured JSON",
    version
)]
pub struct AppConfig {
    /// Port to listen on.
    #[arg(long, env = "PORT", default_value_t = 8000)]
    pub port: u16,

    /// Maximum requests a single identity may issue within one window.
    #[arg(long, env = "RATE_LIMIT_REQUESTS", default_value_t = 60)]
    pub rate_limit_requests: usize,

    /// Sliding-window length in seconds for rate limiting.
    #[arg(long, env = "RATE_LIMIT_WINDOW", default_value_t = 60)]
    pub rate_limit_window: u64,

    /// Comma-separated direct API keys accepted in the `X-API-Key` header.
    #[arg(long, env = "API_KEYS", default_value = "test-key", value_delimiter = ',')]
    pub api_keys: Vec<String>,

    /// Shared secret expected in `X-RapidAPI-Proxy-Secret`. Empty disables
    /// the proxy auth path.
    #[arg(long, env = "RAPIDAPI_PROXY_SECRET", default_value = "")]
    pub proxy_secret: String,

    /// Anthropic API key. When absent the service still starts, but parse
    /// routes answer 503 until a key is provided.
    #[arg(long, env = "ANTHROPIC_API_KEY")]
    pub anthropic_api_key: Option<String>,

    /// Model identifier sent with every Messages API call.
    #[arg(long, env = "CLAUDE_MODEL", default_value = "claude-sonnet-4-5-20250514")]
    pub model: String,
}

impl AppConfig {
    /// The accepted direct API keys, with empty entries discarded so a
    /// trailing comma in `API_KEYS` never admits the empty string.
    pub fn api_key_set(&self) -> HashSet<&str> {
        self.api_keys
            .iter()
            .map(String::as_str)
            .filter(|k| !k.is_empty())
            .collect()
    }
}
