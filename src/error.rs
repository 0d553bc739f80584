//! Error types for the highlightbot pipeline.
//!
//! Each pipeline stage gets its own variant so the orchestrator can pick a
//! recovery action per failure class: cooldown on rate limiting, a short
//! sleep on transient API trouble, a user-facing reply on processing
//! failures.

use thiserror::Error;

/// Result type used throughout the bot.
pub type BotResult<T> = Result<T, BotError>;

/// Errors that can occur while polling, downloading, trimming or replying.
#[derive(Debug, Error)]
pub enum BotError {
    /// The API signalled that the request quota is exhausted (HTTP 429).
    /// The poll loop responds with an extended cooldown sleep.
    #[error("Twitter API rate limit exceeded")]
    RateLimited,

    /// Any other non-success response from the Twitter API.
    #[error("Twitter API error ({status}) during {operation}: {message}")]
    Api {
        operation: String,
        status: u16,
        message: String,
    },

    /// Downloading the source video failed (network error or bad status).
    #[error("video download failed: {0}")]
    Fetch(String),

    /// The ffmpeg trim failed (non-zero exit, unreadable input, empty output).
    #[error("video trim failed: {0}")]
    Trim(String),

    #[error("ffmpeg not found in PATH")]
    FfmpegNotFound,

    /// Missing or invalid environment configuration at startup.
    #[error("configuration error: {0}")]
    Config(String),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

impl BotError {
    /// Create an API error for a named operation.
    pub fn api(operation: impl Into<String>, status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            operation: operation.into(),
            status,
            message: message.into(),
        }
    }

    /// Create a download failure error.
    pub fn fetch(message: impl Into<String>) -> Self {
        Self::Fetch(message.into())
    }

    /// Create a trim failure error.
    pub fn trim(message: impl Into<String>) -> Self {
        Self::Trim(message.into())
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Whether this error should trigger the extended cooldown sleep
    /// instead of the normal polling interval.
    pub fn is_rate_limit(&self) -> bool {
        matches!(self, Self::RateLimited)
    }
}
