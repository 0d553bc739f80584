//! Core Twitter API utilities.
//!
//! This module contains the low-level request helper shared by the feed,
//! reply and upload calls. It maps HTTP 429 to the dedicated rate-limit
//! error so the poll loop can apply its cooldown, and everything else
//! non-success to a transient API error.

use log::{debug, error, info, warn};

use crate::error::{BotError, BotResult};

/// Sanitizes text for safe logging by truncating and escaping control characters.
///
/// This function:
/// - Truncates long text to prevent log flooding
/// - Replaces control characters that could manipulate log output
/// - Escapes newlines to prevent log injection
///
/// # Parameters
///
/// - `text`: The text to sanitize
/// - `max_len`: Maximum length before truncation
///
/// # Returns
///
/// A sanitized string safe for logging
pub(crate) fn sanitize_for_logging(text: &str, max_len: usize) -> String {
    // Replace control characters and newlines to prevent log injection
    let sanitized: String = text
        .chars()
        .map(|c| match c {
            '\n' => ' ',
            '\r' => ' ',
            '\t' => ' ',
            c if c.is_control() => '?',
            c => c,
        })
        .collect();

    if sanitized.len() > max_len {
        // Back off to a char boundary so multi-byte text never panics.
        let mut cut = max_len;
        while !sanitized.is_char_boundary(cut) {
            cut -= 1;
        }
        format!(
            "{}... [truncated, {} total bytes]",
            &sanitized[..cut],
            text.len()
        )
    } else {
        sanitized
    }
}

/// Sends a prepared request to the Twitter API and returns the response body.
///
/// # Parameters
///
/// - `request_builder`: A configured `reqwest::RequestBuilder` ready to send
/// - `operation_name`: Human-readable name for the operation (for logging)
///
/// # Returns
///
/// - `Ok(String)`: The API response body on success
/// - `Err(BotError::RateLimited)`: On HTTP 429 — the caller cools down
/// - `Err(BotError::Api)`: On any other non-success status
pub(crate) async fn send_api_request(
    request_builder: reqwest::RequestBuilder,
    operation_name: &str,
) -> BotResult<String> {
    debug!("Sending request for operation: {}", operation_name);

    let response = request_builder.send().await?;
    let status = response.status();
    info!(
        "Received response with status: {} for operation: {}",
        status, operation_name
    );

    if status.is_success() {
        let response_text = response.text().await?;
        debug!(
            "Response summary for '{}': {} bytes received",
            operation_name,
            response_text.len()
        );
        return Ok(response_text);
    }

    if status.as_u16() == 429 {
        warn!(
            "Rate limit exceeded for operation '{}' - cooling down",
            operation_name
        );
        return Err(BotError::RateLimited);
    }

    let error_text = response.text().await.unwrap_or_default();
    error!("Operation '{}' failed - Status: {}", operation_name, status);
    debug!(
        "Error response for '{}': {}",
        operation_name,
        sanitize_for_logging(&error_text, 200)
    );
    Err(BotError::api(
        operation_name,
        status.as_u16(),
        sanitize_for_logging(&error_text, 200),
    ))
}
