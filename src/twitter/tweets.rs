//! Tweet operations for the Twitter API v2.
//!
//! Reply posting, with or without an attached media item. Both go through
//! `POST /2/tweets` with the `reply` parameter; the media variant adds the
//! previously uploaded media id.

use log::{debug, info};
use reqwest::Client;
use serde_json::json;

use crate::config::BotConfig;
use crate::error::BotResult;

use super::api::send_api_request;

/// Posts a plain-text reply to the given tweet.
///
/// # Parameters
///
/// - `text`: The text content of the reply tweet
/// - `reply_to_tweet_id`: The id of the tweet to reply to
///
/// # Returns
///
/// - `Ok(String)`: The API response body on success
/// - `Err(BotError)`: On rate limit, network or API errors
pub async fn reply_to_tweet(
    client: &Client,
    config: &BotConfig,
    text: &str,
    reply_to_tweet_id: u64,
) -> BotResult<String> {
    info!(
        "Replying to tweet {} with text: '{}'",
        reply_to_tweet_id, text
    );

    let payload = json!({
        "text": text,
        "reply": {
            "in_reply_to_tweet_id": reply_to_tweet_id.to_string()
        }
    });
    post_tweet_payload(client, config, payload, "reply_to_tweet").await
}

/// Posts a reply carrying one attached media item (the produced clip).
///
/// The media must have been uploaded first; `media_id` is the opaque
/// identifier returned by the upload call.
pub async fn reply_with_media(
    client: &Client,
    config: &BotConfig,
    text: &str,
    reply_to_tweet_id: u64,
    media_id: &str,
) -> BotResult<String> {
    info!(
        "Replying to tweet {} with media {} and text: '{}'",
        reply_to_tweet_id, media_id, text
    );

    let payload = json!({
        "text": text,
        "reply": {
            "in_reply_to_tweet_id": reply_to_tweet_id.to_string()
        },
        "media": {
            "media_ids": [media_id]
        }
    });
    post_tweet_payload(client, config, payload, "reply_with_media").await
}

/// Shared `POST /2/tweets` call.
async fn post_tweet_payload(
    client: &Client,
    config: &BotConfig,
    payload: serde_json::Value,
    operation_name: &str,
) -> BotResult<String> {
    let url = "https://api.x.com/2/tweets";
    debug!("Tweet payload: {}", payload);

    let request_builder = client
        .post(url)
        .header("Authorization", config.write_auth_header())
        .header("Content-Type", "application/json")
        .json(&payload);

    send_api_request(request_builder, operation_name).await
}
