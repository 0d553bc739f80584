//! Mentions feed queries for the Twitter API v2.
//!
//! The bot polls `GET /2/users/:id/mentions` with the attached-media
//! expansion so each mention carrying a video arrives together with a
//! side list resolving its media keys to downloadable URLs. Responses are
//! navigated as `serde_json::Value`; anything missing an expected field is
//! skipped with a log line rather than failing the whole page.

use std::collections::HashMap;

use log::{debug, info, warn};
use reqwest::Client;

use crate::config::BotConfig;
use crate::error::{BotError, BotResult};

use super::api::send_api_request;

/// An inbound mention of the bot's account.
#[derive(Debug, Clone)]
pub struct Mention {
    /// Tweet id (also the watermark value once processed)
    pub id: u64,
    /// Full tweet text
    pub text: String,
    /// Media keys of any attachments, in tweet order
    pub media_keys: Vec<String>,
}

/// One page of the mentions feed: the mentions in the order the API
/// returned them (newest first) plus the resolved media-key → URL map from
/// the response's `includes.media` side list.
#[derive(Debug, Clone, Default)]
pub struct MentionPage {
    pub mentions: Vec<Mention>,
    pub media_urls: HashMap<String, String>,
}

impl MentionPage {
    /// Resolves a mention's first attachment to a downloadable URL, if the
    /// side list carries one.
    pub fn resolve_media_url(&self, mention: &Mention) -> Option<&str> {
        mention
            .media_keys
            .first()
            .and_then(|key| self.media_urls.get(key))
            .map(String::as_str)
    }
}

/// Looks up the authenticated bot account's user id via `GET /2/users/me`.
///
/// Called once at startup; the id is needed to address the mentions
/// endpoint.
pub async fn lookup_me(client: &Client, config: &BotConfig) -> BotResult<u64> {
    info!("Looking up bot user id");

    let url = "https://api.x.com/2/users/me";
    let request_builder = client
        .get(url)
        .header("Authorization", config.write_auth_header());

    let response_text = send_api_request(request_builder, "lookup_me").await?;
    let json_response: serde_json::Value = serde_json::from_str(&response_text)?;

    let id = json_response
        .get("data")
        .and_then(|data| data.get("id"))
        .and_then(|id| id.as_str())
        .and_then(|id| id.parse::<u64>().ok())
        .ok_or_else(|| BotError::api("lookup_me", 200, "response missing user id"))?;

    info!("Bot user id: {}", id);
    Ok(id)
}

/// Fetches mentions of the bot newer than `since_id` (or all available when
/// no watermark exists yet), with attached media resolved to URLs.
///
/// The returned page preserves the feed's newest-first order; the
/// orchestrator reverses before processing.
///
/// # Errors
///
/// - `BotError::RateLimited` on HTTP 429
/// - `BotError::Api` on any other non-success status
pub async fn fetch_mentions(
    client: &Client,
    config: &BotConfig,
    user_id: u64,
    since_id: Option<u64>,
) -> BotResult<MentionPage> {
    let mut url = format!(
        "https://api.x.com/2/users/{}/mentions?expansions={}&media.fields={}&tweet.fields={}",
        user_id,
        urlencoding::encode("attachments.media_keys"),
        urlencoding::encode("url,variants"),
        urlencoding::encode("attachments"),
    );
    if let Some(since) = since_id {
        url.push_str(&format!("&since_id={}", since));
    }

    debug!("Mentions URL: {}", url);
    info!(
        "Fetching mentions since {}",
        since_id.map_or_else(|| "the beginning".to_string(), |id| id.to_string())
    );

    let request_builder = client
        .get(&url)
        .header("Authorization", config.read_auth_header());

    let response_text = send_api_request(request_builder, "fetch_mentions").await?;
    let json_response: serde_json::Value = serde_json::from_str(&response_text)?;

    Ok(parse_mention_page(&json_response))
}

/// Builds a `MentionPage` from a mentions-endpoint response body.
///
/// Media entries that expose no direct `url` field (some video variants
/// only carry variant lists) fall back to the highest-listed variant URL.
pub(crate) fn parse_mention_page(json_response: &serde_json::Value) -> MentionPage {
    let mut page = MentionPage::default();

    // Side list first: media key -> URL
    if let Some(media_items) = json_response
        .get("includes")
        .and_then(|includes| includes.get("media"))
        .and_then(|media| media.as_array())
    {
        for item in media_items {
            let Some(key) = item.get("media_key").and_then(|v| v.as_str()) else {
                continue;
            };
            let url = item
                .get("url")
                .and_then(|v| v.as_str())
                .or_else(|| first_variant_url(item));
            match url {
                Some(url) => {
                    page.media_urls.insert(key.to_string(), url.to_string());
                }
                None => {
                    warn!("Media {} carries no resolvable URL", key);
                }
            }
        }
    }

    if let Some(tweets) = json_response.get("data").and_then(|data| data.as_array()) {
        info!("Found {} new mention(s)", tweets.len());
        for tweet in tweets {
            let (Some(id), Some(text)) = (
                tweet
                    .get("id")
                    .and_then(|v| v.as_str())
                    .and_then(|v| v.parse::<u64>().ok()),
                tweet.get("text").and_then(|v| v.as_str()),
            ) else {
                warn!("Skipping mention with missing id or text");
                continue;
            };

            let media_keys = tweet
                .get("attachments")
                .and_then(|a| a.get("media_keys"))
                .and_then(|keys| keys.as_array())
                .map(|keys| {
                    keys.iter()
                        .filter_map(|k| k.as_str().map(str::to_string))
                        .collect()
                })
                .unwrap_or_default();

            page.mentions.push(Mention {
                id,
                text: text.to_string(),
                media_keys,
            });
        }
    } else {
        info!("No new mentions found");
    }

    page
}

/// Picks the first variant URL from a media item's `variants` list.
fn first_variant_url(item: &serde_json::Value) -> Option<&str> {
    item.get("variants")
        .and_then(|v| v.as_array())
        .and_then(|variants| {
            variants
                .iter()
                .find_map(|variant| variant.get("url").and_then(|u| u.as_str()))
        })
}
