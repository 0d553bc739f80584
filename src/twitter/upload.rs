//! Media upload for clip attachments.
//!
//! Uploads the produced clip file in a single multipart request and returns
//! the opaque media id that the reply post references. Clips are short, so
//! the file is buffered whole; chunked upload is not needed at this size.

use std::path::Path;

use log::{debug, info};
use reqwest::multipart;
use reqwest::Client;

use crate::config::BotConfig;
use crate::error::{BotError, BotResult};

use super::api::send_api_request;

/// Uploads a local video file, yielding the media id for a reply post.
///
/// # Errors
///
/// Returns `BotError::Io` if the file cannot be read, or the usual API
/// errors from the upload endpoint.
pub async fn upload_video(client: &Client, config: &BotConfig, path: &Path) -> BotResult<String> {
    info!("Uploading clip {:?}", path);

    let bytes = tokio::fs::read(path).await?;
    debug!("Read {} bytes for upload", bytes.len());

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "clip.mp4".to_string());
    let part = multipart::Part::bytes(bytes)
        .file_name(file_name)
        .mime_str("video/mp4")?;
    let form = multipart::Form::new()
        .text("media_category", "tweet_video")
        .part("media", part);

    let url = "https://upload.twitter.com/1.1/media/upload.json";
    let request_builder = client
        .post(url)
        .header("Authorization", config.write_auth_header())
        .multipart(form);

    let response_text = send_api_request(request_builder, "upload_video").await?;
    let json_response: serde_json::Value = serde_json::from_str(&response_text)?;

    let media_id = json_response
        .get("media_id_string")
        .and_then(|v| v.as_str())
        .ok_or_else(|| BotError::api("upload_video", 200, "response missing media_id_string"))?;

    info!("Upload complete, media id {}", media_id);
    Ok(media_id.to_string())
}
