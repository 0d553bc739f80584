//! Source video download.
//!
//! The mentions feed resolves an attachment to a plain media URL; this
//! module fetches it with a GET request and writes the whole body to a
//! local file. Clips are short, so whole-body buffering is deliberate —
//! no streaming or chunked writes.

use std::path::Path;

use log::{debug, info};
use reqwest::Client;

use crate::error::{BotError, BotResult};

/// Downloads the video at `url` into `dest`, overwriting any prior file.
///
/// # Errors
///
/// Returns `BotError::Fetch` on a network failure or a non-success HTTP
/// status. The caller treats either as fatal for the current mention.
pub async fn download_video(client: &Client, url: &str, dest: &Path) -> BotResult<()> {
    info!("Downloading video: {}", url);

    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| BotError::fetch(format!("request for {url} failed: {e}")))?;

    let status = response.status();
    if !status.is_success() {
        return Err(BotError::fetch(format!(
            "GET {url} returned status {status}"
        )));
    }

    let body = response
        .bytes()
        .await
        .map_err(|e| BotError::fetch(format!("reading body of {url} failed: {e}")))?;

    debug!("Downloaded {} bytes, writing to {:?}", body.len(), dest);
    tokio::fs::write(dest, &body).await?;

    info!("Video saved to {:?}", dest);
    Ok(())
}
