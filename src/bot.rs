//! Mention poller and per-mention pipeline.
//!
//! The orchestrator polls the mentions feed on a fixed interval, walks each
//! new mention oldest-first, and drives parse → attachment check → media
//! resolution → download → trim → upload → reply. Every failure class has
//! its own recovery: user-input problems get an explanatory reply, a
//! processing failure gets a failure notice, a rate limit cools the whole
//! loop down, and anything else is logged and retried next cycle. The
//! process never terminates on error.
//!
//! The feed and the media pipeline sit behind traits so the loop's ordering
//! and failure semantics are testable with in-memory fakes.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use log::{error, info, warn};
use reqwest::Client;
use tempfile::TempDir;

use crate::config::BotConfig;
use crate::error::{BotError, BotResult};
use crate::media::{download_video, trim_video};
use crate::parser::{parse_cut_command, TimeRange};
use crate::twitter::{fetch_mentions, reply_to_tweet, reply_with_media, upload_video, MentionPage};
use crate::watermark::WatermarkStore;

/// Reply sent when a mention carries no recognizable cut command.
pub const USAGE_REPLY: &str = "Please use the format: cut 0:05-0:17";

/// Reply sent when the mentioned tweet has no media attachment.
pub const NO_VIDEO_REPLY: &str = "I couldn't find a video in that tweet.";

/// Reply sent when an attachment's media key resolves to no URL.
pub const NO_MEDIA_URL_REPLY: &str = "I couldn't find the video file.";

/// Reply sent when the download/trim/upload step fails for a well-formed
/// request.
pub const PROCESSING_FAILED_REPLY: &str =
    "Sorry, I couldn't process that video. Please try again later.";

/// Working filename for the downloaded source inside the per-mention dir.
const SOURCE_FILENAME: &str = "input.mp4";

/// Working filename for the produced clip inside the per-mention dir.
const CLIP_FILENAME: &str = "highlight.mp4";

/// The mentions-feed side of the pipeline: fetching pages and posting
/// replies (with or without a clip).
#[async_trait]
pub trait MentionFeed {
    async fn fetch_mentions(&self, since_id: Option<u64>) -> BotResult<MentionPage>;
    async fn reply(&self, text: &str, tweet_id: u64) -> BotResult<()>;
    async fn reply_with_clip(&self, text: &str, tweet_id: u64, clip: &Path) -> BotResult<()>;
}

/// The media side of the pipeline: fetching a remote video and trimming it.
#[async_trait]
pub trait Clipper {
    async fn fetch(&self, url: &str, dest: &Path) -> BotResult<()>;
    async fn trim(&self, input: &Path, output: &Path, range: &TimeRange) -> BotResult<()>;
}

/// Production `MentionFeed` over the Twitter API v2 client.
pub struct TwitterFeed<'a> {
    client: Client,
    config: &'a BotConfig,
    user_id: u64,
}

impl<'a> TwitterFeed<'a> {
    pub fn new(client: Client, config: &'a BotConfig, user_id: u64) -> Self {
        Self {
            client,
            config,
            user_id,
        }
    }
}

#[async_trait]
impl MentionFeed for TwitterFeed<'_> {
    async fn fetch_mentions(&self, since_id: Option<u64>) -> BotResult<MentionPage> {
        fetch_mentions(&self.client, self.config, self.user_id, since_id).await
    }

    async fn reply(&self, text: &str, tweet_id: u64) -> BotResult<()> {
        reply_to_tweet(&self.client, self.config, text, tweet_id).await?;
        Ok(())
    }

    async fn reply_with_clip(&self, text: &str, tweet_id: u64, clip: &Path) -> BotResult<()> {
        let media_id = upload_video(&self.client, self.config, clip).await?;
        reply_with_media(&self.client, self.config, text, tweet_id, &media_id).await?;
        Ok(())
    }
}

/// Production `Clipper`: HTTP download plus the ffmpeg stream-copy trim.
pub struct FfmpegClipper {
    client: Client,
}

impl FfmpegClipper {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Clipper for FfmpegClipper {
    async fn fetch(&self, url: &str, dest: &Path) -> BotResult<()> {
        download_video(&self.client, url, dest).await
    }

    async fn trim(&self, input: &Path, output: &Path, range: &TimeRange) -> BotResult<()> {
        trim_video(input, output, range).await
    }
}

/// The polling orchestrator.
pub struct Bot<F, C> {
    feed: F,
    clipper: C,
    watermark: WatermarkStore,
}

#[cfg(test)]
impl<F, C> Bot<F, C> {
    /// The feed collaborator (test inspection only).
    pub(crate) fn feed(&self) -> &F {
        &self.feed
    }

    /// The clipper collaborator (test inspection only).
    pub(crate) fn clipper(&self) -> &C {
        &self.clipper
    }
}

impl<F: MentionFeed, C: Clipper> Bot<F, C> {
    pub fn new(feed: F, clipper: C, watermark: WatermarkStore) -> Self {
        Self {
            feed,
            clipper,
            watermark,
        }
    }

    /// Runs one polling cycle: fetch mentions newer than the watermark and
    /// process them oldest-first.
    ///
    /// `last_seen` is the in-memory cursor; it is advanced (and persisted)
    /// to each mention's id *before* that mention's pipeline runs, so a
    /// crash mid-pipeline never reprocesses the mention on restart.
    ///
    /// Returns the number of mentions processed. Per-mention pipeline
    /// failures do not abort the cycle; the exceptions are the feed query
    /// itself and a rate limit raised by any posting call, which surfaces
    /// here so the loop applies the cooldown. The watermark has already
    /// advanced past the affected mention, so resuming after the cooldown
    /// never reprocesses it.
    pub async fn poll_once(&self, last_seen: &mut Option<u64>) -> BotResult<usize> {
        info!("Checking for new mentions...");
        let page = self.feed.fetch_mentions(*last_seen).await?;

        if page.mentions.is_empty() {
            return Ok(0);
        }

        // The feed returns newest first; process oldest first to keep
        // replies in chronological order.
        let mut processed = 0;
        for mention in page.mentions.iter().rev() {
            info!("Processing tweet {}", mention.id);

            *last_seen = Some(mention.id);
            if let Err(e) = self.watermark.set(mention.id) {
                // Keep going: the in-memory cursor still prevents
                // reprocessing within this run.
                error!("Failed to persist watermark {}: {}", mention.id, e);
            }

            self.process_mention(&page, mention).await?;
            processed += 1;
        }

        Ok(processed)
    }

    /// Runs the per-mention pipeline. Every outcome ends in a reply and
    /// stays inside the cycle, except a rate limit from a posting call:
    /// that propagates so the whole loop cools down instead of burning the
    /// remaining quota on further replies.
    async fn process_mention(
        &self,
        page: &MentionPage,
        mention: &crate::twitter::Mention,
    ) -> BotResult<()> {
        let Some(range) = parse_cut_command(&mention.text) else {
            return self.post_reply(USAGE_REPLY, mention.id).await;
        };

        if mention.media_keys.is_empty() {
            return self.post_reply(NO_VIDEO_REPLY, mention.id).await;
        }

        let Some(media_url) = page.resolve_media_url(mention) else {
            return self.post_reply(NO_MEDIA_URL_REPLY, mention.id).await;
        };

        // Download/trim/upload in its own boundary: a failure here is
        // reported to the user and the cycle moves on.
        match self.produce_clip(media_url, &range, mention.id).await {
            Ok(()) => {
                info!(
                    "Posted highlight for tweet {} ({}-{})",
                    mention.id, range.start, range.end
                );
                Ok(())
            }
            Err(e) if e.is_rate_limit() => Err(BotError::RateLimited),
            Err(e) => {
                warn!("Processing tweet {} failed: {}", mention.id, e);
                self.post_reply(PROCESSING_FAILED_REPLY, mention.id).await
            }
        }
    }

    /// Fetch → trim → reply-with-clip inside a scoped working directory.
    ///
    /// The directory (and both working files) is unique per mention and is
    /// deleted when the `TempDir` drops, on success and on every failure
    /// path alike.
    async fn produce_clip(&self, media_url: &str, range: &TimeRange, tweet_id: u64) -> BotResult<()> {
        let workdir = TempDir::new()?;
        let source: PathBuf = workdir.path().join(SOURCE_FILENAME);
        let clip: PathBuf = workdir.path().join(CLIP_FILENAME);

        self.clipper.fetch(media_url, &source).await?;
        self.clipper.trim(&source, &clip, range).await?;

        let text = format!("Here's your highlight! \u{1F525} ({}-{})", range.start, range.end);
        self.feed.reply_with_clip(&text, tweet_id, &clip).await
    }

    /// Posts a plain reply. Ordinary posting failures are logged and
    /// swallowed so they never take down the cycle; a rate limit
    /// propagates so the loop can cool down.
    async fn post_reply(&self, text: &str, tweet_id: u64) -> BotResult<()> {
        match self.feed.reply(text, tweet_id).await {
            Ok(()) => Ok(()),
            Err(e) if e.is_rate_limit() => Err(BotError::RateLimited),
            Err(e) => {
                warn!("Failed to reply to tweet {}: {}", tweet_id, e);
                Ok(())
            }
        }
    }

    /// Runs the polling loop indefinitely.
    ///
    /// The watermark is read once here; afterwards the in-memory cursor is
    /// authoritative and the store is only written. A rate-limit error —
    /// whether from the feed query or a posting call — triggers the
    /// extended cooldown; any other error is logged and the loop resumes
    /// after the normal interval.
    pub async fn run(&self, config: &BotConfig) -> BotResult<()> {
        let mut last_seen = self.watermark.get()?;
        info!(
            "Bot is now running (watermark: {})",
            last_seen.map_or_else(|| "none".to_string(), |id| id.to_string())
        );

        loop {
            let sleep_for = match self.poll_once(&mut last_seen).await {
                Ok(0) => {
                    info!("No new mentions found");
                    config.poll_interval
                }
                Ok(n) => {
                    info!("Processed {} mention(s) this cycle", n);
                    config.poll_interval
                }
                Err(BotError::RateLimited) => {
                    warn!(
                        "Rate limit hit. Cooling down for {} seconds...",
                        config.cooldown.as_secs()
                    );
                    config.cooldown
                }
                Err(e) => {
                    error!("Polling cycle failed: {}", e);
                    config.poll_interval
                }
            };

            tokio::time::sleep(sleep_for).await;
        }
    }
}
