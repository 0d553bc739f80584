//! # Tests Module
//!
//! This module contains tests for the highlightbot pipeline.
//!
//! ## Test Categories
//!
//! ### Unit Tests
//! - Cut-command parsing (`parse_cut_command`)
//! - Watermark persistence (`WatermarkStore`)
//! - ffmpeg argument construction (`build_trim_args`)
//! - Mentions response parsing (`parse_mention_page`)
//!
//! ### Orchestrator Tests
//! - Processing order and watermark advancement
//! - Reply selection for each user-input failure
//! - End-to-end fetch/trim/reply invocation with a fake feed and clipper
//! - Rate-limit propagation without watermark movement
//!
//! The orchestrator tests drive `Bot::poll_once` through in-memory fakes;
//! no network, ffmpeg, or Twitter credentials are involved.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::json;

use crate::bot::{
    Bot, Clipper, MentionFeed, NO_MEDIA_URL_REPLY, NO_VIDEO_REPLY, PROCESSING_FAILED_REPLY,
    USAGE_REPLY,
};
use crate::error::{BotError, BotResult};
use crate::parser::{parse_cut_command, TimeRange};
use crate::twitter::{Mention, MentionPage};
use crate::watermark::WatermarkStore;

// ===== Command parser =====

/// A command embedded in surrounding text is extracted with both
/// timestamps verbatim.
#[test]
fn test_parse_cut_command_match() {
    let range = parse_cut_command("please cut 0:05-0:17 thanks").unwrap();
    assert_eq!(
        range,
        TimeRange {
            start: "0:05".to_string(),
            end: "0:17".to_string(),
        }
    );
}

/// Text without a command yields no range.
#[test]
fn test_parse_cut_command_no_match() {
    assert!(parse_cut_command("no command here").is_none());
    assert!(parse_cut_command("").is_none());
    assert!(parse_cut_command("cut 5-17").is_none());
}

/// Matching is case-insensitive.
#[test]
fn test_parse_cut_command_case_insensitive() {
    let range = parse_cut_command("CUT 1:00-2:30").unwrap();
    assert_eq!(range.start, "1:00");
    assert_eq!(range.end, "2:30");
}

/// Only the first of several commands is used.
#[test]
fn test_parse_cut_command_first_match_wins() {
    let range = parse_cut_command("cut 0:01-0:02 and also cut 5:00-6:00").unwrap();
    assert_eq!(range.start, "0:01");
    assert_eq!(range.end, "0:02");
}

/// Malformed timestamps are passed through unchanged; the trimmer owns
/// that failure.
#[test]
fn test_parse_cut_command_no_numeric_validation() {
    let range = parse_cut_command("cut 99:99-0:00").unwrap();
    assert_eq!(range.start, "99:99");
    assert_eq!(range.end, "0:00");
}

// ===== Watermark store =====

/// Before any `set`, `get` returns `None`.
#[test]
fn test_watermark_absent_on_first_run() {
    let dir = tempfile::tempdir().unwrap();
    let store = WatermarkStore::new(dir.path().join("last_seen.txt"));
    assert_eq!(store.get().unwrap(), None);
}

/// `set` then `get` round-trips, and the last write wins.
#[test]
fn test_watermark_set_get_last_write_wins() {
    let dir = tempfile::tempdir().unwrap();
    let store = WatermarkStore::new(dir.path().join("last_seen.txt"));

    store.set(41).unwrap();
    assert_eq!(store.get().unwrap(), Some(41));

    store.set(42).unwrap();
    assert_eq!(store.get().unwrap(), Some(42));
}

/// The on-disk representation is the plain decimal string, so a restart
/// resumes from exactly the persisted id.
#[test]
fn test_watermark_on_disk_representation() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("last_seen.txt");

    std::fs::write(&path, "42").unwrap();
    let store = WatermarkStore::new(&path);
    assert_eq!(store.get().unwrap(), Some(42));

    store.set(43).unwrap();
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "43");
}

/// Garbage in the watermark file is treated as first run, not a crash.
#[test]
fn test_watermark_unparsable_content_treated_as_absent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("last_seen.txt");

    std::fs::write(&path, "not a number").unwrap();
    let store = WatermarkStore::new(&path);
    assert_eq!(store.get().unwrap(), None);
}

// ===== ffmpeg arguments =====

/// The trim command seeks to the start, reads to the end, and stream-copies.
#[test]
fn test_build_trim_args() {
    let range = TimeRange {
        start: "0:10".to_string(),
        end: "0:20".to_string(),
    };
    let args = crate::media::build_trim_args(
        Path::new("input.mp4"),
        Path::new("highlight.mp4"),
        &range,
    );

    assert_eq!(
        args,
        vec![
            "-y",
            "-v",
            "error",
            "-ss",
            "0:10",
            "-to",
            "0:20",
            "-i",
            "input.mp4",
            "-c",
            "copy",
            "highlight.mp4",
        ]
    );
}

// ===== Log sanitizing =====

/// Truncation backs off to a char boundary, so a multi-byte character
/// straddling the limit never panics the error path.
#[test]
fn test_sanitize_for_logging_multibyte_truncation() {
    let text = format!("{}é and more", "a".repeat(199));
    let sanitized = crate::twitter::sanitize_for_logging(&text, 200);

    // The two-byte 'é' starts at byte 199, so the cut lands before it.
    assert!(sanitized.starts_with(&"a".repeat(199)));
    assert!(sanitized.contains("[truncated"));
    assert!(!sanitized.contains('é'));
}

/// Short input passes through with control characters flattened.
#[test]
fn test_sanitize_for_logging_passthrough() {
    assert_eq!(
        crate::twitter::sanitize_for_logging("line one\nline two", 200),
        "line one line two"
    );
}

// ===== Mentions response parsing =====

/// A feed response with one video mention parses into a mention plus a
/// resolvable media URL.
#[test]
fn test_parse_mention_page() {
    let response = json!({
        "data": [
            {
                "id": "100",
                "text": "@bot cut 0:05-0:17",
                "attachments": { "media_keys": ["13_999"] }
            },
            {
                "id": "99",
                "text": "@bot hello"
            }
        ],
        "includes": {
            "media": [
                { "media_key": "13_999", "url": "https://video.example/clip.mp4" }
            ]
        }
    });

    let page = crate::twitter::parse_mention_page(&response);
    assert_eq!(page.mentions.len(), 2);
    assert_eq!(page.mentions[0].id, 100);
    assert_eq!(page.mentions[0].media_keys, vec!["13_999".to_string()]);
    assert!(page.mentions[1].media_keys.is_empty());
    assert_eq!(
        page.resolve_media_url(&page.mentions[0]),
        Some("https://video.example/clip.mp4")
    );
    assert_eq!(page.resolve_media_url(&page.mentions[1]), None);
}

/// Media entries without a direct `url` fall back to the first variant URL.
#[test]
fn test_parse_mention_page_variant_fallback() {
    let response = json!({
        "data": [
            {
                "id": "100",
                "text": "cut 0:05-0:17",
                "attachments": { "media_keys": ["13_1"] }
            }
        ],
        "includes": {
            "media": [
                {
                    "media_key": "13_1",
                    "variants": [
                        { "bit_rate": 2176000, "url": "https://video.example/hi.mp4" }
                    ]
                }
            ]
        }
    });

    let page = crate::twitter::parse_mention_page(&response);
    assert_eq!(
        page.resolve_media_url(&page.mentions[0]),
        Some("https://video.example/hi.mp4")
    );
}

// ===== Orchestrator fakes =====

/// In-memory mentions feed recording every interaction.
#[derive(Default)]
struct FakeFeed {
    /// Page returned by the next fetch
    page: Mutex<MentionPage>,
    /// When set, the next fetch fails with a rate-limit error
    rate_limited: Mutex<bool>,
    /// When set, every posting call fails with a rate-limit error
    posting_rate_limited: Mutex<bool>,
    /// `since_id` values the orchestrator queried with
    since_calls: Mutex<Vec<Option<u64>>>,
    /// Plain-text replies posted (text, tweet id)
    replies: Mutex<Vec<(String, u64)>>,
    /// Clip replies posted (text, tweet id)
    clip_replies: Mutex<Vec<(String, u64)>>,
}

impl FakeFeed {
    fn with_page(page: MentionPage) -> Self {
        Self {
            page: Mutex::new(page),
            ..Default::default()
        }
    }

    fn rate_limited() -> Self {
        Self {
            rate_limited: Mutex::new(true),
            ..Default::default()
        }
    }

    fn posting_rate_limited(page: MentionPage) -> Self {
        Self {
            page: Mutex::new(page),
            posting_rate_limited: Mutex::new(true),
            ..Default::default()
        }
    }
}

#[async_trait]
impl MentionFeed for FakeFeed {
    async fn fetch_mentions(&self, since_id: Option<u64>) -> BotResult<MentionPage> {
        self.since_calls.lock().unwrap().push(since_id);
        if *self.rate_limited.lock().unwrap() {
            return Err(BotError::RateLimited);
        }
        Ok(self.page.lock().unwrap().clone())
    }

    async fn reply(&self, text: &str, tweet_id: u64) -> BotResult<()> {
        if *self.posting_rate_limited.lock().unwrap() {
            return Err(BotError::RateLimited);
        }
        self.replies.lock().unwrap().push((text.to_string(), tweet_id));
        Ok(())
    }

    async fn reply_with_clip(&self, text: &str, tweet_id: u64, _clip: &Path) -> BotResult<()> {
        if *self.posting_rate_limited.lock().unwrap() {
            return Err(BotError::RateLimited);
        }
        self.clip_replies
            .lock()
            .unwrap()
            .push((text.to_string(), tweet_id));
        Ok(())
    }
}

/// In-memory clipper recording fetch URLs and trim ranges.
#[derive(Default)]
struct FakeClipper {
    fetched_urls: Mutex<Vec<String>>,
    trimmed_ranges: Mutex<Vec<TimeRange>>,
    /// When set, trims fail to exercise the processing-error boundary
    fail_trim: Mutex<bool>,
}

impl FakeClipper {
    fn failing_trim() -> Self {
        Self {
            fail_trim: Mutex::new(true),
            ..Default::default()
        }
    }
}

#[async_trait]
impl Clipper for FakeClipper {
    async fn fetch(&self, url: &str, _dest: &Path) -> BotResult<()> {
        self.fetched_urls.lock().unwrap().push(url.to_string());
        Ok(())
    }

    async fn trim(&self, _input: &Path, _output: &Path, range: &TimeRange) -> BotResult<()> {
        self.trimmed_ranges.lock().unwrap().push(range.clone());
        if *self.fail_trim.lock().unwrap() {
            return Err(BotError::trim("fake trim failure"));
        }
        Ok(())
    }
}

fn mention(id: u64, text: &str, media_keys: &[&str]) -> Mention {
    Mention {
        id,
        text: text.to_string(),
        media_keys: media_keys.iter().map(|k| k.to_string()).collect(),
    }
}

fn watermark_in(dir: &tempfile::TempDir) -> WatermarkStore {
    WatermarkStore::new(dir.path().join("last_seen.txt"))
}

// ===== Orchestrator behavior =====

/// Mentions returned newest-first as [3, 2, 1] are processed as [1, 2, 3],
/// and the watermark ends at the last processed id regardless of per-mention
/// outcomes.
#[tokio::test]
async fn test_poll_once_processes_oldest_first() {
    let page = MentionPage {
        mentions: vec![
            mention(3, "no command", &[]),
            mention(2, "no command", &[]),
            mention(1, "no command", &[]),
        ],
        media_urls: HashMap::new(),
    };
    let dir = tempfile::tempdir().unwrap();
    let store = watermark_in(&dir);
    let bot = Bot::new(FakeFeed::with_page(page), FakeClipper::default(), store.clone());

    let mut last_seen = None;
    let processed = bot.poll_once(&mut last_seen).await.unwrap();

    assert_eq!(processed, 3);
    assert_eq!(last_seen, Some(3));
    assert_eq!(store.get().unwrap(), Some(3));

    // Usage replies arrive in chronological order.
    let replies = bot.feed().replies.lock().unwrap().clone();
    let reply_ids: Vec<u64> = replies.iter().map(|(_, id)| *id).collect();
    assert_eq!(reply_ids, vec![1, 2, 3]);
    assert!(replies.iter().all(|(text, _)| text == USAGE_REPLY));
}

/// A command without any attachment gets the no-video reply and no media
/// pipeline activity.
#[tokio::test]
async fn test_missing_attachment_gets_explanatory_reply() {
    let page = MentionPage {
        mentions: vec![mention(10, "cut 0:05-0:17", &[])],
        media_urls: HashMap::new(),
    };
    let dir = tempfile::tempdir().unwrap();
    let bot = Bot::new(
        FakeFeed::with_page(page),
        FakeClipper::default(),
        watermark_in(&dir),
    );

    bot.poll_once(&mut None).await.unwrap();

    let replies = bot.feed().replies.lock().unwrap().clone();
    assert_eq!(replies, vec![(NO_VIDEO_REPLY.to_string(), 10)]);
    assert!(bot.clipper().fetched_urls.lock().unwrap().is_empty());
    assert!(bot.clipper().trimmed_ranges.lock().unwrap().is_empty());
}

/// An attachment whose media key resolves to no URL gets the no-media-file
/// reply, and no fetch/trim/upload call occurs.
#[tokio::test]
async fn test_unresolvable_media_key_gets_explanatory_reply() {
    let page = MentionPage {
        mentions: vec![mention(11, "cut 0:05-0:17", &["13_404"])],
        media_urls: HashMap::new(),
    };
    let dir = tempfile::tempdir().unwrap();
    let bot = Bot::new(
        FakeFeed::with_page(page),
        FakeClipper::default(),
        watermark_in(&dir),
    );

    bot.poll_once(&mut None).await.unwrap();

    let replies = bot.feed().replies.lock().unwrap().clone();
    assert_eq!(replies, vec![(NO_MEDIA_URL_REPLY.to_string(), 11)]);
    assert!(bot.clipper().fetched_urls.lock().unwrap().is_empty());
    assert!(bot.feed().clip_replies.lock().unwrap().is_empty());
}

/// End to end: "cut 0:10-0:20" with a resolvable video fetches that URL,
/// trims that range, and posts a clip reply referencing both timestamps.
#[tokio::test]
async fn test_full_pipeline_posts_clip_reply() {
    let mut media_urls = HashMap::new();
    media_urls.insert(
        "13_7".to_string(),
        "https://video.example/source.mp4".to_string(),
    );
    let page = MentionPage {
        mentions: vec![mention(20, "@bot cut 0:10-0:20", &["13_7"])],
        media_urls,
    };
    let dir = tempfile::tempdir().unwrap();
    let store = watermark_in(&dir);
    let bot = Bot::new(FakeFeed::with_page(page), FakeClipper::default(), store.clone());

    bot.poll_once(&mut None).await.unwrap();

    assert_eq!(
        bot.clipper().fetched_urls.lock().unwrap().clone(),
        vec!["https://video.example/source.mp4".to_string()]
    );
    let ranges = bot.clipper().trimmed_ranges.lock().unwrap().clone();
    assert_eq!(ranges.len(), 1);
    assert_eq!(ranges[0].start, "0:10");
    assert_eq!(ranges[0].end, "0:20");

    let clip_replies = bot.feed().clip_replies.lock().unwrap().clone();
    assert_eq!(clip_replies.len(), 1);
    assert_eq!(clip_replies[0].1, 20);
    assert!(clip_replies[0].0.contains("0:10"));
    assert!(clip_replies[0].0.contains("0:20"));
    assert!(bot.feed().replies.lock().unwrap().is_empty());
    assert_eq!(store.get().unwrap(), Some(20));
}

/// A failing trim posts the failure notice instead of going silent, and
/// later mentions in the same cycle still run.
#[tokio::test]
async fn test_trim_failure_notifies_user_and_continues() {
    let mut media_urls = HashMap::new();
    media_urls.insert("13_7".to_string(), "https://video.example/a.mp4".to_string());
    let page = MentionPage {
        mentions: vec![
            mention(31, "no command at all", &[]),
            mention(30, "cut 0:01-0:02", &["13_7"]),
        ],
        media_urls,
    };
    let dir = tempfile::tempdir().unwrap();
    let store = watermark_in(&dir);
    let bot = Bot::new(
        FakeFeed::with_page(page),
        FakeClipper::failing_trim(),
        store.clone(),
    );

    let processed = bot.poll_once(&mut None).await.unwrap();
    assert_eq!(processed, 2);

    let replies = bot.feed().replies.lock().unwrap().clone();
    assert_eq!(
        replies,
        vec![
            (PROCESSING_FAILED_REPLY.to_string(), 30),
            (USAGE_REPLY.to_string(), 31),
        ]
    );
    assert!(bot.feed().clip_replies.lock().unwrap().is_empty());
    // Watermark covers the whole cycle even though mention 30 failed.
    assert_eq!(store.get().unwrap(), Some(31));
}

/// A rate-limited feed query surfaces as `RateLimited` (the loop's cue for
/// the extended cooldown) and moves no watermark.
#[tokio::test]
async fn test_rate_limit_propagates_without_watermark_change() {
    let dir = tempfile::tempdir().unwrap();
    let store = watermark_in(&dir);
    store.set(42).unwrap();
    let bot = Bot::new(FakeFeed::rate_limited(), FakeClipper::default(), store.clone());

    let mut last_seen = Some(42);
    let result = bot.poll_once(&mut last_seen).await;

    let err = result.unwrap_err();
    assert!(matches!(err, BotError::RateLimited));
    assert!(err.is_rate_limit());
    assert_eq!(last_seen, Some(42));
    assert_eq!(store.get().unwrap(), Some(42));
}

/// A rate limit raised by a posting call also surfaces from `poll_once`,
/// so the loop cools down instead of sleeping the normal interval.
#[tokio::test]
async fn test_posting_rate_limit_surfaces_for_cooldown() {
    let page = MentionPage {
        mentions: vec![mention(50, "no command here", &[])],
        media_urls: HashMap::new(),
    };
    let dir = tempfile::tempdir().unwrap();
    let store = watermark_in(&dir);
    let bot = Bot::new(
        FakeFeed::posting_rate_limited(page),
        FakeClipper::default(),
        store.clone(),
    );

    let mut last_seen = None;
    let err = bot.poll_once(&mut last_seen).await.unwrap_err();
    assert!(err.is_rate_limit());

    // The mention was committed as seen before the reply attempt, so the
    // cooldown resume never reprocesses it.
    assert_eq!(last_seen, Some(50));
    assert_eq!(store.get().unwrap(), Some(50));
}

/// A rate-limited clip reply propagates as-is; the bot must not try to
/// post a failure notice while the quota is exhausted.
#[tokio::test]
async fn test_clip_reply_rate_limit_skips_failure_notice() {
    let mut media_urls = HashMap::new();
    media_urls.insert("13_7".to_string(), "https://video.example/a.mp4".to_string());
    let page = MentionPage {
        mentions: vec![mention(60, "cut 0:01-0:02", &["13_7"])],
        media_urls,
    };
    let dir = tempfile::tempdir().unwrap();
    let bot = Bot::new(
        FakeFeed::posting_rate_limited(page),
        FakeClipper::default(),
        watermark_in(&dir),
    );

    let err = bot.poll_once(&mut None).await.unwrap_err();
    assert!(matches!(err, BotError::RateLimited));

    // The pipeline ran up to the clip reply, then stopped cold: no
    // follow-up posting attempts were recorded.
    assert_eq!(
        bot.clipper().fetched_urls.lock().unwrap().clone(),
        vec!["https://video.example/a.mp4".to_string()]
    );
    assert!(bot.feed().replies.lock().unwrap().is_empty());
    assert!(bot.feed().clip_replies.lock().unwrap().is_empty());
}

/// After a restart with a persisted watermark of 42, the first feed query
/// uses since_id=42 — mention 42 and anything earlier is never re-fetched.
#[tokio::test]
async fn test_restart_resumes_from_persisted_watermark() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("last_seen.txt");
    std::fs::write(&path, "42").unwrap();

    let store = WatermarkStore::new(&path);
    let bot = Bot::new(
        FakeFeed::with_page(MentionPage::default()),
        FakeClipper::default(),
        store.clone(),
    );

    let mut last_seen = store.get().unwrap();
    assert_eq!(last_seen, Some(42));
    bot.poll_once(&mut last_seen).await.unwrap();

    assert_eq!(
        bot.feed().since_calls.lock().unwrap().clone(),
        vec![Some(42)]
    );
}
