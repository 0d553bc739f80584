//! # Highlightbot Library
//!
//! A Twitter/X bot that watches its mentions feed for `cut <start>-<end>`
//! commands posted in reply to tweets with an attached video, downloads the
//! video, trims the requested range with ffmpeg (stream copy), and posts
//! the clip back as a reply.
//!
//! ## Features
//!
//! - Fixed-interval mentions polling with a persisted resume watermark
//! - Case-insensitive `cut M:SS-M:SS` command parsing
//! - Container-level (stream-copy) trimming via the ffmpeg CLI
//! - Typed error taxonomy: rate limit, transient API, user input, processing
//! - User-facing replies for every failure class — the bot never goes silent
//!
//! ## Configuration
//!
//! All configuration is environment-provided: the five credential strings
//! (`API_KEY`, `API_KEY_SECRET`, `ACCESS_TOKEN`, `ACCESS_TOKEN_SECRET`,
//! `BEARER_TOKEN`) plus optional `WATERMARK_FILE`, `POLL_SECS` and
//! `COOLDOWN_SECS`. Log levels are controlled via `RUST_LOG`.

pub mod bot;
pub mod config;
pub mod error;
pub mod media;
pub mod parser;
pub mod twitter;
pub mod watermark;

// Re-export commonly used types and functions
pub use bot::{Bot, Clipper, FfmpegClipper, MentionFeed, TwitterFeed};
pub use config::BotConfig;
pub use error::{BotError, BotResult};
pub use parser::{parse_cut_command, TimeRange};
pub use watermark::WatermarkStore;

#[cfg(test)]
mod tests;
