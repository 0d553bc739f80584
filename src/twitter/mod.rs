//! Twitter/X API integration module.
//!
//! This module contains the client functions for interacting with the
//! Twitter/X API v2: fetching the mentions feed with attached-media
//! expansion, posting replies, and uploading clip files.

mod api;
mod mentions;
mod tweets;
mod upload;

// Re-export public API
pub use mentions::{fetch_mentions, lookup_me, Mention, MentionPage};
pub use tweets::{reply_to_tweet, reply_with_media};
pub use upload::upload_video;

// Crate-internal re-exports (used by tests and other modules)
#[allow(unused_imports)]
pub(crate) use api::{sanitize_for_logging, send_api_request};
#[allow(unused_imports)]
pub(crate) use mentions::parse_mention_page;
