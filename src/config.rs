//! Configuration module for the highlightbot service.
//!
//! This module contains the configuration structure and environment variable
//! handling for the Twitter/X API credentials and the bot's fixed timing
//! parameters. The configuration is loaded once at startup and passed by
//! reference into the collaborators that need it — there is no process-wide
//! credential state.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use log::{debug, error, info, warn};

use crate::error::{BotError, BotResult};

/// Default polling interval between mention-feed queries, in seconds.
const DEFAULT_POLL_SECS: u64 = 60;

/// Default cooldown after a rate-limit response, in seconds (15 minutes).
const DEFAULT_COOLDOWN_SECS: u64 = 900;

/// Default file used to persist the last-processed mention id.
const DEFAULT_WATERMARK_FILE: &str = "last_seen.txt";

/// Configuration for the bot: Twitter/X API credentials plus timing and
/// persistence settings.
///
/// The credential strings are opaque to the bot. The bearer token
/// authenticates read operations (the mentions feed), the access token
/// authenticates write operations (tweet creation and media upload). The
/// consumer key/secret pair is loaded and carried for deployments that use
/// v1.1-style keys, but no OAuth 1.0a signing is performed here.
#[derive(Debug)]
pub struct BotConfig {
    /// Consumer API key (carried opaquely)
    pub api_key: String,
    /// Consumer API key secret (carried opaquely)
    pub api_key_secret: String,
    /// OAuth 2.0 User Context access token for write operations
    pub access_token: String,
    /// Access token secret (carried opaquely)
    pub access_token_secret: String,
    /// App-only bearer token for read operations
    pub bearer_token: String,
    /// File where the last-processed mention id is persisted
    pub watermark_file: PathBuf,
    /// Sleep between polling cycles
    pub poll_interval: Duration,
    /// Extended sleep after a rate-limit response
    pub cooldown: Duration,
}

/// Masks a secret for logging, keeping only a short prefix and suffix.
fn mask_secret(secret: &str) -> String {
    let len = secret.len();
    if len > 16 {
        format!("{}...{}", &secret[..8], &secret[len - 8..])
    } else if len > 8 {
        format!("{}...", &secret[..8])
    } else {
        format!("{}...", secret)
    }
}

/// Reads a required credential from the environment.
fn require_env(name: &str) -> BotResult<String> {
    match env::var(name) {
        Ok(value) => {
            info!(
                "Found {} environment variable with length: {}",
                name,
                value.len()
            );
            debug!("{} (masked): {}", name, mask_secret(&value));

            if value.is_empty() {
                error!("{} is empty", name);
                return Err(BotError::config(format!("{name} cannot be empty")));
            }
            if value.len() < 10 {
                warn!("{} seems unusually short ({} characters)", name, value.len());
            }
            Ok(value)
        }
        Err(_) => {
            error!("Missing {} environment variable", name);
            Err(BotError::config(format!(
                "missing {name} environment variable"
            )))
        }
    }
}

/// Reads an optional duration setting (in whole seconds) from the environment.
fn duration_from_env(name: &str, default_secs: u64) -> BotResult<Duration> {
    match env::var(name) {
        Ok(value) => {
            let secs: u64 = value
                .parse()
                .map_err(|_| BotError::config(format!("{name} must be a whole number of seconds")))?;
            info!("Using {} = {}s from environment", name, secs);
            Ok(Duration::from_secs(secs))
        }
        Err(_) => Ok(Duration::from_secs(default_secs)),
    }
}

impl BotConfig {
    /// Creates a new `BotConfig` by loading credentials and settings from
    /// environment variables.
    ///
    /// # Required Environment Variables
    ///
    /// - `API_KEY`, `API_KEY_SECRET`: consumer key pair
    /// - `ACCESS_TOKEN`, `ACCESS_TOKEN_SECRET`: user access token pair
    /// - `BEARER_TOKEN`: app-only bearer token for the mentions feed
    ///
    /// # Optional Environment Variables
    ///
    /// - `WATERMARK_FILE`: path of the last-seen id file (default `last_seen.txt`)
    /// - `POLL_SECS`: polling interval in seconds (default 60)
    /// - `COOLDOWN_SECS`: rate-limit cooldown in seconds (default 900)
    ///
    /// # Errors
    ///
    /// Returns `BotError::Config` if any required variable is missing or
    /// empty, or an optional numeric setting fails to parse. The process
    /// does not start half-configured.
    pub fn from_env() -> BotResult<Self> {
        info!("Loading bot configuration from environment variables");

        let api_key = require_env("API_KEY")?;
        let api_key_secret = require_env("API_KEY_SECRET")?;
        let access_token = require_env("ACCESS_TOKEN")?;
        let access_token_secret = require_env("ACCESS_TOKEN_SECRET")?;
        let bearer_token = require_env("BEARER_TOKEN")?;

        let watermark_file = env::var("WATERMARK_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_WATERMARK_FILE));
        let poll_interval = duration_from_env("POLL_SECS", DEFAULT_POLL_SECS)?;
        let cooldown = duration_from_env("COOLDOWN_SECS", DEFAULT_COOLDOWN_SECS)?;

        info!(
            "Bot configuration loaded: watermark file {:?}, poll every {}s, cooldown {}s",
            watermark_file,
            poll_interval.as_secs(),
            cooldown.as_secs()
        );

        Ok(BotConfig {
            api_key,
            api_key_secret,
            access_token,
            access_token_secret,
            bearer_token,
            watermark_file,
            poll_interval,
            cooldown,
        })
    }

    /// Builds the Authorization header value for read operations
    /// (mentions feed), using the app-only bearer token.
    pub fn read_auth_header(&self) -> String {
        format!("Bearer {}", self.bearer_token)
    }

    /// Builds the Authorization header value for write operations
    /// (tweet creation, media upload), using the user access token.
    pub fn write_auth_header(&self) -> String {
        format!("Bearer {}", self.access_token)
    }
}
