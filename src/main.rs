//! # Highlightbot
//!
//! Process entry point for the mention-driven video-clipping bot. Loads the
//! configuration from environment variables, verifies ffmpeg is available,
//! resolves the bot's own user id, and runs the polling loop until the
//! process receives ctrl-c.
//!
//! ## Environment Variables
//!
//! Required credentials: `API_KEY`, `API_KEY_SECRET`, `ACCESS_TOKEN`,
//! `ACCESS_TOKEN_SECRET`, `BEARER_TOKEN`.
//! Optional settings: `WATERMARK_FILE`, `POLL_SECS`, `COOLDOWN_SECS`.
//!
//! ## Logging
//!
//! The application uses the `env_logger` crate; log levels are controlled
//! via the `RUST_LOG` environment variable.
//!
//! ```bash
//! RUST_LOG=info cargo run
//! ```

use log::{error, info};
use reqwest::Client;

use highlightbot::bot::{Bot, FfmpegClipper, TwitterFeed};
use highlightbot::config::BotConfig;
use highlightbot::media::check_ffmpeg;
use highlightbot::twitter::lookup_me;
use highlightbot::watermark::WatermarkStore;

#[tokio::main]
async fn main() {
    // Initialize the logging system
    env_logger::init();

    let config = match BotConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    // Fail fast on a host without ffmpeg instead of on the first mention.
    match check_ffmpeg() {
        Ok(path) => info!("Using ffmpeg at {:?}", path),
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    }

    let client = Client::new();

    let user_id = match lookup_me(&client, &config).await {
        Ok(id) => id,
        Err(e) => {
            error!("Failed to look up bot user id: {}", e);
            std::process::exit(1);
        }
    };

    let feed = TwitterFeed::new(client.clone(), &config, user_id);
    let clipper = FfmpegClipper::new(client);
    let watermark = WatermarkStore::new(&config.watermark_file);
    let bot = Bot::new(feed, clipper, watermark);

    info!("Highlightbot is now running...");

    // Run the loop until shutdown; the loop itself never returns on error.
    tokio::select! {
        result = bot.run(&config) => {
            if let Err(e) = result {
                error!("Bot loop terminated: {}", e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received shutdown signal, exiting");
        }
    }
}
