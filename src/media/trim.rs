//! Clip trimming via the ffmpeg CLI.
//!
//! The trim is a container-level stream copy: ffmpeg seeks to the requested
//! start, reads until the requested end, and copies packets without
//! re-encoding. This is fast, but cut points snap to the nearest keyframe,
//! so trims are not frame-accurate. That trade-off is accepted here: the
//! output is a social-media clip, not an edit master, and re-encoding every
//! request would cost far more CPU than the precision is worth.

use std::path::Path;
use std::process::Stdio;

use log::{debug, info};
use tokio::process::Command;

use crate::error::{BotError, BotResult};
use crate::parser::TimeRange;

/// Builds the ffmpeg argument list for a stream-copy trim.
///
/// The timestamps come straight from the parsed command; ffmpeg accepts the
/// `M:SS` form directly, and malformed values surface as a non-zero exit.
pub fn build_trim_args(input: &Path, output: &Path, range: &TimeRange) -> Vec<String> {
    vec![
        "-y".to_string(),
        "-v".to_string(),
        "error".to_string(),
        "-ss".to_string(),
        range.start.clone(),
        "-to".to_string(),
        range.end.clone(),
        "-i".to_string(),
        input.to_string_lossy().to_string(),
        "-c".to_string(),
        "copy".to_string(),
        output.to_string_lossy().to_string(),
    ]
}

/// Trims `input` to `range`, writing the clip to `output` (overwriting any
/// prior file at that path).
///
/// # Errors
///
/// Returns `BotError::Trim` if ffmpeg exits non-zero or the produced file
/// is missing or empty, with ffmpeg's stderr attached for the logs.
pub async fn trim_video(input: &Path, output: &Path, range: &TimeRange) -> BotResult<()> {
    info!(
        "Trimming {:?} to {:?} ({}-{})",
        input, output, range.start, range.end
    );

    let args = build_trim_args(input, output, range);
    debug!("Running ffmpeg {}", args.join(" "));

    let result = Command::new("ffmpeg")
        .args(&args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .output()
        .await?;

    if !result.status.success() {
        let stderr = String::from_utf8_lossy(&result.stderr);
        return Err(BotError::trim(format!(
            "ffmpeg exited with {:?}: {}",
            result.status.code(),
            stderr.trim()
        )));
    }

    // Stream-copying a range that falls outside the video can succeed with
    // an empty output; treat that as a failed trim.
    let clip_len = tokio::fs::metadata(output).await.map(|m| m.len());
    match clip_len {
        Ok(0) => Err(BotError::trim(format!(
            "ffmpeg produced an empty clip for range {}-{}",
            range.start, range.end
        ))),
        Ok(len) => {
            info!("Clip written to {:?} ({} bytes)", output, len);
            Ok(())
        }
        Err(_) => Err(BotError::trim("ffmpeg produced no output file".to_string())),
    }
}

/// Checks that ffmpeg is reachable on PATH. Called once at startup so a
/// misconfigured host fails fast instead of on the first mention.
pub fn check_ffmpeg() -> BotResult<std::path::PathBuf> {
    which::which("ffmpeg").map_err(|_| BotError::FfmpegNotFound)
}
