//! Cut-command parsing for mention text.
//!
//! A mention asks for a clip with the free-form phrase
//! `cut <start>-<end>`, e.g. "please cut 0:05-0:17 thanks". The parser
//! extracts the first such occurrence, case-insensitively, and hands the two
//! timestamps through verbatim — no numeric validation and no range check.
//! Malformed values like `99:99` are passed to ffmpeg unchanged, which may
//! fail or produce an empty clip; that failure is reported through the
//! processing-error reply path rather than special-cased here.

use regex::Regex;

/// A requested clip range, as it appeared in the mention text.
///
/// Both fields are `M:SS`/`H:MM`-shaped strings accepted directly by
/// ffmpeg's `-ss`/`-to` options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeRange {
    pub start: String,
    pub end: String,
}

/// Extracts the first `cut <start>-<end>` command from tweet text.
///
/// Matching is case-insensitive ("CUT 1:00-2:30" works). Only the first
/// occurrence is used when the text contains several.
///
/// # Returns
///
/// - `Some(TimeRange)`: the two timestamp substrings, verbatim
/// - `None`: the text contains no cut command
pub fn parse_cut_command(text: &str) -> Option<TimeRange> {
    // Compiled per call; mention volume is a handful per minute at most.
    let re = Regex::new(r"cut\s+(\d+:\d+)-(\d+:\d+)").ok()?;

    let lowered = text.to_lowercase();
    let captures = re.captures(&lowered)?;

    Some(TimeRange {
        start: captures.get(1)?.as_str().to_string(),
        end: captures.get(2)?.as_str().to_string(),
    })
}
