//! Media handling: downloading source videos and trimming clips.

mod download;
mod trim;

pub use download::download_video;
pub use trim::{build_trim_args, check_ffmpeg, trim_video};
